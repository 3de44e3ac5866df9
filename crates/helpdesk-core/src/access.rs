//! The authorization matrix.
//!
//! Every mutating operation in the crate names itself as an [`Action`] and
//! asks [`AccessPolicy::authorize`] before touching state. Role checks live
//! here and nowhere else; state checks (is the ticket resolved, is the
//! article approved for review) belong to the entity that owns the state.

use crate::actor::Actor;
use crate::error::{HelpdeskError, Result};
use crate::types::Role;
use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An operation an actor wants to perform, carrying the facts the matrix
/// needs (ownership, approval state, target actor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    CreateTicket,
    ViewTicket { requester_id: &'a str },
    PostPublicMessage { requester_id: &'a str },
    PostInternalNote,
    ResolveTicket,
    CloseTicket,
    ReopenTicket { requester_id: &'a str },
    AssignToSelf,
    RateTicket { requester_id: &'a str },
    ReadKnowledgeBase,
    CreateArticle,
    EditArticle { approved: bool },
    ToggleApproval,
    RequestReview,
    ValidateReview,
    DeleteArticle,
    ChangeRole { target_id: &'a str },
    SetHomeSector { target_id: &'a str },
    RemoveActor { target_id: &'a str },
    ReviewRegistration,
    ManageRegistrationPolicy,
    ManageSectors,
    ViewReports,
    ManageReportSchedules,
}

impl Action<'_> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateTicket => "create tickets",
            Action::ViewTicket { .. } => "view this ticket",
            Action::PostPublicMessage { .. } => "post messages on this ticket",
            Action::PostInternalNote => "post internal notes",
            Action::ResolveTicket => "resolve tickets",
            Action::CloseTicket => "close tickets",
            Action::ReopenTicket { .. } => "reopen this ticket",
            Action::AssignToSelf => "assign tickets",
            Action::RateTicket { .. } => "rate this ticket",
            Action::ReadKnowledgeBase => "read the knowledge base",
            Action::CreateArticle => "create articles",
            Action::EditArticle { .. } => "edit this article",
            Action::ToggleApproval => "approve or reject articles",
            Action::RequestReview => "request article reviews",
            Action::ValidateReview => "validate article reviews",
            Action::DeleteArticle => "delete articles",
            Action::ChangeRole { .. } => "change this actor's role",
            Action::SetHomeSector { .. } => "change this actor's sector",
            Action::RemoveActor { .. } => "remove this actor",
            Action::ReviewRegistration => "review registrations",
            Action::ManageRegistrationPolicy => "change the registration policy",
            Action::ManageSectors => "manage sectors",
            Action::ViewReports => "view reports",
            Action::ManageReportSchedules => "manage report schedules",
        }
    }
}

impl fmt::Display for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AccessPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    master_actor_id: String,
}

impl AccessPolicy {
    pub fn new(master_actor_id: impl Into<String>) -> Self {
        Self {
            master_actor_id: master_actor_id.into(),
        }
    }

    pub fn master_actor_id(&self) -> &str {
        &self.master_actor_id
    }

    pub fn is_master(&self, actor_id: &str) -> bool {
        actor_id == self.master_actor_id
    }

    /// Whether `actor` may perform `action`. Unapproved actors may do nothing.
    pub fn permits(&self, actor: &Actor, action: &Action) -> bool {
        if !actor.approved {
            return false;
        }
        let role = actor.role;
        let own = |requester_id: &str| actor.id == requester_id;
        // Admin-only operations on another actor: never the master, never self.
        let on_other = |target_id: &str| {
            role == Role::Admin && target_id != actor.id && !self.is_master(target_id)
        };

        match *action {
            Action::CreateTicket => role == Role::Requester,
            Action::ViewTicket { requester_id } | Action::PostPublicMessage { requester_id } => {
                role.is_staff() || own(requester_id)
            }
            Action::PostInternalNote
            | Action::ResolveTicket
            | Action::CloseTicket
            | Action::AssignToSelf => role.is_staff(),
            Action::ReopenTicket { requester_id } | Action::RateTicket { requester_id } => {
                role == Role::Requester && own(requester_id)
            }
            Action::ReadKnowledgeBase | Action::CreateArticle => role.is_staff(),
            // Any support actor may edit a pending article, author or not.
            Action::EditArticle { approved } => {
                role == Role::Admin || (role == Role::Support && !approved)
            }
            Action::RequestReview => role == Role::Support,
            Action::ToggleApproval
            | Action::ValidateReview
            | Action::DeleteArticle
            | Action::ReviewRegistration
            | Action::ManageRegistrationPolicy
            | Action::ManageSectors
            | Action::ManageReportSchedules => role == Role::Admin,
            Action::ChangeRole { target_id }
            | Action::SetHomeSector { target_id }
            | Action::RemoveActor { target_id } => on_other(target_id),
            Action::ViewReports => role.is_staff(),
        }
    }

    pub fn authorize(&self, actor: &Actor, action: Action) -> Result<()> {
        if self.permits(actor, &action) {
            Ok(())
        } else {
            tracing::debug!(actor = %actor.id, role = %actor.role, %action, "denied");
            Err(HelpdeskError::Unauthorized {
                actor: actor.id.clone(),
                action: action.to_string(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
