//! Tickets and their lifecycle.
//!
//! Layout:
//!   .helpdesk/tickets.yaml  : every ticket with its message timeline
//!
//! Tickets get sequential IDs: T1, T2, T3, …  Every operation here checks
//! authorization first, then the current state, then input, and only then
//! mutates, so a rejected call leaves the ticket untouched.

use crate::access::{AccessPolicy, Action};
use crate::actor::Actor;
use crate::error::{HelpdeskError, Result};
use crate::message::{self, Message, NewMessage};
use crate::triage::TriageVerdict;
use crate::types::{Priority, Role, TicketStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub requester_id: String,
    pub requester_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: TicketStatus,
    pub sector: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage: Option<TriageVerdict>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub next_message_seq: u32,
}

/// What a requester submits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
}

impl NewTicket {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(HelpdeskError::validation("ticket title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(HelpdeskError::validation("ticket description is required"));
        }
        Ok(())
    }
}

pub fn next_id(tickets: &[Ticket]) -> String {
    let max = tickets
        .iter()
        .filter_map(|t| t.id.strip_prefix('T')?.parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    format!("T{}", max + 1)
}

pub fn find<'a>(tickets: &'a [Ticket], id: &str) -> Result<&'a Ticket> {
    tickets
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| HelpdeskError::TicketNotFound(id.to_string()))
}

pub fn find_mut<'a>(tickets: &'a mut [Ticket], id: &str) -> Result<&'a mut Ticket> {
    tickets
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| HelpdeskError::TicketNotFound(id.to_string()))
}

impl Ticket {
    /// Build a ticket from a triage verdict. The timeline starts with the
    /// requester's description followed by the assistant's acknowledgement,
    /// and the ticket waits on the requester.
    ///
    /// Authorization and input validation are the caller's job; the desk
    /// does both before it spends a classifier call.
    pub fn open(
        id: String,
        requester: &Actor,
        new: &NewTicket,
        verdict: TriageVerdict,
        assistant_name: &str,
    ) -> Self {
        let now = Utc::now();
        let mut ticket = Ticket {
            id,
            title: new.title.trim().to_string(),
            requester_id: requester.id.clone(),
            requester_name: requester.name.clone(),
            created_at: now,
            updated_at: now,
            status: TicketStatus::WaitingUser,
            sector: verdict.sector.clone(),
            priority: verdict.priority,
            assigned_agent_id: verdict.suggested_agent().map(str::to_string),
            rating: None,
            triage: None,
            messages: Vec::new(),
            next_message_seq: 0,
        };
        ticket.push(NewMessage::from_actor(
            &requester.id,
            &requester.name,
            new.description.trim(),
        ));
        ticket.push(
            NewMessage::from_actor(
                message::SYSTEM_SENDER_ID,
                assistant_name,
                verdict.auto_response.clone(),
            )
            .automated(),
        );
        ticket.triage = Some(verdict);
        ticket
    }

    fn push(&mut self, new: NewMessage) -> String {
        let id = message::append(&mut self.messages, &mut self.next_message_seq, &self.id, new);
        self.updated_at = Utc::now();
        id
    }

    fn reject(&self, to: TicketStatus, reason: &str) -> HelpdeskError {
        HelpdeskError::invalid_transition(self.status, to, reason)
    }

    fn move_to(&mut self, to: TicketStatus, reason: &str) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(self.reject(to, reason));
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_open_for_messages(&self) -> bool {
        self.status.accepts_messages()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Post a message. A public message hands the ball to the other side: a
    /// requester's reply moves the ticket to `in_progress`, a staff reply to
    /// `waiting_user`. Internal notes leave the status alone.
    pub fn send_message(
        &mut self,
        policy: &AccessPolicy,
        sender: &Actor,
        content: &str,
        internal: bool,
    ) -> Result<Message> {
        let action = if internal {
            Action::PostInternalNote
        } else {
            Action::PostPublicMessage {
                requester_id: &self.requester_id,
            }
        };
        policy.authorize(sender, action)?;

        let target = match (internal, sender.role) {
            (true, _) => self.status,
            (false, Role::Requester) => TicketStatus::InProgress,
            (false, _) => TicketStatus::WaitingUser,
        };
        if !self.is_open_for_messages() {
            return Err(self.reject(target, "ticket no longer accepts messages"));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(HelpdeskError::validation("message content is required"));
        }

        if !internal {
            self.move_to(target, "message not allowed in this state")?;
        }
        let mut new = NewMessage::from_actor(&sender.id, &sender.name, content);
        if internal {
            new = new.internal();
        }
        self.push(new);
        Ok(self.messages[self.messages.len() - 1].clone())
    }

    pub fn resolve(&mut self, policy: &AccessPolicy, actor: &Actor) -> Result<()> {
        policy.authorize(actor, Action::ResolveTicket)?;
        self.move_to(TicketStatus::Resolved, "ticket is already resolved or closed")
    }

    pub fn close(&mut self, policy: &AccessPolicy, actor: &Actor) -> Result<()> {
        policy.authorize(actor, Action::CloseTicket)?;
        self.move_to(TicketStatus::Closed, "only resolved tickets can be closed")
    }

    /// Reopen a resolved ticket on behalf of its requester.
    pub fn reopen(&mut self, policy: &AccessPolicy, actor: &Actor) -> Result<()> {
        policy.authorize(
            actor,
            Action::ReopenTicket {
                requester_id: &self.requester_id,
            },
        )?;
        if self.status != TicketStatus::Resolved {
            return Err(self.reject(TicketStatus::InProgress, "only resolved tickets can be reopened"));
        }
        self.move_to(TicketStatus::InProgress, "only resolved tickets can be reopened")?;
        self.push(NewMessage::system(format!(
            "Ticket reopened by {}.",
            actor.name
        )));
        Ok(())
    }

    /// Take ownership of the ticket. Re-assigning to the current assignee
    /// is allowed and records another note.
    pub fn assign_to_self(&mut self, policy: &AccessPolicy, actor: &Actor) -> Result<()> {
        policy.authorize(actor, Action::AssignToSelf)?;
        if !self.is_open_for_messages() {
            return Err(self.reject(
                TicketStatus::InProgress,
                "resolved and closed tickets cannot be assigned",
            ));
        }
        self.move_to(TicketStatus::InProgress, "ticket cannot be taken in this state")?;
        self.assigned_agent_id = Some(actor.id.clone());
        self.push(NewMessage::system(format!("{} took this ticket.", actor.name)).internal());
        Ok(())
    }

    pub fn rate(&mut self, policy: &AccessPolicy, actor: &Actor, score: u8) -> Result<()> {
        policy.authorize(
            actor,
            Action::RateTicket {
                requester_id: &self.requester_id,
            },
        )?;
        if self.status != TicketStatus::Resolved {
            return Err(self.reject(self.status, "only resolved tickets can be rated"));
        }
        if let Some(existing) = self.rating {
            return Err(self.reject(
                self.status,
                &format!("ticket was already rated {existing}"),
            ));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&score) {
            return Err(HelpdeskError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {score}"
            )));
        }
        self.rating = Some(score);
        self.updated_at = Utc::now();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::new("admin")
    }

    fn joe() -> Actor {
        Actor::seeded("U1", "Joe", Role::Requester)
    }

    fn carl() -> Actor {
        Actor::seeded("U2", "Carl", Role::Support)
    }

    fn verdict() -> TriageVerdict {
        TriageVerdict {
            sector: "IT".to_string(),
            priority: Priority::High,
            suggested_agent_id: "U2".to_string(),
            reasoning: "outage".to_string(),
            auto_response: "An IT technician will look into it.".to_string(),
            confidence_score: 0.8,
        }
    }

    fn vpn_ticket() -> Ticket {
        Ticket::open(
            "T1".to_string(),
            &joe(),
            &NewTicket {
                title: "VPN down".to_string(),
                description: "Cannot connect to the VPN".to_string(),
            },
            verdict(),
            "Helpdesk Assistant",
        )
    }

    #[test]
    fn open_seeds_two_messages() {
        let t = vpn_ticket();
        assert_eq!(t.status, TicketStatus::WaitingUser);
        assert_eq!(t.sector, "IT");
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.assigned_agent_id.as_deref(), Some("U2"));
        assert_eq!(t.messages.len(), 2);
        assert_eq!(t.messages[0].sender_id, "U1");
        assert!(t.messages[1].is_automated);
        assert_eq!(t.messages[1].sender_name, "Helpdesk Assistant");
        assert_eq!(t.messages[1].id, "T1-M2");
    }

    #[test]
    fn public_replies_flip_status() {
        let mut t = vpn_ticket();
        t.send_message(&policy(), &joe(), "still broken", false).unwrap();
        assert_eq!(t.status, TicketStatus::InProgress);
        t.send_message(&policy(), &carl(), "try reconnecting", false)
            .unwrap();
        assert_eq!(t.status, TicketStatus::WaitingUser);
    }

    #[test]
    fn internal_note_keeps_status() {
        let mut t = vpn_ticket();
        let m = t
            .send_message(&policy(), &carl(), "certificate expired", true)
            .unwrap();
        assert!(m.is_internal);
        assert_eq!(t.status, TicketStatus::WaitingUser);
    }

    #[test]
    fn requester_cannot_post_internal_note() {
        let mut t = vpn_ticket();
        let err = t.send_message(&policy(), &joe(), "secret", true).unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
        assert_eq!(t.messages.len(), 2);
    }

    #[test]
    fn other_requester_cannot_post() {
        let mut t = vpn_ticket();
        let stranger = Actor::seeded("U7", "Eve", Role::Requester);
        let err = t.send_message(&policy(), &stranger, "hi", false).unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
    }

    #[test]
    fn empty_message_rejected() {
        let mut t = vpn_ticket();
        let err = t.send_message(&policy(), &joe(), "   ", false).unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
        assert_eq!(t.status, TicketStatus::WaitingUser);
    }

    #[test]
    fn resolved_ticket_rejects_messages() {
        let mut t = vpn_ticket();
        t.resolve(&policy(), &carl()).unwrap();
        let err = t.send_message(&policy(), &joe(), "thanks", false).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
        let err = t.send_message(&policy(), &carl(), "note", true).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
        assert_eq!(t.messages.len(), 2);
    }

    #[test]
    fn resolve_twice_fails() {
        let mut t = vpn_ticket();
        t.resolve(&policy(), &carl()).unwrap();
        let err = t.resolve(&policy(), &carl()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
    }

    #[test]
    fn requester_cannot_resolve() {
        let mut t = vpn_ticket();
        let err = t.resolve(&policy(), &joe()).unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
        assert_eq!(t.status, TicketStatus::WaitingUser);
    }

    #[test]
    fn close_requires_resolved() {
        let mut t = vpn_ticket();
        let err = t.close(&policy(), &carl()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
        t.resolve(&policy(), &carl()).unwrap();
        t.close(&policy(), &carl()).unwrap();
        assert_eq!(t.status, TicketStatus::Closed);
        let err = t.send_message(&policy(), &joe(), "hello?", false).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
        let err = t.reopen(&policy(), &joe()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
    }

    #[test]
    fn reopen_appends_system_message() {
        let mut t = vpn_ticket();
        t.resolve(&policy(), &carl()).unwrap();
        t.reopen(&policy(), &joe()).unwrap();
        assert_eq!(t.status, TicketStatus::InProgress);
        let last = t.messages.last().unwrap();
        assert!(last.is_system());
        assert!(last.content.contains("Joe"));
    }

    #[test]
    fn reopen_only_from_resolved() {
        let mut t = vpn_ticket();
        let err = t.reopen(&policy(), &joe()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
        assert_eq!(t.messages.len(), 2);
    }

    #[test]
    fn assign_to_self_forces_in_progress_with_internal_note() {
        let mut t = vpn_ticket();
        t.assign_to_self(&policy(), &carl()).unwrap();
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.assigned_agent_id.as_deref(), Some("U2"));
        let last = t.messages.last().unwrap();
        assert!(last.is_internal);
        assert!(last.content.contains("Carl"));
        // again is fine
        t.assign_to_self(&policy(), &carl()).unwrap();
        assert_eq!(t.messages.len(), 4);
    }

    #[test]
    fn assign_rejected_once_resolved() {
        let mut t = vpn_ticket();
        t.resolve(&policy(), &carl()).unwrap();
        let err = t.assign_to_self(&policy(), &carl()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
        assert_eq!(t.status, TicketStatus::Resolved);
    }

    #[test]
    fn rating_is_set_once() {
        let mut t = vpn_ticket();
        let err = t.rate(&policy(), &joe(), 5).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));

        t.resolve(&policy(), &carl()).unwrap();
        let err = t.rate(&policy(), &joe(), 6).unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
        let err = t.rate(&policy(), &joe(), 0).unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));

        t.rate(&policy(), &joe(), 4).unwrap();
        let err = t.rate(&policy(), &joe(), 1).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
        assert_eq!(t.rating, Some(4));
    }

    #[test]
    fn staff_cannot_rate() {
        let mut t = vpn_ticket();
        t.resolve(&policy(), &carl()).unwrap();
        let err = t.rate(&policy(), &carl(), 5).unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
    }

    #[test]
    fn next_id_uses_max() {
        let mut a = vpn_ticket();
        a.id = "T4".to_string();
        assert_eq!(next_id(&[a]), "T5");
        assert_eq!(next_id(&[]), "T1");
    }
}
