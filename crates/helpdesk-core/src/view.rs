//! Role-filtered read views.
//!
//! These are what the CLI and the HTTP API hand out. A requester's view of
//! a ticket never contains internal notes; the filtering happens here, on
//! the data, not in any renderer.

use crate::access::{AccessPolicy, Action};
use crate::actor::Actor;
use crate::article::{ArticleState, KnowledgeArticle};
use crate::error::Result;
use crate::message::{self, Message};
use crate::ticket::Ticket;
use crate::triage::TriageVerdict;
use crate::types::{Priority, Role, TicketStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// What the viewer may do next with a ticket, given role and state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketCapabilities {
    pub can_reply: bool,
    pub can_post_internal: bool,
    pub can_resolve: bool,
    pub can_close: bool,
    pub can_reopen: bool,
    pub can_assign: bool,
    pub can_rate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    pub id: String,
    pub title: String,
    pub requester_id: String,
    pub requester_name: String,
    pub status: TicketStatus,
    pub sector: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Staff only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triage: Option<TriageVerdict>,
    pub messages: Vec<Message>,
    pub capabilities: TicketCapabilities,
}

fn ticket_capabilities(policy: &AccessPolicy, viewer: &Actor, t: &Ticket) -> TicketCapabilities {
    let owner = t.requester_id.as_str();
    let open = t.status.accepts_messages();
    let resolved = t.status == TicketStatus::Resolved;
    TicketCapabilities {
        can_reply: open && policy.permits(viewer, &Action::PostPublicMessage { requester_id: owner }),
        can_post_internal: open && policy.permits(viewer, &Action::PostInternalNote),
        can_resolve: open && policy.permits(viewer, &Action::ResolveTicket),
        can_close: resolved && policy.permits(viewer, &Action::CloseTicket),
        can_reopen: resolved && policy.permits(viewer, &Action::ReopenTicket { requester_id: owner }),
        can_assign: open
            && t.assigned_agent_id.as_deref() != Some(viewer.id.as_str())
            && policy.permits(viewer, &Action::AssignToSelf),
        can_rate: resolved
            && t.rating.is_none()
            && policy.permits(viewer, &Action::RateTicket { requester_id: owner }),
    }
}

impl TicketView {
    pub fn build(policy: &AccessPolicy, viewer: &Actor, ticket: &Ticket) -> Result<Self> {
        policy.authorize(
            viewer,
            Action::ViewTicket {
                requester_id: &ticket.requester_id,
            },
        )?;
        let staff = viewer.is_staff();
        let messages = if staff {
            ticket.messages.clone()
        } else {
            message::public_only(&ticket.messages)
        };
        Ok(Self {
            id: ticket.id.clone(),
            title: ticket.title.clone(),
            requester_id: ticket.requester_id.clone(),
            requester_name: ticket.requester_name.clone(),
            status: ticket.status,
            sector: ticket.sector.clone(),
            priority: ticket.priority,
            assigned_agent_id: ticket.assigned_agent_id.clone(),
            rating: ticket.rating,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            triage: if staff { ticket.triage.clone() } else { None },
            messages,
            capabilities: ticket_capabilities(policy, viewer, ticket),
        })
    }
}

/// One row of a ticket queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: String,
    pub title: String,
    pub requester_name: String,
    pub status: TicketStatus,
    pub sector: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketSummary {
    fn from(t: &Ticket) -> Self {
        Self {
            id: t.id.clone(),
            title: t.title.clone(),
            requester_name: t.requester_name.clone(),
            status: t.status,
            sector: t.sector.clone(),
            priority: t.priority,
            assigned_agent_id: t.assigned_agent_id.clone(),
            rating: t.rating,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketQuery {
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub sector: Option<String>,
    /// Case-insensitive match on id, title, sector or requester name.
    #[serde(default)]
    pub text: Option<String>,
}

impl TicketQuery {
    fn matches(&self, t: &Ticket) -> bool {
        if self.status.is_some_and(|s| s != t.status) {
            return false;
        }
        if self.sector.as_deref().is_some_and(|s| s != t.sector) {
            return false;
        }
        match self.text.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(text) => {
                let needle = text.to_lowercase();
                [&t.id, &t.title, &t.sector, &t.requester_name]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// The tickets `viewer` may see, newest first: a requester's own tickets,
/// or every ticket for staff.
pub fn queue(
    policy: &AccessPolicy,
    viewer: &Actor,
    tickets: &[Ticket],
    query: &TicketQuery,
) -> Result<Vec<TicketSummary>> {
    // Passes for any approved actor viewing their own tickets.
    policy.authorize(
        viewer,
        Action::ViewTicket {
            requester_id: &viewer.id,
        },
    )?;
    let mut rows: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| viewer.role != Role::Requester || t.requester_id == viewer.id)
        .filter(|t| query.matches(t))
        .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(rows.into_iter().map(TicketSummary::from).collect())
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleCapabilities {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_toggle_approval: bool,
    pub can_request_review: bool,
    pub can_validate_review: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: KnowledgeArticle,
    pub state: ArticleState,
    pub capabilities: ArticleCapabilities,
}

impl ArticleView {
    pub fn build(policy: &AccessPolicy, viewer: &Actor, article: &KnowledgeArticle) -> Result<Self> {
        policy.authorize(viewer, Action::ReadKnowledgeBase)?;
        let capabilities = ArticleCapabilities {
            can_edit: policy.permits(
                viewer,
                &Action::EditArticle {
                    approved: article.approved,
                },
            ),
            can_delete: policy.permits(viewer, &Action::DeleteArticle),
            can_toggle_approval: policy.permits(viewer, &Action::ToggleApproval),
            can_request_review: article.approved && policy.permits(viewer, &Action::RequestReview),
            can_validate_review: article.review_requested
                && policy.permits(viewer, &Action::ValidateReview),
        };
        Ok(Self {
            article: article.clone(),
            state: article.state(),
            capabilities,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleQuery {
    /// Case-insensitive match on title, content or any tag.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
}

impl ArticleQuery {
    fn matches(&self, a: &KnowledgeArticle) -> bool {
        if self.sector.as_deref().is_some_and(|s| s != a.sector) {
            return false;
        }
        match self.text.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(text) => {
                let needle = text.to_lowercase();
                a.title.to_lowercase().contains(&needle)
                    || a.content.to_lowercase().contains(&needle)
                    || a.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Search the knowledge base, newest first.
pub fn search_articles(
    policy: &AccessPolicy,
    viewer: &Actor,
    articles: &[KnowledgeArticle],
    query: &ArticleQuery,
) -> Result<Vec<ArticleView>> {
    policy.authorize(viewer, Action::ReadKnowledgeBase)?;
    let mut hits: Vec<&KnowledgeArticle> = articles.iter().filter(|a| query.matches(a)).collect();
    hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    hits.into_iter()
        .map(|a| ArticleView::build(policy, viewer, a))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HelpdeskError;
    use crate::ticket::NewTicket;

    fn policy() -> AccessPolicy {
        AccessPolicy::new("admin")
    }

    fn joe() -> Actor {
        Actor::seeded("U1", "Joe", Role::Requester)
    }

    fn carl() -> Actor {
        Actor::seeded("U2", "Carl", Role::Support)
    }

    fn ticket(id: &str, requester: &Actor, title: &str) -> Ticket {
        Ticket::open(
            id.to_string(),
            requester,
            &NewTicket {
                title: title.to_string(),
                description: "details".to_string(),
            },
            TriageVerdict::fallback("Manual Triage"),
            "Assistant",
        )
    }

    #[test]
    fn requester_view_hides_internal_notes() {
        let mut t = ticket("T1", &joe(), "VPN down");
        t.send_message(&policy(), &carl(), "cert expired", true).unwrap();
        t.send_message(&policy(), &carl(), "please retry", false).unwrap();

        let mine = TicketView::build(&policy(), &joe(), &t).unwrap();
        assert_eq!(mine.messages.len(), 3);
        assert!(mine.messages.iter().all(|m| !m.is_internal));
        assert!(mine.triage.is_none());
        assert!(mine.capabilities.can_reply);
        assert!(!mine.capabilities.can_post_internal);

        let staff = TicketView::build(&policy(), &carl(), &t).unwrap();
        assert_eq!(staff.messages.len(), 4);
        assert!(staff.triage.is_some());
        assert!(staff.capabilities.can_resolve);
    }

    #[test]
    fn other_requester_cannot_view() {
        let t = ticket("T1", &joe(), "VPN down");
        let eve = Actor::seeded("U7", "Eve", Role::Requester);
        let err = TicketView::build(&policy(), &eve, &t).unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
    }

    #[test]
    fn resolved_ticket_offers_rate_and_reopen() {
        let mut t = ticket("T1", &joe(), "VPN down");
        t.resolve(&policy(), &carl()).unwrap();
        let v = TicketView::build(&policy(), &joe(), &t).unwrap();
        assert!(v.capabilities.can_rate);
        assert!(v.capabilities.can_reopen);
        assert!(!v.capabilities.can_reply);
    }

    #[test]
    fn queue_scopes_requesters_to_own_tickets() {
        let eve = Actor::seeded("U7", "Eve", Role::Requester);
        let tickets = vec![
            ticket("T1", &joe(), "VPN down"),
            ticket("T2", &eve, "Payroll question"),
        ];
        let mine = queue(&policy(), &joe(), &tickets, &TicketQuery::default()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "T1");

        let all = queue(&policy(), &carl(), &tickets, &TicketQuery::default()).unwrap();
        assert_eq!(all.len(), 2);

        let q = TicketQuery {
            text: Some("payroll".to_string()),
            ..Default::default()
        };
        let found = queue(&policy(), &carl(), &tickets, &q).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "T2");
    }

    #[test]
    fn article_capabilities_follow_matrix() {
        let mut a = KnowledgeArticle::new("KB1", "VPN", "steps", "IT", "U2", true);
        let v = ArticleView::build(&policy(), &carl(), &a).unwrap();
        assert!(!v.capabilities.can_edit);
        assert!(v.capabilities.can_request_review);
        assert!(!v.capabilities.can_delete);

        a.approved = false;
        let v = ArticleView::build(&policy(), &carl(), &a).unwrap();
        assert!(v.capabilities.can_edit);
        assert!(!v.capabilities.can_request_review);

        let err = ArticleView::build(&policy(), &joe(), &a).unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
    }

    #[test]
    fn search_matches_tags_and_sector() {
        let mut a = KnowledgeArticle::new("KB1", "Reset VPN", "steps", "IT", "U2", true);
        a.tags = vec!["Network".to_string()];
        let b = KnowledgeArticle::new("KB2", "Expense report", "fill form", "Finance", "U2", true);
        let articles = vec![a, b];

        let q = ArticleQuery {
            text: Some("network".to_string()),
            sector: None,
        };
        let hits = search_articles(&policy(), &carl(), &articles, &q).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].article.id, "KB1");

        let q = ArticleQuery {
            text: None,
            sector: Some("Finance".to_string()),
        };
        let hits = search_articles(&policy(), &carl(), &articles, &q).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].article.id, "KB2");
    }
}
