//! Turning a resolved ticket into a knowledge-base article prefill.
//!
//! The classifier reads the ticket's history and proposes a title, tags and
//! a problem statement. The result is only a prefill: the operator completes
//! the solution and submits it through the normal create path, which is
//! where authorization and approval happen.

use crate::article::{normalize_tags, ArticleInput};
use crate::classifier::Classifier;
use crate::error::{HelpdeskError, Result};
use crate::ticket::Ticket;
use crate::types::TicketStatus;
use serde::{Deserialize, Serialize};

pub const SOLUTION_PLACEHOLDER: &str = "[Describe the solution here]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLine {
    pub sender_name: String,
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraftRequest {
    pub ticket_title: String,
    pub sector: String,
    pub message_history: Vec<HistoryLine>,
}

impl ArticleDraftRequest {
    /// The full history is sent, internal notes included; they often hold
    /// the actual fix.
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            ticket_title: ticket.title.clone(),
            sector: ticket.sector.clone(),
            message_history: ticket
                .messages
                .iter()
                .map(|m| HistoryLine {
                    sender_name: m.sender_name.clone(),
                    content: m.content.clone(),
                    is_internal: m.is_internal,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    #[serde(default)]
    pub problem_description: String,
    #[serde(default)]
    pub suggested_title: String,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
    #[serde(default)]
    pub sufficient_information: bool,
}

impl ArticleDraft {
    pub fn insufficient(ticket_title: &str) -> Self {
        Self {
            problem_description: String::new(),
            suggested_title: ticket_title.to_string(),
            suggested_tags: Vec::new(),
            sufficient_information: false,
        }
    }
}

/// The form an operator starts from. `complete` is false when the
/// classifier could not make sense of the ticket and only the title was
/// carried over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePrefill {
    pub input: ArticleInput,
    pub complete: bool,
}

pub fn skeleton(problem: &str, solution: Option<&str>) -> String {
    let solution = solution
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(SOLUTION_PLACEHOLDER);
    format!("**Problem:**\n{}\n\n**Solution:**\n{solution}", problem.trim())
}

/// Ask the classifier for a draft of `ticket` and shape it into a prefill.
/// Classifier failures degrade to a title-only prefill.
pub async fn import(classifier: &dyn Classifier, ticket: &Ticket) -> Result<ArticlePrefill> {
    if ticket.status != TicketStatus::Resolved {
        return Err(HelpdeskError::invalid_transition(
            ticket.status,
            "knowledge_base",
            "only resolved tickets can be imported",
        ));
    }

    let request = ArticleDraftRequest::from_ticket(ticket);
    let draft = match classifier.draft_article(&request).await {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(ticket = %ticket.id, error = %e, "article draft failed; falling back to manual entry");
            ArticleDraft::insufficient(&ticket.title)
        }
    };

    let complete = draft.sufficient_information && !draft.problem_description.trim().is_empty();
    let input = if complete {
        let title = Some(draft.suggested_title.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(ticket.title.as_str())
            .to_string();
        ArticleInput {
            title,
            content: skeleton(&draft.problem_description, None),
            tags: normalize_tags(&draft.suggested_tags),
            sector: ticket.sector.clone(),
            source_ticket_id: Some(ticket.id.clone()),
        }
    } else {
        ArticleInput {
            title: ticket.title.clone(),
            content: String::new(),
            tags: Vec::new(),
            sector: ticket.sector.clone(),
            source_ticket_id: Some(ticket.id.clone()),
        }
    };
    Ok(ArticlePrefill { input, complete })
}
