//! Triage: routing a new ticket through the external classifier.
//!
//! [`triage`] never fails: a transport error, an unparsable answer, or a
//! verdict naming a sector outside the registry all collapse into
//! [`TriageVerdict::fallback`], which routes the ticket to the manual-triage
//! sector at medium priority.

use crate::actor::Actor;
use crate::article::KnowledgeArticle;
use crate::classifier::Classifier;
use crate::types::{Priority, Role};
use serde::{Deserialize, Serialize};

pub const FALLBACK_REASONING: &str =
    "Automatic analysis failed. Please classify this ticket manually.";
pub const FALLBACK_RESPONSE: &str =
    "We received your request and it will be reviewed manually shortly.";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageRequest {
    pub title: String,
    pub description: String,
    pub available_agents: Vec<AgentProfile>,
    pub approved_knowledge: Vec<KnowledgeSnippet>,
    pub available_sectors: Vec<String>,
}

impl TriageRequest {
    /// Assemble a request from the desk's collections: approved support
    /// agents with a home sector, approved articles only, and the full
    /// sector registry.
    pub fn build(
        title: &str,
        description: &str,
        actors: &[Actor],
        articles: &[KnowledgeArticle],
        sectors: &[String],
    ) -> Self {
        let available_agents = actors
            .iter()
            .filter(|a| a.approved && a.role == Role::Support)
            .filter_map(|a| {
                a.home_sector.as_ref().map(|sector| AgentProfile {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    sector: sector.clone(),
                })
            })
            .collect();

        let approved_knowledge = articles
            .iter()
            .filter(|a| a.approved)
            .map(|a| KnowledgeSnippet {
                title: a.title.clone(),
                content: a.content.clone(),
                tags: a.tags.clone(),
            })
            .collect();

        Self {
            title: title.to_string(),
            description: description.to_string(),
            available_agents,
            approved_knowledge,
            available_sectors: sectors.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageVerdict {
    pub sector: String,
    pub priority: Priority,
    #[serde(default)]
    pub suggested_agent_id: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub auto_response: String,
    #[serde(default)]
    pub confidence_score: f64,
}

impl TriageVerdict {
    pub fn fallback(manual_sector: &str) -> Self {
        Self {
            sector: manual_sector.to_string(),
            priority: Priority::Medium,
            suggested_agent_id: String::new(),
            reasoning: FALLBACK_REASONING.to_string(),
            auto_response: FALLBACK_RESPONSE.to_string(),
            confidence_score: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence_score == 0.0 && self.reasoning == FALLBACK_REASONING
    }

    pub fn suggested_agent(&self) -> Option<&str> {
        Some(self.suggested_agent_id.as_str()).filter(|id| !id.is_empty())
    }

    /// Hold the verdict to the request's contract. A sector outside the
    /// registry voids the whole verdict; an unknown agent is dropped and the
    /// confidence clamped into `[0, 1]`.
    fn conform(mut self, request: &TriageRequest) -> Option<Self> {
        if !request.available_sectors.iter().any(|s| *s == self.sector) {
            return None;
        }
        if !request
            .available_agents
            .iter()
            .any(|a| a.id == self.suggested_agent_id)
        {
            self.suggested_agent_id.clear();
        }
        self.confidence_score = if self.confidence_score.is_finite() {
            self.confidence_score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.auto_response.trim().is_empty() {
            self.auto_response = FALLBACK_RESPONSE.to_string();
        }
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// triage
// ---------------------------------------------------------------------------

/// A validated ticket waiting on its verdict. Holding one touches no
/// store, so callers can run the classifier without blocking writers.
#[derive(Debug, Clone)]
pub struct TriageJob {
    pub request: TriageRequest,
    pub manual_sector: String,
}

impl TriageJob {
    pub async fn run(&self, classifier: &dyn Classifier) -> TriageVerdict {
        triage(classifier, &self.request, &self.manual_sector).await
    }
}

/// Ask the classifier for a verdict, substituting the fallback on any
/// failure.
pub async fn triage(
    classifier: &dyn Classifier,
    request: &TriageRequest,
    manual_sector: &str,
) -> TriageVerdict {
    match classifier.triage(request).await {
        Ok(verdict) => {
            let sector = verdict.sector.clone();
            match verdict.conform(request) {
                Some(v) => v,
                None => {
                    tracing::warn!(%sector, "classifier chose an unregistered sector; using manual triage");
                    TriageVerdict::fallback(manual_sector)
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "triage failed; using manual triage");
            TriageVerdict::fallback(manual_sector)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
