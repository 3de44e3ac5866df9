//! The external classifier boundary.
//!
//! The classifier is asked two kinds of questions: how to route a new ticket
//! ([`TriageRequest`]) and how to turn a resolved ticket into a knowledge
//! article ([`ArticleDraftRequest`]). Implementations report failure as
//! [`HelpdeskError::ExternalService`]; the triage and import paths absorb it
//! with their fixed fallbacks, so callers of those paths never see it.

use crate::error::{HelpdeskError, Result};
use crate::kb_import::{ArticleDraft, ArticleDraftRequest};
use crate::triage::{TriageRequest, TriageVerdict};
use async_trait::async_trait;

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn triage(&self, request: &TriageRequest) -> Result<TriageVerdict>;

    async fn draft_article(&self, request: &ArticleDraftRequest) -> Result<ArticleDraft>;
}

// ---------------------------------------------------------------------------
// OfflineClassifier
// ---------------------------------------------------------------------------

/// A classifier that is not configured. Every call fails, which sends triage
/// and import down their manual fallback paths.
#[derive(Debug, Clone)]
pub struct OfflineClassifier {
    reason: String,
}

impl OfflineClassifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Classifier for OfflineClassifier {
    async fn triage(&self, _request: &TriageRequest) -> Result<TriageVerdict> {
        Err(HelpdeskError::ExternalService(self.reason.clone()))
    }

    async fn draft_article(&self, _request: &ArticleDraftRequest) -> Result<ArticleDraft> {
        Err(HelpdeskError::ExternalService(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// FixedClassifier
// ---------------------------------------------------------------------------

/// Answers every request with a canned response; a missing response behaves
/// like an unreachable service. Useful for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedClassifier {
    pub verdict: Option<TriageVerdict>,
    pub draft: Option<ArticleDraft>,
}

impl FixedClassifier {
    pub fn with_verdict(verdict: TriageVerdict) -> Self {
        Self {
            verdict: Some(verdict),
            draft: None,
        }
    }

    pub fn with_draft(draft: ArticleDraft) -> Self {
        Self {
            verdict: None,
            draft: Some(draft),
        }
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn triage(&self, _request: &TriageRequest) -> Result<TriageVerdict> {
        self.verdict
            .clone()
            .ok_or_else(|| HelpdeskError::ExternalService("no triage response".to_string()))
    }

    async fn draft_article(&self, _request: &ArticleDraftRequest) -> Result<ArticleDraft> {
        self.draft
            .clone()
            .ok_or_else(|| HelpdeskError::ExternalService("no draft response".to_string()))
    }
}
