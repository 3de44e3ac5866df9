//! Knowledge-base articles and their approval workflow.
//!
//! Layout:
//!   .helpdesk/articles.yaml  : every article, approved or not
//!
//! Articles get sequential IDs: KB1, KB2, …  The workflow state is derived
//! from two stored flags, `approved` and `review_requested`; see
//! [`ArticleState`].

use crate::access::{AccessPolicy, Action};
use crate::actor::Actor;
use crate::error::{HelpdeskError, Result};
use crate::sector;
use crate::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleState {
    Pending,
    Approved,
    /// Approved, but a support agent flagged it for re-validation.
    ReviewRequested,
    /// Flagged with changed content; approval revoked until validated.
    RevisionPending,
}

impl ArticleState {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleState::Pending => "pending",
            ArticleState::Approved => "approved",
            ArticleState::ReviewRequested => "review_requested",
            ArticleState::RevisionPending => "revision_pending",
        }
    }
}

impl fmt::Display for ArticleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub sector: String,
    pub author_id: String,
    pub approved: bool,
    #[serde(default)]
    pub review_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ticket_id: Option<String>,
}

/// The editable fields of an article, used for both create and edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub sector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ticket_id: Option<String>,
}

/// Trim tags, drop empties, and remove duplicates keeping the first
/// occurrence.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Split a comma-separated tag list the way forms submit it.
pub fn parse_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

fn validate_text(input: &ArticleInput) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(HelpdeskError::validation("article title is required"));
    }
    if input.content.trim().is_empty() {
        return Err(HelpdeskError::validation("article content is required"));
    }
    Ok(())
}

pub fn next_id(articles: &[KnowledgeArticle]) -> String {
    let max = articles
        .iter()
        .filter_map(|a| a.id.strip_prefix("KB")?.parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    format!("KB{}", max + 1)
}

pub fn find<'a>(articles: &'a [KnowledgeArticle], id: &str) -> Result<&'a KnowledgeArticle> {
    articles
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| HelpdeskError::ArticleNotFound(id.to_string()))
}

pub fn find_mut<'a>(
    articles: &'a mut [KnowledgeArticle],
    id: &str,
) -> Result<&'a mut KnowledgeArticle> {
    articles
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| HelpdeskError::ArticleNotFound(id.to_string()))
}

impl KnowledgeArticle {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        sector: impl Into<String>,
        author_id: impl Into<String>,
        approved: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            sector: sector.into(),
            author_id: author_id.into(),
            approved,
            review_requested: false,
            review_note: None,
            created_at: now,
            updated_at: now,
            source_ticket_id: None,
        }
    }

    pub fn state(&self) -> ArticleState {
        match (self.approved, self.review_requested) {
            (false, false) => ArticleState::Pending,
            (true, false) => ArticleState::Approved,
            (true, true) => ArticleState::ReviewRequested,
            (false, true) => ArticleState::RevisionPending,
        }
    }

    fn clear_review(&mut self) {
        self.review_requested = false;
        self.review_note = None;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Create an article. Admin-authored articles start approved; everyone
    /// else's start pending.
    pub fn create(
        id: String,
        policy: &AccessPolicy,
        author: &Actor,
        input: ArticleInput,
        sectors: &[String],
    ) -> Result<Self> {
        policy.authorize(author, Action::CreateArticle)?;
        validate_text(&input)?;
        sector::ensure_registered(sectors, &input.sector)?;

        let mut article = Self::new(
            id,
            input.title.trim(),
            input.content.trim(),
            input.sector,
            &author.id,
            author.role == Role::Admin,
        );
        article.tags = normalize_tags(&input.tags);
        article.source_ticket_id = input.source_ticket_id;
        Ok(article)
    }

    /// Replace the editable fields. Editing clears any pending review and
    /// never changes approval. A stale sector may be kept as is; a newly
    /// chosen one must be registered.
    pub fn edit(
        &mut self,
        policy: &AccessPolicy,
        editor: &Actor,
        input: ArticleInput,
        sectors: &[String],
    ) -> Result<()> {
        policy.authorize(
            editor,
            Action::EditArticle {
                approved: self.approved,
            },
        )?;
        validate_text(&input)?;
        if input.sector != self.sector {
            sector::ensure_registered(sectors, &input.sector)?;
        }

        self.title = input.title.trim().to_string();
        self.content = input.content.trim().to_string();
        self.tags = normalize_tags(&input.tags);
        self.sector = input.sector;
        if input.source_ticket_id.is_some() {
            self.source_ticket_id = input.source_ticket_id;
        }
        self.clear_review();
        self.touch();
        Ok(())
    }

    /// Flip between pending and approved. Approving clears the review flag;
    /// revoking leaves it in place. Returns the new approval.
    pub fn toggle_approval(&mut self, policy: &AccessPolicy, admin: &Actor) -> Result<bool> {
        policy.authorize(admin, Action::ToggleApproval)?;
        self.approved = !self.approved;
        if self.approved {
            self.clear_review();
        }
        self.touch();
        tracing::info!(article = %self.id, approved = self.approved, by = %admin.id, "article approval toggled");
        Ok(self.approved)
    }

    /// Flag an approved article for re-validation, optionally proposing new
    /// content. Changed content revokes approval until an admin validates.
    pub fn request_review(
        &mut self,
        policy: &AccessPolicy,
        agent: &Actor,
        note: &str,
        proposed_content: Option<&str>,
    ) -> Result<()> {
        policy.authorize(agent, Action::RequestReview)?;
        let note = note.trim();
        if note.is_empty() {
            return Err(HelpdeskError::validation("a review note is required"));
        }
        if !self.approved {
            return Err(HelpdeskError::invalid_transition(
                self.state(),
                ArticleState::ReviewRequested,
                "only approved articles can be sent for review",
            ));
        }

        let proposed = proposed_content.map(str::trim).filter(|c| !c.is_empty());
        if let Some(content) = proposed {
            if content != self.content {
                self.content = content.to_string();
                self.approved = false;
            }
        }
        self.review_requested = true;
        self.review_note = Some(note.to_string());
        self.touch();
        Ok(())
    }

    /// Accept a review request: keep the last submitted content and approve.
    pub fn validate_review(&mut self, policy: &AccessPolicy, admin: &Actor) -> Result<()> {
        policy.authorize(admin, Action::ValidateReview)?;
        if !self.review_requested {
            return Err(HelpdeskError::invalid_transition(
                self.state(),
                ArticleState::Approved,
                "article has no pending review",
            ));
        }
        self.clear_review();
        self.approved = true;
        self.touch();
        tracing::info!(article = %self.id, by = %admin.id, "article review validated");
        Ok(())
    }
}

/// Remove an article for good. `confirmed` must be set; deletion cannot be
/// undone.
pub fn delete(
    articles: &mut Vec<KnowledgeArticle>,
    policy: &AccessPolicy,
    admin: &Actor,
    id: &str,
    confirmed: bool,
) -> Result<KnowledgeArticle> {
    policy.authorize(admin, Action::DeleteArticle)?;
    let pos = articles
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| HelpdeskError::ArticleNotFound(id.to_string()))?;
    if !confirmed {
        return Err(HelpdeskError::validation(format!(
            "deleting article {id} is irreversible; confirmation required"
        )));
    }
    let removed = articles.remove(pos);
    tracing::info!(article = %id, by = %admin.id, "article deleted");
    Ok(removed)
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

    fn carl() -> Actor {
        Actor::seeded("U2", "Carl", Role::Support)
    }

    fn ana() -> Actor {
        Actor::seeded("admin", "Ana", Role::Admin)
    }

    fn sectors() -> Vec<String> {
        vec!["IT".to_string(), "Finance".to_string()]
    }

    fn input(title: &str, content: &str) -> ArticleInput {
        ArticleInput {
            title: title.to_string(),
            content: content.to_string(),
            tags: vec![" vpn ".to_string(), "".to_string(), "vpn".to_string(), "network".to_string()],
            sector: "IT".to_string(),
            source_ticket_id: None,
        }
    }

    fn approved_article() -> KnowledgeArticle {
        KnowledgeArticle::create(
            "KB1".to_string(),
            &policy(),
            &ana(),
            input("Reset VPN", "Reinstall the profile"),
            &sectors(),
        )
        .unwrap()
    }

    #[test]
    fn tags_are_normalized() {
        assert_eq!(
            parse_tags(" a, b ,, a,c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn support_creates_pending_admin_creates_approved() {
        let a = KnowledgeArticle::create(
            "KB1".to_string(),
            &policy(),
            &carl(),
            input("t", "c"),
            &sectors(),
        )
        .unwrap();
        assert_eq!(a.state(), ArticleState::Pending);
        assert_eq!(a.tags, vec!["vpn".to_string(), "network".to_string()]);
        assert_eq!(approved_article().state(), ArticleState::Approved);
    }

    #[test]
    fn requester_cannot_create() {
        let joe = Actor::seeded("U1", "Joe", Role::Requester);
        let err = KnowledgeArticle::create("KB1".to_string(), &policy(), &joe, input("t", "c"), &sectors())
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
    }

    #[test]
    fn create_requires_title_content_and_known_sector() {
        let err = KnowledgeArticle::create("KB1".to_string(), &policy(), &carl(), input(" ", "c"), &sectors())
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
        let mut bad = input("t", "c");
        bad.sector = "Astrology".to_string();
        let err = KnowledgeArticle::create("KB1".to_string(), &policy(), &carl(), bad, &sectors())
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
    }

    #[test]
    fn support_cannot_edit_approved() {
        let mut a = approved_article();
        let err = a
            .edit(&policy(), &carl(), input("new", "new"), &sectors())
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
        assert_eq!(a.title, "Reset VPN");
    }

    #[test]
    fn edit_keeps_stale_sector_but_rejects_new_unknown_one() {
        let mut a = approved_article();
        a.sector = "Removed".to_string();
        let mut keep = input("t2", "c2");
        keep.sector = "Removed".to_string();
        a.edit(&policy(), &ana(), keep, &sectors()).unwrap();
        assert_eq!(a.sector, "Removed");

        let mut other = input("t3", "c3");
        other.sector = "Also Unknown".to_string();
        let err = a.edit(&policy(), &ana(), other, &sectors()).unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
    }

    #[test]
    fn edit_clears_review_without_approving() {
        let mut a = approved_article();
        a.request_review(&policy(), &carl(), "outdated", Some("new steps"))
            .unwrap();
        assert_eq!(a.state(), ArticleState::RevisionPending);
        a.edit(&policy(), &carl(), input("Reset VPN", "newer steps"), &sectors())
            .unwrap();
        assert!(!a.review_requested);
        assert!(a.review_note.is_none());
        assert_eq!(a.state(), ArticleState::Pending);
    }

    #[test]
    fn review_with_empty_note_fails() {
        let mut a = approved_article();
        let err = a.request_review(&policy(), &carl(), "  ", None).unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
        assert!(!a.review_requested);
    }

    #[test]
    fn empty_note_fails_validation_on_pending_article() {
        let mut a = approved_article();
        a.approved = false;
        let err = a.request_review(&policy(), &carl(), "", None).unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
    }

    #[test]
    fn review_requires_approved_article() {
        let mut a = approved_article();
        a.approved = false;
        let err = a
            .request_review(&policy(), &carl(), "check", None)
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
    }

    #[test]
    fn review_with_same_content_keeps_approval() {
        let mut a = approved_article();
        a.request_review(&policy(), &carl(), "double-check", Some("Reinstall the profile"))
            .unwrap();
        assert!(a.approved);
        assert_eq!(a.state(), ArticleState::ReviewRequested);
        assert_eq!(a.review_note.as_deref(), Some("double-check"));
    }

    #[test]
    fn review_with_changed_content_revokes_approval() {
        let mut a = approved_article();
        a.request_review(&policy(), &carl(), "new client", Some("Use the new client"))
            .unwrap();
        assert!(!a.approved);
        assert_eq!(a.content, "Use the new client");
    }

    #[test]
    fn validate_review_approves_and_clears() {
        let mut a = approved_article();
        a.request_review(&policy(), &carl(), "new client", Some("Use the new client"))
            .unwrap();
        a.validate_review(&policy(), &ana()).unwrap();
        assert!(a.approved);
        assert!(!a.review_requested);
        assert!(a.review_note.is_none());
        assert_eq!(a.content, "Use the new client");

        let err = a.validate_review(&policy(), &ana()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InvalidTransition { .. }));
    }

    #[test]
    fn toggle_on_clears_review_toggle_off_does_not() {
        let mut a = approved_article();
        a.request_review(&policy(), &carl(), "check", None).unwrap();
        assert!(!a.toggle_approval(&policy(), &ana()).unwrap());
        assert!(a.review_requested);
        assert!(a.toggle_approval(&policy(), &ana()).unwrap());
        assert!(!a.review_requested);
        assert!(a.review_note.is_none());
    }

    #[test]
    fn delete_requires_admin_and_confirmation() {
        let mut articles = vec![approved_article()];
        let err = delete(&mut articles, &policy(), &carl(), "KB1", true).unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
        let err = delete(&mut articles, &policy(), &ana(), "KB1", false).unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
        assert_eq!(articles.len(), 1);
        delete(&mut articles, &policy(), &ana(), "KB1", true).unwrap();
        assert!(articles.is_empty());
    }
}
