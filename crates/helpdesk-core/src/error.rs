use thiserror::Error;

#[derive(Debug, Error)]
pub enum HelpdeskError {
    #[error("not initialized: run 'helpdesk init'")]
    NotInitialized,

    #[error("actor '{actor}' is not allowed to {action}")]
    Unauthorized { actor: String, action: String },

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("classifier unavailable: {0}")]
    ExternalService(String),

    #[error("actor not found: {0}")]
    ActorNotFound(String),

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error("article not found: {0}")]
    ArticleNotFound(String),

    #[error("report schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HelpdeskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        HelpdeskError::Validation(msg.into())
    }

    pub fn invalid_transition(
        from: impl ToString,
        to: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        HelpdeskError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HelpdeskError>;
