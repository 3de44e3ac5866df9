use helpdesk_core::HelpdeskError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier returned no candidate text")]
    EmptyResponse,

    #[error("failed to parse classifier JSON: {source}\n  text: {text}")]
    Parse {
        text: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ClassifierError> for HelpdeskError {
    fn from(e: ClassifierError) -> Self {
        HelpdeskError::ExternalService(e.to_string())
    }
}
