//! `helpdesk-classifier`: the HTTP classifier behind ticket triage and
//! knowledge-base import.
//!
//! [`from_config`] is the only entry point most callers need: it returns a
//! [`GeminiClassifier`] when an API key is available and an
//! [`OfflineClassifier`] otherwise, so triage and import fall back to their
//! manual paths instead of failing.

pub mod error;
pub mod gemini;
pub mod prompt;

use std::sync::Arc;

use helpdesk_core::classifier::{Classifier, OfflineClassifier};
use helpdesk_core::config::ClassifierConfig;
use tracing::{info, warn};

pub use error::ClassifierError;
pub use gemini::GeminiClassifier;

pub fn from_config(config: &ClassifierConfig) -> Arc<dyn Classifier> {
    let Some(key) = config.api_key() else {
        info!(
            env = %config.api_key_env,
            "no classifier API key set, triage will fall back to manual"
        );
        return Arc::new(OfflineClassifier::new(format!(
            "{} is not set",
            config.api_key_env
        )));
    };

    match GeminiClassifier::new(config, key) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            warn!(error = %e, "failed to build classifier client");
            Arc::new(OfflineClassifier::new(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::triage::TriageRequest;

    #[tokio::test]
    async fn missing_key_yields_offline_classifier() {
        let config = ClassifierConfig {
            api_key_env: "HELPDESK_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ClassifierConfig::default()
        };
        let classifier = from_config(&config);
        let req = TriageRequest {
            title: "t".to_string(),
            description: "d".to_string(),
            available_agents: Vec::new(),
            approved_knowledge: Vec::new(),
            available_sectors: Vec::new(),
        };
        let err = classifier.triage(&req).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("HELPDESK_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
