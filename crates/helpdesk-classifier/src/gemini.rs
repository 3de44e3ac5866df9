//! `generateContent` client: one structured-output call per question.

use std::time::Duration;

use async_trait::async_trait;
use helpdesk_core::classifier::Classifier;
use helpdesk_core::config::ClassifierConfig;
use helpdesk_core::kb_import::{ArticleDraft, ArticleDraftRequest};
use helpdesk_core::triage::{TriageRequest, TriageVerdict};
use helpdesk_core::types::Priority;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ClassifierError;
use crate::prompt;

pub struct GeminiClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl GeminiClassifier {
    pub fn new(config: &ClassifierConfig, api_key: impl Into<String>) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            temperature: config.temperature,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send one prompt with a response schema and decode the candidate text
    /// as `T`.
    async fn generate<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: Value,
    ) -> Result<T, ClassifierError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
                "temperature": self.temperature,
            }
        });

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = response.json().await?;
        let text = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ClassifierError::EmptyResponse)?;
        debug!(model = %self.model, bytes = text.len(), "classifier responded");

        serde_json::from_str(text).map_err(|source| ClassifierError::Parse {
            text: text.to_string(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVerdict {
    sector: String,
    priority: Priority,
    #[serde(default)]
    suggested_agent_id: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    auto_response: String,
    #[serde(default)]
    confidence_score: f64,
}

impl From<WireVerdict> for TriageVerdict {
    fn from(w: WireVerdict) -> Self {
        TriageVerdict {
            sector: w.sector,
            priority: w.priority,
            suggested_agent_id: w.suggested_agent_id,
            reasoning: w.reasoning,
            auto_response: w.auto_response,
            confidence_score: w.confidence_score,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDraft {
    #[serde(default)]
    problem_description: String,
    #[serde(default)]
    suggested_title: String,
    #[serde(default)]
    suggested_tags: Vec<String>,
    #[serde(default)]
    sufficient_information: bool,
}

impl From<WireDraft> for ArticleDraft {
    fn from(w: WireDraft) -> Self {
        ArticleDraft {
            problem_description: w.problem_description,
            suggested_title: w.suggested_title,
            suggested_tags: w.suggested_tags,
            sufficient_information: w.sufficient_information,
        }
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn triage(&self, request: &TriageRequest) -> helpdesk_core::Result<TriageVerdict> {
        let wire: WireVerdict = self
            .generate(prompt::triage_prompt(request), prompt::triage_schema(request))
            .await?;
        Ok(wire.into())
    }

    async fn draft_article(
        &self,
        request: &ArticleDraftRequest,
    ) -> helpdesk_core::Result<ArticleDraft> {
        let wire: WireDraft = self
            .generate(prompt::draft_prompt(request), prompt::draft_schema())
            .await?;
        Ok(wire.into())
    }
}
