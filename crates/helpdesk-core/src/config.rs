use crate::error::{HelpdeskError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// OrganizationConfig / RegistrationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// When set, self-registration requires an email in this domain.
    #[serde(default)]
    pub allowed_domain: Option<String>,
}

// ---------------------------------------------------------------------------
// ClassifierConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "HELPDESK_CLASSIFIER_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClassifierConfig {
    /// The API key from the configured environment variable, if set and
    /// non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub organization: OrganizationConfig,
    #[serde(default = "default_master_actor_id")]
    pub master_actor_id: String,
    #[serde(default = "default_manual_triage_sector")]
    pub manual_triage_sector: String,
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_version() -> u32 {
    1
}

fn default_master_actor_id() -> String {
    "admin".to_string()
}

fn default_manual_triage_sector() -> String {
    "Manual Triage".to_string()
}

fn default_assistant_name() -> String {
    "Helpdesk Assistant".to_string()
}

impl Config {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            version: 1,
            organization: OrganizationConfig {
                name: organization.into(),
            },
            master_actor_id: default_master_actor_id(),
            manual_triage_sector: default_manual_triage_sector(),
            assistant_name: default_assistant_name(),
            registration: RegistrationConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }

    pub fn allowed_domain(&self) -> Option<&str> {
        self.registration
            .allowed_domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(HelpdeskError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::config_path(root), self)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.master_actor_id.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "master_actor_id is empty".to_string(),
            });
        }

        if self.manual_triage_sector.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "manual_triage_sector is empty; failed triage would route nowhere"
                    .to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.classifier.temperature) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "classifier.temperature={} is outside 0.0..=2.0",
                    self.classifier.temperature
                ),
            });
        }

        if self.classifier.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "classifier.timeout_secs is 0; requests will fail immediately"
                    .to_string(),
            });
        }

        if let Some(domain) = self.allowed_domain() {
            if domain.trim_start_matches('@').contains('@') {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("registration.allowed_domain '{domain}' contains '@'"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
