pub mod actors;
pub mod articles;
pub mod config;
pub mod reports;
pub mod sectors;
pub mod tickets;

/// `?confirm=true` on destructive requests.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}
