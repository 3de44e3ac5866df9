pub mod access;
pub mod actor;
pub mod article;
pub mod classifier;
pub mod config;
pub mod desk;
pub mod error;
pub mod io;
pub mod kb_import;
pub mod message;
pub mod paths;
pub mod report;
pub mod sector;
pub mod store;
pub mod ticket;
pub mod triage;
pub mod types;
pub mod view;

pub use desk::Helpdesk;
pub use error::{HelpdeskError, Result};
