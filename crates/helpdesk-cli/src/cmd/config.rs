use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use helpdesk_core::config::{Config, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }

    println!("organization:         {}", config.organization.name);
    println!("master actor:         {}", config.master_actor_id);
    println!("manual triage sector: {}", config.manual_triage_sector);
    println!("assistant:            {}", config.assistant_name);
    println!(
        "allowed domain:       {}",
        config.allowed_domain().unwrap_or("(any)")
    );
    let key = if config.classifier.api_key().is_some() {
        "set"
    } else {
        "not set, triage is manual"
    };
    println!(
        "classifier:           {} at {} ({} {key})",
        config.classifier.model, config.classifier.endpoint, config.classifier.api_key_env
    );
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
