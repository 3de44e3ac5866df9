use crate::output::print_json;
use anyhow::Context;
use helpdesk_core::desk;
use std::path::Path;

pub fn run(root: &Path, org: Option<&str>, json: bool) -> anyhow::Result<()> {
    let organization = org.map(str::to_string).unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Helpdesk".to_string())
    });

    std::fs::create_dir_all(root)
        .with_context(|| format!("failed to create {}", root.display()))?;
    let report = desk::init(root, &organization).context("failed to initialize helpdesk")?;

    if json {
        return print_json(&report);
    }

    println!("Initializing helpdesk in: {}", root.display());
    for path in &report.created {
        println!("  created: {path}");
    }
    for path in &report.existing {
        println!("  exists:  {path}");
    }
    if !report.created.is_empty() {
        let config = helpdesk_core::config::Config::load(root)?;
        println!(
            "\nThe administrator account is '{}'. Act as it with `--as {}`.",
            config.master_actor_id, config.master_actor_id
        );
    }
    Ok(())
}
