use crate::root::open_desk;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, port: u16) -> anyhow::Result<()> {
    let config = open_desk(root)?.config().context("failed to load config")?;
    for w in config.validate() {
        tracing::warn!("config: {}", w.message);
    }
    let classifier = helpdesk_classifier::from_config(&config.classifier);
    let name = config.organization.name;

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!(
            "Helpdesk API for '{name}' on http://localhost:{actual_port}  (PID {})",
            std::process::id()
        );

        tokio::select! {
            res = helpdesk_server::serve_on(root_buf, listener, classifier) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
