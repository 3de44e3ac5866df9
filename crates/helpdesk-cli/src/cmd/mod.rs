pub mod actor;
pub mod config;
pub mod init;
pub mod kb;
pub mod report;
pub mod sector;
pub mod serve;
pub mod ticket;

/// Run one future to completion on a fresh runtime. Only the classifier
/// calls need one.
pub(crate) fn block_on<F: std::future::Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(fut))
}
