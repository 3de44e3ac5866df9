use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use helpdesk_core::classifier::Classifier;
use helpdesk_core::store::FileStore;
use helpdesk_core::Helpdesk;

use crate::error::AppError;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub classifier: Arc<dyn Classifier>,
    /// Serializes every load, mutate, save cycle against the YAML files.
    write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(root: PathBuf, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            root,
            classifier,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open the desk and run `f` on the blocking pool while holding the
    /// write lock. Each call reads and writes whole YAML collections, so
    /// two of them must never interleave.
    pub async fn with_desk<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Helpdesk<FileStore>) -> helpdesk_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = self.root.clone();
        let lock = Arc::clone(&self.write_lock);
        tokio::task::spawn_blocking(move || {
            // Writes are atomic file replacements, so a panicked holder
            // leaves nothing half written.
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let desk = Helpdesk::open(&root)?;
            f(&desk)
        })
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .map_err(AppError::from)
    }

    /// For read-only operations that await the classifier. Runs without
    /// the write lock; the future is driven from a blocking thread.
    pub async fn read_with_classifier<T, F, Fut>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(Helpdesk<FileStore>, Arc<dyn Classifier>) -> Fut + Send + 'static,
        Fut: Future<Output = helpdesk_core::Result<T>>,
        T: Send + 'static,
    {
        let root = self.root.clone();
        let classifier = Arc::clone(&self.classifier);
        let handle = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || {
            let desk = Helpdesk::open(&root)?;
            handle.block_on(f(desk, classifier))
        })
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .map_err(AppError::from)
    }
}
