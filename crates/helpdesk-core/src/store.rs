//! Persistence for the desk's collections.
//!
//! Every collection is read and written whole. A mutation is load, validate,
//! change, save; there is no locking here, so callers serialize writers
//! (the server runs each operation on one blocking task, the CLI is one
//! process per command).

use crate::actor::Actor;
use crate::article::KnowledgeArticle;
use crate::config::Config;
use crate::error::{HelpdeskError, Result};
use crate::io;
use crate::paths;
use crate::report::ReportSchedule;
use crate::ticket::Ticket;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub trait Store: Send + Sync {
    fn config(&self) -> Result<Config>;
    fn replace_config(&self, config: &Config) -> Result<()>;

    fn actors(&self) -> Result<Vec<Actor>>;
    fn replace_actors(&self, actors: &[Actor]) -> Result<()>;

    fn tickets(&self) -> Result<Vec<Ticket>>;
    fn replace_tickets(&self, tickets: &[Ticket]) -> Result<()>;

    fn articles(&self) -> Result<Vec<KnowledgeArticle>>;
    fn replace_articles(&self, articles: &[KnowledgeArticle]) -> Result<()>;

    fn sectors(&self) -> Result<Vec<String>>;
    fn replace_sectors(&self, sectors: &[String]) -> Result<()>;

    fn schedules(&self) -> Result<Vec<ReportSchedule>>;
    fn replace_schedules(&self, schedules: &[ReportSchedule]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// YAML files under `<root>/.helpdesk/`, one per collection.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open the store at `root`. Fails with `NotInitialized` when
    /// `.helpdesk/` does not exist.
    pub fn open(root: &Path) -> Result<Self> {
        if !paths::helpdesk_dir(root).is_dir() {
            return Err(HelpdeskError::NotInitialized);
        }
        Ok(Self::at(root))
    }

    /// A store rooted at `root` without checking that it exists; used by
    /// init.
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Write an empty collection file if none exists. Returns true if
    /// written.
    pub fn seed<T: serde::Serialize>(&self, path: &Path, items: &[T]) -> Result<bool> {
        let data = serde_yaml::to_string(items)?;
        io::write_if_missing(path, data.as_bytes())
    }
}

impl Store for FileStore {
    fn config(&self) -> Result<Config> {
        Config::load(&self.root)
    }

    fn replace_config(&self, config: &Config) -> Result<()> {
        config.save(&self.root)
    }

    fn actors(&self) -> Result<Vec<Actor>> {
        io::read_yaml_list(&paths::actors_path(&self.root))
    }

    fn replace_actors(&self, actors: &[Actor]) -> Result<()> {
        io::write_yaml(&paths::actors_path(&self.root), actors)
    }

    fn tickets(&self) -> Result<Vec<Ticket>> {
        io::read_yaml_list(&paths::tickets_path(&self.root))
    }

    fn replace_tickets(&self, tickets: &[Ticket]) -> Result<()> {
        io::write_yaml(&paths::tickets_path(&self.root), tickets)
    }

    fn articles(&self) -> Result<Vec<KnowledgeArticle>> {
        io::read_yaml_list(&paths::articles_path(&self.root))
    }

    fn replace_articles(&self, articles: &[KnowledgeArticle]) -> Result<()> {
        io::write_yaml(&paths::articles_path(&self.root), articles)
    }

    fn sectors(&self) -> Result<Vec<String>> {
        io::read_yaml_list(&paths::sectors_path(&self.root))
    }

    fn replace_sectors(&self, sectors: &[String]) -> Result<()> {
        io::write_yaml(&paths::sectors_path(&self.root), sectors)
    }

    fn schedules(&self) -> Result<Vec<ReportSchedule>> {
        io::read_yaml_list(&paths::schedules_path(&self.root))
    }

    fn replace_schedules(&self, schedules: &[ReportSchedule]) -> Result<()> {
        io::write_yaml(&paths::schedules_path(&self.root), schedules)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Collections {
    config: Option<Config>,
    actors: Vec<Actor>,
    tickets: Vec<Ticket>,
    articles: Vec<KnowledgeArticle>,
    sectors: Vec<String>,
    schedules: Vec<ReportSchedule>,
}

/// Everything in memory. For tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        let store = Self::default();
        store.lock().config = Some(config);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        // Collections are replaced whole, so a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Store for MemoryStore {
    fn config(&self) -> Result<Config> {
        Ok(self
            .lock()
            .config
            .clone()
            .unwrap_or_else(|| Config::new("Helpdesk")))
    }

    fn replace_config(&self, config: &Config) -> Result<()> {
        self.lock().config = Some(config.clone());
        Ok(())
    }

    fn actors(&self) -> Result<Vec<Actor>> {
        Ok(self.lock().actors.clone())
    }

    fn replace_actors(&self, actors: &[Actor]) -> Result<()> {
        self.lock().actors = actors.to_vec();
        Ok(())
    }

    fn tickets(&self) -> Result<Vec<Ticket>> {
        Ok(self.lock().tickets.clone())
    }

    fn replace_tickets(&self, tickets: &[Ticket]) -> Result<()> {
        self.lock().tickets = tickets.to_vec();
        Ok(())
    }

    fn articles(&self) -> Result<Vec<KnowledgeArticle>> {
        Ok(self.lock().articles.clone())
    }

    fn replace_articles(&self, articles: &[KnowledgeArticle]) -> Result<()> {
        self.lock().articles = articles.to_vec();
        Ok(())
    }

    fn sectors(&self) -> Result<Vec<String>> {
        Ok(self.lock().sectors.clone())
    }

    fn replace_sectors(&self, sectors: &[String]) -> Result<()> {
        self.lock().sectors = sectors.to_vec();
        Ok(())
    }

    fn schedules(&self) -> Result<Vec<ReportSchedule>> {
        Ok(self.lock().schedules.clone())
    }

    fn replace_schedules(&self, schedules: &[ReportSchedule]) -> Result<()> {
        self.lock().schedules = schedules.to_vec();
        Ok(())
    }
}
