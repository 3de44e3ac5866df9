use anyhow::Context;
use helpdesk_core::store::FileStore;
use helpdesk_core::{paths, Helpdesk};
use std::path::{Path, PathBuf};

/// Resolve the helpdesk root directory.
///
/// Priority:
/// 1. `--root` flag / `HELPDESK_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.helpdesk/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_helpdesk_dir(&cwd).unwrap_or(cwd)
}

fn find_helpdesk_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(paths::HELPDESK_DIR).is_dir())
        .map(Path::to_path_buf)
}

pub fn open_desk(root: &Path) -> anyhow::Result<Helpdesk<FileStore>> {
    Helpdesk::open(root).with_context(|| {
        format!(
            "no helpdesk at {} (run `helpdesk init` first)",
            root.display()
        )
    })
}

/// The acting actor id from `--as` / `HELPDESK_ACTOR`.
pub fn require_actor(actor: Option<&str>) -> anyhow::Result<&str> {
    actor
        .filter(|a| !a.trim().is_empty())
        .context("no acting actor: pass --as <ID> or set HELPDESK_ACTOR")
}
