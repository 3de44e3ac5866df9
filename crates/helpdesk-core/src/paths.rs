use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const HELPDESK_DIR: &str = ".helpdesk";

pub const CONFIG_FILE: &str = ".helpdesk/config.yaml";
pub const ACTORS_FILE: &str = ".helpdesk/actors.yaml";
pub const TICKETS_FILE: &str = ".helpdesk/tickets.yaml";
pub const ARTICLES_FILE: &str = ".helpdesk/articles.yaml";
pub const SECTORS_FILE: &str = ".helpdesk/sectors.yaml";
pub const SCHEDULES_FILE: &str = ".helpdesk/schedules.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn helpdesk_dir(root: &Path) -> PathBuf {
    root.join(HELPDESK_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn actors_path(root: &Path) -> PathBuf {
    root.join(ACTORS_FILE)
}

pub fn tickets_path(root: &Path) -> PathBuf {
    root.join(TICKETS_FILE)
}

pub fn articles_path(root: &Path) -> PathBuf {
    root.join(ARTICLES_FILE)
}

pub fn sectors_path(root: &Path) -> PathBuf {
    root.join(SECTORS_FILE)
}

pub fn schedules_path(root: &Path) -> PathBuf {
    root.join(SCHEDULES_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/desk");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/desk/.helpdesk/config.yaml")
        );
        assert_eq!(
            tickets_path(root),
            PathBuf::from("/tmp/desk/.helpdesk/tickets.yaml")
        );
        assert_eq!(helpdesk_dir(root), PathBuf::from("/tmp/desk/.helpdesk"));
    }
}
