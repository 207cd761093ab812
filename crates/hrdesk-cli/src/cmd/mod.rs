pub mod actors;
pub mod categories;
pub mod comment;
pub mod create;
pub mod init;
pub mod list;
pub mod show;
pub mod transition;
pub mod workload;

use hrdesk_core::Desk;
use hrdesk_core::config::DESK_DIR;
use hrdesk_core::error::ErrorCode;
use hrdesk_core::model::ticket::TicketId;
use std::path::{Path, PathBuf};

/// No `.hrdesk` directory at or above the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotInitialized {
    pub searched_from: PathBuf,
}

impl NotInitialized {
    pub const CODE: ErrorCode = ErrorCode::NotInitialized;
}

impl std::fmt::Display for NotInitialized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Not an hrdesk workspace: no {DESK_DIR} directory at or above {}",
            self.searched_from.display()
        )
    }
}

impl std::error::Error for NotInitialized {}

/// Find the directory holding `.hrdesk` by walking up from `start`.
pub fn find_desk_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(DESK_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Open the desk that `start` lives in.
pub fn open_desk(start: &Path) -> anyhow::Result<Desk> {
    let root = find_desk_root(start).ok_or_else(|| NotInitialized {
        searched_from: start.to_path_buf(),
    })?;
    tracing::debug!(root = %root.display(), "opening desk");
    Desk::open(&root)
}

pub fn parse_ticket_id(raw: &str) -> anyhow::Result<TicketId> {
    Ok(TicketId::parse(raw.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_root_from_nested_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(dir.path().join(DESK_DIR)).expect("desk dir");
        let nested = dir.path().join("teams").join("payroll");
        std::fs::create_dir_all(&nested).expect("nested");

        assert_eq!(find_desk_root(&nested).as_deref(), Some(dir.path()));
    }

    #[test]
    fn missing_desk_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = open_desk(dir.path()).err().expect("no desk");
        let not_init = err.downcast_ref::<NotInitialized>().expect("typed error");
        assert_eq!(not_init.searched_from, dir.path());
    }

    #[test]
    fn ticket_ids_are_validated() {
        assert!(parse_ticket_id(" tk-abc123 ").is_ok());
        assert!(parse_ticket_id("abc").is_err());
    }
}
