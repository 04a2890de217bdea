use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// One completed session as it lands in the history log.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub date: String,
    pub elapsed_secs: u64,
    pub rank: usize,
    pub board_size: usize,
}

impl SessionRecord {
    /// Record stamped with the local time, ranked against a board that
    /// held `board_size` entries when the session ended.
    pub fn now(elapsed_secs: u64, rank: usize, board_size: usize) -> Self {
        Self {
            date: Local::now().format("%c").to_string(),
            elapsed_secs,
            rank,
            board_size,
        }
    }
}

/// Append-only CSV history of completed sessions.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::log_path().unwrap_or_else(|| PathBuf::from("stint_sessions.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, record: &SessionRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Emit the header only when the log has no content yet; a file
        // that merely exists but is empty still needs one
        let needs_header = std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(record)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_emits_header_once() {
        let dir = tempdir().unwrap();
        let log = SessionLog::with_path(dir.path().join("sessions.csv"));

        log.append(&SessionRecord::now(42, 1, 0)).unwrap();
        log.append(&SessionRecord::now(37, 1, 1)).unwrap();

        let content = std::fs::read_to_string(dir.path().join("sessions.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,elapsed_secs,rank,board_size");
        assert!(lines[1].ends_with(",42,1,0"));
        assert!(lines[2].ends_with(",37,1,1"));
    }

    #[test]
    fn append_to_preexisting_empty_file_still_emits_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.csv");
        std::fs::write(&path, b"").unwrap();

        let log = SessionLog::with_path(&path);
        log.append(&SessionRecord::now(21, 1, 0)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("date,elapsed_secs,rank,board_size"));
    }

    #[test]
    fn append_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let log = SessionLog::with_path(dir.path().join("state/deep/sessions.csv"));
        log.append(&SessionRecord::now(12, 2, 3)).unwrap();
        assert!(dir.path().join("state/deep/sessions.csv").exists());
    }
}
