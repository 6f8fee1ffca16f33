//! Event reporters
//!
//! The engine emits [`SyncEvent`]s; reporters decide where they land. The
//! binary wires a tracing reporter for the console and, when `--log-file`
//! is given, a JSONL file log with one timestamped object per event.

use crate::types::{EventSink, MirraError, SyncEvent};
use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Maps events onto the `tracing` log surface.
///
/// Per-entry failures log at warn: the pass carries on past them. Only
/// `fatal` reaches the error level.
pub struct TraceSink;

impl EventSink for TraceSink {
    fn emit(&self, event: &SyncEvent) {
        match event {
            SyncEvent::PassSkipped { .. } => {
                warn!("pass skipped: previous pass still running");
            }
            SyncEvent::PassStarted => info!("pass started"),
            SyncEvent::PassCompleted { stats } => info!("pass completed: {}", stats.summary()),
            SyncEvent::DirCreated { path } => info!("created directory {}", path.display()),
            SyncEvent::DirCreateFailed { path, error } => {
                warn!("failed to create directory {}: {error}", path.display());
            }
            SyncEvent::FileCreated { path } => info!("created {}", path.display()),
            SyncEvent::FileCopied { path } => info!("copied {}", path.display()),
            SyncEvent::FileUnchanged { path } => debug!("unchanged {}", path.display()),
            SyncEvent::FileCopyFailed { path, error } => {
                warn!("failed to copy {}: {error}", path.display());
            }
            SyncEvent::FileDeleted { path } => info!("deleted {}", path.display()),
            SyncEvent::FileDeleteFailed { path, error } => {
                warn!("failed to delete {}: {error}", path.display());
            }
            SyncEvent::DirDeleted { path } => info!("deleted directory {}", path.display()),
            SyncEvent::DirDeleteFailed { path, error } => {
                warn!("failed to delete directory {}: {error}", path.display());
            }
            SyncEvent::Fatal { error } => error!("pass failed: {error}"),
        }
    }
}

#[derive(Serialize)]
struct LogRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: &'a SyncEvent,
}

/// Appends one JSON object per event to a log file.
///
/// Write failures are swallowed: the event log is an observability surface
/// and must never take the mirror down with it.
#[derive(Debug)]
pub struct JsonlSink {
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open (or create) the log file for appending.
    pub fn open(path: &Path) -> Result<Self, MirraError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| MirraError::io(path, e))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for JsonlSink {
    fn emit(&self, event: &SyncEvent) {
        let record = LogRecord {
            timestamp: Utc::now().to_rfc3339(),
            event,
        };
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_jsonl_sink_writes_one_parseable_line_per_event() {
        let dir = TempDir::new().expect("create tempdir");
        let log_path = dir.path().join("events.jsonl");

        let sink = JsonlSink::open(&log_path).expect("open sink");
        sink.emit(&SyncEvent::PassStarted);
        sink.emit(&SyncEvent::FileCopied {
            path: PathBuf::from("sub/b.txt"),
        });

        let content = fs::read_to_string(&log_path).expect("read log");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("parse line 1");
        assert_eq!(first["event"], "pass-started");
        assert!(first["timestamp"].as_str().expect("timestamp").contains('T'));

        let second: serde_json::Value = serde_json::from_str(lines[1]).expect("parse line 2");
        assert_eq!(second["event"], "file-copied");
        assert_eq!(second["path"], "sub/b.txt");
    }

    #[test]
    fn test_jsonl_sink_appends_across_opens() {
        let dir = TempDir::new().expect("create tempdir");
        let log_path = dir.path().join("events.jsonl");

        JsonlSink::open(&log_path)
            .expect("open sink")
            .emit(&SyncEvent::PassStarted);
        JsonlSink::open(&log_path)
            .expect("reopen sink")
            .emit(&SyncEvent::PassStarted);

        let content = fs::read_to_string(&log_path).expect("read log");
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_jsonl_sink_open_failure_carries_path() {
        let err = JsonlSink::open(Path::new("/nonexistent/dir/events.jsonl")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dir/events.jsonl"));
    }
}
