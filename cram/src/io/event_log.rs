//! Append-only event trail for a session (`cram.log` by default).
//!
//! # Separation of Concerns
//!
//! - **Event log (this module)**: product artifact. One timestamped line per
//!   lifecycle event or transition, flushed as it is written.
//! - **Tracing (`logging`)**: dev diagnostics via `RUST_LOG`.
//!
//! The log is best-effort. [`EventSink`] swallows write failures (reporting
//! them through `tracing`) so a broken log never ends a session.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, warn};

use crate::io::config::CramConfig;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("open event log {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write event log")]
    Write(#[source] io::Error),
}

/// Destination for session events.
pub trait EventLog {
    fn record(&mut self, tag: &str, message: &str) -> Result<(), EventLogError>;
}

/// Event log appending `YYYY-MM-DD HH:MM:SS.mmm [tag] message` lines to a file.
#[derive(Debug)]
pub struct FileEventLog {
    file: File,
}

impl FileEventLog {
    pub fn open(path: &Path) -> Result<Self, EventLogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| EventLogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { file })
    }
}

impl EventLog for FileEventLog {
    fn record(&mut self, tag: &str, message: &str) -> Result<(), EventLogError> {
        let line = format_line(&Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), tag, message);
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(EventLogError::Write)
    }
}

fn format_line(timestamp: &dyn std::fmt::Display, tag: &str, message: &str) -> String {
    format!("{timestamp} [{tag}] {message}\n")
}

/// Best-effort front for an optional [`EventLog`].
pub struct EventSink {
    log: Option<Box<dyn EventLog>>,
}

impl EventSink {
    pub fn new(log: impl EventLog + 'static) -> Self {
        Self {
            log: Some(Box::new(log)),
        }
    }

    pub fn disabled() -> Self {
        Self { log: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.log.is_some()
    }

    /// Record an event. Failures are reported through tracing and dropped.
    pub fn record(&mut self, tag: &str, message: &str) {
        debug!(tag, message, "event");
        if let Some(log) = self.log.as_mut() {
            if let Err(err) = log.record(tag, message) {
                warn!(error = %err, tag, "event log write failed");
            }
        }
    }
}

/// Open the event log configured in `config`, or a disabled sink when logging
/// is off or the file cannot be opened.
pub fn open_event_sink(config: &CramConfig) -> EventSink {
    if !config.log_enabled {
        return EventSink::disabled();
    }
    match FileEventLog::open(&config.log_path) {
        Ok(log) => EventSink::new(log),
        Err(err) => {
            warn!(error = %err, "continuing without event log");
            EventSink::disabled()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    struct BrokenLog;

    impl EventLog for BrokenLog {
        fn record(&mut self, _tag: &str, _message: &str) -> Result<(), EventLogError> {
            Err(EventLogError::Write(io::Error::other("disk full")))
        }
    }

    #[test]
    fn file_log_appends_tagged_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("cram.log");

        let mut log = FileEventLog::open(&path).expect("open");
        log.record("start", "session started").expect("record");
        drop(log);
        let mut log = FileEventLog::open(&path).expect("reopen");
        log.record("exit", "session end").expect("record");

        let contents = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" [start] session started"));
        assert!(lines[1].ends_with(" [exit] session end"));
        // "YYYY-MM-DD HH:MM:SS.mmm"
        assert_eq!(lines[0].find(" [start]"), Some(23));
    }

    #[test]
    fn format_line_layout() {
        assert_eq!(format_line(&"T", "key", "key=32"), "T [key] key=32\n");
    }

    #[test]
    fn sink_swallows_write_failures() {
        let mut sink = EventSink::new(BrokenLog);
        sink.record("prompt", "group=0 item=0");
        assert!(sink.is_enabled());
    }

    #[test]
    fn unopenable_log_disables_sink() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = CramConfig {
            log_path: temp.path().join("missing-dir").join("cram.log"),
            ..CramConfig::default()
        };
        assert!(!open_event_sink(&config).is_enabled());

        let config = CramConfig {
            log_enabled: false,
            ..CramConfig::default()
        };
        assert!(!open_event_sink(&config).is_enabled());
    }
}
