//! # Logging
//!
//! Two sinks behind the `log` facade, combined with simplelog:
//!
//! ```text
//!   log::info!(..) ──► CombinedLogger ──► WriteLogger   (lumen.log, RFC3339)
//!                                     └─► MemoryLogger  (ring, log viewer)
//! ```
//!
//! The memory ring keeps the newest `capacity` records; the log viewer
//! screen formats a snapshot of it.

use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};
use simplelog::{CombinedLogger, Config, ConfigBuilder, SharedLogger, WriteLogger};

/// One captured log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub time: DateTime<Local>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogRecord {
    /// `HH:MM:SS LEVEL target: message`
    pub fn format(&self) -> String {
        format!(
            "{} {:<5} {}: {}",
            self.time.format("%H:%M:%S"),
            self.level,
            self.target,
            self.message
        )
    }
}

/// Shared bounded buffer of recent records.
#[derive(Debug, Clone)]
pub struct LogStore {
    records: Arc<Mutex<VecDeque<LogRecord>>>,
    capacity: usize,
}

impl LogStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogRecord>> {
        // A panic while holding the lock leaves the ring usable.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, record: LogRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// A `SharedLogger` that appends to a [`LogStore`].
pub struct MemoryLogger {
    level: LevelFilter,
    config: Config,
    store: LogStore,
}

impl MemoryLogger {
    pub fn new(level: LevelFilter, store: LogStore) -> Box<Self> {
        Box::new(Self {
            level,
            config: Config::default(),
            store,
        })
    }
}

impl Log for MemoryLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.store.push(LogRecord {
            time: Local::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

impl SharedLogger for MemoryLogger {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        Some(&self.config)
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

/// Install the combined file + memory logger. A log file that cannot be
/// created only drops the file sink.
pub fn init(level: LevelFilter, log_file: &Path, store: LogStore) {
    let file_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![MemoryLogger::new(level, store)];
    if let Ok(file) = File::create(log_file) {
        loggers.push(WriteLogger::new(level, file_config, file));
    }
    let _ = CombinedLogger::init(loggers);
}
