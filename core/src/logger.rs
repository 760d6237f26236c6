//! Process-wide debug logger
//!
//! Keeps the most recent entries in a ring buffer, optionally appends them to
//! a file, and forwards everything to the `log` facade.

use chrono::Local;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

pub use log::Level;

const DEFAULT_RING_SIZE: usize = 1000;

pub struct LogEntry {
    pub timestamp: String,
    pub level: log::Level,
    pub module: String,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] [{}] [{}] {}",
            self.timestamp, self.level, self.module, self.message
        )
    }
}

pub struct DebugLogger {
    ring_buffer: VecDeque<LogEntry>,
    max_entries: usize,
    file_path: Option<PathBuf>,
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::new(DEFAULT_RING_SIZE)))
}

impl DebugLogger {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            ring_buffer: VecDeque::with_capacity(max_entries),
            max_entries,
            file_path: None,
        }
    }

    pub fn set_file_path(&mut self, path: PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        self.file_path = Some(path);
    }

    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries.max(1);
        while self.ring_buffer.len() > self.max_entries {
            self.ring_buffer.pop_front();
        }
    }

    pub fn log(&mut self, level: log::Level, module: &str, message: &str) {
        let entry = LogEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level,
            module: module.to_string(),
            message: message.to_string(),
        };

        if let Some(path) = &self.file_path {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", entry);
            }
        }

        if self.ring_buffer.len() >= self.max_entries {
            self.ring_buffer.pop_front();
        }
        self.ring_buffer.push_back(entry);
    }

    /// Most recent entries first
    pub fn get_recent(&self, n: usize) -> Vec<String> {
        self.ring_buffer
            .iter()
            .rev()
            .take(n)
            .map(|e| e.to_string())
            .collect()
    }
}

/// Start appending log entries to `path` and resize the ring buffer.
pub fn init(path: PathBuf, ring_size: usize) {
    let mut logger = get_logger().lock();
    logger.set_file_path(path);
    logger.set_max_entries(ring_size);
}

pub fn log(level: log::Level, module: &str, message: impl Into<String>) {
    let message = message.into();
    log::log!(target: module, level, "{}", message);
    get_logger().lock().log(level, module, &message);
}

pub fn get_recent_logs(n: usize) -> Vec<String> {
    get_logger().lock().get_recent(n)
}

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Debug, module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, module_path!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, module_path!(), format!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut logger = DebugLogger::new(2);
        logger.log(log::Level::Info, "test", "first");
        logger.log(log::Level::Info, "test", "second");
        logger.log(log::Level::Warn, "test", "third");

        let recent = logger.get_recent(10);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("third"));
        assert!(recent[0].contains("[WARN]"));
        assert!(recent[1].ends_with("second"));
    }

    #[test]
    fn test_shrinking_ring_buffer() {
        let mut logger = DebugLogger::new(5);
        for i in 0..5 {
            logger.log(log::Level::Debug, "test", &format!("entry {}", i));
        }
        logger.set_max_entries(2);
        let recent = logger.get_recent(5);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("entry 4"));
    }

    #[test]
    fn test_file_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("debug.log");

        let mut logger = DebugLogger::new(10);
        logger.set_file_path(path.clone());
        logger.log(log::Level::Error, "arena_core::test", "written to disk");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[ERROR] [arena_core::test] written to disk"));
    }

    #[test]
    fn test_global_macros() {
        crate::info_log!("logger smoke {}", 42);
        let recent = get_recent_logs(50);
        assert!(recent.iter().any(|line| line.ends_with("logger smoke 42")));
    }
}
