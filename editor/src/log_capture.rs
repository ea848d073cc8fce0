use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

/// Entries kept before the oldest are evicted.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A single captured log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: log::Level,
    pub target: String,
    pub message: String,
    pub timestamp: Instant,
}

/// Ring buffer of captured log entries.
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    max_capacity: usize,
}

impl LogBuffer {
    fn new(max_capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_capacity.min(1024)),
            max_capacity,
        }
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    fn push(&mut self, entry: LogEntry) {
        if self.entries.len() >= self.max_capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Shared state of the installed logger.
struct Capture {
    inner: RwLock<env_logger::Logger>,
    buffer: Arc<Mutex<LogBuffer>>,
}

static CAPTURE: OnceLock<Arc<Capture>> = OnceLock::new();

/// Returns the shared log buffer, or `None` unless [`install`] succeeded.
pub fn log_buffer() -> Option<Arc<Mutex<LogBuffer>>> {
    CAPTURE.get().map(|capture| Arc::clone(&capture.buffer))
}

/// Logger that forwards to `env_logger` and captures into the ring buffer.
struct LogCapture(Arc<Capture>);

impl log::Log for LogCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.0.inner.read().enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        let inner = self.0.inner.read();
        if inner.enabled(record.metadata()) {
            inner.log(record);
            self.0.buffer.lock().push(LogEntry {
                level: record.level(),
                target: record.target().to_owned(),
                message: format!("{}", record.args()),
                timestamp: Instant::now(),
            });
        }
    }

    fn flush(&self) {
        self.0.inner.read().flush();
    }
}

fn build_logger(filter: &str) -> env_logger::Logger {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).build()
}

/// Install the capturing logger with `filter` as the default filter.
///
/// `RUST_LOG` overrides `filter` when set. Fails if a logger is already
/// installed; [`log_buffer`] then stays `None`.
pub fn install(filter: &str) -> Result<(), String> {
    let inner = build_logger(filter);
    let max_level = inner.filter();
    let capture = Arc::new(Capture {
        inner: RwLock::new(inner),
        buffer: Arc::new(Mutex::new(LogBuffer::new(DEFAULT_CAPACITY))),
    });

    log::set_boxed_logger(Box::new(LogCapture(Arc::clone(&capture))))
        .map_err(|e| format!("logger already set: {e}"))?;
    log::set_max_level(max_level);
    CAPTURE
        .set(capture)
        .map_err(|_| "log capture already installed".to_owned())
}

/// Replace the default filter of the installed logger.
///
/// `RUST_LOG` still takes precedence. Fails before [`install`].
pub fn set_filter(filter: &str) -> Result<(), String> {
    let capture = CAPTURE
        .get()
        .ok_or_else(|| "log capture not installed".to_owned())?;
    let inner = build_logger(filter);
    log::set_max_level(inner.filter());
    *capture.inner.write() = inner;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            level: log::Level::Info,
            target: "test".into(),
            message: message.into(),
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let mut buffer = LogBuffer::new(2);
        buffer.push(entry("a"));
        buffer.push(entry("b"));
        buffer.push(entry("c"));
        let messages: Vec<_> = buffer.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["b", "c"]);
        buffer.clear();
        assert!(buffer.entries().is_empty());
    }

    fn captured(target: &str, message: &str) -> bool {
        log_buffer()
            .unwrap()
            .lock()
            .entries()
            .iter()
            .any(|e| e.target == target && e.message == message)
    }

    #[test]
    fn install_captures_and_refuses_second_call() {
        install("warn").unwrap();
        assert!(install("debug").is_err());

        log::warn!(target: "capture_test", "kept");
        log::debug!(target: "capture_test", "filtered");
        assert!(captured("capture_test", "kept"));
        assert!(!captured("capture_test", "filtered"));

        set_filter("debug").unwrap();
        log::debug!(target: "capture_test", "now kept");
        assert!(captured("capture_test", "now kept"));
    }
}
