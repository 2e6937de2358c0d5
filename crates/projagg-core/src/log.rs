//! Run log collaborator.
//!
//! Reconciliation runs report progress as plain lines (banner, added
//! members, failures). Where those lines end up is the caller's choice.

use std::sync::Mutex;
use tracing::info;

/// Sink for human-readable run progress. Fire-and-forget.
pub trait RunLog: Send + Sync {
    fn log(&self, line: &str);
}

/// Forwards run lines to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl RunLog for TracingLog {
    fn log(&self, line: &str) {
        info!(target: "projagg", "{}", line);
    }
}

/// Keeps run lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines logged so far.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl RunLog for MemoryLog {
    fn log(&self, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryLog::new();
        log.log("first");
        log.log("second");

        assert_eq!(log.lines(), vec!["first", "second"]);
        assert!(log.contains("sec"));
        assert!(!log.contains("third"));
    }

    #[test]
    fn test_memory_log_from_other_thread() {
        let log = Arc::new(MemoryLog::new());
        let worker = {
            let log = Arc::clone(&log);
            std::thread::spawn(move || log.log("from worker"))
        };
        worker.join().expect("worker panicked");

        assert_eq!(log.lines(), vec!["from worker"]);
    }
}
