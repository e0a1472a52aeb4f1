//! Diagnostic sinks.

use std::io::{Write, stdout};
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(test)]
use parking_lot::Mutex;

use super::Diagnostic;

/// Receives diagnostics from every stage.
///
/// Shared across worker threads; `emit` must never fail or panic.
pub trait Reporter: Sync {
    fn emit(&self, diagnostic: &Diagnostic);

    /// Number of diagnostics emitted so far.
    fn emitted(&self) -> usize;
}

/// Writes each diagnostic as one uncolored line on stdout.
#[derive(Debug, Default)]
pub struct StdoutReporter {
    count: AtomicUsize,
}

impl StdoutReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for StdoutReporter {
    fn emit(&self, diagnostic: &Diagnostic) {
        self.count.fetch_add(1, Ordering::Relaxed);
        let mut stdout = stdout().lock();
        writeln!(stdout, "{}", diagnostic.render()).ok();
        stdout.flush().ok();
    }

    fn emitted(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

/// Keeps rendered lines in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

#[cfg(test)]
impl Reporter for MemoryReporter {
    fn emit(&self, diagnostic: &Diagnostic) {
        self.lines.lock().push(diagnostic.render());
    }

    fn emitted(&self) -> usize {
        self.lines.lock().len()
    }
}
