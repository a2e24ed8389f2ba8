//! Diagnostic reporting for backup and restore jobs.
//!
//! The engine never installs its own logging; every diagnostic goes through
//! a reporter handed in by the job controller, so the same code serves both
//! the embedded-plugin case and the standalone driver binary.

use std::cell::RefCell;

/// Diagnostic channel injected into every engine operation.
///
/// `debug` carries a numeric verbosity level (higher = chattier) matching
/// the trace levels the job controller uses. `warning` and `error` are
/// job-level messages surfaced to the operator; neither aborts anything by
/// itself.
pub trait JobReporter {
    fn debug(&self, level: u32, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Production reporter forwarding to the `tracing` ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl JobReporter for TracingReporter {
    fn debug(&self, level: u32, message: &str) {
        tracing::debug!(level, "{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Reporter that collects messages in memory, for drivers and tests that
/// need to inspect what a job reported.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages, prefixed with their severity.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// True if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|m| m.contains(needle))
    }
}

impl JobReporter for RecordingReporter {
    fn debug(&self, level: u32, message: &str) {
        self.messages.borrow_mut().push(format!("D{level}: {message}"));
    }

    fn warning(&self, message: &str) {
        self.messages.borrow_mut().push(format!("W: {message}"));
    }

    fn error(&self, message: &str) {
        self.messages.borrow_mut().push(format!("E: {message}"));
    }
}
