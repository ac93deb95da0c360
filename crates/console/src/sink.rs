//! Observers for protocol warnings.
//!
//! Status mismatches on the session calls are reported here rather than
//! raised, so the caller decides where warnings end up. The binary forwards
//! them to `tracing`; tests record them.

use std::sync::{Arc, Mutex};

/// Receives warning messages from the session client.
pub trait WarningSink {
    /// Report one warning.
    fn warn(&self, message: &str);
}

/// Forwards warnings to the `tracing` subscriber at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Keeps every warning in memory.
///
/// Clones share the same storage, so a test can hand one clone to the client
/// and inspect another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded warnings in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Number of recorded warnings.
    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for RecordingSink {
    fn warn(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
