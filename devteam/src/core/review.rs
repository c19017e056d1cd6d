//! Session-wide record of execution faults.

use serde::Serialize;

/// Append-only list of execution errors.
///
/// Satisfaction reflects the whole session: one recorded fault keeps the
/// history unsatisfactory until the history itself is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewHistory {
    errors: Vec<String>,
}

impl ReviewHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fault. Duplicates are kept.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_satisfactory(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}
