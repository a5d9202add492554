//! Diagnostic error counts per document.

use std::collections::HashMap;

/// Source of error-severity diagnostic counts.
pub trait DiagnosticsProvider {
    /// Current error count for `doc`, or `None` when unknown.
    fn error_count(&self, doc: &str) -> Option<usize>;
}

/// Diagnostics pushed in by the editor integration.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticsTable {
    counts: HashMap<String, usize>,
}

impl DiagnosticsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the error count reported for `doc`.
    pub fn set(&mut self, doc: impl Into<String>, errors: usize) {
        self.counts.insert(doc.into(), errors);
    }

    /// Drop whatever is known about `doc`.
    pub fn remove(&mut self, doc: &str) {
        self.counts.remove(doc);
    }
}

impl DiagnosticsProvider for DiagnosticsTable {
    fn error_count(&self, doc: &str) -> Option<usize> {
        self.counts.get(doc).copied()
    }
}

/// A provider that never knows anything.
impl DiagnosticsProvider for () {
    fn error_count(&self, _doc: &str) -> Option<usize> {
        None
    }
}

impl<P: DiagnosticsProvider + ?Sized> DiagnosticsProvider for &P {
    fn error_count(&self, doc: &str) -> Option<usize> {
        (**self).error_count(doc)
    }
}
