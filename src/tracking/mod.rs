//! Live edit tracking for Dopamine.
//!
//! Two independent trackers observe the same stream of edit hunks:
//! [`EditClassifier`] sizes each save's net edits and [`TypingMetrics`]
//! derives typing speed, focus time and diagnostic trends. Both are plain
//! instances owned by the caller and keyed by document identity.

pub mod diagnostics;
pub mod edits;
pub mod typing;

pub use diagnostics::{DiagnosticsProvider, DiagnosticsTable};
pub use edits::{classify_magnitude, EditClassifier, EditHunk, EditStats, Magnitude};
pub use typing::{PerformanceSnapshot, TypingMetrics};
