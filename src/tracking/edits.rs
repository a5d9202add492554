//! Per-document edit classification.
//!
//! Each hunk is split into a typed or bulk delta by its non-whitespace size.
//! Bulk hunks (pastes, generated code) still count toward the totals but
//! weigh far less when the save's magnitude tier is computed.
//!
//! Magnitude weights:
//! - Typed addition: 1.0
//! - Bulk addition: 0.2
//! - Any removal: 0.0

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;

/// Weights applied to each bucket when computing effective size.
pub mod weights {
    /// Weight for hand-typed additions.
    pub const TYPED_ADD: f64 = 1.0;
    /// Weight for bulk additions.
    pub const BULK_ADD: f64 = 0.2;
    /// Weight for hand-typed removals.
    pub const TYPED_REMOVE: f64 = 0.0;
    /// Weight for bulk removals.
    pub const BULK_REMOVE: f64 = 0.0;
}

/// A single content change as reported by the editor.
///
/// `replaced` must be read from the document before the change is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditHunk {
    /// Inserted text.
    #[serde(default)]
    pub text: String,
    /// Text the change overwrote.
    #[serde(default)]
    pub replaced: String,
}

impl EditHunk {
    /// A pure insertion.
    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            replaced: String::new(),
        }
    }

    /// A pure deletion of `replaced`.
    pub fn delete(replaced: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            replaced: replaced.into(),
        }
    }

    /// Replace `replaced` with `text`.
    pub fn replace(replaced: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            replaced: replaced.into(),
        }
    }
}

/// Accumulated edit counts for one document since its last save.
///
/// Every total equals the sum of its typed and bulk sub-totals.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditStats {
    pub lines_added: u64,
    pub lines_removed: u64,
    pub chars_added: u64,
    pub chars_removed: u64,

    pub typed_lines_added: u64,
    pub typed_chars_added: u64,
    pub bulk_lines_added: u64,
    pub bulk_chars_added: u64,

    pub typed_lines_removed: u64,
    pub typed_chars_removed: u64,
    pub bulk_lines_removed: u64,
    pub bulk_chars_removed: u64,
}

impl EditStats {
    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Effective (lines, chars) after applying the bucket [`weights`].
    pub fn effective_size(&self) -> (f64, f64) {
        let lines = self.typed_lines_added as f64 * weights::TYPED_ADD
            + self.bulk_lines_added as f64 * weights::BULK_ADD
            + self.typed_lines_removed as f64 * weights::TYPED_REMOVE
            + self.bulk_lines_removed as f64 * weights::BULK_REMOVE;
        let chars = self.typed_chars_added as f64 * weights::TYPED_ADD
            + self.bulk_chars_added as f64 * weights::BULK_ADD
            + self.typed_chars_removed as f64 * weights::TYPED_REMOVE
            + self.bulk_chars_removed as f64 * weights::BULK_REMOVE;
        (lines, chars)
    }

    fn record(&mut self, hunk: &EditHunk, bulk_threshold: u64) {
        let lines_added = count_newlines(&hunk.text);
        let chars_added = count_non_whitespace(&hunk.text);
        let lines_removed = count_newlines(&hunk.replaced);
        let chars_removed = count_non_whitespace(&hunk.replaced);

        if chars_added > 0 {
            self.lines_added += lines_added;
            self.chars_added += chars_added;
            if chars_added > bulk_threshold {
                self.bulk_lines_added += lines_added;
                self.bulk_chars_added += chars_added;
            } else {
                self.typed_lines_added += lines_added;
                self.typed_chars_added += chars_added;
            }
        }

        if chars_removed > 0 {
            self.lines_removed += lines_removed;
            self.chars_removed += chars_removed;
            if chars_removed > bulk_threshold {
                self.bulk_lines_removed += lines_removed;
                self.bulk_chars_removed += chars_removed;
            } else {
                self.typed_lines_removed += lines_removed;
                self.typed_chars_removed += chars_removed;
            }
        }
    }
}

fn count_newlines(text: &str) -> u64 {
    text.bytes().filter(|b| *b == b'\n').count() as u64
}

fn count_non_whitespace(text: &str) -> u64 {
    text.chars().filter(|c| !c.is_whitespace()).count() as u64
}

/// Size tier of a save's net edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Magnitude {
    #[default]
    Small,
    Medium,
    Large,
    Epic,
}

impl Magnitude {
    /// Coin multiplier for this tier.
    pub fn multiplier(self) -> u64 {
        match self {
            Magnitude::Small => 1,
            Magnitude::Medium => 2,
            Magnitude::Large => 5,
            Magnitude::Epic => 10,
        }
    }

    /// Tier name as shown in ledger reasons.
    pub fn as_str(self) -> &'static str {
        match self {
            Magnitude::Small => "Small",
            Magnitude::Medium => "Medium",
            Magnitude::Large => "Large",
            Magnitude::Epic => "Epic",
        }
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the magnitude of accumulated edits.
///
/// Tiers are checked from Epic down. A tier is reached when either the
/// effective line count or the effective char count strictly exceeds it.
pub fn classify_magnitude(stats: &EditStats, thresholds: &ThresholdConfig) -> Magnitude {
    let (lines, chars) = stats.effective_size();
    let tiers = [
        (Magnitude::Epic, thresholds.epic),
        (Magnitude::Large, thresholds.large),
        (Magnitude::Medium, thresholds.medium),
    ];

    for (magnitude, tier) in tiers {
        if lines > tier.lines as f64 || chars > tier.chars as f64 {
            return magnitude;
        }
    }
    Magnitude::Small
}

/// Tracks typed and bulk edit counts per document between saves.
#[derive(Debug, Default)]
pub struct EditClassifier {
    changes: HashMap<String, EditStats>,
}

impl EditClassifier {
    /// Create an empty classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ordered batch of hunks for `doc`.
    pub fn on_edit(&mut self, doc: &str, hunks: &[EditHunk], bulk_threshold: usize) {
        let stats = self.changes.entry(doc.to_string()).or_default();
        for hunk in hunks {
            stats.record(hunk, bulk_threshold as u64);
        }
    }

    /// Return the stats for `doc` and forget them.
    ///
    /// A document with no recorded edits drains as all zeros.
    pub fn drain(&mut self, doc: &str) -> EditStats {
        self.changes.remove(doc).unwrap_or_default()
    }

    /// Return a copy of the stats for `doc` without clearing them.
    pub fn peek(&self, doc: &str) -> EditStats {
        self.changes.get(doc).copied().unwrap_or_default()
    }

    /// Forget anything recorded for `doc`.
    pub fn forget(&mut self, doc: &str) {
        self.changes.remove(doc);
    }

    /// Number of documents with pending stats.
    pub fn tracked_documents(&self) -> usize {
        self.changes.len()
    }
}
