//! Typing speed, focus time and diagnostic trend tracking.
//!
//! WPM is measured over a sliding 10 second window of hand-typed character
//! arrivals. Hunks longer than the bulk threshold are treated as pasted and
//! never count. Arrivals are kept as `(timestamp, count)` pairs so a long
//! typed burst costs one entry, not one per character.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::tracking::{DiagnosticsProvider, EditHunk};

/// Width of the WPM window in seconds.
pub const WPM_WINDOW_SECS: i64 = 10;

/// Idle gap after which a new focus session starts, in seconds.
pub const IDLE_TIMEOUT_SECS: i64 = 5 * 60;

/// Characters per word for WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Performance signals read at save time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceSnapshot {
    /// Words per minute over the last window.
    pub wpm: u64,
    /// Whole minutes since the current focus session began.
    pub focus_minutes: u64,
    /// Current error-severity diagnostics for the document.
    pub error_count: usize,
    /// Errors fixed since the previous snapshot (negative when introduced).
    pub error_delta: i64,
    /// Whether the document currently has no errors.
    pub clean: bool,
}

/// Process-wide typing tracker with per-document error baselines.
pub struct TypingMetrics {
    clock: SharedClock,
    arrivals: VecDeque<(DateTime<Utc>, u64)>,
    session_start: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    previous_errors: HashMap<String, usize>,
}

impl TypingMetrics {
    /// Create a tracker whose focus session starts now.
    pub fn new(clock: SharedClock) -> Self {
        let now = clock.now();
        Self {
            clock,
            arrivals: VecDeque::new(),
            session_start: now,
            last_activity: now,
            previous_errors: HashMap::new(),
        }
    }

    /// Record an edit batch.
    ///
    /// `_doc` is accepted for symmetry with the classifier; speed and focus
    /// are tracked across all documents.
    pub fn on_edit(&mut self, _doc: &str, hunks: &[EditHunk], bulk_threshold: usize) {
        let now = self.clock.now();
        self.update_focus(now);

        for hunk in hunks {
            let len = hunk.text.chars().count();
            if len > 0 && len <= bulk_threshold {
                self.push_arrivals(now, len as u64);
            }
        }

        self.prune(now);
    }

    /// Read the current signals for `doc` and advance its error baseline.
    pub fn snapshot<D>(&mut self, doc: &str, diagnostics: &D) -> PerformanceSnapshot
    where
        D: DiagnosticsProvider + ?Sized,
    {
        let now = self.clock.now();
        self.prune(now);

        let chars = self.chars_in_window();
        let wpm = ((chars as f64 / CHARS_PER_WORD) * (60.0 / WPM_WINDOW_SECS as f64)).round() as u64;

        let focus_minutes = (now - self.session_start).num_minutes().max(0) as u64;

        let error_count = diagnostics.error_count(doc).unwrap_or(0);
        let previous = self
            .previous_errors
            .insert(doc.to_string(), error_count)
            .unwrap_or(error_count);
        let error_delta = previous as i64 - error_count as i64;

        PerformanceSnapshot {
            wpm,
            focus_minutes,
            error_count,
            error_delta,
            clean: error_count == 0,
        }
    }

    /// Discard the error baseline for a closed document.
    pub fn on_close(&mut self, doc: &str) {
        self.previous_errors.remove(doc);
    }

    /// Characters currently inside the window (without pruning).
    pub fn chars_in_window(&self) -> u64 {
        self.arrivals.iter().map(|(_, count)| count).sum()
    }

    fn update_focus(&mut self, now: DateTime<Utc>) {
        if now - self.last_activity > Duration::seconds(IDLE_TIMEOUT_SECS) {
            tracing::debug!(
                idle_secs = (now - self.last_activity).num_seconds(),
                "focus session restarted after idle gap"
            );
            self.session_start = now;
        }
        self.last_activity = now;
    }

    fn push_arrivals(&mut self, now: DateTime<Utc>, count: u64) {
        match self.arrivals.back_mut() {
            Some((ts, existing)) if *ts == now => *existing += count,
            _ => self.arrivals.push_back((now, count)),
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(WPM_WINDOW_SECS);
        while matches!(self.arrivals.front(), Some((ts, _)) if *ts < cutoff) {
            self.arrivals.pop_front();
        }
    }
}

impl std::fmt::Debug for TypingMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingMetrics")
            .field("arrivals", &self.arrivals.len())
            .field("session_start", &self.session_start)
            .field("last_activity", &self.last_activity)
            .field("documents", &self.previous_errors.len())
            .finish()
    }
}
