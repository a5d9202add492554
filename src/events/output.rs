//! Result lines written back to the editor.

use serde::Serialize;

use crate::reward::RewardItem;
use crate::session::{RespinOutcome, SaveOutcome};
use crate::tracking::Magnitude;

/// One result line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventOutput {
    /// A save paid out (possibly zero coins).
    Reward {
        doc: String,
        coins: u64,
        magnitude: Magnitude,
        labels: Vec<String>,
        jackpot: bool,
        reason: String,
        balance: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        bonus: Option<RewardItem>,
    },
    /// A save below the minimum size.
    Minor {
        doc: String,
        chars_added: u64,
        min_chars: u64,
    },
    /// A save of an excluded file.
    Ignored { doc: String },
    /// The balance changed or was requested.
    Balance { balance: u64 },
    /// Another process wrote the ledger; the stored balance is now this.
    Refresh { balance: u64 },
    /// Result of a respin request.
    Respin {
        #[serde(flatten)]
        outcome: RespinOutcome,
    },
    /// An input line could not be handled.
    Error { message: String },
}

impl EventOutput {
    /// Build the output line for a settled save.
    pub fn from_save(doc: &str, outcome: SaveOutcome) -> Self {
        match outcome {
            SaveOutcome::Ignored => Self::Ignored {
                doc: doc.to_string(),
            },
            SaveOutcome::MinorChange {
                chars_added,
                min_chars,
            } => Self::Minor {
                doc: doc.to_string(),
                chars_added,
                min_chars,
            },
            SaveOutcome::Rewarded {
                decision,
                balance,
                bonus,
            } => Self::Reward {
                doc: doc.to_string(),
                coins: decision.coins,
                magnitude: decision.magnitude,
                labels: decision.labels(),
                jackpot: decision.jackpot,
                reason: decision.reason(),
                balance,
                bonus,
            },
        }
    }

    /// Create an error line.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"kind":"error","message":"failed to serialize output: {}"}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }
}
