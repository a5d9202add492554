//! Editor event types.
//!
//! Every line carries an `event` tag:
//!
//! ```json
//! {"event":"edit","doc":"file:///a.rs","hunks":[{"text":"x","replaced":""}]}
//! {"event":"diagnostics","doc":"file:///a.rs","errors":2}
//! {"event":"save","doc":"file:///a.rs","path":"/src/a.rs"}
//! {"event":"close","doc":"file:///a.rs"}
//! {"event":"balance"}
//! {"event":"respin","cost":1}
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DopamineError, Result};
use crate::tracking::EditHunk;

/// Default respin cost in coins.
pub const DEFAULT_RESPIN_COST: u64 = 1;

fn default_respin_cost() -> u64 {
    DEFAULT_RESPIN_COST
}

/// One event from the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    /// Content changed. `replaced` must hold the pre-edit text.
    Edit {
        doc: String,
        #[serde(default)]
        hunks: Vec<EditHunk>,
    },
    /// Current error-severity diagnostic count for a document.
    Diagnostics { doc: String, errors: usize },
    /// Document saved.
    Save {
        doc: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// Document closed.
    Close { doc: String },
    /// Report the current balance.
    Balance,
    /// Spend coins to draw a catalog reward.
    Respin {
        #[serde(default = "default_respin_cost")]
        cost: u64,
    },
}

/// Parse one input line.
pub fn parse_event(line: &str) -> Result<EditorEvent> {
    serde_json::from_str(line).map_err(|e| DopamineError::input(format!("failed to parse event: {}", e)))
}
