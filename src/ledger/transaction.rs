//! Journal record types.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::clock::local_date;

/// Kind of balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Coins paid out for a save.
    Earn,
    /// Coins spent on a respin or redemption.
    Spend,
    /// Balance zeroed at the start of a new day.
    Reset,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionKind::Earn => "earn",
            TransactionKind::Spend => "spend",
            TransactionKind::Reset => "reset",
        };
        f.write_str(s)
    }
}

/// One journal line.
///
/// Serialized as `{"timestamp","type","amount","balanceAfter","reason"}`
/// with a millisecond ISO-8601 UTC timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: u64,
    pub balance_after: u64,
    pub reason: String,
}

impl Transaction {
    pub fn new(
        timestamp: DateTime<Utc>,
        kind: TransactionKind,
        amount: u64,
        balance_after: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind,
            amount,
            balance_after,
            reason: reason.into(),
        }
    }

    /// Local calendar date the transaction falls on.
    pub fn local_date(&self) -> NaiveDate {
        local_date(self.timestamp)
    }

    /// Parse one journal line; `None` for blank or malformed lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(tx) => Some(tx),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed journal line");
                None
            }
        }
    }
}

fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
