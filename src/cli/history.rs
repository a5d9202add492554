//! History command for Dopamine.
//!
//! Lists the most recent journal entries, newest first.

use serde::Serialize;

use crate::ledger::{Ledger, Transaction, TransactionKind};

/// Default number of entries shown.
pub const DEFAULT_LIMIT: usize = 20;

/// Options for the history command.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of entries.
    pub limit: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Output format for the history command.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryOutput {
    pub success: bool,
    pub transactions: Vec<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The history command implementation.
pub struct HistoryCommand {
    ledger: Ledger,
}

impl HistoryCommand {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Run the history command. Reads never fail; unreadable months are
    /// skipped.
    pub fn run(&self, options: &HistoryOptions) -> HistoryOutput {
        HistoryOutput {
            success: true,
            transactions: self.ledger.recent(options.limit),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HistoryOutput, options: &HistoryOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if output.transactions.is_empty() {
            return "No transactions yet.\n".to_string();
        }

        let mut text = String::new();
        for tx in &output.transactions {
            text.push_str(&format_transaction(tx));
            text.push('\n');
        }
        text
    }
}

/// One human-readable history row.
fn format_transaction(tx: &Transaction) -> String {
    let when = tx.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
    let amount = match tx.kind {
        TransactionKind::Earn => format!("+{}", tx.amount),
        TransactionKind::Spend => format!("-{}", tx.amount),
        TransactionKind::Reset => "0".to_string(),
    };
    format!(
        "{}  {:<5}  {:>6}  balance {:>5}  {}",
        when, tx.kind, amount, tx.balance_after, tx.reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, Local, TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ledger_with_entries(dir: &TempDir) -> Ledger {
        let start = Local
            .with_ymd_and_hms(2025, 6, 10, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let clock = Arc::new(ManualClock::new(start));
        let ledger = Ledger::open(dir.path(), clock.clone());
        ledger.append(TransactionKind::Reset, 0, 0, "Daily Reset");
        clock.advance(Duration::minutes(1));
        ledger.append(TransactionKind::Earn, 5, 5, "Code Action (Small)");
        clock.advance(Duration::minutes(1));
        ledger.append(TransactionKind::Spend, 1, 4, "Respin");
        ledger
    }

    #[test]
    fn test_history_newest_first() {
        let dir = TempDir::new().unwrap();
        let cmd = HistoryCommand::new(ledger_with_entries(&dir));

        let output = cmd.run(&HistoryOptions::default());

        assert!(output.success);
        let kinds: Vec<TransactionKind> = output.transactions.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TransactionKind::Spend, TransactionKind::Earn, TransactionKind::Reset]
        );
    }

    #[test]
    fn test_history_limit() {
        let dir = TempDir::new().unwrap();
        let cmd = HistoryCommand::new(ledger_with_entries(&dir));

        let output = cmd.run(&HistoryOptions {
            limit: 1,
            ..Default::default()
        });

        assert_eq!(output.transactions.len(), 1);
        assert_eq!(output.transactions[0].reason, "Respin");
    }

    #[test]
    fn test_format_text() {
        let dir = TempDir::new().unwrap();
        let cmd = HistoryCommand::new(ledger_with_entries(&dir));
        let options = HistoryOptions::default();

        let text = cmd.format_output(&cmd.run(&options), &options);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("spend"));
        assert!(lines[0].contains("-1"));
        assert!(lines[1].contains("+5"));
        assert!(lines[1].ends_with("Code Action (Small)"));
    }

    #[test]
    fn test_format_empty_and_json() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cmd = HistoryCommand::new(Ledger::open(dir.path(), clock));

        let output = cmd.run(&HistoryOptions::default());
        assert_eq!(
            cmd.format_output(&output, &HistoryOptions::default()),
            "No transactions yet.\n"
        );

        let json = cmd.format_output(
            &output,
            &HistoryOptions {
                json: true,
                ..Default::default()
            },
        );
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["transactions"], serde_json::json!([]));
    }
}
