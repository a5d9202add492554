//! Balance command for Dopamine.
//!
//! Shows today's coin balance, applying the daily reset first.

use serde::Serialize;

use crate::storage::BalanceStore;
use crate::wallet::{format_day, Wallet};

/// Options for the balance command.
#[derive(Debug, Clone, Default)]
pub struct BalanceOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the balance command.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceOutput {
    /// Whether the balance could be read.
    pub success: bool,
    /// Current balance in coins.
    pub balance: u64,
    /// The day the balance belongs to.
    pub date: String,
    /// Error message if the read failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BalanceOutput {
    /// Create a successful output.
    pub fn success(balance: u64, date: impl Into<String>) -> Self {
        Self {
            success: true,
            balance,
            date: date.into(),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            balance: 0,
            date: String::new(),
            error: Some(error.into()),
        }
    }
}

/// The balance command implementation.
pub struct BalanceCommand<S: BalanceStore> {
    wallet: Wallet<S>,
}

impl<S: BalanceStore> BalanceCommand<S> {
    /// Create a new balance command.
    pub fn new(wallet: Wallet<S>) -> Self {
        Self { wallet }
    }

    /// Run the balance command.
    pub fn run(&mut self) -> BalanceOutput {
        match self.wallet.balance() {
            Ok(balance) => BalanceOutput::success(balance, format_day(self.wallet.ledger().today())),
            Err(e) => BalanceOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &BalanceOutput, options: &BalanceOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else if output.success {
            format!("{} coins ({})\n", output.balance, output.date)
        } else {
            format!(
                "Failed to read balance: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ledger::Ledger;
    use crate::storage::{MemoryBalanceStore, WalletState};
    use chrono::{Local, TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn command(state: WalletState) -> (TempDir, BalanceCommand<MemoryBalanceStore>) {
        let dir = TempDir::new().unwrap();
        let now = Local
            .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let clock = Arc::new(ManualClock::new(now));
        let ledger = Ledger::open(dir.path(), clock.clone());
        let wallet = Wallet::open(MemoryBalanceStore::with_state(state), ledger, clock).unwrap();
        (dir, BalanceCommand::new(wallet))
    }

    #[test]
    fn test_balance_same_day() {
        let (_dir, mut cmd) = command(WalletState {
            balance: 42,
            last_active_date: Some("Wed Jan 01 2025".to_string()),
        });

        let output = cmd.run();

        assert!(output.success);
        assert_eq!(output.balance, 42);
        assert_eq!(output.date, "Wed Jan 01 2025");
    }

    #[test]
    fn test_balance_resets_on_new_day() {
        let (_dir, mut cmd) = command(WalletState {
            balance: 42,
            last_active_date: Some("Tue Dec 31 2024".to_string()),
        });
        assert_eq!(cmd.run().balance, 0);
    }

    #[test]
    fn test_format_output() {
        let (_dir, cmd) = command(WalletState::default());
        let output = BalanceOutput::success(7, "Wed Jan 01 2025");

        let text = cmd.format_output(&output, &BalanceOptions::default());
        assert_eq!(text, "7 coins (Wed Jan 01 2025)\n");

        let json = cmd.format_output(
            &output,
            &BalanceOptions {
                json: true,
                quiet: false,
            },
        );
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["balance"], 7);
        assert!(value.get("error").is_none());

        let quiet = cmd.format_output(
            &output,
            &BalanceOptions {
                json: false,
                quiet: true,
            },
        );
        assert!(quiet.is_empty());
    }
}
