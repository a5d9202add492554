//! Spend command for Dopamine.
//!
//! Redeems coins from today's balance.

use serde::Serialize;

use crate::error::FailOpen;
use crate::storage::BalanceStore;
use crate::wallet::Wallet;

/// Reason recorded when none is given.
pub const DEFAULT_REASON: &str = "Redeem";

/// Options for the spend command.
#[derive(Debug, Clone, Default)]
pub struct SpendOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the spend command.
#[derive(Debug, Clone, Serialize)]
pub struct SpendOutput {
    pub success: bool,
    pub amount: u64,
    /// Balance after the attempt.
    pub balance: u64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SpendOutput {
    pub fn success(amount: u64, balance: u64, reason: impl Into<String>) -> Self {
        Self {
            success: true,
            amount,
            balance,
            reason: reason.into(),
            error: None,
        }
    }

    pub fn failure(amount: u64, balance: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            amount,
            balance,
            reason: String::new(),
            error: Some(error.into()),
        }
    }
}

/// The spend command implementation.
pub struct SpendCommand<S: BalanceStore> {
    wallet: Wallet<S>,
}

impl<S: BalanceStore> SpendCommand<S> {
    pub fn new(wallet: Wallet<S>) -> Self {
        Self { wallet }
    }

    /// Spend `amount` coins. Insufficient funds leave the balance untouched.
    pub fn run(&mut self, amount: u64, reason: Option<&str>) -> SpendOutput {
        let reason = reason.unwrap_or(DEFAULT_REASON);

        match self.wallet.spend_coins(amount, reason) {
            Ok(true) => match self.wallet.balance() {
                Ok(balance) => SpendOutput::success(amount, balance, reason),
                Err(e) => SpendOutput::failure(amount, 0, e.to_string()),
            },
            Ok(false) => {
                let balance = self
                    .wallet
                    .balance()
                    .fail_open_with("reading balance after refused spend", 0);
                SpendOutput::failure(
                    amount,
                    balance,
                    format!("insufficient funds: balance {}, need {}", balance, amount),
                )
            }
            Err(e) => SpendOutput::failure(amount, 0, e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &SpendOutput, options: &SpendOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else if output.success {
            format!(
                "Spent {} coins ({}). Balance: {}\n",
                output.amount, output.reason, output.balance
            )
        } else {
            format!(
                "Spend failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::ledger::{Ledger, TransactionKind};
    use crate::storage::{MemoryBalanceStore, WalletState};
    use crate::wallet::format_day;
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn command(dir: &TempDir, balance: u64) -> SpendCommand<MemoryBalanceStore> {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = MemoryBalanceStore::with_state(WalletState {
            balance,
            last_active_date: Some(format_day(clock.today())),
        });
        let ledger = Ledger::open(dir.path(), clock.clone());
        SpendCommand::new(Wallet::open(store, ledger, clock).unwrap())
    }

    #[test]
    fn test_spend_success() {
        let dir = TempDir::new().unwrap();
        let mut cmd = command(&dir, 10);

        let output = cmd.run(3, Some("Coffee"));

        assert!(output.success);
        assert_eq!(output.balance, 7);
        assert_eq!(output.reason, "Coffee");

        let recent = cmd.wallet.ledger().recent(1);
        assert_eq!(recent[0].kind, TransactionKind::Spend);
        assert_eq!(recent[0].amount, 3);
        assert_eq!(recent[0].balance_after, 7);
    }

    #[test]
    fn test_spend_default_reason() {
        let dir = TempDir::new().unwrap();
        let mut cmd = command(&dir, 10);
        assert_eq!(cmd.run(1, None).reason, DEFAULT_REASON);
    }

    #[test]
    fn test_spend_insufficient_funds() {
        let dir = TempDir::new().unwrap();
        let mut cmd = command(&dir, 2);

        let output = cmd.run(5, None);

        assert!(!output.success);
        assert_eq!(output.balance, 2);
        assert!(output.error.as_deref().unwrap().contains("insufficient funds"));
        assert!(cmd.wallet.ledger().recent(10).is_empty());
    }

    #[test]
    fn test_format_output() {
        let dir = TempDir::new().unwrap();
        let cmd = command(&dir, 0);

        let text = cmd.format_output(
            &SpendOutput::success(2, 8, "Snack"),
            &SpendOptions::default(),
        );
        assert_eq!(text, "Spent 2 coins (Snack). Balance: 8\n");

        let text = cmd.format_output(
            &SpendOutput::failure(2, 0, "insufficient funds"),
            &SpendOptions::default(),
        );
        assert_eq!(text, "Spend failed: insufficient funds\n");
    }
}
