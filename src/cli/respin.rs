//! Respin command for Dopamine.
//!
//! Pays coins to draw a bonus from the reward catalog.

use serde::Serialize;

use crate::random::RandomSource;
use crate::reward::RewardItem;
use crate::session::{respin, RespinOutcome};
use crate::storage::BalanceStore;
use crate::wallet::Wallet;

/// Options for the respin command.
#[derive(Debug, Clone, Default)]
pub struct RespinOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the respin command.
#[derive(Debug, Clone, Serialize)]
pub struct RespinOutput {
    /// Whether a reward was drawn.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RespinOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RespinOutput {
    fn from_outcome(outcome: RespinOutcome) -> Self {
        let error = match &outcome {
            RespinOutcome::Drawn { .. } => None,
            RespinOutcome::InsufficientFunds { balance, cost } => Some(format!(
                "insufficient funds: balance {}, need {}",
                balance, cost
            )),
            RespinOutcome::EmptyCatalog => Some("reward catalog is empty".to_string()),
        };
        Self {
            success: error.is_none(),
            outcome: Some(outcome),
            error,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            error: Some(error.into()),
        }
    }
}

/// The respin command implementation.
pub struct RespinCommand<S: BalanceStore, R: RandomSource> {
    wallet: Wallet<S>,
    catalog: Vec<RewardItem>,
    rng: R,
}

impl<S: BalanceStore, R: RandomSource> RespinCommand<S, R> {
    pub fn new(wallet: Wallet<S>, catalog: Vec<RewardItem>, rng: R) -> Self {
        Self {
            wallet,
            catalog,
            rng,
        }
    }

    pub fn run(&mut self, cost: u64) -> RespinOutput {
        match respin(&mut self.wallet, &self.catalog, cost, &mut self.rng) {
            Ok(outcome) => RespinOutput::from_outcome(outcome),
            Err(e) => RespinOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RespinOutput, options: &RespinOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match &output.outcome {
            Some(RespinOutcome::Drawn { reward, balance }) => format!(
                "{} [{}]\n{}\nBalance: {}\n",
                reward.label, reward.kind, reward.content, balance
            ),
            _ => format!(
                "Respin failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
