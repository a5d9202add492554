//! The save loop: edits in, payouts out.
//!
//! [`RewardLoop`] owns one classifier, one typing tracker and the wallet.
//! The editor integration calls [`RewardLoop::on_edit`] for every content
//! change, [`RewardLoop::on_save`] for every save and
//! [`RewardLoop::on_close`] when a document closes.

use std::path::Path;

use serde::Serialize;

use crate::clock::SharedClock;
use crate::config::Config;
use crate::error::Result;
use crate::random::RandomSource;
use crate::reward::{decide, pick, RewardDecision, RewardItem, Weighted};
use crate::storage::BalanceStore;
use crate::tracking::{DiagnosticsProvider, EditClassifier, EditHunk, TypingMetrics};
use crate::wallet::Wallet;

/// Ledger reason for a paid respin.
pub const RESPIN_REASON: &str = "Respin";

/// What a save produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The file type is excluded from rewards. Pending stats are kept.
    Ignored,
    /// Too few characters were added to pay out.
    MinorChange { chars_added: u64, min_chars: u64 },
    /// A payout was computed and applied.
    Rewarded {
        decision: RewardDecision,
        balance: u64,
        /// Catalog bonus drawn on a jackpot.
        bonus: Option<RewardItem>,
    },
}

/// What a respin produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RespinOutcome {
    /// Coins were spent and a reward drawn.
    Drawn { reward: RewardItem, balance: u64 },
    /// The balance did not cover the cost.
    InsufficientFunds { balance: u64, cost: u64 },
    /// The catalog has no eligible rewards; nothing was spent.
    EmptyCatalog,
}

/// Wires the trackers, the payout formula and the wallet together.
pub struct RewardLoop<S: BalanceStore, R: RandomSource> {
    config: Config,
    classifier: EditClassifier,
    typing: TypingMetrics,
    wallet: Wallet<S>,
    rng: R,
}

impl<S: BalanceStore, R: RandomSource> RewardLoop<S, R> {
    pub fn new(config: Config, wallet: Wallet<S>, clock: SharedClock, rng: R) -> Self {
        Self {
            config,
            classifier: EditClassifier::new(),
            typing: TypingMetrics::new(clock),
            wallet,
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn wallet(&self) -> &Wallet<S> {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut Wallet<S> {
        &mut self.wallet
    }

    pub fn classifier(&self) -> &EditClassifier {
        &self.classifier
    }

    /// Feed one batch of content changes for `doc`.
    pub fn on_edit(&mut self, doc: &str, hunks: &[EditHunk]) {
        let bulk_threshold = self.config.tracking.bulk_threshold;
        self.classifier.on_edit(doc, hunks, bulk_threshold);
        self.typing.on_edit(doc, hunks, bulk_threshold);
    }

    /// Settle a save of `doc`.
    ///
    /// `path` is the file on disk, used for the ignore filter; documents
    /// without one are never ignored.
    pub fn on_save<D>(&mut self, doc: &str, path: Option<&Path>, diagnostics: &D) -> Result<SaveOutcome>
    where
        D: DiagnosticsProvider + ?Sized,
    {
        if path.is_some_and(|p| self.config.tracking.is_ignored(p)) {
            tracing::debug!(doc, "save ignored by file filter");
            return Ok(SaveOutcome::Ignored);
        }

        let stats = self.classifier.drain(doc);
        let snapshot = self.typing.snapshot(doc, diagnostics);
        let decision = decide(&stats, &snapshot, &self.config, &mut self.rng);

        if decision.gated {
            return Ok(SaveOutcome::MinorChange {
                chars_added: stats.chars_added,
                min_chars: self.config.thresholds.min_chars,
            });
        }

        let balance = self.wallet.add_coins(decision.coins, &decision.reason())?;

        let bonus = if decision.jackpot {
            pick(&self.config.reward.catalog, &mut self.rng).cloned()
        } else {
            None
        };

        tracing::info!(
            doc,
            coins = decision.coins,
            magnitude = %decision.magnitude,
            jackpot = decision.jackpot,
            balance,
            "save rewarded"
        );

        Ok(SaveOutcome::Rewarded {
            decision,
            balance,
            bonus,
        })
    }

    /// Forget per-document state for a closed document.
    pub fn on_close(&mut self, doc: &str) {
        self.typing.on_close(doc);
        self.classifier.forget(doc);
    }

    /// Spend `cost` coins to draw a catalog reward.
    pub fn respin(&mut self, cost: u64) -> Result<RespinOutcome> {
        respin(&mut self.wallet, &self.config.reward.catalog, cost, &mut self.rng)
    }
}

/// Spend `cost` coins from `wallet` and draw from `catalog`.
///
/// Nothing is spent when the catalog has no eligible item.
pub fn respin<S, R>(
    wallet: &mut Wallet<S>,
    catalog: &[RewardItem],
    cost: u64,
    rng: &mut R,
) -> Result<RespinOutcome>
where
    S: BalanceStore,
    R: RandomSource + ?Sized,
{
    if !catalog.iter().any(|item| {
        let w = item.weight();
        w.is_finite() && w > 0.0
    }) {
        return Ok(RespinOutcome::EmptyCatalog);
    }

    if !wallet.spend_coins(cost, RESPIN_REASON)? {
        return Ok(RespinOutcome::InsufficientFunds {
            balance: wallet.balance()?,
            cost,
        });
    }

    let balance = wallet.balance()?;
    match pick(catalog, rng) {
        Some(reward) => Ok(RespinOutcome::Drawn {
            reward: reward.clone(),
            balance,
        }),
        None => Ok(RespinOutcome::EmptyCatalog),
    }
}

impl<S: BalanceStore, R: RandomSource> std::fmt::Debug for RewardLoop<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardLoop")
            .field("classifier", &self.classifier)
            .field("typing", &self.typing)
            .field("wallet", &self.wallet)
            .finish()
    }
}
