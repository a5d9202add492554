//! The coin payout formula.
//!
//! coins = floor((base + flow + speed) × magnitude × quality), plus
//! `10 × magnitude` on a jackpot. The product is truncated once, after all
//! factors are applied.

use std::fmt;

use crate::config::Config;
use crate::random::RandomSource;
use crate::tracking::{classify_magnitude, EditStats, Magnitude, PerformanceSnapshot};

/// Tuning constants for the payout formula.
pub mod tuning {
    /// Coins every qualifying save starts with.
    pub const BASE_COINS: u64 = 1;
    /// Focus minutes per flow bonus coin.
    pub const FLOW_MINUTES: u64 = 15;
    /// WPM above which the high speed bonus applies.
    pub const WPM_HIGH: u64 = 80;
    /// WPM above which the low speed bonus applies.
    pub const WPM_LOW: u64 = 40;
    /// Coins added above `WPM_HIGH`.
    pub const SPEED_BONUS_HIGH: u64 = 5;
    /// Coins added above `WPM_LOW`.
    pub const SPEED_BONUS_LOW: u64 = 2;
    /// Quality multiplier when errors went down.
    pub const QUALITY_FIX: f64 = 2.0;
    /// Quality multiplier when the document has no errors.
    pub const QUALITY_CLEAN: f64 = 1.5;
    /// Quality multiplier when errors went up.
    pub const QUALITY_BUGGY: f64 = 0.5;
    /// Jackpot payout per magnitude multiplier.
    pub const JACKPOT_MULTIPLIER: u64 = 10;
}

/// A bonus that contributed to a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bonus {
    /// Sustained focus; carries the number of bonus coins.
    Flow(u64),
    SpeedDemon,
    FastTyper,
    BugFixer,
    CleanCode,
    Buggy,
    Jackpot,
}

impl fmt::Display for Bonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bonus::Flow(n) => write!(f, "Flow x{}", n),
            Bonus::SpeedDemon => f.write_str("Speed Demon"),
            Bonus::FastTyper => f.write_str("Fast Typer"),
            Bonus::BugFixer => f.write_str("Bug Fixer"),
            Bonus::CleanCode => f.write_str("Clean Code"),
            Bonus::Buggy => f.write_str("Buggy"),
            Bonus::Jackpot => f.write_str("JACKPOT"),
        }
    }
}

/// Outcome of one save.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardDecision {
    pub coins: u64,
    /// Bonuses in order: flow, speed, quality, jackpot.
    pub bonuses: Vec<Bonus>,
    pub jackpot: bool,
    pub magnitude: Magnitude,
    /// The save added fewer characters than `min_chars`.
    pub gated: bool,
}

impl RewardDecision {
    fn gated(magnitude: Magnitude) -> Self {
        Self {
            coins: 0,
            bonuses: Vec::new(),
            jackpot: false,
            magnitude,
            gated: true,
        }
    }

    /// All bonus labels in order.
    pub fn labels(&self) -> Vec<String> {
        self.bonuses.iter().map(ToString::to_string).collect()
    }

    /// Ledger reason, e.g. `Code Action (Medium) JACKPOT Flow x2, Clean Code`.
    pub fn reason(&self) -> String {
        let mut reason = format!("Code Action ({})", self.magnitude);
        if self.jackpot {
            reason.push_str(" JACKPOT");
        }
        let rest: Vec<String> = self
            .bonuses
            .iter()
            .filter(|b| **b != Bonus::Jackpot)
            .map(ToString::to_string)
            .collect();
        if !rest.is_empty() {
            reason.push(' ');
            reason.push_str(&rest.join(", "));
        }
        reason
    }
}

/// Compute the payout for a save.
///
/// Gated saves return before the jackpot roll and leave `rng` untouched.
pub fn decide<R>(
    stats: &EditStats,
    snapshot: &PerformanceSnapshot,
    config: &Config,
    rng: &mut R,
) -> RewardDecision
where
    R: RandomSource + ?Sized,
{
    let magnitude = classify_magnitude(stats, &config.thresholds);

    if stats.chars_added < config.thresholds.min_chars {
        return RewardDecision::gated(magnitude);
    }

    let multiplier = magnitude.multiplier();
    let mut bonuses = Vec::new();
    let mut base = tuning::BASE_COINS;

    if snapshot.focus_minutes > tuning::FLOW_MINUTES {
        let flow = snapshot.focus_minutes / tuning::FLOW_MINUTES;
        if flow > 0 {
            base += flow;
            bonuses.push(Bonus::Flow(flow));
        }
    }

    if snapshot.wpm > tuning::WPM_HIGH {
        base += tuning::SPEED_BONUS_HIGH;
        bonuses.push(Bonus::SpeedDemon);
    } else if snapshot.wpm > tuning::WPM_LOW {
        base += tuning::SPEED_BONUS_LOW;
        bonuses.push(Bonus::FastTyper);
    }

    let quality = if snapshot.error_delta > 0 {
        bonuses.push(Bonus::BugFixer);
        tuning::QUALITY_FIX
    } else if snapshot.clean {
        bonuses.push(Bonus::CleanCode);
        tuning::QUALITY_CLEAN
    } else if snapshot.error_delta < 0 {
        bonuses.push(Bonus::Buggy);
        tuning::QUALITY_BUGGY
    } else {
        1.0
    };

    let mut coins = (base as f64 * multiplier as f64 * quality).floor() as u64;

    let roll = rng.next_f64();
    let jackpot = roll < config.reward.win_odds && snapshot.error_delta >= 0;
    if jackpot {
        coins += tuning::JACKPOT_MULTIPLIER * multiplier;
        bonuses.push(Bonus::Jackpot);
    }

    tracing::debug!(
        coins,
        magnitude = %magnitude,
        jackpot,
        roll,
        "reward decided"
    );

    RewardDecision {
        coins,
        bonuses,
        jackpot,
        magnitude,
        gated: false,
    }
}
