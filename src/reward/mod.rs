//! Reward calculation for Dopamine.
//!
//! [`decide`] turns a save's edit stats and performance snapshot into a
//! coin payout. On a jackpot, [`pick`] draws a bonus from the configured
//! catalog. Nothing here touches storage or presentation.

pub mod catalog;
pub mod engine;
pub mod selector;

pub use catalog::{RewardItem, RewardKind};
pub use engine::{decide, tuning, Bonus, RewardDecision};
pub use selector::{pick, Weighted};
