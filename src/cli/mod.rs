//! CLI commands for Dopamine.
//!
//! - **Wallet commands**: balance, spend, respin (read or change today's coins)
//! - **Ledger commands**: history, calendar, stats (read-only journal reports)
//!
//! The `run` event loop lives in [`crate::events`].

// Wallet commands
pub mod balance;
pub mod respin;
pub mod spend;

// Ledger commands
pub mod calendar;
pub mod history;
pub mod stats;

pub use balance::BalanceCommand;
pub use calendar::CalendarCommand;
pub use history::HistoryCommand;
pub use respin::RespinCommand;
pub use spend::SpendCommand;
pub use stats::StatsCommand;
