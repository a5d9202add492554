//! Dopamine - coding-activity rewards
//!
//! Dopamine watches editor activity, sizes each save by how much was
//! actually written, and pays out coins into a wallet that starts over every
//! day. Every balance change is journaled to a monthly-rotated JSONL ledger
//! that feeds history, calendar and stats reports.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod random;
pub mod reward;
pub mod session;
pub mod storage;
pub mod tracking;
pub mod util;
pub mod wallet;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use error::{DopamineError, FailOpen, Result};
pub use events::{EditorEvent, EventOutput, EventRunner};
pub use ledger::{DailyAggregate, Ledger, LedgerWatcher, MonthlyAggregate, Transaction, TransactionKind};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use reward::{decide, pick, Bonus, RewardDecision, RewardItem, RewardKind, Weighted};
pub use session::{RespinOutcome, RewardLoop, SaveOutcome};
pub use storage::{BalanceStore, FileBalanceStore, MemoryBalanceStore, WalletState};
pub use tracking::{
    classify_magnitude, DiagnosticsProvider, DiagnosticsTable, EditClassifier, EditHunk,
    EditStats, Magnitude, PerformanceSnapshot, TypingMetrics,
};
pub use wallet::Wallet;

// CLI commands
pub use cli::{
    BalanceCommand, CalendarCommand, HistoryCommand, RespinCommand, SpendCommand, StatsCommand,
};
