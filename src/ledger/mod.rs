//! Transaction ledger for Dopamine.
//!
//! Every balance change is journaled as one JSON line in a per-month file
//! (`transactions-YYYY-MM.jsonl`, local calendar month). The journal is an
//! audit trail: write failures are logged and swallowed, and the wallet
//! store stays authoritative for the balance itself.

pub mod aggregate;
pub mod journal;
pub mod transaction;
pub mod watch;

pub use aggregate::{DailyAggregate, MonthlyAggregate};
pub use journal::{Ledger, LEGACY_FILE_NAME, MIGRATED_SUFFIX};
pub use transaction::{Transaction, TransactionKind};
pub use watch::{LedgerWatcher, DEBOUNCE};
