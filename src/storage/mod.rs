//! Durable wallet storage for Dopamine.
//!
//! The wallet state (balance plus last-active date) is the system of record
//! for the balance. File and in-memory backends are provided.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileBalanceStore;
pub use memory::MemoryBalanceStore;
pub use traits::{BalanceStore, WalletState};
