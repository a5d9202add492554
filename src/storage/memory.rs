//! In-memory balance storage for testing.

use std::sync::RwLock;

use crate::error::Result;
use crate::storage::{BalanceStore, WalletState};

/// In-memory balance store.
///
/// State is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    state: RwLock<WalletState>,
}

impl MemoryBalanceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `state`.
    pub fn with_state(state: WalletState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Number of coins currently stored, without any reset check.
    pub fn raw_balance(&self) -> u64 {
        self.state.read().unwrap_or_else(|e| e.into_inner()).balance
    }
}

impl BalanceStore for MemoryBalanceStore {
    fn load(&self) -> Result<WalletState> {
        Ok(self.state.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, state: &WalletState) -> Result<()> {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state.clone();
        Ok(())
    }
}
