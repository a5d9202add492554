//! Balance storage traits for Dopamine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted wallet state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    /// Current coin balance.
    pub balance: u64,
    /// Day the balance belongs to, e.g. `"Wed Jan 01 2025"`.
    ///
    /// `None` before the first run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<String>,
}

/// Trait for wallet storage backends.
///
/// Implementations serialize their own writes. Read-modify-write cycles
/// across processes are not coordinated.
pub trait BalanceStore: Send + Sync {
    /// Load the stored state. A store that has never been written returns
    /// the default state.
    fn load(&self) -> Result<WalletState>;

    /// Replace the stored state.
    fn save(&self, state: &WalletState) -> Result<()>;
}

/// Blanket implementation of BalanceStore for Arc-wrapped stores.
///
/// Lets a test keep a handle on the store it gave to a wallet.
impl<T: BalanceStore + ?Sized> BalanceStore for Arc<T> {
    fn load(&self) -> Result<WalletState> {
        (**self).load()
    }

    fn save(&self, state: &WalletState) -> Result<()> {
        (**self).save(state)
    }
}
