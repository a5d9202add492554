//! File-based balance storage for Dopamine.
//!
//! The wallet lives in `~/.dopamine/wallet.json`. Writes go through a temp
//! file and rename so a crash never leaves a half-written wallet.

use std::path::{Path, PathBuf};

use crate::config::wallet_path;
use crate::error::{DopamineError, Result};
use crate::storage::{BalanceStore, WalletState};
use crate::util::{read_to_string_limited, write_atomic};

/// JSON file balance store.
#[derive(Debug, Clone)]
pub struct FileBalanceStore {
    path: PathBuf,
}

impl FileBalanceStore {
    /// Create a store at the default location.
    ///
    /// Uses `~/.dopamine/wallet.json` or `$DOPAMINE_HOME/wallet.json`.
    pub fn new() -> Result<Self> {
        let path = wallet_path().ok_or_else(|| {
            DopamineError::config("could not determine wallet path (no home directory)")
        })?;
        Ok(Self::with_path(path))
    }

    /// Create a store at a custom path. The file is created on first save.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the wallet file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BalanceStore for FileBalanceStore {
    fn load(&self) -> Result<WalletState> {
        if !self.path.exists() {
            return Ok(WalletState::default());
        }

        let content = read_to_string_limited(&self.path)?;
        let state: WalletState = serde_json::from_str(&content)?;
        Ok(state)
    }

    fn save(&self, state: &WalletState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, json.as_bytes())
    }
}
