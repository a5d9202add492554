//! The coin wallet.
//!
//! A single balance that starts over every local calendar day. Every change
//! is saved to the [`BalanceStore`] first and journaled to the [`Ledger`]
//! second; a journal failure never undoes a committed balance change.

use std::sync::mpsc::{self, Receiver, Sender};

use chrono::NaiveDate;

use crate::clock::SharedClock;
use crate::error::{FailOpen, Result};
use crate::ledger::{Ledger, TransactionKind};
use crate::storage::{BalanceStore, WalletState};

/// Layout of the stored last-active date, e.g. `Wed Jan 01 2025`.
pub const DATE_FORMAT: &str = "%a %b %d %Y";

/// Ledger reason recorded for the daily reset.
pub const RESET_REASON: &str = "Daily Reset";

/// Render a date the way the wallet stores it.
pub fn format_day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Balance a store holds for `today`, read without writing anything.
///
/// A state from an earlier day reads as 0, which is what the next wallet
/// access will reset it to. Used to report another process's writes.
pub fn stored_balance<S: BalanceStore + ?Sized>(store: &S, today: NaiveDate) -> Result<u64> {
    let state = store.load()?;
    if state.last_active_date.as_deref() == Some(format_day(today).as_str()) {
        Ok(state.balance)
    } else {
        Ok(0)
    }
}

/// Daily-reset coin balance backed by a store and a ledger.
pub struct Wallet<S: BalanceStore> {
    store: S,
    ledger: Ledger,
    clock: SharedClock,
    subscribers: Vec<Sender<u64>>,
}

impl<S: BalanceStore> Wallet<S> {
    /// Open the wallet, applying the daily reset if the day has changed.
    pub fn open(store: S, ledger: Ledger, clock: SharedClock) -> Result<Self> {
        let mut wallet = Self {
            store,
            ledger,
            clock,
            subscribers: Vec::new(),
        };
        wallet.check_daily_reset()?;
        Ok(wallet)
    }

    /// The journal this wallet writes to.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Receive every balance change from now on.
    pub fn subscribe(&mut self) -> Receiver<u64> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Zero the balance if the stored day is not today.
    ///
    /// Returns whether a reset happened. A first run counts as a new day.
    pub fn check_daily_reset(&mut self) -> Result<bool> {
        let (_, reset) = self.current_state()?;
        Ok(reset)
    }

    /// Current balance, after the reset check.
    pub fn balance(&mut self) -> Result<u64> {
        let (state, _) = self.current_state()?;
        Ok(state.balance)
    }

    /// Add coins and journal an `earn`. Returns the new balance.
    ///
    /// A zero amount is still journaled.
    pub fn add_coins(&mut self, amount: u64, reason: &str) -> Result<u64> {
        let (mut state, _) = self.current_state()?;
        state.balance = state.balance.saturating_add(amount);
        self.store.save(&state)?;

        self.notify(state.balance);
        self.ledger
            .append(TransactionKind::Earn, amount, state.balance, reason);

        tracing::debug!(amount, balance = state.balance, reason, "coins added");
        Ok(state.balance)
    }

    /// Spend coins if the balance covers `amount`.
    ///
    /// Returns `false` and changes nothing when funds are insufficient.
    pub fn spend_coins(&mut self, amount: u64, reason: &str) -> Result<bool> {
        let (mut state, _) = self.current_state()?;
        if state.balance < amount {
            tracing::debug!(amount, balance = state.balance, "insufficient funds");
            return Ok(false);
        }

        state.balance -= amount;
        self.store.save(&state)?;

        self.notify(state.balance);
        self.ledger
            .append(TransactionKind::Spend, amount, state.balance, reason);

        tracing::debug!(amount, balance = state.balance, reason, "coins spent");
        Ok(true)
    }

    /// Load the state, resetting it first if the day has changed.
    fn current_state(&mut self) -> Result<(WalletState, bool)> {
        let state = self
            .store
            .load()
            .fail_open_default("loading wallet state");
        let today = format_day(self.clock.today());

        if state.last_active_date.as_deref() == Some(today.as_str()) {
            return Ok((state, false));
        }

        let reset = WalletState {
            balance: 0,
            last_active_date: Some(today),
        };
        self.store.save(&reset)?;

        tracing::info!(
            previous_balance = state.balance,
            previous_date = state.last_active_date.as_deref().unwrap_or("none"),
            "daily reset"
        );

        self.notify(0);
        self.ledger
            .append(TransactionKind::Reset, 0, 0, RESET_REASON);

        Ok((reset, true))
    }

    fn notify(&mut self, balance: u64) {
        self.subscribers.retain(|tx| tx.send(balance).is_ok());
    }
}

impl<S: BalanceStore> std::fmt::Debug for Wallet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("ledger", &self.ledger)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
