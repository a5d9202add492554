//! Monthly-rotated JSONL journal.
//!
//! Layout under the ledger directory:
//! - `transactions-YYYY-MM.jsonl`: one file per local calendar month
//! - `transactions.jsonl`: legacy single file, replayed once on open
//! - `transactions.jsonl.migrated`: the legacy file after replay

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::clock::SharedClock;
use crate::error::{DopamineError, FailOpen, Result};
use crate::ledger::aggregate::{
    bucket_by_day, month_dates, months_spanned, previous_month, trailing_dates,
};
use crate::ledger::{DailyAggregate, MonthlyAggregate, Transaction, TransactionKind};
use crate::util::{read_bytes_limited, write_atomic};

/// File name of the pre-rotation journal.
pub const LEGACY_FILE_NAME: &str = "transactions.jsonl";

/// Suffix appended to the legacy journal once replayed.
pub const MIGRATED_SUFFIX: &str = ".migrated";

/// Append-only transaction journal.
pub struct Ledger {
    dir: PathBuf,
    clock: SharedClock,
}

impl Ledger {
    /// Open the journal in `dir`, creating it and replaying any legacy
    /// journal. Neither step is fatal.
    pub fn open(dir: impl Into<PathBuf>, clock: SharedClock) -> Self {
        let ledger = Self {
            dir: dir.into(),
            clock,
        };

        if let Err(e) = fs::create_dir_all(&ledger.dir) {
            tracing::warn!(
                dir = %ledger.dir.display(),
                error = %e,
                "failed to create ledger directory"
            );
        }

        let migrated = ledger.migrate_legacy().fail_open_default("migrating legacy journal");
        if migrated > 0 {
            tracing::info!(count = migrated, "migrated legacy journal");
        }

        ledger
    }

    /// The ledger directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Today's local date according to the ledger's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Path of the journal file for a month.
    pub fn month_path(&self, year: i32, month: u32) -> PathBuf {
        self.dir.join(month_file_name(year, month))
    }

    /// Path of the legacy journal.
    pub fn legacy_path(&self) -> PathBuf {
        self.dir.join(LEGACY_FILE_NAME)
    }

    /// Journal a balance change in the current month's file.
    ///
    /// Write failures are logged and swallowed. The record is returned either
    /// way.
    pub fn append(
        &self,
        kind: TransactionKind,
        amount: u64,
        balance_after: u64,
        reason: &str,
    ) -> Transaction {
        let tx = Transaction::new(self.clock.now(), kind, amount, balance_after, reason);
        if let Err(e) = self.write(&tx) {
            tracing::warn!(kind = %kind, amount, error = %e, "failed to write transaction");
        }
        tx
    }

    fn write(&self, tx: &Transaction) -> Result<()> {
        let date = tx.local_date();
        let path = self.month_path(date.year(), date.month());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DopamineError::storage(parent, e))?;
        }

        let json = serde_json::to_string(tx)
            .map_err(|e| DopamineError::serde(format!("failed to serialize transaction: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| DopamineError::storage(&path, e))?;

        writeln!(file, "{}", json).map_err(|e| DopamineError::storage(&path, e))
    }

    /// Read every valid record of a month, in file order.
    ///
    /// A missing file reads as empty; malformed lines are skipped.
    pub fn read_month(&self, year: i32, month: u32) -> Vec<Transaction> {
        let path = self.month_path(year, month);
        read_journal(&path).fail_open_default("reading journal")
    }

    /// Up to `limit` most recent records, newest first.
    ///
    /// Reads the current month and, if that is not enough, the one before.
    pub fn recent(&self, limit: usize) -> Vec<Transaction> {
        if limit == 0 {
            return Vec::new();
        }

        let today = self.clock.today();
        let (year, month) = (today.year(), today.month());

        let mut records: Vec<Transaction> = self.read_month(year, month).into_iter().rev().collect();
        if records.len() < limit {
            let (prev_year, prev_month) = previous_month(year, month);
            records.extend(self.read_month(prev_year, prev_month).into_iter().rev());
        }

        // Stable: equal timestamps keep reverse file order.
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        records
    }

    /// One entry per day of the month, zero days included.
    ///
    /// An invalid month yields an empty list.
    pub fn monthly_aggregate(&self, year: i32, month: u32) -> Vec<DailyAggregate> {
        let dates = month_dates(year, month);
        if dates.is_empty() {
            return Vec::new();
        }
        let records = self.read_month(year, month);
        bucket_by_day(&dates, &records)
    }

    /// One entry per day for the last `days` days ending today, oldest first.
    pub fn daily_stats(&self, days: u32) -> Vec<DailyAggregate> {
        let dates = trailing_dates(self.clock.today(), days);
        let records: Vec<Transaction> = months_spanned(&dates)
            .into_iter()
            .flat_map(|(year, month)| self.read_month(year, month))
            .collect();
        bucket_by_day(&dates, &records)
    }

    /// Twelve monthly totals for `year`.
    pub fn yearly_summary(&self, year: i32) -> Vec<MonthlyAggregate> {
        (1..=12)
            .map(|month| MonthlyAggregate::from_days(year, month, &self.monthly_aggregate(year, month)))
            .collect()
    }

    /// Replay the legacy journal into month files, then rename it.
    ///
    /// Returns the number of records replayed. Replayed lines go before any
    /// lines the month file already holds. Lines already present in a month
    /// file are not replayed again, so a run cut short by an error can be
    /// retried on the next open.
    pub fn migrate_legacy(&self) -> Result<usize> {
        let legacy = self.legacy_path();
        if !legacy.exists() {
            return Ok(0);
        }

        let legacy_bytes = read_bytes_limited(&legacy)?;

        let mut by_month: BTreeMap<(i32, u32), Vec<&str>> = BTreeMap::new();
        for line in journal_lines(&legacy_bytes) {
            let Some(tx) = Transaction::parse_line(line) else {
                continue;
            };
            let date = tx.local_date();
            by_month.entry((date.year(), date.month())).or_default().push(line);
        }

        let mut count = 0;
        for ((year, month), lines) in by_month {
            let path = self.month_path(year, month);
            let existing = if path.exists() {
                read_bytes_limited(&path)?
            } else {
                Vec::new()
            };

            let present: HashSet<&str> = journal_lines(&existing).collect();
            let pending: Vec<&str> = lines
                .into_iter()
                .filter(|line| !present.contains(line))
                .collect();
            if pending.is_empty() {
                continue;
            }

            let mut merged = Vec::with_capacity(existing.len() + pending.iter().map(|l| l.len() + 1).sum::<usize>());
            for line in &pending {
                merged.extend_from_slice(line.as_bytes());
                merged.push(b'\n');
            }
            merged.extend_from_slice(&existing);
            write_atomic(&path, &merged)?;
            count += pending.len();
        }

        let mut renamed = legacy.clone().into_os_string();
        renamed.push(MIGRATED_SUFFIX);
        fs::rename(&legacy, &renamed).map_err(|e| DopamineError::storage(&legacy, e))?;

        Ok(count)
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("dir", &self.dir).finish()
    }
}

/// File name of a month's journal.
pub fn month_file_name(year: i32, month: u32) -> String {
    format!("transactions-{:04}-{:02}.jsonl", year, month)
}

/// Parse a journal file, skipping malformed lines.
pub fn read_journal(path: &Path) -> Result<Vec<Transaction>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = read_bytes_limited(path)?;
    Ok(journal_lines(&bytes).filter_map(Transaction::parse_line).collect())
}

/// Non-empty lines of a journal file.
///
/// A line that is not valid UTF-8, such as a write cut off inside a
/// multibyte character, is skipped on its own.
pub fn journal_lines(bytes: &[u8]) -> impl Iterator<Item = &str> {
    bytes
        .split(|b| *b == b'\n')
        .filter_map(|raw| match std::str::from_utf8(raw) {
            Ok(line) => Some(line.trim()),
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable journal line");
                None
            }
        })
        .filter(|line| !line.is_empty())
}
