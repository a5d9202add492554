//! Calendar aggregation over journal records.
//!
//! Aggregates are derived on demand and never written back.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ledger::{Transaction, TransactionKind};

/// Coins earned and spent on one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub earned: u64,
    pub spent: u64,
}

impl DailyAggregate {
    /// An empty day.
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            earned: 0,
            spent: 0,
        }
    }

    /// Add one transaction. Resets contribute nothing.
    pub fn apply(&mut self, tx: &Transaction) {
        match tx.kind {
            TransactionKind::Earn => self.earned += tx.amount,
            TransactionKind::Spend => self.spent += tx.amount,
            TransactionKind::Reset => {}
        }
    }

    /// Net change for the day.
    pub fn net(&self) -> i64 {
        self.earned as i64 - self.spent as i64
    }
}

/// Coins earned and spent in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u32,
    pub earned: u64,
    pub spent: u64,
}

impl MonthlyAggregate {
    /// Sum a month's daily entries.
    pub fn from_days(year: i32, month: u32, days: &[DailyAggregate]) -> Self {
        Self {
            year,
            month,
            earned: days.iter().map(|d| d.earned).sum(),
            spent: days.iter().map(|d| d.spent).sum(),
        }
    }
}

/// Number of days in a month, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Every date of a month in order; empty for an invalid month.
pub fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    match days_in_month(year, month) {
        Some(days) => (1..=days)
            .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
            .collect(),
        None => Vec::new(),
    }
}

/// The `days` dates ending at `today`, oldest first.
pub fn trailing_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days as i64)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

/// The (year, month) before the given one.
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Distinct (year, month) pairs covered by `dates`, in order.
pub fn months_spanned(dates: &[NaiveDate]) -> Vec<(i32, u32)> {
    let mut months: Vec<(i32, u32)> = dates.iter().map(|d| (d.year(), d.month())).collect();
    months.dedup();
    months
}

/// Bucket transactions by local date into one entry per requested date.
///
/// Dates with no activity get a zero entry; transactions outside the
/// requested dates are ignored.
pub fn bucket_by_day<'a, I>(dates: &[NaiveDate], transactions: I) -> Vec<DailyAggregate>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut buckets: BTreeMap<NaiveDate, DailyAggregate> = dates
        .iter()
        .map(|date| (*date, DailyAggregate::zero(*date)))
        .collect();

    for tx in transactions {
        if let Some(day) = buckets.get_mut(&tx.local_date()) {
            day.apply(tx);
        }
    }

    dates
        .iter()
        .filter_map(|date| buckets.get(date).copied())
        .collect()
}
