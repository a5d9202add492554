//! Calendar command for Dopamine.
//!
//! Two views of the journal:
//! - a month grid with per-day totals (`--month`, defaulting to this month)
//! - a year summary with per-month totals (`--year` alone)

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::ledger::aggregate::days_in_month;
use crate::ledger::{DailyAggregate, Ledger, MonthlyAggregate};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Options for the calendar command.
#[derive(Debug, Clone, Default)]
pub struct CalendarOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Year to show (default: this year).
    pub year: Option<i32>,
    /// Month to show, 1-12. With only `year` set, the year summary is shown.
    pub month: Option<u32>,
}

/// Output format for the calendar command.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarOutput {
    pub success: bool,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    /// Per-day totals for a month view.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<DailyAggregate>,
    /// Per-month totals for a year view.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub months: Vec<MonthlyAggregate>,
    pub earned: u64,
    pub spent: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalendarOutput {
    fn month_view(year: i32, month: u32, days: Vec<DailyAggregate>) -> Self {
        let total = MonthlyAggregate::from_days(year, month, &days);
        Self {
            success: true,
            year,
            month: Some(month),
            days,
            months: Vec::new(),
            earned: total.earned,
            spent: total.spent,
            error: None,
        }
    }

    fn year_view(year: i32, months: Vec<MonthlyAggregate>) -> Self {
        Self {
            success: true,
            year,
            month: None,
            days: Vec::new(),
            earned: months.iter().map(|m| m.earned).sum(),
            spent: months.iter().map(|m| m.spent).sum(),
            months,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(year: i32, month: Option<u32>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            year,
            month,
            days: Vec::new(),
            months: Vec::new(),
            earned: 0,
            spent: 0,
            error: Some(error.into()),
        }
    }
}

/// The calendar command implementation.
pub struct CalendarCommand {
    ledger: Ledger,
}

impl CalendarCommand {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Run the calendar command.
    pub fn run(&self, options: &CalendarOptions) -> CalendarOutput {
        let today = self.ledger.today();
        let year = options.year.unwrap_or_else(|| today.year());

        let month = match (options.year, options.month) {
            (Some(_), None) => {
                return CalendarOutput::year_view(year, self.ledger.yearly_summary(year));
            }
            (_, Some(month)) => month,
            (None, None) => today.month(),
        };

        if days_in_month(year, month).is_none() {
            return CalendarOutput::failure(year, Some(month), format!("invalid month: {}", month));
        }

        CalendarOutput::month_view(year, month, self.ledger.monthly_aggregate(year, month))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CalendarOutput, options: &CalendarOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Calendar failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        match output.month {
            Some(month) => format_month(output.year, month, &output.days, output.earned, output.spent),
            None => format_year(output.year, &output.months, output.earned, output.spent),
        }
    }
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

/// A Monday-first grid; each cell shows the day's earnings or `.` when idle.
fn format_month(year: i32, month: u32, days: &[DailyAggregate], earned: u64, spent: u64) -> String {
    let mut text = format!("{} {}\n", month_name(month), year);
    text.push_str("  Mo    Tu    We    Th    Fr    Sa    Su\n");

    let offset = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.weekday().num_days_from_monday() as usize)
        .unwrap_or(0);

    let mut row = " ".repeat(offset * 6);
    for day in days {
        let cell = if day.earned > 0 {
            format!("{:>2}:{:<3}", day.date.day(), day.earned)
        } else {
            format!("{:>2}:.  ", day.date.day())
        };
        row.push_str(&cell);
        if day.date.weekday() == Weekday::Sun {
            text.push_str(row.trim_end());
            text.push('\n');
            row.clear();
        }
    }
    if !row.trim().is_empty() {
        text.push_str(row.trim_end());
        text.push('\n');
    }

    text.push_str(&format!("\nEarned {}  Spent {}\n", earned, spent));
    text
}

fn format_year(year: i32, months: &[MonthlyAggregate], earned: u64, spent: u64) -> String {
    let mut text = format!("{}\n", year);
    for m in months {
        text.push_str(&format!(
            "  {:<9}  earned {:>6}  spent {:>6}\n",
            month_name(m.month),
            m.earned,
            m.spent
        ));
    }
    text.push_str(&format!("\nEarned {}  Spent {}\n", earned, spent));
    text
}
