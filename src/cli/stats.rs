//! Stats command for Dopamine.
//!
//! Per-day earnings over a trailing window ending today.

use serde::Serialize;

use crate::ledger::{DailyAggregate, Ledger};

/// Default window in days.
pub const DEFAULT_DAYS: u32 = 7;

/// Width of the longest bar in the text chart.
const BAR_WIDTH: u64 = 30;

/// Options for the stats command.
#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Number of days, today included.
    pub days: u32,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            days: DEFAULT_DAYS,
        }
    }
}

/// Output format for the stats command.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    pub success: bool,
    /// One entry per day, oldest first.
    pub days: Vec<DailyAggregate>,
    pub earned: u64,
    pub spent: u64,
    /// Days with any earnings.
    pub active_days: usize,
    /// Highest single-day earnings.
    pub best_day: Option<DailyAggregate>,
}

impl StatsOutput {
    fn from_days(days: Vec<DailyAggregate>) -> Self {
        let best_day = days
            .iter()
            .filter(|d| d.earned > 0)
            .max_by(|a, b| a.earned.cmp(&b.earned).then(b.date.cmp(&a.date)))
            .copied();
        Self {
            success: true,
            earned: days.iter().map(|d| d.earned).sum(),
            spent: days.iter().map(|d| d.spent).sum(),
            active_days: days.iter().filter(|d| d.earned > 0).count(),
            best_day,
            days,
        }
    }
}

/// The stats command implementation.
pub struct StatsCommand {
    ledger: Ledger,
}

impl StatsCommand {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn run(&self, options: &StatsOptions) -> StatsOutput {
        StatsOutput::from_days(self.ledger.daily_stats(options.days))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        let peak = output.days.iter().map(|d| d.earned).max().unwrap_or(0);
        let mut text = String::new();
        for day in &output.days {
            let bar_len = if peak == 0 {
                0
            } else {
                (day.earned * BAR_WIDTH).div_ceil(peak)
            };
            text.push_str(&format!(
                "{}  {:>5}  {}\n",
                day.date.format("%a %m-%d"),
                day.earned,
                "#".repeat(bar_len as usize)
            ));
        }

        text.push_str(&format!(
            "\nEarned {}  Spent {}  Active days {}/{}\n",
            output.earned,
            output.spent,
            output.active_days,
            output.days.len()
        ));
        if let Some(best) = &output.best_day {
            text.push_str(&format!("Best day: {} ({} coins)\n", best.date, best.earned));
        }
        text
    }
}
