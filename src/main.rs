//! Dopamine - coding-activity rewards
//!
//! CLI entry point with global panic handler.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use dopamine::clock::{Clock, SharedClock, SystemClock};
use dopamine::config::{crash_log_path, ledger_dir, Config};
use dopamine::error::exit_codes;
use dopamine::events::runner::write_lines;
use dopamine::events::{EventOutput, EventRunner};
use dopamine::ledger::{Ledger, LedgerWatcher};
use dopamine::random::ThreadRandom;
use dopamine::session::RewardLoop;
use dopamine::storage::FileBalanceStore;
use dopamine::wallet::{stored_balance, Wallet};

// =============================================================================
// CLI Definition
// =============================================================================

/// Dopamine - coins for code you actually wrote
#[derive(Parser)]
#[command(name = "dopamine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// [Editor] Run the event loop (NDJSON on stdin, results on stdout)
    Run {
        /// Do not watch the ledger for writes from other processes
        #[arg(long)]
        no_watch: bool,
    },

    /// [User] Show today's balance
    Balance {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] List recent transactions
    History {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Maximum number of transactions
        #[arg(long, short, default_value_t = dopamine::cli::history::DEFAULT_LIMIT)]
        limit: usize,
    },

    /// [User] Show a month of activity, or a year summary with --year alone
    Calendar {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Year to show
        #[arg(long)]
        year: Option<i32>,
        /// Month to show (1-12)
        #[arg(long)]
        month: Option<u32>,
    },

    /// [User] Show daily earnings over recent days
    Stats {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Number of days, today included
        #[arg(long, short, default_value_t = dopamine::cli::stats::DEFAULT_DAYS)]
        days: u32,
    },

    /// [User] Spend coins from today's balance
    Spend {
        /// Number of coins
        amount: u64,
        /// Reason recorded in the ledger
        #[arg(long, short)]
        reason: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// [User] Spend coins to draw a bonus reward
    Respin {
        /// Coins to spend
        #[arg(long, default_value_t = dopamine::events::input::DEFAULT_RESPIN_COST)]
        cost: u64,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("dopamine error: {}", e);
            ExitCode::from(exit_codes::FAILURE as u8)
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
///
/// Stdout is reserved for command output and the event protocol.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

/// Set up the global panic handler.
///
/// On panic, logs to `<home>/crash.log` and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("dopamine panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(parent) = crash_log.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Run { no_watch } => run_events(no_watch, &cwd),
        Commands::Balance { json, quiet } => run_balance(json, quiet),
        Commands::History { json, quiet, limit } => run_history(json, quiet, limit),
        Commands::Calendar {
            json,
            quiet,
            year,
            month,
        } => run_calendar(json, quiet, year, month),
        Commands::Stats { json, quiet, days } => run_stats(json, quiet, days),
        Commands::Spend {
            amount,
            reason,
            json,
            quiet,
        } => run_spend(amount, reason.as_deref(), json, quiet),
        Commands::Respin { cost, json, quiet } => run_respin(cost, json, quiet, &cwd),
    }
}

// =============================================================================
// Shared Setup
// =============================================================================

fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

fn resolve_ledger_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(ledger_dir().ok_or("could not determine the Dopamine home directory")?)
}

fn open_ledger(clock: SharedClock) -> Result<Ledger, Box<dyn std::error::Error>> {
    Ok(Ledger::open(resolve_ledger_dir()?, clock))
}

fn open_wallet(clock: SharedClock) -> Result<Wallet<FileBalanceStore>, Box<dyn std::error::Error>> {
    let ledger = open_ledger(clock.clone())?;
    let store = FileBalanceStore::new()?;
    Ok(Wallet::open(store, ledger, clock)?)
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::FAILURE as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
        if !formatted.ends_with('\n') {
            println!();
        }
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn run_events(no_watch: bool, cwd: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Config::load_from_cwd(cwd);
    let clock = system_clock();
    let dir = resolve_ledger_dir()?;

    let wallet = open_wallet(clock.clone())?;
    let rewards = RewardLoop::new(config, wallet, clock.clone(), ThreadRandom);
    let mut runner = EventRunner::new(rewards);

    // Held for the life of the loop; dropping it stops the watch.
    let _watcher = if no_watch {
        None
    } else {
        let store = FileBalanceStore::new()?;
        let watch = LedgerWatcher::spawn(&dir, move || match stored_balance(&store, clock.today()) {
            Ok(balance) => {
                let refresh = EventOutput::Refresh { balance };
                let _ = write_lines(&mut io::stdout().lock(), &[refresh]);
            }
            Err(e) => tracing::warn!(error = %e, "failed to reload balance after ledger change"),
        });
        match watch {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "ledger watch unavailable, continuing without it");
                None
            }
        }
    };

    let handled = runner.run(io::stdin().lock(), io::stdout())?;
    tracing::debug!(handled, "event loop finished");

    Ok(ExitCode::from(exit_codes::SUCCESS as u8))
}

fn run_balance(json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use dopamine::cli::balance::{BalanceCommand, BalanceOptions};

    let mut cmd = BalanceCommand::new(open_wallet(system_clock())?);
    let options = BalanceOptions { json, quiet };

    let output = cmd.run();
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_history(json: bool, quiet: bool, limit: usize) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use dopamine::cli::history::{HistoryCommand, HistoryOptions};

    let cmd = HistoryCommand::new(open_ledger(system_clock())?);
    let options = HistoryOptions { json, quiet, limit };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_calendar(
    json: bool,
    quiet: bool,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use dopamine::cli::calendar::{CalendarCommand, CalendarOptions};

    let cmd = CalendarCommand::new(open_ledger(system_clock())?);
    let options = CalendarOptions {
        json,
        quiet,
        year,
        month,
    };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_stats(json: bool, quiet: bool, days: u32) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use dopamine::cli::stats::{StatsCommand, StatsOptions};

    let cmd = StatsCommand::new(open_ledger(system_clock())?);
    let options = StatsOptions { json, quiet, days };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_spend(
    amount: u64,
    reason: Option<&str>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use dopamine::cli::spend::{SpendCommand, SpendOptions};

    let mut cmd = SpendCommand::new(open_wallet(system_clock())?);
    let options = SpendOptions { json, quiet };

    let output = cmd.run(amount, reason);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_respin(
    cost: u64,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use dopamine::cli::respin::{RespinCommand, RespinOptions};

    let config = Config::load_from_cwd(cwd);
    let mut cmd = RespinCommand::new(open_wallet(system_clock())?, config.reward.catalog, ThreadRandom);
    let options = RespinOptions { json, quiet };

    let output = cmd.run(cost);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}
