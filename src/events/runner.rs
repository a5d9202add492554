//! Event loop for the NDJSON protocol.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::Receiver;

use crate::error::{DopamineError, Result};
use crate::events::input::{parse_event, EditorEvent};
use crate::events::output::EventOutput;
use crate::random::RandomSource;
use crate::session::RewardLoop;
use crate::storage::BalanceStore;
use crate::tracking::DiagnosticsTable;

/// Reads editor events line by line and writes one or more result lines
/// for each.
pub struct EventRunner<S: BalanceStore, R: RandomSource> {
    rewards: RewardLoop<S, R>,
    diagnostics: DiagnosticsTable,
    balance_changes: Receiver<u64>,
}

impl<S: BalanceStore, R: RandomSource> EventRunner<S, R> {
    pub fn new(mut rewards: RewardLoop<S, R>) -> Self {
        let balance_changes = rewards.wallet_mut().subscribe();
        Self {
            rewards,
            diagnostics: DiagnosticsTable::new(),
            balance_changes,
        }
    }

    /// The underlying save loop.
    pub fn rewards(&self) -> &RewardLoop<S, R> {
        &self.rewards
    }

    /// Process events until `input` is exhausted.
    ///
    /// Malformed lines produce an `error` line and the loop continues.
    /// Returns the number of events handled.
    pub fn run<I: BufRead, W: Write>(&mut self, mut input: I, mut output: W) -> Result<usize> {
        let mut handled = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .map_err(|e| DopamineError::storage("stdin", e))?;
            if read == 0 {
                break;
            }

            let outputs = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => match parse_event(line.trim()) {
                    Ok(event) => {
                        handled += 1;
                        self.handle(event)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed event");
                        vec![EventOutput::error(e.to_string())]
                    }
                },
                Err(e) => {
                    let err = DopamineError::input(format!("event line is not UTF-8: {}", e));
                    tracing::warn!(error = %err, "skipping malformed event");
                    vec![EventOutput::error(err.to_string())]
                }
            };

            write_lines(&mut output, &outputs).map_err(|e| DopamineError::storage("stdout", e))?;
        }

        tracing::debug!(handled, "event input closed");
        Ok(handled)
    }

    /// Handle one event and collect its output lines.
    pub fn handle(&mut self, event: EditorEvent) -> Vec<EventOutput> {
        let mut outputs = match self.dispatch(event) {
            Ok(outputs) => outputs,
            Err(e) => {
                tracing::warn!(error = %e, "event failed");
                vec![EventOutput::error(e.to_string())]
            }
        };

        for balance in self.balance_changes.try_iter() {
            outputs.push(EventOutput::Balance { balance });
        }
        outputs
    }

    fn dispatch(&mut self, event: EditorEvent) -> Result<Vec<EventOutput>> {
        match event {
            EditorEvent::Edit { doc, hunks } => {
                self.rewards.on_edit(&doc, &hunks);
                Ok(Vec::new())
            }
            EditorEvent::Diagnostics { doc, errors } => {
                self.diagnostics.set(doc, errors);
                Ok(Vec::new())
            }
            EditorEvent::Save { doc, path } => {
                let outcome = self
                    .rewards
                    .on_save(&doc, path.as_deref(), &self.diagnostics)?;
                Ok(vec![EventOutput::from_save(&doc, outcome)])
            }
            EditorEvent::Close { doc } => {
                self.rewards.on_close(&doc);
                self.diagnostics.remove(&doc);
                Ok(Vec::new())
            }
            EditorEvent::Balance => {
                let balance = self.rewards.wallet_mut().balance()?;
                // A reset triggered by this query is already in `balance`
                self.balance_changes.try_iter().for_each(drop);
                Ok(vec![EventOutput::Balance { balance }])
            }
            EditorEvent::Respin { cost } => {
                let outcome = self.rewards.respin(cost)?;
                Ok(vec![EventOutput::Respin { outcome }])
            }
        }
    }
}

impl<S: BalanceStore, R: RandomSource> std::fmt::Debug for EventRunner<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRunner")
            .field("rewards", &self.rewards)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// Write each output as one JSON line and flush.
pub fn write_lines<W: Write>(output: &mut W, lines: &[EventOutput]) -> io::Result<()> {
    for line in lines {
        writeln!(output, "{}", line.to_line())?;
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::ledger::Ledger;
    use crate::random::testing::ScriptedRandom;
    use crate::storage::MemoryBalanceStore;
    use crate::wallet::Wallet;
    use chrono::{Local, TimeZone, Utc};
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn runner(draws: &[f64]) -> (TempDir, EventRunner<MemoryBalanceStore, ScriptedRandom>) {
        let dir = TempDir::new().unwrap();
        let start = Local
            .with_ymd_and_hms(2025, 4, 2, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let clock = Arc::new(ManualClock::new(start));
        let ledger = Ledger::open(dir.path().join("ledger"), clock.clone());
        let wallet = Wallet::open(MemoryBalanceStore::new(), ledger, clock.clone()).unwrap();
        let rewards = RewardLoop::new(Config::default(), wallet, clock, ScriptedRandom::new(draws));
        (dir, EventRunner::new(rewards))
    }

    fn run_lines(runner: &mut EventRunner<MemoryBalanceStore, ScriptedRandom>, input: &str) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        runner.run(Cursor::new(input.as_bytes()), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_edit_then_save_rewards() {
        let (_dir, mut runner) = runner(&[0.99]);
        let input = concat!(
            r#"{"event":"edit","doc":"a.rs","hunks":[{"text":"fn main() { println!(\"hello world\"); }"}]}"#,
            "\n",
            r#"{"event":"save","doc":"a.rs","path":"/p/a.rs"}"#,
            "\n",
        );

        let lines = run_lines(&mut runner, input);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "reward");
        assert_eq!(lines[0]["doc"], "a.rs");
        assert_eq!(lines[0]["jackpot"], false);
        let coins = lines[0]["coins"].as_u64().unwrap();
        assert_eq!(lines[1]["kind"], "balance");
        assert_eq!(lines[1]["balance"].as_u64().unwrap(), coins);
    }

    #[test]
    fn test_malformed_line_reports_and_continues() {
        let (_dir, mut runner) = runner(&[]);
        let input = "{not json}\n\n{\"event\":\"balance\"}\n";

        let lines = run_lines(&mut runner, input);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "error");
        assert_eq!(lines[1], serde_json::json!({"kind": "balance", "balance": 0}));
    }

    #[test]
    fn test_non_utf8_line_reports_and_continues() {
        let (_dir, mut runner) = runner(&[]);
        let mut input = b"{\"event\":\"balance\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(b"{\"event\":\"balance\"}");

        let mut out = Vec::new();
        let handled = runner.run(Cursor::new(input), &mut out).unwrap();

        assert_eq!(handled, 2);
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["kind"], "balance");
        assert_eq!(lines[1]["kind"], "error");
        assert!(lines[1]["message"].as_str().unwrap().contains("UTF-8"));
        assert_eq!(lines[2]["kind"], "balance");
    }

    #[test]
    fn test_minor_and_ignored_saves() {
        let (_dir, mut runner) = runner(&[]);
        let input = concat!(
            r#"{"event":"edit","doc":"a.rs","hunks":[{"text":"x = 1"}]}"#,
            "\n",
            r#"{"event":"save","doc":"pkg","path":"/p/package.json"}"#,
            "\n",
            r#"{"event":"save","doc":"a.rs"}"#,
            "\n",
        );

        let lines = run_lines(&mut runner, input);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], serde_json::json!({"kind": "ignored", "doc": "pkg"}));
        assert_eq!(lines[1]["kind"], "minor");
        assert_eq!(lines[1]["chars_added"], 3);
    }

    #[test]
    fn test_diagnostics_and_close() {
        let (_dir, mut runner) = runner(&[]);
        runner.handle(EditorEvent::Diagnostics {
            doc: "a.rs".to_string(),
            errors: 2,
        });
        runner.handle(EditorEvent::Edit {
            doc: "a.rs".to_string(),
            hunks: vec![crate::tracking::EditHunk::insert("abc")],
        });

        let outputs = runner.handle(EditorEvent::Close {
            doc: "a.rs".to_string(),
        });

        assert!(outputs.is_empty());
        assert!(runner.rewards().classifier().peek("a.rs").is_empty());
    }

    #[test]
    fn test_respin_without_funds() {
        let (_dir, mut runner) = runner(&[]);
        let lines = run_lines(&mut runner, "{\"event\":\"respin\"}\n");
        assert_eq!(
            lines,
            vec![serde_json::json!({
                "kind": "respin",
                "status": "insufficient_funds",
                "balance": 0,
                "cost": 1
            })]
        );
    }
}
