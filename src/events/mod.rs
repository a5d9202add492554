//! NDJSON event protocol between an editor integration and Dopamine.
//!
//! The integration writes one JSON event per line to `dopamine run`'s stdin
//! and reads one JSON result per line from its stdout.

pub mod input;
pub mod output;
pub mod runner;

pub use input::{parse_event, EditorEvent};
pub use output::EventOutput;
pub use runner::EventRunner;
