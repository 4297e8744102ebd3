//! Command handlers
//!
//! The user-facing sync command and the prompting it relies on.

pub mod prompt;
pub mod sync;

pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use sync::{run_sync, RunMode, SyncOptions, SyncOutcome};
