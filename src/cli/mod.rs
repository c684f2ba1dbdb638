//! Line-oriented shell over the ledger state. Parsing and rendering only; every
//! change goes through [`BudgetState::apply`](crate::ledger::BudgetState::apply).

pub mod commands;
pub mod output;
pub mod shell;

use thiserror::Error;

use crate::errors::LedgerError;

pub use commands::{LoopControl, ShellContext};
pub use shell::run_cli;

pub const SCRIPT_ENV_VAR: &str = "CASHFLOW_CLI_SCRIPT";

/// User-facing CLI error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}
