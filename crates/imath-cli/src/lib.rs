#![forbid(unsafe_code)]

//! Command-line host for imath.
//!
//! `imath eval` evaluates every delimited expression in a document;
//! `imath repl` keeps one live session per input line and reports every
//! result that changes.

pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod logging;
pub mod repl;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{CliError, Result};
