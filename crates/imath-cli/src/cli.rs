#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_options;
use crate::error::Result;
use crate::eval::{EvalArgs, run_eval};
use crate::logging::init_logging;
use crate::repl::run_repl;

#[derive(Debug, Parser)]
#[command(
    name = "imath",
    about = "Evaluate LaTeX math with live variables",
    version
)]
pub struct Cli {
    /// JSON file with math options (delimiters, text rendering).
    #[arg(long, global = true, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate every delimited expression in a document.
    Eval(EvalArgs),

    /// Read expressions line by line and show results as they change.
    Repl,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let options = load_options(cli.config.as_deref())?;
    match cli.command {
        Commands::Eval(args) => run_eval(&args, &options, &mut io::stdout().lock()),
        Commands::Repl => run_repl(io::stdin().lock(), &mut io::stdout().lock()),
    }
}
