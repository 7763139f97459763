//! # sms-format command line
//!
//! ```bash
//! sms-format login --token <TOKEN>
//! sms-format preview --file marks.xlsx --type varsity --range 1-30
//! sms-format export --file marks.xlsx --range 20-50
//! sms-format export --file marks.csv --offline
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    // Keep going without file logs rather than refusing to run.
    if let Err(e) = sms_format::logging::init() {
        eprintln!("Logging unavailable: {e:#}");
    }

    let cli = cli::Cli::parse();
    let result = tokio::runtime::Runtime::new()?.block_on(cli::run_command(cli.command));
    if let Err(e) = &result
        && let Some(hint) = cli::error_hint(e)
    {
        eprintln!("{hint}");
    }
    result
}
