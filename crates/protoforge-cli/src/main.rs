//! Protoforge CLI.
//!
//! Command-line interface for generating Go host code and TypeScript SDKs
//! from annotated `.proto` files.
//!
//! # Examples
//!
//! ```bash
//! # Generate Go code for every file under ./pro
//! protoforge gen
//!
//! # Scaffold a model from a table description
//! protoforge make-model User --columns describe.json
//! ```

use anyhow::Result;
use clap::Parser;
use protoforge_cli::cli::Cli;
use protoforge_cli::runner::{execute_command, init_logging};
use protoforge_core::cli::OutputFormat;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Parse output format
    let output_format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    // Execute command and get exit code
    let exit_code = execute_command(cli.command, output_format)?;

    // Exit with appropriate code
    std::process::exit(exit_code.as_i32());
}
