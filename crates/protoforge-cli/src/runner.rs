//! Command execution and runtime logic.
//!
//! Contains the command dispatch and logging initialization.

use anyhow::Result;
use protoforge_core::cli::{ExitCode, OutputFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::commands;

/// Initializes logging infrastructure.
///
/// `--verbose` forces the `debug` level; otherwise `RUST_LOG` applies, with
/// `info` as the fallback. Logs go to stderr so command output on stdout
/// stays machine-readable.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Executes the specified CLI command.
///
/// Routes commands to their respective handlers and returns an exit code.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub fn execute_command(command: Commands, output_format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Gen {
            dir,
            out,
            mode,
            tmpl,
            config,
            base_package,
            no_router,
        } => commands::generate::run(
            &commands::generate::GenerateArgs {
                dir,
                out,
                mode,
                tmpl,
                config,
                base_package,
                no_router,
            },
            output_format,
        ),
        Commands::MakeModel {
            name,
            table,
            path,
            columns,
            force,
        } => commands::make_model::run(
            &commands::make_model::MakeModelArgs {
                name,
                table,
                path,
                columns,
                force,
            },
            output_format,
        ),
        Commands::Format { paths, config } => {
            commands::format::run(&paths, config.as_deref(), output_format)
        }
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd)
        }
    }
}
