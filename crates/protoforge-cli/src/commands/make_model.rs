//! Make-model command implementation.
//!
//! Scaffolds a Go model from a JSON table description.

use anyhow::{Context, Result};
use protoforge_codegen::emitter::write_files;
use protoforge_codegen::scaffold::{ColumnInfo, ColumnSource, scaffold_model};
use protoforge_core::cli::{ExitCode, OutputFormat};
use protoforge_core::Error;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Arguments of the `make-model` command.
#[derive(Debug, Clone)]
pub struct MakeModelArgs {
    /// Model name
    pub name: String,
    /// Table name override
    pub table: Option<String>,
    /// Output directory of the model
    pub path: String,
    /// JSON table description
    pub columns: Option<PathBuf>,
    /// Overwrite an existing model file
    pub force: bool,
}

/// Result of a scaffold run.
#[derive(Debug, Clone, Serialize)]
pub struct MakeModelSummary {
    /// Model name
    pub model: String,
    /// File written
    pub file: String,
}

/// Table descriptions read from a JSON file.
///
/// The file holds either an array of column rows, used for any table, or an
/// object mapping table names to such arrays.
#[derive(Debug, Clone, Default)]
pub struct JsonColumns {
    path: Option<PathBuf>,
}

impl JsonColumns {
    /// Reads descriptions from `path`; `None` describes no table.
    #[must_use]
    pub const fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ColumnSource for JsonColumns {
    fn describe(&self, table: &str) -> protoforge_core::Result<Vec<ColumnInfo>> {
        let Some(path) = &self.path else {
            return Err(Error::InvalidArgument("no column description given".to_string()));
        };
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            Error::InvalidArgument(format!("invalid column description {}: {e}", path.display()))
        })?;
        let rows = match value {
            Value::Array(_) => value,
            Value::Object(mut tables) => tables.remove(table).ok_or_else(|| {
                Error::InvalidArgument(format!("table {table} is not described"))
            })?,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "{} must hold an array or an object",
                    path.display()
                )));
            }
        };
        serde_json::from_value(rows)
            .map_err(|e| Error::InvalidArgument(format!("invalid columns of {table}: {e}")))
    }
}

/// Runs the `make-model` command and prints its summary.
///
/// # Errors
///
/// Returns an error if the model cannot be rendered or written.
pub fn run(args: &MakeModelArgs, output_format: OutputFormat) -> Result<ExitCode> {
    let working_dir = std::env::current_dir().context("failed to read current directory")?;
    let Some(summary) = make_model_into(args, &working_dir)? else {
        return Ok(ExitCode::INVALID_INPUT);
    };
    let formatted = crate::formatters::format_output(&summary, output_format)?;
    println!("{formatted}");
    Ok(ExitCode::SUCCESS)
}

/// Scaffolds the model under `root`.
///
/// Returns `None` when the model file exists and `force` is not set.
///
/// # Errors
///
/// See [`run`].
pub fn make_model_into(args: &MakeModelArgs, root: &Path) -> Result<Option<MakeModelSummary>> {
    let source = JsonColumns::new(args.columns.clone());
    let file = scaffold_model(&args.name, args.table.as_deref(), &args.path, &source)
        .with_context(|| format!("failed to scaffold {}", args.name))?;

    if root.join(&file.path).exists() && !args.force {
        warn!("{} already exists; pass --force to overwrite", file.path);
        return Ok(None);
    }
    write_files(root, std::slice::from_ref(&file))?;

    Ok(Some(MakeModelSummary {
        model: args.name.clone(),
        file: file.path,
    }))
}
