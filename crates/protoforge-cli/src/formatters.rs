//! Output formatters for CLI commands.
//!
//! Every command reports a serializable summary. JSON mode prints it as-is;
//! text and pretty modes print one `key: value` line per scalar with nested
//! lists indented below their key, pretty mode adding colors.

use anyhow::Result;
use colored::Colorize;
use protoforge_core::cli::OutputFormat;
use serde::Serialize;
use serde_json::Value;

/// Format data according to the specified output format.
///
/// # Errors
///
/// Returns an error if the data cannot be serialized.
///
/// # Examples
///
/// ```
/// use protoforge_cli::formatters::format_output;
/// use protoforge_core::cli::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Summary {
///     mode: String,
///     files: Vec<String>,
/// }
///
/// let summary = Summary {
///     mode: "pro".to_string(),
///     files: vec!["models/User_gen.go".to_string()],
/// };
///
/// let output = format_output(&summary, OutputFormat::Text)?;
/// assert_eq!(output, "mode: pro\nfiles:\n  - models/User_gen.go");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Text => Ok(render(&serde_json::to_value(data)?, false)),
        OutputFormat::Pretty => Ok(render(&serde_json::to_value(data)?, true)),
    }
}

fn render(value: &Value, color: bool) -> String {
    let mut lines = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                render_entry(key, value, 0, color, &mut lines);
            }
        }
        other => lines.push(scalar(other, color)),
    }
    lines.join("\n")
}

fn render_entry(key: &str, value: &Value, indent: usize, color: bool, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    let key = if color {
        key.blue().bold().to_string()
    } else {
        key.to_string()
    };
    match value {
        Value::Array(items) if items.is_empty() => lines.push(format!("{pad}{key}: []")),
        Value::Array(items) => {
            lines.push(format!("{pad}{key}:"));
            for item in items {
                render_item(item, indent + 1, color, lines);
            }
        }
        Value::Object(map) => {
            lines.push(format!("{pad}{key}:"));
            for (key, value) in map {
                render_entry(key, value, indent + 1, color, lines);
            }
        }
        scalar_value => lines.push(format!("{pad}{key}: {}", scalar(scalar_value, color))),
    }
}

fn render_item(item: &Value, indent: usize, color: bool, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    match item {
        Value::Object(map) => {
            let mut entries = Vec::new();
            for (key, value) in map {
                render_entry(key, value, indent + 1, color, &mut entries);
            }
            // first field shares the bullet line
            if let Some(first) = entries.first_mut() {
                let trimmed = first.trim_start().to_string();
                *first = format!("{pad}- {trimmed}");
            }
            lines.extend(entries);
        }
        other => lines.push(format!("{pad}- {}", scalar(other, color))),
    }
}

fn scalar(value: &Value, color: bool) -> String {
    let plain = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if !color {
        return plain;
    }
    match value {
        Value::Null => plain.dimmed().to_string(),
        Value::Bool(_) => plain.yellow().to_string(),
        Value::Number(_) => plain.cyan().to_string(),
        _ => plain.green().to_string(),
    }
}
