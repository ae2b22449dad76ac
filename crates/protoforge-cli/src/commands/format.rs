//! Format command implementation.

use super::common::{collect_files, load_config};
use anyhow::{Context, Result};
use protoforge_core::cli::{ExitCode, OutputFormat};
use protoforge_files::normalize_files;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of a format run.
#[derive(Debug, Clone, Serialize)]
pub struct FormatSummary {
    /// Files rewritten
    pub changed: Vec<String>,
    /// Files already canonical
    pub unchanged: usize,
    /// Paths that were not Go files
    pub skipped: usize,
}

/// Runs the `format` command and prints its summary.
///
/// # Errors
///
/// Returns an error if a path does not exist or a file cannot be parsed or
/// written.
pub fn run(
    paths: &[PathBuf],
    config: Option<&Path>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let working_dir = std::env::current_dir().context("failed to read current directory")?;
    let summary = format_paths(paths, config, &working_dir)?;
    let formatted = crate::formatters::format_output(&summary, output_format)?;
    println!("{formatted}");
    Ok(ExitCode::SUCCESS)
}

/// Normalizes every Go file under `paths`.
///
/// # Errors
///
/// See [`run`].
pub fn format_paths(
    paths: &[PathBuf],
    config: Option<&Path>,
    working_dir: &Path,
) -> Result<FormatSummary> {
    let config = load_config(config, working_dir)?;
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(collect_files(path, "go")?);
        } else {
            // non-Go files are counted as skipped by the normalizer
            files.push(path.clone());
        }
    }

    let report = normalize_files(&files, &config.header).context("formatting failed")?;
    Ok(FormatSummary {
        changed: report
            .changed
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        unchanged: report.unchanged.len(),
        skipped: report.skipped.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_format_directory() {
        let dir = tempfile::tempdir().unwrap();
        let code = dir.path().join("code");
        fs::create_dir_all(&code).unwrap();
        fs::write(
            code.join("a.go"),
            "package a\n\nimport (\n\t\"fmt\"\n)\n\nfunc A() {}\n",
        )
        .unwrap();
        fs::write(code.join("notes.txt"), "hello").unwrap();

        let summary = format_paths(&[code.clone()], None, dir.path()).unwrap();
        assert_eq!(summary.changed.len(), 1);
        assert_eq!(summary.skipped, 0);

        let content = fs::read_to_string(code.join("a.go")).unwrap();
        assert!(!content.contains("fmt"));
        assert!(content.starts_with("// Code generated by protoforge. DO NOT EDIT."));

        let again = format_paths(&[code], None, dir.path()).unwrap();
        assert!(again.changed.is_empty());
        assert_eq!(again.unchanged, 1);
    }

    #[test]
    fn test_format_skips_non_go_file() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "hello").unwrap();
        let summary = format_paths(&[notes], None, dir.path()).unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(summary.changed.is_empty());
    }
}
