//! Helpers shared by several commands.

use anyhow::{Context, Result};
use protoforge_core::GeneratorConfig;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads `--config` if given, else `protoforge.toml` from `working_dir`,
/// else the defaults.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or is invalid.
pub fn load_config(config: Option<&Path>, working_dir: &Path) -> Result<GeneratorConfig> {
    match config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => GeneratorConfig::load_or_default(working_dir)
            .context("failed to load protoforge.toml"),
    }
}

/// Files under `root` with the given extension, sorted by path.
///
/// A `root` that is itself a file is returned as-is.
///
/// # Errors
///
/// Returns an error if `root` does not exist or a directory cannot be
/// read.
pub fn collect_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    anyhow::ensure!(root.is_dir(), "{} does not exist", root.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == extension)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
