//! Post-processing of generated Go files.

use crate::go_file::GoFile;
use protoforge_core::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of normalizing a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Files rewritten because their canonical form differed
    pub changed: Vec<PathBuf>,
    /// Files already in canonical form
    pub unchanged: Vec<PathBuf>,
    /// Paths skipped because they are missing or not `.go` files
    pub skipped: Vec<PathBuf>,
}

/// Normalizes each Go file in `paths`.
///
/// Per file: ensure `header` is present exactly once, prune unused imports,
/// re-render canonically, and write only when the text changed. Running it
/// twice leaves every file untouched the second time.
///
/// # Errors
///
/// Returns [`Error::SourceParse`] for the first file with a syntax error and
/// [`Error::Io`] if a file cannot be read or written. Files processed before
/// the failure keep their new content.
///
/// # Examples
///
/// ```
/// use protoforge_files::normalize_files;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("user_gen.go");
/// std::fs::write(&path, "package models\nimport \"fmt\"\ntype User struct{}\n").unwrap();
///
/// let report = normalize_files(&[path.clone()], "// Code generated. DO NOT EDIT.").unwrap();
/// assert_eq!(report.changed, vec![path.clone()]);
/// assert_eq!(
///     std::fs::read_to_string(&path).unwrap(),
///     "// Code generated. DO NOT EDIT.\n\npackage models\n\ntype User struct{}\n"
/// );
///
/// let again = normalize_files(&[path.clone()], "// Code generated. DO NOT EDIT.").unwrap();
/// assert_eq!(again.unchanged, vec![path]);
/// ```
pub fn normalize_files(paths: &[PathBuf], header: &str) -> Result<NormalizeReport> {
    let mut report = NormalizeReport::default();
    for path in paths {
        if !path.is_file() {
            tracing::warn!("Skipping {}: file does not exist", path.display());
            report.skipped.push(path.clone());
            continue;
        }
        if path.extension().is_none_or(|ext| ext != "go") {
            tracing::warn!("Skipping {}: not a Go source file", path.display());
            report.skipped.push(path.clone());
            continue;
        }
        if normalize_file(path, header)? {
            report.changed.push(path.clone());
        } else {
            report.unchanged.push(path.clone());
        }
    }
    Ok(report)
}

/// Normalizes one file. Returns `true` if it was rewritten.
///
/// # Errors
///
/// See [`normalize_files`].
pub fn normalize_file(path: &Path, header: &str) -> Result<bool> {
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut file = GoFile::parse(path, &source)?;
    file.ensure_header(header);
    file.prune_imports();
    write_if_changed(path, &source, &file.render())
}

/// Writes `content` to `path` unless it equals `current`.
///
/// The write goes to a sibling temporary file which is then renamed over
/// `path`, so readers never observe a partial file.
pub(crate) fn write_if_changed(path: &Path, current: &str, content: &str) -> Result<bool> {
    if current == content {
        tracing::debug!("{} is already canonical", path.display());
        return Ok(false);
    }
    let temp_path = path.with_extension("go.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp_path, e))?;
    file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    tracing::info!("Formatted {}", path.display());
    Ok(true)
}
