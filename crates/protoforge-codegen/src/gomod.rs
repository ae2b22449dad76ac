//! Go module discovery.

use crate::naming::join_path;
use protoforge_core::{Error, Result};
use std::path::{Path, PathBuf};

/// The Go module enclosing a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    /// Module path from the `module` line
    pub name: String,
    /// Directory holding `go.mod`
    pub root: PathBuf,
}

impl GoModule {
    /// Finds the nearest `go.mod` at or above `start`.
    ///
    /// Returns `Ok(None)` if no ancestor holds one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `go.mod` exists but cannot be read, and
    /// [`Error::ConfigError`] if it has no `module` line.
    pub fn discover(start: &Path) -> Result<Option<Self>> {
        let start = std::path::absolute(start).map_err(|e| Error::io(start, e))?;
        for dir in start.ancestors() {
            let go_mod = dir.join("go.mod");
            if !go_mod.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&go_mod).map_err(|e| Error::io(&go_mod, e))?;
            let name = module_name(&text).ok_or_else(|| Error::ConfigError {
                message: format!("{} has no module directive", go_mod.display()),
            })?;
            return Ok(Some(Self {
                name: name.to_string(),
                root: dir.to_path_buf(),
            }));
        }
        Ok(None)
    }

    /// Import path of `dir`, which must lie inside the module.
    ///
    /// Directories outside the module map to the module path itself.
    #[must_use]
    pub fn import_path_of(&self, dir: &Path) -> String {
        let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        let relative = absolute
            .strip_prefix(&self.root)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        join_path(&[&self.name, &relative])
    }
}

fn module_name(go_mod: &str) -> Option<&str> {
    go_mod.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        (parts.next() == Some("module"))
            .then(|| parts.next())
            .flatten()
            .map(|name| name.trim_matches('"'))
    })
}
