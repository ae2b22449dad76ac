//! Error types for protoforge.
//!
//! Every fatal condition of the generation pipeline maps to one variant here.
//! Non-fatal conditions (unresolved type names, an already registered router
//! call, a missing table) never surface as errors; they are logged and the
//! pipeline degrades instead.
//!
//! # Examples
//!
//! ```
//! use protoforge_core::{Error, Result};
//!
//! fn require_template(name: &str, known: &[&str]) -> Result<()> {
//!     if !known.contains(&name) {
//!         return Err(Error::TemplateNotFound {
//!             name: name.to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_template("model", &["service"]).unwrap_err();
//! assert!(err.is_template_error());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for protoforge.
///
/// All library crates return this type so the CLI can report failures
/// uniformly.
#[derive(Error, Debug)]
pub enum Error {
    /// An IDL file could not be parsed.
    #[error("failed to parse {path}: {message}")]
    IdlParse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser diagnostic, including line information
        message: String,
    },

    /// Two or more IDL files import each other.
    ///
    /// The chain lists every file on the cycle, starting and ending with the
    /// same path.
    #[error("circular import detected: {}", format_chain(.chain))]
    CircularImport {
        /// Files participating in the cycle
        chain: Vec<PathBuf>,
    },

    /// A named template is not part of the loaded template set.
    #[error("template '{name}' is not defined")]
    TemplateNotFound {
        /// Name of the missing template
        name: String,
    },

    /// Template registration or rendering failed.
    #[error("template '{name}' failed: {message}")]
    Template {
        /// Template being registered or rendered
        name: String,
        /// Engine diagnostic
        message: String,
    },

    /// A previously generated host-language file could not be parsed.
    #[error("failed to parse source file {path}: {message}")]
    SourceParse {
        /// File that failed to parse
        path: PathBuf,
        /// Description of the syntax problem
        message: String,
    },

    /// File-system operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    ///
    /// Raised when `protoforge.toml` is unreadable or contains invalid
    /// values.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Invalid argument error.
    ///
    /// Raised when CLI arguments or function parameters are invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Error {
    /// Creates an [`Error::Io`] for the given path.
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_core::Error;
    ///
    /// let err = Error::io("out/models/user_gen.go", std::io::Error::other("disk full"));
    /// assert!(err.is_io_error());
    /// ```
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this is an IDL or host-source parse error.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(self, Self::IdlParse { .. } | Self::SourceParse { .. })
    }

    /// Returns `true` if this is a circular import error.
    #[must_use]
    pub const fn is_circular_import(&self) -> bool {
        matches!(self, Self::CircularImport { .. })
    }

    /// Returns `true` if a template was missing or failed to render.
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_core::Error;
    ///
    /// let err = Error::Template {
    ///     name: "model".to_string(),
    ///     message: "unclosed block".to_string(),
    /// };
    /// assert!(err.is_template_error());
    /// ```
    #[must_use]
    pub const fn is_template_error(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. } | Self::Template { .. })
    }

    /// Returns `true` if this is a file-system error.
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }
}

/// Result type alias for protoforge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_detection() {
        let err = Error::IdlParse {
            path: PathBuf::from("proto/user.proto"),
            message: "line 3: expected ';'".to_string(),
        };
        assert!(err.is_parse_error());
        assert!(!err.is_template_error());

        let err = Error::SourceParse {
            path: PathBuf::from("models/user_gen.go"),
            message: "syntax error".to_string(),
        };
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_circular_import_display() {
        let err = Error::CircularImport {
            chain: vec![
                PathBuf::from("a.proto"),
                PathBuf::from("b.proto"),
                PathBuf::from("a.proto"),
            ],
        };
        assert!(err.is_circular_import());
        assert_eq!(
            err.to_string(),
            "circular import detected: a.proto -> b.proto -> a.proto"
        );
    }

    #[test]
    fn test_template_error_detection() {
        let err = Error::TemplateNotFound {
            name: "enum".to_string(),
        };
        assert!(err.is_template_error());
        assert!(err.to_string().contains("'enum'"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = Error::io("out", std::io::Error::other("denied"));
        assert!(err.is_io_error());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::ConfigError {
            message: "unknown field".to_string(),
        };
        assert!(err.is_config_error());
        assert!(err.to_string().contains("Configuration error"));
    }
}
