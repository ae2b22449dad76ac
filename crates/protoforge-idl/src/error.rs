//! Parser errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or parsing a `.proto` file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Invalid character sequence.
    #[error("line {line}: {message}")]
    Lex {
        /// 1-based line
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// A token did not match the grammar.
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        /// 1-based line
        line: usize,
        /// What the parser was looking for
        expected: String,
        /// What it found instead
        found: String,
    },

    /// Input ended inside a declaration.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What the parser was looking for
        expected: String,
    },

    /// Construct recognised but not supported.
    #[error("line {line}: {what} is not supported")]
    Unsupported {
        /// 1-based line
        line: usize,
        /// The unsupported construct
        what: &'static str,
    },

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Returns the 1-based line of the error, when known.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Lex { line, .. }
            | Self::UnexpectedToken { line, .. }
            | Self::Unsupported { line, .. } => Some(*line),
            Self::UnexpectedEof { .. } | Self::Io { .. } => None,
        }
    }

    /// Returns `true` if the error came from reading the file.
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;
