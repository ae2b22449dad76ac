//! CLI-specific types and utilities.
//!
//! Strong types for CLI concepts so the command layer never passes raw
//! strings or integers around for domain choices.
//!
//! # Examples
//!
//! ```
//! use protoforge_core::cli::{ExitCode, GenerationMode, OutputFormat};
//!
//! let format = OutputFormat::Pretty;
//! assert_eq!(format.as_str(), "pretty");
//!
//! let code = ExitCode::SUCCESS;
//! assert_eq!(code.as_i32(), 0);
//!
//! let mode: GenerationMode = "sdk".parse().unwrap();
//! assert_eq!(mode, GenerationMode::Sdk);
//! ```

use std::fmt;
use std::str::FromStr;

/// CLI output format.
///
/// Determines how command summaries are formatted for user display.
///
/// # Examples
///
/// ```
/// use protoforge_core::cli::OutputFormat;
///
/// let format: OutputFormat = "json".parse().unwrap();
/// assert_eq!(format, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// JSON output for machine parsing
    Json,
    /// Plain text output for scripts
    Text,
    /// Pretty-printed output with colors for human reading
    #[default]
    Pretty,
}

impl OutputFormat {
    /// Returns the string representation of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Pretty => "pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => Err(crate::Error::InvalidArgument(format!(
                "invalid output format: '{s}' (expected: json, text, or pretty)"
            ))),
        }
    }
}

/// Generation target.
///
/// `Host` emits Go sources that are post-processed and registered with the
/// router; `Sdk` emits TypeScript client modules with relative imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenerationMode {
    /// Host-language (Go) generation
    #[default]
    Host,
    /// Client SDK (TypeScript) generation
    Sdk,
}

impl GenerationMode {
    /// Returns the string representation of the mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_core::cli::GenerationMode;
    ///
    /// assert_eq!(GenerationMode::Host.as_str(), "pro");
    /// assert_eq!(GenerationMode::Sdk.as_str(), "sdk");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "pro",
            Self::Sdk => "sdk",
        }
    }

    /// Returns `true` for SDK generation.
    #[must_use]
    pub const fn is_sdk(&self) -> bool {
        matches!(self, Self::Sdk)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pro" | "host" | "go" => Ok(Self::Host),
            "sdk" | "ts" => Ok(Self::Sdk),
            _ => Err(crate::Error::InvalidArgument(format!(
                "invalid generation mode: '{s}' (expected: pro or sdk)"
            ))),
        }
    }
}

/// CLI exit code with semantic meaning.
///
/// Success is 0, errors are non-zero with specific meanings.
///
/// # Examples
///
/// ```
/// use protoforge_core::cli::ExitCode;
///
/// let code = ExitCode::SUCCESS;
/// assert!(code.is_success());
///
/// let code = ExitCode::from_i32(1);
/// assert!(!code.is_success());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Successful execution (exit code 0).
    pub const SUCCESS: Self = Self(0);

    /// General error (exit code 1).
    pub const ERROR: Self = Self(1);

    /// Invalid input or arguments (exit code 2).
    pub const INVALID_INPUT: Self = Self(2);

    /// Creates an exit code from an integer value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    /// Returns the exit code as an integer.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Checks if the exit code represents success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
