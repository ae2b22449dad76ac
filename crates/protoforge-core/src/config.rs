//! Generator configuration.
//!
//! Settings are read from `protoforge.toml` (or a file passed with
//! `--config`). Every key is optional; missing keys fall back to defaults
//! that match the goal-web project layout.
//!
//! # Examples
//!
//! ```
//! use protoforge_core::GeneratorConfig;
//!
//! let config = GeneratorConfig::from_toml_str(
//!     r#"
//!     header = "// Code generated by make. DO NOT EDIT."
//!
//!     [router]
//!     function = "RegisterRoutes"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.router.function, "RegisterRoutes");
//! assert_eq!(config.host_extension, "go");
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "protoforge.toml";

/// Top-level generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Provenance header written once at the top of every host file.
    ///
    /// Default: `// Code generated by protoforge. DO NOT EDIT.`
    pub header: String,

    /// Extension of host-language outputs, without the dot.
    ///
    /// Default: `go`
    pub host_extension: String,

    /// Extension of SDK outputs, without the dot.
    ///
    /// Default: `ts`
    pub sdk_extension: String,

    /// Package path segment appended to the base package for controller
    /// response helpers.
    ///
    /// Default: `response`
    pub response_package: String,

    /// Explicit base package for generated imports.
    ///
    /// When unset, the base package is derived from the nearest `go.mod`
    /// and the output directory.
    pub base_package: Option<String>,

    /// Router registration settings.
    pub router: RouterConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            header: "// Code generated by protoforge. DO NOT EDIT.".to_string(),
            host_extension: "go".to_string(),
            sdk_extension: "ts".to_string(),
            response_package: "response".to_string(),
            base_package: None,
            router: RouterConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the text is not valid TOML, contains
    /// unknown keys, or fails [`GeneratorConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::ConfigError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::ConfigError`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::ConfigError { message } => Error::ConfigError {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }

    /// Loads `protoforge.toml` from `dir` if it exists, otherwise returns the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Same as [`GeneratorConfig::load`] when the file exists.
    pub fn load_or_default(dir: impl AsRef<Path>) -> Result<Self> {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!("Loading configuration from {}", candidate.display());
            Self::load(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if:
    /// - An extension is empty or starts with a dot
    /// - The router registration file is not a relative path
    /// - The registration function name is not a valid identifier
    /// - A header line is not a Go comment
    pub fn validate(&self) -> Result<()> {
        for (key, ext) in [
            ("host_extension", &self.host_extension),
            ("sdk_extension", &self.sdk_extension),
        ] {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(Error::ConfigError {
                    message: format!("{key} must be a bare extension such as 'go', got '{ext}'"),
                });
            }
        }

        if self.router.registration_file.is_absolute()
            || self.router.registration_file.as_os_str().is_empty()
        {
            return Err(Error::ConfigError {
                message: "router.registration_file must be relative to the output directory"
                    .to_string(),
            });
        }

        let valid_ident = self
            .router
            .function
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
        if self.router.function.is_empty() || !valid_ident {
            return Err(Error::ConfigError {
                message: format!(
                    "router.function '{}' is not a valid identifier",
                    self.router.function
                ),
            });
        }

        let header = self.header.trim();
        let block = header.starts_with("/*") && header.ends_with("*/");
        if !block
            && let Some(line) = header
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty() && !l.starts_with("//"))
        {
            return Err(Error::ConfigError {
                message: format!("header line '{line}' must be a '//' comment"),
            });
        }

        Ok(())
    }
}

/// Settings for the central route registration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Registration file, relative to the output directory.
    ///
    /// Default: `controllers/kernel.go`
    pub registration_file: PathBuf,

    /// Function whose body receives the registration calls.
    ///
    /// Default: `Register`
    pub function: String,

    /// Import path providing the router type.
    ///
    /// Default: `github.com/goal-web/contracts`
    pub router_import: String,

    /// Qualified parameter type of the registration function.
    ///
    /// Default: `contracts.HttpRouter`
    pub router_type: String,

    /// Name of the router parameter passed to each call.
    ///
    /// Default: `router`
    pub router_param: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            registration_file: PathBuf::from("controllers/kernel.go"),
            function: "Register".to_string(),
            router_import: "github.com/goal-web/contracts".to_string(),
            router_type: "contracts.HttpRouter".to_string(),
            router_param: "router".to_string(),
        }
    }
}

impl RouterConfig {
    /// Returns the package name of the registration file (its parent
    /// directory name).
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_core::RouterConfig;
    ///
    /// assert_eq!(RouterConfig::default().package_name(), "controllers");
    /// ```
    #[must_use]
    pub fn package_name(&self) -> String {
        self.registration_file
            .parent()
            .and_then(Path::file_name)
            .map_or_else(|| "main".to_string(), |n| n.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sdk_extension, "ts");
        assert_eq!(
            config.router.registration_file,
            PathBuf::from("controllers/kernel.go")
        );
        assert_eq!(config.router.router_type, "contracts.HttpRouter");
        assert!(config.base_package.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str("base_package = \"example.com/app\"").unwrap();
        assert_eq!(config.base_package.as_deref(), Some("example.com/app"));
        assert_eq!(config.router, RouterConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = GeneratorConfig::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GeneratorConfig::from_toml_str("host_extension = \".go\"").unwrap_err();
        assert!(err.is_config_error());

        let err = GeneratorConfig::from_toml_str("[router]\nfunction = \"1bad\"").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_header_must_be_comment() {
        let err = GeneratorConfig::from_toml_str("header = \"generated file\"").unwrap_err();
        assert!(err.is_config_error());

        let err = GeneratorConfig::from_toml_str("header = \"// ok\\nnot ok\"").unwrap_err();
        assert!(err.is_config_error());

        assert!(GeneratorConfig::from_toml_str("header = \"// one\\n// two\"").is_ok());
        assert!(GeneratorConfig::from_toml_str("header = \"/* block\\n   body */\"").is_ok());
        assert!(GeneratorConfig::from_toml_str("header = \"\"").is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let dir = TempDir::new().unwrap();
        let config = GeneratorConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config, GeneratorConfig::default());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[router]\nregistration_file = \"routes/routes.go\"\n",
        )
        .unwrap();
        let config = GeneratorConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.router.package_name(), "routes");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = GeneratorConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(err.is_io_error());
    }
}
