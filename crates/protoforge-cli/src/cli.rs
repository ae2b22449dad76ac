//! CLI argument definitions and parsing.
//!
//! Defines the command-line interface structure using clap:
//! - `Cli` - Main CLI entry point
//! - `Commands` - Available subcommands

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use protoforge_core::cli::GenerationMode;
use std::path::PathBuf;

/// Protoforge - schema-driven code generation from annotated `.proto` files.
///
/// Generates Go models, requests, results, services and HTTP controllers, or
/// a TypeScript client SDK, from one set of IDL files.
#[derive(Parser, Debug)]
#[command(name = "protoforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    pub format: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate code from `.proto` files.
    ///
    /// Every `.proto` file under `--dir` is extracted (imports first), then
    /// rendered through the template set. Host output is normalized and each
    /// controller is registered in the central router file.
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Go host code into the current module
    /// protoforge gen --dir pro --out .
    ///
    /// # TypeScript SDK with a custom template bundle
    /// protoforge gen --mode sdk --out web/src/api --tmpl sdk.hbs
    /// ```
    Gen {
        /// Directory (or single file) holding the `.proto` sources
        #[arg(short, long, default_value = "pro")]
        dir: PathBuf,

        /// Output root
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Generation mode (pro for Go host code, sdk for TypeScript)
        #[arg(short, long, default_value = "pro")]
        mode: GenerationMode,

        /// Template directory or bundle file replacing the built-in set
        #[arg(long, env = "PROTOFORGE_TEMPLATES")]
        tmpl: Option<PathBuf>,

        /// Configuration file (default: ./protoforge.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Base package overriding the one derived from go.mod
        #[arg(long)]
        base_package: Option<String>,

        /// Skip router registration
        #[arg(long)]
        no_router: bool,
    },

    /// Scaffold a Go model from a table description.
    ///
    /// Columns are read from a JSON file holding either an array of column
    /// rows or an object keyed by table name. Without one, or when the table
    /// is not described, a default `id`/`created_at`/`updated_at` schema is
    /// used.
    ///
    /// # Examples
    ///
    /// ```bash
    /// protoforge make-model User --columns describe.json
    /// protoforge make-model AuditLog --table audit_logs --path internal/audit
    /// ```
    MakeModel {
        /// Model name, e.g. `User`
        name: String,

        /// Table name (default: pluralised snake case of the name)
        #[arg(short, long)]
        table: Option<String>,

        /// Output directory of the model
        #[arg(short, long, default_value = "app/models")]
        path: String,

        /// JSON file describing table columns
        #[arg(long)]
        columns: Option<PathBuf>,

        /// Overwrite an existing model file
        #[arg(long)]
        force: bool,
    },

    /// Normalize Go files in place.
    ///
    /// Applies the provenance header, prunes unused imports and re-renders
    /// each file canonically. Directories are searched recursively.
    Format {
        /// Files or directories to normalize
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Configuration file (default: ./protoforge.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completions.
    ///
    /// Generates completion scripts for various shells that can be
    /// sourced or saved to enable tab completion for this CLI.
    Completions {
        /// Target shell for completion generation
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_defaults() {
        let cli = Cli::parse_from(["protoforge", "gen"]);
        if let Commands::Gen {
            dir,
            out,
            mode,
            tmpl,
            no_router,
            ..
        } = cli.command
        {
            assert_eq!(dir, PathBuf::from("pro"));
            assert_eq!(out, PathBuf::from("."));
            assert_eq!(mode, GenerationMode::Host);
            assert_eq!(tmpl, None);
            assert!(!no_router);
        } else {
            panic!("Expected Gen command");
        }
    }

    #[test]
    fn test_gen_sdk_mode() {
        let cli = Cli::parse_from(["protoforge", "gen", "--mode", "sdk", "--out", "web"]);
        if let Commands::Gen { mode, out, .. } = cli.command {
            assert_eq!(mode, GenerationMode::Sdk);
            assert_eq!(out, PathBuf::from("web"));
        } else {
            panic!("Expected Gen command");
        }
    }

    #[test]
    fn test_gen_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["protoforge", "gen", "--mode", "rust"]).is_err());
    }

    #[test]
    fn test_make_model() {
        let cli = Cli::parse_from(["protoforge", "make-model", "User", "--table", "members"]);
        if let Commands::MakeModel {
            name, table, path, ..
        } = cli.command
        {
            assert_eq!(name, "User");
            assert_eq!(table.as_deref(), Some("members"));
            assert_eq!(path, "app/models");
        } else {
            panic!("Expected MakeModel command");
        }
    }

    #[test]
    fn test_format_requires_paths() {
        assert!(Cli::try_parse_from(["protoforge", "format"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["protoforge", "--verbose", "--format", "json", "gen"]);
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["protoforge", "completions", "zsh"]);
        if let Commands::Completions { shell } = cli.command {
            assert_eq!(shell, Shell::Zsh);
        } else {
            panic!("Expected Completions command");
        }
    }
}
