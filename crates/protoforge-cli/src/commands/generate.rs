//! Generate command implementation.
//!
//! Runs one generation pass:
//! 1. Loads configuration and discovers `.proto` files
//! 2. Extracts, renders and writes every schema
//! 3. Normalizes host files and registers controller routers

use super::common::{collect_files, load_config};
use anyhow::{Context, Result};
use protoforge_codegen::pipeline::{GenerateOptions, generate, resolve_base_package};
use protoforge_codegen::TemplateEngine;
use protoforge_core::cli::{ExitCode, GenerationMode, OutputFormat};
use protoforge_files::{Outcome, inject_router, normalize_files};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Base package used outside any Go module.
const FALLBACK_BASE_PACKAGE: &str = "app";

/// Arguments of the `gen` command.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Directory or file holding `.proto` sources
    pub dir: PathBuf,
    /// Output root
    pub out: PathBuf,
    /// Host or SDK generation
    pub mode: GenerationMode,
    /// Template directory or bundle overriding the built-in set
    pub tmpl: Option<PathBuf>,
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    /// Base package override
    pub base_package: Option<String>,
    /// Skip router registration
    pub no_router: bool,
}

/// Router registration performed for one controller.
#[derive(Debug, Clone, Serialize)]
pub struct RouterSummary {
    /// Registration call
    pub call: String,
    /// `created`, `inserted` or `present`
    pub outcome: &'static str,
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    /// `pro` or `sdk`
    pub mode: &'static str,
    /// Base package of generated imports
    pub base_package: String,
    /// IDL files extracted, imports included
    pub schemas: usize,
    /// Files written
    pub files: Vec<String>,
    /// Host files rewritten by normalization
    pub formatted: usize,
    /// Router registrations
    pub routers: Vec<RouterSummary>,
}

/// Runs the `gen` command and prints its summary.
///
/// # Errors
///
/// Returns an error if configuration, extraction, rendering,
/// post-processing or router registration fails.
pub fn run(args: &GenerateArgs, output_format: OutputFormat) -> Result<ExitCode> {
    let working_dir = std::env::current_dir().context("failed to read current directory")?;
    let Some(summary) = generate_into(args, &working_dir)? else {
        return Ok(ExitCode::INVALID_INPUT);
    };
    let formatted = crate::formatters::format_output(&summary, output_format)?;
    println!("{formatted}");
    Ok(ExitCode::SUCCESS)
}

/// Generates code for `args`, resolving configuration and imports from
/// `working_dir`.
///
/// Returns `None` when no `.proto` file was found.
///
/// # Errors
///
/// See [`run`].
pub fn generate_into(args: &GenerateArgs, working_dir: &Path) -> Result<Option<GenerateSummary>> {
    let mut config = load_config(args.config.as_deref(), working_dir)?;
    if let Some(base) = &args.base_package {
        config.base_package = Some(base.clone());
    }

    let protos = collect_files(&args.dir, "proto")?;
    if protos.is_empty() {
        warn!("No .proto files found in {}", args.dir.display());
        return Ok(None);
    }
    info!("Generating {} code from {} file(s)", args.mode, protos.len());

    let engine = match &args.tmpl {
        Some(path) => TemplateEngine::from_path(path)
            .with_context(|| format!("failed to load templates from {}", path.display()))?,
        None => TemplateEngine::builtin(args.mode)?,
    };

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let base_package = resolve_base_package(&config, &args.out, FALLBACK_BASE_PACKAGE)?;

    let options = GenerateOptions {
        mode: args.mode,
        base_package: base_package.clone(),
        working_dir: working_dir.to_path_buf(),
        out_dir: args.out.clone(),
        config,
    };
    let report = generate(&protos, &engine, &options).context("generation failed")?;

    let mut formatted = 0;
    let mut routers = Vec::new();
    if !args.mode.is_sdk() {
        let normalized = normalize_files(&report.files, &options.config.header)
            .context("failed to normalize generated files")?;
        formatted = normalized.changed.len();

        if args.no_router {
            info!("Skipping router registration");
        } else {
            let registration = args.out.join(&options.config.router.registration_file);
            for target in &report.routers {
                let outcome = inject_router(
                    &registration,
                    target.import_path.as_deref(),
                    &target.call,
                    &options.config.router,
                )
                .with_context(|| format!("failed to register {}", target.call))?;
                routers.push(RouterSummary {
                    call: target.call.clone(),
                    outcome: outcome_label(outcome),
                });
            }
        }
    }

    Ok(Some(GenerateSummary {
        mode: args.mode.as_str(),
        base_package,
        schemas: report.schemas,
        files: report
            .files
            .iter()
            .map(|p| p.strip_prefix(&args.out).unwrap_or(p).display().to_string())
            .collect(),
        formatted,
        routers,
    }))
}

const fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Created => "created",
        Outcome::Inserted => "inserted",
        Outcome::AlreadyPresent => "present",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_structure() {
        let summary = GenerateSummary {
            mode: "pro",
            base_package: "example.com/app".to_string(),
            schemas: 1,
            files: vec!["models/User_gen.go".to_string()],
            formatted: 1,
            routers: vec![RouterSummary {
                call: "AuthServiceRouter(router)".to_string(),
                outcome: "created",
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["mode"], "pro");
        assert_eq!(json["files"][0], "models/User_gen.go");
        assert_eq!(json["routers"][0]["outcome"], "created");
    }

    #[test]
    fn test_empty_dir_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let args = GenerateArgs {
            dir: dir.path().to_path_buf(),
            out: dir.path().join("out"),
            mode: GenerationMode::Host,
            tmpl: None,
            config: None,
            base_package: None,
            no_router: false,
        };
        assert!(generate_into(&args, dir.path()).unwrap().is_none());
    }
}
