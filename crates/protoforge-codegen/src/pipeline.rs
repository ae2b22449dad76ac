//! One generation run: extract, render, write.

use crate::emitter::{EmitOptions, Emitter, RenderedFile, write_files};
use crate::naming::join_path;
use crate::schema::SchemaContext;
use crate::template_engine::TemplateEngine;
use protoforge_core::cli::GenerationMode;
use protoforge_core::{GeneratorConfig, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Inputs of a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Host or SDK generation
    pub mode: GenerationMode,
    /// Base package prefixed to every import path
    pub base_package: String,
    /// Directory searched first for imported IDL files
    pub working_dir: PathBuf,
    /// Output root
    pub out_dir: PathBuf,
    /// Generator settings
    pub config: GeneratorConfig,
}

/// A route registration the host output needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterTarget {
    /// Controller package, `None` when it is the registration file's own
    /// package
    pub import_path: Option<String>,
    /// Call expression, e.g. `auth.AuthServiceRouter(router)`
    pub call: String,
}

/// Result of a generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Files written, in generation order
    pub files: Vec<PathBuf>,
    /// Route registrations for controllers (host mode only)
    pub routers: Vec<RouterTarget>,
    /// Number of IDL files extracted, imports included
    pub schemas: usize,
}

/// Runs extraction and emission for `proto_files`.
///
/// All files are extracted first (each import before its importer), then
/// every schema is rendered once in extraction order, then everything is
/// written. Nothing is written if any step fails.
///
/// # Errors
///
/// Propagates extraction, template and I/O errors.
pub fn generate(
    proto_files: &[PathBuf],
    engine: &TemplateEngine<'_>,
    options: &GenerateOptions,
) -> Result<GenerationReport> {
    let mut ctx = SchemaContext::new(&options.base_package, &options.working_dir);
    for file in proto_files {
        ctx.extract_file(file, "")?;
    }

    let emitter = Emitter::new(engine, emit_options(options));
    let mut rendered: Vec<RenderedFile> = Vec::new();
    let mut routers = Vec::new();
    let mut schemas = 0;
    for schema in ctx.schemas() {
        schemas += 1;
        rendered.extend(emitter.render_schema(schema, &ctx.registry)?);
        if !options.mode.is_sdk() {
            routers.extend(
                schema
                    .all_services()
                    .filter(|s| s.is_controller)
                    .map(|s| router_target(s, options)),
            );
        }
    }

    warn_duplicates(&rendered);
    let files = write_files(&options.out_dir, &rendered)?;
    Ok(GenerationReport {
        files,
        routers,
        schemas,
    })
}

fn emit_options(options: &GenerateOptions) -> EmitOptions {
    let config = &options.config;
    EmitOptions {
        mode: options.mode,
        header: config.header.clone(),
        extension: if options.mode.is_sdk() {
            config.sdk_extension.clone()
        } else {
            config.host_extension.clone()
        },
        response_path: join_path(&[&options.base_package, &config.response_package]),
    }
}

fn router_target(service: &crate::schema::Service, options: &GenerateOptions) -> RouterTarget {
    let router = &options.config.router;
    let registration_dir = router
        .registration_file
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let registration_package = join_path(&[&options.base_package, &registration_dir]);
    if service.controller_import_path == registration_package {
        RouterTarget {
            import_path: None,
            call: format!("{}Router({})", service.name, router.router_param),
        }
    } else {
        RouterTarget {
            import_path: Some(service.controller_import_path.clone()),
            call: service.router_call(&router.router_param),
        }
    }
}

fn warn_duplicates(files: &[RenderedFile]) {
    let mut seen = HashSet::new();
    for file in files {
        if !seen.insert(file.path.as_str()) {
            tracing::warn!(
                "{} is generated more than once; the last declaration wins",
                file.path
            );
        }
    }
}

/// Base package for `out_dir`: the configured override, else the enclosing
/// Go module's import path of `out_dir`, else `fallback`.
///
/// # Errors
///
/// Propagates errors reading an existing `go.mod`.
pub fn resolve_base_package(
    config: &GeneratorConfig,
    out_dir: &Path,
    fallback: &str,
) -> Result<String> {
    if let Some(base) = &config.base_package {
        return Ok(base.clone());
    }
    Ok(match crate::gomod::GoModule::discover(out_dir)? {
        Some(module) => module.import_path_of(out_dir),
        None => {
            tracing::warn!(
                "No go.mod found above {}; using '{fallback}' as base package",
                out_dir.display()
            );
            fallback.to_string()
        }
    })
}
