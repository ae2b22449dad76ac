//! Code generation from annotated IDL files.
//!
//! Turns parsed `.proto` files into a typed schema (messages, services,
//! enums), resolves cross-file types into per-file import sets, and renders
//! Go host code or TypeScript SDK code through Handlebars templates.
//!
//! # Examples
//!
//! ```no_run
//! use protoforge_codegen::pipeline::{GenerateOptions, generate};
//! use protoforge_codegen::TemplateEngine;
//! use protoforge_core::cli::GenerationMode;
//! use protoforge_core::GeneratorConfig;
//! use std::path::PathBuf;
//!
//! let engine = TemplateEngine::builtin(GenerationMode::Host).unwrap();
//! let options = GenerateOptions {
//!     mode: GenerationMode::Host,
//!     base_package: "example.com/app".to_string(),
//!     working_dir: PathBuf::from("."),
//!     out_dir: PathBuf::from("."),
//!     config: GeneratorConfig::default(),
//! };
//! let report = generate(&[PathBuf::from("pro/user.proto")], &engine, &options).unwrap();
//! println!("{} files written", report.files.len());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod directive;
pub mod emitter;
pub mod gomod;
pub mod imports;
pub mod naming;
pub mod pipeline;
pub mod scaffold;
pub mod schema;
pub mod template_engine;

pub use directive::{Directive, DirectiveBlock};
pub use emitter::{EmitOptions, Emitter, RenderedFile};
pub use pipeline::{GenerateOptions, GenerationReport, RouterTarget};
pub use schema::{ProtoSchema, SchemaContext};
pub use template_engine::TemplateEngine;
