//! Core types, configuration, and errors for protoforge.
//!
//! This crate provides the foundational types shared by every other crate in
//! the protoforge workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - Error hierarchy with contextual information (`Error`, `Result`)
//! - Generator configuration loaded from `protoforge.toml` (`GeneratorConfig`)
//! - CLI-facing strong types (`cli::OutputFormat`, `cli::ExitCode`,
//!   `cli::GenerationMode`)

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;

pub mod cli;

pub use config::{CONFIG_FILE_NAME, GeneratorConfig, RouterConfig};
pub use error::{Error, Result};
