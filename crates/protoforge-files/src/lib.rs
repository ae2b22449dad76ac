//! Post-processing for generated Go sources.
//!
//! Generated host files pass through two structural edits driven by a Go
//! syntax tree (tree-sitter):
//!
//! - **Normalization**: the provenance header appears exactly once, unused
//!   imports are pruned, and the file is re-rendered in one canonical layout.
//!   Files are only rewritten when their text changes, so normalizing twice is
//!   a no-op.
//! - **Router registration**: each controller's router function is called
//!   exactly once from the central registration function, importing the
//!   controller package under a non-conflicting alias.
//!
//! # Examples
//!
//! ```
//! use protoforge_core::RouterConfig;
//! use protoforge_files::{Outcome, inject_router, normalize_files};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let model = dir.path().join("user_gen.go");
//! std::fs::write(&model, "package models\n\ntype User struct{}\n").unwrap();
//! normalize_files(&[model], "// DO NOT EDIT.").unwrap();
//!
//! let kernel = dir.path().join("controllers/kernel.go");
//! let outcome = inject_router(
//!     &kernel,
//!     None,
//!     "UserControllerRouter(router)",
//!     &RouterConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(outcome, Outcome::Created);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod go_file;
mod normalize;
mod router;
mod syntax;

pub use go_file::{GoFile, ImportSpec};
pub use normalize::{NormalizeReport, normalize_file, normalize_files};
pub use router::{Outcome, inject_router};
