//! Command implementations for the protoforge CLI.
//!
//! Each command module parses its arguments, executes the operation, and
//! formats output according to the requested format.

pub mod common;
pub mod completions;
pub mod format;
pub mod generate;
pub mod make_model;
