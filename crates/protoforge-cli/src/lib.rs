//! Protoforge CLI library.
//!
//! Exposes the argument definitions, command implementations and output
//! formatters so they can be tested without spawning the binary.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod cli;
pub mod commands;
pub mod formatters;
pub mod runner;
