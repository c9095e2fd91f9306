//! Core domain + application logic for the SMS spool relay.
//!
//! This crate is intentionally framework-agnostic. The filesystem watcher and
//! the push-notification backend live behind ports (traits) implemented in
//! adapter crates.

pub mod assembler;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filename;
pub mod inbox;
pub mod logging;
pub mod pipeline;
pub mod ports;
pub mod segment;

pub use errors::{Error, Result};
