//! Tally Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging bootstrap for the Tally workspace.
//!
//! # Overview
//!
//! This crate provides the functionality every Tally workspace member needs:
//!
//! - **Error Handling**: the shared `TallyError` type and `Result` alias
//! - **Logging**: environment-driven `tracing` initialization with console
//!   and rotating-file outputs

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, TallyError};
