//! Tally Server Library
//!
//! HTTP backend for a retail operations audit trail.
//!
//! # Overview
//!
//! The server keeps an append-only log of entity changes and exposes a
//! grouped, human-readable view of it:
//!
//! - **Append path**: business services hand change records to a bounded
//!   queue; a worker owns the writes and failures never reach the caller
//! - **Read path**: records are grouped into logical operations (exactly by
//!   correlation id, heuristically by actor and time window), paged, and
//!   diffed field by field with labels, formatting and sensitivity masking
//! - **Retention**: a periodic sweep deletes records past a configured
//!   horizon
//!
//! # Architecture
//!
//! The server follows a **CQRS (Command Query Responsibility Segregation)**
//! architecture: each feature is a vertical slice with commands, queries and
//! routes, and the `mediator` crate dispatches messages to handlers. The
//! grouping, diffing and pagination machinery lives in [`audit`] and is
//! written against a narrow store trait, so it runs identically over
//! Postgres and the in-memory store used by tests.
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and handlers
//! - **SQLx**: Postgres access
//! - **Tower**: middleware and service abstractions

pub mod api;
pub mod audit;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, ServerResult};
