//! Audit trail feature slice
//!
//! Exposes the grouping, diffing and retention machinery from
//! [`crate::audit`] over HTTP, following the commands/queries/routes layout
//! used across the server.

pub mod commands;
pub mod links;
pub mod queries;
pub mod routes;
pub mod types;

pub use links::{EntityLinkResolver, RouteLinkResolver};
pub use routes::audit_routes;
