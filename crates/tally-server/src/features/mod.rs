//! Feature modules implementing the Tally API
//!
//! Each feature is a vertical slice following the CQRS (Command Query
//! Responsibility Segregation) pattern, with its own commands, queries and
//! routes:
//!
//! - **audit_trail**: grouped change history, record diffs, retention
//!
//! Commands and queries implement the mediator pattern using the `mediator`
//! crate, keeping handlers testable without the HTTP layer.

pub mod audit_trail;
pub mod shared;

use axum::Router;
use std::sync::Arc;

use crate::audit::recorder::AuditRecorder;
use crate::audit::store::AuditStore;
use audit_trail::EntityLinkResolver;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct AuditState {
    /// Storage backend for audit reads and the purge path
    pub store: Arc<dyn AuditStore>,
    /// Fire-and-forget append handle
    pub recorder: AuditRecorder,
    /// Best-effort navigation link resolution
    pub links: Arc<dyn EntityLinkResolver>,
}

/// Creates the main API router with all feature routes mounted
pub fn router(state: AuditState) -> Router<()> {
    Router::new().nest("/audit", audit_trail::audit_routes().with_state(state))
}
