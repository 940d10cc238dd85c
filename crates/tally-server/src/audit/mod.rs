//! Audit trail engine
//!
//! Append-only change records, the grouping and diffing logic that turns
//! them into displayable operations, and the storage contract both sides
//! are written against.

pub mod diff;
pub mod grouping;
pub mod memory;
pub mod models;
pub mod paginator;
pub mod recorder;
pub mod registry;
pub mod retention;
pub mod store;
pub mod summary;

pub use diff::{diff_snapshots, ChangeType, FieldChange};
pub use grouping::OperationGroup;
pub use models::{AuditAction, AuditFilter, AuditRecord, NewAuditRecord};
pub use paginator::{list_operations, OperationPage};
pub use recorder::{AuditRecorder, RecorderWorker};
pub use store::{AuditStore, CorrelationGroup, PgAuditStore, StoreError};
pub use summary::OperationSummary;
