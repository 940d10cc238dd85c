//! Read operations for the audit trail

pub mod get_record;
pub mod list_operations;

pub use get_record::{GetRecordError, GetRecordQuery, GetRecordResponse};
pub use list_operations::{ListOperationsError, ListOperationsQuery, ListOperationsResponse};
