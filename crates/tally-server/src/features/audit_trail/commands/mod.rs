//! Write operations for the audit trail

pub mod purge;
pub mod record_change;

pub use purge::{PurgeCommand, PurgeError, PurgeResponse};
pub use record_change::{RecordChangeCommand, RecordChangeError, RecordChangeResponse};
