use chrono::{Duration, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audit::store::{AuditStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeCommand {
    /// Records older than this many days are deleted
    pub older_than_days: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub deleted: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    #[error("Retention horizon must be at least 1 day")]
    InvalidHorizon,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<PurgeResponse, PurgeError>> for PurgeCommand {}

impl crate::cqrs::middleware::Command for PurgeCommand {}

impl PurgeCommand {
    pub fn validate(&self) -> Result<(), PurgeError> {
        if self.older_than_days == 0 {
            return Err(PurgeError::InvalidHorizon);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(store), fields(older_than_days = command.older_than_days))]
pub async fn handle(
    store: Arc<dyn AuditStore>,
    command: PurgeCommand,
) -> Result<PurgeResponse, PurgeError> {
    command.validate()?;

    let cutoff = Utc::now() - Duration::days(i64::from(command.older_than_days));
    let deleted = store.purge_older_than(cutoff).await?;

    tracing::info!(deleted, %cutoff, "Audit records purged via API");

    Ok(PurgeResponse { deleted })
}
