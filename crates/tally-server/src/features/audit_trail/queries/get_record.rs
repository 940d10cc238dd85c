use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::diff::{self, FieldChange};
use crate::audit::store::{AuditStore, StoreError};
use crate::audit::summary;
use crate::features::audit_trail::links::EntityLinkResolver;
use crate::features::audit_trail::types::AuditRecordDto;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRecordQuery {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetRecordResponse {
    pub record: AuditRecordDto,
    pub changes: Vec<FieldChange>,
    /// Display label for the affected entity type
    pub entity_label: String,
    /// Best-effort navigation link for the affected entity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_link: Option<String>,
    /// Best-effort navigation link for the acting user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_link: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetRecordError {
    #[error("Audit record '{0}' not found")]
    NotFound(Uuid),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<GetRecordResponse, GetRecordError>> for GetRecordQuery {}

impl crate::cqrs::middleware::Query for GetRecordQuery {}

#[tracing::instrument(skip(store, links), fields(record_id = %query.id))]
pub async fn handle(
    store: Arc<dyn AuditStore>,
    links: Arc<dyn EntityLinkResolver>,
    query: GetRecordQuery,
) -> Result<GetRecordResponse, GetRecordError> {
    let record = store
        .fetch_by_id(query.id)
        .await?
        .ok_or(GetRecordError::NotFound(query.id))?;

    let changes = diff::diff_snapshots(
        &record.entity_type,
        record.old_snapshot.as_ref(),
        record.new_snapshot.as_ref(),
    );

    let entity_label = summary::entity_label(&record.entity_type);
    let entity_link = links.entity_link(&record.entity_type, &record.entity_id);
    let actor_link = record.actor_id.and_then(|id| links.actor_link(id));

    tracing::debug!(
        entity_type = %record.entity_type,
        changes = changes.len(),
        "Audit record retrieved"
    );

    Ok(GetRecordResponse {
        record: record.into(),
        changes,
        entity_label,
        entity_link,
        actor_link,
    })
}
