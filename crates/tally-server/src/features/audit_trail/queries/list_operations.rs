use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::models::{AuditAction, AuditFilter};
use crate::audit::paginator;
use crate::audit::store::{AuditStore, StoreError};
use crate::features::audit_trail::types::OperationDto;
use crate::features::shared::pagination::{PaginationError, PaginationMetadata, PaginationParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOperationsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    /// Free-text term matched against actor names; forces the search path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListOperationsResponse {
    pub items: Vec<OperationDto>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListOperationsError {
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("Unknown action '{0}'")]
    InvalidAction(String),
    #[error("date_from must not be after date_to")]
    InvalidDateRange,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<ListOperationsResponse, ListOperationsError>> for ListOperationsQuery {}

impl crate::cqrs::middleware::Query for ListOperationsQuery {}

impl ListOperationsQuery {
    pub fn validate(&self) -> Result<(), ListOperationsError> {
        self.pagination().validate()?;
        if let Some(action) = &self.action {
            if AuditAction::parse(action).is_none() {
                return Err(ListOperationsError::InvalidAction(action.clone()));
            }
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ListOperationsError::InvalidDateRange);
            }
        }
        Ok(())
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.size)
    }

    fn filter(&self) -> AuditFilter {
        AuditFilter {
            entity_type: self.entity_type.clone(),
            action: self.action.as_deref().and_then(AuditAction::parse),
            actor_id: self.actor_id,
            free_text: self.q.clone().filter(|t| !t.trim().is_empty()),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

#[tracing::instrument(skip(store, query), fields(page = ?query.page, size = ?query.size))]
pub async fn handle(
    store: Arc<dyn AuditStore>,
    query: ListOperationsQuery,
) -> Result<ListOperationsResponse, ListOperationsError> {
    query.validate()?;

    let pagination = query.pagination();
    let page = pagination.page();
    let size = pagination.size();
    let filter = query.filter();

    let result = paginator::list_operations(store.as_ref(), &filter, page, size).await?;

    Ok(ListOperationsResponse {
        items: result.items.into_iter().map(OperationDto::from).collect(),
        pagination: PaginationMetadata::new(page, size, result.total_elements),
    })
}
