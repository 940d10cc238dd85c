//! Audit trail API routes
//!
//! Wires the audit commands and queries to Axum HTTP handlers.
//!
//! # Route Structure
//!
//! - `GET /api/v1/audit/operations` - List grouped operations with filters
//! - `GET /api/v1/audit/records/:id` - Record detail with field changes
//! - `POST /api/v1/audit/records` - Accept a change record (fire-and-forget)
//! - `POST /api/v1/audit/retention/purge` - Delete records past a horizon

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::commands::{
    PurgeCommand, PurgeError, RecordChangeCommand, RecordChangeError,
};
use super::queries::{
    GetRecordError, GetRecordQuery, ListOperationsError, ListOperationsQuery,
};
use crate::features::AuditState;

// ============================================================================
// Router Configuration
// ============================================================================

/// Creates the audit trail router with all routes configured
pub fn audit_routes() -> Router<AuditState> {
    Router::new()
        .route("/operations", get(list_operations))
        .route("/records", post(record_change))
        .route("/records/:id", get(get_record))
        .route("/retention/purge", post(purge))
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// List grouped audit operations
///
/// # Endpoint
///
/// `GET /api/v1/audit/operations?page=1&size=20&entity_type=product&q=aziz`
///
/// # Response
///
/// - `200 OK` - Page of operation summaries with pagination metadata
/// - `400 Bad Request` - Invalid query parameters
/// - `500 Internal Server Error` - Store error
#[tracing::instrument(
    skip(state, query),
    fields(page = ?query.page, size = ?query.size, entity_type = ?query.entity_type)
)]
async fn list_operations(
    State(state): State<AuditState>,
    Query(query): Query<ListOperationsQuery>,
) -> Result<Response, AuditApiError> {
    let response = super::queries::list_operations::handle(state.store.clone(), query).await?;

    tracing::debug!(
        count = response.items.len(),
        total = response.pagination.total_elements,
        "Operations listed via API"
    );

    let meta = json!({
        "pagination": response.pagination
    });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta)))
            .into_response(),
    )
}

/// Get one audit record with its field-level changes
///
/// # Endpoint
///
/// `GET /api/v1/audit/records/:id`
///
/// # Response
///
/// - `200 OK` - Record detail with diff, labels and navigation links
/// - `404 Not Found` - Unknown record id
/// - `500 Internal Server Error` - Store error
#[tracing::instrument(skip(state), fields(record_id = %id))]
async fn get_record(
    State(state): State<AuditState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AuditApiError> {
    let query = GetRecordQuery { id };

    let response =
        super::queries::get_record::handle(state.store.clone(), state.links.clone(), query)
            .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Accept a change record for appending
///
/// # Endpoint
///
/// `POST /api/v1/audit/records`
///
/// # Response
///
/// - `202 Accepted` - Record queued (or durably written when `durable` is set)
/// - `400 Bad Request` - Validation error
#[tracing::instrument(
    skip(state, command),
    fields(entity_type = %command.entity_type, action = %command.action)
)]
async fn record_change(
    State(state): State<AuditState>,
    Json(command): Json<RecordChangeCommand>,
) -> Result<Response, AuditApiError> {
    let response = super::commands::record_change::handle(state.recorder.clone(), command).await?;

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(response))).into_response())
}

/// Purge audit records older than a horizon
///
/// # Endpoint
///
/// `POST /api/v1/audit/retention/purge`
///
/// # Request Body
///
/// ```json
/// { "older_than_days": 365 }
/// ```
///
/// # Response
///
/// - `200 OK` - Count of deleted records
/// - `400 Bad Request` - Invalid horizon
/// - `500 Internal Server Error` - Store error
#[tracing::instrument(skip(state), fields(older_than_days = command.older_than_days))]
async fn purge(
    State(state): State<AuditState>,
    Json(command): Json<PurgeCommand>,
) -> Result<Response, AuditApiError> {
    let response = super::commands::purge::handle(state.store.clone(), command).await?;

    tracing::info!(deleted = response.deleted, "Audit retention purge via API");

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for audit API endpoints
#[derive(Debug)]
enum AuditApiError {
    ListError(ListOperationsError),
    GetError(GetRecordError),
    RecordError(RecordChangeError),
    PurgeError(PurgeError),
}

impl From<ListOperationsError> for AuditApiError {
    fn from(err: ListOperationsError) -> Self {
        Self::ListError(err)
    }
}

impl From<GetRecordError> for AuditApiError {
    fn from(err: GetRecordError) -> Self {
        Self::GetError(err)
    }
}

impl From<RecordChangeError> for AuditApiError {
    fn from(err: RecordChangeError) -> Self {
        Self::RecordError(err)
    }
}

impl From<PurgeError> for AuditApiError {
    fn from(err: PurgeError) -> Self {
        Self::PurgeError(err)
    }
}

impl IntoResponse for AuditApiError {
    fn into_response(self) -> Response {
        match self {
            // List errors
            AuditApiError::ListError(ListOperationsError::Pagination(_))
            | AuditApiError::ListError(ListOperationsError::InvalidAction(_))
            | AuditApiError::ListError(ListOperationsError::InvalidDateRange) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            AuditApiError::ListError(ListOperationsError::Store(_)) => {
                tracing::error!("Store error during operation listing: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },

            // Get errors
            AuditApiError::GetError(GetRecordError::NotFound(id)) => {
                let error = ErrorResponse::new(
                    "NOT_FOUND",
                    format!("Audit record '{}' not found", id),
                );
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            AuditApiError::GetError(GetRecordError::Store(_)) => {
                tracing::error!("Store error during record retrieval: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },

            // Record errors are all validation failures.
            AuditApiError::RecordError(_) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },

            // Purge errors
            AuditApiError::PurgeError(PurgeError::InvalidHorizon) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            AuditApiError::PurgeError(PurgeError::Store(_)) => {
                tracing::error!("Store error during retention purge: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for AuditApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListError(e) => write!(f, "{}", e),
            Self::GetError(e) => write!(f, "{}", e),
            Self::RecordError(e) => write!(f, "{}", e),
            Self::PurgeError(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuditApiError::PurgeError(PurgeError::InvalidHorizon);
        assert!(err.to_string().contains("at least 1 day"));
    }

    #[test]
    fn test_routes_structure() {
        let router = audit_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
