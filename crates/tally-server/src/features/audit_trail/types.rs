//! Shared response types for the audit trail feature

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::audit::models::AuditRecord;
use crate::audit::summary::OperationSummary;

/// One audit record as exposed over the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecordDto {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_snapshot: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_snapshot: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditRecord> for AuditRecordDto {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: record.id,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            action: record.action,
            old_snapshot: record.old_snapshot,
            new_snapshot: record.new_snapshot,
            actor_id: record.actor_id,
            actor_name: record.actor_name,
            ip_address: record.ip_address,
            correlation_id: record.correlation_id,
            created_at: record.created_at,
        }
    }
}

/// One logical operation in a listing response
#[derive(Debug, Clone, Serialize)]
pub struct OperationDto {
    pub group_key: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    pub primary_action_label: String,
    pub summary: String,
    pub count: usize,
    pub entity_types: Vec<String>,
    pub member_records: Vec<AuditRecordDto>,
    pub inferred: bool,
}

impl From<OperationSummary> for OperationDto {
    fn from(summary: OperationSummary) -> Self {
        Self {
            group_key: summary.group_key,
            timestamp: summary.timestamp,
            actor_name: summary.actor_name,
            primary_action_label: summary.primary_action_label,
            summary: summary.summary,
            count: summary.count,
            entity_types: summary.entity_types,
            member_records: summary
                .member_records
                .into_iter()
                .map(AuditRecordDto::from)
                .collect(),
            inferred: summary.inferred,
        }
    }
}
