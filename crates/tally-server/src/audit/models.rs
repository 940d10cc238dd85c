//! Audit data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ============================================================================
// Audit Engine Constants
// ============================================================================

/// Tolerance window for inferred grouping of uncorrelated records.
///
/// Measured against the first record admitted to a group (the anchor), not the
/// most recently admitted one. The window does not slide.
pub const GROUP_WINDOW_SECS: i64 = 3;

/// Maximum number of uncorrelated records fetched for heuristic grouping.
///
/// Uncorrelated groups beyond this cap are invisible to pagination. This is a
/// documented scalability trade-off, not a bug.
pub const UNCORRELATED_FETCH_CAP: i64 = 5_000;

/// Maximum number of records fetched on the free-text search path, where the
/// cheap correlation aggregate is unavailable and the whole capped set is
/// grouped in memory.
pub const SEARCH_FETCH_CAP: i64 = 5_000;

/// One atomic change record from the append-only audit trail
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditRecord {
    /// Unique identifier for the record
    pub id: Uuid,
    /// Entity type tag (e.g. "product", "sale")
    pub entity_type: String,
    /// Identifier of the affected entity
    pub entity_id: String,
    /// Action performed (create, update, delete)
    pub action: String,
    /// Field-value map before the change (absent for creates)
    pub old_snapshot: Option<JsonValue>,
    /// Field-value map after the change (absent for deletes)
    pub new_snapshot: Option<JsonValue>,
    /// Acting user (nullable for system actions)
    pub actor_id: Option<Uuid>,
    /// Actor display name, denormalized at write time
    pub actor_name: Option<String>,
    /// Client IP address
    pub ip_address: Option<String>,
    /// Client user agent string
    pub user_agent: Option<String>,
    /// Explicit key linking records that belong to one logical operation
    pub correlation_id: Option<String>,
    /// Timestamp when the change occurred; the sole ordering key
    pub created_at: DateTime<Utc>,
}

/// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parse a stored action string; unknown values yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filter predicate shared by every operation-listing query.
///
/// All fields are optional and ANDed together. `free_text` matches the actor
/// display name and forces the paginator onto the degraded search path.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub action: Option<AuditAction>,
    pub actor_id: Option<Uuid>,
    pub free_text: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Input for appending an audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditRecord {
    pub entity_type: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub old_snapshot: Option<JsonValue>,
    pub new_snapshot: Option<JsonValue>,
    pub actor_id: Option<Uuid>,
    pub actor_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub correlation_id: Option<String>,
}

impl NewAuditRecord {
    /// Create a builder for constructing audit records
    pub fn builder() -> NewAuditRecordBuilder {
        NewAuditRecordBuilder::default()
    }
}

/// Builder for new audit records
#[derive(Debug, Clone, Default)]
pub struct NewAuditRecordBuilder {
    entity_type: Option<String>,
    entity_id: Option<String>,
    action: Option<AuditAction>,
    old_snapshot: Option<JsonValue>,
    new_snapshot: Option<JsonValue>,
    actor_id: Option<Uuid>,
    actor_name: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    correlation_id: Option<String>,
}

impl NewAuditRecordBuilder {
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn old_snapshot(mut self, snapshot: JsonValue) -> Self {
        self.old_snapshot = Some(snapshot);
        self
    }

    pub fn new_snapshot(mut self, snapshot: JsonValue) -> Self {
        self.new_snapshot = Some(snapshot);
        self
    }

    pub fn actor(mut self, actor_id: Option<Uuid>, actor_name: Option<String>) -> Self {
        self.actor_id = actor_id;
        self.actor_name = actor_name;
        self
    }

    pub fn ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Try to build the record, returning an error if required fields are missing
    pub fn try_build(self) -> Result<NewAuditRecord, &'static str> {
        let entity_type = self.entity_type.ok_or("entity_type is required")?;
        let entity_id = self.entity_id.ok_or("entity_id is required")?;
        let action = self.action.ok_or("action is required")?;

        Ok(NewAuditRecord {
            entity_type,
            entity_id,
            action,
            old_snapshot: self.old_snapshot,
            new_snapshot: self.new_snapshot,
            actor_id: self.actor_id,
            actor_name: self.actor_name,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            correlation_id: self.correlation_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_action_as_str() {
        assert_eq!(AuditAction::Create.as_str(), "create");
        assert_eq!(AuditAction::Update.as_str(), "update");
        assert_eq!(AuditAction::Delete.as_str(), "delete");
    }

    #[test]
    fn test_audit_action_parse_roundtrip() {
        for action in [AuditAction::Create, AuditAction::Update, AuditAction::Delete] {
            assert_eq!(AuditAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(AuditAction::parse("read"), None);
    }

    #[test]
    fn test_builder_requires_identity() {
        let result = NewAuditRecord::builder().action(AuditAction::Create).try_build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_full() {
        let record = NewAuditRecord::builder()
            .entity_type("product")
            .entity_id("42")
            .action(AuditAction::Update)
            .old_snapshot(json!({"price": 100}))
            .new_snapshot(json!({"price": 150}))
            .ip_address("192.168.1.1")
            .correlation_id("op-7")
            .try_build()
            .unwrap();

        assert_eq!(record.entity_type, "product");
        assert_eq!(record.action, AuditAction::Update);
        assert_eq!(record.correlation_id.as_deref(), Some("op-7"));
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&AuditAction::Create).unwrap();
        assert_eq!(json, r#""create""#);

        let action: AuditAction = serde_json::from_str(r#""update""#).unwrap();
        assert_eq!(action, AuditAction::Update);
    }
}
