use mediator::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::audit::models::{AuditAction, NewAuditRecord};
use crate::audit::recorder::AuditRecorder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordChangeCommand {
    pub entity_type: String,
    pub entity_id: String,
    pub action: AuditAction,
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
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// When set, the record is committed before the call returns instead of
    /// going through the queue. Used for changes that must survive even if
    /// the triggering business transaction aborts.
    #[serde(default)]
    pub durable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordChangeResponse {
    pub accepted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordChangeError {
    #[error("Entity type is required")]
    EntityTypeRequired,
    #[error("Entity id is required")]
    EntityIdRequired,
    #[error("A create must not carry an old snapshot")]
    CreateWithOldSnapshot,
    #[error("A delete must not carry a new snapshot")]
    DeleteWithNewSnapshot,
    #[error("An update must carry both snapshots")]
    UpdateMissingSnapshot,
}

impl Request<Result<RecordChangeResponse, RecordChangeError>> for RecordChangeCommand {}

impl crate::cqrs::middleware::Command for RecordChangeCommand {}

impl RecordChangeCommand {
    pub fn validate(&self) -> Result<(), RecordChangeError> {
        if self.entity_type.trim().is_empty() {
            return Err(RecordChangeError::EntityTypeRequired);
        }
        if self.entity_id.trim().is_empty() {
            return Err(RecordChangeError::EntityIdRequired);
        }
        match self.action {
            AuditAction::Create if self.old_snapshot.is_some() => {
                Err(RecordChangeError::CreateWithOldSnapshot)
            }
            AuditAction::Delete if self.new_snapshot.is_some() => {
                Err(RecordChangeError::DeleteWithNewSnapshot)
            }
            AuditAction::Update
                if self.old_snapshot.is_none() || self.new_snapshot.is_none() =>
            {
                Err(RecordChangeError::UpdateMissingSnapshot)
            }
            _ => Ok(()),
        }
    }

    fn into_record(self) -> NewAuditRecord {
        NewAuditRecord {
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            action: self.action,
            old_snapshot: self.old_snapshot,
            new_snapshot: self.new_snapshot,
            actor_id: self.actor_id,
            actor_name: self.actor_name,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            correlation_id: self.correlation_id,
        }
    }
}

/// Accept a change record for appending.
///
/// Validation failures are the only error path; once a command is accepted
/// the append itself can no longer fail the caller.
#[tracing::instrument(
    skip(recorder, command),
    fields(entity_type = %command.entity_type, action = %command.action)
)]
pub async fn handle(
    recorder: AuditRecorder,
    command: RecordChangeCommand,
) -> Result<RecordChangeResponse, RecordChangeError> {
    command.validate()?;

    let durable = command.durable;
    let record = command.into_record();

    if durable {
        recorder.record_durable(record).await;
    } else {
        recorder.record(record);
    }

    Ok(RecordChangeResponse { accepted: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::memory::MemoryAuditStore;
    use serde_json::json;
    use std::sync::Arc;

    fn command(action: AuditAction) -> RecordChangeCommand {
        RecordChangeCommand {
            entity_type: "product".to_string(),
            entity_id: "42".to_string(),
            action,
            old_snapshot: None,
            new_snapshot: None,
            actor_id: None,
            actor_name: None,
            ip_address: None,
            user_agent: None,
            correlation_id: None,
            durable: false,
        }
    }

    #[test]
    fn test_create_rejects_old_snapshot() {
        let cmd = RecordChangeCommand {
            old_snapshot: Some(json!({"price": 100})),
            ..command(AuditAction::Create)
        };
        assert!(matches!(
            cmd.validate(),
            Err(RecordChangeError::CreateWithOldSnapshot)
        ));
    }

    #[test]
    fn test_delete_rejects_new_snapshot() {
        let cmd = RecordChangeCommand {
            new_snapshot: Some(json!({"price": 100})),
            ..command(AuditAction::Delete)
        };
        assert!(matches!(
            cmd.validate(),
            Err(RecordChangeError::DeleteWithNewSnapshot)
        ));
    }

    #[test]
    fn test_update_requires_both_snapshots() {
        let cmd = RecordChangeCommand {
            old_snapshot: Some(json!({"price": 100})),
            ..command(AuditAction::Update)
        };
        assert!(matches!(
            cmd.validate(),
            Err(RecordChangeError::UpdateMissingSnapshot)
        ));
    }

    #[test]
    fn test_blank_entity_type_rejected() {
        let cmd = RecordChangeCommand {
            entity_type: "  ".to_string(),
            ..command(AuditAction::Create)
        };
        assert!(matches!(
            cmd.validate(),
            Err(RecordChangeError::EntityTypeRequired)
        ));
    }

    #[tokio::test]
    async fn test_durable_command_writes_immediately() {
        let store = Arc::new(MemoryAuditStore::new());
        let (recorder, _worker) = AuditRecorder::spawn(store.clone(), 16);

        let cmd = RecordChangeCommand {
            new_snapshot: Some(json!({"name": "Cola"})),
            durable: true,
            ..command(AuditAction::Create)
        };
        let response = handle(recorder, cmd).await.unwrap();

        assert!(response.accepted);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_queued_command_reaches_store_via_worker() {
        let store = Arc::new(MemoryAuditStore::new());
        let (recorder, worker) = AuditRecorder::spawn(store.clone(), 16);

        let cmd = RecordChangeCommand {
            new_snapshot: Some(json!({"name": "Cola"})),
            ..command(AuditAction::Create)
        };
        handle(recorder.clone(), cmd).await.unwrap();

        drop(recorder);
        worker.join().await;

        assert_eq!(store.len(), 1);
    }
}
