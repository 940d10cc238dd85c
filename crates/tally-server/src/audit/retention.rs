//! Retention sweep
//!
//! Periodic, idempotent deletion of audit records older than the configured
//! horizon. The sweep runs far outside the live query window, so it needs no
//! coordination with readers or the append worker.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::store::AuditStore;

/// Run a single sweep, deleting records older than `retention_days`
pub async fn sweep_once(store: &dyn AuditStore, retention_days: i64) -> u64 {
    let cutoff = Utc::now() - ChronoDuration::days(retention_days);

    match store.purge_older_than(cutoff).await {
        Ok(deleted) => {
            if deleted > 0 {
                info!(deleted, %cutoff, "Retention sweep purged audit records");
            }
            deleted
        }
        Err(err) => {
            // The next tick retries; a failed sweep only delays cleanup.
            warn!(error = %err, "Retention sweep failed");
            0
        }
    }
}

/// Spawn the background sweeper, ticking at the given interval
pub fn spawn_sweeper(
    store: Arc<dyn AuditStore>,
    retention_days: i64,
    sweep_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        // The first tick fires immediately, giving one sweep at startup.
        loop {
            ticker.tick().await;
            sweep_once(store.as_ref(), retention_days).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::memory::MemoryAuditStore;
    use crate::audit::models::AuditRecord;
    use uuid::Uuid;

    fn seed_at(store: &MemoryAuditStore, days_ago: i64) {
        store.seed(AuditRecord {
            id: Uuid::new_v4(),
            entity_type: "product".to_string(),
            entity_id: "1".to_string(),
            action: "update".to_string(),
            old_snapshot: None,
            new_snapshot: None,
            actor_id: None,
            actor_name: None,
            ip_address: None,
            user_agent: None,
            correlation_id: None,
            created_at: Utc::now() - ChronoDuration::days(days_ago),
        });
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_expired() {
        let store = MemoryAuditStore::new();
        seed_at(&store, 400);
        seed_at(&store, 10);

        let deleted = sweep_once(&store, 365).await;

        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_idempotent() {
        let store = MemoryAuditStore::new();
        seed_at(&store, 400);

        assert_eq!(sweep_once(&store, 365).await, 1);
        assert_eq!(sweep_once(&store, 365).await, 0);
    }

    #[tokio::test]
    async fn test_fresh_records_survive() {
        let store = MemoryAuditStore::new();
        seed_at(&store, 1);

        assert_eq!(sweep_once(&store, 365).await, 0);
        assert_eq!(store.len(), 1);
    }
}
