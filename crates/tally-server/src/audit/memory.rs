//! In-memory audit store
//!
//! A complete [`AuditStore`] implementation over a mutex-guarded vector.
//! Backs the engine tests and lets the grouping and pagination logic be
//! exercised against fixed snapshots without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

use super::models::{AuditFilter, AuditRecord, NewAuditRecord};
use super::store::{AuditStore, CorrelationGroup, StoreResult};

#[derive(Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, bypassing id and timestamp generation.
    /// Intended for building fixed snapshots in tests.
    pub fn seed(&self, record: AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn matches(record: &AuditRecord, filter: &AuditFilter) -> bool {
    if let Some(entity_type) = &filter.entity_type {
        if record.entity_type != *entity_type {
            return false;
        }
    }
    if let Some(action) = filter.action {
        if record.action != action.as_str() {
            return false;
        }
    }
    if let Some(actor_id) = filter.actor_id {
        if record.actor_id != Some(actor_id) {
            return false;
        }
    }
    if let Some(term) = &filter.free_text {
        let term = term.to_lowercase();
        let name = record
            .actor_name
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if !name.contains(&term) {
            return false;
        }
    }
    if let Some(from) = filter.date_from {
        if record.created_at < from {
            return false;
        }
    }
    if let Some(to) = filter.date_to {
        if record.created_at > to {
            return false;
        }
    }
    true
}

fn sorted_desc(mut records: Vec<AuditRecord>) -> Vec<AuditRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, record: NewAuditRecord) -> StoreResult<AuditRecord> {
        let stored = AuditRecord {
            id: Uuid::new_v4(),
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            action: record.action.as_str().to_string(),
            old_snapshot: record.old_snapshot,
            new_snapshot: record.new_snapshot,
            actor_id: record.actor_id,
            actor_name: record.actor_name,
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            correlation_id: record.correlation_id,
            created_at: Utc::now(),
        };
        self.lock().push(stored.clone());
        Ok(stored)
    }

    async fn fetch_by_id(&self, id: Uuid) -> StoreResult<Option<AuditRecord>> {
        Ok(self.lock().iter().find(|r| r.id == id).cloned())
    }

    async fn ranked_correlation_groups(
        &self,
        filter: &AuditFilter,
    ) -> StoreResult<Vec<CorrelationGroup>> {
        let records = self.lock();
        let mut groups: Vec<CorrelationGroup> = Vec::new();

        for record in records.iter().filter(|r| matches(r, filter)) {
            let Some(cid) = &record.correlation_id else {
                continue;
            };
            match groups.iter_mut().find(|g| g.correlation_id == *cid) {
                Some(group) => group.last_at = group.last_at.max(record.created_at),
                None => groups.push(CorrelationGroup {
                    correlation_id: cid.clone(),
                    last_at: record.created_at,
                }),
            }
        }

        groups.sort_by(|a, b| b.last_at.cmp(&a.last_at));
        Ok(groups)
    }

    async fn count_correlation_groups(&self, filter: &AuditFilter) -> StoreResult<i64> {
        Ok(self.ranked_correlation_groups(filter).await?.len() as i64)
    }

    async fn fetch_uncorrelated(
        &self,
        filter: &AuditFilter,
        cap: i64,
    ) -> StoreResult<Vec<AuditRecord>> {
        let records: Vec<AuditRecord> = self
            .lock()
            .iter()
            .filter(|r| r.correlation_id.is_none() && matches(r, filter))
            .cloned()
            .collect();

        let mut records = sorted_desc(records);
        records.truncate(cap.max(0) as usize);
        Ok(records)
    }

    async fn fetch_by_correlation_ids(&self, keys: &[String]) -> StoreResult<Vec<AuditRecord>> {
        let records: Vec<AuditRecord> = self
            .lock()
            .iter()
            .filter(|r| {
                r.correlation_id
                    .as_ref()
                    .is_some_and(|cid| keys.contains(cid))
            })
            .cloned()
            .collect();
        Ok(sorted_desc(records))
    }

    async fn fetch_matching(
        &self,
        filter: &AuditFilter,
        cap: i64,
    ) -> StoreResult<Vec<AuditRecord>> {
        let records: Vec<AuditRecord> = self
            .lock()
            .iter()
            .filter(|r| matches(r, filter))
            .cloned()
            .collect();

        let mut records = sorted_desc(records);
        records.truncate(cap.max(0) as usize);
        Ok(records)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::AuditAction;
    use chrono::Duration;
    use serde_json::json;

    fn seeded(store: &MemoryAuditStore, correlation_id: Option<&str>, seconds_ago: i64) -> Uuid {
        let id = Uuid::new_v4();
        let base: DateTime<Utc> = "2026-05-01T12:00:00Z".parse().unwrap();
        store.seed(AuditRecord {
            id,
            entity_type: "product".to_string(),
            entity_id: "1".to_string(),
            action: "update".to_string(),
            old_snapshot: Some(json!({"price": 100})),
            new_snapshot: Some(json!({"price": 150})),
            actor_id: None,
            actor_name: Some("Aziz".to_string()),
            ip_address: None,
            user_agent: None,
            correlation_id: correlation_id.map(String::from),
            created_at: base - Duration::seconds(seconds_ago),
        });
        id
    }

    #[tokio::test]
    async fn test_append_and_fetch() {
        let store = MemoryAuditStore::new();
        let record = NewAuditRecord::builder()
            .entity_type("product")
            .entity_id("42")
            .action(AuditAction::Create)
            .try_build()
            .unwrap();

        let stored = store.append(record).await.unwrap();
        let found = store.fetch_by_id(stored.id).await.unwrap();

        assert_eq!(found.unwrap().entity_id, "42");
    }

    #[tokio::test]
    async fn test_ranked_groups_use_newest_member() {
        let store = MemoryAuditStore::new();
        seeded(&store, Some("op-1"), 10);
        seeded(&store, Some("op-1"), 2);
        seeded(&store, Some("op-2"), 5);

        let groups = store
            .ranked_correlation_groups(&AuditFilter::default())
            .await
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].correlation_id, "op-1");
        assert_eq!(groups[1].correlation_id, "op-2");
    }

    #[tokio::test]
    async fn test_uncorrelated_fetch_respects_cap() {
        let store = MemoryAuditStore::new();
        for i in 0..5 {
            seeded(&store, None, i);
        }

        let records = store
            .fetch_uncorrelated(&AuditFilter::default(), 3)
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_free_text_matches_actor_name() {
        let store = MemoryAuditStore::new();
        seeded(&store, None, 0);

        let filter = AuditFilter {
            free_text: Some("azi".to_string()),
            ..Default::default()
        };
        assert_eq!(store.fetch_matching(&filter, 100).await.unwrap().len(), 1);

        let filter = AuditFilter {
            free_text: Some("nobody".to_string()),
            ..Default::default()
        };
        assert!(store.fetch_matching(&filter, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_is_idempotent() {
        let store = MemoryAuditStore::new();
        seeded(&store, None, 100);
        seeded(&store, None, 0);

        let cutoff: DateTime<Utc> = "2026-05-01T11:59:30Z".parse().unwrap();
        assert_eq!(store.purge_older_than(cutoff).await.unwrap(), 1);
        assert_eq!(store.purge_older_than(cutoff).await.unwrap(), 0);
        assert_eq!(store.len(), 1);
    }
}
