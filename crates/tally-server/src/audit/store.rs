//! Audit record store
//!
//! Narrow storage interface the grouping and pagination logic is written
//! against, plus its Postgres implementation. The interface exposes the
//! cheap correlation-group aggregate separately from member fetches so the
//! paginator never materializes rows for groups outside the requested page.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::models::{AuditFilter, AuditRecord, NewAuditRecord};

/// Storage-level errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Audit store query failed: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One correlated group as seen by the cheap ranking aggregate: the key and
/// the newest member timestamp, without member rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CorrelationGroup {
    pub correlation_id: String,
    pub last_at: DateTime<Utc>,
}

/// Read/write contract for the audit trail.
///
/// Implementations must treat records as append-only: no update path exists,
/// and deletion happens only through `purge_older_than`.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one record, returning the stored row
    async fn append(&self, record: NewAuditRecord) -> StoreResult<AuditRecord>;

    /// Fetch a single record by id
    async fn fetch_by_id(&self, id: Uuid) -> StoreResult<Option<AuditRecord>>;

    /// Distinct correlation ids matching the filter, ranked by each group's
    /// newest member timestamp descending
    async fn ranked_correlation_groups(
        &self,
        filter: &AuditFilter,
    ) -> StoreResult<Vec<CorrelationGroup>>;

    /// Count of distinct correlation ids matching the filter
    async fn count_correlation_groups(&self, filter: &AuditFilter) -> StoreResult<i64>;

    /// Uncorrelated records matching the filter, newest first, capped
    async fn fetch_uncorrelated(
        &self,
        filter: &AuditFilter,
        cap: i64,
    ) -> StoreResult<Vec<AuditRecord>>;

    /// All member records of the given correlation ids, newest first.
    ///
    /// Members are fetched whole: the listing filter selects which groups
    /// appear, not which of their members do.
    async fn fetch_by_correlation_ids(&self, keys: &[String]) -> StoreResult<Vec<AuditRecord>>;

    /// All records matching the filter regardless of correlation, newest
    /// first, capped. Used by the free-text search path.
    async fn fetch_matching(&self, filter: &AuditFilter, cap: i64) -> StoreResult<Vec<AuditRecord>>;

    /// Delete records older than the cutoff, returning the count deleted.
    /// Idempotent: a second run with the same cutoff deletes nothing.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

const RECORD_COLUMNS: &str = "id, entity_type, entity_id, action, old_snapshot, new_snapshot, \
     actor_id, actor_name, ip_address, user_agent, correlation_id, created_at";

/// Append filter conditions to a WHERE clause, numbering binds from
/// `bind_count`. Bind order must match `bind_filter!`.
fn push_filter_conditions(sql: &mut String, filter: &AuditFilter, bind_count: &mut usize) {
    let mut conditions = Vec::new();

    if filter.entity_type.is_some() {
        conditions.push(format!("entity_type = ${}", bind_count));
        *bind_count += 1;
    }
    if filter.action.is_some() {
        conditions.push(format!("action = ${}", bind_count));
        *bind_count += 1;
    }
    if filter.actor_id.is_some() {
        conditions.push(format!("actor_id = ${}", bind_count));
        *bind_count += 1;
    }
    if filter.free_text.is_some() {
        conditions.push(format!("actor_name ILIKE ${}", bind_count));
        *bind_count += 1;
    }
    if filter.date_from.is_some() {
        conditions.push(format!("created_at >= ${}", bind_count));
        *bind_count += 1;
    }
    if filter.date_to.is_some() {
        conditions.push(format!("created_at <= ${}", bind_count));
        *bind_count += 1;
    }

    for condition in conditions {
        sql.push_str(" AND ");
        sql.push_str(&condition);
    }
}

/// Bind filter values in the same order `push_filter_conditions` numbered them
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut query = $query;
        if let Some(entity_type) = &$filter.entity_type {
            query = query.bind(entity_type);
        }
        if let Some(action) = $filter.action {
            query = query.bind(action.as_str());
        }
        if let Some(actor_id) = $filter.actor_id {
            query = query.bind(actor_id);
        }
        if let Some(term) = &$filter.free_text {
            query = query.bind(format!("%{}%", term));
        }
        if let Some(date_from) = $filter.date_from {
            query = query.bind(date_from);
        }
        if let Some(date_to) = $filter.date_to {
            query = query.bind(date_to);
        }
        query
    }};
}

/// Postgres-backed audit store
#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn append(&self, record: NewAuditRecord) -> StoreResult<AuditRecord> {
        let sql = format!(
            r#"
            INSERT INTO audit_records (
                entity_type, entity_id, action, old_snapshot, new_snapshot,
                actor_id, actor_name, ip_address, user_agent, correlation_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let stored = sqlx::query_as::<_, AuditRecord>(&sql)
            .bind(&record.entity_type)
            .bind(&record.entity_id)
            .bind(record.action.as_str())
            .bind(&record.old_snapshot)
            .bind(&record.new_snapshot)
            .bind(record.actor_id)
            .bind(&record.actor_name)
            .bind(&record.ip_address)
            .bind(&record.user_agent)
            .bind(&record.correlation_id)
            .fetch_one(&self.pool)
            .await?;

        debug!(
            audit_id = %stored.id,
            entity_type = %stored.entity_type,
            action = %stored.action,
            "Appended audit record"
        );

        Ok(stored)
    }

    async fn fetch_by_id(&self, id: Uuid) -> StoreResult<Option<AuditRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM audit_records WHERE id = $1");

        let record = sqlx::query_as::<_, AuditRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn ranked_correlation_groups(
        &self,
        filter: &AuditFilter,
    ) -> StoreResult<Vec<CorrelationGroup>> {
        let mut sql = String::from(
            r#"
            SELECT correlation_id, MAX(created_at) AS last_at
            FROM audit_records
            WHERE correlation_id IS NOT NULL
            "#,
        );

        let mut bind_count = 1;
        push_filter_conditions(&mut sql, filter, &mut bind_count);
        sql.push_str(" GROUP BY correlation_id ORDER BY last_at DESC");

        let query = sqlx::query_as::<_, CorrelationGroup>(&sql);
        let groups = bind_filter!(query, filter).fetch_all(&self.pool).await?;

        debug!(count = groups.len(), "Ranked correlation groups");

        Ok(groups)
    }

    async fn count_correlation_groups(&self, filter: &AuditFilter) -> StoreResult<i64> {
        let mut sql = String::from(
            r#"
            SELECT COUNT(DISTINCT correlation_id)
            FROM audit_records
            WHERE correlation_id IS NOT NULL
            "#,
        );

        let mut bind_count = 1;
        push_filter_conditions(&mut sql, filter, &mut bind_count);

        let query = sqlx::query_scalar::<_, i64>(&sql);
        let count = bind_filter!(query, filter).fetch_one(&self.pool).await?;

        Ok(count)
    }

    async fn fetch_uncorrelated(
        &self,
        filter: &AuditFilter,
        cap: i64,
    ) -> StoreResult<Vec<AuditRecord>> {
        let mut sql = format!(
            "SELECT {RECORD_COLUMNS} FROM audit_records WHERE correlation_id IS NULL"
        );

        let mut bind_count = 1;
        push_filter_conditions(&mut sql, filter, &mut bind_count);
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ${}", bind_count));

        let query = sqlx::query_as::<_, AuditRecord>(&sql);
        let records = bind_filter!(query, filter)
            .bind(cap)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), cap, "Fetched uncorrelated audit records");

        Ok(records)
    }

    async fn fetch_by_correlation_ids(&self, keys: &[String]) -> StoreResult<Vec<AuditRecord>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM audit_records \
             WHERE correlation_id = ANY($1) ORDER BY created_at DESC"
        );

        let records = sqlx::query_as::<_, AuditRecord>(&sql)
            .bind(keys)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn fetch_matching(
        &self,
        filter: &AuditFilter,
        cap: i64,
    ) -> StoreResult<Vec<AuditRecord>> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM audit_records WHERE 1=1");

        let mut bind_count = 1;
        push_filter_conditions(&mut sql, filter, &mut bind_count);
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ${}", bind_count));

        let query = sqlx::query_as::<_, AuditRecord>(&sql);
        let records = bind_filter!(query, filter)
            .bind(cap)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), cap, "Fetched audit records for search");

        Ok(records)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM audit_records WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            debug!(deleted, %cutoff, "Purged expired audit records");
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::AuditAction;

    #[test]
    fn test_filter_conditions_numbering() {
        let filter = AuditFilter {
            entity_type: Some("product".to_string()),
            action: Some(AuditAction::Update),
            actor_id: None,
            free_text: None,
            date_from: Some(Utc::now()),
            date_to: None,
        };

        let mut sql = String::from("WHERE 1=1");
        let mut bind_count = 1;
        push_filter_conditions(&mut sql, &filter, &mut bind_count);

        assert_eq!(bind_count, 4);
        assert!(sql.contains("entity_type = $1"));
        assert!(sql.contains("action = $2"));
        assert!(sql.contains("created_at >= $3"));
    }

    #[test]
    fn test_empty_filter_adds_no_conditions() {
        let mut sql = String::from("WHERE 1=1");
        let mut bind_count = 1;
        push_filter_conditions(&mut sql, &AuditFilter::default(), &mut bind_count);

        assert_eq!(sql, "WHERE 1=1");
        assert_eq!(bind_count, 1);
    }
}
