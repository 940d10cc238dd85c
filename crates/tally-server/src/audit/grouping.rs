//! Grouping engine
//!
//! Collapses individual audit records into logical operations. Records that
//! carry a correlation id are partitioned exactly by that id. Uncorrelated
//! records are grouped heuristically: walking newest-first, a record joins the
//! current group when it has the same actor as the group and falls within
//! [`GROUP_WINDOW_SECS`] of the group's anchor (the first record admitted).
//! The window is anchored, not sliding, so a slow trickle of writes cannot
//! chain into one unbounded group.

use super::models::{AuditRecord, GROUP_WINDOW_SECS};

/// A batch of records that form one logical operation.
///
/// Records are ordered newest-first; the first element is the group's
/// representative record for sorting and summarization.
#[derive(Debug, Clone)]
pub struct OperationGroup {
    /// Stable key: the correlation id for correlated groups, a synthesized
    /// key for inferred ones
    pub key: String,
    pub records: Vec<AuditRecord>,
    /// Whether the group was inferred by the time-window heuristic rather
    /// than an explicit correlation id
    pub inferred: bool,
}

impl OperationGroup {
    /// Newest record in the group
    pub fn representative(&self) -> &AuditRecord {
        // Groups are never constructed empty.
        &self.records[0]
    }

    pub fn correlated(key: String, records: Vec<AuditRecord>) -> Self {
        Self { key, records, inferred: false }
    }
}

/// Synthesize a stable key for an inferred group.
///
/// Derived from the earliest member's timestamp and the actor, so the same
/// underlying records always produce the same key across requests.
fn inferred_key(records: &[AuditRecord]) -> String {
    let earliest = records
        .iter()
        .map(|r| r.created_at)
        .min()
        .map(|ts| ts.timestamp_millis())
        .unwrap_or_default();
    let actor = records
        .first()
        .and_then(|r| r.actor_id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anon".to_string());
    format!("inferred:{}:{}", earliest, actor)
}

/// Group uncorrelated records with the anchored time-window heuristic.
///
/// `records` must be sorted newest-first; output groups preserve that order
/// both across groups and within each group.
pub fn group_uncorrelated(records: Vec<AuditRecord>) -> Vec<OperationGroup> {
    let mut groups: Vec<OperationGroup> = Vec::new();
    let mut current: Vec<AuditRecord> = Vec::new();

    for record in records {
        let admit = match current.first() {
            None => true,
            Some(anchor) => {
                // Compared in milliseconds: whole-second arithmetic truncates
                // toward zero and would admit gaps of up to a second past the
                // window on sub-second timestamps.
                let gap_ms = (anchor.created_at - record.created_at)
                    .num_milliseconds()
                    .abs();
                anchor.actor_id == record.actor_id && gap_ms <= GROUP_WINDOW_SECS * 1_000
            }
        };

        if admit {
            current.push(record);
        } else {
            groups.push(finish_inferred(std::mem::take(&mut current)));
            current.push(record);
        }
    }

    if !current.is_empty() {
        groups.push(finish_inferred(current));
    }

    groups
}

fn finish_inferred(records: Vec<AuditRecord>) -> OperationGroup {
    OperationGroup {
        key: inferred_key(&records),
        records,
        inferred: true,
    }
}

/// Group a mixed record set: exact partitioning for correlated records,
/// the time-window heuristic for the rest.
///
/// Used on the search path, where the filter is applied before grouping and
/// the cheap per-correlation aggregate is unavailable. `records` must be
/// sorted newest-first; output groups are ordered newest-first by their
/// representative record.
pub fn group_mixed(records: Vec<AuditRecord>) -> Vec<OperationGroup> {
    let mut correlated: Vec<(String, Vec<AuditRecord>)> = Vec::new();
    let mut uncorrelated: Vec<AuditRecord> = Vec::new();

    for record in records {
        match record.correlation_id.clone() {
            Some(cid) => match correlated.iter_mut().find(|(key, _)| *key == cid) {
                Some((_, members)) => members.push(record),
                None => correlated.push((cid, vec![record])),
            },
            None => uncorrelated.push(record),
        }
    }

    let mut groups: Vec<OperationGroup> = correlated
        .into_iter()
        .map(|(key, records)| OperationGroup::correlated(key, records))
        .collect();
    groups.extend(group_uncorrelated(uncorrelated));

    groups.sort_by(|a, b| {
        b.representative()
            .created_at
            .cmp(&a.representative().created_at)
    });
    groups
}
