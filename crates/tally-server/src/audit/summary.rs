//! Operation summarizer
//!
//! Derives the human-readable primary-action label and one-line summary for a
//! group of audit records. Label lookups always degrade to the raw entity
//! type or action string; summarization never fails on a non-empty group.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::grouping::OperationGroup;
use super::models::AuditRecord;

/// Display-ready view of one logical operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    pub group_key: String,
    /// Timestamp of the newest member record
    pub timestamp: DateTime<Utc>,
    pub actor_name: Option<String>,
    pub primary_action_label: String,
    pub summary: String,
    pub count: usize,
    /// Distinct entity types among members, first-seen order
    pub entity_types: Vec<String>,
    pub member_records: Vec<AuditRecord>,
    pub inferred: bool,
}

/// Display label for an entity type, falling back to the raw tag
pub fn entity_label(entity_type: &str) -> String {
    match entity_type {
        "product" => "Product",
        "sale" => "Sale",
        "purchase" => "Purchase",
        "customer" => "Customer",
        "debt" => "Debt",
        "payment" => "Payment",
        "stock_adjustment" => "Stock adjustment",
        "user" => "User",
        other => return other.to_string(),
    }
    .to_string()
}

/// Display label for an action, falling back to the raw string
pub fn action_label(action: &str) -> String {
    match action {
        "create" => "created",
        "update" => "updated",
        "delete" => "deleted",
        other => return other.to_string(),
    }
    .to_string()
}

fn distinct_entity_types(records: &[AuditRecord]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for record in records {
        if !types.contains(&record.entity_type) {
            types.push(record.entity_type.clone());
        }
    }
    types
}

/// Specific label for a known `(entity type, action)` pair.
///
/// Pairs not listed here fall through to the generic
/// `"<entity label> <action label>"` form.
fn pair_label(entity_type: &str, action: &str) -> Option<&'static str> {
    Some(match (entity_type, action) {
        ("sale", "create") => "Sale completed",
        ("sale", "delete") => "Sale voided",
        ("payment", "create") => "Payment received",
        ("debt", "create") => "Debt recorded",
        ("purchase", "create") => "Purchase received",
        ("stock_adjustment", "create") => "Stock adjusted",
        _ => return None,
    })
}

/// Derive the primary-action label for a group.
///
/// Precedence: entity-combination special cases first, then the per-pair
/// table for single-entity groups, then a generic count.
pub fn primary_action_label(records: &[AuditRecord]) -> String {
    let types = distinct_entity_types(records);

    let has = |t: &str| types.iter().any(|e| e == t);

    // Combination special cases take priority over everything else.
    if has("payment") && has("debt") {
        return "Debt settled".to_string();
    }
    if records
        .iter()
        .any(|r| r.entity_type == "sale" && r.action == "create")
    {
        return "Sale completed".to_string();
    }

    if let [only] = types.as_slice() {
        let action = records
            .first()
            .map(|r| r.action.as_str())
            .unwrap_or_default();
        if let Some(label) = pair_label(only, action) {
            return label.to_string();
        }
        return format!("{} {}", entity_label(only), action_label(action));
    }

    format!("{} changes", records.len())
}

/// Derive the one-line summary for a group
pub fn summary_line(records: &[AuditRecord]) -> String {
    if let [only] = records {
        return format!(
            "{} {}",
            entity_label(&only.entity_type),
            action_label(&only.action)
        );
    }

    let labels: Vec<String> = distinct_entity_types(records)
        .iter()
        .map(|t| entity_label(t))
        .collect();
    format!("{} changes: {}", records.len(), labels.join(", "))
}

/// Build the display summary for a group.
///
/// Calling this with an empty group is a contract violation on the caller's
/// side, hence the assertion rather than a recoverable error.
pub fn summarize(group: OperationGroup) -> OperationSummary {
    assert!(!group.records.is_empty(), "operation group must have members");

    let representative = group.representative();

    OperationSummary {
        group_key: group.key.clone(),
        timestamp: representative.created_at,
        actor_name: representative.actor_name.clone(),
        primary_action_label: primary_action_label(&group.records),
        summary: summary_line(&group.records),
        count: group.records.len(),
        entity_types: distinct_entity_types(&group.records),
        inferred: group.inferred,
        member_records: group.records,
    }
}
