//! End-to-end scenarios for the grouping, diffing and pagination engine
//!
//! Each test builds a fixed store snapshot and checks the externally
//! observable behavior: group membership, ordering, labels and totals.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

use tally_server::audit::diff::{diff_snapshots, format_value, mask, ChangeType};
use tally_server::audit::memory::MemoryAuditStore;
use tally_server::audit::models::{AuditFilter, AuditRecord};
use tally_server::audit::paginator::list_operations;
use tally_server::audit::registry::FieldType;

fn base_time() -> DateTime<Utc> {
    "2026-05-01T10:00:00Z".parse().unwrap()
}

fn record_at(
    entity_type: &str,
    action: &str,
    actor: Option<Uuid>,
    correlation_id: Option<&str>,
    offset_secs: i64,
) -> AuditRecord {
    AuditRecord {
        id: Uuid::new_v4(),
        entity_type: entity_type.to_string(),
        entity_id: "1".to_string(),
        action: action.to_string(),
        old_snapshot: None,
        new_snapshot: None,
        actor_id: actor,
        actor_name: Some("Aziz".to_string()),
        ip_address: None,
        user_agent: None,
        correlation_id: correlation_id.map(String::from),
        created_at: base_time() + Duration::seconds(offset_secs),
    }
}

// Two records sharing a correlation id at 10:00:01 and 10:00:03 collapse
// into one operation stamped with the newer timestamp.
#[tokio::test]
async fn scenario_correlated_pair_forms_one_operation() {
    let store = MemoryAuditStore::new();
    store.seed(record_at("sale", "create", None, Some("X"), 1));
    store.seed(record_at("payment", "create", None, Some("X"), 3));

    let page = list_operations(&store, &AuditFilter::default(), 1, 10)
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    let op = &page.items[0];
    assert_eq!(op.group_key, "X");
    assert_eq!(op.count, 2);
    assert_eq!(op.timestamp, base_time() + Duration::seconds(3));
    assert!(op
        .member_records
        .iter()
        .all(|r| r.correlation_id.as_deref() == Some("X")));
}

// Uncorrelated records at 10:00:00, 10:00:02 and 10:00:06 for one actor form
// two groups: the 6s record is outside the 3s window of the first group's
// anchor.
#[tokio::test]
async fn scenario_uncorrelated_window_split() {
    let store = MemoryAuditStore::new();
    let actor = Some(Uuid::new_v4());
    store.seed(record_at("product", "update", actor, None, 0));
    store.seed(record_at("product", "update", actor, None, 2));
    store.seed(record_at("product", "update", actor, None, 6));

    let page = list_operations(&store, &AuditFilter::default(), 1, 10)
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].count, 1);
    assert_eq!(page.items[0].timestamp, base_time() + Duration::seconds(6));
    assert_eq!(page.items[1].count, 2);
}

// Three records where the third is within 3s of the second but not of the
// first: the window anchors on the first member, so the third starts a new
// group.
#[tokio::test]
async fn scenario_window_anchors_on_first_member() {
    let store = MemoryAuditStore::new();
    let actor = Some(Uuid::new_v4());
    store.seed(record_at("product", "update", actor, None, 0));
    store.seed(record_at("product", "update", actor, None, 2));
    store.seed(record_at("product", "update", actor, None, 4));

    let page = list_operations(&store, &AuditFilter::default(), 1, 10)
        .await
        .unwrap();

    // Walking newest-first: {4s, 2s} anchor at 4s, then {0s} alone.
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].count, 2);
    assert_eq!(page.items[1].count, 1);
}

#[tokio::test]
async fn scenario_update_diff() {
    let old = json!({"price": 100});
    let new = json!({"price": 150, "active": true});

    let changes = diff_snapshots("product", Some(&old), Some(&new));

    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].field_name, "price");
    assert_eq!(changes[0].change_type, ChangeType::Modified);
    assert_eq!(changes[0].old_value, Some(json!(100)));
    assert_eq!(changes[0].new_value, Some(json!(150)));
    assert_eq!(changes[1].field_name, "active");
    assert_eq!(changes[1].change_type, ChangeType::Added);
    assert_eq!(changes[1].old_value, None);
}

#[tokio::test]
async fn scenario_single_member_summary() {
    let store = MemoryAuditStore::new();
    store.seed(record_at("product", "create", None, None, 0));

    let page = list_operations(&store, &AuditFilter::default(), 1, 10)
        .await
        .unwrap();

    assert_eq!(page.items[0].summary, "Product created");
}

#[test]
fn masking_rules() {
    assert_eq!(mask("5000000"), "****0000");
    assert_eq!(mask("ab"), "****");

    // Masking wins over type formatting.
    let value = json!("5000000");
    assert_eq!(format_value(Some(&value), FieldType::Currency, true), "****0000");
    assert_eq!(
        format_value(Some(&value), FieldType::Currency, false),
        "5 000 000.00 UZS"
    );
}

// Walking every fast-path page of a fixed snapshot yields exactly
// total_elements groups, with no duplicate keys and no omissions.
#[tokio::test]
async fn pagination_completeness() {
    let store = MemoryAuditStore::new();
    for i in 0..9 {
        store.seed(record_at(
            "product",
            "update",
            None,
            Some(&format!("op-{}", i)),
            -(i * 30),
        ));
    }
    for i in 0..6 {
        store.seed(record_at(
            "product",
            "update",
            Some(Uuid::new_v4()),
            None,
            -(1_000 + i * 30),
        ));
    }

    let filter = AuditFilter::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut page_no = 1;

    loop {
        let page = list_operations(&store, &filter, page_no, 4).await.unwrap();
        assert_eq!(page.total_elements, 15);
        for op in &page.items {
            assert!(seen.insert(op.group_key.clone()), "duplicate group key");
        }
        if page.last {
            break;
        }
        page_no += 1;
    }

    assert_eq!(seen.len(), 15);
}

// Grouping is idempotent: two reads of an unchanged store return the same
// groups in the same order.
#[tokio::test]
async fn repeated_queries_are_stable() {
    let store = MemoryAuditStore::new();
    let actor = Some(Uuid::new_v4());
    store.seed(record_at("product", "update", actor, None, 0));
    store.seed(record_at("product", "update", actor, None, 1));
    store.seed(record_at("sale", "create", actor, Some("op-1"), 10));

    let first = list_operations(&store, &AuditFilter::default(), 1, 10)
        .await
        .unwrap();
    let second = list_operations(&store, &AuditFilter::default(), 1, 10)
        .await
        .unwrap();

    let first_keys: Vec<_> = first.items.iter().map(|i| i.group_key.clone()).collect();
    let second_keys: Vec<_> = second.items.iter().map(|i| i.group_key.clone()).collect();
    assert_eq!(first_keys, second_keys);
}
