//! Field registry
//!
//! Static, per-entity-type metadata used by the diff engine to label and
//! format field changes. Lookup is pure and total: unknown `(entity, field)`
//! pairs fall back to the raw field name as label, `String` type, and
//! non-sensitive. Initialization data only; safe for unsynchronized
//! concurrent reads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Display type of a registered field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Number,
    Currency,
    Date,
    #[serde(rename = "DATETIME")]
    DateTime,
    Boolean,
    Enum,
    Json,
}

/// Static metadata for a registered field
#[derive(Debug, Clone, Copy)]
struct FieldMeta {
    label: &'static str,
    field_type: FieldType,
    sensitive: bool,
}

/// Resolved metadata for any `(entity, field)` pair, registered or not
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub label: String,
    pub field_type: FieldType,
    pub sensitive: bool,
}

/// Field names that are masked regardless of entity type or registry entry
const ALWAYS_SENSITIVE: &[&str] = &[
    "password",
    "password_hash",
    "national_id",
    "bank_account",
    "card_number",
    "salary",
    "pin_code",
];

macro_rules! field {
    ($name:literal, $label:literal, $ty:ident) => {
        ($name, FieldMeta { label: $label, field_type: FieldType::$ty, sensitive: false })
    };
    ($name:literal, $label:literal, $ty:ident, sensitive) => {
        ($name, FieldMeta { label: $label, field_type: FieldType::$ty, sensitive: true })
    };
}

static REGISTRY: LazyLock<HashMap<&'static str, HashMap<&'static str, FieldMeta>>> =
    LazyLock::new(|| {
        let mut registry = HashMap::new();

        registry.insert(
            "product",
            HashMap::from([
                field!("name", "Name", String),
                field!("barcode", "Barcode", String),
                field!("category", "Category", Enum),
                field!("price", "Selling price", Currency),
                field!("cost_price", "Cost price", Currency),
                field!("stock_quantity", "Stock quantity", Number),
                field!("unit", "Unit", Enum),
                field!("active", "Active", Boolean),
                field!("expiry_date", "Expiry date", Date),
                field!("created_at", "Created at", DateTime),
            ]),
        );

        registry.insert(
            "sale",
            HashMap::from([
                field!("total", "Total", Currency),
                field!("discount", "Discount", Currency),
                field!("payment_method", "Payment method", Enum),
                field!("items", "Items", Json),
                field!("customer_name", "Customer", String),
                field!("completed", "Completed", Boolean),
                field!("sold_at", "Sold at", DateTime),
            ]),
        );

        registry.insert(
            "purchase",
            HashMap::from([
                field!("supplier_name", "Supplier", String),
                field!("total", "Total", Currency),
                field!("items", "Items", Json),
                field!("received", "Received", Boolean),
                field!("received_at", "Received at", DateTime),
            ]),
        );

        registry.insert(
            "customer",
            HashMap::from([
                field!("name", "Name", String),
                field!("phone", "Phone", String),
                field!("email", "Email", String),
                field!("address", "Address", String),
                field!("credit_limit", "Credit limit", Currency),
                field!("national_id", "National ID", String, sensitive),
                field!("birth_date", "Birth date", Date),
                field!("active", "Active", Boolean),
            ]),
        );

        registry.insert(
            "debt",
            HashMap::from([
                field!("amount", "Amount", Currency),
                field!("remaining", "Remaining", Currency),
                field!("due_date", "Due date", Date),
                field!("status", "Status", Enum),
                field!("note", "Note", String),
            ]),
        );

        registry.insert(
            "payment",
            HashMap::from([
                field!("amount", "Amount", Currency),
                field!("method", "Method", Enum),
                field!("paid_at", "Paid at", DateTime),
                field!("note", "Note", String),
            ]),
        );

        registry.insert(
            "stock_adjustment",
            HashMap::from([
                field!("quantity_delta", "Quantity change", Number),
                field!("reason", "Reason", Enum),
                field!("note", "Note", String),
            ]),
        );

        registry.insert(
            "user",
            HashMap::from([
                field!("username", "Username", String),
                field!("full_name", "Full name", String),
                field!("role", "Role", Enum),
                field!("password", "Password", String, sensitive),
                field!("salary", "Salary", Currency, sensitive),
                field!("active", "Active", Boolean),
            ]),
        );

        registry
    });

/// Resolve metadata for a field of an entity type.
///
/// Never fails: unregistered pairs fall back to the field name itself with
/// `String` type. The cross-entity sensitive set overrides any registry entry.
pub fn resolve(entity_type: &str, field_name: &str) -> ResolvedField {
    let meta = REGISTRY
        .get(entity_type)
        .and_then(|fields| fields.get(field_name));

    let forced_sensitive = ALWAYS_SENSITIVE.contains(&field_name);

    match meta {
        Some(meta) => ResolvedField {
            label: meta.label.to_string(),
            field_type: meta.field_type,
            sensitive: meta.sensitive || forced_sensitive,
        },
        None => ResolvedField {
            label: field_name.to_string(),
            field_type: FieldType::String,
            sensitive: forced_sensitive,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_field() {
        let meta = resolve("product", "price");
        assert_eq!(meta.label, "Selling price");
        assert_eq!(meta.field_type, FieldType::Currency);
        assert!(!meta.sensitive);
    }

    #[test]
    fn test_unknown_field_falls_back() {
        let meta = resolve("product", "warehouse_zone");
        assert_eq!(meta.label, "warehouse_zone");
        assert_eq!(meta.field_type, FieldType::String);
        assert!(!meta.sensitive);
    }

    #[test]
    fn test_unknown_entity_falls_back() {
        let meta = resolve("shipment", "weight");
        assert_eq!(meta.label, "weight");
        assert_eq!(meta.field_type, FieldType::String);
    }

    #[test]
    fn test_registry_sensitive_field() {
        let meta = resolve("user", "salary");
        assert!(meta.sensitive);
        assert_eq!(meta.field_type, FieldType::Currency);
    }

    #[test]
    fn test_always_sensitive_overrides_unknown_entity() {
        // Not registered anywhere, but in the cross-entity sensitive set.
        let meta = resolve("supplier", "bank_account");
        assert!(meta.sensitive);
    }

    #[test]
    fn test_field_type_serialization() {
        assert_eq!(serde_json::to_string(&FieldType::DateTime).unwrap(), r#""DATETIME""#);
        assert_eq!(serde_json::to_string(&FieldType::Currency).unwrap(), r#""CURRENCY""#);
    }
}
