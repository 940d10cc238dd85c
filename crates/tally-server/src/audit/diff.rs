//! Diff engine
//!
//! Computes a field-level change-set between the old and new snapshots of one
//! audit record, resolving labels and display types through the field
//! registry and applying sensitivity masking before type formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::registry::{self, FieldType};

/// Rendered in place of absent values
pub const NULL_PLACEHOLDER: &str = "—";

/// Mask token for sensitive values
pub const MASK_TOKEN: &str = "****";

/// Suffix appended to formatted currency amounts
pub const CURRENCY_SUFFIX: &str = "UZS";

/// Display tokens for boolean values
pub const BOOL_TRUE: &str = "Yes";
pub const BOOL_FALSE: &str = "No";

/// Kind of change a field underwent.
///
/// Unchanged fields are detected internally and dropped; they are never
/// emitted, so no variant exists for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// One labeled, formatted field-level change
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub field_name: String,
    pub label: String,
    pub old_value: Option<JsonValue>,
    pub new_value: Option<JsonValue>,
    pub change_type: ChangeType,
    pub field_type: FieldType,
    pub sensitive: bool,
    pub old_formatted: String,
    pub new_formatted: String,
}

/// Compute the field changes between two optional snapshots.
///
/// Iteration order is the union of keys from both snapshots: old-snapshot keys
/// first, then keys present only in the new snapshot. JSON `null` values are
/// treated the same as absent keys.
pub fn diff_snapshots(
    entity_type: &str,
    old: Option<&JsonValue>,
    new: Option<&JsonValue>,
) -> Vec<FieldChange> {
    let old_map = old.and_then(|v| v.as_object());
    let new_map = new.and_then(|v| v.as_object());

    let mut keys: Vec<&String> = Vec::new();
    if let Some(map) = old_map {
        keys.extend(map.keys());
    }
    if let Some(map) = new_map {
        let new_only: Vec<&String> = map.keys().filter(|k| !keys.contains(k)).collect();
        keys.extend(new_only);
    }

    let mut changes = Vec::new();

    for key in keys {
        let old_val = old_map.and_then(|m| m.get(key)).filter(|v| !v.is_null());
        let new_val = new_map.and_then(|m| m.get(key)).filter(|v| !v.is_null());

        let change_type = match (old_val, new_val) {
            (None, Some(_)) => ChangeType::Added,
            (Some(_), None) => ChangeType::Removed,
            (Some(o), Some(n)) if o != n => ChangeType::Modified,
            // Equal or both absent: unchanged, not emitted.
            _ => continue,
        };

        let meta = registry::resolve(entity_type, key);

        changes.push(FieldChange {
            field_name: key.clone(),
            label: meta.label.clone(),
            old_value: old_val.cloned(),
            new_value: new_val.cloned(),
            change_type,
            field_type: meta.field_type,
            sensitive: meta.sensitive,
            old_formatted: format_value(old_val, meta.field_type, meta.sensitive),
            new_formatted: format_value(new_val, meta.field_type, meta.sensitive),
        });
    }

    changes
}

/// Format a value for display.
///
/// Masking takes precedence over type formatting. Parse failures for
/// date-like types fall back to the raw string; formatting never fails.
pub fn format_value(value: Option<&JsonValue>, field_type: FieldType, sensitive: bool) -> String {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return NULL_PLACEHOLDER.to_string();
    };

    let raw = stringify(value);

    if sensitive {
        return mask(&raw);
    }

    match field_type {
        FieldType::Currency => format_currency(value).unwrap_or(raw),
        FieldType::Date => format_date(&raw).unwrap_or(raw),
        FieldType::DateTime => format_datetime(&raw).unwrap_or(raw),
        FieldType::Boolean => match value.as_bool() {
            Some(true) => BOOL_TRUE.to_string(),
            Some(false) => BOOL_FALSE.to_string(),
            None => match raw.as_str() {
                "true" => BOOL_TRUE.to_string(),
                "false" => BOOL_FALSE.to_string(),
                _ => raw,
            },
        },
        // Enums are assumed display-ready; strings, numbers and JSON
        // pass through as-is.
        FieldType::Enum | FieldType::String | FieldType::Number | FieldType::Json => raw,
    }
}

/// Mask a sensitive value.
///
/// Values of 4 characters or fewer become the fixed token; longer values get
/// the token plus their literal last 4 characters.
pub fn mask(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= 4 {
        MASK_TOKEN.to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", MASK_TOKEN, tail)
    }
}

fn stringify(value: &JsonValue) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn format_currency(value: &JsonValue) -> Option<String> {
    let amount = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.')?;

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*digit);
    }

    let sign = if negative { "-" } else { "" };
    Some(format!("{}{}.{} {}", sign, grouped, frac_part, CURRENCY_SUFFIX))
}

fn format_date(raw: &str) -> Option<String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%d.%m.%Y").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%d.%m.%Y").to_string());
    }
    None
}

fn format_datetime(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%d.%m.%Y %H:%M").to_string());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(dt.format("%d.%m.%Y %H:%M").to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_diff_emits_only_added() {
        let new = json!({"name": "Cola", "price": 7000});
        let changes = diff_snapshots("product", None, Some(&new));

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Added));
        assert!(changes.iter().all(|c| c.old_value.is_none()));
    }

    #[test]
    fn test_delete_diff_emits_only_removed() {
        let old = json!({"name": "Cola", "price": 7000});
        let changes = diff_snapshots("product", Some(&old), None);

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Removed));
        assert!(changes.iter().all(|c| c.new_value.is_none()));
    }

    #[test]
    fn test_update_diff_mixed() {
        // Spec scenario: price modified, active added, exactly two entries.
        let old = json!({"price": 100});
        let new = json!({"price": 150, "active": true});
        let changes = diff_snapshots("product", Some(&old), Some(&new));

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field_name, "price");
        assert_eq!(changes[0].change_type, ChangeType::Modified);
        assert_eq!(changes[1].field_name, "active");
        assert_eq!(changes[1].change_type, ChangeType::Added);
    }

    #[test]
    fn test_unchanged_fields_dropped() {
        let old = json!({"name": "Cola", "price": 100});
        let new = json!({"name": "Cola", "price": 150});
        let changes = diff_snapshots("product", Some(&old), Some(&new));

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "price");
    }

    #[test]
    fn test_json_null_treated_as_absent() {
        let old = json!({"note": null});
        let new = json!({"note": "paid"});
        let changes = diff_snapshots("debt", Some(&old), Some(&new));

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Added);
    }

    #[test]
    fn test_old_keys_iterate_before_new_only_keys() {
        let old = json!({"price": 100, "stock_quantity": 5});
        let new = json!({"active": false, "price": 200, "stock_quantity": 5});
        let changes = diff_snapshots("product", Some(&old), Some(&new));

        assert_eq!(changes[0].field_name, "price");
        assert_eq!(changes[1].field_name, "active");
    }

    #[test]
    fn test_shared_keys_emit_single_entry() {
        // Keys present in both snapshots must not be walked twice.
        let old = json!({"name": "Cola", "price": 100});
        let new = json!({"name": "Pepsi", "price": 200});
        let changes = diff_snapshots("product", Some(&old), Some(&new));

        let names: Vec<_> = changes.iter().map(|c| c.field_name.as_str()).collect();
        assert_eq!(names, vec!["name", "price"]);
    }

    #[test]
    fn test_mask_short_value() {
        assert_eq!(mask("ab"), "****");
        assert_eq!(mask("abcd"), "****");
    }

    #[test]
    fn test_mask_long_value_keeps_last_four() {
        assert_eq!(mask("5000000"), "****0000");
        assert_eq!(mask("secret-token"), "****oken");
    }

    #[test]
    fn test_sensitive_masking_beats_type_formatting() {
        let value = json!("5000000");
        let formatted = format_value(Some(&value), FieldType::Currency, true);
        assert_eq!(formatted, "****0000");
    }

    #[test]
    fn test_currency_formatting() {
        let value = json!(1234567.5);
        let formatted = format_value(Some(&value), FieldType::Currency, false);
        assert_eq!(formatted, "1 234 567.50 UZS");
    }

    #[test]
    fn test_currency_from_numeric_string() {
        let value = json!("7000");
        let formatted = format_value(Some(&value), FieldType::Currency, false);
        assert_eq!(formatted, "7 000.00 UZS");
    }

    #[test]
    fn test_date_formatting() {
        let value = json!("2026-03-05");
        assert_eq!(format_value(Some(&value), FieldType::Date, false), "05.03.2026");
    }

    #[test]
    fn test_datetime_formatting() {
        let value = json!("2026-03-05T14:30:00Z");
        assert_eq!(
            format_value(Some(&value), FieldType::DateTime, false),
            "05.03.2026 14:30"
        );
    }

    #[test]
    fn test_unparseable_date_falls_back_to_raw() {
        let value = json!("last tuesday");
        assert_eq!(format_value(Some(&value), FieldType::Date, false), "last tuesday");
    }

    #[test]
    fn test_boolean_tokens() {
        assert_eq!(format_value(Some(&json!(true)), FieldType::Boolean, false), BOOL_TRUE);
        assert_eq!(format_value(Some(&json!(false)), FieldType::Boolean, false), BOOL_FALSE);
    }

    #[test]
    fn test_null_placeholder() {
        assert_eq!(format_value(None, FieldType::String, false), NULL_PLACEHOLDER);
        assert_eq!(format_value(Some(&json!(null)), FieldType::String, false), NULL_PLACEHOLDER);
    }

    #[test]
    fn test_change_type_serialization() {
        assert_eq!(serde_json::to_string(&ChangeType::Added).unwrap(), r#""ADDED""#);
        assert_eq!(serde_json::to_string(&ChangeType::Modified).unwrap(), r#""MODIFIED""#);
    }
}
