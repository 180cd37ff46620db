//! Shallow section merge and field-level diff.
//!
//! Merging is one level deep: a partial section's top-level
//! fields replace the default's one for one, anything the partial does not
//! mention is inherited, and non-object values (lists in particular) replace
//! the default wholesale. Nested objects are never merged.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::proposal::FieldChange;

/// Overlay `partial` onto `default` at the top level only.
pub fn merge_section(default: &Value, partial: &Value) -> Value {
    match (default, partial) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (field, value) in overlay {
                merged.insert(field.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => partial.clone(),
    }
}

/// Top-level differences between the canonical section and a candidate.
///
/// Object sections yield one entry per differing field (a missing field reads
/// as `null`). Any other shape is compared as a whole and reported under
/// `section`.
pub fn diff_section(
    section: &str,
    current: &Value,
    candidate: &Value,
) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    match (current, candidate) {
        (Value::Object(old), Value::Object(new)) => {
            let fields = old.keys().chain(new.keys());
            for field in fields {
                if changes.contains_key(field) {
                    continue;
                }
                let before = old.get(field).cloned().unwrap_or(Value::Null);
                let after = new.get(field).cloned().unwrap_or(Value::Null);
                if before != after {
                    changes.insert(field.clone(), FieldChange { old: before, new: after });
                }
            }
        }
        _ if current != candidate => {
            changes.insert(
                section.to_string(),
                FieldChange {
                    old: current.clone(),
                    new: candidate.clone(),
                },
            );
        }
        _ => {}
    }
    changes
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn partial_fields_override_and_rest_inherited() {
        let default = json!({ "title": "T", "description": "D" });
        let merged = merge_section(&default, &json!({ "title": "X" }));
        assert_eq!(merged, json!({ "title": "X", "description": "D" }));
    }

    #[test]
    fn nested_objects_are_replaced_not_merged() {
        let default = json!({ "image": { "url": "a", "name": "b" }, "title": "T" });
        let merged = merge_section(&default, &json!({ "image": { "url": "z" } }));
        assert_eq!(merged, json!({ "image": { "url": "z" }, "title": "T" }));
    }

    #[test]
    fn lists_replace_wholesale() {
        let default = json!([{ "label": "a" }, { "label": "b" }]);
        let partial = json!([{ "label": "c" }]);
        assert_eq!(merge_section(&default, &partial), partial);
    }

    #[test]
    fn extra_fields_survive_merge() {
        let merged = merge_section(&json!({ "a": 1 }), &json!({ "b": 2 }));
        assert_eq!(merged, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let current = json!({ "title": "A", "subtitle": "S" });
        let candidate = json!({ "title": "B", "subtitle": "S" });
        let changes = diff_section("hero", &current, &candidate);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes["title"],
            FieldChange {
                old: json!("A"),
                new: json!("B")
            }
        );
    }

    #[test]
    fn diff_of_identical_sections_is_empty() {
        let v = json!({ "title": "A" });
        assert!(diff_section("hero", &v, &v).is_empty());
        let l = json!([1, 2]);
        assert!(diff_section("achievements", &l, &l).is_empty());
    }

    #[test]
    fn diff_of_lists_is_keyed_by_section() {
        let changes = diff_section("achievements", &json!([1]), &json!([1, 2]));
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["achievements"]);
    }

    #[test]
    fn diff_reports_added_and_removed_fields_as_null() {
        let changes = diff_section("x", &json!({ "a": 1 }), &json!({ "b": 2 }));
        assert_eq!(changes["a"].new, Value::Null);
        assert_eq!(changes["b"].old, Value::Null);
    }
}
