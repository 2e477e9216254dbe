use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A captured field value: text, checkbox state, or an unselected radio group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// String form used when writing into a value-bearing control.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Null => String::new(),
        }
    }

    /// Truthiness used for checkbox coercion.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Bool(b) => *b,
            FieldValue::Null => false,
        }
    }

    /// Strict equality against a control's string value (radio matching).
    pub fn matches_text(&self, value: &str) -> bool {
        matches!(self, FieldValue::Text(s) if s == value)
    }

    /// Lenient conversion from stored JSON; numbers become text, containers become null.
    pub fn from_value_lossy(value: &Value) -> FieldValue {
        match value {
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => FieldValue::Text(n.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => FieldValue::Null,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Locator hint for re-finding a field at fill time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorEntry {
    pub key: String,
    pub selector: String,
}

/// Field values in capture order, which is document order.
pub type FieldData = IndexMap<String, FieldValue>;

/// One named, timestamped capture of a page's field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub timestamp: u64,
    #[serde(default)]
    pub data: FieldData,
    #[serde(default)]
    pub selectors: Vec<SelectorEntry>,
}

impl Snapshot {
    pub fn new(name: &str, timestamp: u64, data: FieldData, selectors: Vec<SelectorEntry>) -> Self {
        Snapshot {
            name: name.to_string(),
            timestamp,
            data,
            selectors,
        }
    }

    /// Rebuild a snapshot from stored JSON, substituting defaults for anything malformed.
    /// Returns `None` only when `value` is not an object at all.
    pub fn from_value_lossy(value: &Value) -> Option<Snapshot> {
        let obj = value.as_object()?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let timestamp = obj
            .get("timestamp")
            .and_then(|t| t.as_u64().or_else(|| t.as_f64().map(|f| f.max(0.0) as u64)))
            .unwrap_or(0);

        let data = obj
            .get("data")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_value_lossy(v)))
                    .collect()
            })
            .unwrap_or_default();

        let selectors = obj
            .get("selectors")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| {
                        Some(SelectorEntry {
                            key: e.get("key")?.as_str()?.to_string(),
                            selector: e.get("selector")?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Snapshot {
            name,
            timestamp,
            data,
            selectors,
        })
    }

    /// Hints whose key has no value in `data`. Tolerated, never enforced.
    pub fn stale_selectors(&self) -> Vec<&SelectorEntry> {
        self.selectors
            .iter()
            .filter(|e| !self.data.contains_key(&e.key))
            .collect()
    }
}

/// Usable locator hints by key. Entries with an empty key or selector are
/// dropped; a later entry for the same key replaces an earlier one.
pub fn selector_map(entries: &[SelectorEntry]) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter(|e| !e.key.is_empty() && !e.selector.is_empty())
        .map(|e| (e.key.clone(), e.selector.clone()))
        .collect()
}

/// Display order for a site's snapshots: newest first.
pub fn sort_newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_values_keep_their_json_shape() {
        let data: FieldData = serde_json::from_value(json!({ "a": "x", "b": false, "c": null })).unwrap();
        assert_eq!(data["a"], FieldValue::Text("x".into()));
        assert_eq!(data["b"], FieldValue::Bool(false));
        assert_eq!(data["c"], FieldValue::Null);
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({ "a": "x", "b": false, "c": null }));
    }

    #[test]
    fn text_coercions() {
        assert_eq!(FieldValue::Bool(true).as_text(), "true");
        assert_eq!(FieldValue::Null.as_text(), "");
        assert!(!FieldValue::Text(String::new()).is_truthy());
        assert!(FieldValue::Text("0".into()).is_truthy());
        assert!(!FieldValue::Bool(true).matches_text("true"));
    }

    #[test]
    fn selector_map_drops_empty_entries_and_keeps_the_last() {
        let entries = vec![
            SelectorEntry { key: "a".into(), selector: "#one".into() },
            SelectorEntry { key: "a".into(), selector: "#two".into() },
            SelectorEntry { key: "".into(), selector: "#x".into() },
            SelectorEntry { key: "b".into(), selector: "".into() },
        ];
        let map = selector_map(&entries);
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], "#two");
    }

    #[test]
    fn stale_selectors_point_at_missing_data() {
        let snapshot = Snapshot::new(
            "s",
            1,
            [("a".to_string(), FieldValue::from("x"))].into(),
            vec![
                SelectorEntry { key: "a".into(), selector: "#a".into() },
                SelectorEntry { key: "gone".into(), selector: "#gone".into() },
            ],
        );
        let stale: Vec<&str> = snapshot.stale_selectors().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(stale, vec!["gone"]);
    }
}
