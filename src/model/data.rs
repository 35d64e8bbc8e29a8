//! Records, pending deltas and association payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `vstamp` of a draft record that the server has not persisted yet.
pub const NEW_RECORD_VSTAMP: i64 = -1;

/// Delta key marking an association popup row as linked (`true`) or unlinked (`false`).
pub const ASSOCIATE_KEY: &str = "_associate";

/// Delta key carrying the display value of an associated row.
pub const ASSOCIATE_VALUE_KEY: &str = "_value";

/// Sparse field-name to value overrides for one record.
pub type PendingDataItem = Map<String, Value>;

/// A record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub id: String,
    #[serde(default)]
    pub vstamp: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DataItem {
    pub fn new(id: impl Into<String>, vstamp: i64) -> Self {
        Self {
            id: id.into(),
            vstamp,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter, mostly for fixtures.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// `true` for a draft created by `row-meta-new` that was never saved.
    pub fn is_draft(&self) -> bool {
        self.vstamp == NEW_RECORD_VSTAMP
    }

    /// The `_associate` flag the server sent for this row, if any.
    pub fn associated(&self) -> Option<bool> {
        self.fields.get(ASSOCIATE_KEY).and_then(Value::as_bool)
    }

    /// Record with `delta` overlaid on top of the stored fields.
    ///
    /// `id` and `vstamp` keys in the delta never override the stored ones: the
    /// version stamp echoed to the server is always the last one observed.
    pub fn merged(&self, delta: Option<&PendingDataItem>) -> DataItem {
        let mut merged = self.clone();
        if let Some(delta) = delta {
            for (key, value) in delta {
                if key == "id" || key == "vstamp" {
                    continue;
                }
                merged.fields.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    /// Flat JSON object view (`id`, `vstamp` and all fields).
    pub fn to_object(&self) -> Map<String, Value> {
        let mut object = self.fields.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert("vstamp".to_string(), Value::from(self.vstamp));
        object
    }
}

/// Delta entry written when a row is toggled in an association popup.
pub fn association_delta(id: &str, associate: bool, value: Value) -> PendingDataItem {
    let mut delta = Map::new();
    delta.insert("id".to_string(), Value::String(id.to_string()));
    delta.insert(ASSOCIATE_KEY.to_string(), Value::Bool(associate));
    delta.insert(ASSOCIATE_VALUE_KEY.to_string(), value);
    delta
}

/// Reads the `_associate` flag of a delta entry.
pub fn delta_associate(delta: &PendingDataItem) -> Option<bool> {
    delta.get(ASSOCIATE_KEY).and_then(Value::as_bool)
}

/// `true` when the delta only carries association bookkeeping.
pub fn is_association_delta(delta: &PendingDataItem) -> bool {
    delta.contains_key(ASSOCIATE_KEY)
}

/// Record id carried by a field value (string or number).
pub fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Whether a value counts as "not filled in" for required-field checks.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// One entry of a multivalue field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultivalueSingleValue {
    pub id: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl MultivalueSingleValue {
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value,
            options: Map::new(),
        }
    }

    /// Parses a multivalue field, tolerating a missing or malformed value.
    pub fn list_from(value: Option<&Value>) -> Vec<MultivalueSingleValue> {
        value
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    pub fn list_to_value(items: &[MultivalueSingleValue]) -> Value {
        serde_json::to_value(items).unwrap_or(Value::Array(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_flattened_fields() {
        let item: DataItem =
            serde_json::from_value(json!({"id": "7", "vstamp": 2, "name": "Ann"})).unwrap();
        assert_eq!(item.id, "7");
        assert_eq!(item.vstamp, 2);
        assert_eq!(item.get("name"), Some(&json!("Ann")));
    }

    #[test]
    fn merged_overlays_delta_but_keeps_vstamp() {
        let item = DataItem::new("7", 2).with_field("name", json!("Ann"));
        let mut delta = PendingDataItem::new();
        delta.insert("name".into(), json!("Bob"));
        delta.insert("vstamp".into(), json!(99));

        let merged = item.merged(Some(&delta));
        assert_eq!(merged.get("name"), Some(&json!("Bob")));
        assert_eq!(merged.vstamp, 2);
        assert_eq!(item.merged(None), item);
    }

    #[test]
    fn association_delta_shape() {
        let delta = association_delta("3", true, json!("Three"));
        assert_eq!(
            Value::Object(delta.clone()),
            json!({"id": "3", "_associate": true, "_value": "Three"})
        );
        assert_eq!(delta_associate(&delta), Some(true));
        assert!(is_association_delta(&delta));
    }

    #[test]
    fn id_value_accepts_strings_and_numbers() {
        assert_eq!(id_value(&json!("7")), Some("7".to_string()));
        assert_eq!(id_value(&json!(7)), Some("7".to_string()));
        assert_eq!(id_value(&json!("")), None);
        assert_eq!(id_value(&json!(null)), None);
    }

    #[test]
    fn empty_value_detection() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&Value::Null)));
        assert!(is_empty_value(Some(&json!("  "))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!(false))));
    }

    #[test]
    fn multivalue_list_tolerates_garbage() {
        assert!(MultivalueSingleValue::list_from(Some(&json!("oops"))).is_empty());
        let list = MultivalueSingleValue::list_from(Some(&json!([{"id": "1", "value": "One"}])));
        assert_eq!(list, vec![MultivalueSingleValue::new("1", json!("One"))]);
    }
}
