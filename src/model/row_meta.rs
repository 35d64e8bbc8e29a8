//! Server-computed per-record metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::data::{id_value, PendingDataItem};
use super::operation::{flatten_operations, Operation, OperationItem, OperationType};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowMetaField {
    pub key: String,
    #[serde(default)]
    pub current_value: Value,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub force_active: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub drill_down: Option<String>,
    #[serde(default)]
    pub drill_down_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowMeta {
    #[serde(default)]
    pub fields: Vec<RowMetaField>,
    #[serde(default)]
    pub actions: Vec<OperationItem>,
}

impl RowMeta {
    pub fn field(&self, key: &str) -> Option<&RowMetaField> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn is_disabled(&self, key: &str) -> bool {
        self.field(key).is_some_and(|field| field.disabled)
    }

    pub fn is_force_active(&self, key: &str) -> bool {
        self.field(key).is_some_and(|field| field.force_active)
    }

    /// `id` seeded by `row-meta-new` for a draft record.
    pub fn draft_id(&self) -> Option<String> {
        id_value(&self.field("id")?.current_value)
    }

    pub fn operations(&self) -> Vec<&Operation> {
        flatten_operations(&self.actions)
    }

    pub fn operation(&self, operation_type: &OperationType) -> Option<&Operation> {
        self.operations()
            .into_iter()
            .find(|operation| &operation.operation_type == operation_type)
    }

    /// Copy of `delta` without the keys of disabled fields.
    pub fn strip_disabled(&self, delta: &PendingDataItem) -> PendingDataItem {
        delta
            .iter()
            .filter(|(key, _)| !self.is_disabled(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
