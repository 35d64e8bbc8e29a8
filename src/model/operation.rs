//! Operation descriptors and the server-declared follow-ups around them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation role. The five CRUD-like roles get dedicated workflows; anything
/// else is a custom business action posted to `custom-action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationType {
    Create,
    Save,
    Delete,
    Associate,
    CancelCreate,
    Custom(String),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Create => "create",
            OperationType::Save => "save",
            OperationType::Delete => "delete",
            OperationType::Associate => "associate",
            OperationType::CancelCreate => "cancel-create",
            OperationType::Custom(name) => name,
        }
    }

    pub fn is_crud(&self) -> bool {
        !matches!(self, OperationType::Custom(_))
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }
}

impl From<String> for OperationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "create" => OperationType::Create,
            "save" => OperationType::Save,
            "delete" => OperationType::Delete,
            "associate" => OperationType::Associate,
            "cancel-create" => OperationType::CancelCreate,
            _ => OperationType::Custom(value),
        }
    }
}

impl From<&str> for OperationType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<OperationType> for String {
    fn from(value: OperationType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreInvokeType {
    Confirm,
    Info,
    Error,
}

/// Prompt the client must show before an operation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPreInvoke {
    #[serde(rename = "type")]
    pub kind: PreInvokeType,
    #[serde(default)]
    pub message: String,
}

/// A button the row-meta exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub bc_key: Option<String>,
    #[serde(default)]
    pub pre_invoke: Option<OperationPreInvoke>,
    #[serde(default)]
    pub auto_save_before: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationGroup {
    #[serde(default)]
    pub text: String,
    pub actions: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationItem {
    Group(OperationGroup),
    Single(Operation),
}

/// Groups expanded into a flat operation list, in display order.
pub fn flatten_operations(items: &[OperationItem]) -> Vec<&Operation> {
    let mut flat = Vec::new();
    for item in items {
        match item {
            OperationItem::Single(operation) => flat.push(operation),
            OperationItem::Group(group) => flat.extend(group.actions.iter()),
        }
    }
    flat
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrillDownType {
    Inner,
    Relative,
    RelativeNew,
    External,
    ExternalNew,
}

impl DrillDownType {
    pub fn is_external(&self) -> bool {
        matches!(self, DrillDownType::External | DrillDownType::ExternalNew)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

/// Client-side follow-up declared by the server after a successful mutation.
///
/// Unknown `type`s are kept as [`OperationPostInvoke::Other`] for the host
/// application to interpret.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationPostInvoke {
    RefreshBc {
        bc_name: String,
    },
    DrillDown {
        url: String,
        drill_down_type: Option<DrillDownType>,
    },
    ShowMessage {
        message_type: MessageType,
        message_text: String,
    },
    DownloadFile {
        file_id: String,
    },
    DownloadFileByUrl {
        url: String,
    },
    PostDelete,
    Other {
        kind: String,
        payload: Map<String, Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmType {
    Confirm,
    ConfirmText,
}

/// Server request to confirm an operation before it is re-sent with `_confirm`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationPostInvokeConfirm {
    pub kind: ConfirmType,
    pub message: String,
}

/// One entry of a response's `postActions` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum PostAction {
    Invoke(OperationPostInvoke),
    Confirm(OperationPostInvokeConfirm),
}

fn text(payload: &Map<String, Value>, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl From<Value> for PostAction {
    fn from(value: Value) -> Self {
        let payload = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        let kind = text(&payload, "type");
        let invoke = match kind.as_str() {
            "refreshBC" => OperationPostInvoke::RefreshBc {
                bc_name: text(&payload, "bc"),
            },
            "drillDown" => OperationPostInvoke::DrillDown {
                url: text(&payload, "url"),
                drill_down_type: payload
                    .get("drillDownType")
                    .cloned()
                    .and_then(|raw| serde_json::from_value(raw).ok()),
            },
            "showMessage" => OperationPostInvoke::ShowMessage {
                message_type: payload
                    .get("messageType")
                    .cloned()
                    .and_then(|raw| serde_json::from_value(raw).ok())
                    .unwrap_or(MessageType::Info),
                message_text: text(&payload, "messageText"),
            },
            "downloadFile" => OperationPostInvoke::DownloadFile {
                file_id: text(&payload, "fileId"),
            },
            "downloadFileByUrl" => OperationPostInvoke::DownloadFileByUrl {
                url: text(&payload, "url"),
            },
            "postDelete" => OperationPostInvoke::PostDelete,
            "confirm" | "confirmText" => {
                let confirm_kind = if kind == "confirm" {
                    ConfirmType::Confirm
                } else {
                    ConfirmType::ConfirmText
                };
                return PostAction::Confirm(OperationPostInvokeConfirm {
                    kind: confirm_kind,
                    message: text(&payload, "message"),
                });
            }
            _ => OperationPostInvoke::Other { kind, payload },
        };
        PostAction::Invoke(invoke)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_type_round_trips_known_roles() {
        assert_eq!(OperationType::from("cancel-create"), OperationType::CancelCreate);
        assert_eq!(
            OperationType::from("approve"),
            OperationType::Custom("approve".into())
        );
        assert!(OperationType::Save.is_crud());
        assert!(!OperationType::custom("approve").is_crud());
        assert_eq!(String::from(OperationType::CancelCreate), "cancel-create");
    }

    #[test]
    fn post_actions_parse_known_and_unknown_variants() {
        let actions: Vec<PostAction> = serde_json::from_value(json!([
            {"type": "refreshBC", "bc": "contact"},
            {"type": "drillDown", "url": "screen/x", "drillDownType": "inner"},
            {"type": "confirmText", "message": "Type reason"},
            {"type": "openChat", "room": 4}
        ]))
        .unwrap();

        assert_eq!(
            actions[0],
            PostAction::Invoke(OperationPostInvoke::RefreshBc {
                bc_name: "contact".into()
            })
        );
        assert_eq!(
            actions[1],
            PostAction::Invoke(OperationPostInvoke::DrillDown {
                url: "screen/x".into(),
                drill_down_type: Some(DrillDownType::Inner),
            })
        );
        assert!(matches!(
            &actions[2],
            PostAction::Confirm(OperationPostInvokeConfirm { kind: ConfirmType::ConfirmText, .. })
        ));
        match &actions[3] {
            PostAction::Invoke(OperationPostInvoke::Other { kind, payload }) => {
                assert_eq!(kind, "openChat");
                assert_eq!(payload.get("room"), Some(&json!(4)));
            }
            other => panic!("Expected Other, got {:?}", other),
        }
    }

    #[test]
    fn groups_are_flattened_in_order() {
        let items: Vec<OperationItem> = serde_json::from_value(json!([
            {"type": "save", "text": "Save"},
            {"text": "More", "actions": [
                {"type": "approve", "preInvoke": {"type": "confirm", "message": "Sure?"}},
                {"type": "delete"}
            ]}
        ]))
        .unwrap();
        let flat: Vec<&str> = flatten_operations(&items)
            .iter()
            .map(|operation| operation.operation_type.as_str())
            .collect();
        assert_eq!(flat, vec!["save", "approve", "delete"]);
    }
}
