//! Error taxonomy of backend calls.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Field-level rejection attached to a BC.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityError {
    #[serde(default)]
    pub bc_name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Structured rejection body: `{"error": {"entity": ..., "popup": [...]}}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BusinessError {
    #[serde(default)]
    pub entity: Option<EntityError>,
    #[serde(default)]
    pub popup: Vec<String>,
}

impl BusinessError {
    /// Extracts the business error from a response body, if it carries one.
    pub fn from_body(body: &Value) -> Option<Self> {
        let error = body.get("error")?;
        if error.get("entity").is_none() && error.get("popup").is_none() {
            return None;
        }
        serde_json::from_value(error.clone()).ok()
    }
}

/// Errors that can occur while talking to the backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No HTTP response at all
    #[error("Network error: {message}")]
    Network { message: String },

    /// Session expired
    #[error("Unauthorized")]
    Unauthorized,

    /// Optimistic-concurrency rejection
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Server asked the client to navigate elsewhere
    #[error("Redirect to '{location}'")]
    Redirect { location: String },

    /// Business rule rejection with field and popup messages
    #[error("Business error: {}", .0.popup.join("; "))]
    Business(BusinessError),

    /// Any other non-success status
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// HTTP client could not be built
    #[error("HTTP client error: {message}")]
    Client { message: String },
}

impl ApiError {
    /// Stable error code used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Network { .. } => "network_error",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Redirect { .. } => "redirect",
            ApiError::Business(_) => "business_error",
            ApiError::Status { .. } => "http_status",
            ApiError::Decode { .. } => "decode_error",
            ApiError::Client { .. } => "client_error",
        }
    }

    /// Per-field messages reported by the server, empty for other errors.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            ApiError::Business(BusinessError {
                entity: Some(entity),
                ..
            }) => entity.fields.clone(),
            _ => BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn business_error_requires_entity_or_popup() {
        assert!(BusinessError::from_body(&json!({"error": {"message": "x"}})).is_none());
        let error = BusinessError::from_body(&json!({
            "success": false,
            "error": {"entity": {"bcName": "customer", "fields": {"name": "Too long"}}}
        }))
        .unwrap();
        let api_error = ApiError::Business(error);
        assert_eq!(api_error.kind(), "business_error");
        assert_eq!(
            api_error.field_errors().get("name").map(String::as_str),
            Some("Too long")
        );
    }

    #[test]
    fn non_business_errors_have_no_field_errors() {
        assert!(ApiError::Unauthorized.field_errors().is_empty());
        assert_eq!(
            ApiError::Status {
                status: 500,
                message: "boom".into()
            }
            .to_string(),
            "Unexpected status 500: boom"
        );
    }
}
