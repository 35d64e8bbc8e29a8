//! Backend REST contract.
//!
//! The engine only talks to the backend through [`Api`], so tests and hosts
//! can substitute their own transport. [`HttpApi`] is the reqwest implementation.

mod error;
mod http;
pub mod query;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{DataItem, OperationPreInvoke, PendingDataItem, PostAction, RowMeta};

pub use error::{ApiError, BusinessError, EntityError};
pub use http::HttpApi;
pub use query::QueryParams;

/// `GET data/...`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchDataResponse {
    #[serde(default)]
    pub data: Vec<DataItem>,
    #[serde(default)]
    pub has_next: bool,
}

/// `GET row-meta/...`, `GET row-meta-new/...` and `POST row-meta/...`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowMetaResponse {
    #[serde(default)]
    pub row: RowMeta,
    #[serde(default)]
    pub post_actions: Vec<PostAction>,
}

/// `PUT data/...` and `POST custom-action/...`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    #[serde(default)]
    pub record: Option<DataItem>,
    #[serde(default)]
    pub post_actions: Vec<PostAction>,
    #[serde(default)]
    pub pre_invoke: Option<OperationPreInvoke>,
}

/// `DELETE data/...` and `POST associate/...`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostActionsResponse {
    #[serde(default)]
    pub post_actions: Vec<PostAction>,
}

/// Calls the orchestration engine makes against the backend.
///
/// `bc_url` is the already-resolved record path (e.g. `customer/7/contact`).
#[async_trait]
pub trait Api: Send + Sync {
    async fn fetch_data(
        &self,
        screen: &str,
        bc_url: &str,
        query: &QueryParams,
    ) -> Result<FetchDataResponse, ApiError>;

    async fn fetch_row_meta(&self, screen: &str, bc_url: &str) -> Result<RowMeta, ApiError>;

    async fn new_row_meta(&self, screen: &str, bc_url: &str)
        -> Result<RowMetaResponse, ApiError>;

    async fn save_data(
        &self,
        screen: &str,
        bc_url: &str,
        data: &PendingDataItem,
    ) -> Result<RecordResponse, ApiError>;

    async fn delete_data(&self, screen: &str, bc_url: &str)
        -> Result<PostActionsResponse, ApiError>;

    async fn custom_action(
        &self,
        screen: &str,
        bc_url: &str,
        data: &PendingDataItem,
        query: &QueryParams,
    ) -> Result<RecordResponse, ApiError>;

    /// Body is either an item array or a map of bc url to item array.
    async fn associate(
        &self,
        screen: &str,
        bc_url: &str,
        body: &Value,
    ) -> Result<PostActionsResponse, ApiError>;

    async fn force_active_row_meta(
        &self,
        screen: &str,
        bc_url: &str,
        data: &PendingDataItem,
    ) -> Result<RowMeta, ApiError>;
}
