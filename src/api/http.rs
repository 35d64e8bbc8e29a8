use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    Api, ApiError, BusinessError, FetchDataResponse, PostActionsResponse, QueryParams,
    RecordResponse, RowMetaResponse,
};
use crate::config::ApiConfig;
use crate::model::{PendingDataItem, RowMeta};

/// reqwest-backed [`Api`].
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds.into()))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str, screen: &str, bc_url: &str, query: &QueryParams) -> Result<Url, ApiError> {
        let raw = format!(
            "{}/{}/{}/{}",
            self.base_url,
            endpoint,
            screen,
            bc_url.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| ApiError::Client {
            message: format!("Invalid url '{}': {}", raw, e),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        endpoint: &str,
        screen: &str,
        bc_url: &str,
        query: &QueryParams,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(endpoint, screen, bc_url, query)?;
        debug!(method = %method, url = %url, "Backend request");
        Ok(self.client.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Network {
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("/")
                .to_string();
            return Err(ApiError::Redirect { location });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::Network {
            message: format!("Failed to read response body: {}", e),
        })?;

        if status.is_success() {
            let body: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
            return serde_json::from_slice(body).map_err(|e| ApiError::Decode {
                message: e.to_string(),
            });
        }

        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Err(classify_failure(status, &body, &bytes))
    }
}

fn classify_failure(status: StatusCode, body: &Value, raw: &[u8]) -> ApiError {
    let business = BusinessError::from_body(body);
    if status == StatusCode::CONFLICT {
        let message = business
            .as_ref()
            .and_then(|error| error.popup.first().cloned())
            .unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned());
        return ApiError::Conflict { message };
    }
    match business {
        Some(error) => ApiError::Business(error),
        None => ApiError::Status {
            status: status.as_u16(),
            message: String::from_utf8_lossy(raw).into_owned(),
        },
    }
}

#[async_trait]
impl Api for HttpApi {
    async fn fetch_data(
        &self,
        screen: &str,
        bc_url: &str,
        query: &QueryParams,
    ) -> Result<FetchDataResponse, ApiError> {
        let builder = self.request(Method::GET, "data", screen, bc_url, query)?;
        self.send(builder).await
    }

    async fn fetch_row_meta(&self, screen: &str, bc_url: &str) -> Result<RowMeta, ApiError> {
        let builder = self.request(Method::GET, "row-meta", screen, bc_url, &Vec::new())?;
        let response: RowMetaResponse = self.send(builder).await?;
        Ok(response.row)
    }

    async fn new_row_meta(
        &self,
        screen: &str,
        bc_url: &str,
    ) -> Result<RowMetaResponse, ApiError> {
        let builder = self.request(Method::GET, "row-meta-new", screen, bc_url, &Vec::new())?;
        self.send(builder).await
    }

    async fn save_data(
        &self,
        screen: &str,
        bc_url: &str,
        data: &PendingDataItem,
    ) -> Result<RecordResponse, ApiError> {
        let builder = self
            .request(Method::PUT, "data", screen, bc_url, &Vec::new())?
            .json(&json!({ "data": data }));
        self.send(builder).await
    }

    async fn delete_data(
        &self,
        screen: &str,
        bc_url: &str,
    ) -> Result<PostActionsResponse, ApiError> {
        let builder = self.request(Method::DELETE, "data", screen, bc_url, &Vec::new())?;
        self.send(builder).await
    }

    async fn custom_action(
        &self,
        screen: &str,
        bc_url: &str,
        data: &PendingDataItem,
        query: &QueryParams,
    ) -> Result<RecordResponse, ApiError> {
        let builder = self
            .request(Method::POST, "custom-action", screen, bc_url, query)?
            .json(&json!({ "data": data }));
        self.send(builder).await
    }

    async fn associate(
        &self,
        screen: &str,
        bc_url: &str,
        body: &Value,
    ) -> Result<PostActionsResponse, ApiError> {
        let builder = self
            .request(Method::POST, "associate", screen, bc_url, &Vec::new())?
            .json(body);
        self.send(builder).await
    }

    async fn force_active_row_meta(
        &self,
        screen: &str,
        bc_url: &str,
        data: &PendingDataItem,
    ) -> Result<RowMeta, ApiError> {
        let builder = self
            .request(Method::POST, "row-meta", screen, bc_url, &Vec::new())?
            .json(&json!({ "data": data }));
        let response: RowMetaResponse = self.send(builder).await?;
        Ok(response.row)
    }
}
