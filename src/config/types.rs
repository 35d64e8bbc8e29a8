use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the REST paths are appended to (e.g., "http://localhost:8080/api/v1").
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

/// Behaviour of the orchestration engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Page size of a BC whose descriptor does not set one (default: 30).
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Deepest level a same-BC hierarchy is fetched to (default: 10).
    #[serde(default = "default_hierarchy_max_depth")]
    pub hierarchy_max_depth: usize,
    /// Save dirty BCs before leaving them (default: true).
    #[serde(default = "default_autosave")]
    pub autosave: bool,
    /// Message recorded against an empty required field.
    #[serde(default = "default_required_field_message")]
    pub required_field_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/api/v1".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_page_limit() -> usize {
    30
}

fn default_hierarchy_max_depth() -> usize {
    10
}

fn default_autosave() -> bool {
    true
}

fn default_required_field_message() -> String {
    "This field is mandatory".to_string()
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            hierarchy_max_depth: default_hierarchy_max_depth(),
            autosave: default_autosave(),
            required_field_message: default_required_field_message(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}
