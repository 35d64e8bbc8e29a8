//! Business component descriptors and their runtime state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::filter::{BcFilter, BcSorter};

/// Placeholder in a BC url template replaced by an ancestor cursor.
pub const ID_PLACEHOLDER: &str = ":id";

/// BC description as delivered in a screen descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BcMeta {
    pub name: String,
    #[serde(default)]
    pub parent_name: Option<String>,
    /// Path template such as `customer/:id/contact/:id`.
    pub url: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub default_filter: Vec<BcFilter>,
    #[serde(default)]
    pub default_sort: Vec<BcSorter>,
}

impl BcMeta {
    pub fn new(name: impl Into<String>, parent_name: Option<&str>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: parent_name.map(str::to_string),
            url: url.into(),
            limit: None,
            default_filter: Vec::new(),
            default_sort: Vec::new(),
        }
    }
}

/// Cursor and loading flag of one level of a self-referencing hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepthBcState {
    pub cursor: Option<String>,
    pub loading: bool,
}

/// Live state of a BC on the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BcMetaState {
    pub name: String,
    pub parent_name: Option<String>,
    pub url: String,
    pub cursor: Option<String>,
    pub page: usize,
    /// Page size from the descriptor; the engine default applies when unset.
    pub limit: Option<usize>,
    pub loading: bool,
    pub has_next: bool,
    /// Keyed by depth, starting at 2 (depth 1 is the BC itself).
    pub depth_bc: BTreeMap<usize, DepthBcState>,
}

impl BcMetaState {
    pub fn from_meta(meta: &BcMeta) -> Self {
        Self {
            name: meta.name.clone(),
            parent_name: meta.parent_name.clone(),
            url: meta.url.clone(),
            cursor: None,
            page: 1,
            limit: meta.limit,
            loading: false,
            has_next: false,
            depth_bc: BTreeMap::new(),
        }
    }

    /// Cursor of `depth`, where depth 1 (or none) means the BC's own cursor.
    pub fn cursor_at(&self, depth: Option<usize>) -> Option<&str> {
        match depth {
            None | Some(0) | Some(1) => self.cursor.as_deref(),
            Some(level) => self
                .depth_bc
                .get(&level)
                .and_then(|state| state.cursor.as_deref()),
        }
    }
}
