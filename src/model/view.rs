//! Screen, view and widget descriptors.

use serde::{Deserialize, Serialize};

use super::bc::BcMeta;
use super::operation::OperationType;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessObject {
    #[serde(default)]
    pub bc: Vec<BcMeta>,
}

/// Screen descriptor served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenMeta {
    pub name: String,
    #[serde(default)]
    pub bo: BusinessObject,
    #[serde(default)]
    pub views: Vec<ViewMeta>,
    #[serde(default)]
    pub primary: Option<String>,
}

impl ScreenMeta {
    pub fn view(&self, name: &str) -> Option<&ViewMeta> {
        self.views.iter().find(|view| view.name == name)
    }

    /// The view opened when the route names none: `primary`, else the first one.
    pub fn default_view(&self) -> Option<&ViewMeta> {
        self.primary
            .as_deref()
            .and_then(|primary| self.view(primary))
            .or_else(|| self.views.first())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewMeta {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub widgets: Vec<WidgetMeta>,
}

impl ViewMeta {
    pub fn widget(&self, name: &str) -> Option<&WidgetMeta> {
        self.widgets.iter().find(|widget| widget.name == name)
    }

    pub fn widgets_of<'a>(&'a self, bc_name: &'a str) -> impl Iterator<Item = &'a WidgetMeta> + 'a {
        self.widgets
            .iter()
            .filter(move |widget| widget.bc_name == bc_name)
    }
}

/// Widget field; only the keys the engine reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetField {
    pub key: String,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub popup_bc_name: Option<String>,
    #[serde(default)]
    pub assoc_value_key: Option<String>,
}

/// One level of a cross-BC hierarchy widget below its root BC.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyLevel {
    pub bc_name: String,
    #[serde(default)]
    pub assoc_value_key: Option<String>,
    #[serde(default)]
    pub radio: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    #[serde(default)]
    pub hierarchy: Vec<HierarchyLevel>,
    #[serde(default)]
    pub hierarchy_same_bc: bool,
    #[serde(default)]
    pub hierarchy_parent_key: Option<String>,
    #[serde(default)]
    pub hierarchy_traverse: bool,
    #[serde(default)]
    pub hierarchy_group_selection: bool,
    #[serde(default)]
    pub hierarchy_radio: bool,
    /// Custom operation used in place of the standard save.
    #[serde(default)]
    pub default_save: Option<OperationType>,
    #[serde(default)]
    pub disable_notification: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMeta {
    pub name: String,
    #[serde(default, rename = "type")]
    pub widget_type: String,
    pub bc_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<WidgetField>,
    #[serde(default)]
    pub options: WidgetOptions,
}

impl WidgetMeta {
    pub fn new(name: impl Into<String>, widget_type: impl Into<String>, bc_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            widget_type: widget_type.into(),
            bc_name: bc_name.into(),
            ..Self::default()
        }
    }

    pub fn is_hierarchy(&self) -> bool {
        self.options.hierarchy_same_bc || !self.options.hierarchy.is_empty()
    }

    pub fn is_popup(&self) -> bool {
        matches!(self.widget_type.as_str(), "AssocListPopup" | "PickListPopup")
    }

    /// Parent-key field of a same-BC hierarchy.
    pub fn parent_key(&self) -> &str {
        self.options
            .hierarchy_parent_key
            .as_deref()
            .unwrap_or("parentId")
    }

    /// BC names of a cross-BC hierarchy, root first.
    pub fn hierarchy_bcs(&self) -> Vec<&str> {
        std::iter::once(self.bc_name.as_str())
            .chain(self.options.hierarchy.iter().map(|level| level.bc_name.as_str()))
            .collect()
    }
}

/// Association popup currently open over the view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupData {
    pub bc_name: String,
    /// BC owning the multivalue field the popup edits.
    #[serde(default)]
    pub callee_bc_name: Option<String>,
    #[serde(default)]
    pub associate_field_key: Option<String>,
    #[serde(default)]
    pub assoc_value_key: Option<String>,
    #[serde(default)]
    pub widget_name: Option<String>,
    /// Active popups commit through the associate endpoint on confirm.
    #[serde(default)]
    pub active: bool,
}
