//! State tree.
//!
//! Every slice is an immutable value: reducers return a new slice and the
//! store swaps the whole tree atomically.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use super::action::{Action, FieldErrors};
use crate::model::{
    BcFilter, BcMetaState, BcSorter, DataItem, MessageType, OperationPostInvokeConfirm,
    OperationPreInvoke, OperationType, PendingDataItem, PopupData, RowMeta, ViewMeta, WidgetMeta,
};

/// Marker trait for slice state objects.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Comparable (PartialEq for detecting changes)
pub trait SliceState: Clone + PartialEq + Default + Send + Sync + 'static {}

/// Application route: `/screen/{screen}/view/{view}/{bc}/{id}/...`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Route {
    pub screen: String,
    pub view: Option<String>,
    pub bc_path: String,
}

impl Route {
    pub fn new(screen: impl Into<String>, view: Option<&str>, bc_path: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            view: view.map(str::to_string),
            bc_path: bc_path.into(),
        }
    }

    /// Parses an application path; `None` when it does not start with `screen/`.
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = path
            .trim_start_matches('#')
            .split('/')
            .filter(|segment| !segment.is_empty());
        if segments.next()? != "screen" {
            return None;
        }
        let screen = segments.next()?.to_string();
        let rest: Vec<&str> = segments.collect();
        let (view, bc_segments) = match rest.split_first() {
            Some((&"view", tail)) => match tail.split_first() {
                Some((view, bc)) => (Some(view.to_string()), bc.to_vec()),
                None => (None, Vec::new()),
            },
            _ => (None, rest),
        };
        Some(Self {
            screen,
            view,
            bc_path: bc_segments.join("/"),
        })
    }

    /// `(bc, id)` pairs of the bc path, in order.
    pub fn bc_cursors(&self) -> Vec<(String, String)> {
        let segments: Vec<&str> = self
            .bc_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        segments
            .chunks(2)
            .filter_map(|pair| match pair {
                [bc, id] => Some((bc.to_string(), id.to_string())),
                _ => None,
            })
            .collect()
    }

    pub fn cursor_of(&self, bc_name: &str) -> Option<String> {
        self.bc_cursors()
            .into_iter()
            .find(|(bc, _)| bc == bc_name)
            .map(|(_, id)| id)
    }

    pub fn to_path(&self) -> String {
        let mut path = format!("/screen/{}", self.screen);
        if let Some(view) = &self.view {
            path.push_str("/view/");
            path.push_str(view);
        }
        if !self.bc_path.is_empty() {
            path.push('/');
            path.push_str(&self.bc_path);
        }
        path
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: MessageType,
    pub message: String,
    /// Follow-up dispatched when the user accepts the notification.
    pub action: Option<Box<Action>>,
    pub action_label: Option<String>,
}

impl Notification {
    pub fn new(kind: MessageType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
            action: None,
            action_label: None,
        }
    }

    pub fn with_action(mut self, label: impl Into<String>, action: Action) -> Self {
        self.action = Some(Box::new(action));
        self.action_label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewErrorKind {
    Network,
    Business,
    System,
}

/// Error shown in the global error slot of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError {
    pub kind: ViewErrorKind,
    pub message: String,
}

/// Dialog waiting for the user before an operation is (re)sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    PreInvoke {
        bc_name: String,
        operation_type: OperationType,
        widget_name: Option<String>,
        pre_invoke: OperationPreInvoke,
        on_success_action: Option<Box<Action>>,
    },
    Confirm {
        bc_name: String,
        operation_type: OperationType,
        widget_name: Option<String>,
        confirm: OperationPostInvokeConfirm,
        on_success_action: Option<Box<Action>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCell {
    pub widget_name: String,
    pub row_id: String,
    pub field_key: String,
}

/// BC metadata of the current screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenState {
    pub screen_name: String,
    pub bo: BTreeMap<String, BcMetaState>,
    pub filters: BTreeMap<String, Vec<BcFilter>>,
    pub sorters: BTreeMap<String, Vec<BcSorter>>,
    pub views: Vec<ViewMeta>,
    pub primary_view: Option<String>,
}

impl SliceState for ScreenState {}

impl ScreenState {
    pub fn bc(&self, bc_name: &str) -> Option<&BcMetaState> {
        self.bo.get(bc_name)
    }

    pub fn cursor(&self, bc_name: &str) -> Option<&str> {
        self.bo.get(bc_name).and_then(|bc| bc.cursor.as_deref())
    }

    pub fn view(&self, name: &str) -> Option<&ViewMeta> {
        self.views.iter().find(|view| view.name == name)
    }
}

/// Loaded records.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataState {
    pub records: BTreeMap<String, Vec<DataItem>>,
    /// Levels 2 and deeper of self-referencing hierarchies.
    pub depth_records: BTreeMap<usize, BTreeMap<String, Vec<DataItem>>>,
}

impl SliceState for DataState {}

impl DataState {
    pub fn records(&self, bc_name: &str) -> &[DataItem] {
        self.records.get(bc_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records of a hierarchy level, level 1 being the BC's own rows.
    pub fn records_at(&self, bc_name: &str, depth: usize) -> &[DataItem] {
        if depth <= 1 {
            return self.records(bc_name);
        }
        self.depth_records
            .get(&depth)
            .and_then(|level| level.get(bc_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn record(&self, bc_name: &str, id: &str) -> Option<&DataItem> {
        self.records(bc_name).iter().find(|record| record.id == id)
    }
}

/// View-level state: widgets, row-meta, pending changes and dialogs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub name: String,
    pub url: String,
    pub widgets: Vec<WidgetMeta>,
    /// Bumped on every view or screen switch.
    pub epoch: u64,
    /// `bc -> bc url -> row meta`
    pub row_meta: BTreeMap<String, BTreeMap<String, RowMeta>>,
    /// `bc -> cursor -> delta`, in edit order.
    pub pending: IndexMap<String, IndexMap<String, PendingDataItem>>,
    /// Client-side required-field failures, `bc -> cursor -> field -> message`.
    pub pending_validation_fails: BTreeMap<String, BTreeMap<String, FieldErrors>>,
    /// Server-reported field errors, `bc -> cursor -> field -> message`.
    pub field_errors: BTreeMap<String, BTreeMap<String, FieldErrors>>,
    pub saving: BTreeSet<String>,
    pub meta_in_progress: BTreeSet<String>,
    pub popup: Option<PopupData>,
    pub modal: Option<Modal>,
    pub error: Option<ViewError>,
    pub selected_cell: Option<SelectedCell>,
}

impl SliceState for ViewState {}

impl ViewState {
    pub fn widget(&self, name: &str) -> Option<&WidgetMeta> {
        self.widgets.iter().find(|widget| widget.name == name)
    }

    /// First widget bound to `bc_name`.
    pub fn widget_of(&self, bc_name: &str) -> Option<&WidgetMeta> {
        self.widgets.iter().find(|widget| widget.bc_name == bc_name)
    }

    pub fn delta(&self, bc_name: &str, cursor: &str) -> Option<&PendingDataItem> {
        self.pending.get(bc_name).and_then(|deltas| deltas.get(cursor))
    }

    pub fn row_meta(&self, bc_name: &str, bc_url: &str) -> Option<&RowMeta> {
        self.row_meta.get(bc_name).and_then(|metas| metas.get(bc_url))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub active: bool,
    pub notifications: Vec<Notification>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            active: true,
            notifications: Vec::new(),
        }
    }
}

impl SliceState for SessionState {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouterState {
    pub route: Option<Route>,
}

impl SliceState for RouterState {}

/// The whole state tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub screen: ScreenState,
    pub data: DataState,
    pub view: ViewState,
    pub session: SessionState,
    pub router: RouterState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_parses_view_and_bc_path() {
        let route = Route::parse("/screen/app/view/card/customer/7/contact/3").unwrap();
        assert_eq!(route.screen, "app");
        assert_eq!(route.view.as_deref(), Some("card"));
        assert_eq!(
            route.bc_cursors(),
            vec![
                ("customer".to_string(), "7".to_string()),
                ("contact".to_string(), "3".to_string())
            ]
        );
        assert_eq!(route.to_path(), "/screen/app/view/card/customer/7/contact/3");
    }

    #[test]
    fn route_rejects_foreign_paths() {
        assert!(Route::parse("/login").is_none());
        let route = Route::parse("screen/app").unwrap();
        assert_eq!(route.view, None);
        assert!(route.bc_cursors().is_empty());
    }

    #[test]
    fn notifications_get_unique_ids() {
        let a = Notification::new(MessageType::Info, "a");
        let b = Notification::new(MessageType::Info, "a");
        assert_ne!(a.id, b.id);
    }
}
