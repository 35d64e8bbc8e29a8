//! Actions flowing through the dispatch bus.

use std::collections::BTreeMap;

use serde_json::Value;

use super::state::{Notification, Route, ViewError};
use crate::model::{
    BcFilter, BcSorter, DataItem, DrillDownType, MultivalueSingleValue, OperationPostInvoke,
    OperationPostInvokeConfirm, OperationPreInvoke, OperationType, PendingDataItem, PopupData,
    RowMeta, ScreenMeta, ViewMeta,
};

/// Field name to message.
pub type FieldErrors = BTreeMap<String, String>;

/// Parameters of a BC data load.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchRequest {
    pub bc_name: String,
    pub widget_name: Option<String>,
    /// Level of a self-referencing hierarchy; `None` and `1` mean the BC itself.
    pub depth: Option<usize>,
    /// Explicit page range, inclusive.
    pub pages: Option<(usize, usize)>,
    pub ignore_page_limit: bool,
    pub keep_delta: bool,
    /// Append to the already loaded rows instead of replacing them.
    pub load_more: bool,
}

impl FetchRequest {
    pub fn new(bc_name: impl Into<String>) -> Self {
        Self {
            bc_name: bc_name.into(),
            ..Self::default()
        }
    }

    pub fn widget(mut self, widget_name: Option<String>) -> Self {
        self.widget_name = widget_name;
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn pages(mut self, from: usize, to: usize) -> Self {
        self.pages = Some((from, to));
        self
    }

    pub fn ignore_page_limit(mut self) -> Self {
        self.ignore_page_limit = true;
        self
    }

    pub fn keep_delta(mut self) -> Self {
        self.keep_delta = true;
        self
    }

    pub fn load_more(mut self) -> Self {
        self.load_more = true;
        self.keep_delta = true;
        self
    }

    /// Depth with `1` standing for the BC's own level.
    pub fn level(&self) -> usize {
        self.depth.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Screen, view and location
    SelectScreen {
        screen: ScreenMeta,
    },
    SelectView {
        view: ViewMeta,
    },
    ChangeLocation {
        route: Route,
    },
    Logout,

    // Data loading
    BcFetchDataRequest(FetchRequest),
    BcFetchDataSuccess {
        bc_name: String,
        bc_url: String,
        data: Vec<DataItem>,
        has_next: bool,
        depth: Option<usize>,
        append: bool,
    },
    BcFetchDataFail {
        bc_name: String,
        bc_url: String,
        depth: Option<usize>,
    },
    BcLoadMore {
        bc_name: String,
        widget_name: Option<String>,
    },
    BcChangePage {
        bc_name: String,
        widget_name: Option<String>,
        page: usize,
    },
    BcForceUpdate {
        bc_name: String,
        widget_name: Option<String>,
    },

    // Cursors
    BcChangeCursors {
        cursors: BTreeMap<String, Option<String>>,
        keep_delta: bool,
    },
    BcChangeDepthCursor {
        bc_name: String,
        depth: usize,
        cursor: Option<String>,
    },
    BcSelectRecord {
        bc_name: String,
        cursor: String,
    },
    BcSelectDepthRecord {
        bc_name: String,
        widget_name: Option<String>,
        depth: usize,
        cursor: String,
    },

    // Row meta
    BcFetchRowMeta {
        bc_name: String,
        widget_name: Option<String>,
    },
    BcFetchRowMetaSuccess {
        bc_name: String,
        bc_url: String,
        row_meta: RowMeta,
        cursor: Option<String>,
    },
    BcFetchRowMetaFail {
        bc_name: String,
        bc_url: String,
    },
    ForceActiveRmUpdate {
        bc_name: String,
        bc_url: String,
        cursor: String,
        current_record: DataItem,
        row_meta: RowMeta,
    },
    ForceActiveChangeFail {
        bc_name: String,
        bc_url: String,
        cursor: String,
        field_errors: FieldErrors,
    },

    // Filters and sorters
    BcAddFilter {
        bc_name: String,
        widget_name: Option<String>,
        filter: BcFilter,
    },
    BcRemoveFilter {
        bc_name: String,
        widget_name: Option<String>,
        filter: BcFilter,
    },
    BcRemoveAllFilters {
        bc_name: String,
        widget_name: Option<String>,
    },
    BcAddSorter {
        bc_name: String,
        widget_name: Option<String>,
        sorters: Vec<BcSorter>,
    },

    // Mutations
    SendOperation {
        bc_name: String,
        operation_type: OperationType,
        widget_name: Option<String>,
        on_success_action: Option<Box<Action>>,
        confirm: Option<String>,
    },
    SendOperationSuccess {
        bc_name: String,
        operation_type: OperationType,
        cursor: Option<String>,
        data_item: Option<DataItem>,
    },
    SendOperationFail {
        bc_name: String,
        bc_url: String,
        operation_type: OperationType,
        field_errors: FieldErrors,
    },
    BcNewDataSuccess {
        bc_name: String,
        bc_url: String,
        data_item: DataItem,
    },
    BcNewDataFail {
        bc_name: String,
    },
    BcSaveDataSuccess {
        bc_name: String,
        cursor: String,
        data_item: Option<DataItem>,
    },
    BcSaveDataFail {
        bc_name: String,
        bc_url: String,
        cursor: Option<String>,
        field_errors: FieldErrors,
    },
    BcDeleteDataFail {
        bc_name: String,
    },

    // Pending changes
    ChangeDataItem {
        bc_name: String,
        cursor: String,
        data_item: PendingDataItem,
    },
    ChangeDataItems {
        bc_name: String,
        cursors: Vec<String>,
        data_items: Vec<PendingDataItem>,
    },
    /// `None` drops every pending change of the view.
    BcCancelPendingChanges {
        bc_names: Option<Vec<String>>,
    },
    AddPendingValidationFails {
        bc_name: String,
        cursor: String,
        fails: FieldErrors,
    },

    // Confirmation dialogs
    ProcessPreInvoke {
        bc_name: String,
        operation_type: OperationType,
        widget_name: Option<String>,
        pre_invoke: OperationPreInvoke,
        /// Continuation of the operation waiting for the dialog.
        on_success_action: Option<Box<Action>>,
    },
    OperationConfirmation {
        bc_name: String,
        operation_type: OperationType,
        widget_name: Option<String>,
        confirm: OperationPostInvokeConfirm,
        on_success_action: Option<Box<Action>>,
    },
    ResolveConfirmation {
        approved: bool,
        text: Option<String>,
    },
    ProcessPostInvoke {
        bc_name: String,
        widget_name: Option<String>,
        post_invoke: OperationPostInvoke,
    },

    // Associations
    ShowViewPopup {
        popup: PopupData,
    },
    CloseViewPopup,
    SaveAssociations {
        bc_names: Vec<String>,
    },
    ChangeAssociation {
        bc_name: String,
        widget_name: String,
        record: DataItem,
        associate: bool,
        assoc_value_key: String,
    },
    ChangeAssociationSameBc {
        bc_name: String,
        widget_name: String,
        depth: usize,
        record: DataItem,
        associate: bool,
        assoc_value_key: String,
    },
    ChangeChildrenAssociations {
        bc_name: String,
        assoc_value_key: String,
        selected: bool,
    },
    /// Applies `selected` to every descendant of `parent_id` below `depth`.
    ChangeChildrenAssociationsSameBc {
        bc_name: String,
        depth: usize,
        parent_id: String,
        parent_key: String,
        assoc_value_key: String,
        selected: bool,
    },
    RemoveMultivalueTag {
        bc_name: String,
        popup_bc_name: String,
        cursor: String,
        associate_field_key: String,
        data_item: Vec<MultivalueSingleValue>,
        removed_item: MultivalueSingleValue,
    },

    // Table focus
    SelectTableCellInit {
        widget_name: String,
        row_id: String,
        field_key: String,
    },

    // Navigation, notifications and errors
    DrillDown {
        url: String,
        drill_down_type: Option<DrillDownType>,
    },
    UserDrillDown {
        bc_name: String,
        widget_name: Option<String>,
        cursor: String,
        field_key: String,
    },
    ShowNotification {
        notification: Notification,
    },
    CloseNotification {
        id: String,
    },
    ShowViewError {
        error: ViewError,
    },
    CloseViewError,
}

impl Action {
    /// Stable action name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SelectScreen { .. } => "selectScreen",
            Action::SelectView { .. } => "selectView",
            Action::ChangeLocation { .. } => "changeLocation",
            Action::Logout => "logout",
            Action::BcFetchDataRequest(_) => "bcFetchDataRequest",
            Action::BcFetchDataSuccess { .. } => "bcFetchDataSuccess",
            Action::BcFetchDataFail { .. } => "bcFetchDataFail",
            Action::BcLoadMore { .. } => "bcLoadMore",
            Action::BcChangePage { .. } => "bcChangePage",
            Action::BcForceUpdate { .. } => "bcForceUpdate",
            Action::BcChangeCursors { .. } => "bcChangeCursors",
            Action::BcChangeDepthCursor { .. } => "bcChangeDepthCursor",
            Action::BcSelectRecord { .. } => "bcSelectRecord",
            Action::BcSelectDepthRecord { .. } => "bcSelectDepthRecord",
            Action::BcFetchRowMeta { .. } => "bcFetchRowMeta",
            Action::BcFetchRowMetaSuccess { .. } => "bcFetchRowMetaSuccess",
            Action::BcFetchRowMetaFail { .. } => "bcFetchRowMetaFail",
            Action::ForceActiveRmUpdate { .. } => "forceActiveRmUpdate",
            Action::ForceActiveChangeFail { .. } => "forceActiveChangeFail",
            Action::BcAddFilter { .. } => "bcAddFilter",
            Action::BcRemoveFilter { .. } => "bcRemoveFilter",
            Action::BcRemoveAllFilters { .. } => "bcRemoveAllFilters",
            Action::BcAddSorter { .. } => "bcAddSorter",
            Action::SendOperation { .. } => "sendOperation",
            Action::SendOperationSuccess { .. } => "sendOperationSuccess",
            Action::SendOperationFail { .. } => "sendOperationFail",
            Action::BcNewDataSuccess { .. } => "bcNewDataSuccess",
            Action::BcNewDataFail { .. } => "bcNewDataFail",
            Action::BcSaveDataSuccess { .. } => "bcSaveDataSuccess",
            Action::BcSaveDataFail { .. } => "bcSaveDataFail",
            Action::BcDeleteDataFail { .. } => "bcDeleteDataFail",
            Action::ChangeDataItem { .. } => "changeDataItem",
            Action::ChangeDataItems { .. } => "changeDataItems",
            Action::BcCancelPendingChanges { .. } => "bcCancelPendingChanges",
            Action::AddPendingValidationFails { .. } => "addPendingValidationFails",
            Action::ProcessPreInvoke { .. } => "processPreInvoke",
            Action::OperationConfirmation { .. } => "operationConfirmation",
            Action::ResolveConfirmation { .. } => "resolveConfirmation",
            Action::ProcessPostInvoke { .. } => "processPostInvoke",
            Action::ShowViewPopup { .. } => "showViewPopup",
            Action::CloseViewPopup => "closeViewPopup",
            Action::SaveAssociations { .. } => "saveAssociations",
            Action::ChangeAssociation { .. } => "changeAssociation",
            Action::ChangeAssociationSameBc { .. } => "changeAssociationSameBc",
            Action::ChangeChildrenAssociations { .. } => "changeChildrenAssociations",
            Action::ChangeChildrenAssociationsSameBc { .. } => "changeChildrenAssociationsSameBc",
            Action::RemoveMultivalueTag { .. } => "removeMultivalueTag",
            Action::SelectTableCellInit { .. } => "selectTableCellInit",
            Action::DrillDown { .. } => "drillDown",
            Action::UserDrillDown { .. } => "userDrillDown",
            Action::ShowNotification { .. } => "showNotification",
            Action::CloseNotification { .. } => "closeNotification",
            Action::ShowViewError { .. } => "showViewError",
            Action::CloseViewError => "closeViewError",
        }
    }

    /// BC the action is about, when it names exactly one.
    pub fn bc_name(&self) -> Option<&str> {
        match self {
            Action::BcFetchDataRequest(request) => Some(&request.bc_name),
            Action::BcFetchDataSuccess { bc_name, .. }
            | Action::BcFetchDataFail { bc_name, .. }
            | Action::BcLoadMore { bc_name, .. }
            | Action::BcChangePage { bc_name, .. }
            | Action::BcForceUpdate { bc_name, .. }
            | Action::BcChangeDepthCursor { bc_name, .. }
            | Action::BcSelectRecord { bc_name, .. }
            | Action::BcSelectDepthRecord { bc_name, .. }
            | Action::BcFetchRowMeta { bc_name, .. }
            | Action::BcFetchRowMetaSuccess { bc_name, .. }
            | Action::BcFetchRowMetaFail { bc_name, .. }
            | Action::ForceActiveRmUpdate { bc_name, .. }
            | Action::ForceActiveChangeFail { bc_name, .. }
            | Action::BcAddFilter { bc_name, .. }
            | Action::BcRemoveFilter { bc_name, .. }
            | Action::BcRemoveAllFilters { bc_name, .. }
            | Action::BcAddSorter { bc_name, .. }
            | Action::SendOperation { bc_name, .. }
            | Action::SendOperationSuccess { bc_name, .. }
            | Action::SendOperationFail { bc_name, .. }
            | Action::BcNewDataSuccess { bc_name, .. }
            | Action::BcNewDataFail { bc_name }
            | Action::BcSaveDataSuccess { bc_name, .. }
            | Action::BcSaveDataFail { bc_name, .. }
            | Action::BcDeleteDataFail { bc_name }
            | Action::ChangeDataItem { bc_name, .. }
            | Action::ChangeDataItems { bc_name, .. }
            | Action::AddPendingValidationFails { bc_name, .. }
            | Action::ProcessPreInvoke { bc_name, .. }
            | Action::OperationConfirmation { bc_name, .. }
            | Action::ProcessPostInvoke { bc_name, .. }
            | Action::ChangeAssociation { bc_name, .. }
            | Action::ChangeAssociationSameBc { bc_name, .. }
            | Action::ChangeChildrenAssociations { bc_name, .. }
            | Action::ChangeChildrenAssociationsSameBc { bc_name, .. }
            | Action::RemoveMultivalueTag { bc_name, .. }
            | Action::UserDrillDown { bc_name, .. } => Some(bc_name),
            _ => None,
        }
    }

    /// Actions that take the user somewhere else.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Action::SelectScreen { .. }
                | Action::SelectView { .. }
                | Action::ChangeLocation { .. }
                | Action::DrillDown { .. }
                | Action::UserDrillDown { .. }
        )
    }

    pub fn change_data_item(bc_name: &str, cursor: &str, field: &str, value: Value) -> Self {
        let mut data_item = PendingDataItem::new();
        data_item.insert(field.to_string(), value);
        Action::ChangeDataItem {
            bc_name: bc_name.to_string(),
            cursor: cursor.to_string(),
            data_item,
        }
    }

    pub fn change_cursor(bc_name: &str, cursor: Option<String>, keep_delta: bool) -> Self {
        let mut cursors = BTreeMap::new();
        cursors.insert(bc_name.to_string(), cursor);
        Action::BcChangeCursors { cursors, keep_delta }
    }

    pub fn send_operation(
        bc_name: &str,
        operation_type: OperationType,
        widget_name: Option<String>,
    ) -> Self {
        Action::SendOperation {
            bc_name: bc_name.to_string(),
            operation_type,
            widget_name,
            on_success_action: None,
            confirm: None,
        }
    }

    pub fn force_update(bc_name: &str, widget_name: Option<String>) -> Self {
        Action::BcForceUpdate {
            bc_name: bc_name.to_string(),
            widget_name,
        }
    }
}
