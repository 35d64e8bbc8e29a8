//! Wire and domain types shared by the store, the API client and the workflows.

mod bc;
mod data;
mod filter;
mod operation;
mod row_meta;
mod view;

pub use bc::{BcMeta, BcMetaState, DepthBcState, ID_PLACEHOLDER};
pub use data::{
    association_delta, delta_associate, id_value, is_association_delta, is_empty_value, DataItem,
    MultivalueSingleValue, PendingDataItem, ASSOCIATE_KEY, ASSOCIATE_VALUE_KEY,
    NEW_RECORD_VSTAMP,
};
pub use filter::{upsert_filter, BcFilter, BcSorter, FilterType, SortDirection};
pub use operation::{
    flatten_operations, ConfirmType, DrillDownType, MessageType, Operation, OperationGroup,
    OperationItem, OperationPostInvoke, OperationPostInvokeConfirm, OperationPreInvoke,
    OperationType, PostAction, PreInvokeType,
};
pub use row_meta::{RowMeta, RowMetaField};
pub use view::{
    BusinessObject, HierarchyLevel, PopupData, ScreenMeta, ViewMeta, WidgetField, WidgetMeta,
    WidgetOptions,
};
