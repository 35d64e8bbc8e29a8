//! Asynchronous reactions to dispatched actions.
//!
//! Each workflow receives the action that woke it together with the state
//! snapshot taken right after that action was reduced. Follow-ups are
//! dispatched through [`WorkflowContext::dispatch`] and reduced
//! synchronously, so the order of `dispatch` calls inside one workflow is the
//! order observers see.

mod association;
mod create;
mod delete;
mod errors;
mod fetch;
pub mod hierarchy;
mod navigation;
mod operation;
mod post_invoke;
mod row_meta;
mod save;
mod screen;

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::Api;
use crate::config::EngineConfig;
use crate::store::{Action, AppState, CancelRegistry, Services, Store};

pub use association::{PopupSeedWorkflow, SaveAssociationsWorkflow, ShowPopupWorkflow};
pub use create::CreateWorkflow;
pub use delete::{CancelCreateWorkflow, DeleteWorkflow};
pub use errors::report;
pub use fetch::FetchWorkflow;
pub use hierarchy::{ChangeAssociationSameBcWorkflow, ChangeAssociationWorkflow};
pub use navigation::{DrillDownWorkflow, LogoutWorkflow, NotifyWorkflow, UserDrillDownWorkflow};
pub use operation::{AssociateOperationWorkflow, ConfirmationWorkflow, CustomOperationWorkflow};
pub use post_invoke::PostInvokeWorkflow;
pub use row_meta::{ForceActiveWorkflow, RowMetaWorkflow};
pub use save::SaveWorkflow;
pub use screen::{
    ChangeLocationWorkflow, RefreshWorkflow, SelectCellWorkflow, SelectRecordWorkflow, SelectViewWorkflow,
};

#[async_trait]
pub trait Workflow: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts(&self, action: &Action) -> bool;

    async fn run(&self, action: Action, ctx: WorkflowContext);
}

/// What a running workflow can see and do.
pub struct WorkflowContext {
    store: Store,
    previous: Arc<AppState>,
    state: Arc<AppState>,
}

impl WorkflowContext {
    pub(crate) fn new(store: Store, previous: Arc<AppState>, state: Arc<AppState>) -> Self {
        Self {
            store,
            previous,
            state,
        }
    }

    /// State right after the triggering action was reduced.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// State right before the triggering action was reduced.
    pub fn previous(&self) -> &AppState {
        &self.previous
    }

    /// Live state, including everything dispatched since the trigger.
    pub fn current(&self) -> Arc<AppState> {
        self.store.state()
    }

    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    pub fn services(&self) -> &Services {
        self.store.services()
    }

    pub fn api(&self) -> &dyn Api {
        self.store.services().api.as_ref()
    }

    pub fn settings(&self) -> &EngineConfig {
        &self.store.services().settings
    }

    pub fn cancel_registry(&self) -> &CancelRegistry {
        self.store.cancel_registry()
    }

    pub fn screen_name(&self) -> &str {
        &self.state.screen.screen_name
    }

    /// The view was switched since the trigger; results must not be committed.
    pub fn is_stale(&self) -> bool {
        self.store.state().view.epoch != self.state.view.epoch
    }
}

/// Every workflow the engine runs.
pub fn default_workflows() -> Vec<Arc<dyn Workflow>> {
    vec![
        Arc::new(SelectViewWorkflow),
        Arc::new(ChangeLocationWorkflow),
        Arc::new(RefreshWorkflow),
        Arc::new(SelectRecordWorkflow),
        Arc::new(SelectCellWorkflow),
        Arc::new(FetchWorkflow),
        Arc::new(RowMetaWorkflow),
        Arc::new(ForceActiveWorkflow),
        Arc::new(CreateWorkflow),
        Arc::new(SaveWorkflow),
        Arc::new(DeleteWorkflow),
        Arc::new(CancelCreateWorkflow),
        Arc::new(CustomOperationWorkflow),
        Arc::new(AssociateOperationWorkflow),
        Arc::new(ConfirmationWorkflow),
        Arc::new(PostInvokeWorkflow),
        Arc::new(ShowPopupWorkflow),
        Arc::new(PopupSeedWorkflow),
        Arc::new(SaveAssociationsWorkflow),
        Arc::new(ChangeAssociationWorkflow),
        Arc::new(ChangeAssociationSameBcWorkflow),
        Arc::new(DrillDownWorkflow),
        Arc::new(UserDrillDownWorkflow),
        Arc::new(LogoutWorkflow),
        Arc::new(NotifyWorkflow),
    ]
}
