//! Dispatch bus: middleware, reducers, action log and workflow scheduling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, trace, warn};

use super::action::Action;
use super::cancel::CancelRegistry;
use super::reducer::root_reduce;
use super::state::AppState;
use crate::api::Api;
use crate::config::EngineConfig;
use crate::host::{Navigator, Notifier, Translator};
use crate::middleware::Middleware;
use crate::workflows::{Workflow, WorkflowContext};

const EVENT_CAPACITY: usize = 1024;

/// Collaborators handed to every workflow.
pub struct Services {
    pub api: Arc<dyn Api>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub translator: Arc<dyn Translator>,
    pub settings: EngineConfig,
}

/// Counts running workflow tasks.
#[derive(Default)]
struct TaskTracker {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Keeps a task counted until dropped.
struct TaskGuard {
    tracker: Arc<TaskTracker>,
}

impl TaskGuard {
    fn new(tracker: Arc<TaskTracker>) -> Self {
        tracker.in_flight.fetch_add(1, Ordering::SeqCst);
        Self { tracker }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}

struct StoreInner {
    state: RwLock<Arc<AppState>>,
    log: Mutex<Vec<Action>>,
    commit_lock: Mutex<()>,
    events: broadcast::Sender<Action>,
    middleware: Vec<Arc<dyn Middleware>>,
    workflows: Vec<Arc<dyn Workflow>>,
    services: Services,
    cancel: CancelRegistry,
    tasks: Arc<TaskTracker>,
}

/// Shared handle to the state tree and the action stream.
///
/// Cloning is cheap; every clone talks to the same store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn new(
        services: Services,
        middleware: Vec<Arc<dyn Middleware>>,
        workflows: Vec<Arc<dyn Workflow>>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Arc::new(AppState::default())),
                log: Mutex::new(Vec::new()),
                commit_lock: Mutex::new(()),
                events,
                middleware,
                workflows,
                services,
                cancel: CancelRegistry::new(),
                tasks: Arc::new(TaskTracker::default()),
            }),
        }
    }

    /// Current state tree.
    pub fn state(&self) -> Arc<AppState> {
        self.inner.state.read().clone()
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    pub fn cancel_registry(&self) -> &CancelRegistry {
        &self.inner.cancel
    }

    /// Runs `action` through the middleware chain, reduces it and starts
    /// the workflows listening for it.
    pub fn dispatch(&self, action: Action) {
        let mut next = Some(action);
        for middleware in &self.inner.middleware {
            next = match next {
                Some(action) => middleware.handle(self, action),
                None => break,
            };
        }
        match next {
            Some(action) => self.commit(action),
            None => trace!("Action consumed by middleware"),
        }
    }

    fn commit(&self, action: Action) {
        let (previous, state) = {
            let _commit = self.inner.commit_lock.lock();
            let previous = self.state();
            let state = Arc::new(root_reduce(&previous, &action));
            *self.inner.state.write() = state.clone();
            self.inner.log.lock().push(action.clone());
            let _ = self.inner.events.send(action.clone());
            (previous, state)
        };
        debug!(action = action.kind(), bc_name = ?action.bc_name(), "Action reduced");
        self.spawn_workflows(&action, previous, state);
    }

    fn spawn_workflows(&self, action: &Action, previous: Arc<AppState>, state: Arc<AppState>) {
        let matching: Vec<Arc<dyn Workflow>> = self
            .inner
            .workflows
            .iter()
            .filter(|workflow| workflow.accepts(action))
            .cloned()
            .collect();
        if matching.is_empty() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!(action = action.kind(), "No async runtime, workflows skipped");
            return;
        };
        for workflow in matching {
            let guard = TaskGuard::new(self.inner.tasks.clone());
            let context = WorkflowContext::new(self.clone(), previous.clone(), state.clone());
            let action = action.clone();
            handle.spawn(async move {
                let _guard = guard;
                trace!(workflow = workflow.name(), action = action.kind(), "Workflow started");
                workflow.run(action, context).await;
            });
        }
    }

    /// Every reduced action so far, in order.
    pub fn actions(&self) -> Vec<Action> {
        self.inner.log.lock().clone()
    }

    /// Stream of reduced actions.
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.inner.events.subscribe()
    }

    /// Rebuilds a state tree from an action log. No workflow runs.
    pub fn replay<'a>(actions: impl IntoIterator<Item = &'a Action>) -> AppState {
        actions
            .into_iter()
            .fold(AppState::default(), |state, action| root_reduce(&state, action))
    }

    /// Resolves once no workflow task is running.
    pub async fn wait_idle(&self) {
        loop {
            // Subscribe before reading the counter so a wake-up in between is not lost.
            let notified = self.inner.tasks.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inner.tasks.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.tasks.in_flight.load(Ordering::SeqCst)
    }
}
