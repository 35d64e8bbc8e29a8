//! Side effects handed to the host application: navigation, downloads,
//! toasts and logout.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use super::{errors, Workflow, WorkflowContext};
use crate::model::{DrillDownType, RowMetaField};
use crate::store::selectors::build_bc_url;
use crate::store::{Action, Route};

fn drill_down_type(field: &RowMetaField) -> Option<DrillDownType> {
    field
        .drill_down_type
        .as_deref()
        .and_then(|raw| serde_json::from_value(Value::String(raw.to_string())).ok())
}

pub struct DrillDownWorkflow;

#[async_trait]
impl Workflow for DrillDownWorkflow {
    fn name(&self) -> &'static str {
        "drill_down"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::DrillDown { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::DrillDown {
            url,
            drill_down_type,
        } = action
        else {
            return;
        };
        let navigator = &ctx.services().navigator;
        match drill_down_type.unwrap_or(DrillDownType::Inner) {
            DrillDownType::External => navigator.open_external(&url, false),
            DrillDownType::ExternalNew | DrillDownType::RelativeNew => {
                navigator.open_external(&url, true)
            }
            DrillDownType::Relative => navigator.push(&url),
            DrillDownType::Inner => match Route::parse(&url) {
                Some(route) => {
                    navigator.push(&route.to_path());
                    ctx.dispatch(Action::ChangeLocation { route });
                }
                None => navigator.push(&url),
            },
        }
    }
}

/// Resolves the drill-down target of a clicked field from its row meta.
pub struct UserDrillDownWorkflow;

#[async_trait]
impl Workflow for UserDrillDownWorkflow {
    fn name(&self) -> &'static str {
        "user_drill_down"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::UserDrillDown { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        let Action::UserDrillDown {
            bc_name,
            cursor,
            field_key,
            ..
        } = action
        else {
            return;
        };
        let collection = build_bc_url(ctx.state(), &bc_name, false);
        let bc_url = if collection.is_empty() {
            cursor
        } else {
            format!("{}/{}", collection, cursor)
        };
        let row_meta = match ctx.api().fetch_row_meta(ctx.screen_name(), &bc_url).await {
            Ok(row_meta) => row_meta,
            Err(err) => {
                error!(bc_name = %bc_name, bc_url = %bc_url, kind = err.kind(), error = %err, "Drill-down lookup failed");
                errors::report(&ctx, &err);
                return;
            }
        };
        let target = row_meta
            .field(&field_key)
            .and_then(|field| Some((field.drill_down.clone()?, drill_down_type(field))));
        match target {
            Some((url, drill_down_type)) => ctx.dispatch(Action::DrillDown {
                url,
                drill_down_type,
            }),
            None => debug!(bc_name = %bc_name, field = %field_key, "Field has no drill-down"),
        }
    }
}

pub struct LogoutWorkflow;

#[async_trait]
impl Workflow for LogoutWorkflow {
    fn name(&self) -> &'static str {
        "logout"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::Logout)
    }

    async fn run(&self, _action: Action, ctx: WorkflowContext) {
        let cancelled = ctx.cancel_registry().cancel_all();
        info!(cancelled, "Session ended");
        ctx.services().navigator.push("/");
    }
}

/// Mirrors session notifications to the host's toast presenter.
pub struct NotifyWorkflow;

#[async_trait]
impl Workflow for NotifyWorkflow {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn accepts(&self, action: &Action) -> bool {
        matches!(action, Action::ShowNotification { .. })
    }

    async fn run(&self, action: Action, ctx: WorkflowContext) {
        if let Action::ShowNotification { notification } = action {
            ctx.services()
                .notifier
                .notify(notification.kind, &notification.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drill_down_type_parses_known_names_only() {
        let mut field = RowMetaField {
            key: "name".into(),
            drill_down_type: Some("externalNew".into()),
            ..RowMetaField::default()
        };
        assert_eq!(drill_down_type(&field), Some(DrillDownType::ExternalNew));
        field.drill_down_type = Some("sideways".into());
        assert_eq!(drill_down_type(&field), None);
    }
}
