//! Conversion of backend failures into user-visible state.

use tracing::warn;

use super::WorkflowContext;
use crate::api::ApiError;
use crate::model::MessageType;
use crate::store::{Action, Notification, ViewError, ViewErrorKind};

/// Surfaces `error` the way its class demands.
///
/// Field-level errors are not handled here; callers attach them to their own
/// `*Fail` action before reporting.
pub fn report(ctx: &WorkflowContext, error: &ApiError) {
    match error {
        ApiError::Unauthorized => ctx.dispatch(Action::Logout),
        ApiError::Redirect { location } => ctx.services().navigator.push(location),
        ApiError::Network { message } => ctx.dispatch(Action::ShowViewError {
            error: ViewError {
                kind: ViewErrorKind::Network,
                message: message.clone(),
            },
        }),
        ApiError::Conflict { message } => ctx.dispatch(Action::ShowNotification {
            notification: Notification::new(MessageType::Warning, message.clone()),
        }),
        ApiError::Business(business) => {
            if business.popup.is_empty() {
                return;
            }
            ctx.dispatch(Action::ShowViewError {
                error: ViewError {
                    kind: ViewErrorKind::Business,
                    message: business.popup.join("\n"),
                },
            });
        }
        ApiError::Status { .. } | ApiError::Decode { .. } | ApiError::Client { .. } => {
            warn!(kind = error.kind(), error = %error, "Unexpected backend failure");
            ctx.dispatch(Action::ShowViewError {
                error: ViewError {
                    kind: ViewErrorKind::System,
                    message: error.to_string(),
                },
            });
        }
    }
}
