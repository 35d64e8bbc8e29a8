//! Collaborators the engine needs from the surrounding application.

use tracing::info;

use crate::model::MessageType;

/// Location service: push-navigation plus the two ways of leaving the app.
pub trait Navigator: Send + Sync {
    /// Navigate to an application route such as `/screen/app/view/card/customer/7`.
    fn push(&self, url: &str);

    /// Open a URL outside of the application.
    fn open_external(&self, url: &str, new_tab: bool);

    /// Start a file download.
    fn download(&self, url: &str);
}

/// Toast presenter. Messages are also kept in the session slice.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: MessageType, message: &str);
}

/// Resolves user-visible message keys.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Navigator that only logs; used when the host supplies none.
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn push(&self, url: &str) {
        info!(url = %url, "Navigate");
    }

    fn open_external(&self, url: &str, new_tab: bool) {
        info!(url = %url, new_tab, "Open external url");
    }

    fn download(&self, url: &str) {
        info!(url = %url, "Download");
    }
}

#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: MessageType, message: &str) {
        info!(kind = ?kind, message = %message, "Notification");
    }
}

/// Returns keys unchanged.
#[derive(Debug, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}
