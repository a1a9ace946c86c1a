//! Notification sink used by the generation lifecycle.
//!
//! Both operations are fire-and-forget from the lifecycle's perspective:
//! failures are logged and swallowed, never affecting state transitions.

use tracing::info;

/// Error returned by a failing notification backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Capability for surfacing lifecycle milestones to the user.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a notification with a title and body. May fail silently.
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;

    /// Shows a short transient message.
    fn toast(&self, message: &str);
}

/// Default sink that writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        info!(title, body, "notification");
        Ok(())
    }

    fn toast(&self, message: &str) {
        info!(message, "toast");
    }
}
