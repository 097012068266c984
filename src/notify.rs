use tokio::sync::mpsc;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Notice
///
/// A non-blocking message for the user, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Notifier
///
/// Sending half of the notice channel, cloned into every screen. Sending
/// never blocks and never fails the caller; if nobody is listening the
/// notice is dropped.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        if self.tx.send(notice).is_err() {
            tracing::debug!("notice dropped, no receiver");
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    /// report
    ///
    /// Renders a failed action. Validation messages are shown verbatim, other
    /// failures under the screen's own wording. Authorization failures are
    /// skipped: the session has already been cleared and the navigator
    /// handles the redirect.
    pub fn report(&self, context: &str, err: &ApiError) {
        if !err.is_user_facing() {
            tracing::debug!(context, "authorization failure not rendered");
            return;
        }
        match err {
            ApiError::ValidationFailure(msg) => self.error(msg.clone()),
            ApiError::InvalidCredentials => self.error(err.to_string()),
            _ => self.error(context),
        }
    }
}
