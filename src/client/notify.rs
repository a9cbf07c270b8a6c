use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Non-blocking toast-style feedback provided by the hosting page.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NoticeKind, duration: Option<Duration>);
}

/// Blocking feedback, used for pre-submission problems and whenever no
/// notifier is registered.
pub trait Alert: Send + Sync {
    fn alert(&self, message: &str);
}

/// Default alert for headless use: writes the message to the log.
pub struct LogAlert;

impl Alert for LogAlert {
    fn alert(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
