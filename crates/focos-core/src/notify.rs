//! Session notifications.
//!
//! Delivery is best-effort: sessions call [`Notifier::notify`] and only log a
//! failure, they never change state because of it.

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub(crate) fn session_complete() -> Self {
        Self::new("Session Complete", "Time for a break!")
    }

    pub(crate) fn focus_complete() -> Self {
        Self::new("Focus Session Complete", "Time for a well-deserved break!")
    }

    pub(crate) fn break_complete() -> Self {
        Self::new("Break Complete", "Time to focus again!")
    }

    pub(crate) fn pomodoro_complete(cycles: u32) -> Self {
        Self::new(
            "Pomodoro Session Complete",
            format!("You completed {cycles} focus cycles!"),
        )
    }

    pub(crate) fn strict_complete() -> Self {
        Self::new(
            "Strict Mode Complete",
            "You successfully completed your strict focus session!",
        )
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(title = %notification.title, body = %notification.body, "notification");
        Ok(())
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use super::{Notification, Notifier};
    use crate::error::NotifyError;

    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub(crate) fn titles(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.title.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }
}
