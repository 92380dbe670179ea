//! The per-user context handed to every view and controller.
//!
//! It carries the signed-in user and the notification sink, so nothing in
//! this crate reaches for process-wide mutable state. The application creates
//! one at sign-in and drops it at sign-out.

use std::fmt;
use std::sync::Arc;

use agora_shared::types::UserId;

use crate::error::ClientError;
use crate::notify::{Notification, NotificationLevel, Notifier};

#[derive(Clone)]
pub struct Session {
    current_user: Option<UserId>,
    notifier: Arc<dyn Notifier>,
}

impl Session {
    pub fn new(current_user: UserId, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            current_user: Some(current_user),
            notifier,
        }
    }

    /// A visitor who is not signed in.
    pub fn anonymous(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            current_user: None,
            notifier,
        }
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.current_user
    }

    pub fn is_current_user(&self, user: UserId) -> bool {
        self.current_user == Some(user)
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.notifier.notify(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn notify_error(&self, error: &ClientError) {
        self.notify(NotificationLevel::Error, error.user_message());
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("current_user", &self.current_user)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationQueue;

    #[test]
    fn test_anonymous_session_matches_nobody() {
        let session = Session::anonymous(Arc::new(NotificationQueue::default()));
        assert!(!session.is_current_user(UserId(1)));
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_notify_error_uses_user_message() {
        let queue = Arc::new(NotificationQueue::default());
        let session = Session::new(UserId(1), queue.clone());

        session.notify_error(&ClientError::NotPermitted("mark this reply as the solution"));

        let notes = queue.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "You cannot mark this reply as the solution");
    }
}
