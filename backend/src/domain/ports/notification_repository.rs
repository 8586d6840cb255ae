//! Port for notification storage and read receipts.

use async_trait::async_trait;

use crate::domain::{NewNotification, Notification, NotificationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repositories.
    pub enum NotificationRepositoryError {
        /// Storage could not be reached.
        Unavailable { message: String } => "notification repository unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Store a notification, assigning its id and timestamp.
    async fn insert(
        &self,
        notification: NewNotification,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Notification, NotificationRepositoryError>;

    /// Every notification in insertion order.
    async fn list(&self) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Add `email` to the read receipts of each id. Returns how many
    /// notifications changed; unknown ids are ignored.
    async fn mark_read(
        &self,
        ids: &[NotificationId],
        email: &str,
    ) -> Result<usize, NotificationRepositoryError>;
}
