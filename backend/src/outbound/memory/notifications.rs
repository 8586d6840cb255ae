//! Notifications kept in process memory.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{NewNotification, Notification, NotificationId};

/// Append-only notification log with per-email read receipts.
#[derive(Debug, Default)]
pub struct MemoryNotificationRepository {
    notifications: RwLock<Vec<Notification>>,
    sequence: AtomicU64,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn insert(
        &self,
        notification: NewNotification,
        created_at: DateTime<Utc>,
    ) -> Result<Notification, NotificationRepositoryError> {
        let id = NotificationId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = Notification::from_new(id, notification, created_at);
        self.notifications.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(self.notifications.read().await.clone())
    }

    async fn mark_read(
        &self,
        ids: &[NotificationId],
        email: &str,
    ) -> Result<usize, NotificationRepositoryError> {
        let mut notifications = self.notifications.write().await;
        let mut marked = 0;
        for notification in notifications
            .iter_mut()
            .filter(|notification| ids.contains(&notification.id))
        {
            if notification.read_by.insert(email.to_owned()) {
                marked += 1;
            }
        }
        Ok(marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NotificationKind, NotificationSeverity, Role};
    use crate::test_support::FixtureClock;

    fn draft() -> NewNotification {
        NewNotification {
            title: "New Procurement Order #1".to_owned(),
            message: "Rice requested".to_owned(),
            kind: NotificationKind::Procurement,
            severity: NotificationSeverity::Info,
            target_roles: vec![Role::LogisticsHead],
            order_id: None,
            created_by: "Store Manager".to_owned(),
        }
    }

    #[tokio::test]
    async fn marking_twice_counts_once() {
        let repo = MemoryNotificationRepository::new();
        let stored = repo
            .insert(draft(), FixtureClock::default_instant())
            .await
            .expect("insert");
        assert_eq!(stored.id, NotificationId(1));
        let ids = [stored.id];
        assert_eq!(repo.mark_read(&ids, "a@retail.test").await.expect("mark"), 1);
        assert_eq!(repo.mark_read(&ids, "a@retail.test").await.expect("mark"), 0);
        assert_eq!(repo.mark_read(&ids, "b@retail.test").await.expect("mark"), 1);
    }
}
