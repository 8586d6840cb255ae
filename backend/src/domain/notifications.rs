//! Role-targeted notifications raised by workflow events.
//!
//! Notifications carry the roles they target. A super admin sees every
//! notification; everyone else sees the ones addressed to their role. Read
//! receipts are kept per email address.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::ports::{LiveEventBus, NotificationRepository, NotificationRepositoryError};
use super::{Error, LiveEvent, OrderId, Role, StaffMember};

/// Roles told about every procurement event.
pub const PROCUREMENT_AUDIENCE: [Role; 4] = [
    Role::SuperAdmin,
    Role::RegionalManager,
    Role::StoreManager,
    Role::LogisticsHead,
];

/// Largest page the notification list returns.
pub const MAX_NOTIFICATION_LIMIT: u32 = 200;
/// Page size when none is requested.
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Procurement,
    Approval,
    Rejection,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSeverity {
    Critical,
    Warning,
    Info,
    Success,
}

/// A notification before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub severity: NotificationSeverity,
    pub target_roles: Vec<Role>,
    pub order_id: Option<OrderId>,
    pub created_by: String,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub severity: NotificationSeverity,
    pub target_roles: Vec<Role>,
    pub order_id: Option<OrderId>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Emails of the staff who have read it.
    pub read_by: BTreeSet<String>,
}

impl Notification {
    /// Build a stored notification from its draft.
    pub fn from_new(id: NotificationId, draft: NewNotification, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            severity: draft.severity,
            target_roles: draft.target_roles,
            order_id: draft.order_id,
            created_by: draft.created_by,
            created_at,
            read_by: BTreeSet::new(),
        }
    }

    pub fn visible_to(&self, member: &StaffMember) -> bool {
        member.role == Role::SuperAdmin || self.target_roles.contains(&member.role)
    }

    pub fn is_read_by(&self, email: &str) -> bool {
        self.read_by.contains(email)
    }
}

/// What `GET /notifications` returns.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    /// Matching notifications before the limit was applied.
    pub total: usize,
    /// Unread notifications visible to the caller, ignoring filters.
    pub unread_count: usize,
}

fn map_repository_error(err: NotificationRepositoryError) -> Error {
    match err {
        NotificationRepositoryError::Unavailable { message } => {
            Error::service_unavailable(format!("notifications unavailable: {message}"))
        }
    }
}

/// Raises, lists and acknowledges notifications.
#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    bus: Arc<dyn LiveEventBus>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        bus: Arc<dyn LiveEventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            bus,
            clock,
        }
    }

    /// Store a notification and push it to live subscribers.
    ///
    /// A storage failure is logged rather than returned: the workflow change
    /// that triggered the notification has already been committed.
    pub async fn raise(&self, draft: NewNotification) -> Option<Notification> {
        match self.repository.insert(draft, self.clock.utc()).await {
            Ok(stored) => {
                info!(notification_id = stored.id.0, title = %stored.title, "notification raised");
                self.bus.publish(LiveEvent::Notification(stored.clone()));
                Some(stored)
            }
            Err(err) => {
                warn!(error = %err, "failed to store notification");
                None
            }
        }
    }

    /// Notifications visible to `member`, newest first.
    pub async fn feed(
        &self,
        member: &StaffMember,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<NotificationFeed, Error> {
        let limit = limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
        if limit == 0 || limit > MAX_NOTIFICATION_LIMIT {
            return Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_NOTIFICATION_LIMIT}"
            )));
        }
        let visible: Vec<Notification> = self
            .repository
            .list()
            .await
            .map_err(map_repository_error)?
            .into_iter()
            .filter(|notification| notification.visible_to(member))
            .collect();
        let unread_count = visible
            .iter()
            .filter(|notification| !notification.is_read_by(&member.email))
            .count();
        let mut selected: Vec<Notification> = visible
            .into_iter()
            .filter(|notification| !unread_only || !notification.is_read_by(&member.email))
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = selected.len();
        selected.truncate(limit as usize);
        Ok(NotificationFeed {
            notifications: selected,
            total,
            unread_count,
        })
    }

    /// Mark one notification read for `member`.
    pub async fn mark_read(&self, member: &StaffMember, id: NotificationId) -> Result<(), Error> {
        let found = self
            .repository
            .list()
            .await
            .map_err(map_repository_error)?
            .into_iter()
            .any(|notification| notification.id == id && notification.visible_to(member));
        if !found {
            return Err(Error::not_found(format!("notification {} not found", id.0)));
        }
        self.repository
            .mark_read(&[id], &member.email)
            .await
            .map_err(map_repository_error)?;
        Ok(())
    }

    /// Mark every visible unread notification read. Returns how many changed.
    pub async fn mark_all_read(&self, member: &StaffMember) -> Result<usize, Error> {
        let unread: Vec<NotificationId> = self
            .repository
            .list()
            .await
            .map_err(map_repository_error)?
            .into_iter()
            .filter(|notification| {
                notification.visible_to(member) && !notification.is_read_by(&member.email)
            })
            .map(|notification| notification.id)
            .collect();
        if unread.is_empty() {
            return Ok(0);
        }
        self.repository
            .mark_read(&unread, &member.email)
            .await
            .map_err(map_repository_error)
    }
}
