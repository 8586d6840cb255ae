//! Events pushed to live stream subscribers.

use serde::Serialize;

use super::alerts::Alert;
use super::notifications::Notification;
use super::sales::SaleEvent;
use super::staff::StaffMember;

/// Stream an event is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// `/stream/sales`
    Sales,
    /// `/stream/alerts`
    Alerts,
}

/// Something that happened and should reach open streams.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiveEvent {
    Sale(SaleEvent),
    Alert(Alert),
    Notification(Notification),
}

impl LiveEvent {
    pub fn channel(&self) -> Channel {
        match self {
            Self::Sale(_) => Channel::Sales,
            Self::Alert(_) | Self::Notification(_) => Channel::Alerts,
        }
    }

    /// SSE `event:` name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Sale(_) => "sales",
            Self::Alert(_) => "alert",
            Self::Notification(_) => "notification",
        }
    }

    /// SSE `id:` value.
    ///
    /// Sales carry their numeric id so clients can skip replays. Alerts and
    /// notifications share a channel, so their ids are prefixed to keep the
    /// two sequences apart.
    pub fn event_id(&self) -> String {
        match self {
            Self::Sale(sale) => sale.id.to_string(),
            Self::Alert(alert) => format!("alert-{}", alert.id),
            Self::Notification(notification) => format!("notification-{}", notification.id.0),
        }
    }

    /// Whether `member` may receive this event.
    pub fn visible_to(&self, member: &StaffMember) -> bool {
        match self {
            Self::Sale(sale) => member.scope.contains(sale.store_id),
            Self::Alert(alert) => alert.visible_to(member),
            Self::Notification(notification) => notification.visible_to(member),
        }
    }
}
