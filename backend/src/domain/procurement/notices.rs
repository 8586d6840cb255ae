//! Notification text for each procurement event.

use super::{HistoryAction, ProcurementOrder};
use crate::domain::notifications::{
    NewNotification, NotificationKind, NotificationSeverity, PROCUREMENT_AUDIENCE,
};
use crate::domain::StaffMember;

fn comments_or(comments: &str, fallback: &str) -> String {
    if comments.trim().is_empty() {
        fallback.to_owned()
    } else {
        comments.to_owned()
    }
}

/// Build the notification announcing `action` on `order`.
///
/// `comments` is the reviewer's comment or cancellation reason, if any.
pub fn notice_for(
    order: &ProcurementOrder,
    action: HistoryAction,
    actor: &StaffMember,
    comments: &str,
) -> NewNotification {
    let name = actor.display_name();
    let id = order.id;
    let (title, message, kind, severity) = match action {
        HistoryAction::Created => (
            format!("New Procurement Order #{id}"),
            format!(
                "{name} ({}) requested {} units of {} for {}. Priority: {}. Estimated cost: AED {:.2}",
                actor.role,
                order.quantity,
                order.item_name,
                order.store_name,
                order.priority.label(),
                order.estimated_cost
            ),
            NotificationKind::Procurement,
            if order.priority.is_urgent() {
                NotificationSeverity::Warning
            } else {
                NotificationSeverity::Info
            },
        ),
        HistoryAction::LogisticsApproved => (
            format!("Order #{id} - Logistics Approved"),
            format!(
                "{name} (Logistics) approved order for {} units of {}. Awaiting Senior VP final approval. Cost: AED {:.2}",
                order.quantity, order.item_name, order.estimated_cost
            ),
            NotificationKind::Approval,
            NotificationSeverity::Info,
        ),
        HistoryAction::LogisticsRejected => (
            format!("Order #{id} - Rejected by Logistics"),
            format!(
                "{name} rejected the procurement order for {}. Reason: {}",
                order.item_name,
                comments_or(comments, "Not specified")
            ),
            NotificationKind::Rejection,
            NotificationSeverity::Warning,
        ),
        HistoryAction::VpApproved => (
            format!("Order #{id} - APPROVED by Senior VP"),
            format!(
                "{name} (Senior VP) gave final approval for {} units of {} - AED {:.2}. Order will now be processed and shipped.",
                order.quantity, order.item_name, order.estimated_cost
            ),
            NotificationKind::Approval,
            NotificationSeverity::Success,
        ),
        HistoryAction::VpRejected => (
            format!("Order #{id} - REJECTED by Senior VP"),
            format!(
                "{name} (Senior VP) rejected the procurement for {}. Reason: {}",
                order.item_name,
                comments_or(comments, "Not specified")
            ),
            NotificationKind::Rejection,
            NotificationSeverity::Critical,
        ),
        HistoryAction::Shipped => (
            format!("Order #{id} - Shipped"),
            format!(
                "{} ({} units) for {} is now in transit.",
                order.item_name, order.quantity, order.store_name
            ),
            NotificationKind::Info,
            NotificationSeverity::Info,
        ),
        HistoryAction::Delivered => (
            format!("Order #{id} - Delivered"),
            format!(
                "{} ({} units) delivered to {}. Inventory updated.",
                order.item_name, order.quantity, order.store_name
            ),
            NotificationKind::Info,
            NotificationSeverity::Success,
        ),
        HistoryAction::Cancelled => (
            format!("Order #{id} - Cancelled"),
            format!(
                "{name} cancelled the procurement order for {}. Reason: {}",
                order.item_name,
                comments_or(comments, "Not specified")
            ),
            NotificationKind::Info,
            NotificationSeverity::Warning,
        ),
    };
    NewNotification {
        title,
        message,
        kind,
        severity,
        target_roles: PROCUREMENT_AUDIENCE.to_vec(),
        order_id: Some(id),
        created_by: name,
    }
}

/// Single notification summarising a bulk submission.
pub fn bulk_notice(orders: &[ProcurementOrder], actor: &StaffMember) -> NewNotification {
    let total: f64 = orders.iter().map(|order| order.estimated_cost).sum();
    let name = actor.display_name();
    NewNotification {
        title: format!("Bulk Procurement: {} Orders Created", orders.len()),
        message: format!(
            "{name} created {} procurement orders. Total estimated cost: AED {total:.2}",
            orders.len()
        ),
        kind: NotificationKind::Procurement,
        severity: NotificationSeverity::Warning,
        target_roles: PROCUREMENT_AUDIENCE.to_vec(),
        order_id: None,
        created_by: name,
    }
}
