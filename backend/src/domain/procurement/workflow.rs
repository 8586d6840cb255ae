//! State transitions of a procurement order.
//!
//! Each transition checks the actor's role, then the current status, and on
//! success stamps `updated_at`, fills the matching approval step and appends
//! one history entry.

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{
    ApprovalStep, ApproverRole, Decision, HistoryAction, HistoryEntry, OrderId, OrderStatus,
    Priority, ProcurementOrder, StepStatus,
};
use crate::domain::catalogue::{CatalogueItem, Store, round2};
use crate::domain::staff::{Role, StaffMember};
use crate::domain::Error;

const REVIEWERS: &[Role] = &[Role::LogisticsHead, Role::SuperAdmin];
const VP: &[Role] = &[Role::SuperAdmin];
const PENDING_NAME: &str = "Pending";
const VP_NAME: &str = "Senior VP";

/// Reasons a transition is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("order {id} is {status} and cannot be {action}")]
    InvalidTransition {
        id: OrderId,
        status: OrderStatus,
        action: &'static str,
    },
    #[error("{role} may not {action} procurement orders")]
    NotPermitted { role: Role, action: &'static str },
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("unit cost must be a positive amount")]
    InvalidUnitCost,
}

impl From<WorkflowError> for Error {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::InvalidTransition { status, .. } => Error::invalid_request(message)
                .with_details(json!({ "code": "invalid_transition", "status": status })),
            WorkflowError::NotPermitted { .. } => Error::forbidden(message),
            WorkflowError::InvalidQuantity => Error::invalid_request(message)
                .with_details(json!({ "field": "quantity", "code": "must_be_positive" })),
            WorkflowError::InvalidUnitCost => Error::invalid_request(message)
                .with_details(json!({ "field": "unit_cost", "code": "must_be_positive" })),
        }
    }
}

/// Validated inputs for a new order.
#[derive(Debug, Clone)]
pub struct OrderDraft<'a> {
    pub item: &'a CatalogueItem,
    pub store: &'a Store,
    pub quantity: u32,
    pub unit_cost: f64,
    pub priority: Priority,
    pub reason: String,
    pub notes: String,
    pub bulk: bool,
}

fn pending_step(step: u8, role: ApproverRole, name: &str) -> ApprovalStep {
    ApprovalStep {
        step,
        role,
        name: name.to_owned(),
        status: StepStatus::Pending,
        timestamp: None,
        comments: String::new(),
    }
}

fn or_default<'a>(comments: &'a str, fallback: &'a str) -> &'a str {
    if comments.trim().is_empty() {
        fallback
    } else {
        comments
    }
}

impl ProcurementOrder {
    /// Open a new order awaiting logistics review.
    pub fn open(
        id: OrderId,
        draft: OrderDraft<'_>,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        if draft.quantity == 0 {
            return Err(WorkflowError::InvalidQuantity);
        }
        if !draft.unit_cost.is_finite() || draft.unit_cost <= 0.0 {
            return Err(WorkflowError::InvalidUnitCost);
        }
        let prefix = if draft.bulk {
            "Bulk procurement order"
        } else {
            "Procurement order created"
        };
        let created_by = actor.display_name();
        Ok(Self {
            id,
            item_id: draft.item.id,
            item_name: draft.item.name.clone(),
            category: draft.item.category.clone(),
            store_id: draft.store.id,
            store_name: draft.store.name.clone(),
            quantity: draft.quantity,
            unit_cost: draft.unit_cost,
            estimated_cost: round2(f64::from(draft.quantity) * draft.unit_cost),
            priority: draft.priority,
            reason: draft.reason,
            notes: draft.notes,
            status: OrderStatus::PendingLogistics,
            created_by: created_by.clone(),
            created_by_id: actor.id,
            created_by_email: actor.email.clone(),
            created_by_role: actor.role,
            created_at: now,
            updated_at: now,
            delivered_at: None,
            approval_chain: vec![
                pending_step(1, ApproverRole::LogisticsHead, PENDING_NAME),
                pending_step(2, ApproverRole::SeniorVp, VP_NAME),
            ],
            history: vec![HistoryEntry {
                action: HistoryAction::Created,
                by: created_by,
                role: actor.role,
                timestamp: now,
                details: format!(
                    "{prefix} for {} units of {}",
                    draft.quantity, draft.item.name
                ),
            }],
        })
    }

    fn require(
        &self,
        actor: &StaffMember,
        roles: &[Role],
        action: &'static str,
    ) -> Result<(), WorkflowError> {
        if actor.has_role(roles) {
            Ok(())
        } else {
            Err(WorkflowError::NotPermitted {
                role: actor.role,
                action,
            })
        }
    }

    fn expect_status(&self, expected: OrderStatus, action: &'static str) -> Result<(), WorkflowError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                id: self.id,
                status: self.status,
                action,
            })
        }
    }

    fn record(
        &mut self,
        action: HistoryAction,
        actor: &StaffMember,
        now: DateTime<Utc>,
        details: String,
    ) -> HistoryAction {
        self.updated_at = now;
        self.history.push(HistoryEntry {
            action,
            by: actor.display_name(),
            role: actor.role,
            timestamp: now,
            details,
        });
        action
    }

    fn decide_step(
        &mut self,
        index: usize,
        decision: Decision,
        actor: &StaffMember,
        comments: &str,
        now: DateTime<Utc>,
    ) {
        if let Some(step) = self.approval_chain.get_mut(index) {
            step.status = match decision {
                Decision::Approved => StepStatus::Approved,
                Decision::Rejected => StepStatus::Rejected,
            };
            step.name = actor.display_name();
            step.timestamp = Some(now);
            step.comments = comments.to_owned();
        }
    }

    /// First review step, performed by logistics.
    pub fn review_by_logistics(
        &mut self,
        decision: Decision,
        comments: &str,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<HistoryAction, WorkflowError> {
        self.require(actor, REVIEWERS, "review")?;
        self.expect_status(OrderStatus::PendingLogistics, "reviewed by logistics")?;
        self.decide_step(0, decision, actor, comments, now);
        let (status, action, details) = match decision {
            Decision::Approved => (
                OrderStatus::PendingVpApproval,
                HistoryAction::LogisticsApproved,
                format!(
                    "Logistics approved. Awaiting VP approval. Comments: {}",
                    or_default(comments, "None")
                ),
            ),
            Decision::Rejected => (
                OrderStatus::Rejected,
                HistoryAction::LogisticsRejected,
                format!(
                    "Logistics rejected. Reason: {}",
                    or_default(comments, "No reason given")
                ),
            ),
        };
        self.status = status;
        Ok(self.record(action, actor, now, details))
    }

    /// Final approval step, reserved for the senior VP.
    pub fn decide_as_vp(
        &mut self,
        decision: Decision,
        comments: &str,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<HistoryAction, WorkflowError> {
        self.require(actor, VP, "give final approval on")?;
        self.expect_status(OrderStatus::PendingVpApproval, "decided by the VP")?;
        self.decide_step(1, decision, actor, comments, now);
        let (status, action, details) = match decision {
            Decision::Approved => (
                OrderStatus::Approved,
                HistoryAction::VpApproved,
                format!(
                    "Senior VP APPROVED the order. Comments: {}. Order will be processed by logistics.",
                    or_default(comments, "None")
                ),
            ),
            Decision::Rejected => (
                OrderStatus::Rejected,
                HistoryAction::VpRejected,
                format!(
                    "Senior VP REJECTED the order. Reason: {}",
                    or_default(comments, "Not specified")
                ),
            ),
        };
        self.status = status;
        Ok(self.record(action, actor, now, details))
    }

    /// Dispatch an approved order.
    pub fn ship(
        &mut self,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<HistoryAction, WorkflowError> {
        self.require(actor, REVIEWERS, "ship")?;
        self.expect_status(OrderStatus::Approved, "shipped")?;
        self.status = OrderStatus::InTransit;
        Ok(self.record(
            HistoryAction::Shipped,
            actor,
            now,
            "Order marked as shipped / in transit".to_owned(),
        ))
    }

    /// Confirm arrival at the store. The caller restocks inventory.
    pub fn deliver(
        &mut self,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<HistoryAction, WorkflowError> {
        self.require(actor, REVIEWERS, "deliver")?;
        self.expect_status(OrderStatus::InTransit, "delivered")?;
        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(now);
        let details = format!("Order delivered to {}. Inventory updated.", self.store_name);
        Ok(self.record(HistoryAction::Delivered, actor, now, details))
    }

    /// Withdraw a non-terminal order.
    pub fn cancel(
        &mut self,
        reason: &str,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<HistoryAction, WorkflowError> {
        if actor.id != self.created_by_id {
            self.require(actor, REVIEWERS, "cancel")?;
        }
        if self.status.is_terminal() {
            return Err(WorkflowError::InvalidTransition {
                id: self.id,
                status: self.status,
                action: "cancelled",
            });
        }
        self.status = OrderStatus::Cancelled;
        let details = format!(
            "Order cancelled. Reason: {}",
            or_default(reason, "Not specified")
        );
        Ok(self.record(HistoryAction::Cancelled, actor, now, details))
    }
}
