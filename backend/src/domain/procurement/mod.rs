//! Procurement orders and their approval chain.
//!
//! An order moves `pending_logistics → pending_vp_approval → approved →
//! in_transit → delivered`, may be rejected at either review step, and may be
//! cancelled until it reaches a terminal status. The transitions live on
//! [`ProcurementOrder`] in [`workflow`]; [`ProcurementService`] loads and
//! persists orders, raises notifications and restocks on delivery.

mod notices;
mod service;
mod workflow;


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::staff::{ItemId, Role, StaffId, StoreId};

pub use self::service::{
    ChainStage, ChangeEntry, ChangeLog, CreateOrderRequest, OrderFilter, ProcurementDashboard,
    ProcurementService, ProcurementSummary, ReviewRequest, TeamMember,
};
pub use self::workflow::{OrderDraft, WorkflowError};

/// Sequential order identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64, example = 42)]
pub struct OrderId(pub u64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Urgency of an order. Lists show critical orders first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, lowest first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Upper-case label used in notification text.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    /// Whether a new order of this priority warrants a warning notice.
    pub fn is_urgent(self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }
}

/// Position of an order in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingLogistics,
    PendingVpApproval,
    Approved,
    InTransit,
    Delivered,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::PendingLogistics,
        OrderStatus::PendingVpApproval,
        OrderStatus::Approved,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
    ];

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingLogistics => "pending_logistics",
            OrderStatus::PendingVpApproval => "pending_vp_approval",
            OrderStatus::Approved => "approved",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// No further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

/// Approver role shown in the chain. The VP step has no staff role of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    Requester,
    LogisticsHead,
    SeniorVp,
}

/// State of a single approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
}

/// One step of an order's approval chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApprovalStep {
    pub step: u8,
    pub role: ApproverRole,
    /// Approver name once decided, `Pending` before.
    pub name: String,
    pub status: StepStatus,
    pub timestamp: Option<DateTime<Utc>>,
    pub comments: String,
}

/// Audit trail verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    LogisticsApproved,
    LogisticsRejected,
    VpApproved,
    VpRejected,
    Shipped,
    Delivered,
    Cancelled,
}

/// One entry in an order's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub by: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

/// A request to restock an item at a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProcurementOrder {
    pub id: OrderId,
    pub item_id: ItemId,
    pub item_name: String,
    pub category: String,
    pub store_id: StoreId,
    pub store_name: String,
    pub quantity: u32,
    pub unit_cost: f64,
    /// `quantity × unit_cost`, rounded to cents.
    pub estimated_cost: f64,
    pub priority: Priority,
    pub reason: String,
    pub notes: String,
    pub status: OrderStatus,
    pub created_by: String,
    pub created_by_id: StaffId,
    pub created_by_email: String,
    pub created_by_role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub approval_chain: Vec<ApprovalStep>,
    pub history: Vec<HistoryEntry>,
}

impl ProcurementOrder {
    /// Most recent audit entry.
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}
