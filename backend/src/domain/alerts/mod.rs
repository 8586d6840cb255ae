//! Operational alerts and the rules that describe them.
//!
//! Alerts are raised by [`detection`] scans over stock and sales, then move
//! `active → acknowledged → resolved` (an active alert may also be resolved
//! directly). Rules are stored configuration edited by senior staff.

mod detection;
mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use super::Error;
use super::staff::{ItemId, StaffMember, StoreId};

pub use self::detection::{
    ANOMALY_SIGMA, Finding, STORE_CHANGE_THRESHOLD_PCT, sales_anomalies, stock_findings,
    store_performance,
};
pub use self::service::{
    AlertFilter, AlertList, AlertRuleRequest, AlertRules, AlertService, AlertSummary,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64)]
pub struct AlertId(pub u64);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64)]
pub struct AlertRuleId(pub u64);

impl std::fmt::Display for AlertRuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Inventory,
    Sales,
    Promotion,
    System,
    Procurement,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
        }
    }
}

/// Raised when an alert is asked to move from a status that forbids it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} alert {id} while it is {}", .status.as_str())]
pub struct AlertTransitionError {
    pub id: AlertId,
    pub status: AlertStatus,
    pub action: &'static str,
}

impl From<AlertTransitionError> for Error {
    fn from(err: AlertTransitionError) -> Self {
        let status = err.status;
        Error::invalid_request(err.to_string())
            .with_details(json!({ "code": "invalid_transition", "status": status }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub store_id: Option<StoreId>,
    pub store_name: Option<String>,
    pub item_id: Option<ItemId>,
    pub created_at: DateTime<Utc>,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Identity of the condition that raised the alert; a condition raises
    /// at most one unresolved alert.
    #[serde(skip)]
    pub fingerprint: String,
}

impl Alert {
    /// Promote a detection finding to a stored alert.
    pub fn raise(id: AlertId, finding: Finding, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: finding.title,
            message: finding.message,
            alert_type: finding.alert_type,
            severity: finding.severity,
            status: AlertStatus::Active,
            store_id: finding.store_id,
            store_name: finding.store_name,
            item_id: finding.item_id,
            created_at: now,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_by: None,
            resolved_at: None,
            fingerprint: finding.fingerprint,
        }
    }

    /// Chain-wide alerts have no store and are visible to everyone.
    pub fn visible_to(&self, member: &StaffMember) -> bool {
        self.store_id.is_none_or(|id| member.scope.contains(id))
    }

    pub fn acknowledge(
        &mut self,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<(), AlertTransitionError> {
        if self.status != AlertStatus::Active {
            return Err(self.refuse("acknowledge"));
        }
        self.status = AlertStatus::Acknowledged;
        self.acknowledged_by = Some(actor.display_name());
        self.acknowledged_at = Some(now);
        Ok(())
    }

    pub fn resolve(
        &mut self,
        actor: &StaffMember,
        now: DateTime<Utc>,
    ) -> Result<(), AlertTransitionError> {
        if self.status == AlertStatus::Resolved {
            return Err(self.refuse("resolve"));
        }
        self.status = AlertStatus::Resolved;
        self.resolved_by = Some(actor.display_name());
        self.resolved_at = Some(now);
        Ok(())
    }

    fn refuse(&self, action: &'static str) -> AlertTransitionError {
        AlertTransitionError {
            id: self.id,
            status: self.status,
            action,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    LowStock,
    HighSales,
    LowSales,
    Expiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Notify,
    Email,
    AutoReorder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertRule {
    pub id: AlertRuleId,
    pub name: String,
    pub rule_type: RuleType,
    /// Free-form thresholds, for example `{"threshold": 50, "unit": "units"}`.
    #[schema(value_type = Object)]
    pub condition: Value,
    pub action: RuleAction,
    pub severity: AlertSeverity,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rules installed in an empty rule store.
pub fn default_rules(now: DateTime<Utc>) -> Vec<AlertRule> {
    let rule = |id, name: &str, rule_type, condition, action, severity, is_active| AlertRule {
        id: AlertRuleId(id),
        name: name.to_owned(),
        rule_type,
        condition,
        action,
        severity,
        is_active,
        created_at: now,
        updated_at: now,
    };
    vec![
        rule(
            1,
            "Low Stock Alert",
            RuleType::LowStock,
            json!({ "threshold": 50, "unit": "units" }),
            RuleAction::Notify,
            AlertSeverity::Warning,
            true,
        ),
        rule(
            2,
            "Out of Stock Critical",
            RuleType::LowStock,
            json!({ "threshold": 0, "unit": "units" }),
            RuleAction::Email,
            AlertSeverity::Critical,
            true,
        ),
        rule(
            3,
            "High Sales Spike",
            RuleType::HighSales,
            json!({ "threshold": 200, "unit": "percent_above_avg" }),
            RuleAction::Notify,
            AlertSeverity::Info,
            true,
        ),
        rule(
            4,
            "Low Sales Alert",
            RuleType::LowSales,
            json!({ "threshold": 50, "unit": "percent_below_avg" }),
            RuleAction::Notify,
            AlertSeverity::Warning,
            true,
        ),
        rule(
            5,
            "Expiry Warning",
            RuleType::Expiry,
            json!({ "threshold": 7, "unit": "days" }),
            RuleAction::Notify,
            AlertSeverity::Warning,
            false,
        ),
    ]
}
