//! Port for alerts and alert rules.

use async_trait::async_trait;

use crate::domain::{Alert, AlertId, AlertRule, AlertRuleId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by alert repositories.
    pub enum AlertRepositoryError {
        /// Storage could not be reached.
        Unavailable { message: String } => "alert repository unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn next_id(&self) -> Result<AlertId, AlertRepositoryError>;

    /// Insert or replace an alert.
    async fn save(&self, alert: &Alert) -> Result<(), AlertRepositoryError>;

    async fn find(&self, id: AlertId) -> Result<Option<Alert>, AlertRepositoryError>;

    async fn list(&self) -> Result<Vec<Alert>, AlertRepositoryError>;

    async fn next_rule_id(&self) -> Result<AlertRuleId, AlertRepositoryError>;

    /// Insert or replace a rule.
    async fn save_rule(&self, rule: &AlertRule) -> Result<(), AlertRepositoryError>;

    async fn rules(&self) -> Result<Vec<AlertRule>, AlertRepositoryError>;

    /// Remove a rule. Returns `false` when it did not exist.
    async fn delete_rule(&self, id: AlertRuleId) -> Result<bool, AlertRepositoryError>;
}
