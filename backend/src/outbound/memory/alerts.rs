//! Alerts and alert rules kept in process memory.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{AlertRepository, AlertRepositoryError};
use crate::domain::{Alert, AlertId, AlertRule, AlertRuleId};

#[derive(Debug, Default)]
pub struct MemoryAlertRepository {
    alerts: RwLock<BTreeMap<AlertId, Alert>>,
    rules: RwLock<BTreeMap<AlertRuleId, AlertRule>>,
    alert_sequence: AtomicU64,
    rule_sequence: AtomicU64,
}

impl MemoryAlertRepository {
    /// Empty alert log with the given rules installed.
    pub fn new(rules: Vec<AlertRule>) -> Self {
        let highest = rules.iter().map(|rule| rule.id.0).max().unwrap_or(0);
        Self {
            alerts: RwLock::default(),
            rules: RwLock::new(rules.into_iter().map(|rule| (rule.id, rule)).collect()),
            alert_sequence: AtomicU64::new(0),
            rule_sequence: AtomicU64::new(highest),
        }
    }
}

#[async_trait]
impl AlertRepository for MemoryAlertRepository {
    async fn next_id(&self) -> Result<AlertId, AlertRepositoryError> {
        Ok(AlertId(self.alert_sequence.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn save(&self, alert: &Alert) -> Result<(), AlertRepositoryError> {
        self.alerts.write().await.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn find(&self, id: AlertId) -> Result<Option<Alert>, AlertRepositoryError> {
        Ok(self.alerts.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Alert>, AlertRepositoryError> {
        Ok(self.alerts.read().await.values().cloned().collect())
    }

    async fn next_rule_id(&self) -> Result<AlertRuleId, AlertRepositoryError> {
        Ok(AlertRuleId(self.rule_sequence.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn save_rule(&self, rule: &AlertRule) -> Result<(), AlertRepositoryError> {
        self.rules.write().await.insert(rule.id, rule.clone());
        Ok(())
    }

    async fn rules(&self) -> Result<Vec<AlertRule>, AlertRepositoryError> {
        Ok(self.rules.read().await.values().cloned().collect())
    }

    async fn delete_rule(&self, id: AlertRuleId) -> Result<bool, AlertRepositoryError> {
        Ok(self.rules.write().await.remove(&id).is_some())
    }
}
