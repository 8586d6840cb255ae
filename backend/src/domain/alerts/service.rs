//! Alert queries, lifecycle actions, detection scans and rule management.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{
    Alert, AlertId, AlertRule, AlertRuleId, AlertSeverity, AlertStatus, AlertType, Finding,
    RuleAction, RuleType, sales_anomalies, stock_findings, store_performance,
};
use crate::domain::inventory::InventoryService;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{
    AlertRepository, AlertRepositoryError, LiveEventBus, SalesHistory, SalesHistoryError,
    StoreCatalogue, StoreCatalogueError,
};
use crate::domain::staff::{StaffMember, StoreId, StoreScope};
use crate::domain::{Error, LiveEvent};

const DEFAULT_RECENT: u32 = 10;
const MAX_RECENT: u32 = 50;
const ANOMALY_WINDOW_DAYS: i64 = 7;
const PERFORMANCE_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AlertSummary {
    pub critical_alerts: usize,
    pub warning_alerts: usize,
    pub info_alerts: usize,
    pub acknowledged: usize,
    pub resolved_today: usize,
    pub total_active: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub severity: Option<AlertSeverity>,
    pub alert_type: Option<AlertType>,
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertList {
    pub alerts: Vec<Alert>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertRules {
    pub rules: Vec<AlertRule>,
    pub total: usize,
}

/// Payload for creating or replacing an alert rule.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct AlertRuleRequest {
    pub name: String,
    pub rule_type: RuleType,
    #[schema(value_type = Object)]
    pub condition: Value,
    pub action: RuleAction,
    pub severity: AlertSeverity,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl AlertRuleRequest {
    fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_request("name must not be blank")
                .with_details(json!({ "field": "name", "code": "invalid_value" })));
        }
        if !self.condition.is_object() {
            return Err(Error::invalid_request("condition must be a JSON object")
                .with_details(json!({ "field": "condition", "code": "invalid_value" })));
        }
        Ok(())
    }
}

fn map_alert_error(err: AlertRepositoryError) -> Error {
    match err {
        AlertRepositoryError::Unavailable { message } => {
            Error::service_unavailable(format!("alerts unavailable: {message}"))
        }
    }
}

fn map_history_error(err: SalesHistoryError) -> Error {
    match err {
        SalesHistoryError::Unavailable { message } => {
            Error::service_unavailable(format!("sales history unavailable: {message}"))
        }
    }
}

fn map_catalogue_error(err: StoreCatalogueError) -> Error {
    match err {
        StoreCatalogueError::Unavailable { message } => {
            Error::service_unavailable(format!("catalogue unavailable: {message}"))
        }
    }
}

fn require_rule_manager(actor: &StaffMember) -> Result<(), Error> {
    if actor.permissions().can_manage_alert_rules {
        Ok(())
    } else {
        Err(Error::forbidden("not authorised to manage alert rules"))
    }
}

/// Alerts over stock and sales.
#[derive(Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertRepository>,
    inventory: InventoryService,
    history: Arc<dyn SalesHistory>,
    catalogue: Arc<dyn StoreCatalogue>,
    bus: Arc<dyn LiveEventBus>,
    clock: Arc<dyn Clock>,
}

impl AlertService {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        inventory: InventoryService,
        history: Arc<dyn SalesHistory>,
        catalogue: Arc<dyn StoreCatalogue>,
        bus: Arc<dyn LiveEventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            inventory,
            history,
            catalogue,
            bus,
            clock,
        }
    }

    /// Alerts visible to `actor`, newest first.
    async fn visible(&self, actor: &StaffMember) -> Result<Vec<Alert>, Error> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .list()
            .await
            .map_err(map_alert_error)?
            .into_iter()
            .filter(|alert| alert.visible_to(actor))
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(alerts)
    }

    pub async fn summary(&self, actor: &StaffMember) -> Result<AlertSummary, Error> {
        let alerts = self.visible(actor).await?;
        let today = self.clock.utc().date_naive();
        let active = |severity: AlertSeverity| {
            alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Active && a.severity == severity)
                .count()
        };
        let critical_alerts = active(AlertSeverity::Critical);
        let warning_alerts = active(AlertSeverity::Warning);
        let info_alerts = active(AlertSeverity::Info);
        Ok(AlertSummary {
            critical_alerts,
            warning_alerts,
            info_alerts,
            acknowledged: alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Acknowledged)
                .count(),
            resolved_today: alerts
                .iter()
                .filter(|a| a.resolved_at.is_some_and(|at| at.date_naive() == today))
                .count(),
            total_active: critical_alerts + warning_alerts + info_alerts,
        })
    }

    pub async fn list(
        &self,
        actor: &StaffMember,
        filter: &AlertFilter,
        page: PageRequest,
    ) -> Result<Page<Alert>, Error> {
        if let Some(id) = filter.store_id.filter(|id| !actor.scope.contains(*id)) {
            return Err(Error::forbidden(format!("store {id} is outside your scope")));
        }
        let alerts: Vec<Alert> = self
            .visible(actor)
            .await?
            .into_iter()
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .filter(|a| filter.severity.is_none_or(|s| a.severity == s))
            .filter(|a| filter.alert_type.is_none_or(|t| a.alert_type == t))
            .filter(|a| filter.store_id.is_none_or(|id| a.store_id == Some(id)))
            .collect();
        Ok(page.apply(alerts))
    }

    /// Newest unresolved alerts.
    pub async fn recent(&self, actor: &StaffMember, limit: Option<u32>) -> Result<AlertList, Error> {
        let limit = limit.unwrap_or(DEFAULT_RECENT);
        if limit == 0 || limit > MAX_RECENT {
            return Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_RECENT}"
            ))
            .with_details(json!({ "field": "limit", "code": "out_of_range" })));
        }
        let alerts: Vec<Alert> = self
            .visible(actor)
            .await?
            .into_iter()
            .filter(|a| a.status != AlertStatus::Resolved)
            .collect();
        let total = alerts.len();
        Ok(AlertList {
            alerts: alerts.into_iter().take(limit as usize).collect(),
            total,
        })
    }

    async fn load(&self, actor: &StaffMember, id: AlertId) -> Result<Alert, Error> {
        self.alerts
            .find(id)
            .await
            .map_err(map_alert_error)?
            .filter(|alert| alert.visible_to(actor))
            .ok_or_else(|| Error::not_found(format!("alert {id} not found")))
    }

    pub async fn acknowledge(&self, actor: &StaffMember, id: AlertId) -> Result<Alert, Error> {
        let mut alert = self.load(actor, id).await?;
        alert.acknowledge(actor, self.clock.utc())?;
        self.alerts.save(&alert).await.map_err(map_alert_error)?;
        info!(alert_id = id.0, by = %actor.email, "alert acknowledged");
        Ok(alert)
    }

    pub async fn resolve(&self, actor: &StaffMember, id: AlertId) -> Result<Alert, Error> {
        let mut alert = self.load(actor, id).await?;
        alert.resolve(actor, self.clock.utc())?;
        self.alerts.save(&alert).await.map_err(map_alert_error)?;
        info!(alert_id = id.0, by = %actor.email, "alert resolved");
        Ok(alert)
    }

    /// Run every detector over the whole chain and store new findings.
    ///
    /// A finding whose condition already has an unresolved alert is skipped.
    /// Each stored alert is published to live subscribers. A detector whose
    /// source fails is logged and skipped so the others still run.
    pub async fn scan(&self) -> Result<Vec<Alert>, Error> {
        let now = self.clock.utc();
        let today = now.date_naive();
        let mut findings: Vec<Finding> = Vec::new();
        match self.inventory.positions(&StoreScope::All, None).await {
            Ok(positions) => findings.extend(stock_findings(&positions)),
            Err(err) => warn!(error = %err, "stock detection skipped"),
        }
        match self.sales_findings(today).await {
            Ok(found) => findings.extend(found),
            Err(err) => warn!(error = %err, "sales detection skipped"),
        }
        let open: HashSet<String> = self
            .alerts
            .list()
            .await
            .map_err(map_alert_error)?
            .into_iter()
            .filter(|alert| alert.status != AlertStatus::Resolved)
            .map(|alert| alert.fingerprint)
            .collect();
        let mut raised = Vec::new();
        for finding in findings {
            if open.contains(&finding.fingerprint) {
                continue;
            }
            let id = self.alerts.next_id().await.map_err(map_alert_error)?;
            let alert = Alert::raise(id, finding, now);
            self.alerts.save(&alert).await.map_err(map_alert_error)?;
            self.bus.publish(LiveEvent::Alert(alert.clone()));
            raised.push(alert);
        }
        if !raised.is_empty() {
            info!(count = raised.len(), "alerts raised");
        }
        Ok(raised)
    }

    async fn sales_findings(&self, today: chrono::NaiveDate) -> Result<Vec<Finding>, Error> {
        let since = today - Duration::days(PERFORMANCE_WINDOW_DAYS);
        let rows = self.history.daily(since).await.map_err(map_history_error)?;
        let stores = self.catalogue.stores().await.map_err(map_catalogue_error)?;
        let items = self.catalogue.items().await.map_err(map_catalogue_error)?;
        let anomaly_since = today - Duration::days(ANOMALY_WINDOW_DAYS);
        let recent: Vec<_> = rows
            .iter()
            .filter(|row| row.date >= anomaly_since)
            .cloned()
            .collect();
        let mut findings = sales_anomalies(&recent, &stores, &items);
        findings.extend(store_performance(&rows, today, &stores));
        Ok(findings)
    }

    pub async fn rules(&self) -> Result<AlertRules, Error> {
        let mut rules = self.alerts.rules().await.map_err(map_alert_error)?;
        rules.sort_by_key(|rule| rule.id);
        Ok(AlertRules {
            total: rules.len(),
            rules,
        })
    }

    pub async fn create_rule(
        &self,
        actor: &StaffMember,
        request: AlertRuleRequest,
    ) -> Result<AlertRule, Error> {
        require_rule_manager(actor)?;
        request.validate()?;
        let now = self.clock.utc();
        let rule = AlertRule {
            id: self.alerts.next_rule_id().await.map_err(map_alert_error)?,
            name: request.name.trim().to_owned(),
            rule_type: request.rule_type,
            condition: request.condition,
            action: request.action,
            severity: request.severity,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };
        self.alerts.save_rule(&rule).await.map_err(map_alert_error)?;
        info!(rule_id = rule.id.0, by = %actor.email, "alert rule created");
        Ok(rule)
    }

    pub async fn update_rule(
        &self,
        actor: &StaffMember,
        id: AlertRuleId,
        request: AlertRuleRequest,
    ) -> Result<AlertRule, Error> {
        require_rule_manager(actor)?;
        request.validate()?;
        let existing = self
            .alerts
            .rules()
            .await
            .map_err(map_alert_error)?
            .into_iter()
            .find(|rule| rule.id == id)
            .ok_or_else(|| Error::not_found(format!("alert rule {id} not found")))?;
        let rule = AlertRule {
            id,
            name: request.name.trim().to_owned(),
            rule_type: request.rule_type,
            condition: request.condition,
            action: request.action,
            severity: request.severity,
            is_active: request.is_active,
            created_at: existing.created_at,
            updated_at: self.clock.utc(),
        };
        self.alerts.save_rule(&rule).await.map_err(map_alert_error)?;
        info!(rule_id = id.0, by = %actor.email, "alert rule updated");
        Ok(rule)
    }

    pub async fn delete_rule(&self, actor: &StaffMember, id: AlertRuleId) -> Result<(), Error> {
        require_rule_manager(actor)?;
        if self.alerts.delete_rule(id).await.map_err(map_alert_error)? {
            info!(rule_id = id.0, by = %actor.email, "alert rule deleted");
            Ok(())
        } else {
            Err(Error::not_found(format!("alert rule {id} not found")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockAlertRepository, MockInventoryRepository, MockLiveEventBus, MockReadModelCache,
        MockSalesHistory, MockStoreCatalogue,
    };
    use crate::domain::read_model::ReadModels;
    use crate::domain::staff::Role;
    use crate::test_support::{FixtureClock, staff_in_stores, staff_with_role};
    use rstest::rstest;

    struct Mocks {
        alerts: MockAlertRepository,
        inventory: MockInventoryRepository,
        history: MockSalesHistory,
        catalogue: MockStoreCatalogue,
        bus: MockLiveEventBus,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                alerts: MockAlertRepository::new(),
                inventory: MockInventoryRepository::new(),
                history: MockSalesHistory::new(),
                catalogue: MockStoreCatalogue::new(),
                bus: MockLiveEventBus::new(),
            }
        }

        fn build(self) -> AlertService {
            let catalogue: Arc<dyn StoreCatalogue> = Arc::new(self.catalogue);
            let clock: Arc<dyn Clock> = Arc::new(FixtureClock::default());
            let mut cache = MockReadModelCache::new();
            cache.expect_get().returning(|_| Ok(None));
            cache.expect_put().returning(|_, _, _| Ok(()));
            let inventory = InventoryService::new(
                Arc::new(self.inventory),
                Arc::clone(&catalogue),
                ReadModels::new(Arc::new(cache), std::time::Duration::from_secs(60)),
                Arc::clone(&clock),
            );
            AlertService::new(
                Arc::new(self.alerts),
                inventory,
                Arc::new(self.history),
                catalogue,
                Arc::new(self.bus),
                clock,
            )
        }
    }

    fn stored(id: u64, store_id: Option<StoreId>, status: AlertStatus) -> Alert {
        let mut alert = Alert::raise(
            AlertId(id),
            Finding {
                fingerprint: format!("stock:{}:{id}", store_id.unwrap_or_default()),
                title: format!("Alert {id}"),
                message: String::new(),
                alert_type: AlertType::Inventory,
                severity: AlertSeverity::Critical,
                store_id,
                store_name: None,
                item_id: Some(1),
            },
            FixtureClock::default_instant() - Duration::minutes(i64::try_from(id).unwrap_or(0)),
        );
        alert.status = status;
        alert
    }

    fn rule_request(name: &str) -> AlertRuleRequest {
        AlertRuleRequest {
            name: name.to_owned(),
            rule_type: RuleType::LowStock,
            condition: json!({ "threshold": 10 }),
            action: RuleAction::Notify,
            severity: AlertSeverity::Warning,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn summary_counts_only_visible_alerts() {
        let mut mocks = Mocks::new();
        mocks.alerts.expect_list().returning(|| {
            Ok(vec![
                stored(1, Some(1), AlertStatus::Active),
                stored(2, Some(2), AlertStatus::Active),
                stored(3, None, AlertStatus::Acknowledged),
            ])
        });
        let summary = mocks
            .build()
            .summary(&staff_in_stores(Role::StoreManager, &[1]))
            .await
            .expect("summary");
        assert_eq!(summary.critical_alerts, 1);
        assert_eq!(summary.acknowledged, 1);
        assert_eq!(summary.total_active, 1);
    }

    #[tokio::test]
    async fn recent_skips_resolved_and_orders_newest_first() {
        let mut mocks = Mocks::new();
        mocks.alerts.expect_list().returning(|| {
            Ok(vec![
                stored(3, None, AlertStatus::Active),
                stored(1, None, AlertStatus::Acknowledged),
                stored(2, None, AlertStatus::Resolved),
            ])
        });
        let recent = mocks
            .build()
            .recent(&staff_with_role(Role::Analyst), Some(5))
            .await
            .expect("recent");
        let ids: Vec<AlertId> = recent.alerts.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![AlertId(1), AlertId(3)]);
        assert_eq!(recent.total, 2);
    }

    #[tokio::test]
    async fn acknowledging_hidden_alert_is_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .alerts
            .expect_find()
            .returning(|_| Ok(Some(stored(1, Some(9), AlertStatus::Active))));
        let err = mocks
            .build()
            .acknowledge(&staff_in_stores(Role::StoreManager, &[1]), AlertId(1))
            .await
            .expect_err("outside scope");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn scan_survives_failed_detector() {
        let mut mocks = Mocks::new();
        mocks.catalogue.expect_stores().returning(|| Ok(Vec::new()));
        mocks.catalogue.expect_items().returning(|| Ok(Vec::new()));
        mocks.inventory.expect_stock().returning(|_| Ok(Vec::new()));
        mocks.history.expect_daily().returning(|_| {
            Err(SalesHistoryError::unavailable("offline"))
        });
        mocks
            .alerts
            .expect_list()
            .returning(|| Ok(vec![stored(1, Some(1), AlertStatus::Active)]));
        mocks.alerts.expect_next_id().never();
        mocks.bus.expect_publish().never();
        let raised = mocks.build().scan().await.expect("scan survives a failed detector");
        assert!(raised.is_empty());
    }

    #[rstest]
    #[case(Role::StoreManager, ErrorCode::Forbidden)]
    #[case(Role::Analyst, ErrorCode::Forbidden)]
    #[tokio::test]
    async fn rule_changes_need_senior_role(#[case] role: Role, #[case] expected: ErrorCode) {
        let err = Mocks::new()
            .build()
            .create_rule(&staff_with_role(role), rule_request("Shelf gap"))
            .await
            .expect_err("not permitted");
        assert_eq!(err.code(), expected);
    }

    #[tokio::test]
    async fn regional_manager_creates_rules() {
        let mut mocks = Mocks::new();
        mocks
            .alerts
            .expect_next_rule_id()
            .returning(|| Ok(AlertRuleId(6)));
        mocks.alerts.expect_save_rule().times(1).returning(|_| Ok(()));
        let rule = mocks
            .build()
            .create_rule(&staff_with_role(Role::RegionalManager), rule_request(" Shelf gap "))
            .await
            .expect("created");
        assert_eq!(rule.id, AlertRuleId(6));
        assert_eq!(rule.name, "Shelf gap");
    }

    #[tokio::test]
    async fn deleting_missing_rule_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.alerts.expect_delete_rule().returning(|_| Ok(false));
        let err = mocks
            .build()
            .delete_rule(&staff_with_role(Role::SuperAdmin), AlertRuleId(77))
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    fn rule_condition_must_be_an_object() {
        let mut request = rule_request("Bad");
        request.condition = json!([1, 2]);
        assert!(request.validate().is_err());
    }
}
