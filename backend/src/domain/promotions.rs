//! Promotions: lifecycle, validation, reporting and slow-mover suggestions.
//!
//! A promotion's stored status only pins the two states a person chooses
//! (`draft` and `cancelled`). Every other status is derived from the trading
//! dates against today, so a promotion moves from `scheduled` to `active` to
//! `ended` without anything rewriting it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::catalogue::{CURRENCY, CatalogueItem, round2};
use super::pagination::{Page, PageRequest};
use super::ports::{
    PromotionRepository, PromotionRepositoryError, SalesHistory, SalesHistoryError,
    StoreCatalogue, StoreCatalogueError,
};
use super::read_model::ReadModels;
use super::sales::DailySales;
use super::staff::{ItemId, StaffMember, StoreId};
use super::Error;

/// Ratio of the category velocity below which an item counts as slow.
const SLOW_MOVER_RATIO: f64 = 0.6;
const MAX_SUGGESTIONS: usize = 10;
const SUGGESTION_WINDOW_DAYS: i64 = 30;
const SUGGESTED_DISCOUNTS: [f64; 4] = [15.0, 20.0, 25.0, 30.0];
const SLOW_MOVER_REASON: &str = "Below category average sales velocity";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64)]
pub struct PromotionId(pub u64);

impl std::fmt::Display for PromotionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
    Bogo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    Draft,
    Scheduled,
    Active,
    Ended,
    Cancelled,
}

impl PromotionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Promotion {
    pub id: PromotionId,
    pub name: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_purchase: Option<f64>,
    pub max_discount: Option<f64>,
    pub store_ids: Vec<StoreId>,
    pub item_ids: Vec<ItemId>,
    pub category: Option<String>,
    pub status: PromotionStatus,
    pub redemptions: u64,
    pub discount_given: f64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Status on `today`, honouring the pinned `draft` and `cancelled` states.
    pub fn status_on(&self, today: NaiveDate) -> PromotionStatus {
        match self.status {
            PromotionStatus::Draft | PromotionStatus::Cancelled => self.status,
            _ if today < self.start_date => PromotionStatus::Scheduled,
            _ if today > self.end_date => PromotionStatus::Ended,
            _ => PromotionStatus::Active,
        }
    }

    fn as_of(mut self, today: NaiveDate) -> Self {
        self.status = self.status_on(today);
        self
    }

    /// Whether any participating store is in `actor`'s scope.
    pub fn visible_to(&self, actor: &StaffMember) -> bool {
        self.store_ids.iter().any(|id| actor.scope.contains(*id))
    }

    fn validate(&self) -> Result<(), Error> {
        let field_error = |field: &str, message: &str| {
            Error::invalid_request(message)
                .with_details(json!({ "field": field, "code": "invalid_value" }))
        };
        if self.name.trim().is_empty() {
            return Err(field_error("name", "name must not be blank"));
        }
        if self.end_date < self.start_date {
            return Err(field_error("end_date", "end_date must not precede start_date"));
        }
        if !(self.discount_value > 0.0) {
            return Err(field_error("discount_value", "discount_value must be positive"));
        }
        if self.discount_type == DiscountType::Percentage && self.discount_value > 100.0 {
            return Err(field_error(
                "discount_value",
                "percentage discounts cannot exceed 100",
            ));
        }
        if self.store_ids.is_empty() {
            return Err(field_error("store_ids", "at least one store is required"));
        }
        Ok(())
    }
}

/// Payload for `POST /api/promotions/create`.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CreatePromotionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub min_purchase: Option<f64>,
    #[serde(default)]
    pub max_discount: Option<f64>,
    pub store_ids: Vec<StoreId>,
    #[serde(default)]
    pub item_ids: Vec<ItemId>,
    #[serde(default)]
    pub category: Option<String>,
    /// Keep the promotion as a draft instead of publishing it.
    #[serde(default)]
    pub draft: bool,
}

/// Payload for `PUT /api/promotions/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct UpdatePromotionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_value: Option<f64>,
    pub end_date: Option<NaiveDate>,
    /// `draft` unpublishes, `active` or `scheduled` publishes, `cancelled`
    /// cancels. `ended` cannot be set directly.
    pub status: Option<PromotionStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionFilter {
    pub status: Option<PromotionStatus>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionSummary {
    pub active_promotions: usize,
    pub scheduled_promotions: usize,
    pub ended_promotions: usize,
    pub draft_promotions: usize,
    pub cancelled_promotions: usize,
    pub total_discounts_given: f64,
    pub total_redemptions: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivePromotions {
    pub promotions: Vec<Promotion>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionSuggestion {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: String,
    /// Average units per store-day over the last 30 days.
    pub current_velocity: f64,
    pub category_avg_velocity: f64,
    pub suggested_discount: f64,
    pub suggested_type: DiscountType,
    pub original_price: f64,
    pub suggested_price: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionSuggestions {
    pub suggestions: Vec<PromotionSuggestion>,
    pub total: usize,
}

/// Items selling below [`SLOW_MOVER_RATIO`] of their category's average
/// velocity, slowest first.
pub fn slow_movers(rows: &[DailySales], items: &[CatalogueItem]) -> Vec<PromotionSuggestion> {
    let mut per_item: BTreeMap<ItemId, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let entry = per_item.entry(row.item_id).or_default();
        entry.0 += row.units;
        entry.1 += 1;
    }
    let catalogue: HashMap<ItemId, &CatalogueItem> =
        items.iter().map(|item| (item.id, item)).collect();
    let velocities: Vec<(&CatalogueItem, f64)> = per_item
        .into_iter()
        .filter_map(|(item_id, (units, days))| {
            let item = catalogue.get(&item_id)?;
            Some((*item, units as f64 / days as f64))
        })
        .collect();
    let mut per_category: HashMap<&str, (f64, usize)> = HashMap::new();
    for (item, velocity) in &velocities {
        let entry = per_category.entry(item.category.as_str()).or_default();
        entry.0 += velocity;
        entry.1 += 1;
    }
    let mut slow: Vec<(&CatalogueItem, f64, f64)> = velocities
        .into_iter()
        .filter_map(|(item, velocity)| {
            let (sum, count) = per_category.get(item.category.as_str())?;
            let average = sum / *count as f64;
            (velocity < average * SLOW_MOVER_RATIO).then_some((item, velocity, average))
        })
        .collect();
    slow.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)));
    slow.into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(item, velocity, average)| {
            let discount = suggested_discount(item.id);
            PromotionSuggestion {
                item_id: item.id,
                item_name: item.name.clone(),
                category: item.category.clone(),
                current_velocity: round2(velocity),
                category_avg_velocity: round2(average),
                suggested_discount: discount,
                suggested_type: DiscountType::Percentage,
                original_price: item.unit_price,
                suggested_price: round2(item.unit_price * (1.0 - discount / 100.0)),
                reason: SLOW_MOVER_REASON.to_owned(),
            }
        })
        .collect()
}

fn suggested_discount(item_id: ItemId) -> f64 {
    let index = item_id as usize % SUGGESTED_DISCOUNTS.len();
    SUGGESTED_DISCOUNTS.get(index).copied().unwrap_or(15.0)
}

fn map_promotion_error(err: PromotionRepositoryError) -> Error {
    match err {
        PromotionRepositoryError::Unavailable { message } => {
            Error::service_unavailable(format!("promotions unavailable: {message}"))
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

fn require_manager(actor: &StaffMember) -> Result<(), Error> {
    if actor.permissions().can_manage_promotions {
        Ok(())
    } else {
        Err(Error::forbidden("not authorised to manage promotions"))
    }
}

fn check_stores(actor: &StaffMember, store_ids: &[StoreId]) -> Result<(), Error> {
    match store_ids.iter().find(|id| !actor.scope.contains(**id)) {
        Some(id) => Err(Error::forbidden(format!("store {id} is outside your scope"))),
        None => Ok(()),
    }
}

fn invalid_transition(promotion: &Promotion, today: NaiveDate, action: &str) -> Error {
    let status = promotion.status_on(today);
    Error::invalid_request(format!(
        "cannot {action} promotion {} while it is {}",
        promotion.id,
        status.as_str()
    ))
    .with_details(json!({ "code": "invalid_transition", "status": status }))
}

/// Promotion management and reporting.
#[derive(Clone)]
pub struct PromotionService {
    promotions: Arc<dyn PromotionRepository>,
    catalogue: Arc<dyn StoreCatalogue>,
    history: Arc<dyn SalesHistory>,
    read_models: ReadModels,
    clock: Arc<dyn Clock>,
}

impl PromotionService {
    pub fn new(
        promotions: Arc<dyn PromotionRepository>,
        catalogue: Arc<dyn StoreCatalogue>,
        history: Arc<dyn SalesHistory>,
        read_models: ReadModels,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            promotions,
            catalogue,
            history,
            read_models,
            clock,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    /// Promotions visible to `actor` with their status as of today, newest first.
    async fn visible(&self, actor: &StaffMember) -> Result<Vec<Promotion>, Error> {
        let today = self.today();
        let mut promotions: Vec<Promotion> = self
            .promotions
            .list()
            .await
            .map_err(map_promotion_error)?
            .into_iter()
            .filter(|promotion| promotion.visible_to(actor))
            .map(|promotion| promotion.as_of(today))
            .collect();
        promotions.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(promotions)
    }

    pub async fn summary(&self, actor: &StaffMember) -> Result<PromotionSummary, Error> {
        let promotions = self.visible(actor).await?;
        let count = |status: PromotionStatus| {
            promotions
                .iter()
                .filter(|promotion| promotion.status == status)
                .count()
        };
        Ok(PromotionSummary {
            active_promotions: count(PromotionStatus::Active),
            scheduled_promotions: count(PromotionStatus::Scheduled),
            ended_promotions: count(PromotionStatus::Ended),
            draft_promotions: count(PromotionStatus::Draft),
            cancelled_promotions: count(PromotionStatus::Cancelled),
            total_discounts_given: round2(promotions.iter().map(|p| p.discount_given).sum()),
            total_redemptions: promotions.iter().map(|p| p.redemptions).sum(),
            currency: CURRENCY.to_owned(),
        })
    }

    /// Promotions running today, optionally narrowed to a store or category.
    pub async fn active(
        &self,
        actor: &StaffMember,
        store_id: Option<StoreId>,
        category: Option<&str>,
    ) -> Result<ActivePromotions, Error> {
        if let Some(id) = store_id.filter(|id| !actor.scope.contains(*id)) {
            return Err(Error::forbidden(format!("store {id} is outside your scope")));
        }
        let promotions: Vec<Promotion> = self
            .visible(actor)
            .await?
            .into_iter()
            .filter(|p| p.status == PromotionStatus::Active)
            .filter(|p| store_id.is_none_or(|id| p.store_ids.contains(&id)))
            .filter(|p| category.is_none_or(|c| p.category.as_deref() == Some(c)))
            .collect();
        Ok(ActivePromotions {
            total: promotions.len(),
            promotions,
        })
    }

    pub async fn list(
        &self,
        actor: &StaffMember,
        filter: &PromotionFilter,
        page: PageRequest,
    ) -> Result<Page<Promotion>, Error> {
        let promotions: Vec<Promotion> = self
            .visible(actor)
            .await?
            .into_iter()
            .filter(|p| filter.status.is_none_or(|status| p.status == status))
            .filter(|p| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| p.category.as_deref() == Some(c))
            })
            .collect();
        Ok(page.apply(promotions))
    }

    /// Discount ideas for slow-moving items in the caller's scope.
    pub async fn suggestions(&self, actor: &StaffMember) -> Result<PromotionSuggestions, Error> {
        let today = self.today();
        let params = json!({ "scope": actor.scope, "today": today });
        self.read_models
            .get_or_compute("promotion-suggestions", &params, || async {
                let since = today - Duration::days(SUGGESTION_WINDOW_DAYS);
                let rows = self.history.daily(since).await.map_err(map_history_error)?;
                let rows = actor.scope.filter(rows, |row| row.store_id);
                let items = self.catalogue.items().await.map_err(map_catalogue_error)?;
                let suggestions = slow_movers(&rows, &items);
                Ok(PromotionSuggestions {
                    total: suggestions.len(),
                    suggestions,
                })
            })
            .await
    }

    pub async fn create(
        &self,
        actor: &StaffMember,
        request: CreatePromotionRequest,
    ) -> Result<Promotion, Error> {
        require_manager(actor)?;
        check_stores(actor, &request.store_ids)?;
        let now = self.clock.utc();
        let mut promotion = Promotion {
            id: PromotionId(0),
            name: request.name.trim().to_owned(),
            description: request.description,
            discount_type: request.discount_type,
            discount_value: request.discount_value,
            start_date: request.start_date,
            end_date: request.end_date,
            min_purchase: request.min_purchase,
            max_discount: request.max_discount,
            store_ids: request.store_ids,
            item_ids: request.item_ids,
            category: request.category,
            status: if request.draft {
                PromotionStatus::Draft
            } else {
                PromotionStatus::Scheduled
            },
            redemptions: 0,
            discount_given: 0.0,
            created_by: actor.display_name(),
            created_at: now,
            updated_at: now,
        };
        promotion.validate()?;
        promotion.id = self.promotions.next_id().await.map_err(map_promotion_error)?;
        let promotion = promotion.as_of(now.date_naive());
        self.promotions
            .save(&promotion)
            .await
            .map_err(map_promotion_error)?;
        info!(
            promotion_id = promotion.id.0,
            status = promotion.status.as_str(),
            by = %actor.email,
            "promotion created"
        );
        Ok(promotion)
    }

    async fn load(&self, actor: &StaffMember, id: PromotionId) -> Result<Promotion, Error> {
        self.promotions
            .find(id)
            .await
            .map_err(map_promotion_error)?
            .filter(|promotion| promotion.visible_to(actor))
            .ok_or_else(|| Error::not_found(format!("promotion {id} not found")))
    }

    pub async fn get(&self, actor: &StaffMember, id: PromotionId) -> Result<Promotion, Error> {
        Ok(self.load(actor, id).await?.as_of(self.today()))
    }

    pub async fn update(
        &self,
        actor: &StaffMember,
        id: PromotionId,
        request: UpdatePromotionRequest,
    ) -> Result<Promotion, Error> {
        require_manager(actor)?;
        let mut promotion = self.load(actor, id).await?;
        let now = self.clock.utc();
        let today = now.date_naive();
        if promotion.status == PromotionStatus::Cancelled {
            return Err(invalid_transition(&promotion, today, "update"));
        }
        if let Some(name) = request.name {
            promotion.name = name.trim().to_owned();
        }
        if let Some(description) = request.description {
            promotion.description = description;
        }
        if let Some(value) = request.discount_value {
            promotion.discount_value = value;
        }
        if let Some(end_date) = request.end_date {
            promotion.end_date = end_date;
        }
        match request.status {
            None => {}
            Some(PromotionStatus::Ended) => {
                return Err(Error::invalid_request("status ended cannot be set directly")
                    .with_details(json!({ "field": "status", "code": "invalid_value" })));
            }
            Some(PromotionStatus::Draft) => promotion.status = PromotionStatus::Draft,
            Some(PromotionStatus::Cancelled) => promotion.status = PromotionStatus::Cancelled,
            Some(PromotionStatus::Active | PromotionStatus::Scheduled) => {
                promotion.status = PromotionStatus::Scheduled;
            }
        }
        promotion.validate()?;
        promotion.updated_at = now;
        let promotion = promotion.as_of(today);
        self.promotions
            .save(&promotion)
            .await
            .map_err(map_promotion_error)?;
        info!(promotion_id = id.0, by = %actor.email, "promotion updated");
        Ok(promotion)
    }

    /// Cancel a promotion. Cancelling twice is rejected.
    pub async fn cancel(&self, actor: &StaffMember, id: PromotionId) -> Result<Promotion, Error> {
        require_manager(actor)?;
        let mut promotion = self.load(actor, id).await?;
        let now = self.clock.utc();
        if promotion.status == PromotionStatus::Cancelled {
            return Err(invalid_transition(&promotion, now.date_naive(), "cancel"));
        }
        promotion.status = PromotionStatus::Cancelled;
        promotion.updated_at = now;
        self.promotions
            .save(&promotion)
            .await
            .map_err(map_promotion_error)?;
        info!(promotion_id = id.0, by = %actor.email, "promotion cancelled");
        Ok(promotion)
    }
}
