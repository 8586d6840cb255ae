//! Application service driving procurement orders through their workflow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use utoipa::ToSchema;

use super::notices::{bulk_notice, notice_for};
use super::workflow::{OrderDraft, WorkflowError};
use super::{
    ApproverRole, Decision, HistoryAction, HistoryEntry, OrderId, OrderStatus, Priority,
    ProcurementOrder,
};
use crate::domain::catalogue::{CURRENCY, CatalogueItem, Store, round2};
use crate::domain::notifications::NotificationService;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{
    InventoryRepository, InventoryRepositoryError, OrderRepository, OrderRepositoryError,
    StaffDirectory, StaffDirectoryError, StoreCatalogue, StoreCatalogueError,
};
use crate::domain::staff::{ItemId, Role, StaffId, StaffMember, StoreId};
use crate::domain::Error;

const RECENT_ORDERS: usize = 20;
const DEFAULT_CHANGES: u32 = 20;
const MAX_CHANGES: u32 = 100;
const MAX_BULK_ORDERS: usize = 100;

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub item_id: ItemId,
    pub store_id: StoreId,
    #[schema(example = 120)]
    pub quantity: u32,
    /// Defaults to the catalogue cost of the item.
    #[serde(default)]
    pub unit_cost: Option<f64>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
}

/// Body of the review and cancel endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub decision: Decision,
    #[serde(default)]
    pub comments: String,
}

/// Optional filters for the order list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub priority: Option<Priority>,
    pub store_id: Option<StoreId>,
}

/// Counts per status plus outstanding spend.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProcurementSummary {
    pub pending_logistics_review: usize,
    pub pending_vp_approval: usize,
    pub approved: usize,
    pub rejected: usize,
    pub in_transit: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub total_orders: usize,
    /// Cost of orders still under review.
    pub total_cost_pending: f64,
    /// Cost of approved orders not yet delivered.
    pub total_cost_approved: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProcurementDashboard {
    pub summary: ProcurementSummary,
    pub recent_orders: Vec<ProcurementOrder>,
}

/// A member of the logistics team.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TeamMember {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub job_title: String,
}

/// One stage of the approval hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChainStage {
    pub step: u8,
    pub role: ApproverRole,
    pub title: String,
    pub description: String,
}

/// A history entry annotated with its order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChangeEntry {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub order_id: OrderId,
    pub item_name: String,
    pub store_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChangeLog {
    pub changes: Vec<ChangeEntry>,
    pub total: usize,
}

fn map_order_error(err: OrderRepositoryError) -> Error {
    match err {
        OrderRepositoryError::Unavailable { message } => {
            Error::service_unavailable(format!("orders unavailable: {message}"))
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

fn map_staff_error(err: StaffDirectoryError) -> Error {
    match err {
        StaffDirectoryError::Unavailable { message } => {
            Error::service_unavailable(format!("staff directory unavailable: {message}"))
        }
    }
}

fn map_inventory_error(err: InventoryRepositoryError) -> Error {
    match err {
        InventoryRepositoryError::Unavailable { message } => {
            Error::service_unavailable(format!("inventory unavailable: {message}"))
        }
        other => Error::internal(other.to_string()),
    }
}

fn out_of_scope(store_id: StoreId) -> Error {
    Error::forbidden(format!("store {store_id} is outside your scope"))
}

/// Orders sorted for display: most urgent first, newest first within a
/// priority.
pub(super) fn sort_for_display(orders: &mut [ProcurementOrder]) {
    orders.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });
}

/// Procurement use cases.
#[derive(Clone)]
pub struct ProcurementService {
    orders: Arc<dyn OrderRepository>,
    catalogue: Arc<dyn StoreCatalogue>,
    staff: Arc<dyn StaffDirectory>,
    inventory: Arc<dyn InventoryRepository>,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
    // Serialises read-modify-write on orders.
    write_lock: Arc<Mutex<()>>,
}

impl ProcurementService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalogue: Arc<dyn StoreCatalogue>,
        staff: Arc<dyn StaffDirectory>,
        inventory: Arc<dyn InventoryRepository>,
        notifications: NotificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            catalogue,
            staff,
            inventory,
            notifications,
            clock,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn resolve(
        &self,
        actor: &StaffMember,
        request: &CreateOrderRequest,
    ) -> Result<(CatalogueItem, Store), Error> {
        if !actor.scope.contains(request.store_id) {
            return Err(out_of_scope(request.store_id));
        }
        let store = self
            .catalogue
            .store(request.store_id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("store {} not found", request.store_id)))?;
        let item = self
            .catalogue
            .item(request.item_id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("item {} not found", request.item_id)))?;
        Ok((item, store))
    }

    async fn open_order(
        &self,
        actor: &StaffMember,
        request: CreateOrderRequest,
        resolved: (CatalogueItem, Store),
        bulk: bool,
        now: DateTime<Utc>,
    ) -> Result<ProcurementOrder, Error> {
        let (item, store) = resolved;
        let id = self.orders.next_id().await.map_err(map_order_error)?;
        let draft = OrderDraft {
            item: &item,
            store: &store,
            quantity: request.quantity,
            unit_cost: request.unit_cost.unwrap_or(item.unit_cost),
            priority: request.priority,
            reason: request.reason,
            notes: request.notes,
            bulk,
        };
        Ok(ProcurementOrder::open(id, draft, actor, now)?)
    }

    /// Raise one order for logistics review.
    pub async fn create(
        &self,
        actor: &StaffMember,
        request: CreateOrderRequest,
    ) -> Result<ProcurementOrder, Error> {
        let resolved = self.resolve(actor, &request).await?;
        let order = {
            let _guard = self.write_lock.lock().await;
            let order = self
                .open_order(actor, request, resolved, false, self.clock.utc())
                .await?;
            self.orders.save(&order).await.map_err(map_order_error)?;
            order
        };
        info!(order_id = order.id.0, created_by = %actor.email, item = %order.item_name, "procurement order created");
        self.notifications
            .raise(notice_for(&order, HistoryAction::Created, actor, ""))
            .await;
        Ok(order)
    }

    /// Raise several orders at once. Every request is validated before any
    /// order is stored; one summary notification is raised.
    pub async fn create_bulk(
        &self,
        actor: &StaffMember,
        requests: Vec<CreateOrderRequest>,
    ) -> Result<Vec<ProcurementOrder>, Error> {
        if requests.is_empty() || requests.len() > MAX_BULK_ORDERS {
            return Err(Error::invalid_request(format!(
                "orders must contain between 1 and {MAX_BULK_ORDERS} entries"
            )));
        }
        let mut resolved = Vec::with_capacity(requests.len());
        for request in &requests {
            if request.quantity == 0 {
                return Err(WorkflowError::InvalidQuantity.into());
            }
            if request.unit_cost.is_some_and(|cost| !cost.is_finite() || cost <= 0.0) {
                return Err(WorkflowError::InvalidUnitCost.into());
            }
            resolved.push(self.resolve(actor, request).await?);
        }
        let orders = {
            let _guard = self.write_lock.lock().await;
            let now = self.clock.utc();
            let mut orders = Vec::with_capacity(requests.len());
            for (request, pair) in requests.into_iter().zip(resolved) {
                orders.push(self.open_order(actor, request, pair, true, now).await?);
            }
            for order in &orders {
                self.orders.save(order).await.map_err(map_order_error)?;
            }
            orders
        };
        info!(count = orders.len(), created_by = %actor.email, "bulk procurement orders created");
        self.notifications.raise(bulk_notice(&orders, actor)).await;
        Ok(orders)
    }

    async fn visible_orders(&self, actor: &StaffMember) -> Result<Vec<ProcurementOrder>, Error> {
        let orders = self.orders.list().await.map_err(map_order_error)?;
        Ok(actor.scope.filter(orders, |order| order.store_id))
    }

    /// Filtered, paginated orders within the caller's scope.
    pub async fn list(
        &self,
        actor: &StaffMember,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<ProcurementOrder>, Error> {
        if let Some(store_id) = filter.store_id.filter(|id| !actor.scope.contains(*id)) {
            return Err(out_of_scope(store_id));
        }
        let mut orders: Vec<ProcurementOrder> = self
            .visible_orders(actor)
            .await?
            .into_iter()
            .filter(|order| filter.status.is_none_or(|status| order.status == status))
            .filter(|order| filter.priority.is_none_or(|priority| order.priority == priority))
            .filter(|order| filter.store_id.is_none_or(|store| order.store_id == store))
            .collect();
        sort_for_display(&mut orders);
        Ok(page.apply(orders))
    }

    async fn load(&self, actor: &StaffMember, id: OrderId) -> Result<ProcurementOrder, Error> {
        let order = self
            .orders
            .find(id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(|| Error::not_found(format!("order {id} not found")))?;
        if actor.scope.contains(order.store_id) {
            Ok(order)
        } else {
            Err(out_of_scope(order.store_id))
        }
    }

    /// One order with its approval chain and history.
    pub async fn get(&self, actor: &StaffMember, id: OrderId) -> Result<ProcurementOrder, Error> {
        self.load(actor, id).await
    }

    async fn transition<F>(
        &self,
        actor: &StaffMember,
        id: OrderId,
        comments: &str,
        apply: F,
    ) -> Result<ProcurementOrder, Error>
    where
        F: FnOnce(&mut ProcurementOrder, DateTime<Utc>) -> Result<HistoryAction, WorkflowError>,
    {
        let (order, action) = {
            let _guard = self.write_lock.lock().await;
            let mut order = self.load(actor, id).await?;
            let now = self.clock.utc();
            let action = apply(&mut order, now)?;
            if action == HistoryAction::Delivered {
                self.inventory
                    .adjust(order.store_id, order.item_id, i64::from(order.quantity), now)
                    .await
                    .map_err(map_inventory_error)?;
            }
            self.orders.save(&order).await.map_err(map_order_error)?;
            (order, action)
        };
        info!(order_id = id.0, ?action, status = %order.status, by = %actor.email, "procurement order updated");
        self.notifications
            .raise(notice_for(&order, action, actor, comments))
            .await;
        Ok(order)
    }

    pub async fn review_by_logistics(
        &self,
        actor: &StaffMember,
        id: OrderId,
        review: ReviewRequest,
    ) -> Result<ProcurementOrder, Error> {
        let comments = review.comments.clone();
        self.transition(actor, id, &comments, |order, now| {
            order.review_by_logistics(review.decision, &review.comments, actor, now)
        })
        .await
    }

    pub async fn decide_as_vp(
        &self,
        actor: &StaffMember,
        id: OrderId,
        review: ReviewRequest,
    ) -> Result<ProcurementOrder, Error> {
        let comments = review.comments.clone();
        self.transition(actor, id, &comments, |order, now| {
            order.decide_as_vp(review.decision, &review.comments, actor, now)
        })
        .await
    }

    pub async fn ship(&self, actor: &StaffMember, id: OrderId) -> Result<ProcurementOrder, Error> {
        self.transition(actor, id, "", |order, now| order.ship(actor, now))
            .await
    }

    /// Deliver an order and add its quantity to the store's stock.
    pub async fn deliver(
        &self,
        actor: &StaffMember,
        id: OrderId,
    ) -> Result<ProcurementOrder, Error> {
        self.transition(actor, id, "", |order, now| order.deliver(actor, now))
            .await
    }

    pub async fn cancel(
        &self,
        actor: &StaffMember,
        id: OrderId,
        reason: &str,
    ) -> Result<ProcurementOrder, Error> {
        self.transition(actor, id, reason, |order, now| order.cancel(reason, actor, now))
            .await
    }

    /// Status counts, costs and the most recent orders.
    pub async fn dashboard(&self, actor: &StaffMember) -> Result<ProcurementDashboard, Error> {
        let mut orders = self.visible_orders(actor).await?;
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        let cost = |statuses: &[OrderStatus]| {
            round2(
                orders
                    .iter()
                    .filter(|o| statuses.contains(&o.status))
                    .map(|o| f64::from(o.quantity) * o.unit_cost)
                    .sum(),
            )
        };
        let summary = ProcurementSummary {
            pending_logistics_review: count(OrderStatus::PendingLogistics),
            pending_vp_approval: count(OrderStatus::PendingVpApproval),
            approved: count(OrderStatus::Approved),
            rejected: count(OrderStatus::Rejected),
            in_transit: count(OrderStatus::InTransit),
            delivered: count(OrderStatus::Delivered),
            cancelled: count(OrderStatus::Cancelled),
            total_orders: orders.len(),
            total_cost_pending: cost(&[
                OrderStatus::PendingLogistics,
                OrderStatus::PendingVpApproval,
            ]),
            total_cost_approved: cost(&[OrderStatus::Approved, OrderStatus::InTransit]),
            currency: CURRENCY.to_owned(),
        };
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders.truncate(RECENT_ORDERS);
        Ok(ProcurementDashboard {
            summary,
            recent_orders: orders,
        })
    }

    /// Staff who handle logistics and stock.
    pub async fn team(&self) -> Result<Vec<TeamMember>, Error> {
        let staff = self.staff.list().await.map_err(map_staff_error)?;
        let mut team: Vec<TeamMember> = staff
            .into_iter()
            .filter(|member| member.has_role(&[Role::LogisticsHead, Role::InventoryManager]))
            .map(|member| TeamMember {
                id: member.id,
                name: member.display_name(),
                email: member.email,
                role: member.role,
                job_title: member.job_title,
            })
            .collect();
        team.sort_by(|a, b| {
            (a.role != Role::LogisticsHead, &a.name).cmp(&(b.role != Role::LogisticsHead, &b.name))
        });
        Ok(team)
    }

    /// The fixed approval hierarchy.
    pub fn approval_chain(&self) -> Vec<ChainStage> {
        let stage = |step, role, title: &str, description: &str| ChainStage {
            step,
            role,
            title: title.to_owned(),
            description: description.to_owned(),
        };
        vec![
            stage(
                1,
                ApproverRole::Requester,
                "Order Creator",
                "Any user with inventory access creates the procurement order",
            ),
            stage(
                2,
                ApproverRole::LogisticsHead,
                "Logistics Head Review",
                "Logistics reviews the order for feasibility, cost and supplier availability",
            ),
            stage(
                3,
                ApproverRole::SeniorVp,
                "Senior VP Final Approval",
                "The senior VP gives the final go or no-go decision",
            ),
        ]
    }

    /// Audit trail across visible orders, newest first.
    pub async fn changes(&self, actor: &StaffMember, limit: Option<u32>) -> Result<ChangeLog, Error> {
        let limit = limit.unwrap_or(DEFAULT_CHANGES);
        if limit == 0 || limit > MAX_CHANGES {
            return Err(Error::invalid_request(format!(
                "limit must be between 1 and {MAX_CHANGES}"
            )));
        }
        let mut changes: Vec<ChangeEntry> = self
            .visible_orders(actor)
            .await?
            .into_iter()
            .flat_map(|order| {
                let ProcurementOrder {
                    id,
                    item_name,
                    store_name,
                    history,
                    ..
                } = order;
                history.into_iter().map(move |entry| ChangeEntry {
                    entry,
                    order_id: id,
                    item_name: item_name.clone(),
                    store_name: store_name.clone(),
                })
            })
            .collect();
        changes.sort_by(|a, b| {
            b.entry
                .timestamp
                .cmp(&a.entry.timestamp)
                .then(b.order_id.cmp(&a.order_id))
        });
        let total = changes.len();
        changes.truncate(limit as usize);
        Ok(ChangeLog { changes, total })
    }
}
