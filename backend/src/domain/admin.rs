//! Administration views over staff and stores.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::auth::{StaffProfile, map_directory_error};
use super::catalogue::Store;
use super::pagination::{Page, PageRequest};
use super::ports::{
    SalesHistory, SalesHistoryError, StaffDirectory, StoreCatalogue, StoreCatalogueError,
};
use super::staff::{Role, StaffId, StaffMember, StoreId};
use super::Error;

const ACTIVITY_WINDOW_DAYS: i64 = 30;
const TOP_CATEGORIES: usize = 5;

/// Filters for the staff list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreOverview {
    pub id: StoreId,
    pub name: String,
    pub city: String,
    pub region_id: u32,
    /// Units sold over the last 30 days.
    pub total_sales_30d: u64,
    /// Distinct items sold over the last 30 days.
    pub items_sold: usize,
    pub last_sale_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreOverviewList {
    pub stores: Vec<StoreOverview>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySales {
    pub category: String,
    pub units: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoreDetail {
    #[serde(flatten)]
    pub overview: StoreOverview,
    pub this_week: u64,
    pub last_week: u64,
    pub staff_count: usize,
    pub top_categories: Vec<CategorySales>,
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

fn require_super_admin(actor: &StaffMember) -> Result<(), Error> {
    if actor.role == Role::SuperAdmin {
        Ok(())
    } else {
        Err(Error::forbidden("super admin access required"))
    }
}

fn matches(member: &StaffMember, filter: &UserFilter) -> bool {
    let role_ok = filter.role.is_none_or(|role| member.role == role);
    let search_ok = filter.search.as_deref().is_none_or(|needle| {
        let needle = needle.trim().to_lowercase();
        member.email.to_lowercase().contains(&needle)
            || member.display_name().to_lowercase().contains(&needle)
    });
    role_ok && search_ok
}

/// Staff and store administration.
#[derive(Clone)]
pub struct AdminService {
    directory: Arc<dyn StaffDirectory>,
    catalogue: Arc<dyn StoreCatalogue>,
    history: Arc<dyn SalesHistory>,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(
        directory: Arc<dyn StaffDirectory>,
        catalogue: Arc<dyn StoreCatalogue>,
        history: Arc<dyn SalesHistory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            catalogue,
            history,
            clock,
        }
    }

    /// Staff directory, super admins only.
    pub async fn users(
        &self,
        actor: &StaffMember,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Page<StaffProfile>, Error> {
        require_super_admin(actor)?;
        let members: Vec<StaffMember> = self
            .directory
            .list()
            .await
            .map_err(map_directory_error)?
            .into_iter()
            .filter(|member| matches(member, filter))
            .collect();
        Ok(page.apply(members).map(|member| StaffProfile::from(&member)))
    }

    pub async fn user(&self, actor: &StaffMember, id: &StaffId) -> Result<StaffProfile, Error> {
        require_super_admin(actor)?;
        self.directory
            .find(id)
            .await
            .map_err(map_directory_error)?
            .map(|member| StaffProfile::from(&member))
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    /// Stores in scope with 30-day activity.
    pub async fn stores(&self, actor: &StaffMember) -> Result<StoreOverviewList, Error> {
        let stores = self.catalogue.stores().await.map_err(map_catalogue_error)?;
        let stores = actor.scope.filter(stores, |store| store.id);
        let since = self.clock.utc().date_naive() - Duration::days(ACTIVITY_WINDOW_DAYS);
        let rows = self.history.daily(since).await.map_err(map_history_error)?;
        let mut activity: HashMap<StoreId, (u64, BTreeSet<u32>, Option<NaiveDate>)> =
            HashMap::new();
        for row in rows.iter().filter(|row| row.units > 0) {
            let entry = activity.entry(row.store_id).or_default();
            entry.0 += row.units;
            entry.1.insert(row.item_id);
            entry.2 = entry.2.max(Some(row.date));
        }
        let stores: Vec<StoreOverview> = stores
            .into_iter()
            .map(|store| {
                let (units, items, last) = activity.remove(&store.id).unwrap_or_default();
                overview(store, units, items.len(), last)
            })
            .collect();
        Ok(StoreOverviewList {
            total: stores.len(),
            stores,
        })
    }

    /// One store with weekly comparison, headcount and best categories.
    pub async fn store(&self, actor: &StaffMember, id: StoreId) -> Result<StoreDetail, Error> {
        if !actor.scope.contains(id) {
            return Err(Error::forbidden(format!("store {id} is outside your scope")));
        }
        let store = self
            .catalogue
            .store(id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("store {id} not found")))?;
        let today = self.clock.utc().date_naive();
        let week_ago = today - Duration::days(7);
        let fortnight_ago = today - Duration::days(14);
        let rows: Vec<_> = self
            .history
            .daily(today - Duration::days(ACTIVITY_WINDOW_DAYS))
            .await
            .map_err(map_history_error)?
            .into_iter()
            .filter(|row| row.store_id == id)
            .collect();
        let categories: HashMap<u32, String> = self
            .catalogue
            .items()
            .await
            .map_err(map_catalogue_error)?
            .into_iter()
            .map(|item| (item.id, item.category))
            .collect();
        let mut per_category: HashMap<String, u64> = HashMap::new();
        for row in &rows {
            if let Some(category) = categories.get(&row.item_id) {
                *per_category.entry(category.clone()).or_default() += row.units;
            }
        }
        let mut top_categories: Vec<CategorySales> = per_category
            .into_iter()
            .map(|(category, units)| CategorySales { category, units })
            .collect();
        top_categories.sort_by(|a, b| b.units.cmp(&a.units).then(a.category.cmp(&b.category)));
        top_categories.truncate(TOP_CATEGORIES);
        let staff_count = self
            .directory
            .list()
            .await
            .map_err(map_directory_error)?
            .iter()
            .filter(|member| member.scope.contains(id))
            .count();
        let sum_where = |pred: &dyn Fn(NaiveDate) -> bool| -> u64 {
            rows.iter().filter(|r| pred(r.date)).map(|r| r.units).sum()
        };
        let active: Vec<_> = rows.iter().filter(|r| r.units > 0).collect();
        let items: BTreeSet<u32> = active.iter().map(|r| r.item_id).collect();
        let last = active.iter().map(|r| r.date).max();
        Ok(StoreDetail {
            this_week: sum_where(&|d| d >= week_ago),
            last_week: sum_where(&|d| d >= fortnight_ago && d < week_ago),
            overview: overview(store, sum_where(&|_| true), items.len(), last),
            staff_count,
            top_categories,
        })
    }
}

fn overview(store: Store, units: u64, items_sold: usize, last: Option<NaiveDate>) -> StoreOverview {
    StoreOverview {
        id: store.id,
        name: store.name,
        city: store.city,
        region_id: store.region_id,
        total_sales_30d: units,
        items_sold,
        last_sale_date: last,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockSalesHistory, MockStaffDirectory, MockStoreCatalogue};
    use crate::domain::sales::DailySales;
    use crate::test_support::{FixtureClock, staff_in_stores, staff_with_role, store};
    use rstest::rstest;

    fn service(
        directory: MockStaffDirectory,
        catalogue: MockStoreCatalogue,
        history: MockSalesHistory,
    ) -> AdminService {
        AdminService::new(
            Arc::new(directory),
            Arc::new(catalogue),
            Arc::new(history),
            Arc::new(FixtureClock::default()),
        )
    }

    #[rstest]
    #[case(Role::RegionalManager)]
    #[case(Role::Analyst)]
    #[tokio::test]
    async fn users_are_super_admin_only(#[case] role: Role) {
        let page = PageRequest::new(None, None, 20, 100).expect("page");
        let err = service(
            MockStaffDirectory::new(),
            MockStoreCatalogue::new(),
            MockSalesHistory::new(),
        )
        .users(&staff_with_role(role), &UserFilter::default(), page)
        .await
        .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn users_filter_by_role_and_search() {
        let mut directory = MockStaffDirectory::new();
        directory.expect_list().returning(|| {
            Ok(vec![
                staff_with_role(Role::Analyst),
                staff_with_role(Role::LogisticsHead),
                staff_with_role(Role::StoreManager),
            ])
        });
        let page = PageRequest::new(None, None, 20, 100).expect("page");
        let filter = UserFilter {
            search: Some("LOGISTICS".to_owned()),
            role: None,
        };
        let users = service(directory, MockStoreCatalogue::new(), MockSalesHistory::new())
            .users(&staff_with_role(Role::SuperAdmin), &filter, page)
            .await
            .expect("users");
        assert_eq!(users.total, 1);
        assert_eq!(users.items.first().map(|u| u.role), Some(Role::LogisticsHead));
    }

    #[tokio::test]
    async fn store_overview_counts_recent_activity() {
        let mut catalogue = MockStoreCatalogue::new();
        catalogue
            .expect_stores()
            .returning(|| Ok(vec![store(1), store(2)]));
        let mut history = MockSalesHistory::new();
        history.expect_daily().returning(|_| {
            let today = FixtureClock::default_instant().date_naive();
            Ok(vec![
                DailySales {
                    date: today,
                    store_id: 1,
                    item_id: 5,
                    units: 4,
                    revenue: 10.0,
                },
                DailySales {
                    date: today - Duration::days(3),
                    store_id: 1,
                    item_id: 6,
                    units: 2,
                    revenue: 5.0,
                },
            ])
        });
        let list = service(MockStaffDirectory::new(), catalogue, history)
            .stores(&staff_in_stores(Role::StoreManager, &[1]))
            .await
            .expect("stores");
        assert_eq!(list.total, 1);
        let first = list.stores.first().expect("store 1");
        assert_eq!(first.total_sales_30d, 6);
        assert_eq!(first.items_sold, 2);
        assert_eq!(
            first.last_sale_date,
            Some(FixtureClock::default_instant().date_naive())
        );
    }

    #[tokio::test]
    async fn store_detail_outside_scope_is_forbidden() {
        let err = service(
            MockStaffDirectory::new(),
            MockStoreCatalogue::new(),
            MockSalesHistory::new(),
        )
        .store(&staff_in_stores(Role::StoreManager, &[1]), 2)
        .await
        .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
