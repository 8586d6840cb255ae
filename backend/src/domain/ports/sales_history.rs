//! Port for daily sales history and the live sale log.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{DailySales, SaleEvent, SaleId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by sales history adapters.
    pub enum SalesHistoryError {
        /// Storage could not be reached.
        Unavailable { message: String } => "sales history unavailable: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalesHistory: Send + Sync {
    /// Per store, item and day totals on or after `since`.
    async fn daily(&self, since: NaiveDate) -> Result<Vec<DailySales>, SalesHistoryError>;

    async fn next_sale_id(&self) -> Result<SaleId, SalesHistoryError>;

    /// Append a live sale and fold it into the daily totals.
    async fn record(&self, sale: &SaleEvent, revenue: f64) -> Result<(), SalesHistoryError>;

    /// Most recent live sales, newest first.
    async fn latest(&self, limit: usize) -> Result<Vec<SaleEvent>, SalesHistoryError>;
}
