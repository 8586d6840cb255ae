//! Daily sales history plus a bounded buffer of live sales.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::ports::{SalesHistory, SalesHistoryError};
use crate::domain::{DailySales, ItemId, SaleEvent, SaleId, StoreId, round2};

/// Live sales retained for `latest`.
pub const LIVE_BUFFER_CAPACITY: usize = 500;

type DayKey = (NaiveDate, StoreId, ItemId);

#[derive(Debug, Default)]
struct State {
    daily: BTreeMap<DayKey, DailySales>,
    /// Newest first.
    live: VecDeque<SaleEvent>,
}

/// Sales history seeded from generated days. Recorded live sales are folded
/// into the matching day so analytics include them.
#[derive(Debug, Default)]
pub struct MemorySalesHistory {
    state: RwLock<State>,
    sequence: AtomicU64,
}

impl MemorySalesHistory {
    pub fn new(rows: Vec<DailySales>) -> Self {
        let daily = rows
            .into_iter()
            .map(|row| ((row.date, row.store_id, row.item_id), row))
            .collect();
        Self {
            state: RwLock::new(State {
                daily,
                live: VecDeque::with_capacity(LIVE_BUFFER_CAPACITY),
            }),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl SalesHistory for MemorySalesHistory {
    async fn daily(&self, since: NaiveDate) -> Result<Vec<DailySales>, SalesHistoryError> {
        let state = self.state.read().await;
        Ok(state
            .daily
            .range((since, StoreId::MIN, ItemId::MIN)..)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn next_sale_id(&self) -> Result<SaleId, SalesHistoryError> {
        Ok(SaleId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn record(&self, sale: &SaleEvent, revenue: f64) -> Result<(), SalesHistoryError> {
        let mut state = self.state.write().await;
        let date = sale.recorded_at.date_naive();
        let row = state
            .daily
            .entry((date, sale.store_id, sale.item_id))
            .or_insert_with(|| DailySales {
                date,
                store_id: sale.store_id,
                item_id: sale.item_id,
                units: 0,
                revenue: 0.0,
            });
        row.units += u64::from(sale.units);
        row.revenue = round2(row.revenue + revenue);
        if state.live.len() == LIVE_BUFFER_CAPACITY {
            state.live.pop_back();
        }
        state.live.push_front(sale.clone());
        Ok(())
    }

    async fn latest(&self, limit: usize) -> Result<Vec<SaleEvent>, SalesHistoryError> {
        Ok(self.state.read().await.live.iter().take(limit).cloned().collect())
    }
}
