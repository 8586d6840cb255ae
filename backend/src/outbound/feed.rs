//! Background generator for the live sales feed.
//!
//! Every interval the generator draws one sale from a [`SaleTicker`] and
//! records it through [`SalesService`], which appends it to the history and
//! broadcasts it. Every `scan_every` ticks it also runs alert detection.
//! Each tick runs under a fresh [`TraceId`] so its log lines correlate.

use std::sync::Arc;
use std::time::Duration;

use mock_data::SaleTicker;
use mockable::Clock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::{AlertService, SaleEvent, SalesService, TraceId};
use crate::outbound::memory::DemoData;

/// Pacing of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSettings {
    pub interval: Duration,
    /// Run alert detection every this many sales. Zero disables it.
    pub scan_every: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            scan_every: 12,
        }
    }
}

/// Drives the sale ticker and periodic alert scans.
pub struct SalesFeed {
    ticker: SaleTicker,
    sales: SalesService,
    alerts: AlertService,
    clock: Arc<dyn Clock>,
    settings: FeedSettings,
    ticks: u64,
}

impl SalesFeed {
    pub fn new(
        ticker: SaleTicker,
        sales: SalesService,
        alerts: AlertService,
        clock: Arc<dyn Clock>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            ticker,
            sales,
            alerts,
            clock,
            settings,
            ticks: 0,
        }
    }

    /// Ticker over every store and item of `demo`, calibrated on its history.
    pub fn ticker_for(seed: u64, demo: &DemoData) -> SaleTicker {
        SaleTicker::new(seed, demo.store_ids(), demo.item_ids(), &demo.sales_seeds)
    }

    /// Emit one sale, scanning for alerts when due.
    pub async fn tick(&mut self) -> Option<SaleEvent> {
        self.ticks += 1;
        let sale = match self.ticker.next_tick(self.clock.utc()) {
            Some(tick) => match self
                .sales
                .record_sale(tick.store_id, tick.item_id, tick.units, tick.recorded_at)
                .await
            {
                Ok(sale) => Some(sale),
                Err(err) => {
                    warn!(error = %err, "failed to record generated sale");
                    None
                }
            },
            None => {
                debug!("no stores or items to generate sales for");
                None
            }
        };
        if self.scan_due() {
            self.scan().await;
        }
        sale
    }

    fn scan_due(&self) -> bool {
        self.settings.scan_every > 0 && self.ticks % u64::from(self.settings.scan_every) == 0
    }

    /// Run alert detection once.
    pub async fn scan(&self) {
        match self.alerts.scan().await {
            Ok(raised) if raised.is_empty() => debug!("alert scan raised nothing"),
            Ok(raised) => info!(count = raised.len(), "alert scan raised alerts"),
            Err(err) => warn!(error = %err, "alert scan failed"),
        }
    }

    /// Loop forever. Missed intervals are skipped rather than replayed.
    pub async fn run(mut self) {
        info!(interval_ms = self.settings.interval.as_millis() as u64, "sales feed started");
        TraceId::scope(TraceId::generate(), self.scan()).await;
        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            TraceId::scope(TraceId::generate(), self.tick()).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::LiveEventBus;
    use crate::domain::{InventoryService, LiveEvent, ReadModels, Role, default_rules};
    use crate::outbound::cache::MemoryReadModelCache;
    use crate::outbound::live_bus::BroadcastBus;
    use crate::outbound::memory::{
        MemoryAlertRepository, MemoryCatalogue, MemoryInventoryRepository, MemorySalesHistory,
    };
    use crate::test_support::{FixtureClock, staff_with_role};
    use futures_util::StreamExt;

    struct Harness {
        feed: SalesFeed,
        bus: Arc<BroadcastBus>,
        sales: SalesService,
    }

    fn harness(scan_every: u32) -> Harness {
        let clock: Arc<dyn Clock> = Arc::new(FixtureClock::default());
        let now = clock.utc();
        let demo = DemoData::generate(5, now.date_naive(), now).expect("dataset");
        let catalogue = Arc::new(MemoryCatalogue::new(demo.stores.clone(), demo.items.clone()));
        let history = Arc::new(MemorySalesHistory::new(demo.sales.clone()));
        let bus = Arc::new(BroadcastBus::default());
        let read_models = ReadModels::new(
            Arc::new(MemoryReadModelCache::new()),
            Duration::from_secs(30),
        );
        let sales = SalesService::new(
            history.clone(),
            catalogue.clone(),
            bus.clone(),
            read_models.clone(),
            clock.clone(),
        );
        let inventory = InventoryService::new(
            Arc::new(MemoryInventoryRepository::new(demo.stock())),
            catalogue.clone(),
            read_models,
            clock.clone(),
        );
        let alerts = AlertService::new(
            Arc::new(MemoryAlertRepository::new(default_rules(now))),
            inventory,
            history,
            catalogue,
            bus.clone(),
            clock.clone(),
        );
        let feed = SalesFeed::new(
            SalesFeed::ticker_for(5, &demo),
            sales.clone(),
            alerts,
            clock,
            FeedSettings {
                interval: Duration::from_millis(10),
                scan_every,
            },
        );
        Harness { feed, bus, sales }
    }

    #[tokio::test]
    async fn tick_records_and_broadcasts_a_sale() {
        let mut harness = harness(0);
        let mut events = harness.bus.subscribe();
        let sale = harness.feed.tick().await.expect("sale generated");
        match events.next().await {
            Some(LiveEvent::Sale(received)) => assert_eq!(received.id, sale.id),
            other => panic!("expected a sale event, got {other:?}"),
        }
        let latest = harness
            .sales
            .latest(&staff_with_role(Role::SuperAdmin), Some(5))
            .await
            .expect("latest");
        assert_eq!(latest.first().map(|s| s.id), Some(sale.id));
    }

    #[tokio::test]
    async fn sale_ids_increase() {
        let mut harness = harness(0);
        let first = harness.feed.tick().await.expect("sale");
        let second = harness.feed.tick().await.expect("sale");
        assert!(second.id > first.id);
    }

    #[test]
    fn scans_run_on_schedule() {
        let mut harness = harness(3);
        let due: Vec<bool> = (1..=6)
            .map(|tick| {
                harness.feed.ticks = tick;
                harness.feed.scan_due()
            })
            .collect();
        assert_eq!(due, vec![false, false, true, false, false, true]);
    }
}
