//! Drives an `ActivityOrder` with a periodic task and publishes its display order.
//!
//! At most one ticker task exists per feed. It is aborted before a replacement is spawned, when
//! the list is hovered, and when the feed is dropped.

use crate::activity::{ActivityOrder, FeedState};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// The default time between two steps of the cycle.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

/// A live activity list. Subscribers receive every new display order.
pub struct ActivityFeed<K> {
    order: Arc<Mutex<ActivityOrder<K>>>,
    publisher: Arc<watch::Sender<Vec<K>>>,
    receiver: watch::Receiver<Vec<K>>,
    ticker: Option<JoinHandle<()>>,
    period: Duration,
    /// What the baseline was built from, used to decide whether `sync` must rebuild.
    built_for: Option<String>,
}

impl<K> ActivityFeed<K>
where
    K: Clone + PartialEq + Debug + Send + Sync + 'static,
{
    /// Creates a feed over `baseline` and starts cycling. Must be called inside a tokio runtime.
    pub fn start(baseline: Vec<K>, period: Duration) -> Self {
        let order = ActivityOrder::new(baseline);
        let (publisher, receiver) = watch::channel(order.display_order().to_vec());
        let mut feed = Self {
            order: Arc::new(Mutex::new(order)),
            publisher: Arc::new(publisher),
            receiver,
            ticker: None,
            period,
            built_for: None,
        };
        feed.restart_ticker();
        feed
    }

    /// A receiver of the display order. The current order is available right away.
    pub fn subscribe(&self) -> watch::Receiver<Vec<K>> {
        self.receiver.clone()
    }

    pub fn display_order(&self) -> Vec<K> {
        self.lock().display_order().to_vec()
    }

    pub fn state(&self) -> FeedState {
        self.lock().state()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a ticker task is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// The pointer entered the list: stop the ticker and show the baseline.
    pub fn hover_enter(&mut self) {
        self.stop_ticker();
        let mut order = self.lock();
        order.hover_enter();
        self.publisher.send_replace(order.display_order().to_vec());
    }

    /// The pointer left the list: restart cycling from the first permutation.
    pub fn hover_leave(&mut self) {
        let changed = {
            let mut order = self.lock();
            let changed = order.hover_leave();
            if changed {
                self.publisher.send_replace(order.display_order().to_vec());
            }
            changed
        };
        if changed {
            self.restart_ticker();
        }
    }

    /// Brings the feed in line with a new baseline.
    ///
    /// `built_for` names whatever the baseline was derived from, typically the active period.
    /// The feed is rebuilt, and its ticker restarted, when that changes or when the set of ids
    /// changes. Otherwise nothing happens.
    pub fn sync(&mut self, baseline: Vec<K>, built_for: impl Into<String>) {
        let built_for = built_for.into();
        let same_source = self.built_for.as_deref() == Some(built_for.as_str());
        if same_source && self.same_ids(&baseline) {
            return;
        }
        trace!("Rebuilding activity feed for {built_for} with {baseline:?}");
        self.built_for = Some(built_for);
        let cycling = {
            let mut order = self.lock();
            order.rebuild(baseline);
            self.publisher.send_replace(order.display_order().to_vec());
            order.state() == FeedState::Cycling
        };
        if cycling {
            self.restart_ticker();
        }
    }

    fn same_ids(&self, baseline: &[K]) -> bool {
        let order = self.lock();
        let current = order.baseline();
        current.len() == baseline.len() && baseline.iter().all(|k| current.contains(k))
    }

    fn lock(&self) -> MutexGuard<'_, ActivityOrder<K>> {
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn restart_ticker(&mut self) {
        self.stop_ticker();
        let order = Arc::clone(&self.order);
        let publisher = Arc::clone(&self.publisher);
        let period = self.period;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut order = order.lock().unwrap_or_else(PoisonError::into_inner);
                if order.tick() {
                    publisher.send_replace(order.display_order().to_vec());
                }
            }
        }));
    }
}

impl<K> Drop for ActivityFeed<K> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(1000);

    async fn next(rx: &mut watch::Receiver<Vec<char>>) -> Vec<char> {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_every_period() {
        let feed = ActivityFeed::start(vec!['A', 'B', 'C'], PERIOD);
        let mut rx = feed.subscribe();
        assert_eq!(*rx.borrow_and_update(), vec!['A', 'B', 'C']);
        assert_eq!(next(&mut rx).await, vec!['C', 'A', 'B']);
        assert_eq!(next(&mut rx).await, vec!['B', 'C', 'A']);
        assert_eq!(next(&mut rx).await, vec!['A', 'C', 'B']);
        assert_eq!(next(&mut rx).await, vec!['A', 'B', 'C']);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_freezes_on_baseline() {
        let mut feed = ActivityFeed::start(vec!['A', 'B', 'C'], PERIOD);
        let mut rx = feed.subscribe();
        rx.borrow_and_update();
        next(&mut rx).await;
        feed.hover_enter();
        assert!(!feed.is_ticking());
        assert_eq!(feed.state(), FeedState::Static);
        assert_eq!(*rx.borrow_and_update(), vec!['A', 'B', 'C']);

        tokio::time::sleep(PERIOD * 5).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(feed.display_order(), vec!['A', 'B', 'C']);

        feed.hover_leave();
        assert!(feed.is_ticking());
        assert_eq!(*rx.borrow_and_update(), vec!['A', 'B', 'C']);
        assert_eq!(next(&mut rx).await, vec!['C', 'A', 'B']);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_rebuilds_on_new_ids() {
        let mut feed = ActivityFeed::start(vec!['A', 'B', 'C'], PERIOD);
        feed.sync(vec!['A', 'B', 'C'], "2026-01");
        let mut rx = feed.subscribe();
        rx.borrow_and_update();
        assert_eq!(next(&mut rx).await, vec!['C', 'A', 'B']);

        // Same ids and source: no rebuild, the cycle keeps its position.
        feed.sync(vec!['C', 'B', 'A'], "2026-01");
        assert_eq!(feed.display_order(), vec!['C', 'A', 'B']);

        // Same size, different ids.
        feed.sync(vec!['A', 'B', 'D'], "2026-01");
        assert_eq!(*rx.borrow_and_update(), vec!['A', 'B', 'D']);

        // Different source.
        feed.sync(vec!['X', 'Y'], "2026-02");
        assert_eq!(*rx.borrow_and_update(), vec!['X', 'Y']);
        assert_eq!(next(&mut rx).await, vec!['Y', 'X']);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_while_hovered_stays_static() {
        let mut feed = ActivityFeed::start(vec!['A', 'B'], PERIOD);
        feed.hover_enter();
        feed.sync(vec!['B', 'C'], "2026-03");
        assert!(!feed.is_ticking());
        assert_eq!(feed.display_order(), vec!['B', 'C']);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_ticker_after_restarts() {
        let mut feed = ActivityFeed::start(vec!['A', 'B', 'C', 'D'], PERIOD);
        for _ in 0..5 {
            feed.hover_enter();
            feed.hover_leave();
        }
        let mut rx = feed.subscribe();
        rx.borrow_and_update();
        // Several live tickers would each advance the index on the same instant.
        tokio::time::sleep(PERIOD + Duration::from_millis(1)).await;
        assert_eq!(feed.display_order(), vec!['D', 'A', 'B', 'C']);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_publishing() {
        let feed = ActivityFeed::start(vec!['A', 'B'], PERIOD);
        let mut rx = feed.subscribe();
        drop(feed);
        tokio::time::sleep(PERIOD * 3).await;
        assert!(rx.changed().await.is_err());
    }
}
