//! # Realtime Event Router
//!
//! The event-dispatch loop that keeps the register consistent as orders and
//! movements change concurrently. Not a state machine: it only delegates.
//!
//! ## Dispatch Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      RealtimeEventRouter                                │
//! │                                                                         │
//! │   order change ────┐                                                   │
//! │   (broadcast)      │  look up open session, sync_order, recompute      │
//! │                    │                                                    │
//! │   ledger change ───┼─► select! ──► recompute + republish LiveView      │
//! │   (broadcast,      │              (watch channel)                      │
//! │    incl. our own)  │                                                    │
//! │                    │                                                    │
//! │   poll tick ───────┘  re-list the window's orders, sync_batch,         │
//! │   (safety net)        recompute - redundant work is safe because       │
//! │                       sync_order is idempotent                         │
//! │                                                                         │
//! │  INVARIANT: the router never synthesizes a movement itself. Every      │
//! │  movement creation goes through SyncEngine, so manual backfill,        │
//! │  batch sync and live events share a single code path.                  │
//! │                                                                         │
//! │  One bad event never stops the stream: errors are logged and the       │
//! │  loop continues; the next tick or event re-converges state.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use ts_rs::TS;

use till_core::{ledger_stats, order_stats, LedgerStats, OrderStats, RegisterSession};
use till_db::Database;

use crate::engine::SyncEngine;
use crate::error::SyncResult;
use crate::events::{EventBus, OrderChange};

// =============================================================================
// Configuration
// =============================================================================

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Polling fallback interval. Each tick re-lists the session window's
    /// orders and re-syncs them, healing missed or dropped events.
    pub poll_interval: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            poll_interval: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// Live View
// =============================================================================

/// The continuously republished register state consumed by the UI.
///
/// Derived, never stored: every recompute rebuilds it from the store.
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export)]
pub struct LiveView {
    /// The open session, if any.
    pub session: Option<RegisterSession>,
    /// Balance and totals, derived solely from movements.
    pub ledger: LedgerStats,
    /// Informational per-delivery-type breakdown. With no open session this
    /// covers today's orders, so the order list stays visible for display.
    pub orders: OrderStats,
}

// =============================================================================
// Router
// =============================================================================

/// The event-dispatch loop. Build with [`RealtimeEventRouter::new`], start
/// with [`RealtimeEventRouter::spawn`].
pub struct RealtimeEventRouter {
    db: Database,
    engine: SyncEngine,
    events: EventBus,
    config: RouterConfig,
}

/// Handle for a running router.
#[derive(Clone)]
pub struct RouterHandle {
    view_rx: watch::Receiver<LiveView>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RouterHandle {
    /// Returns the latest published view.
    pub fn view(&self) -> LiveView {
        self.view_rx.borrow().clone()
    }

    /// Subscribes to view updates.
    pub fn subscribe(&self) -> watch::Receiver<LiveView> {
        self.view_rx.clone()
    }

    /// Signals the router to shut down gracefully.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl RealtimeEventRouter {
    /// Creates a new router.
    pub fn new(db: Database, engine: SyncEngine, events: EventBus, config: RouterConfig) -> Self {
        RealtimeEventRouter {
            db,
            engine,
            events,
            config,
        }
    }

    /// Spawns the dispatch loop and returns a handle.
    pub fn spawn(self) -> RouterHandle {
        let (view_tx, view_rx) = watch::channel(LiveView::default());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(self.run(view_tx, shutdown_rx));

        RouterHandle {
            view_rx,
            shutdown_tx,
        }
    }

    /// Main dispatch loop.
    async fn run(self, view_tx: watch::Sender<LiveView>, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut orders_rx = self.events.subscribe_orders();
        let mut ledger_rx = self.events.subscribe_ledger();

        // First tick fires immediately, doubling as the startup resync
        let mut poll = interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(poll_interval = ?self.config.poll_interval, "Realtime router started");

        loop {
            tokio::select! {
                event = orders_rx.recv() => match event {
                    Ok(change) => {
                        self.handle_order_change(change).await;
                        self.recompute(&view_tx).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Dropped events re-converge on the next poll tick
                        warn!(missed, "Order event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },

                event = ledger_rx.recv() => match event {
                    Ok(change) => {
                        debug!(?change, "Ledger changed");
                        self.recompute(&view_tx).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Ledger event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },

                _ = poll.tick() => {
                    self.poll_resync().await;
                    self.recompute(&view_tx).await;
                }

                _ = shutdown_rx.recv() => {
                    info!("Realtime router shutting down");
                    break;
                }
            }
        }

        info!("Realtime router stopped");
    }

    /// Handles one order change: delegate to the sync engine against the
    /// current open session. Never synthesizes a movement directly.
    async fn handle_order_change(&self, change: OrderChange) {
        let session = match self.db.registers().find_open().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to look up open session");
                return;
            }
        };

        let Some(session) = session else {
            // No open register: nothing to sync, but recompute still
            // refreshes the order list for display
            debug!(order_id = %change.order.id, "Order change with no open register");
            return;
        };

        match self.engine.sync_order(&session, &change.order).await {
            Ok(outcome) => {
                debug!(order_id = %change.order.id, ?outcome, "Order event dispatched")
            }
            Err(e) => {
                // Expected to self-heal on the next event or poll tick
                warn!(order_id = %change.order.id, error = %e, "Order sync failed")
            }
        }
    }

    /// Polling safety net: re-sync the whole session window.
    async fn poll_resync(&self) {
        let session = match self.db.registers().find_open().await {
            Ok(Some(session)) => session,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Poll resync failed to look up open session");
                return;
            }
        };

        let orders = match self.db.orders().list_since(session.opened_at).await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "Poll resync failed to list orders");
                return;
            }
        };

        let report = self.engine.sync_batch(&session, &orders).await;
        if report.created > 0 || report.removed > 0 {
            info!(
                created = report.created,
                removed = report.removed,
                "Poll resync reconciled missed events"
            );
        }
    }

    /// Rebuilds and republishes the live view.
    async fn recompute(&self, view_tx: &watch::Sender<LiveView>) {
        match self.build_view().await {
            Ok(view) => {
                view_tx.send_replace(view);
            }
            Err(e) => warn!(error = %e, "Failed to recompute statistics"),
        }
    }

    async fn build_view(&self) -> SyncResult<LiveView> {
        match self.db.registers().find_open().await? {
            Some(session) => {
                let movements = self.db.movements().list_for_session(&session.id).await?;
                let ledger = ledger_stats(&session, &movements);
                let orders = self.db.orders().list_since(session.opened_at).await?;
                Ok(LiveView {
                    ledger,
                    orders: order_stats(&orders),
                    session: Some(session),
                })
            }
            None => {
                let orders = self.db.orders().list_since(start_of_today()).await?;
                Ok(LiveView {
                    session: None,
                    ledger: LedgerStats::default(),
                    orders: order_stats(&orders),
                })
            }
        }
    }
}

/// Midnight UTC of the current date.
fn start_of_today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OrderEventKind;
    use crate::lifecycle::{OpenMode, RegisterLifecycleManager};
    use crate::notify::{NoOpSink, NotificationSink};
    use crate::testutil::{order, seeded_db};
    use std::sync::Arc;
    use till_core::{Money, OrderStatus};

    struct Fixture {
        db: Database,
        bus: EventBus,
        manager: RegisterLifecycleManager,
        handle: RouterHandle,
    }

    async fn fixture() -> Fixture {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("till_sync=debug")
            .try_init();

        let db = seeded_db().await;
        let bus = EventBus::new();
        let notifier: Arc<dyn NotificationSink> = Arc::new(NoOpSink);
        let engine = SyncEngine::new(db.clone(), bus.clone(), notifier.clone());
        let manager =
            RegisterLifecycleManager::new(db.clone(), engine.clone(), bus.clone(), notifier);
        let router = RealtimeEventRouter::new(
            db.clone(),
            engine,
            bus.clone(),
            RouterConfig {
                poll_interval: Duration::from_millis(50),
            },
        );
        let handle = router.spawn();
        Fixture {
            db,
            bus,
            manager,
            handle,
        }
    }

    async fn wait_for(handle: &RouterHandle, pred: impl Fn(&LiveView) -> bool) -> LiveView {
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(5), async move {
            loop {
                {
                    let view = rx.borrow_and_update().clone();
                    if pred(&view) {
                        return view;
                    }
                }
                rx.changed().await.expect("router stopped");
            }
        })
        .await
        .expect("view never reached expected state")
    }

    #[tokio::test]
    async fn test_order_event_syncs_and_updates_view() {
        let f = fixture().await;
        f.manager
            .open(Money::from_cents(5000), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();

        let o = order("o1", 2350, "Cash", OrderStatus::Confirmed, Utc::now());
        f.db.orders().upsert_order(&o).await.unwrap();
        f.bus.publish_order(OrderChange {
            kind: OrderEventKind::Inserted,
            order: o,
        });

        let view = wait_for(&f.handle, |v| v.ledger.balance_cents == 7350).await;
        assert_eq!(view.ledger.movement_count, 1);
        assert_eq!(view.orders.order_count, 1);
        assert!(view.session.is_some());

        f.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_events_do_not_double_count() {
        let f = fixture().await;
        f.manager
            .open(Money::from_cents(5000), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();

        let o = order("o1", 2350, "Cash", OrderStatus::Confirmed, Utc::now());
        f.db.orders().upsert_order(&o).await.unwrap();
        for _ in 0..4 {
            f.bus.publish_order(OrderChange {
                kind: OrderEventKind::Updated,
                order: o.clone(),
            });
        }

        let view = wait_for(&f.handle, |v| v.ledger.balance_cents == 7350).await;
        assert_eq!(view.ledger.movement_count, 1);

        // Give redundant deliveries and a poll tick time to land, then
        // confirm the balance did not move
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(f.handle.view().ledger.balance_cents, 7350);
        assert_eq!(f.handle.view().ledger.movement_count, 1);

        f.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancellation_event_compensates() {
        let f = fixture().await;
        f.manager
            .open(Money::from_cents(5000), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();

        let mut o = order("o1", 1000, "PIX", OrderStatus::Confirmed, Utc::now());
        f.db.orders().upsert_order(&o).await.unwrap();
        f.bus.publish_order(OrderChange {
            kind: OrderEventKind::Inserted,
            order: o.clone(),
        });
        wait_for(&f.handle, |v| v.ledger.balance_cents == 6000).await;

        o.status = OrderStatus::Cancelled;
        f.db.orders().upsert_order(&o).await.unwrap();
        f.bus.publish_order(OrderChange {
            kind: OrderEventKind::Updated,
            order: o,
        });

        let view = wait_for(&f.handle, |v| v.ledger.balance_cents == 5000).await;
        assert_eq!(view.ledger.movement_count, 0);

        f.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_poll_fallback_heals_missed_events() {
        let f = fixture().await;
        f.manager
            .open(Money::from_cents(0), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();

        // Order lands in the store but its event is never delivered
        let o = order("silent", 4200, "Credit Card", OrderStatus::Confirmed, Utc::now());
        f.db.orders().upsert_order(&o).await.unwrap();

        let view = wait_for(&f.handle, |v| v.ledger.balance_cents == 4200).await;
        assert_eq!(view.ledger.movement_count, 1);

        f.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_no_open_session_still_lists_orders() {
        let f = fixture().await;

        let o = order("o1", 1500, "Cash", OrderStatus::Pending, Utc::now());
        f.db.orders().upsert_order(&o).await.unwrap();
        f.bus.publish_order(OrderChange {
            kind: OrderEventKind::Inserted,
            order: o,
        });

        // Order list refreshes for display, but nothing is synced
        let view = wait_for(&f.handle, |v| v.orders.order_count == 1).await;
        assert!(view.session.is_none());
        assert_eq!(view.ledger.balance_cents, 0);

        f.handle.shutdown().await;
    }
}
