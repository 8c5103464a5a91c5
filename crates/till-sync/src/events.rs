//! # Event Bus
//!
//! In-process broadcast channels carrying the two change streams the router
//! consumes: order changes (from the external order system) and ledger
//! changes (from the engine and lifecycle manager, including self-triggered
//! ones).
//!
//! ## Delivery Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • Fan-out: every subscriber sees every event after its subscribe call │
//! │  • No ordering guarantee against the polling fallback - both paths     │
//! │    converge on the same idempotent sync_order entry point              │
//! │  • A slow subscriber may lag and drop old events; the polling tick     │
//! │    is the safety net that re-converges state                           │
//! │  • Publishing with no subscribers is a no-op, not an error             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::broadcast;

use till_core::OrderSnapshot;

/// Default channel capacity per stream.
const DEFAULT_CAPACITY: usize = 256;

// =============================================================================
// Event Types
// =============================================================================

/// What happened to an order in the external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventKind {
    Inserted,
    Updated,
}

/// One order change event. Carries the full current snapshot, not a diff,
/// so consumers never depend on event ordering within a single order.
#[derive(Debug, Clone)]
pub struct OrderChange {
    pub kind: OrderEventKind,
    pub order: OrderSnapshot,
}

/// One ledger change event.
#[derive(Debug, Clone)]
pub enum LedgerChange {
    SessionOpened { session_id: String },
    SessionClosed { session_id: String },
    MovementRecorded { session_id: String, movement_id: String },
    MovementRemoved { session_id: String },
}

// =============================================================================
// Event Bus
// =============================================================================

/// The shared bus. Cheap to clone; all clones publish into the same streams.
#[derive(Debug, Clone)]
pub struct EventBus {
    orders_tx: broadcast::Sender<OrderChange>,
    ledger_tx: broadcast::Sender<LedgerChange>,
}

impl EventBus {
    /// Creates a bus with the given per-stream capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (orders_tx, _) = broadcast::channel(capacity);
        let (ledger_tx, _) = broadcast::channel(capacity);
        EventBus {
            orders_tx,
            ledger_tx,
        }
    }

    /// Creates a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Publishes an order change. No-op when nobody is subscribed.
    pub fn publish_order(&self, change: OrderChange) {
        let _ = self.orders_tx.send(change);
    }

    /// Publishes a ledger change. No-op when nobody is subscribed.
    pub fn publish_ledger(&self, change: LedgerChange) {
        let _ = self.ledger_tx.send(change);
    }

    /// Subscribes to order changes.
    pub fn subscribe_orders(&self) -> broadcast::Receiver<OrderChange> {
        self.orders_tx.subscribe()
    }

    /// Subscribes to ledger changes.
    pub fn subscribe_ledger(&self) -> broadcast::Receiver<LedgerChange> {
        self.ledger_tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use till_core::{DeliveryType, OrderStatus};

    fn order(id: &str) -> OrderSnapshot {
        OrderSnapshot {
            id: id.to_string(),
            customer_name: "Maria".to_string(),
            total_cents: 1000,
            payment_method: "Cash".to_string(),
            delivery_type: DeliveryType::Pickup,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish_order(OrderChange {
            kind: OrderEventKind::Inserted,
            order: order("o1"),
        });
        bus.publish_ledger(LedgerChange::SessionOpened {
            session_id: "s1".to_string(),
        });
    }

    #[tokio::test]
    async fn test_fanout_to_subscribers() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe_orders();
        let mut rx_b = bus.subscribe_orders();

        bus.publish_order(OrderChange {
            kind: OrderEventKind::Updated,
            order: order("o1"),
        });

        assert_eq!(rx_a.recv().await.unwrap().order.id, "o1");
        assert_eq!(rx_b.recv().await.unwrap().order.id, "o1");
    }

    #[tokio::test]
    async fn test_clones_share_streams() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_ledger();

        let publisher = bus.clone();
        publisher.publish_ledger(LedgerChange::MovementRemoved {
            session_id: "s1".to_string(),
        });

        assert!(matches!(
            rx.recv().await.unwrap(),
            LedgerChange::MovementRemoved { .. }
        ));
    }
}
