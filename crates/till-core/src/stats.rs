//! # Statistics Aggregator
//!
//! Pure computation of the register's running balance and the informational
//! per-delivery-type order breakdown. No I/O.
//!
//! ## The Two Views
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LedgerStats ── source of truth for money                              │
//! │    balance = opening + Σ entries − Σ exits                             │
//! │    Derives SOLELY from movements. Once an order is synced into a       │
//! │    movement it is counted exactly once here.                           │
//! │                                                                         │
//! │  OrderStats ── informational only                                      │
//! │    delivery / pickup / dine-in counts and revenue over the session     │
//! │    window. NEVER feeds back into the balance (that would double        │
//! │    count synced orders).                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DeliveryType, Movement, MovementKind, OrderSnapshot, RegisterSession};

// =============================================================================
// Ledger Statistics
// =============================================================================

/// Running totals for an open (or closing) register session.
///
/// Recomputed on demand from the movement list; never stored as source of
/// truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerStats {
    /// opening + entries − exits, in exact integer cents.
    pub balance_cents: i64,
    pub total_entry_cents: i64,
    pub total_exit_cents: i64,
    pub movement_count: u32,
}

impl LedgerStats {
    /// Returns the running balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// Returns the entry total as Money.
    #[inline]
    pub fn total_entries(&self) -> Money {
        Money::from_cents(self.total_entry_cents)
    }

    /// Returns the exit total as Money.
    #[inline]
    pub fn total_exits(&self) -> Money {
        Money::from_cents(self.total_exit_cents)
    }
}

/// Computes the running balance and entry/exit totals for a session.
///
/// An empty movement list yields `balance == opening` exactly. Integer-cent
/// addition is commutative and associative, so the result is independent of
/// the ordering of `movements`.
pub fn ledger_stats(session: &RegisterSession, movements: &[Movement]) -> LedgerStats {
    let total_entries: Money = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Entry)
        .map(Movement::amount)
        .sum();
    let total_exits: Money = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Exit)
        .map(Movement::amount)
        .sum();

    let balance = session.opening() + total_entries - total_exits;

    LedgerStats {
        balance_cents: balance.cents(),
        total_entry_cents: total_entries.cents(),
        total_exit_cents: total_exits.cents(),
        movement_count: movements.len() as u32,
    }
}

// =============================================================================
// Order Statistics
// =============================================================================

/// Count and revenue for one delivery-type bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryBucket {
    pub count: u32,
    pub total_cents: i64,
}

/// Per-delivery-type breakdown of the session's orders.
///
/// Informational only: displayed alongside the register, never part of the
/// balance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderStats {
    pub delivery: DeliveryBucket,
    pub pickup: DeliveryBucket,
    pub dine_in: DeliveryBucket,
    pub order_count: u32,
    pub revenue_cents: i64,
}

impl OrderStats {
    /// Returns total revenue as Money.
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }
}

/// Buckets orders by delivery type and sums counts and revenue.
///
/// Callers pass orders already restricted to the session's time window;
/// cancelled orders are excluded here regardless.
pub fn order_stats(orders: &[OrderSnapshot]) -> OrderStats {
    let mut stats = OrderStats::default();

    for order in orders {
        if order.status.is_cancelled() {
            continue;
        }

        let bucket = match order.delivery_type {
            DeliveryType::Delivery => &mut stats.delivery,
            DeliveryType::Pickup => &mut stats.pickup,
            DeliveryType::DineIn => &mut stats.dine_in,
        };
        bucket.count += 1;
        bucket.total_cents += order.total_cents;

        stats.order_count += 1;
        stats.revenue_cents += order.total_cents;
    }

    stats
}

// =============================================================================
// Unit Tests
// =============================================================================
