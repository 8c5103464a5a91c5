//! # Domain Types
//!
//! Core domain types used throughout the Till register ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ RegisterSession │   │    Movement     │   │  OrderSnapshot  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  opening_cents  │   │  kind           │   │  total_cents    │       │
//! │  │  status         │   │  amount_cents   │   │  status         │       │
//! │  │  discrepancy    │   │  source_order   │   │  delivery_type  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │      Staff      │   │  MovementKind   │       │
//! │  │  name + kind    │   │  name + role    │   │  Entry | Exit   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Movement` with `source_order_id = Some(..)` was synthesized from an
//! external order by the sync engine; at most one such movement may exist per
//! (session, order) pair. Manual movements always carry `None` and are never
//! touched by order sync or cancellation compensation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Register Status
// =============================================================================

/// The lifecycle state of a register session.
///
/// A fresh session is created per open; sessions are never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RegisterStatus {
    /// Drawer is open; movements may be recorded.
    Open,
    /// Drawer has been counted and closed. Terminal state.
    Closed,
}

// =============================================================================
// Movement Kind
// =============================================================================

/// Direction of a ledger line. Also classifies categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Cash into the drawer.
    Entry,
    /// Cash out of the drawer.
    Exit,
}

// =============================================================================
// Register Session
// =============================================================================

/// One physical cash-drawer session.
///
/// ## Invariant
/// At most one session has `status = Open` at any time. Enforced
/// procedurally by the lifecycle manager (open only after confirming no
/// session is open).
///
/// Entry/exit totals, expected balance and discrepancy are denormalized onto
/// the row at close time so history rows stay self-contained after their
/// movements are purged.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RegisterSession {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// When the drawer was opened. Also the lower bound of the order window:
    /// orders created before this instant are never attributed to the session.
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    /// When the drawer was closed (None while open).
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    /// Float counted into the drawer at open. Forced to zero for
    /// backfill-mode opens.
    pub opening_cents: i64,

    /// Cash counted at close (None while open).
    pub closing_cents: Option<i64>,

    /// Sum of entry amounts, stamped at close.
    pub total_entry_cents: i64,

    /// Sum of exit amounts, stamped at close.
    pub total_exit_cents: i64,

    /// opening + entries − exits, stamped at close.
    pub expected_cents: i64,

    /// closing − expected (None while open).
    pub discrepancy_cents: Option<i64>,

    /// Operator who opened the drawer.
    pub opened_by: String,

    /// Operator who closed the drawer.
    pub closed_by: Option<String>,

    /// Free-text note recorded at close.
    pub notes: Option<String>,

    /// Open or Closed.
    pub status: RegisterStatus,
}

impl RegisterSession {
    /// Returns the opening float as Money.
    #[inline]
    pub fn opening(&self) -> Money {
        Money::from_cents(self.opening_cents)
    }

    /// Returns the counted closing amount as Money, if closed.
    #[inline]
    pub fn closing(&self) -> Option<Money> {
        self.closing_cents.map(Money::from_cents)
    }

    /// Returns the close-time discrepancy as Money, if closed.
    #[inline]
    pub fn discrepancy(&self) -> Option<Money> {
        self.discrepancy_cents.map(Money::from_cents)
    }

    /// Checks whether the session is still open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }
}

// =============================================================================
// Movement
// =============================================================================

/// One ledger line: a single cash entry or exit.
///
/// Movements are never updated in place; compensation is modeled as deletion.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Movement {
    pub id: String,
    /// Owning session.
    pub register_session_id: String,
    /// Classification, resolved by name from the active category list.
    pub category_id: Option<String>,
    /// Operator associated with the movement, if any.
    pub staff_id: Option<String>,
    pub kind: MovementKind,
    /// Always strictly positive; direction is carried by `kind`.
    pub amount_cents: i64,
    pub description: Option<String>,
    /// Free-text payment method as reported by the order feed.
    pub payment_method: Option<String>,
    /// Present iff this movement was auto-generated from an external order.
    pub source_order_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Returns the movement amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// True when the movement was synthesized from an order by the sync
    /// engine (as opposed to recorded manually by an operator).
    #[inline]
    pub fn is_order_derived(&self) -> bool {
        self.source_order_id.is_some()
    }
}

// =============================================================================
// Category
// =============================================================================

/// A named entry/exit classification. Read-only reference data from the
/// engine's perspective; resolved by exact name match.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub kind: MovementKind,
    /// Display color (hex).
    pub color: String,
    /// Display icon name.
    pub icon: String,
    pub is_active: bool,
    pub sort_order: i64,
}

// =============================================================================
// Staff
// =============================================================================

/// An operator reference. Read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
}

// =============================================================================
// Order Snapshot
// =============================================================================

/// Status of an external order.
///
/// The engine treats orders as immutable-per-id except for the terminal
/// `Cancelled` state, which triggers compensating deletion of the synced
/// movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// True for the distinguished terminal state that triggers compensation.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

/// How the order reaches the customer. Drives the informational
/// per-delivery-type statistics breakdown only; never the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Delivery,
    Pickup,
    DineIn,
}

/// A read-only view of one order from the external order-management system.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderSnapshot {
    pub id: String,
    pub customer_name: String,
    /// Non-negative order total.
    pub total_cents: i64,
    /// Free text; mapped to a category through the payment tag table.
    pub payment_method: String,
    pub delivery_type: DeliveryType,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderSnapshot {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_cancelled() {
        assert!(OrderStatus::Cancelled.is_cancelled());
        assert!(!OrderStatus::Delivered.is_cancelled());
        assert!(!OrderStatus::Pending.is_cancelled());
    }

    #[test]
    fn test_enum_serde_shape() {
        // The serialized form is the contract with the order feed and UI.
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&DeliveryType::DineIn).unwrap(),
            "\"dine_in\""
        );
        assert_eq!(
            serde_json::to_string(&MovementKind::Entry).unwrap(),
            "\"entry\""
        );
    }

    #[test]
    fn test_movement_origin() {
        let mut movement = Movement {
            id: "m1".into(),
            register_session_id: "s1".into(),
            category_id: None,
            staff_id: None,
            kind: MovementKind::Entry,
            amount_cents: 2350,
            description: None,
            payment_method: None,
            source_order_id: Some("o1".into()),
            created_at: Utc::now(),
        };
        assert!(movement.is_order_derived());
        assert_eq!(movement.amount(), Money::from_cents(2350));

        movement.source_order_id = None;
        assert!(!movement.is_order_derived());
    }
}
