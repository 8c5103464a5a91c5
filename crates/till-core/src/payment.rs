//! # Payment Tag Module
//!
//! Maps the order feed's free-text payment method to a ledger category name.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Payment Method → Category Resolution                       │
//! │                                                                         │
//! │  order.payment_method ("Cash", "PIX", "Debit Card", ...)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentTag::parse  ← normalized, typed; no chained string equality    │
//! │       │                                                                 │
//! │       ├── Cash   → "Order - Cash"                                      │
//! │       ├── Pix    → "Order - PIX"                                       │
//! │       ├── Debit  → "Order - Debit Card"                                │
//! │       ├── Credit → "Order - Credit Card"                               │
//! │       └── Unmapped → (no named category)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find by exact name in the ACTIVE category list                        │
//! │       │                                                                 │
//! │       └── miss → "Daily Sales" fallback → miss → unresolved            │
//! │                  (unresolved is surfaced as an operator warning,        │
//! │                   the order is never silently dropped)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Category;

/// Generic sales category used when the payment method has no mapping or its
/// named category is missing from the active list.
pub const FALLBACK_CATEGORY: &str = "Daily Sales";

// =============================================================================
// Payment Tag
// =============================================================================

/// Normalized payment-method tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTag {
    Cash,
    Pix,
    Debit,
    Credit,
    /// Free text we don't recognize; resolves to the fallback category.
    Unmapped,
}

impl PaymentTag {
    /// Parses a free-text payment method into a tag.
    ///
    /// Matching is case-insensitive and tolerant of the "Debit Card" /
    /// "Card - Debit" phrasing variants the order feed produces.
    pub fn parse(raw: &str) -> Self {
        let norm = raw.trim().to_lowercase();
        match norm.as_str() {
            "cash" => PaymentTag::Cash,
            "pix" => PaymentTag::Pix,
            _ if norm.contains("debit") => PaymentTag::Debit,
            _ if norm.contains("credit") => PaymentTag::Credit,
            _ => PaymentTag::Unmapped,
        }
    }

    /// The ledger category name this tag maps to, if any.
    pub const fn category_name(&self) -> Option<&'static str> {
        match self {
            PaymentTag::Cash => Some("Order - Cash"),
            PaymentTag::Pix => Some("Order - PIX"),
            PaymentTag::Debit => Some("Order - Debit Card"),
            PaymentTag::Credit => Some("Order - Credit Card"),
            PaymentTag::Unmapped => None,
        }
    }
}

// =============================================================================
// Category Resolution
// =============================================================================

/// Resolves a payment method against the active category list.
///
/// Returns the mapped category, falling back to [`FALLBACK_CATEGORY`] when
/// the method is unmapped or the named category is not active. Returns
/// `None` only when even the fallback is missing; callers must surface that
/// as an operator-visible warning rather than dropping the order.
pub fn resolve_category<'a>(categories: &'a [Category], raw_method: &str) -> Option<&'a Category> {
    let by_name = |name: &str| {
        categories
            .iter()
            .find(|c| c.is_active && c.name == name)
    };

    PaymentTag::parse(raw_method)
        .category_name()
        .and_then(by_name)
        .or_else(|| by_name(FALLBACK_CATEGORY))
}

// =============================================================================
// Unit Tests
// =============================================================================
