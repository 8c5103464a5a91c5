//! # till-core: Pure Business Logic for the Till Register Ledger
//!
//! This crate is the **heart** of Till. It contains the ledger's business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   till-sync (Orchestration)                     │   │
//! │  │    SyncEngine ──► LifecycleManager ──► RealtimeEventRouter     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ till-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   stats   │  │  payment  │  │   │
//! │  │   │  Session  │  │   Money   │  │  balance  │  │  tag map  │  │   │
//! │  │   │  Movement │  │  (cents)  │  │  buckets  │  │  fallback │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  till-db (Ledger Store)                         │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RegisterSession, Movement, OrderSnapshot, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stats`] - Balance and per-delivery-type statistics computation
//! - [`payment`] - Payment-method-to-category resolution table
//! - [`error`] - Validation error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod payment;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use error::ValidationError;
pub use money::Money;
pub use payment::{PaymentTag, FALLBACK_CATEGORY};
pub use stats::{ledger_stats, order_stats, LedgerStats, OrderStats};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an operator name.
pub const MAX_OPERATOR_NAME_LEN: usize = 100;

/// Maximum length of a movement description or session note.
pub const MAX_NOTE_LEN: usize = 500;
