//! # till-sync: Register Lifecycle & Ledger Reconciliation Engine
//!
//! Keeps the register's ledger consistent with the external order feed under
//! concurrent, at-least-once event delivery:
//!
//! - [`engine`] - SyncEngine: translates one order into zero or one movement
//!   (or a compensating delete), exactly once per order per session
//! - [`lifecycle`] - RegisterLifecycleManager: open/close state machine,
//!   manual movements, backfill opens, session deletion
//! - [`router`] - RealtimeEventRouter: event-dispatch loop over order and
//!   ledger change streams plus a polling safety net
//! - [`events`] - In-process broadcast bus carrying the change streams
//! - [`notify`] - Operator-facing notification boundary
//! - [`error`] - Sync error taxonomy (conflict / validation / store)
//!
//! ## Consistency Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every path that can create an order-derived movement goes through     │
//! │  SyncEngine::sync_order:                                               │
//! │                                                                         │
//! │    realtime event ──┐                                                  │
//! │    polling tick ────┼──► sync_order (idempotent) ──► ledger store      │
//! │    backfill open ───┘                                                  │
//! │                                                                         │
//! │  Redundant deliveries short-circuit on the existence check; a lost     │
//! │  race between two concurrent syncs is absorbed by the store's unique   │
//! │  index and reported as AlreadySynced. The balance therefore counts     │
//! │  each order at most once, no matter how events arrive.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod notify;
pub mod router;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{BatchReport, SkipReason, SyncEngine, SyncOutcome};
pub use error::{SyncError, SyncResult};
pub use events::{EventBus, LedgerChange, OrderChange, OrderEventKind};
pub use lifecycle::{OpenMode, OpenOutcome, RegisterLifecycleManager};
pub use notify::{NoOpSink, Notice, NoticeKind, NotificationSink, TracingSink};
pub use router::{LiveView, RealtimeEventRouter, RouterConfig, RouterHandle};

// =============================================================================
// Test Support
// =============================================================================
