//! # Sync Engine
//!
//! Translates one external order into zero or one ledger movement - or
//! removes a movement when the order was cancelled - exactly once per order
//! per session, tolerant of at-least-once event delivery.
//!
//! ## Decision Ladder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      sync_order(session, order)                         │
//! │                                                                         │
//! │  1. order cancelled?          ──► delete movement(s) ──► Removed       │
//! │     (deleting zero rows is fine - compensation is idempotent)          │
//! │  2. created before session?   ──► Skipped(OutsideWindow)               │
//! │  3. zero total?               ──► Skipped(ZeroTotal)                   │
//! │  4. movement already exists?  ──► AlreadySynced                        │
//! │  5. resolve category          ──► none? Skipped(NoCategory) + warning  │
//! │  6. insert Entry movement     ──► Created                              │
//! │     └── UniqueViolation (lost race) ──► AlreadySynced                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The existence check (step 4) and the insert (step 6) are not atomic; two
//! near-simultaneous syncs of the same order can both pass the check. The
//! store's unique index on (session, order) resolves that race: the loser's
//! insert fails with a unique violation, which is absorbed here as
//! AlreadySynced rather than surfaced as an error.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use till_core::payment::resolve_category;
use till_core::{Movement, MovementKind, OrderSnapshot, RegisterSession};
use till_db::Database;

use crate::error::SyncResult;
use crate::events::{EventBus, LedgerChange};
use crate::notify::{Notice, NotificationSink};

// =============================================================================
// Outcomes
// =============================================================================

/// Why an order was skipped. Not an error: skips are logged, counted, and
/// (for NoCategory) surfaced as an operator warning, but never abort a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The order predates the session's opening and must never be
    /// attributed to it.
    OutsideWindow,
    /// Neither the mapped category nor the fallback exists in the active
    /// category list.
    NoCategory,
    /// Fully discounted order; a zero-amount ledger line is meaningless.
    ZeroTotal,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OutsideWindow => write!(f, "outside session window"),
            SkipReason::NoCategory => write!(f, "no category"),
            SkipReason::ZeroTotal => write!(f, "zero total"),
        }
    }
}

/// Result of syncing one order into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new movement was inserted.
    Created,
    /// A movement for this order already exists; nothing was written.
    AlreadySynced,
    /// The order does not belong in the ledger (see reason).
    Skipped(SkipReason),
    /// The order is cancelled; any derived movement was removed.
    Removed,
}

/// Aggregate counts for a batch sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub created: u32,
    pub already_synced: u32,
    pub skipped: u32,
    pub removed: u32,
    /// Orders whose sync failed with a store error. They are retried by the
    /// next polling tick or the next event for the same order.
    pub failed: u32,
}

impl BatchReport {
    fn absorb(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::AlreadySynced => self.already_synced += 1,
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Removed => self.removed += 1,
        }
    }

    /// Total orders examined.
    pub fn total(&self) -> u32 {
        self.created + self.already_synced + self.skipped + self.removed + self.failed
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

/// The idempotent order→movement translator.
///
/// Cheap to clone; clones share the same store, bus and sink.
#[derive(Clone)]
pub struct SyncEngine {
    db: Database,
    events: EventBus,
    notifier: Arc<dyn NotificationSink>,
}

impl SyncEngine {
    /// Creates a new sync engine.
    pub fn new(db: Database, events: EventBus, notifier: Arc<dyn NotificationSink>) -> Self {
        SyncEngine {
            db,
            events,
            notifier,
        }
    }

    /// Syncs one order into the given session. See the module docs for the
    /// decision ladder.
    ///
    /// Safe to call any number of times with the same order: every
    /// invocation re-evaluates the full current order state, so neither
    /// redundant delivery nor out-of-order delivery can double-count.
    pub async fn sync_order(
        &self,
        session: &RegisterSession,
        order: &OrderSnapshot,
    ) -> SyncResult<SyncOutcome> {
        // 1. Cancelled order: compensating delete, idempotent
        if order.status.is_cancelled() {
            let removed = self
                .db
                .movements()
                .delete_by_order(&session.id, &order.id)
                .await?;
            if removed > 0 {
                info!(order_id = %order.id, session_id = %session.id, "Removed movement for cancelled order");
                self.events.publish_ledger(LedgerChange::MovementRemoved {
                    session_id: session.id.clone(),
                });
            }
            return Ok(SyncOutcome::Removed);
        }

        // 2. Orders predating the session belong to a previous drawer
        if order.created_at < session.opened_at {
            debug!(order_id = %order.id, "Order outside session window");
            return Ok(SyncOutcome::Skipped(SkipReason::OutsideWindow));
        }

        // 3. Zero-amount ledger lines are not representable (amount > 0)
        if order.total_cents == 0 {
            debug!(order_id = %order.id, "Order has zero total");
            return Ok(SyncOutcome::Skipped(SkipReason::ZeroTotal));
        }

        // 4. Dedup fast path
        if self
            .db
            .movements()
            .exists_for_order(&session.id, &order.id)
            .await?
        {
            return Ok(SyncOutcome::AlreadySynced);
        }

        // 5. Category resolution through the payment tag table
        let categories = self.db.lookups().list_active_categories().await?;
        let Some(category) = resolve_category(&categories, &order.payment_method) else {
            warn!(
                order_id = %order.id,
                payment_method = %order.payment_method,
                "No category resolvable for order; skipping"
            );
            self.notifier.notify(Notice::warning(
                "Order Not Synced",
                format!(
                    "No ledger category found for payment method '{}' (order from {}).",
                    order.payment_method, order.customer_name
                ),
            ));
            return Ok(SyncOutcome::Skipped(SkipReason::NoCategory));
        };

        // 6. Insert the entry movement
        let movement = Movement {
            id: Uuid::new_v4().to_string(),
            register_session_id: session.id.clone(),
            category_id: Some(category.id.clone()),
            staff_id: None,
            kind: MovementKind::Entry,
            amount_cents: order.total_cents,
            description: Some(format!(
                "Order from {} - {}",
                order.customer_name, order.payment_method
            )),
            payment_method: Some(order.payment_method.clone()),
            source_order_id: Some(order.id.clone()),
            created_at: Utc::now(),
        };

        match self.db.movements().insert(&movement).await {
            Ok(()) => {
                info!(
                    order_id = %order.id,
                    session_id = %session.id,
                    amount = %movement.amount(),
                    "Order synced into ledger"
                );
                self.events.publish_ledger(LedgerChange::MovementRecorded {
                    session_id: session.id.clone(),
                    movement_id: movement.id.clone(),
                });
                Ok(SyncOutcome::Created)
            }
            // Lost the check-then-insert race: another sync of the same
            // order got there first. The unique index is the authority.
            Err(e) if e.is_unique_violation() => {
                debug!(order_id = %order.id, "Concurrent sync already inserted movement");
                Ok(SyncOutcome::AlreadySynced)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Syncs a batch of orders in arrival order, tolerating per-order
    /// failure: one order's store error is counted and logged but never
    /// aborts the rest.
    ///
    /// Used both by the realtime router (batch of 1 via sync_order), the
    /// polling fallback, and the lifecycle manager's backfill open.
    pub async fn sync_batch(
        &self,
        session: &RegisterSession,
        orders: &[OrderSnapshot],
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for order in orders {
            match self.sync_order(session, order).await {
                Ok(outcome) => report.absorb(outcome),
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Order sync failed");
                    report.failed += 1;
                }
            }
        }

        if report.created > 0 || report.removed > 0 || report.failed > 0 {
            info!(
                created = report.created,
                already_synced = report.already_synced,
                skipped = report.skipped,
                removed = report.removed,
                failed = report.failed,
                "Batch sync finished"
            );
        }

        report
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
