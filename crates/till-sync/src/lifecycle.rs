//! # Register Lifecycle Manager
//!
//! The open/close state machine plus manual movements and session deletion.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (no open session) ──open()──► Open ──close()──► Closed               │
//! │                                                                         │
//! │   • A fresh session is created per open; sessions are never reopened   │
//! │   • open() fails with AlreadyOpen while a session is open              │
//! │   • close() fails with NotOpen when nothing is open                    │
//! │   • Closed sessions are immutable except for whole-unit deletion       │
//! │                                                                         │
//! │  Backfill open:                                                        │
//! │   opening float is FORCED to zero and the reference day's orders are   │
//! │   synced in as entries instead. An operator float would double count   │
//! │   against the backfilled orders - zeroing it is business policy, not   │
//! │   an implementation shortcut.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use till_core::validation::{
    validate_amount, validate_counted_amount, validate_note, validate_operator_name,
};
use till_core::{ledger_stats, Money, Movement, MovementKind, RegisterSession, RegisterStatus};
use till_db::repository::register::SessionClose;
use till_db::Database;

use crate::engine::{BatchReport, SyncEngine};
use crate::error::{SyncError, SyncResult};
use crate::events::{EventBus, LedgerChange};
use crate::notify::{Notice, NotificationSink};

// =============================================================================
// Open Mode
// =============================================================================

/// How the register is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Operator counts a float into the drawer; no orders are synced at open.
    Manual,
    /// Opening float forced to zero; the reference day's orders are synced
    /// in as entries so cash on hand derives purely from the ledger.
    Backfill,
}

/// Result of an open: the new session and, for backfill mode, the batch
/// report of the initial sync.
#[derive(Debug, Clone)]
pub struct OpenOutcome {
    pub session: RegisterSession,
    pub backfill: Option<BatchReport>,
}

// =============================================================================
// Lifecycle Manager
// =============================================================================

/// Orchestrates register open/close transitions and manual movements.
///
/// Holds no session state of its own: the open session is re-read from the
/// store before every transition, so concurrent actors converge on the
/// store's view rather than a cached one.
#[derive(Clone)]
pub struct RegisterLifecycleManager {
    db: Database,
    engine: SyncEngine,
    events: EventBus,
    notifier: Arc<dyn NotificationSink>,
}

impl RegisterLifecycleManager {
    /// Creates a new lifecycle manager.
    pub fn new(
        db: Database,
        engine: SyncEngine,
        events: EventBus,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        RegisterLifecycleManager {
            db,
            engine,
            events,
            notifier,
        }
    }

    /// Opens the register.
    ///
    /// ## Preconditions
    /// - No session is currently open (`AlreadyOpen` otherwise)
    /// - `opening` is not negative; operator name is non-empty
    ///
    /// ## Backfill mode
    /// `opened_at` is anchored at the start of the reference day (default:
    /// today) so the day's earlier orders pass the sync window check, the
    /// opening float is forced to zero, and every non-cancelled order of the
    /// day (window ends 02:00 the next day, catching late-night orders) is
    /// synced in through the engine.
    pub async fn open(
        &self,
        opening: Money,
        operator: &str,
        reference_date: Option<DateTime<Utc>>,
        mode: OpenMode,
    ) -> SyncResult<OpenOutcome> {
        validate_operator_name(operator)?;
        validate_counted_amount("opening", opening)?;

        if let Some(existing) = self.db.registers().find_open().await? {
            return Err(SyncError::AlreadyOpen(existing.id));
        }

        let now = Utc::now();
        let anchor = reference_date.unwrap_or(now);
        let (opened_at, opening) = match mode {
            OpenMode::Manual => (anchor, opening),
            OpenMode::Backfill => (start_of_day(anchor), Money::zero()),
        };

        let session = RegisterSession {
            id: Uuid::new_v4().to_string(),
            opened_at,
            closed_at: None,
            opening_cents: opening.cents(),
            closing_cents: None,
            total_entry_cents: 0,
            total_exit_cents: 0,
            expected_cents: opening.cents(),
            discrepancy_cents: None,
            opened_by: operator.trim().to_string(),
            closed_by: None,
            notes: None,
            status: RegisterStatus::Open,
        };

        self.db.registers().insert_session(&session).await?;
        info!(session_id = %session.id, opened_by = %session.opened_by, opening = %opening, "Register opened");
        self.events.publish_ledger(LedgerChange::SessionOpened {
            session_id: session.id.clone(),
        });

        let backfill = match mode {
            OpenMode::Manual => None,
            OpenMode::Backfill => {
                let window_end = opened_at + Duration::days(1) + Duration::hours(2);
                let orders = self.db.orders().list_between(opened_at, window_end).await?;
                let report = self.engine.sync_batch(&session, &orders).await;
                info!(
                    session_id = %session.id,
                    created = report.created,
                    "Backfill sync complete"
                );
                Some(report)
            }
        };

        self.notifier.notify(Notice::success(
            "Register Opened",
            match backfill {
                Some(report) => format!(
                    "Register opened with {} order(s) synced from the day.",
                    report.created
                ),
                None => "The register was opened successfully.".to_string(),
            },
        ));

        Ok(OpenOutcome { session, backfill })
    }

    /// Closes the open register.
    ///
    /// Computes the expected balance from the session's current movements,
    /// stamps `discrepancy = closing − expected`, denormalizes entry/exit
    /// totals onto the row and flips status to Closed.
    pub async fn close(
        &self,
        closing: Money,
        operator: &str,
        notes: Option<String>,
    ) -> SyncResult<RegisterSession> {
        validate_operator_name(operator)?;
        validate_counted_amount("closing", closing)?;
        validate_note("notes", notes.as_deref())?;

        let session = self.db.registers().find_open().await?.ok_or(SyncError::NotOpen)?;

        let movements = self.db.movements().list_for_session(&session.id).await?;
        let stats = ledger_stats(&session, &movements);
        let expected = stats.balance();
        let discrepancy = closing - expected;

        let close = SessionClose {
            closed_at: Utc::now(),
            closing_cents: closing.cents(),
            total_entry_cents: stats.total_entry_cents,
            total_exit_cents: stats.total_exit_cents,
            expected_cents: expected.cents(),
            discrepancy_cents: discrepancy.cents(),
            closed_by: operator.trim().to_string(),
            notes,
        };
        self.db.registers().close_session(&session.id, &close).await?;

        info!(
            session_id = %session.id,
            expected = %expected,
            discrepancy = %discrepancy,
            "Register closed"
        );
        self.events.publish_ledger(LedgerChange::SessionClosed {
            session_id: session.id.clone(),
        });

        let message = if discrepancy.is_zero() {
            "Register closed with no discrepancy.".to_string()
        } else {
            format!("Register closed. Discrepancy: {discrepancy}")
        };
        self.notifier.notify(Notice::success("Register Closed", message));

        self.db
            .registers()
            .get_by_id(&session.id)
            .await?
            .ok_or_else(|| SyncError::SessionNotFound(session.id.clone()))
    }

    /// Records a manual entry or exit against the open register.
    ///
    /// Always `source_order_id = None`, so manual lines are invisible to the
    /// sync engine's dedup and compensation logic.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_movement(
        &self,
        kind: MovementKind,
        amount: Money,
        category_id: Option<String>,
        staff_id: Option<String>,
        description: Option<String>,
        payment_method: Option<String>,
    ) -> SyncResult<Movement> {
        validate_amount(amount)?;
        validate_note("description", description.as_deref())?;

        let session = self.db.registers().find_open().await?.ok_or(SyncError::NotOpen)?;

        let movement = Movement {
            id: Uuid::new_v4().to_string(),
            register_session_id: session.id.clone(),
            category_id,
            staff_id,
            kind,
            amount_cents: amount.cents(),
            description,
            payment_method,
            source_order_id: None,
            created_at: Utc::now(),
        };
        self.db.movements().insert(&movement).await?;

        info!(
            movement_id = %movement.id,
            session_id = %session.id,
            kind = ?kind,
            amount = %amount,
            "Manual movement recorded"
        );
        self.events.publish_ledger(LedgerChange::MovementRecorded {
            session_id: session.id.clone(),
            movement_id: movement.id.clone(),
        });

        let label = match kind {
            MovementKind::Entry => "Entry",
            MovementKind::Exit => "Exit",
        };
        self.notifier.notify(Notice::success(
            "Movement Recorded",
            format!("{label} of {amount} recorded."),
        ));

        Ok(movement)
    }

    /// Deletes a movement by explicit user action.
    pub async fn delete_movement(&self, id: &str) -> SyncResult<()> {
        let movement = self
            .db
            .movements()
            .get_by_id(id)
            .await?
            .ok_or_else(|| till_db::DbError::not_found("Movement", id))?;

        self.db.movements().delete(id).await?;
        self.events.publish_ledger(LedgerChange::MovementRemoved {
            session_id: movement.register_session_id.clone(),
        });
        self.notifier
            .notify(Notice::success("Deleted", "Movement deleted."));
        Ok(())
    }

    /// Deletes a closed session and its movements as one unit.
    ///
    /// Open sessions are never deletable.
    pub async fn delete_session(&self, id: &str) -> SyncResult<()> {
        let session = self
            .db
            .registers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| SyncError::SessionNotFound(id.to_string()))?;

        if session.is_open() {
            warn!(session_id = %id, "Refusing to delete open session");
            return Err(SyncError::SessionStillOpen(id.to_string()));
        }

        self.db.registers().delete_closed_with_movements(id).await?;
        self.notifier
            .notify(Notice::success("Deleted", "Register session deleted."));
        Ok(())
    }

    /// Recent sessions, newest first (history view).
    pub async fn history(&self, limit: i64) -> SyncResult<Vec<RegisterSession>> {
        Ok(self.db.registers().list_recent(limit).await?)
    }
}

/// Midnight UTC of the given instant's date.
fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoOpSink;
    use crate::testutil::{order, seeded_db};
    use till_core::{OrderStatus, ValidationError};

    fn manager(db: &Database) -> RegisterLifecycleManager {
        let events = EventBus::new();
        let notifier: Arc<dyn NotificationSink> = Arc::new(NoOpSink);
        let engine = SyncEngine::new(db.clone(), events.clone(), notifier.clone());
        RegisterLifecycleManager::new(db.clone(), engine, events, notifier)
    }

    #[tokio::test]
    async fn test_open_rejects_second_open() {
        let db = seeded_db().await;
        let manager = manager(&db);

        manager
            .open(Money::from_cents(5000), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();

        let err = manager
            .open(Money::from_cents(100), "Bruna", None, OpenMode::Manual)
            .await;
        assert!(matches!(err, Err(SyncError::AlreadyOpen(_))));

        // Still exactly one open session
        assert!(db.registers().find_open().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_validates_input() {
        let db = seeded_db().await;
        let manager = manager(&db);

        let err = manager
            .open(Money::from_cents(-1), "Ana", None, OpenMode::Manual)
            .await;
        assert!(matches!(
            err,
            Err(SyncError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));

        let err = manager
            .open(Money::zero(), "  ", None, OpenMode::Manual)
            .await;
        assert!(matches!(
            err,
            Err(SyncError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_close_discrepancy_math() {
        let db = seeded_db().await;
        let manager = manager(&db);

        let opened = manager
            .open(Money::from_cents(5000), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();
        let session = opened.session;

        // One synced order and one manual exit
        let engine = SyncEngine::new(db.clone(), EventBus::new(), Arc::new(NoOpSink));
        engine
            .sync_order(
                &session,
                &order("o1", 2350, "Cash", OrderStatus::Confirmed, Utc::now()),
            )
            .await
            .unwrap();
        manager
            .record_movement(
                MovementKind::Exit,
                Money::from_cents(1200),
                None,
                None,
                Some("supply run".to_string()),
                None,
            )
            .await
            .unwrap();

        // expected = 50.00 + 23.50 - 12.00 = 61.50; counted 62.00 → +0.50
        let closed = manager
            .close(Money::from_cents(6200), "Ana", None)
            .await
            .unwrap();

        assert_eq!(closed.status, RegisterStatus::Closed);
        assert_eq!(closed.expected_cents, 6150);
        assert_eq!(closed.total_entry_cents, 2350);
        assert_eq!(closed.total_exit_cents, 1200);
        assert_eq!(closed.discrepancy_cents, Some(50));
        assert_eq!(closed.closed_by.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_close_exact_count_yields_zero_discrepancy() {
        let db = seeded_db().await;
        let manager = manager(&db);

        manager
            .open(Money::from_cents(5000), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();
        let closed = manager
            .close(Money::from_cents(5000), "Ana", None)
            .await
            .unwrap();
        assert_eq!(closed.discrepancy_cents, Some(0));
    }

    #[tokio::test]
    async fn test_close_requires_open_register() {
        let db = seeded_db().await;
        let manager = manager(&db);

        let err = manager.close(Money::zero(), "Ana", None).await;
        assert!(matches!(err, Err(SyncError::NotOpen)));
    }

    #[tokio::test]
    async fn test_backfill_open_scenario() {
        let db = seeded_db().await;
        let manager = manager(&db);

        // Three pre-existing non-cancelled orders today totaling 45.00,
        // plus a cancelled one that must not count
        let now = Utc::now();
        for (id, cents, method) in [
            ("o1", 1500, "Cash"),
            ("o2", 2000, "PIX"),
            ("o3", 1000, "Credit Card"),
        ] {
            db.orders()
                .upsert_order(&order(id, cents, method, OrderStatus::Delivered, now))
                .await
                .unwrap();
        }
        db.orders()
            .upsert_order(&order("ox", 9900, "Cash", OrderStatus::Cancelled, now))
            .await
            .unwrap();

        let outcome = manager
            .open(Money::from_cents(9999), "Ana", Some(now), OpenMode::Backfill)
            .await
            .unwrap();

        // Opening float forced to zero regardless of what was passed
        assert_eq!(outcome.session.opening_cents, 0);
        assert_eq!(outcome.session.opened_at, start_of_day(now));

        let report = outcome.backfill.unwrap();
        assert_eq!(report.created, 3);
        assert_eq!(report.removed, 1);

        let movements = db
            .movements()
            .list_for_session(&outcome.session.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 3);
        let stats = ledger_stats(&outcome.session, &movements);
        assert_eq!(stats.balance_cents, 4500);

        // Close with 50.00 counted → discrepancy +5.00
        let closed = manager
            .close(Money::from_cents(5000), "Ana", None)
            .await
            .unwrap();
        assert_eq!(closed.expected_cents, 4500);
        assert_eq!(closed.discrepancy_cents, Some(500));
    }

    #[tokio::test]
    async fn test_manual_movement_requires_open_register() {
        let db = seeded_db().await;
        let manager = manager(&db);

        let err = manager
            .record_movement(MovementKind::Exit, Money::from_cents(1200), None, None, None, None)
            .await;
        assert!(matches!(err, Err(SyncError::NotOpen)));
    }

    #[tokio::test]
    async fn test_manual_movement_rejects_non_positive_amount() {
        let db = seeded_db().await;
        let manager = manager(&db);
        manager
            .open(Money::zero(), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();

        let err = manager
            .record_movement(MovementKind::Entry, Money::zero(), None, None, None, None)
            .await;
        assert!(matches!(
            err,
            Err(SyncError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_manual_exit_untouched_by_order_sync() {
        let db = seeded_db().await;
        let manager = manager(&db);

        let opened = manager
            .open(Money::from_cents(5000), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();
        let session = opened.session;

        let exit = manager
            .record_movement(
                MovementKind::Exit,
                Money::from_cents(1200),
                None,
                None,
                Some("supply purchase".to_string()),
                None,
            )
            .await
            .unwrap();
        assert!(exit.source_order_id.is_none());

        // A cancellation sweep for an unrelated order leaves the exit alone
        let engine = SyncEngine::new(db.clone(), EventBus::new(), Arc::new(NoOpSink));
        engine
            .sync_order(
                &session,
                &order("ghost", 1200, "Cash", OrderStatus::Cancelled, Utc::now()),
            )
            .await
            .unwrap();

        let movements = db.movements().list_for_session(&session.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        let stats = ledger_stats(&session, &movements);
        assert_eq!(stats.balance_cents, 5000 - 1200);
        assert_eq!(stats.total_exit_cents, 1200);
    }

    #[tokio::test]
    async fn test_delete_session_lifecycle() {
        let db = seeded_db().await;
        let manager = manager(&db);

        let opened = manager
            .open(Money::zero(), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();
        let id = opened.session.id.clone();

        // Open sessions are never deletable
        let err = manager.delete_session(&id).await;
        assert!(matches!(err, Err(SyncError::SessionStillOpen(_))));

        manager.close(Money::zero(), "Ana", None).await.unwrap();
        manager.delete_session(&id).await.unwrap();
        assert!(db.registers().get_by_id(&id).await.unwrap().is_none());

        let err = manager.delete_session(&id).await;
        assert!(matches!(err, Err(SyncError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_movement_publishes_event() {
        let db = seeded_db().await;
        let events = EventBus::new();
        let notifier: Arc<dyn NotificationSink> = Arc::new(NoOpSink);
        let engine = SyncEngine::new(db.clone(), events.clone(), notifier.clone());
        let manager =
            RegisterLifecycleManager::new(db.clone(), engine, events.clone(), notifier);

        manager
            .open(Money::zero(), "Ana", None, OpenMode::Manual)
            .await
            .unwrap();
        let movement = manager
            .record_movement(MovementKind::Entry, Money::from_cents(100), None, None, None, None)
            .await
            .unwrap();

        let mut rx = events.subscribe_ledger();
        manager.delete_movement(&movement.id).await.unwrap();

        // SessionOpened/MovementRecorded happened before we subscribed;
        // the first event we see is the removal
        assert!(matches!(
            rx.recv().await.unwrap(),
            LedgerChange::MovementRemoved { .. }
        ));
    }

    #[tokio::test]
    async fn test_history_lists_recent_sessions() {
        let db = seeded_db().await;
        let manager = manager(&db);

        manager.open(Money::zero(), "Ana", None, OpenMode::Manual).await.unwrap();
        manager.close(Money::zero(), "Ana", None).await.unwrap();
        manager.open(Money::zero(), "Bruna", None, OpenMode::Manual).await.unwrap();

        let history = manager.history(10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].opened_by, "Bruna");
    }
}
