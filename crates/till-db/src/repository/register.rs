//! # Register Session Repository
//!
//! Database operations for register sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Register Session Lifecycle                          │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── insert_session() → RegisterSession { status: Open }            │
//! │                                                                         │
//! │  2. OPERATE                                                            │
//! │     └── movements accumulate against the session (movement repo)       │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close_session() → totals + discrepancy stamped, status Closed  │
//! │         (single UPDATE guarded by status = 'open')                     │
//! │                                                                         │
//! │  4. (OPTIONAL) PURGE                                                   │
//! │     └── delete_closed_with_movements() → one transactional unit        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::RegisterSession;

/// Columns selected for every session read; keep in sync with the schema.
const SESSION_COLUMNS: &str = "id, opened_at, closed_at, opening_cents, closing_cents, \
     total_entry_cents, total_exit_cents, expected_cents, discrepancy_cents, \
     opened_by, closed_by, notes, status";

/// Close-time values stamped onto a session row in a single UPDATE.
#[derive(Debug, Clone)]
pub struct SessionClose {
    pub closed_at: DateTime<Utc>,
    pub closing_cents: i64,
    pub total_entry_cents: i64,
    pub total_exit_cents: i64,
    pub expected_cents: i64,
    pub discrepancy_cents: i64,
    pub closed_by: String,
    pub notes: Option<String>,
}

/// Repository for register session database operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Inserts a freshly opened session.
    pub async fn insert_session(&self, session: &RegisterSession) -> DbResult<()> {
        debug!(id = %session.id, opened_by = %session.opened_by, "Inserting register session");

        sqlx::query(
            r#"
            INSERT INTO register_sessions (
                id, opened_at, closed_at, opening_cents, closing_cents,
                total_entry_cents, total_exit_cents, expected_cents, discrepancy_cents,
                opened_by, closed_by, notes, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&session.id)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .bind(session.opening_cents)
        .bind(session.closing_cents)
        .bind(session.total_entry_cents)
        .bind(session.total_exit_cents)
        .bind(session.expected_cents)
        .bind(session.discrepancy_cents)
        .bind(&session.opened_by)
        .bind(&session.closed_by)
        .bind(&session.notes)
        .bind(session.status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds the currently open session, if any.
    ///
    /// Returns at most one row. The "at most one open" invariant is enforced
    /// by the lifecycle manager (a new session is only created after
    /// confirming none is open); the DESC order makes the newest win if that
    /// invariant is ever violated out-of-band.
    pub async fn find_open(&self) -> DbResult<Option<RegisterSession>> {
        let session = sqlx::query_as::<_, RegisterSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM register_sessions \
             WHERE status = 'open' ORDER BY opened_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RegisterSession>> {
        let session = sqlx::query_as::<_, RegisterSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM register_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Lists recent sessions, newest first (history view).
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<RegisterSession>> {
        let sessions = sqlx::query_as::<_, RegisterSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM register_sessions \
             ORDER BY opened_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Closes a session: stamps totals, discrepancy and operator, flips
    /// status to Closed.
    ///
    /// The UPDATE is guarded by `status = 'open'`, making close a terminal
    /// write: a second close of the same session fails with NotFound.
    pub async fn close_session(&self, id: &str, close: &SessionClose) -> DbResult<()> {
        debug!(id = %id, closing_cents = close.closing_cents, "Closing register session");

        let result = sqlx::query(
            r#"
            UPDATE register_sessions SET
                closed_at = ?2,
                closing_cents = ?3,
                total_entry_cents = ?4,
                total_exit_cents = ?5,
                expected_cents = ?6,
                discrepancy_cents = ?7,
                closed_by = ?8,
                notes = ?9,
                status = 'closed'
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(close.closed_at)
        .bind(close.closing_cents)
        .bind(close.total_entry_cents)
        .bind(close.total_exit_cents)
        .bind(close.expected_cents)
        .bind(close.discrepancy_cents)
        .bind(&close.closed_by)
        .bind(&close.notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Register session (open)", id));
        }

        Ok(())
    }

    /// Deletes a closed session together with its movements as one
    /// transactional unit (movements first, then the session row).
    ///
    /// The session DELETE is guarded by `status = 'closed'`; when it matches
    /// nothing the transaction rolls back, so movements of a live session can
    /// never be lost through this path.
    pub async fn delete_closed_with_movements(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM movements WHERE register_session_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "DELETE FROM register_sessions WHERE id = ?1 AND status = 'closed'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropped tx rolls back the movement deletes
            return Err(DbError::not_found("Register session (closed)", id));
        }

        tx.commit().await?;

        debug!(id = %id, "Deleted register session and its movements");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
