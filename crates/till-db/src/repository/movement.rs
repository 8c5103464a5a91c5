//! # Movement Repository
//!
//! Database operations for ledger lines.
//!
//! ## Dedup Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For any (register_session_id, source_order_id) with a non-null         │
//! │  order id, AT MOST ONE movement may exist.                              │
//! │                                                                         │
//! │  exists_for_order()  ← fast-path procedural check (sync engine)         │
//! │  unique index        ← authority under concurrent inserts; a violation  │
//! │                        surfaces as DbError::UniqueViolation and the     │
//! │                        engine treats it as "already synced"             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Movements are never updated in place: compensation for a cancelled order
//! is a delete, and corrections are delete + re-record.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::Movement;

/// Columns selected for every movement read; keep in sync with the schema.
const MOVEMENT_COLUMNS: &str = "id, register_session_id, category_id, staff_id, kind, \
     amount_cents, description, payment_method, source_order_id, created_at";

/// Repository for movement database operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Inserts a movement.
    ///
    /// Structural rules are enforced by the schema:
    /// - `amount_cents > 0` (CHECK)
    /// - `register_session_id` must reference an existing session (FK)
    /// - at most one movement per (session, order) pair (partial UNIQUE)
    pub async fn insert(&self, movement: &Movement) -> DbResult<()> {
        debug!(
            id = %movement.id,
            session_id = %movement.register_session_id,
            amount_cents = movement.amount_cents,
            "Inserting movement"
        );

        sqlx::query(
            r#"
            INSERT INTO movements (
                id, register_session_id, category_id, staff_id, kind,
                amount_cents, description, payment_method, source_order_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.register_session_id)
        .bind(&movement.category_id)
        .bind(&movement.staff_id)
        .bind(movement.kind)
        .bind(movement.amount_cents)
        .bind(&movement.description)
        .bind(&movement.payment_method)
        .bind(&movement.source_order_id)
        .bind(movement.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a movement by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Movement>> {
        let movement = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movement)
    }

    /// Checks whether a movement derived from the given order already exists
    /// in the session. The existence-check primitive the sync engine's
    /// idempotency fast path relies on.
    pub async fn exists_for_order(&self, session_id: &str, order_id: &str) -> DbResult<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS( \
                 SELECT 1 FROM movements \
                 WHERE register_session_id = ?1 AND source_order_id = ?2)",
        )
        .bind(session_id)
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// Deletes a movement by ID.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM movements WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Movement", id));
        }

        debug!(id = %id, "Deleted movement");
        Ok(())
    }

    /// Deletes the movement(s) derived from an order (compensation path).
    ///
    /// Idempotent: deleting zero rows is not an error. Returns the number of
    /// rows removed.
    pub async fn delete_by_order(&self, session_id: &str, order_id: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM movements \
             WHERE register_session_id = ?1 AND source_order_id = ?2",
        )
        .bind(session_id)
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(session_id = %session_id, order_id = %order_id, removed, "Compensated order movement");
        }
        Ok(removed)
    }

    /// Lists all movements for a session, newest first.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements \
             WHERE register_session_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use till_core::{MovementKind, RegisterSession, RegisterStatus};

    async fn db_with_session(session_id: &str) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = RegisterSession {
            id: session_id.to_string(),
            opened_at: Utc::now(),
            closed_at: None,
            opening_cents: 0,
            closing_cents: None,
            total_entry_cents: 0,
            total_exit_cents: 0,
            expected_cents: 0,
            discrepancy_cents: None,
            opened_by: "Ana".to_string(),
            closed_by: None,
            notes: None,
            status: RegisterStatus::Open,
        };
        db.registers().insert_session(&session).await.unwrap();
        db
    }

    fn movement(id: &str, session_id: &str, amount_cents: i64, order: Option<&str>) -> Movement {
        Movement {
            id: id.to_string(),
            register_session_id: session_id.to_string(),
            category_id: None,
            staff_id: None,
            kind: MovementKind::Entry,
            amount_cents,
            description: None,
            payment_method: None,
            source_order_id: order.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = db_with_session("s1").await;
        let repo = db.movements();

        repo.insert(&movement("m1", "s1", 2350, Some("o1"))).await.unwrap();
        repo.insert(&movement("m2", "s1", 1000, None)).await.unwrap();

        let listed = repo.list_for_session("s1").await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let db = db_with_session("s1").await;
        let repo = db.movements();

        let err = repo.insert(&movement("m1", "s1", 0, None)).await;
        assert!(matches!(err, Err(DbError::CheckViolation { .. })));

        let err = repo.insert(&movement("m2", "s1", -500, None)).await;
        assert!(matches!(err, Err(DbError::CheckViolation { .. })));
    }

    #[tokio::test]
    async fn test_rejects_unknown_session() {
        let db = db_with_session("s1").await;
        let repo = db.movements();

        let err = repo.insert(&movement("m1", "missing", 100, None)).await;
        assert!(matches!(err, Err(DbError::ForeignKeyViolation { .. })));
    }

    #[tokio::test]
    async fn test_unique_index_blocks_duplicate_order_movement() {
        let db = db_with_session("s1").await;
        let repo = db.movements();

        repo.insert(&movement("m1", "s1", 2350, Some("o1"))).await.unwrap();

        let err = repo.insert(&movement("m2", "s1", 2350, Some("o1"))).await;
        assert!(matches!(err, Err(DbError::UniqueViolation { .. })));

        // Manual movements (no order id) are not constrained
        repo.insert(&movement("m3", "s1", 100, None)).await.unwrap();
        repo.insert(&movement("m4", "s1", 100, None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_exists_for_order() {
        let db = db_with_session("s1").await;
        let repo = db.movements();

        assert!(!repo.exists_for_order("s1", "o1").await.unwrap());
        repo.insert(&movement("m1", "s1", 2350, Some("o1"))).await.unwrap();
        assert!(repo.exists_for_order("s1", "o1").await.unwrap());
        assert!(!repo.exists_for_order("s1", "o2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_order_is_idempotent() {
        let db = db_with_session("s1").await;
        let repo = db.movements();

        repo.insert(&movement("m1", "s1", 2350, Some("o1"))).await.unwrap();

        assert_eq!(repo.delete_by_order("s1", "o1").await.unwrap(), 1);
        // Second compensation deletes nothing and is not an error
        assert_eq!(repo.delete_by_order("s1", "o1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_movement() {
        let db = db_with_session("s1").await;
        let err = db.movements().delete("missing").await;
        assert!(matches!(err, Err(DbError::NotFound { .. })));
    }
}
