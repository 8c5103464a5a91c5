//! # Order Feed Repository
//!
//! Read-side mirror of the external order-management system.
//!
//! ## Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order Feed Boundary                             │
//! │                                                                         │
//! │  Order management system (out of scope)                                │
//! │       │  upsert_order() + OrderChange event on the bus                 │
//! │       ▼                                                                 │
//! │  orders table (this repository)                                        │
//! │       │  list_since / list_between / get                               │
//! │       ▼                                                                 │
//! │  SyncEngine / RealtimeEventRouter (read-only consumers)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger engine never writes orders; `upsert_order` is the ingest seam
//! used by the external feed (and by tests).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use till_core::OrderSnapshot;

const ORDER_COLUMNS: &str =
    "id, customer_name, total_cents, payment_method, delivery_type, status, created_at";

/// Repository for the order mirror.
#[derive(Debug, Clone)]
pub struct OrderFeedRepository {
    pool: SqlitePool,
}

impl OrderFeedRepository {
    /// Creates a new OrderFeedRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderFeedRepository { pool }
    }

    /// Inserts or replaces an order snapshot (ingest seam for the external
    /// feed; at-least-once delivery makes replays common).
    pub async fn upsert_order(&self, order: &OrderSnapshot) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_name, total_cents, payment_method,
                delivery_type, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                customer_name = excluded.customer_name,
                total_cents = excluded.total_cents,
                payment_method = excluded.payment_method,
                delivery_type = excluded.delivery_type,
                status = excluded.status,
                created_at = excluded.created_at
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_name)
        .bind(order.total_cents)
        .bind(&order.payment_method)
        .bind(order.delivery_type)
        .bind(order.status)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<OrderSnapshot>> {
        let order = sqlx::query_as::<_, OrderSnapshot>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists orders created at or after the given instant, newest first.
    pub async fn list_since(&self, from: DateTime<Utc>) -> DbResult<Vec<OrderSnapshot>> {
        let orders = sqlx::query_as::<_, OrderSnapshot>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE created_at >= ?1 ORDER BY created_at DESC"
        ))
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists orders created within [from, to], newest first. Used by the
    /// backfill open mode, whose window is a whole reference day.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<OrderSnapshot>> {
        let orders = sqlx::query_as::<_, OrderSnapshot>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE created_at >= ?1 AND created_at <= ?2 ORDER BY created_at DESC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use till_core::{DeliveryType, OrderStatus};

    fn order(id: &str, created_at: DateTime<Utc>, status: OrderStatus) -> OrderSnapshot {
        OrderSnapshot {
            id: id.to_string(),
            customer_name: "Maria".to_string(),
            total_cents: 2350,
            payment_method: "Cash".to_string(),
            delivery_type: DeliveryType::Pickup,
            status,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_replay_safe() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        let now = Utc::now();

        repo.upsert_order(&order("o1", now, OrderStatus::Pending)).await.unwrap();
        // Replay with a status transition
        repo.upsert_order(&order("o1", now, OrderStatus::Cancelled)).await.unwrap();

        let fetched = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(fetched.status, OrderStatus::Cancelled);
        assert_eq!(repo.list_since(now - Duration::hours(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_windows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();
        let now = Utc::now();

        repo.upsert_order(&order("old", now - Duration::days(2), OrderStatus::Delivered))
            .await
            .unwrap();
        repo.upsert_order(&order("recent", now - Duration::hours(1), OrderStatus::Delivered))
            .await
            .unwrap();
        repo.upsert_order(&order("new", now, OrderStatus::Pending)).await.unwrap();

        let since = repo.list_since(now - Duration::hours(2)).await.unwrap();
        assert_eq!(since.len(), 2);
        assert_eq!(since[0].id, "new");

        let between = repo
            .list_between(now - Duration::days(3), now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(between.len(), 2);
        assert_eq!(between[0].id, "recent");
        assert_eq!(between[1].id, "old");
    }
}
