//! # Lookup Repository
//!
//! Read-mostly access to category and staff reference data.
//!
//! The sync engine resolves categories by exact name against the active
//! list; operators pick categories and staff from the same lists in the UI.
//! Writes exist for the seed binary and administration flows.

use sqlx::SqlitePool;

use crate::error::DbResult;
use till_core::{Category, Staff};

const CATEGORY_COLUMNS: &str = "id, name, kind, color, icon, is_active, sort_order";
const STAFF_COLUMNS: &str = "id, name, role, is_active";

/// Repository for category and staff lookups.
#[derive(Debug, Clone)]
pub struct LookupRepository {
    pool: SqlitePool,
}

impl LookupRepository {
    /// Creates a new LookupRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LookupRepository { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Lists active categories in display order.
    pub async fn list_active_categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM ledger_categories \
             WHERE is_active = 1 ORDER BY sort_order, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Finds an active category by exact name.
    pub async fn find_active_category(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM ledger_categories \
             WHERE is_active = 1 AND name = ?1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a category (seed/administration path).
    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_categories (id, name, kind, color, icon, is_active, sort_order)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.kind)
        .bind(&category.color)
        .bind(&category.icon)
        .bind(category.is_active)
        .bind(category.sort_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts all categories (active or not). Used by the seed guard.
    pub async fn count_categories(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Staff
    // =========================================================================

    /// Lists active staff ordered by name.
    pub async fn list_active_staff(&self) -> DbResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Inserts a staff member (seed/administration path).
    pub async fn insert_staff(&self, staff: &Staff) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO staff (id, name, role, is_active) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(&staff.role)
        .bind(staff.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use till_core::MovementKind;

    fn category(name: &str, active: bool, sort_order: i64) -> Category {
        Category {
            id: format!("cat-{name}"),
            name: name.to_string(),
            kind: MovementKind::Entry,
            color: "#607d8b".to_string(),
            icon: "tag".to_string(),
            is_active: active,
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_active_categories_filter_and_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.lookups();

        repo.insert_category(&category("Daily Sales", true, 2)).await.unwrap();
        repo.insert_category(&category("Order - Cash", true, 1)).await.unwrap();
        repo.insert_category(&category("Retired", false, 0)).await.unwrap();

        let active = repo.list_active_categories().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].name, "Order - Cash");
        assert_eq!(active[1].name, "Daily Sales");
    }

    #[tokio::test]
    async fn test_find_active_category_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.lookups();

        repo.insert_category(&category("Order - PIX", true, 0)).await.unwrap();
        repo.insert_category(&category("Retired", false, 0)).await.unwrap();

        assert!(repo.find_active_category("Order - PIX").await.unwrap().is_some());
        assert!(repo.find_active_category("Retired").await.unwrap().is_none());
        assert!(repo.find_active_category("Missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_staff_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.lookups();

        repo.insert_staff(&Staff {
            id: "st1".to_string(),
            name: "Bruna".to_string(),
            role: "cashier".to_string(),
            is_active: true,
        })
        .await
        .unwrap();
        repo.insert_staff(&Staff {
            id: "st2".to_string(),
            name: "Alex".to_string(),
            role: "manager".to_string(),
            is_active: false,
        })
        .await
        .unwrap();

        let active = repo.list_active_staff().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Bruna");
    }
}
