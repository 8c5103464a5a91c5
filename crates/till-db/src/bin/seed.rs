//! # Seed Data Generator
//!
//! Populates the database with the reference data the register needs on a
//! fresh install: ledger categories (including the order-sync categories the
//! engine resolves by name) and a starter staff list.
//!
//! ## Usage
//! ```bash
//! cargo run -p till-db --bin seed
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```

use std::env;
use till_core::{Category, MovementKind, PaymentTag, Staff, FALLBACK_CATEGORY};
use till_db::{Database, DbConfig};
use uuid::Uuid;

/// Entry categories: the names the sync engine resolves payment tags to,
/// plus the fallback. Removing these breaks order sync resolution.
const ENTRY_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Order - Cash", "#4caf50", "banknote"),
    ("Order - PIX", "#00bcd4", "qr-code"),
    ("Order - Debit Card", "#3f51b5", "credit-card"),
    ("Order - Credit Card", "#9c27b0", "credit-card"),
    (FALLBACK_CATEGORY, "#8bc34a", "shopping-bag"),
    ("Other Income", "#607d8b", "plus-circle"),
];

/// Exit categories for manual movements.
const EXIT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Supplies", "#ff9800", "package"),
    ("Delivery Fees", "#795548", "bike"),
    ("Staff Payment", "#f44336", "users"),
    ("Other Expense", "#9e9e9e", "minus-circle"),
];

/// Starter staff list.
const STAFF: &[(&str, &str)] = &[("Owner", "manager"), ("Counter", "cashier")];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Till Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing reference data
    let existing = db.lookups().count_categories().await?;
    if existing > 0 {
        println!("⚠ Database already has {} categories", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding categories...");

    let mut sort_order = 0;
    for (name, color, icon) in ENTRY_CATEGORIES {
        db.lookups()
            .insert_category(&make_category(name, MovementKind::Entry, color, icon, sort_order))
            .await?;
        sort_order += 1;
    }
    for (name, color, icon) in EXIT_CATEGORIES {
        db.lookups()
            .insert_category(&make_category(name, MovementKind::Exit, color, icon, sort_order))
            .await?;
        sort_order += 1;
    }
    println!("  {} categories", sort_order);

    println!("Seeding staff...");
    for (name, role) in STAFF {
        db.lookups()
            .insert_staff(&Staff {
                id: Uuid::new_v4().to_string(),
                name: (*name).to_string(),
                role: (*role).to_string(),
                is_active: true,
            })
            .await?;
    }
    println!("  {} staff members", STAFF.len());

    // Sanity check: every payment tag must resolve against the seeded list
    let categories = db.lookups().list_active_categories().await?;
    for raw in ["Cash", "PIX", "Debit Card", "Credit Card", "Voucher"] {
        let tag = PaymentTag::parse(raw);
        let resolved = till_core::payment::resolve_category(&categories, raw)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "<unresolved>".to_string());
        println!("  {:?} ({raw}) → {resolved}", tag);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds a category row with a fresh UUID.
fn make_category(
    name: &str,
    kind: MovementKind,
    color: &str,
    icon: &str,
    sort_order: i64,
) -> Category {
    Category {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        kind,
        color: color.to_string(),
        icon: icon.to_string(),
        is_active: true,
        sort_order,
    }
}
