// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("org.hearth", "Hearth", "hearth"));

const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Food", "expense", "#ef4444"),
    ("Housing", "expense", "#f97316"),
    ("Transport", "expense", "#eab308"),
    ("Health", "expense", "#10b981"),
    ("Leisure", "expense", "#06b6d4"),
    ("Education", "expense", "#6366f1"),
    ("Clothing", "expense", "#ec4899"),
    ("Groceries", "expense", "#84cc16"),
    ("Bills", "expense", "#f59e0b"),
    ("Installments", "expense", "#8b5cf6"),
    ("Other expenses", "expense", "#64748b"),
    ("Salary", "income", "#22c55e"),
    ("Meal voucher", "income", "#14b8a6"),
    ("Freelance", "income", "#a855f7"),
    ("Investments", "income", "#f97316"),
    ("Other income", "income", "#64748b"),
];

const DEFAULT_TYPES: &[(&str, &str, &str, Option<&str>)] = &[
    ("Fixed", "expense", "#0ea5e9", Some("fixed")),
    ("Installment", "expense", "#8b5cf6", Some("installment")),
    ("One-time", "expense", "#64748b", Some("one_time")),
    ("Recurring", "income", "#22c55e", None),
    ("Extra", "income", "#a855f7", None),
];

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("hearth.sqlite"))
}

/// Opens the database at `path` (or the platform default) and ensures the schema.
pub fn open_or_init(path: Option<&Path>) -> Result<Connection> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => db_path()?,
    };
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL CHECK(kind IN ('checking','credit','savings','cash','other')),
        initial_balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS members(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        color TEXT NOT NULL,
        aggregate_to_family INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('expense','income')),
        color TEXT NOT NULL,
        description TEXT,
        UNIQUE(name, kind)
    );

    CREATE TABLE IF NOT EXISTS entry_types(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('expense','income')),
        color TEXT NOT NULL,
        description TEXT,
        recurrence TEXT CHECK(recurrence IN ('fixed','installment','one_time')),
        UNIQUE(name, kind)
    );

    CREATE TABLE IF NOT EXISTS movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        account_id INTEGER,
        member_id INTEGER,
        category_id INTEGER,
        type_id INTEGER,
        aggregate_to_family INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(member_id) REFERENCES members(id),
        FOREIGN KEY(category_id) REFERENCES categories(id),
        FOREIGN KEY(type_id) REFERENCES entry_types(id)
    );
    CREATE INDEX IF NOT EXISTS idx_movements_date ON movements(date);

    -- parent_transaction_id has no foreign key: deleting a parent leaves its
    -- siblings in place and still grouped.
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        account_id INTEGER,
        member_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        type_id INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending','paid')),
        installment_number INTEGER,
        total_installments INTEGER,
        parent_transaction_id INTEGER,
        aggregate_to_family INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        CHECK(installment_number IS NULL OR
              (total_installments IS NOT NULL AND installment_number BETWEEN 1 AND total_installments)),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(member_id) REFERENCES members(id),
        FOREIGN KEY(category_id) REFERENCES categories(id),
        FOREIGN KEY(type_id) REFERENCES entry_types(id)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_parent ON transactions(parent_transaction_id);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        category_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        UNIQUE(year, month, category_id),
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );
    "#,
    )?;
    Ok(())
}

/// Inserts the default categories and types into empty tables.
/// Returns how many rows were added.
pub fn seed_defaults(conn: &mut Connection) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut added = 0;

    let categories: i64 = tx.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if categories == 0 {
        for (name, kind, color) in DEFAULT_CATEGORIES {
            tx.execute(
                "INSERT INTO categories(name, kind, color) VALUES (?1, ?2, ?3)",
                params![name, kind, color],
            )?;
            added += 1;
        }
    }

    let types: i64 = tx.query_row("SELECT COUNT(*) FROM entry_types", [], |r| r.get(0))?;
    if types == 0 {
        for (name, kind, color, recurrence) in DEFAULT_TYPES {
            tx.execute(
                "INSERT INTO entry_types(name, kind, color, recurrence) VALUES (?1, ?2, ?3, ?4)",
                params![name, kind, color, recurrence],
            )?;
            added += 1;
        }
    }

    tx.commit()?;
    tracing::info!(added, "seeded default lookup rows");
    Ok(added)
}
