// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Fintrack", "fintrack"));

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("fintrack.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- Single slot: saving a new table overwrites the old one
    CREATE TABLE IF NOT EXISTS conversion_rates(
        id INTEGER PRIMARY KEY CHECK (id = 1),
        rates TEXT NOT NULL,
        last_updated TEXT NOT NULL,
        saved_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        from_currency TEXT NOT NULL,
        converted_amount TEXT NOT NULL,
        to_currency TEXT NOT NULL,
        category_id INTEGER NOT NULL,
        payment_method TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        receipt_image TEXT,
        product_image TEXT,
        is_public INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(category_id) REFERENCES categories(id)
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);

    CREATE TABLE IF NOT EXISTS debts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        original_principal TEXT NOT NULL,
        principal_amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        repayment_amount TEXT NOT NULL,
        interest_rate TEXT NOT NULL,
        repayment_day INTEGER NOT NULL CHECK(repayment_day BETWEEN 1 AND 31),
        start_date TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS debt_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        debt_id INTEGER NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('payment','repayment','interest')),
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        FOREIGN KEY(debt_id) REFERENCES debts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_debt_transactions_debt ON debt_transactions(debt_id);

    CREATE TABLE IF NOT EXISTS investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        type TEXT NOT NULL,
        platform TEXT NOT NULL,
        purchase_date TEXT NOT NULL,
        quantity TEXT NOT NULL,
        unit TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        style TEXT NOT NULL,
        sold_amount TEXT,
        sold_date TEXT,
        profit TEXT,
        CHECK ((sold_amount IS NULL AND sold_date IS NULL AND profit IS NULL)
            OR (sold_amount IS NOT NULL AND sold_date IS NOT NULL AND profit IS NOT NULL))
    );
    "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_or_init_creates_parent_dirs_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("fintrack.sqlite");
        drop(open_or_init(&path).unwrap());
        let conn = open_or_init(&path).unwrap();
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='conversion_rates'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn partial_sale_state_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        let res = conn.execute(
            "INSERT INTO investments(title,type,platform,purchase_date,quantity,unit,total_amount,currency,style,sold_amount)
             VALUES ('Gold','commodity','Bank','2025-01-01','10','g','100','USD','long','150')",
            [],
        );
        assert!(res.is_err());
    }
}
