// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::errors::{FinanceError, FinanceResult};
use crate::models::RateTable;

/// Single-slot persistence for the most recently saved rate table.
///
/// There is no concurrency control: two writers saving at the same time race
/// and the last write wins. Rate updates are rare manual actions, so the race
/// is accepted rather than guarded.
pub trait RateStore {
    /// Returns [`FinanceError::NotFound`] if nothing was ever saved.
    fn load(&self) -> FinanceResult<RateTable>;
    fn save(&self, table: &RateTable) -> FinanceResult<()>;
}

impl<T: RateStore + ?Sized> RateStore for &T {
    fn load(&self) -> FinanceResult<RateTable> {
        (**self).load()
    }

    fn save(&self, table: &RateTable) -> FinanceResult<()> {
        (**self).save(table)
    }
}

pub struct SqliteRateStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRateStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl RateStore for SqliteRateStore<'_> {
    fn load(&self) -> FinanceResult<RateTable> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT rates, last_updated FROM conversion_rates WHERE id=1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let (rates_json, updated) =
            row.ok_or_else(|| FinanceError::NotFound("Stored conversion rates".into()))?;

        let rates: BTreeMap<String, Decimal> = serde_json::from_str(&rates_json)
            .map_err(|e| FinanceError::invalid_input(rates_json.clone(), e.to_string()))?;
        let last_updated = DateTime::parse_from_rfc3339(&updated)
            .map_err(|e| FinanceError::RateParse(format!("last_updated '{}': {}", updated, e)))?
            .with_timezone(&Utc);
        let table = RateTable::new(rates, last_updated)?;
        tracing::debug!(currencies = table.len(), %last_updated, "loaded stored rates");
        Ok(table)
    }

    fn save(&self, table: &RateTable) -> FinanceResult<()> {
        let rates_json = serde_json::to_string(table.rates())
            .map_err(|e| FinanceError::RateParse(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO conversion_rates(id, rates, last_updated, saved_at)
             VALUES (1, ?1, ?2, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                rates=excluded.rates,
                last_updated=excluded.last_updated,
                saved_at=excluded.saved_at",
            params![rates_json, table.last_updated().to_rfc3339()],
        )?;
        tracing::info!(
            currencies = table.len(),
            last_updated = %table.last_updated(),
            "saved conversion rates"
        );
        Ok(())
    }
}

/// In-process store, handy offline and in tests.
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    slot: RefCell<Option<RateTable>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: RateTable) -> Self {
        Self {
            slot: RefCell::new(Some(table)),
        }
    }
}

impl RateStore for MemoryRateStore {
    fn load(&self) -> FinanceResult<RateTable> {
        self.slot
            .borrow()
            .clone()
            .ok_or_else(|| FinanceError::NotFound("Stored conversion rates".into()))
    }

    fn save(&self, table: &RateTable) -> FinanceResult<()> {
        *self.slot.borrow_mut() = Some(table.clone());
        Ok(())
    }
}
