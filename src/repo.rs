// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Record access for the `debts`, `debt_transactions`, `investments`,
//! `expenses` and `categories` collections. Stored decimals are parsed here,
//! so anything handed to the calculation modules is already well formed.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::debt;
use crate::errors::{FinanceError, FinanceResult};
use crate::models::{
    Category, DebtRecord, DebtTransaction, DebtTxKind, Expense, Investment, PaymentMethod, Sale,
};
use crate::utils::parse_stored_decimal;

fn dec(s: &str, field: &str) -> FinanceResult<Decimal> {
    parse_stored_decimal(s, field)
}

fn opt_dec(s: Option<String>, field: &str) -> FinanceResult<Option<Decimal>> {
    s.map(|v| dec(&v, field)).transpose()
}

// ---------------------------------------------------------------------------
// Categories

pub fn insert_category(conn: &Connection, name: &str) -> FinanceResult<i64> {
    conn.execute("INSERT INTO categories(name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn list_categories(conn: &Connection) -> FinanceResult<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Expenses

const EXPENSE_COLUMNS: &str = "id, amount, from_currency, converted_amount, to_currency, category_id, \
     payment_method, date, description, receipt_image, product_image, is_public";

struct ExpenseRow {
    id: i64,
    amount: String,
    from_currency: String,
    converted_amount: String,
    to_currency: String,
    category_id: i64,
    payment_method: String,
    date: NaiveDateTime,
    description: String,
    receipt_image: Option<String>,
    product_image: Option<String>,
    is_public: bool,
}

impl ExpenseRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            amount: r.get(1)?,
            from_currency: r.get(2)?,
            converted_amount: r.get(3)?,
            to_currency: r.get(4)?,
            category_id: r.get(5)?,
            payment_method: r.get(6)?,
            date: r.get(7)?,
            description: r.get(8)?,
            receipt_image: r.get(9)?,
            product_image: r.get(10)?,
            is_public: r.get(11)?,
        })
    }

    fn into_expense(self) -> FinanceResult<Expense> {
        let payment_method: PaymentMethod = serde_json::from_str(&self.payment_method)
            .map_err(|e| {
                FinanceError::MalformedRecord(format!(
                    "expense {} payment method '{}': {}",
                    self.id, self.payment_method, e
                ))
            })?;
        Ok(Expense {
            id: self.id,
            amount: dec(&self.amount, "amount")?,
            from_currency: self.from_currency,
            converted_amount: dec(&self.converted_amount, "convertedAmount")?,
            to_currency: self.to_currency,
            category_id: self.category_id,
            payment_method,
            date: self.date,
            description: self.description,
            receipt_image: self.receipt_image,
            product_image: self.product_image,
            is_public: self.is_public,
        })
    }
}

/// Inserts `e` ignoring its `id`; returns the new id.
pub fn insert_expense(conn: &Connection, e: &Expense) -> FinanceResult<i64> {
    let pm = serde_json::to_string(&e.payment_method)
        .map_err(|err| FinanceError::MalformedRecord(err.to_string()))?;
    conn.execute(
        "INSERT INTO expenses(amount, from_currency, converted_amount, to_currency, category_id,
                              payment_method, date, description, receipt_image, product_image, is_public)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            e.amount.to_string(),
            e.from_currency,
            e.converted_amount.to_string(),
            e.to_currency,
            e.category_id,
            pm,
            e.date,
            e.description,
            e.receipt_image,
            e.product_image,
            e.is_public,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_expenses(conn: &Connection) -> FinanceResult<Vec<Expense>> {
    let sql = format!("SELECT {} FROM expenses ORDER BY date, id", EXPENSE_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], ExpenseRow::read)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_expense()?);
    }
    Ok(out)
}

pub fn delete_expense(conn: &Connection, id: i64) -> FinanceResult<()> {
    let n = conn.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(FinanceError::NotFound(format!("Expense {}", id)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Debts

const DEBT_COLUMNS: &str = "id, name, original_principal, principal_amount, currency, \
     repayment_amount, interest_rate, repayment_day, start_date";

struct DebtRow {
    id: i64,
    name: String,
    original_principal: String,
    principal_amount: String,
    currency: String,
    repayment_amount: String,
    interest_rate: String,
    repayment_day: u32,
    start_date: NaiveDate,
}

impl DebtRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            name: r.get(1)?,
            original_principal: r.get(2)?,
            principal_amount: r.get(3)?,
            currency: r.get(4)?,
            repayment_amount: r.get(5)?,
            interest_rate: r.get(6)?,
            repayment_day: r.get(7)?,
            start_date: r.get(8)?,
        })
    }

    fn into_debt(self) -> FinanceResult<DebtRecord> {
        Ok(DebtRecord {
            id: self.id,
            name: self.name,
            original_principal: dec(&self.original_principal, "originalPrincipal")?,
            principal_amount: dec(&self.principal_amount, "principalAmount")?,
            currency: self.currency,
            repayment_amount: dec(&self.repayment_amount, "repaymentAmount")?,
            interest_rate_percent_yearly: dec(&self.interest_rate, "interestRate")?,
            repayment_day_of_month: self.repayment_day,
            start_date: self.start_date,
        })
    }
}

pub fn insert_debt(conn: &Connection, d: &DebtRecord) -> FinanceResult<i64> {
    conn.execute(
        "INSERT INTO debts(name, original_principal, principal_amount, currency,
                           repayment_amount, interest_rate, repayment_day, start_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            d.name,
            d.original_principal.to_string(),
            d.principal_amount.to_string(),
            d.currency,
            d.repayment_amount.to_string(),
            d.interest_rate_percent_yearly.to_string(),
            d.repayment_day_of_month,
            d.start_date,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_debt(conn: &Connection, id: i64) -> FinanceResult<DebtRecord> {
    let sql = format!("SELECT {} FROM debts WHERE id=?1", DEBT_COLUMNS);
    conn.query_row(&sql, params![id], DebtRow::read)
        .optional()?
        .ok_or_else(|| FinanceError::NotFound(format!("Debt {}", id)))?
        .into_debt()
}

pub fn list_debts(conn: &Connection) -> FinanceResult<Vec<DebtRecord>> {
    let sql = format!("SELECT {} FROM debts ORDER BY id", DEBT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], DebtRow::read)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_debt()?);
    }
    Ok(out)
}

/// Deletes a debt together with its ledger in one transaction.
pub fn delete_debt(conn: &Connection, id: i64) -> FinanceResult<usize> {
    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute(
        "DELETE FROM debt_transactions WHERE debt_id=?1",
        params![id],
    )?;
    let n = tx.execute("DELETE FROM debts WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(FinanceError::NotFound(format!("Debt {}", id)));
    }
    tx.commit()?;
    tracing::info!(debt = id, transactions = removed, "deleted debt and its ledger");
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Debt transactions

fn read_debt_tx(r: &Row<'_>) -> rusqlite::Result<(i64, i64, String, String, NaiveDateTime)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn into_debt_tx(
    (id, debt_id, kind, amount, date): (i64, i64, String, String, NaiveDateTime),
) -> FinanceResult<DebtTransaction> {
    let kind: DebtTxKind = kind
        .parse()
        .map_err(|_| FinanceError::MalformedRecord(format!("debt transaction {} type '{}'", id, kind)))?;
    DebtTransaction::new(id, debt_id, kind, dec(&amount, "amount")?, date)
}

pub fn insert_debt_tx(
    conn: &Connection,
    debt_id: i64,
    kind: DebtTxKind,
    amount: Decimal,
    date: NaiveDateTime,
) -> FinanceResult<i64> {
    // Validates the non-negative invariant before anything is written
    DebtTransaction::new(0, debt_id, kind, amount, date)?;
    conn.execute(
        "INSERT INTO debt_transactions(debt_id, type, amount, date) VALUES (?1, ?2, ?3, ?4)",
        params![debt_id, kind.as_str(), amount.to_string(), date],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Ledger of one debt in document (insertion) order; callers sort by date.
pub fn debt_transactions(conn: &Connection, debt_id: i64) -> FinanceResult<Vec<DebtTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, debt_id, type, amount, date FROM debt_transactions WHERE debt_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![debt_id], read_debt_tx)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(into_debt_tx(row?)?);
    }
    Ok(out)
}

pub fn get_debt_tx(conn: &Connection, id: i64) -> FinanceResult<DebtTransaction> {
    let raw = conn
        .query_row(
            "SELECT id, debt_id, type, amount, date FROM debt_transactions WHERE id=?1",
            params![id],
            read_debt_tx,
        )
        .optional()?
        .ok_or_else(|| FinanceError::NotFound(format!("Debt transaction {}", id)))?;
    into_debt_tx(raw)
}

pub fn update_debt_tx(conn: &Connection, tx: &DebtTransaction) -> FinanceResult<()> {
    DebtTransaction::new(tx.id, tx.debt_id, tx.kind, tx.amount, tx.date)?;
    let n = conn.execute(
        "UPDATE debt_transactions SET type=?1, amount=?2, date=?3 WHERE id=?4",
        params![tx.kind.as_str(), tx.amount.to_string(), tx.date, tx.id],
    )?;
    if n == 0 {
        return Err(FinanceError::NotFound(format!("Debt transaction {}", tx.id)));
    }
    Ok(())
}

pub fn delete_debt_tx(conn: &Connection, id: i64) -> FinanceResult<i64> {
    let tx = get_debt_tx(conn, id)?;
    conn.execute("DELETE FROM debt_transactions WHERE id=?1", params![id])?;
    Ok(tx.debt_id)
}

/// Replays the whole ledger of `debt_id` and persists the new balance.
/// Must run after every insert, edit or delete of a debt transaction.
pub fn replay_debt(conn: &Connection, debt_id: i64) -> FinanceResult<Decimal> {
    let record = get_debt(conn, debt_id)?;
    let txs = debt_transactions(conn, debt_id)?;
    let balance = debt::recompute(record.original_principal, &txs)?;
    conn.execute(
        "UPDATE debts SET principal_amount=?1 WHERE id=?2",
        params![balance.to_string(), debt_id],
    )?;
    Ok(balance)
}

// The ledger mutations below pair the row change with the replay in one
// SQLite transaction. A failed replay rolls the row change back.

/// Adds one ledger entry and replays. Returns the new id and balance.
pub fn record_debt_tx(
    conn: &Connection,
    debt_id: i64,
    kind: DebtTxKind,
    amount: Decimal,
    date: NaiveDateTime,
) -> FinanceResult<(i64, Decimal)> {
    let tx = conn.unchecked_transaction()?;
    let id = insert_debt_tx(&tx, debt_id, kind, amount, date)?;
    let balance = replay_debt(&tx, debt_id)?;
    tx.commit()?;
    Ok((id, balance))
}

/// Accrues one interest entry on the replayed balance. Returns the new id,
/// the interest amount and the balance after it.
pub fn accrue_debt_interest(
    conn: &Connection,
    debt_id: i64,
    date: NaiveDateTime,
) -> FinanceResult<(i64, Decimal, Decimal)> {
    let tx = conn.unchecked_transaction()?;
    let before = replay_debt(&tx, debt_id)?;
    let record = get_debt(&tx, debt_id)?;
    let amount =
        debt::accrue_interest(before, record.interest_rate_percent_yearly, &record.currency)?;
    let id = insert_debt_tx(&tx, debt_id, DebtTxKind::Interest, amount, date)?;
    let balance = replay_debt(&tx, debt_id)?;
    tx.commit()?;
    Ok((id, amount, balance))
}

/// Rewrites one ledger entry and replays its debt.
pub fn edit_debt_tx(conn: &Connection, entry: &DebtTransaction) -> FinanceResult<Decimal> {
    let tx = conn.unchecked_transaction()?;
    update_debt_tx(&tx, entry)?;
    let balance = replay_debt(&tx, entry.debt_id)?;
    tx.commit()?;
    Ok(balance)
}

/// Deletes one ledger entry and replays. Returns the debt id and balance.
pub fn remove_debt_tx(conn: &Connection, id: i64) -> FinanceResult<(i64, Decimal)> {
    let tx = conn.unchecked_transaction()?;
    let debt_id = delete_debt_tx(&tx, id)?;
    let balance = replay_debt(&tx, debt_id)?;
    tx.commit()?;
    tracing::info!(debt = debt_id, transaction = id, %balance, "removed debt transaction");
    Ok((debt_id, balance))
}

// ---------------------------------------------------------------------------
// Investments

const INVESTMENT_COLUMNS: &str = "id, title, type, platform, purchase_date, quantity, unit, \
     total_amount, currency, style, sold_amount, sold_date, profit";

struct InvestmentRow {
    id: i64,
    title: String,
    r#type: String,
    platform: String,
    purchase_date: NaiveDate,
    quantity: String,
    unit: String,
    total_amount: String,
    currency: String,
    style: String,
    sold_amount: Option<String>,
    sold_date: Option<NaiveDateTime>,
    profit: Option<String>,
}

impl InvestmentRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            title: r.get(1)?,
            r#type: r.get(2)?,
            platform: r.get(3)?,
            purchase_date: r.get(4)?,
            quantity: r.get(5)?,
            unit: r.get(6)?,
            total_amount: r.get(7)?,
            currency: r.get(8)?,
            style: r.get(9)?,
            sold_amount: r.get(10)?,
            sold_date: r.get(11)?,
            profit: r.get(12)?,
        })
    }

    fn into_investment(self) -> FinanceResult<Investment> {
        let sold_amount = opt_dec(self.sold_amount, "soldAmount")?;
        let profit = opt_dec(self.profit, "profit")?;
        let sale = match (sold_amount, self.sold_date, profit) {
            (Some(sold_amount), Some(sold_date), Some(profit)) => Some(Sale {
                sold_amount,
                sold_date,
                profit,
            }),
            (None, None, None) => None,
            _ => {
                return Err(FinanceError::MalformedRecord(format!(
                    "investment {} has a partial sale",
                    self.id
                )));
            }
        };
        Ok(Investment {
            id: self.id,
            title: self.title,
            r#type: self.r#type,
            platform: self.platform,
            purchase_date: self.purchase_date,
            quantity: dec(&self.quantity, "quantity")?,
            unit: self.unit,
            total_amount: dec(&self.total_amount, "totalAmount")?,
            currency: self.currency,
            style: self.style,
            sale,
        })
    }
}

pub fn insert_investment(conn: &Connection, inv: &Investment) -> FinanceResult<i64> {
    conn.execute(
        "INSERT INTO investments(title, type, platform, purchase_date, quantity, unit,
                                 total_amount, currency, style, sold_amount, sold_date, profit)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            inv.title,
            inv.r#type,
            inv.platform,
            inv.purchase_date,
            inv.quantity.to_string(),
            inv.unit,
            inv.total_amount.to_string(),
            inv.currency,
            inv.style,
            inv.sale.as_ref().map(|s| s.sold_amount.to_string()),
            inv.sale.as_ref().map(|s| s.sold_date),
            inv.sale.as_ref().map(|s| s.profit.to_string()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_investment(conn: &Connection, id: i64) -> FinanceResult<Investment> {
    let sql = format!("SELECT {} FROM investments WHERE id=?1", INVESTMENT_COLUMNS);
    conn.query_row(&sql, params![id], InvestmentRow::read)
        .optional()?
        .ok_or_else(|| FinanceError::NotFound(format!("Investment {}", id)))?
        .into_investment()
}

pub fn list_investments(conn: &Connection) -> FinanceResult<Vec<Investment>> {
    let sql = format!(
        "SELECT {} FROM investments ORDER BY purchase_date, id",
        INVESTMENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], InvestmentRow::read)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_investment()?);
    }
    Ok(out)
}

/// Writes every field of `inv`, including its sale state.
pub fn update_investment(conn: &Connection, inv: &Investment) -> FinanceResult<()> {
    let n = conn.execute(
        "UPDATE investments SET title=?1, type=?2, platform=?3, purchase_date=?4, quantity=?5,
                unit=?6, total_amount=?7, currency=?8, style=?9,
                sold_amount=?10, sold_date=?11, profit=?12
         WHERE id=?13",
        params![
            inv.title,
            inv.r#type,
            inv.platform,
            inv.purchase_date,
            inv.quantity.to_string(),
            inv.unit,
            inv.total_amount.to_string(),
            inv.currency,
            inv.style,
            inv.sale.as_ref().map(|s| s.sold_amount.to_string()),
            inv.sale.as_ref().map(|s| s.sold_date),
            inv.sale.as_ref().map(|s| s.profit.to_string()),
            inv.id,
        ],
    )?;
    if n == 0 {
        return Err(FinanceError::NotFound(format!("Investment {}", inv.id)));
    }
    Ok(())
}
