// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, FinanceResult};

/// Every stored rate is quoted as "1 USD = rate units of currency".
pub const BASE_CURRENCY: &str = "USD";

/// Snapshot of exchange rates relative to [`BASE_CURRENCY`].
///
/// The base currency is implicit (rate 1) and never stored. A table is never
/// mutated after construction; refreshing rates means building a new table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    rates: BTreeMap<String, Decimal>,
    last_updated: DateTime<Utc>,
}

impl RateTable {
    pub fn new(
        rates: impl IntoIterator<Item = (String, Decimal)>,
        last_updated: DateTime<Utc>,
    ) -> FinanceResult<Self> {
        let mut out = BTreeMap::new();
        for (code, rate) in rates {
            let code = code.trim().to_uppercase();
            if code == BASE_CURRENCY {
                continue;
            }
            if rate <= Decimal::ZERO {
                return Err(FinanceError::InvalidRate {
                    currency: code,
                    rate,
                });
            }
            out.insert(code, rate);
        }
        Ok(Self {
            rates: out,
            last_updated,
        })
    }

    /// Rate for `code`, with the base currency always resolving to 1.
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        if code == BASE_CURRENCY {
            return Some(Decimal::ONE);
        }
        self.rates.get(code).copied()
    }

    pub fn rates(&self) -> &BTreeMap<String, Decimal> {
        &self.rates
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: i64,
    pub name: String,
    /// Seed for ledger replays; never changed by transactions.
    pub original_principal: Decimal,
    /// Current outstanding balance, rewritten after every replay.
    pub principal_amount: Decimal,
    pub currency: String,
    pub repayment_amount: Decimal,
    pub interest_rate_percent_yearly: Decimal,
    pub repayment_day_of_month: u32,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtTxKind {
    Payment,
    Repayment,
    Interest,
}

impl DebtTxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtTxKind::Payment => "payment",
            DebtTxKind::Repayment => "repayment",
            DebtTxKind::Interest => "interest",
        }
    }
}

impl fmt::Display for DebtTxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebtTxKind {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "payment" => Ok(DebtTxKind::Payment),
            "repayment" => Ok(DebtTxKind::Repayment),
            "interest" => Ok(DebtTxKind::Interest),
            other => Err(FinanceError::InvalidInput(format!(
                "debt transaction type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTransaction {
    pub id: i64,
    pub debt_id: i64,
    pub kind: DebtTxKind,
    pub amount: Decimal,
    pub date: NaiveDateTime,
}

impl DebtTransaction {
    /// Builds a ledger entry; the sign of the effect comes from `kind`, so
    /// `amount` itself must never be negative.
    pub fn new(
        id: i64,
        debt_id: i64,
        kind: DebtTxKind,
        amount: Decimal,
        date: NaiveDateTime,
    ) -> FinanceResult<Self> {
        if amount < Decimal::ZERO {
            return Err(FinanceError::invalid_input(
                amount.to_string(),
                "debt transaction amounts must be non-negative",
            ));
        }
        Ok(Self {
            id,
            debt_id,
            kind,
            amount,
            date,
        })
    }
}

/// Sold-state fields; present together or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub sold_amount: Decimal,
    /// Moment of the sale, to the second.
    pub sold_date: NaiveDateTime,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub title: String,
    pub r#type: String,
    pub platform: String,
    pub purchase_date: NaiveDate,
    pub quantity: Decimal,
    pub unit: String,
    /// Cost basis in `currency`.
    pub total_amount: Decimal,
    pub currency: String,
    pub style: String,
    pub sale: Option<Sale>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentMethod {
    Cash,
    CreditCard {
        bank: String,
        last4: String,
        name: String,
    },
    DebitCard {
        bank: String,
        last4: String,
    },
    EWallet {
        name: String,
        #[serde(rename = "linkedCard")]
        linked_card: Option<String>,
    },
}

impl PaymentMethod {
    /// Bucket key used by reports.
    pub fn label(&self) -> String {
        match self {
            PaymentMethod::Cash => "Cash".to_string(),
            PaymentMethod::CreditCard { bank, last4, name } => {
                format!("Credit Card {} {} ({})", bank, name, last4)
            }
            PaymentMethod::DebitCard { bank, last4 } => {
                format!("Debit Card {} ({})", bank, last4)
            }
            PaymentMethod::EWallet { name, linked_card } => match linked_card {
                Some(card) => format!("E-Wallet {} via {}", name, card),
                None => format!("E-Wallet {}", name),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub amount: Decimal,
    pub from_currency: String,
    /// Snapshot taken at write time; never recomputed on read.
    pub converted_amount: Decimal,
    pub to_currency: String,
    pub category_id: i64,
    pub payment_method: PaymentMethod,
    pub date: NaiveDateTime,
    pub description: String,
    pub receipt_image: Option<String>,
    pub product_image: Option<String>,
    pub is_public: bool,
}
