// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failures raised by rate resolution, conversion, and the data-loading boundary.
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("No exchange rate available for {currency}")]
    RateUnavailable { currency: String },
    #[error("Rate provider request failed: {0}")]
    NetworkFailure(String),
    #[error("Rate provider quota exceeded")]
    ApiQuotaExceeded,
    #[error("Could not parse rate provider response: {0}")]
    RateParse(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid amount '{input}': {reason}")]
    InvalidNumericInput { input: String, reason: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Amount out of range: {0}")]
    Overflow(String),
    #[error("Invalid rate {rate} for {currency}; rates must be positive")]
    InvalidRate { currency: String, rate: Decimal },
    #[error("Malformed stored record: {0}")]
    MalformedRecord(String),
    #[error("Investment {0} has already been sold")]
    AlreadySold(i64),
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl FinanceError {
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        FinanceError::InvalidNumericInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn overflow(what: impl Into<String>) -> Self {
        FinanceError::Overflow(what.into())
    }

    pub fn rate_unavailable(currency: impl Into<String>) -> Self {
        FinanceError::RateUnavailable {
            currency: currency.into(),
        }
    }
}

pub type FinanceResult<T> = Result<T, FinanceError>;
