// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::RateTable;

/// Percentage move of each rate from `stored` to `fresh`, rounded to two
/// places. Only currencies quoted in both tables are reported; the implicit
/// base currency never moves and is left out.
pub fn compare(stored: &RateTable, fresh: &RateTable) -> BTreeMap<String, Decimal> {
    let hundred = Decimal::ONE_HUNDRED;
    stored
        .rates()
        .iter()
        .filter_map(|(code, old)| {
            let new = fresh.rates().get(code)?;
            let raw = new
                .checked_sub(*old)
                .and_then(|diff| diff.checked_div(*old))
                .and_then(|ratio| ratio.checked_mul(hundred));
            let Some(raw) = raw else {
                tracing::warn!(currency = %code, "rate change out of range; skipped");
                return None;
            };
            let mut delta = raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            delta.rescale(2);
            Some((code.clone(), delta))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn table(pairs: &[(&str, &str)]) -> RateTable {
        RateTable::new(
            pairs
                .iter()
                .map(|(c, r)| (c.to_string(), Decimal::from_str(r).unwrap())),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn increase_is_positive_percentage() {
        let stored = table(&[("USD", "1"), ("MYR", "4.0")]);
        let fresh = table(&[("USD", "1"), ("MYR", "4.4")]);
        let deltas = compare(&stored, &fresh);
        assert_eq!(deltas["MYR"], Decimal::from_str("10.00").unwrap());
        assert_eq!(deltas["MYR"].to_string(), "10.00");
        assert!(!deltas.contains_key("USD"));
    }

    #[test]
    fn decreases_round_and_one_sided_codes_are_skipped() {
        let stored = table(&[("EUR", "0.9"), ("GBP", "0.8"), ("JPY", "150")]);
        let fresh = table(&[("EUR", "0.87"), ("JPY", "151"), ("CHF", "0.88")]);
        let deltas = compare(&stored, &fresh);
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas["EUR"], Decimal::from_str("-3.33").unwrap());
        // 1/150 = 0.666..% -> 0.67
        assert_eq!(deltas["JPY"], Decimal::from_str("0.67").unwrap());
    }

    #[test]
    fn out_of_range_moves_are_skipped() {
        let stored = table(&[("MYR", "0.0000000000000000000000000001"), ("EUR", "0.9")]);
        let fresh = RateTable::new(
            [("MYR".to_string(), Decimal::MAX), ("EUR".to_string(), Decimal::from_str("0.9").unwrap())],
            Utc::now(),
        )
        .unwrap();
        let deltas = compare(&stored, &fresh);
        assert!(!deltas.contains_key("MYR"));
        assert_eq!(deltas["EUR"].to_string(), "0.00");
    }
}
