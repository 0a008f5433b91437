// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::DateTime;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::{FinanceError, FinanceResult};
use crate::models::RateTable;
use crate::utils::http_client;

/// Source of fresh rate tables. Failures are returned as-is; retrying is the
/// caller's business.
pub trait RateProvider {
    fn fetch_latest(&self, base: &str) -> FinanceResult<RateTable>;
}

impl<T: RateProvider + ?Sized> RateProvider for &T {
    fn fetch_latest(&self, base: &str) -> FinanceResult<RateTable> {
        (**self).fetch_latest(base)
    }
}

/// Open Exchange Rates style `latest.json` endpoint keyed by an app id.
pub struct HttpRateProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    app_id: String,
}

impl HttpRateProvider {
    pub fn new(endpoint: &str, app_id: &str) -> FinanceResult<Self> {
        let client = http_client().map_err(|e| FinanceError::NetworkFailure(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
        })
    }
}

impl RateProvider for HttpRateProvider {
    fn fetch_latest(&self, base: &str) -> FinanceResult<RateTable> {
        if self.app_id.is_empty() {
            return Err(FinanceError::NetworkFailure(
                "no rate API token configured (fx set-key or FINTRACK_RATES_APP_ID)".into(),
            ));
        }
        let url = format!("{}/latest.json", self.endpoint);
        tracing::info!(%url, base, "fetching latest rates");
        let resp = self
            .client
            .get(&url)
            .query(&[("app_id", self.app_id.as_str()), ("base", base)])
            .send()
            .map_err(|e| FinanceError::NetworkFailure(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("rate provider quota exceeded");
            return Err(FinanceError::ApiQuotaExceeded);
        }
        if !status.is_success() {
            return Err(FinanceError::NetworkFailure(format!(
                "HTTP {} from {}",
                status, url
            )));
        }
        let body = resp
            .text()
            .map_err(|e| FinanceError::NetworkFailure(e.to_string()))?;
        parse_latest(&body, base)
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    timestamp: i64,
    base: String,
    rates: HashMap<String, serde_json::Number>,
}

/// Parses a `latest.json` body. `last_updated` is the provider's timestamp,
/// not the time of the call.
pub fn parse_latest(body: &str, expected_base: &str) -> FinanceResult<RateTable> {
    let resp: LatestResponse =
        serde_json::from_str(body).map_err(|e| FinanceError::RateParse(e.to_string()))?;
    if !resp.base.eq_ignore_ascii_case(expected_base) {
        return Err(FinanceError::RateParse(format!(
            "expected base {}, got {}",
            expected_base, resp.base
        )));
    }
    let last_updated = DateTime::from_timestamp(resp.timestamp, 0)
        .ok_or_else(|| FinanceError::RateParse(format!("bad timestamp {}", resp.timestamp)))?;

    let mut rates = Vec::with_capacity(resp.rates.len());
    for (code, rate) in resp.rates {
        // Shortest round-trip text of the JSON number, so 4.4725 stays 4.4725
        let text = rate.to_string();
        let parsed = if text.contains(['e', 'E']) {
            Decimal::from_scientific(&text)
        } else {
            Decimal::from_str(&text)
        };
        let d = parsed.map_err(|e| FinanceError::RateParse(format!("{}={}: {}", code, text, e)))?;
        rates.push((code, d));
    }
    RateTable::new(rates, last_updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    const GOOD_BODY: &str =
        r#"{"timestamp": 1735689600, "base": "USD", "rates": {"MYR": 4.4725}}"#;

    /// Answers one connection per canned `(status line, body)` pair and
    /// returns the request lines it saw.
    fn serve(replies: Vec<(&'static str, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                seen.push(request_line.trim_end().to_string());
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                        break;
                    }
                }
                write!(
                    stream,
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                )
                .unwrap();
                stream.flush().unwrap();
            }
            seen
        });
        (endpoint, handle)
    }

    #[test]
    fn http_statuses_map_to_error_kinds() {
        let (endpoint, server) = serve(vec![
            ("429 Too Many Requests", r#"{"error": true}"#),
            ("500 Internal Server Error", "oops"),
            ("200 OK", GOOD_BODY),
        ]);
        let provider = HttpRateProvider::new(&endpoint, "k").unwrap();

        assert!(matches!(
            provider.fetch_latest("USD"),
            Err(FinanceError::ApiQuotaExceeded)
        ));
        match provider.fetch_latest("USD") {
            Err(FinanceError::NetworkFailure(msg)) => assert!(msg.contains("500"), "{}", msg),
            other => panic!("expected NetworkFailure, got {:?}", other),
        }
        let table = provider.fetch_latest("USD").unwrap();
        assert_eq!(table.rate("MYR"), Some(Decimal::from_str("4.4725").unwrap()));
        assert_eq!(table.last_updated().to_rfc3339(), "2025-01-01T00:00:00+00:00");

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 3);
        for line in &requests {
            assert!(line.starts_with("GET /latest.json?"), "{}", line);
            assert!(line.contains("app_id=k"), "{}", line);
            assert!(line.contains("base=USD"), "{}", line);
        }
    }

    #[test]
    fn missing_token_fails_without_a_request() {
        // Nothing listens here; an attempted request would fail differently
        let provider = HttpRateProvider::new("http://127.0.0.1:9", "").unwrap();
        match provider.fetch_latest("USD") {
            Err(FinanceError::NetworkFailure(msg)) => assert!(msg.contains("token"), "{}", msg),
            other => panic!("expected NetworkFailure, got {:?}", other),
        }
    }

    #[test]
    fn unreachable_endpoint_is_a_network_failure() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        // Listener dropped; the port refuses connections
        let provider = HttpRateProvider::new(&format!("http://{}/", addr), "k").unwrap();
        assert!(matches!(
            provider.fetch_latest("USD"),
            Err(FinanceError::NetworkFailure(_))
        ));
    }

    #[test]
    fn parses_provider_timestamp_not_wall_clock() {
        let body = r#"{
            "disclaimer": "Usage subject to terms",
            "timestamp": 1735689600,
            "base": "USD",
            "rates": { "USD": 1, "MYR": 4.4725, "EUR": 0.9612, "JPY": 157.2 }
        }"#;
        let t = parse_latest(body, "USD").unwrap();
        assert_eq!(t.last_updated().to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert_eq!(t.len(), 3);
        assert_eq!(t.rate("MYR"), Some(Decimal::from_str("4.4725").unwrap()));
        assert_eq!(t.rate("JPY"), Some(Decimal::from_str("157.2").unwrap()));
    }

    #[test]
    fn tiny_rates_in_exponent_form_parse() {
        let body = r#"{"timestamp": 1735689600, "base": "USD", "rates": {"BTC": 1.05e-5}}"#;
        let t = parse_latest(body, "USD").unwrap();
        assert_eq!(t.rate("BTC"), Some(Decimal::from_str("0.0000105").unwrap()));
    }

    #[test]
    fn rejects_unexpected_base_and_garbage() {
        let body = r#"{"timestamp": 1735689600, "base": "EUR", "rates": {"USD": 1.04}}"#;
        assert!(matches!(
            parse_latest(body, "USD"),
            Err(FinanceError::RateParse(_))
        ));
        assert!(matches!(
            parse_latest("<html>oops</html>", "USD"),
            Err(FinanceError::RateParse(_))
        ));
    }

    #[test]
    fn zero_rate_from_provider_is_refused() {
        let body = r#"{"timestamp": 1735689600, "base": "USD", "rates": {"XYZ": 0}}"#;
        assert!(matches!(
            parse_latest(body, "USD"),
            Err(FinanceError::InvalidRate { .. })
        ));
    }
}
