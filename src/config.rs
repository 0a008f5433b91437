// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;

use crate::utils::get_setting;

pub const DEFAULT_RATES_URL: &str = "https://openexchangerates.org/api";

/// Process-level configuration read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub rates_app_id: Option<String>,
    pub rates_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let db_path = match non_empty_var("FINTRACK_DB") {
            Some(p) => PathBuf::from(p),
            None => crate::db::default_db_path()?,
        };
        Ok(Self {
            db_path,
            rates_app_id: non_empty_var("FINTRACK_RATES_APP_ID"),
            rates_url: non_empty_var("FINTRACK_RATES_URL")
                .unwrap_or_else(|| DEFAULT_RATES_URL.to_string()),
        })
    }

    /// Environment token wins over the one saved with `fx set-key`.
    pub fn resolve_app_id(&self, conn: &Connection) -> Result<Option<String>> {
        if let Some(id) = &self.rates_app_id {
            return Ok(Some(id.clone()));
        }
        get_setting(conn, "rates_app_id")
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::utils::set_setting;

    #[test]
    fn stored_app_id_used_when_env_absent() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        let cfg = AppConfig {
            db_path: PathBuf::from(":memory:"),
            rates_app_id: None,
            rates_url: DEFAULT_RATES_URL.into(),
        };
        assert_eq!(cfg.resolve_app_id(&conn).unwrap(), None);
        set_setting(&conn, "rates_app_id", "stored").unwrap();
        assert_eq!(cfg.resolve_app_id(&conn).unwrap().as_deref(), Some("stored"));

        let cfg = AppConfig {
            rates_app_id: Some("env".into()),
            ..cfg
        };
        assert_eq!(cfg.resolve_app_id(&conn).unwrap().as_deref(), Some("env"));
    }
}
