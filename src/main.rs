// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use fintrack::config::AppConfig;
use fintrack::prefs::{self, Preferences};
use fintrack::{cli, commands, db, logging};

fn main() -> Result<()> {
    logging::init();
    let matches = cli::build_cli().get_matches();

    let cfg = AppConfig::from_env()?;
    let conn = db::open_or_init(&cfg.db_path)?;
    prefs::begin_session(Preferences::load(&conn)?);

    let res = match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", cfg.db_path.display());
            Ok(())
        }
        Some(("fx", sub)) => commands::fx::handle(&conn, &cfg, sub),
        Some(("category", sub)) => commands::categories::handle(&conn, sub),
        Some(("expense", sub)) => commands::expenses::handle(&conn, &cfg, sub),
        Some(("report", sub)) => commands::reports::handle(&conn, &cfg, sub),
        Some(("debt", sub)) => commands::debts::handle(&conn, sub),
        Some(("invest", sub)) => commands::investments::handle(&conn, &cfg, sub),
        Some(("export", sub)) => commands::exporter::handle(&conn, sub),
        _ => {
            cli::build_cli().print_help()?;
            println!();
            Ok(())
        }
    };
    prefs::end_session();
    res
}
