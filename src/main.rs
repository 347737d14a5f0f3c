// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::Path;

use hearth::{cli, commands, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    logging::init(matches.get_count("verbose"));

    let db_arg = matches.get_one::<String>("db").map(Path::new);
    let mut conn = db::open_or_init(db_arg)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            let added = db::seed_defaults(&mut conn)?;
            let location = match db_arg {
                Some(p) => p.to_path_buf(),
                None => db::db_path()?,
            };
            println!(
                "Database initialized at {} ({} default rows added)",
                location.display(),
                added
            );
        }
        Some(("account", sub)) => commands::accounts::handle(&conn, sub)?,
        Some(("member", sub)) => commands::members::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("type", sub)) => commands::types::handle(&conn, sub)?,
        Some(("income", sub)) => commands::income::handle(&conn, sub)?,
        Some(("expense", sub)) => commands::transactions::handle(&conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
