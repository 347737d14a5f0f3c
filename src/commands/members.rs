// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::NewMember;
use crate::store::{LedgerStore, SqliteStore};
use crate::utils::{arg_str, id_for_member, is_hex_color, maybe_print_json, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let mut store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = arg_str(sub, "name")?.trim();
            let color = arg_str(sub, "color")?;
            if !is_hex_color(color) {
                bail!("Color '{}' is not of the form #rrggbb", color);
            }
            let member = store.insert_member(&NewMember {
                name: name.to_string(),
                color: color.to_string(),
                aggregate_to_family: !sub.get_flag("no-family"),
            })?;
            println!(
                "Added member '{}' (family totals: {})",
                member.name,
                if member.aggregate_to_family { "on" } else { "off" }
            );
        }
        Some(("list", sub)) => {
            let members = store.members()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &members)? {
                let rows = members
                    .iter()
                    .map(|m| {
                        vec![
                            m.name.clone(),
                            m.color.clone(),
                            if m.aggregate_to_family { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Member", "Color", "Family"], rows));
            }
        }
        Some(("aggregate", sub)) => {
            let name = arg_str(sub, "name")?;
            let on = arg_str(sub, "state")? == "on";
            let id = id_for_member(conn, name)?;
            let member = store.set_member_aggregate(id, on)?;
            tracing::info!(member = member.id, on, "family aggregation changed");
            println!(
                "Member '{}' {} family totals",
                member.name,
                if on { "now counts toward" } else { "no longer counts toward" }
            );
        }
        _ => {}
    }
    Ok(())
}
