// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{EntryKind, NewCategory};
use crate::store::{LedgerStore, SqliteStore};
use crate::utils::{arg_str, is_hex_color, maybe_print_json, pretty_table};
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let mut store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = arg_str(sub, "name")?.trim();
            let kind: EntryKind = arg_str(sub, "kind")?.parse()?;
            let color = arg_str(sub, "color")?;
            if !is_hex_color(color) {
                bail!("Color '{}' is not of the form #rrggbb", color);
            }
            store.insert_category(&NewCategory {
                name: name.to_string(),
                kind,
                color: color.to_string(),
                description: sub.get_one::<String>("description").cloned(),
            })?;
            println!("Added {} category '{}'", kind, name);
        }
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("kind")
                .map(|k| k.parse::<EntryKind>())
                .transpose()?;
            let categories = store.categories(kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &categories)? {
                let rows = categories
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.kind.to_string(),
                            c.color.clone(),
                            c.description.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Kind", "Color", "Description"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
