// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{EntryKind, NewEntryType, Recurrence};
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
            let recurrence = sub
                .get_one::<String>("recurrence")
                .map(|r| r.parse::<Recurrence>())
                .transpose()?;
            if recurrence.is_some() && kind == EntryKind::Income {
                bail!("Only expense types carry a recurrence");
            }
            store.insert_entry_type(&NewEntryType {
                name: name.to_string(),
                kind,
                color: color.to_string(),
                description: sub.get_one::<String>("description").cloned(),
                recurrence,
            })?;
            println!("Added {} type '{}'", kind, name);
        }
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("kind")
                .map(|k| k.parse::<EntryKind>())
                .transpose()?;
            let types = store.entry_types(kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &types)? {
                let rows = types
                    .iter()
                    .map(|t| {
                        vec![
                            t.name.clone(),
                            t.kind.to_string(),
                            t.recurrence.map(|r| r.to_string()).unwrap_or_default(),
                            t.color.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Type", "Kind", "Recurrence", "Color"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
