// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{arg_str, get_currency, get_setting, set_setting};
use anyhow::{bail, Result};
use rusqlite::Connection;

const KNOWN_KEYS: &[&str] = &["currency"];

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = arg_str(sub, "key")?;
            let value = match key {
                "currency" => Some(get_currency(conn)?),
                other => get_setting(conn, other)?,
            };
            match value {
                Some(v) => println!("{} = {}", key, v),
                None => println!("{} is not set", key),
            }
        }
        Some(("set", sub)) => {
            let key = arg_str(sub, "key")?;
            let value = arg_str(sub, "value")?.trim();
            if !KNOWN_KEYS.contains(&key) {
                bail!("Unknown setting '{}' (known: {})", key, KNOWN_KEYS.join(", "));
            }
            let value = if key == "currency" {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    bail!("Currency must be a three-letter code, got '{}'", value);
                }
                value.to_uppercase()
            } else {
                value.to_string()
            };
            set_setting(conn, key, &value)?;
            tracing::info!(key, value = %value, "setting updated");
            println!("{} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
