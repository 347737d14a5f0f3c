// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::{EntryKind, Movement, NewMovement};
use crate::store::{LedgerStore, SqliteStore};
use crate::utils::{
    arg_str, id_for_account, id_for_category, id_for_member, id_for_type, maybe_print_json,
    parse_date, parse_decimal, pretty_table, switch_arg, today,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing income id")?;
            ledger::remove_movement(&mut SqliteStore::new(conn), id)?;
            println!("Removed income {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let lookup = |id: &str, f: fn(&Connection, &str) -> Result<i64>| {
        sub.get_one::<String>(id).map(|name| f(conn, name)).transpose()
    };
    let new = NewMovement {
        description: arg_str(sub, "description")?.to_string(),
        amount: parse_decimal(arg_str(sub, "amount")?)?,
        date: match sub.get_one::<String>("date") {
            Some(d) => parse_date(d)?,
            None => today(),
        },
        account_id: lookup("account", id_for_account)?,
        member_id: lookup("member", id_for_member)?,
        category_id: sub
            .get_one::<String>("category")
            .map(|c| id_for_category(conn, c, EntryKind::Income))
            .transpose()?,
        type_id: sub
            .get_one::<String>("type")
            .map(|t| id_for_type(conn, t, EntryKind::Income))
            .transpose()?,
        aggregate_to_family: switch_arg(sub, "family"),
    };

    let movement = ledger::record_income(&mut SqliteStore::new(conn), &new)?;
    println!(
        "Recorded income #{} '{}' {:.2} on {}",
        movement.id, movement.description, movement.amount, movement.date
    );
    Ok(())
}

/// Income rows selected by the list filters, oldest first.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Movement>> {
    let filter = super::transactions::filter_from_args(conn, sub, EntryKind::Income)?;
    Ok(SqliteStore::new(conn).movements(&filter)?)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let names = super::transactions::Names::load(conn)?;
        let rows = data
            .iter()
            .map(|m| {
                vec![
                    m.id.to_string(),
                    m.date.to_string(),
                    m.description.clone(),
                    format!("{:.2}", m.amount),
                    names.account(m.account_id),
                    names.member(m.member_id),
                    names.category(m.category_id),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Description", "Amount", "Account", "Member", "Category"],
                rows,
            )
        );
    }
    Ok(())
}
