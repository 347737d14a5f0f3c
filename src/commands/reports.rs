// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{self, Snapshot};
use crate::models::Period;
use crate::store::{EntryFilter, SqliteStore};
use crate::utils::{
    fmt_money, get_currency, maybe_print_json, parse_month, pretty_table, resolve_period, today,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("by-category", sub)) => by_category(conn, sub)?,
        Some(("by-member", sub)) => by_member(conn, sub)?,
        Some(("by-type", sub)) => by_type(conn, sub)?,
        Some(("family", sub)) => family(conn, sub)?,
        Some(("members", sub)) => members(conn, sub)?,
        Some(("committed", sub)) => committed(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Rows dated within the requested period.
fn period_snapshot(conn: &Connection, sub: &clap::ArgMatches) -> Result<(Period, Snapshot)> {
    let period = resolve_period(sub, today())?;
    let store = SqliteStore::new(conn);
    let snapshot = Snapshot::load(&store, &EntryFilter::all().within(period))?;
    Ok((period, snapshot))
}

fn print_json_or<T: serde::Serialize>(
    sub: &clap::ArgMatches,
    data: &T,
    table: impl FnOnce() -> comfy_table::Table,
) -> Result<()> {
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), data)? {
        println!("{}", table());
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (period, snap) = period_snapshot(conn, sub)?;
    let totals = aggregate::period_totals(&snap.movements, &snap.transactions, period);
    let ccy = get_currency(conn)?;
    print_json_or(sub, &totals, || {
        pretty_table(
            &["Period", "Income", "Expenses", "Balance", "Entries"],
            vec![vec![
                format!("{} .. {}", period.start, period.end),
                fmt_money(&totals.total_income, &ccy),
                fmt_money(&totals.total_expense, &ccy),
                fmt_money(&totals.balance, &ccy),
                format!(
                    "{} in / {} out",
                    totals.movements_count, totals.transactions_count
                ),
            ]],
        )
    })
}

fn by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (_, snap) = period_snapshot(conn, sub)?;
    let data = aggregate::by_category(&snap.transactions, &snap.categories);
    print_json_or(sub, &data, || {
        pretty_table(
            &["Category", "Spent"],
            data.iter()
                .map(|c| vec![c.name.clone(), format!("{:.2}", c.total)])
                .collect(),
        )
    })
}

fn by_member(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (_, snap) = period_snapshot(conn, sub)?;
    let data = aggregate::by_member(&snap.movements, &snap.members);
    print_json_or(sub, &data, || {
        pretty_table(
            &["Member", "Income"],
            data.iter()
                .map(|m| vec![m.name.clone(), format!("{:.2}", m.total)])
                .collect(),
        )
    })
}

fn by_type(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (_, snap) = period_snapshot(conn, sub)?;
    let data = aggregate::by_recurrence(&snap.transactions);
    print_json_or(sub, &data, || {
        pretty_table(
            &["Recurrence", "Entries", "Spent"],
            data.iter()
                .map(|r| {
                    vec![
                        r.recurrence.to_string(),
                        r.count.to_string(),
                        format!("{:.2}", r.total),
                    ]
                })
                .collect(),
        )
    })
}

fn family(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (_, snap) = period_snapshot(conn, sub)?;
    let totals = aggregate::family_totals(&snap.movements, &snap.transactions, &snap.members);
    let ccy = get_currency(conn)?;
    print_json_or(sub, &totals, || {
        pretty_table(
            &["Family income", "Family expenses", "Family balance"],
            vec![vec![
                fmt_money(&totals.income, &ccy),
                fmt_money(&totals.expenses, &ccy),
                fmt_money(&totals.balance, &ccy),
            ]],
        )
    })
}

fn members(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (_, snap) = period_snapshot(conn, sub)?;
    let data = aggregate::member_summaries(&snap.movements, &snap.transactions, &snap.members);
    print_json_or(sub, &data, || {
        pretty_table(
            &["Member", "Family", "Income", "Expenses", "Balance"],
            data.iter()
                .map(|m| {
                    vec![
                        m.name.clone(),
                        if m.aggregate_to_family { "yes" } else { "no" }.to_string(),
                        format!("{:.2}", m.income),
                        format!("{:.2}", m.expenses),
                        format!("{:.2}", m.balance),
                    ]
                })
                .collect(),
        )
    })
}

fn committed(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = match sub.get_one::<String>("from") {
        Some(month) => {
            let (y, m) = parse_month(month)?;
            crate::utils::month_start(y, m).context("Invalid month")?
        }
        None => today(),
    };
    let store = SqliteStore::new(conn);
    let snap = Snapshot::load(&store, &EntryFilter::all())?;
    let data = aggregate::committed_by_month(&snap.transactions, from);
    print_json_or(sub, &data, || {
        let mut rows: Vec<Vec<String>> = data
            .months
            .iter()
            .map(|m| vec![format!("{}-{:02}", m.year, m.month), format!("{:.2}", m.total)])
            .collect();
        rows.push(vec!["Total".into(), format!("{:.2}", data.total)]);
        pretty_table(&["Month", "Pending"], rows)
    })
}
