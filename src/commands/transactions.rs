// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::installments::InstallmentEngine;
use crate::ledger;
use crate::models::{EntryKind, ExpenseDraft, Status, Transaction};
use crate::store::{EntryFilter, LedgerStore, SqliteStore};
use crate::utils::{
    arg_str, id_for_account, id_for_category, id_for_member, id_for_type, maybe_print_json,
    parse_date, parse_decimal, pretty_table, resolve_period, switch_arg, today,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("status", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing expense id")?;
            let status: Status = arg_str(sub, "status")?.parse()?;
            let updated = ledger::set_status(&mut SqliteStore::new(conn), id, status)?;
            println!("Expense #{} is now {}", updated.id, updated.status);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing expense id")?;
            ledger::remove_transaction(&mut SqliteStore::new(conn), id)?;
            println!("Removed expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Builds the expense payload from `expense add` arguments.
pub fn draft_from_args(conn: &Connection, sub: &clap::ArgMatches) -> Result<ExpenseDraft> {
    Ok(ExpenseDraft {
        description: arg_str(sub, "description")?.to_string(),
        amount: parse_decimal(arg_str(sub, "amount")?)?,
        date: match sub.get_one::<String>("date") {
            Some(d) => parse_date(d)?,
            None => today(),
        },
        account_id: sub
            .get_one::<String>("account")
            .map(|a| id_for_account(conn, a))
            .transpose()?,
        member_id: id_for_member(conn, arg_str(sub, "member")?)?,
        category_id: id_for_category(conn, arg_str(sub, "category")?, EntryKind::Expense)?,
        type_id: id_for_type(conn, arg_str(sub, "type")?, EntryKind::Expense)?,
        status: arg_str(sub, "status")?.parse()?,
        aggregate_to_family: switch_arg(sub, "family"),
        installments: sub.get_one::<u32>("installments").copied(),
    })
}

/// Records the expense and returns the created rows.
pub fn add_expense(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let draft = draft_from_args(conn, sub)?;
    let mut store = SqliteStore::new(conn);
    let created = InstallmentEngine::new(&mut store)
        .record_expense(&draft)
        .with_context(|| format!("Could not record '{}'", draft.description.trim()))?;
    Ok(created)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let created = add_expense(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), false, &created)? {
        return Ok(());
    }
    match created.as_slice() {
        [single] => println!(
            "Recorded expense #{} '{}' {:.2} on {}",
            single.id, single.description, single.amount, single.date
        ),
        rows => {
            let data = rows
                .iter()
                .map(|t| {
                    vec![
                        t.id.to_string(),
                        format!(
                            "{}/{}",
                            t.installment_number.unwrap_or_default(),
                            t.total_installments.unwrap_or_default()
                        ),
                        t.date.to_string(),
                        format!("{:.2}", t.amount),
                        t.status.to_string(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Id", "Installment", "Date", "Amount", "Status"], data)
            );
        }
    }
    Ok(())
}

/// Filter from the shared list flags. Without `--all` the listing is
/// limited to the selected period.
pub fn filter_from_args(
    conn: &Connection,
    sub: &clap::ArgMatches,
    kind: EntryKind,
) -> Result<EntryFilter> {
    let mut filter = EntryFilter::all();
    if let Some(a) = sub.get_one::<String>("account") {
        filter = filter.account(id_for_account(conn, a)?);
    }
    if let Some(m) = sub.get_one::<String>("member") {
        filter = filter.member(id_for_member(conn, m)?);
    }
    if let Some(c) = sub.get_one::<String>("category") {
        filter = filter.category(id_for_category(conn, c, kind)?);
    }
    if let Some(t) = sub.get_one::<String>("type") {
        filter = filter.entry_type(id_for_type(conn, t, kind)?);
    }
    if kind == EntryKind::Expense {
        if let Some(s) = sub.get_one::<String>("status") {
            filter = filter.status(s.parse()?);
        }
    }
    if !sub.get_flag("all") {
        filter = filter.within(resolve_period(sub, today())?);
    }
    Ok(filter)
}

/// Expense rows selected by the list filters, oldest first.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let filter = filter_from_args(conn, sub, EntryKind::Expense)?;
    Ok(SqliteStore::new(conn).transactions(&filter)?)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let names = Names::load(conn)?;
        let rows = data
            .iter()
            .map(|t| {
                let installment = match (t.installment_number, t.total_installments) {
                    (Some(n), Some(total)) => format!("{}/{}", n, total),
                    _ => String::new(),
                };
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.description.clone(),
                    format!("{:.2}", t.amount),
                    installment,
                    t.status.to_string(),
                    names.account(t.account_id),
                    names.member(Some(t.member_id)),
                    names.category(Some(t.category_id)),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Id", "Date", "Description", "Amount", "Inst.", "Status", "Account", "Member",
                    "Category",
                ],
                rows,
            )
        );
    }
    Ok(())
}

/// Id to name lookups for table output.
pub struct Names {
    accounts: HashMap<i64, String>,
    members: HashMap<i64, String>,
    categories: HashMap<i64, String>,
}

impl Names {
    pub fn load(conn: &Connection) -> Result<Self> {
        let store = SqliteStore::new(conn);
        Ok(Names {
            accounts: store.accounts()?.into_iter().map(|a| (a.id, a.name)).collect(),
            members: store.members()?.into_iter().map(|m| (m.id, m.name)).collect(),
            categories: store
                .categories(None)?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect(),
        })
    }

    fn lookup(map: &HashMap<i64, String>, id: Option<i64>) -> String {
        id.and_then(|id| map.get(&id).cloned()).unwrap_or_default()
    }

    pub fn account(&self, id: Option<i64>) -> String {
        Self::lookup(&self.accounts, id)
    }

    pub fn member(&self, id: Option<i64>) -> String {
        Self::lookup(&self.members, id)
    }

    pub fn category(&self, id: Option<i64>) -> String {
        Self::lookup(&self.categories, id)
    }
}
