// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived figures computed from ledger rows.
//!
//! Nothing here is stored: every balance and total is recomputed from the
//! entries passed in. Functions take slices and never touch storage; use
//! [`Snapshot::load`] to fetch a consistent set of rows first.

use crate::error::LedgerResult;
use crate::models::{
    Account, Budget, Category, EntryKind, EntryType, LedgerEntry, Member, Movement, Period,
    Recurrence, Status, Transaction,
};
use crate::store::{EntryFilter, LedgerStore};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const UNASSIGNED: &str = "(unassigned)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub movements_count: usize,
    pub transactions_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub color: String,
    pub total: Decimal,
}

/// `member_id` is `None` for the unassigned bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberTotal {
    pub member_id: Option<i64>,
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecurrenceTotal {
    pub recurrence: Recurrence,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FamilyTotals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub member_id: i64,
    pub name: String,
    pub aggregate_to_family: bool,
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committed {
    pub months: Vec<MonthTotal>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLine {
    pub category_id: i64,
    pub category: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

fn sum<'a, E: LedgerEntry + 'a>(entries: impl IntoIterator<Item = &'a E>) -> Decimal {
    entries.into_iter().map(|e| e.amount()).sum()
}

fn booked_to<E: LedgerEntry>(entries: &[E], account_id: i64) -> Decimal {
    sum(entries.iter().filter(|e| e.account_id() == Some(account_id)))
}

fn dated_within<E: LedgerEntry>(entries: &[E], period: Period) -> Vec<&E> {
    entries.iter().filter(|e| period.contains(e.date())).collect()
}

/// `initial_balance + income - expenses` over entries booked to `account`.
/// Entries without an account never count toward any balance.
pub fn account_balance(
    account: &Account,
    movements: &[Movement],
    transactions: &[Transaction],
) -> Decimal {
    account.initial_balance + booked_to(movements, account.id) - booked_to(transactions, account.id)
}

/// Totals for entries dated within `period`, both bounds inclusive.
pub fn period_totals(
    movements: &[Movement],
    transactions: &[Transaction],
    period: Period,
) -> PeriodTotals {
    let movements = dated_within(movements, period);
    let transactions = dated_within(transactions, period);
    let total_income = sum(movements.iter().copied());
    let total_expense = sum(transactions.iter().copied());
    PeriodTotals {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        movements_count: movements.len(),
        transactions_count: transactions.len(),
    }
}

/// Expense totals per expense category, largest first. Categories with
/// nothing spent are left out.
pub fn by_category(transactions: &[Transaction], categories: &[Category]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for t in transactions {
        *totals.entry(t.category_id).or_insert(Decimal::ZERO) += t.amount;
    }

    let mut out: Vec<CategoryTotal> = categories
        .iter()
        .filter(|c| c.kind == EntryKind::Expense)
        .filter_map(|c| {
            let total = totals.get(&c.id).copied().unwrap_or(Decimal::ZERO);
            (total > Decimal::ZERO).then(|| CategoryTotal {
                category_id: c.id,
                name: c.name.clone(),
                color: c.color.clone(),
                total,
            })
        })
        .collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then(a.category_id.cmp(&b.category_id)));
    out
}

/// Income per member in the order given, followed by an unassigned row when
/// income without a member (or with an unknown one) adds up to something.
pub fn by_member(movements: &[Movement], members: &[Member]) -> Vec<MemberTotal> {
    let mut per_member: HashMap<i64, Decimal> = HashMap::new();
    let mut unassigned = Decimal::ZERO;
    for m in movements {
        match m.member_id {
            Some(id) if members.iter().any(|mb| mb.id == id) => {
                *per_member.entry(id).or_insert(Decimal::ZERO) += m.amount
            }
            _ => unassigned += m.amount,
        }
    }

    let mut out: Vec<MemberTotal> = members
        .iter()
        .map(|mb| MemberTotal {
            member_id: Some(mb.id),
            name: mb.name.clone(),
            total: per_member.get(&mb.id).copied().unwrap_or(Decimal::ZERO),
        })
        .collect();
    if unassigned > Decimal::ZERO {
        out.push(MemberTotal {
            member_id: None,
            name: UNASSIGNED.to_string(),
            total: unassigned,
        });
    }
    out
}

/// Expense totals per recurrence style. Rows whose type carries no
/// recurrence are skipped; empty groups are left out.
pub fn by_recurrence(transactions: &[Transaction]) -> Vec<RecurrenceTotal> {
    Recurrence::ALL
        .iter()
        .filter_map(|&recurrence| {
            let rows: Vec<&Transaction> = transactions
                .iter()
                .filter(|t| t.recurrence == Some(recurrence))
                .collect();
            let total = sum(rows.iter().copied());
            (total > Decimal::ZERO).then_some(RecurrenceTotal {
                recurrence,
                total,
                count: rows.len(),
            })
        })
        .collect()
}

/// Entry override first, then the member's default, then `true`.
pub fn counts_toward_family<E: LedgerEntry>(entry: &E, members: &[Member]) -> bool {
    entry.aggregate_to_family().unwrap_or_else(|| {
        entry
            .member_id()
            .and_then(|id| members.iter().find(|m| m.id == id))
            .map_or(true, |m| m.aggregate_to_family)
    })
}

pub fn family_total<E: LedgerEntry>(entries: &[E], members: &[Member]) -> Decimal {
    entries
        .iter()
        .filter(|e| counts_toward_family(*e, members))
        .map(|e| e.amount())
        .sum()
}

pub fn family_totals(
    movements: &[Movement],
    transactions: &[Transaction],
    members: &[Member],
) -> FamilyTotals {
    let income = family_total(movements, members);
    let expenses = family_total(transactions, members);
    FamilyTotals {
        income,
        expenses,
        balance: income - expenses,
    }
}

/// Income, expenses and balance for every member, ignoring family flags.
pub fn member_summaries(
    movements: &[Movement],
    transactions: &[Transaction],
    members: &[Member],
) -> Vec<MemberSummary> {
    members
        .iter()
        .map(|mb| {
            let income = sum(movements.iter().filter(|m| m.member_id == Some(mb.id)));
            let expenses = sum(transactions.iter().filter(|t| t.member_id == mb.id));
            MemberSummary {
                member_id: mb.id,
                name: mb.name.clone(),
                aggregate_to_family: mb.aggregate_to_family,
                income,
                expenses,
                balance: income - expenses,
            }
        })
        .collect()
}

/// Pending expenses from the start of `from`'s month onward, per month.
pub fn committed_by_month(transactions: &[Transaction], from: NaiveDate) -> Committed {
    let start = from.with_day(1).unwrap_or(from);
    let mut months: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.status == Status::Pending && t.date >= start)
    {
        *months
            .entry((t.date.year(), t.date.month()))
            .or_insert(Decimal::ZERO) += t.amount;
    }
    let months: Vec<MonthTotal> = months
        .into_iter()
        .map(|((year, month), total)| MonthTotal { year, month, total })
        .collect();
    let total = months.iter().map(|m| m.total).sum();
    Committed { months, total }
}

/// Budgeted categories for one month with what was spent against them.
pub fn budget_report(
    budgets: &[Budget],
    transactions: &[Transaction],
    categories: &[Category],
    year: i32,
    month: u32,
) -> Vec<BudgetLine> {
    let mut lines: Vec<BudgetLine> = budgets
        .iter()
        .filter(|b| b.year == year && b.month == month)
        .map(|b| {
            let spent = sum(transactions.iter().filter(|t| {
                t.category_id == b.category_id
                    && t.date.year() == year
                    && t.date.month() == month
            }));
            let category = categories
                .iter()
                .find(|c| c.id == b.category_id)
                .map_or_else(|| format!("#{}", b.category_id), |c| c.name.clone());
            BudgetLine {
                category_id: b.category_id,
                category,
                budget: b.amount,
                spent,
                remaining: b.amount - spent,
            }
        })
        .collect();
    lines.sort_by(|a, b| a.category.cmp(&b.category));
    lines
}

/// One read of everything a report needs.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub accounts: Vec<Account>,
    pub members: Vec<Member>,
    pub categories: Vec<Category>,
    pub entry_types: Vec<EntryType>,
    pub movements: Vec<Movement>,
    pub transactions: Vec<Transaction>,
}

impl Snapshot {
    pub fn load<S: LedgerStore + ?Sized>(store: &S, filter: &EntryFilter) -> LedgerResult<Self> {
        let snapshot = Snapshot {
            accounts: store.accounts()?,
            members: store.members()?,
            categories: store.categories(None)?,
            entry_types: store.entry_types(None)?,
            movements: store.movements(filter)?,
            transactions: store.transactions(filter)?,
        };
        tracing::debug!(
            movements = snapshot.movements.len(),
            transactions = snapshot.transactions.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    pub fn balances(&self) -> Vec<(Account, Decimal)> {
        self.accounts
            .iter()
            .map(|a| (a.clone(), account_balance(a, &self.movements, &self.transactions)))
            .collect()
    }
}
