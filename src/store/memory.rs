// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{EntryFilter, LedgerStore};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, Budget, Category, EntryKind, EntryType, Member, Movement, NewAccount, NewCategory,
    NewEntryType, NewMember, NewMovement, NewTransaction, ParentLink, Recurrence, Status,
    Transaction,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// In-memory store for tests. Ids come from one counter shared by all tables.
///
/// `fail_on_insert(k)` makes the k-th transaction row of the next batch
/// (1-based) fail, which exercises the all-or-nothing batch contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Vec<Account>,
    members: Vec<Member>,
    categories: Vec<Category>,
    entry_types: Vec<EntryType>,
    movements: Vec<Movement>,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    next_id: i64,
    fail_on_insert: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on_insert(&mut self, row: usize) {
        self.fail_on_insert = Some(row);
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn recurrence_of(&self, type_id: i64) -> Option<Recurrence> {
        self.entry_types
            .iter()
            .find(|t| t.id == type_id)
            .and_then(|t| t.recurrence)
    }

    fn sorted<T>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> (NaiveDate, i64)) -> Vec<T> {
        let mut out: Vec<T> = rows.collect();
        out.sort_by_key(|r| key(r));
        out
    }
}

impl LedgerStore for MemoryStore {
    fn accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut out = self.accounts.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn account(&self, id: i64) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.iter().find(|a| a.id == id).cloned())
    }

    fn insert_account(&mut self, new: &NewAccount) -> LedgerResult<Account> {
        if self.accounts.iter().any(|a| a.name == new.name) {
            return Err(LedgerError::Persistence(format!(
                "account '{}' already exists",
                new.name
            )));
        }
        let account = Account {
            id: self.allocate_id(),
            name: new.name.clone(),
            kind: new.kind,
            initial_balance: new.initial_balance,
        };
        self.accounts.push(account.clone());
        Ok(account)
    }

    fn members(&self) -> LedgerResult<Vec<Member>> {
        Ok(self.members.clone())
    }

    fn member(&self, id: i64) -> LedgerResult<Option<Member>> {
        Ok(self.members.iter().find(|m| m.id == id).cloned())
    }

    fn insert_member(&mut self, new: &NewMember) -> LedgerResult<Member> {
        let member = Member {
            id: self.allocate_id(),
            name: new.name.clone(),
            color: new.color.clone(),
            aggregate_to_family: new.aggregate_to_family,
        };
        self.members.push(member.clone());
        Ok(member)
    }

    fn set_member_aggregate(&mut self, id: i64, aggregate: bool) -> LedgerResult<Member> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| LedgerError::not_found("member", id))?;
        member.aggregate_to_family = aggregate;
        Ok(member.clone())
    }

    fn categories(&self, kind: Option<EntryKind>) -> LedgerResult<Vec<Category>> {
        Ok(self
            .categories
            .iter()
            .filter(|c| kind.is_none_or(|k| c.kind == k))
            .cloned()
            .collect())
    }

    fn category(&self, id: i64) -> LedgerResult<Option<Category>> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    fn insert_category(&mut self, new: &NewCategory) -> LedgerResult<Category> {
        let category = Category {
            id: self.allocate_id(),
            name: new.name.clone(),
            kind: new.kind,
            color: new.color.clone(),
            description: new.description.clone(),
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    fn entry_types(&self, kind: Option<EntryKind>) -> LedgerResult<Vec<EntryType>> {
        Ok(self
            .entry_types
            .iter()
            .filter(|t| kind.is_none_or(|k| t.kind == k))
            .cloned()
            .collect())
    }

    fn entry_type(&self, id: i64) -> LedgerResult<Option<EntryType>> {
        Ok(self.entry_types.iter().find(|t| t.id == id).cloned())
    }

    fn insert_entry_type(&mut self, new: &NewEntryType) -> LedgerResult<EntryType> {
        let entry_type = EntryType {
            id: self.allocate_id(),
            name: new.name.clone(),
            kind: new.kind,
            color: new.color.clone(),
            description: new.description.clone(),
            recurrence: new.recurrence,
        };
        self.entry_types.push(entry_type.clone());
        Ok(entry_type)
    }

    fn movements(&self, filter: &EntryFilter) -> LedgerResult<Vec<Movement>> {
        Ok(Self::sorted(
            self.movements
                .iter()
                .filter(|m| filter.matches_movement(m))
                .cloned(),
            |m| (m.date, m.id),
        ))
    }

    fn insert_movement(&mut self, new: &NewMovement) -> LedgerResult<Movement> {
        let movement = Movement {
            id: self.allocate_id(),
            description: new.description.clone(),
            amount: new.amount,
            date: new.date,
            account_id: new.account_id,
            member_id: new.member_id,
            category_id: new.category_id,
            type_id: new.type_id,
            aggregate_to_family: new.aggregate_to_family,
        };
        self.movements.push(movement.clone());
        Ok(movement)
    }

    fn delete_movement(&mut self, id: i64) -> LedgerResult<()> {
        let before = self.movements.len();
        self.movements.retain(|m| m.id != id);
        if self.movements.len() == before {
            return Err(LedgerError::not_found("movement", id));
        }
        Ok(())
    }

    fn transactions(&self, filter: &EntryFilter) -> LedgerResult<Vec<Transaction>> {
        Ok(Self::sorted(
            self.transactions
                .iter()
                .filter(|t| filter.matches_transaction(t))
                .cloned(),
            |t| (t.date, t.id),
        ))
    }

    fn transaction(&self, id: i64) -> LedgerResult<Option<Transaction>> {
        Ok(self.transactions.iter().find(|t| t.id == id).cloned())
    }

    fn insert_transactions(&mut self, rows: &[NewTransaction]) -> LedgerResult<Vec<Transaction>> {
        let fail_on = self.fail_on_insert.take();
        let saved_next_id = self.next_id;
        let mut staged: Vec<Transaction> = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            if fail_on == Some(idx + 1) {
                self.next_id = saved_next_id;
                return Err(LedgerError::Persistence(format!(
                    "simulated failure inserting row {}",
                    idx + 1
                )));
            }
            let id = self.allocate_id();
            let parent = match row.parent {
                ParentLink::None => None,
                ParentLink::FirstOfBatch => Some(staged.first().map_or(id, |first| first.id)),
            };
            staged.push(Transaction {
                id,
                description: row.description.clone(),
                amount: row.amount,
                date: row.date,
                account_id: row.account_id,
                member_id: row.member_id,
                category_id: row.category_id,
                type_id: row.type_id,
                status: row.status,
                installment_number: row.installment_number,
                total_installments: row.total_installments,
                parent_transaction_id: parent,
                aggregate_to_family: row.aggregate_to_family,
                recurrence: self.recurrence_of(row.type_id),
            });
        }

        self.transactions.extend(staged.iter().cloned());
        Ok(staged)
    }

    fn set_transaction_status(&mut self, id: i64, status: Status) -> LedgerResult<Transaction> {
        let row = self
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::not_found("transaction", id))?;
        row.status = status;
        Ok(row.clone())
    }

    fn delete_transaction(&mut self, id: i64) -> LedgerResult<()> {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        if self.transactions.len() == before {
            return Err(LedgerError::not_found("transaction", id));
        }
        Ok(())
    }

    fn budgets(&self, year: i32, month: u32) -> LedgerResult<Vec<Budget>> {
        Ok(self
            .budgets
            .iter()
            .filter(|b| b.year == year && b.month == month)
            .cloned()
            .collect())
    }

    fn all_budgets(&self) -> LedgerResult<Vec<Budget>> {
        let mut out = self.budgets.clone();
        out.sort_by(|a, b| {
            (b.year, b.month)
                .cmp(&(a.year, a.month))
                .then(a.category_id.cmp(&b.category_id))
        });
        Ok(out)
    }

    fn upsert_budget(
        &mut self,
        year: i32,
        month: u32,
        category_id: i64,
        amount: Decimal,
    ) -> LedgerResult<Budget> {
        if let Some(existing) = self
            .budgets
            .iter_mut()
            .find(|b| b.year == year && b.month == month && b.category_id == category_id)
        {
            existing.amount = amount;
            return Ok(existing.clone());
        }
        let budget = Budget {
            id: self.allocate_id(),
            year,
            month,
            category_id,
            amount,
        };
        self.budgets.push(budget.clone());
        Ok(budget)
    }
}
