// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence collaborator used by the ledger core.
//!
//! Everything the installment engine and the reports need from storage goes
//! through [`LedgerStore`], so the engine can run against SQLite in the CLI
//! and against [`MemoryStore`] in tests.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::LedgerResult;
use crate::models::{
    Account, Budget, Category, EntryKind, EntryType, Member, Movement, NewAccount, NewCategory,
    NewEntryType, NewMember, NewMovement, NewTransaction, Period, Status, Transaction,
};
use rust_decimal::Decimal;

/// Optional equality and date filters, ANDed together.
///
/// `status` only narrows transactions; movements carry no status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub account_id: Option<i64>,
    pub member_id: Option<i64>,
    pub category_id: Option<i64>,
    pub type_id: Option<i64>,
    pub status: Option<Status>,
    pub range: Option<Period>,
}

impl EntryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn account(mut self, id: i64) -> Self {
        self.account_id = Some(id);
        self
    }

    pub fn member(mut self, id: i64) -> Self {
        self.member_id = Some(id);
        self
    }

    pub fn category(mut self, id: i64) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn entry_type(mut self, id: i64) -> Self {
        self.type_id = Some(id);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn within(mut self, period: Period) -> Self {
        self.range = Some(period);
        self
    }

    pub fn matches_movement(&self, m: &Movement) -> bool {
        self.account_id.is_none_or(|id| m.account_id == Some(id))
            && self.member_id.is_none_or(|id| m.member_id == Some(id))
            && self.category_id.is_none_or(|id| m.category_id == Some(id))
            && self.type_id.is_none_or(|id| m.type_id == Some(id))
            && self.range.is_none_or(|p| p.contains(m.date))
    }

    pub fn matches_transaction(&self, t: &Transaction) -> bool {
        self.account_id.is_none_or(|id| t.account_id == Some(id))
            && self.member_id.is_none_or(|id| t.member_id == id)
            && self.category_id.is_none_or(|id| t.category_id == id)
            && self.type_id.is_none_or(|id| t.type_id == id)
            && self.status.is_none_or(|s| t.status == s)
            && self.range.is_none_or(|p| p.contains(t.date))
    }
}

/// Reads and writes for every ledger table.
///
/// Listing methods return rows ordered by date (then id) ascending.
pub trait LedgerStore {
    fn accounts(&self) -> LedgerResult<Vec<Account>>;
    fn account(&self, id: i64) -> LedgerResult<Option<Account>>;
    fn insert_account(&mut self, new: &NewAccount) -> LedgerResult<Account>;

    fn members(&self) -> LedgerResult<Vec<Member>>;
    fn member(&self, id: i64) -> LedgerResult<Option<Member>>;
    fn insert_member(&mut self, new: &NewMember) -> LedgerResult<Member>;
    fn set_member_aggregate(&mut self, id: i64, aggregate: bool) -> LedgerResult<Member>;

    fn categories(&self, kind: Option<EntryKind>) -> LedgerResult<Vec<Category>>;
    fn category(&self, id: i64) -> LedgerResult<Option<Category>>;
    fn insert_category(&mut self, new: &NewCategory) -> LedgerResult<Category>;

    fn entry_types(&self, kind: Option<EntryKind>) -> LedgerResult<Vec<EntryType>>;
    fn entry_type(&self, id: i64) -> LedgerResult<Option<EntryType>>;
    fn insert_entry_type(&mut self, new: &NewEntryType) -> LedgerResult<EntryType>;

    fn movements(&self, filter: &EntryFilter) -> LedgerResult<Vec<Movement>>;
    fn insert_movement(&mut self, new: &NewMovement) -> LedgerResult<Movement>;
    fn delete_movement(&mut self, id: i64) -> LedgerResult<()>;

    fn transactions(&self, filter: &EntryFilter) -> LedgerResult<Vec<Transaction>>;
    fn transaction(&self, id: i64) -> LedgerResult<Option<Transaction>>;
    /// Inserts every row or none. Ids are assigned in slice order and rows
    /// linked with `ParentLink::FirstOfBatch` get the first row's id as
    /// `parent_transaction_id`. Returned rows keep the slice order.
    fn insert_transactions(&mut self, rows: &[NewTransaction]) -> LedgerResult<Vec<Transaction>>;
    fn set_transaction_status(&mut self, id: i64, status: Status) -> LedgerResult<Transaction>;
    fn delete_transaction(&mut self, id: i64) -> LedgerResult<()>;

    fn budgets(&self, year: i32, month: u32) -> LedgerResult<Vec<Budget>>;
    /// Every budget, newest month first.
    fn all_budgets(&self) -> LedgerResult<Vec<Budget>>;
    fn upsert_budget(
        &mut self,
        year: i32,
        month: u32,
        category_id: i64,
        amount: Decimal,
    ) -> LedgerResult<Budget>;
}
