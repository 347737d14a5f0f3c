// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{EntryFilter, LedgerStore};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, Budget, Category, EntryKind, EntryType, Member, Movement, NewAccount, NewCategory,
    NewEntryType, NewMember, NewMovement, NewTransaction, ParentLink, Status, Transaction,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use rust_decimal::Decimal;
use std::str::FromStr;

const MOVEMENT_COLUMNS: &str = "m.id, m.description, m.amount, m.date, m.account_id, m.member_id, \
     m.category_id, m.type_id, m.aggregate_to_family";

const TRANSACTION_COLUMNS: &str = "t.id, t.description, t.amount, t.date, t.account_id, \
     t.member_id, t.category_id, t.type_id, t.status, t.installment_number, \
     t.total_installments, t.parent_transaction_id, t.aggregate_to_family, et.recurrence";

/// [`LedgerStore`] over a SQLite connection opened by [`crate::db::open_or_init`].
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }

    fn account_by_id(&self, id: i64) -> LedgerResult<Option<Account>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, kind, initial_balance FROM accounts WHERE id=?1",
                params![id],
                account_from_row,
            )
            .optional()?)
    }

    fn member_by_id(&self, id: i64) -> LedgerResult<Option<Member>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, color, aggregate_to_family FROM members WHERE id=?1",
                params![id],
                member_from_row,
            )
            .optional()?)
    }

    fn budget_for(&self, year: i32, month: u32, category_id: i64) -> LedgerResult<Option<Budget>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, year, month, category_id, amount FROM budgets
                 WHERE year=?1 AND month=?2 AND category_id=?3",
                params![year, month, category_id],
                budget_from_row,
            )
            .optional()?)
    }
}

/// Parses a TEXT tag column into one of the model enums.
fn tag_at<T: FromStr<Err = LedgerError>>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = r.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn opt_tag_at<T: FromStr<Err = LedgerError>>(
    r: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = r.get(idx)?;
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Decimal stored as TEXT. `signed` allows negative values (balances);
/// ledger amounts must never be negative.
fn decimal_at(r: &Row<'_>, idx: usize, signed: bool) -> rusqlite::Result<Decimal> {
    let raw: String = r.get(idx)?;
    let value = raw
        .parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?;
    if !signed && value.is_sign_negative() && !value.is_zero() {
        return Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(LedgerError::Persistence(format!(
                "negative amount '{}' in ledger row",
                raw
            ))),
        ));
    }
    if value.abs() > crate::ledger::MAX_AMOUNT {
        return Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(LedgerError::Persistence(format!(
                "amount '{}' is out of range",
                raw
            ))),
        ));
    }
    Ok(value)
}

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: tag_at(r, 2)?,
        initial_balance: decimal_at(r, 3, true)?,
    })
}

fn member_from_row(r: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: r.get(0)?,
        name: r.get(1)?,
        color: r.get(2)?,
        aggregate_to_family: r.get(3)?,
    })
}

fn category_from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: tag_at(r, 2)?,
        color: r.get(3)?,
        description: r.get(4)?,
    })
}

fn entry_type_from_row(r: &Row<'_>) -> rusqlite::Result<EntryType> {
    Ok(EntryType {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: tag_at(r, 2)?,
        color: r.get(3)?,
        description: r.get(4)?,
        recurrence: opt_tag_at(r, 5)?,
    })
}

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        year: r.get(1)?,
        month: r.get(2)?,
        category_id: r.get(3)?,
        amount: decimal_at(r, 4, false)?,
    })
}

fn movement_from_row(r: &Row<'_>) -> rusqlite::Result<Movement> {
    Ok(Movement {
        id: r.get(0)?,
        description: r.get(1)?,
        amount: decimal_at(r, 2, false)?,
        date: r.get(3)?,
        account_id: r.get(4)?,
        member_id: r.get(5)?,
        category_id: r.get(6)?,
        type_id: r.get(7)?,
        aggregate_to_family: r.get(8)?,
    })
}

fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        description: r.get(1)?,
        amount: decimal_at(r, 2, false)?,
        date: r.get(3)?,
        account_id: r.get(4)?,
        member_id: r.get(5)?,
        category_id: r.get(6)?,
        type_id: r.get(7)?,
        status: tag_at(r, 8)?,
        installment_number: r.get(9)?,
        total_installments: r.get(10)?,
        parent_transaction_id: r.get(11)?,
        aggregate_to_family: r.get(12)?,
        recurrence: opt_tag_at(r, 13)?,
    })
}

/// Appends the filter's conditions for the table aliased as `alias`.
fn push_filter(
    sql: &mut String,
    params_vec: &mut Vec<Box<dyn ToSql>>,
    alias: &str,
    filter: &EntryFilter,
    with_status: bool,
) {
    let mut eq = |column: &str, value: Box<dyn ToSql>| {
        sql.push_str(&format!(" AND {}.{}=?", alias, column));
        params_vec.push(value);
    };
    if let Some(id) = filter.account_id {
        eq("account_id", Box::new(id));
    }
    if let Some(id) = filter.member_id {
        eq("member_id", Box::new(id));
    }
    if let Some(id) = filter.category_id {
        eq("category_id", Box::new(id));
    }
    if let Some(id) = filter.type_id {
        eq("type_id", Box::new(id));
    }
    if with_status {
        if let Some(status) = filter.status {
            eq("status", Box::new(status.as_str()));
        }
    }
    if let Some(range) = filter.range {
        sql.push_str(&format!(" AND {a}.date>=? AND {a}.date<=?", a = alias));
        params_vec.push(Box::new(range.start));
        params_vec.push(Box::new(range.end));
    }
}

impl LedgerStore for SqliteStore<'_> {
    fn accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, kind, initial_balance FROM accounts ORDER BY name")?;
        let rows = stmt.query_map([], account_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn account(&self, id: i64) -> LedgerResult<Option<Account>> {
        self.account_by_id(id)
    }

    fn insert_account(&mut self, new: &NewAccount) -> LedgerResult<Account> {
        self.conn.execute(
            "INSERT INTO accounts(name, kind, initial_balance) VALUES (?1, ?2, ?3)",
            params![new.name, new.kind.as_str(), new.initial_balance.to_string()],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, name = %new.name, "inserted account");
        self.account_by_id(id)?
            .ok_or_else(|| LedgerError::not_found("account", id))
    }

    fn members(&self) -> LedgerResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, aggregate_to_family FROM members ORDER BY id")?;
        let rows = stmt.query_map([], member_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn member(&self, id: i64) -> LedgerResult<Option<Member>> {
        self.member_by_id(id)
    }

    fn insert_member(&mut self, new: &NewMember) -> LedgerResult<Member> {
        self.conn.execute(
            "INSERT INTO members(name, color, aggregate_to_family) VALUES (?1, ?2, ?3)",
            params![new.name, new.color, new.aggregate_to_family],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, name = %new.name, "inserted member");
        self.member_by_id(id)?
            .ok_or_else(|| LedgerError::not_found("member", id))
    }

    fn set_member_aggregate(&mut self, id: i64, aggregate: bool) -> LedgerResult<Member> {
        let changed = self.conn.execute(
            "UPDATE members SET aggregate_to_family=?1 WHERE id=?2",
            params![aggregate, id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("member", id));
        }
        self.member_by_id(id)?
            .ok_or_else(|| LedgerError::not_found("member", id))
    }

    fn categories(&self, kind: Option<EntryKind>) -> LedgerResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kind, color, description FROM categories
             WHERE ?1 IS NULL OR kind=?1 ORDER BY kind, name",
        )?;
        let rows = stmt.query_map(params![kind.map(|k| k.as_str())], category_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn category(&self, id: i64) -> LedgerResult<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, kind, color, description FROM categories WHERE id=?1",
                params![id],
                category_from_row,
            )
            .optional()?)
    }

    fn insert_category(&mut self, new: &NewCategory) -> LedgerResult<Category> {
        self.conn.execute(
            "INSERT INTO categories(name, kind, color, description) VALUES (?1, ?2, ?3, ?4)",
            params![new.name, new.kind.as_str(), new.color, new.description],
        )?;
        let id = self.conn.last_insert_rowid();
        self.category(id)?
            .ok_or_else(|| LedgerError::not_found("category", id))
    }

    fn entry_types(&self, kind: Option<EntryKind>) -> LedgerResult<Vec<EntryType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kind, color, description, recurrence FROM entry_types
             WHERE ?1 IS NULL OR kind=?1 ORDER BY kind, name",
        )?;
        let rows = stmt.query_map(params![kind.map(|k| k.as_str())], entry_type_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn entry_type(&self, id: i64) -> LedgerResult<Option<EntryType>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, kind, color, description, recurrence FROM entry_types WHERE id=?1",
                params![id],
                entry_type_from_row,
            )
            .optional()?)
    }

    fn insert_entry_type(&mut self, new: &NewEntryType) -> LedgerResult<EntryType> {
        self.conn.execute(
            "INSERT INTO entry_types(name, kind, color, description, recurrence)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.name,
                new.kind.as_str(),
                new.color,
                new.description,
                new.recurrence.map(|r| r.as_str())
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.entry_type(id)?
            .ok_or_else(|| LedgerError::not_found("type", id))
    }

    fn movements(&self, filter: &EntryFilter) -> LedgerResult<Vec<Movement>> {
        let mut sql = format!("SELECT {} FROM movements m WHERE 1=1", MOVEMENT_COLUMNS);
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
        push_filter(&mut sql, &mut params_vec, "m", filter, false);
        sql.push_str(" ORDER BY m.date, m.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params_vec.iter()),
            movement_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_movement(&mut self, new: &NewMovement) -> LedgerResult<Movement> {
        self.conn.execute(
            "INSERT INTO movements(description, amount, date, account_id, member_id, category_id, type_id, aggregate_to_family)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.description,
                new.amount.to_string(),
                new.date,
                new.account_id,
                new.member_id,
                new.category_id,
                new.type_id,
                new.aggregate_to_family
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, amount = %new.amount, "inserted movement");
        self.conn
            .query_row(
                &format!("SELECT {} FROM movements m WHERE m.id=?1", MOVEMENT_COLUMNS),
                params![id],
                movement_from_row,
            )
            .map_err(LedgerError::from)
    }

    fn delete_movement(&mut self, id: i64) -> LedgerResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM movements WHERE id=?1", params![id])?;
        if removed == 0 {
            return Err(LedgerError::not_found("movement", id));
        }
        Ok(())
    }

    fn transactions(&self, filter: &EntryFilter) -> LedgerResult<Vec<Transaction>> {
        let mut sql = format!(
            "SELECT {} FROM transactions t LEFT JOIN entry_types et ON et.id=t.type_id WHERE 1=1",
            TRANSACTION_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
        push_filter(&mut sql, &mut params_vec, "t", filter, true);
        sql.push_str(" ORDER BY t.date, t.id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params_vec.iter()),
            transaction_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn transaction(&self, id: i64) -> LedgerResult<Option<Transaction>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions t LEFT JOIN entry_types et ON et.id=t.type_id WHERE t.id=?1",
                    TRANSACTION_COLUMNS
                ),
                params![id],
                transaction_from_row,
            )
            .optional()?)
    }

    fn insert_transactions(&mut self, rows: &[NewTransaction]) -> LedgerResult<Vec<Transaction>> {
        // Rolled back on drop unless committed.
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(rows.len());
        let mut first_id: Option<i64> = None;

        for row in rows {
            let parent = match row.parent {
                ParentLink::None => None,
                ParentLink::FirstOfBatch => first_id,
            };
            tx.execute(
                "INSERT INTO transactions(description, amount, date, account_id, member_id, category_id, type_id,
                                          status, installment_number, total_installments, parent_transaction_id,
                                          aggregate_to_family)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    row.description,
                    row.amount.to_string(),
                    row.date,
                    row.account_id,
                    row.member_id,
                    row.category_id,
                    row.type_id,
                    row.status.as_str(),
                    row.installment_number,
                    row.total_installments,
                    parent,
                    row.aggregate_to_family
                ],
            )?;
            let id = tx.last_insert_rowid();
            if row.parent == ParentLink::FirstOfBatch && first_id.is_none() {
                tx.execute(
                    "UPDATE transactions SET parent_transaction_id=?1 WHERE id=?1",
                    params![id],
                )?;
            }
            first_id.get_or_insert(id);
            ids.push(id);
        }
        tx.commit()?;
        tracing::debug!(count = ids.len(), "inserted transaction batch");

        ids.into_iter()
            .map(|id| {
                self.transaction(id)?
                    .ok_or_else(|| LedgerError::not_found("transaction", id))
            })
            .collect()
    }

    fn set_transaction_status(&mut self, id: i64, status: Status) -> LedgerResult<Transaction> {
        let changed = self.conn.execute(
            "UPDATE transactions SET status=?1 WHERE id=?2",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("transaction", id));
        }
        self.transaction(id)?
            .ok_or_else(|| LedgerError::not_found("transaction", id))
    }

    fn delete_transaction(&mut self, id: i64) -> LedgerResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM transactions WHERE id=?1", params![id])?;
        if removed == 0 {
            return Err(LedgerError::not_found("transaction", id));
        }
        Ok(())
    }

    fn budgets(&self, year: i32, month: u32) -> LedgerResult<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, year, month, category_id, amount FROM budgets
             WHERE year=?1 AND month=?2 ORDER BY category_id",
        )?;
        let rows = stmt.query_map(params![year, month], budget_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn all_budgets(&self) -> LedgerResult<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, year, month, category_id, amount FROM budgets
             ORDER BY year DESC, month DESC, category_id",
        )?;
        let rows = stmt.query_map([], budget_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn upsert_budget(
        &mut self,
        year: i32,
        month: u32,
        category_id: i64,
        amount: Decimal,
    ) -> LedgerResult<Budget> {
        self.conn.execute(
            "INSERT INTO budgets(year, month, category_id, amount) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(year, month, category_id) DO UPDATE SET amount=excluded.amount",
            params![year, month, category_id, amount.to_string()],
        )?;
        self.budget_for(year, month, category_id)?
            .ok_or_else(|| LedgerError::not_found("budget", category_id))
    }
}
