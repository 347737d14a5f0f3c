// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Payload validation and the single-row ledger operations.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, Budget, EntryKind, EntryType, ExpenseDraft, Movement, NewAccount, NewMovement,
    Status, Transaction,
};
use crate::store::LedgerStore;
use crate::utils::has_cent_precision;
use rust_decimal::Decimal;

/// Largest magnitude a stored amount may have (a `decimal(12, 2)` column).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

fn check_cents_and_bound(what: &str, value: Decimal) -> LedgerResult<()> {
    if !has_cent_precision(value) {
        return Err(LedgerError::validation(format!(
            "{} {} has more than two decimal places",
            what, value
        )));
    }
    if value.abs() > MAX_AMOUNT {
        return Err(LedgerError::validation(format!(
            "{} {} exceeds the limit of {}",
            what, value, MAX_AMOUNT
        )));
    }
    Ok(())
}

pub fn validate_amount(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    check_cents_and_bound("amount", amount)
}

/// Opening balances may be negative (credit cards) but share the amount limits.
pub fn validate_balance(balance: Decimal) -> LedgerResult<()> {
    check_cents_and_bound("balance", balance)
}

fn validate_description(description: &str) -> LedgerResult<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::validation("description must not be empty"));
    }
    Ok(())
}

fn require_account<S: LedgerStore + ?Sized>(store: &S, id: Option<i64>) -> LedgerResult<()> {
    if let Some(id) = id {
        if store.account(id)?.is_none() {
            return Err(LedgerError::validation(format!("account {} does not exist", id)));
        }
    }
    Ok(())
}

fn require_member<S: LedgerStore + ?Sized>(store: &S, id: i64) -> LedgerResult<()> {
    if store.member(id)?.is_none() {
        return Err(LedgerError::validation(format!("member {} does not exist", id)));
    }
    Ok(())
}

fn require_category<S: LedgerStore + ?Sized>(
    store: &S,
    id: i64,
    kind: EntryKind,
) -> LedgerResult<()> {
    match store.category(id)? {
        Some(c) if c.kind == kind => Ok(()),
        Some(c) => Err(LedgerError::validation(format!(
            "category '{}' is an {} category, expected {}",
            c.name, c.kind, kind
        ))),
        None => Err(LedgerError::validation(format!("category {} does not exist", id))),
    }
}

fn require_type<S: LedgerStore + ?Sized>(
    store: &S,
    id: i64,
    kind: EntryKind,
) -> LedgerResult<EntryType> {
    match store.entry_type(id)? {
        Some(t) if t.kind == kind => Ok(t),
        Some(t) => Err(LedgerError::validation(format!(
            "type '{}' is an {} type, expected {}",
            t.name, t.kind, kind
        ))),
        None => Err(LedgerError::validation(format!("type {} does not exist", id))),
    }
}

/// Checks an expense draft and resolves its expense type.
pub fn validate_expense<S: LedgerStore + ?Sized>(
    store: &S,
    draft: &ExpenseDraft,
) -> LedgerResult<EntryType> {
    validate_description(&draft.description)?;
    validate_amount(draft.amount)?;
    require_member(store, draft.member_id)?;
    require_category(store, draft.category_id, EntryKind::Expense)?;
    require_account(store, draft.account_id)?;
    require_type(store, draft.type_id, EntryKind::Expense)
}

pub fn validate_income<S: LedgerStore + ?Sized>(store: &S, new: &NewMovement) -> LedgerResult<()> {
    validate_description(&new.description)?;
    validate_amount(new.amount)?;
    if let Some(id) = new.member_id {
        require_member(store, id)?;
    }
    if let Some(id) = new.category_id {
        require_category(store, id, EntryKind::Income)?;
    }
    if let Some(id) = new.type_id {
        require_type(store, id, EntryKind::Income)?;
    }
    require_account(store, new.account_id)
}

pub fn record_income<S: LedgerStore + ?Sized>(
    store: &mut S,
    new: &NewMovement,
) -> LedgerResult<Movement> {
    validate_income(&*store, new)?;
    let new = NewMovement {
        description: new.description.trim().to_string(),
        ..new.clone()
    };
    let movement = store.insert_movement(&new)?;
    tracing::info!(id = movement.id, amount = %movement.amount, "recorded income");
    Ok(movement)
}

pub fn open_account<S: LedgerStore + ?Sized>(
    store: &mut S,
    new: &NewAccount,
) -> LedgerResult<Account> {
    if new.name.trim().is_empty() {
        return Err(LedgerError::validation("account name must not be empty"));
    }
    validate_balance(new.initial_balance)?;
    let account = store.insert_account(new)?;
    tracing::info!(id = account.id, name = %account.name, "opened account");
    Ok(account)
}

pub fn set_budget<S: LedgerStore + ?Sized>(
    store: &mut S,
    year: i32,
    month: u32,
    category_id: i64,
    amount: Decimal,
) -> LedgerResult<Budget> {
    validate_amount(amount)?;
    require_category(&*store, category_id, EntryKind::Expense)?;
    let budget = store.upsert_budget(year, month, category_id, amount)?;
    tracing::info!(year, month, category_id, amount = %budget.amount, "budget set");
    Ok(budget)
}

pub fn set_status<S: LedgerStore + ?Sized>(
    store: &mut S,
    id: i64,
    status: Status,
) -> LedgerResult<Transaction> {
    let updated = store.set_transaction_status(id, status)?;
    tracing::info!(id, %status, "transaction status changed");
    Ok(updated)
}

/// Deletes one expense row. Installment siblings are left untouched.
pub fn remove_transaction<S: LedgerStore + ?Sized>(store: &mut S, id: i64) -> LedgerResult<()> {
    store.delete_transaction(id)?;
    tracing::info!(id, "transaction removed");
    Ok(())
}

pub fn remove_movement<S: LedgerStore + ?Sized>(store: &mut S, id: i64) -> LedgerResult<()> {
    store.delete_movement(id)?;
    tracing::info!(id, "movement removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_amount_is_twelve_digits_at_two_places() {
        assert_eq!(MAX_AMOUNT, Decimal::new(999_999_999_999, 2));
        assert!(validate_amount(MAX_AMOUNT).is_ok());
        assert!(validate_amount(MAX_AMOUNT + Decimal::new(1, 2)).is_err());
        assert!(validate_balance(-MAX_AMOUNT).is_ok());
        assert!(validate_balance(Decimal::new(-10_123, 3)).is_err());
    }
}
