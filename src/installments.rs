// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Expansion of one expense into a group of monthly installments.
//!
//! A purchase of `amount` in `n` installments becomes `n` rows:
//!
//! * every share is `amount / n` rounded half-up to cents, except the last,
//!   which takes whatever is left so the group sums to `amount` exactly;
//! * row `k` is dated `k - 1` calendar months after the purchase date,
//!   clamped to the end of shorter months;
//! * every row carries `installment_number`/`total_installments` and the id
//!   of row 1 as `parent_transaction_id` (row 1 points at itself).
//!
//! The group is written as a single batch; a failed write leaves no rows.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::validate_expense;
use crate::models::{ExpenseDraft, NewTransaction, ParentLink, Recurrence, Transaction};
use crate::store::LedgerStore;
use crate::utils::{add_calendar_months, round_cents};
use rust_decimal::Decimal;

/// Upper bound on installments per purchase (thirty years of months).
pub const MAX_INSTALLMENTS: u32 = 360;

/// Splits `total` into `n` cent-precise shares that sum to `total`.
pub fn split_amount(total: Decimal, n: u32) -> LedgerResult<Vec<Decimal>> {
    if n < 2 {
        return Err(LedgerError::validation(format!(
            "an installment purchase needs at least 2 installments, got {}",
            n
        )));
    }
    if n > MAX_INSTALLMENTS {
        return Err(LedgerError::validation(format!(
            "at most {} installments are supported, got {}",
            MAX_INSTALLMENTS, n
        )));
    }
    crate::ledger::validate_amount(total)?;

    let count = Decimal::from(n);
    let share = round_cents(total / count);
    let last = total - share * Decimal::from(n - 1);
    if share <= Decimal::ZERO || last <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "{} is too small to split into {} installments",
            total, n
        )));
    }

    let mut shares = vec![share; (n - 1) as usize];
    shares.push(last);
    Ok(shares)
}

/// Builds the rows of an installment group without touching storage.
pub fn plan_installments(draft: &ExpenseDraft, n: u32) -> LedgerResult<Vec<NewTransaction>> {
    let shares = split_amount(draft.amount, n)?;
    let description = draft.description.trim().to_string();

    shares
        .into_iter()
        .enumerate()
        .map(|(idx, amount)| {
            let number = idx as u32 + 1;
            let date = add_calendar_months(draft.date, idx as u32).ok_or_else(|| {
                LedgerError::validation(format!(
                    "installment {} of {} falls outside the supported date range",
                    number, n
                ))
            })?;
            Ok(NewTransaction {
                description: description.clone(),
                amount,
                date,
                account_id: draft.account_id,
                member_id: draft.member_id,
                category_id: draft.category_id,
                type_id: draft.type_id,
                status: draft.status,
                installment_number: Some(number),
                total_installments: Some(n),
                parent: ParentLink::FirstOfBatch,
                aggregate_to_family: draft.aggregate_to_family,
            })
        })
        .collect()
}

/// Records expenses, expanding installment purchases into their groups.
pub struct InstallmentEngine<'s, S: LedgerStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: LedgerStore + ?Sized> InstallmentEngine<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        InstallmentEngine { store }
    }

    /// Validates and persists `draft`.
    ///
    /// Returns one row for an ordinary expense, or the whole group ordered by
    /// installment number for an installment purchase.
    pub fn record_expense(&mut self, draft: &ExpenseDraft) -> LedgerResult<Vec<Transaction>> {
        let entry_type = validate_expense(&*self.store, draft)?;
        let is_installment_type = entry_type.recurrence == Some(Recurrence::Installment);

        let rows = match (draft.installments, is_installment_type) {
            (Some(n), true) if n >= 2 => plan_installments(draft, n)?,
            (Some(n), false) if n >= 2 => {
                return Err(LedgerError::validation(format!(
                    "type '{}' is not an installment type; cannot split into {} installments",
                    entry_type.name, n
                )));
            }
            (_, true) => {
                return Err(LedgerError::validation(format!(
                    "type '{}' requires at least 2 installments",
                    entry_type.name
                )));
            }
            (_, false) => {
                let mut single = NewTransaction::single(draft);
                single.description = single.description.trim().to_string();
                vec![single]
            }
        };

        let mut created = match self.store.insert_transactions(&rows) {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(
                    description = %draft.description.trim(),
                    rows = rows.len(),
                    error = %err,
                    "expense was not recorded"
                );
                return Err(err);
            }
        };
        created.sort_by_key(|t| t.installment_number);

        if let Some(first) = created.first().filter(|t| t.is_installment()) {
            tracing::info!(
                parent = first.id,
                installments = created.len(),
                total = %draft.amount,
                "recorded installment purchase"
            );
        } else if let Some(row) = created.first() {
            tracing::info!(id = row.id, amount = %row.amount, "recorded expense");
        }
        Ok(created)
    }
}
