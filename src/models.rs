// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed set of lowercase tags stored as TEXT columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $tag)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($tag => Ok($name::$variant),)+
                    other => Err(LedgerError::validation(format!(
                        "unknown {} '{}' (expected one of: {})",
                        stringify!($name),
                        other,
                        [$($tag),+].join(", ")
                    ))),
                }
            }
        }
    };
}

text_enum!(
    /// Which side of the ledger a lookup row classifies.
    EntryKind {
        Expense => "expense",
        Income => "income",
    }
);

text_enum!(AccountKind {
    Checking => "checking",
    Credit => "credit",
    Savings => "savings",
    Cash => "cash",
    Other => "other",
});

text_enum!(Status {
    Pending => "pending",
    Paid => "paid",
});

text_enum!(
    /// Recurrence style carried by expense types.
    Recurrence {
        Fixed => "fixed",
        Installment => "installment",
        OneTime => "one_time",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub aggregate_to_family: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: EntryKind,
    pub color: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryType {
    pub id: i64,
    pub name: String,
    pub kind: EntryKind,
    pub color: String,
    pub description: Option<String>,
    pub recurrence: Option<Recurrence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub category_id: i64,
    pub amount: Decimal,
}

/// Income entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: Option<i64>,
    pub member_id: Option<i64>,
    pub category_id: Option<i64>,
    pub type_id: Option<i64>,
    pub aggregate_to_family: Option<bool>,
}

/// Expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: Option<i64>,
    pub member_id: i64,
    pub category_id: i64,
    pub type_id: i64,
    pub status: Status,
    pub installment_number: Option<u32>,
    pub total_installments: Option<u32>,
    pub parent_transaction_id: Option<i64>,
    pub aggregate_to_family: Option<bool>,
    /// Joined from the expense type; not a column of the transaction row.
    pub recurrence: Option<Recurrence>,
}

impl Transaction {
    pub fn is_installment(&self) -> bool {
        self.installment_number.is_some()
    }
}

/// Read access shared by movements and transactions.
pub trait LedgerEntry {
    fn amount(&self) -> Decimal;
    fn date(&self) -> NaiveDate;
    fn account_id(&self) -> Option<i64>;
    fn member_id(&self) -> Option<i64>;
    fn aggregate_to_family(&self) -> Option<bool>;
}

impl LedgerEntry for Movement {
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn account_id(&self) -> Option<i64> {
        self.account_id
    }
    fn member_id(&self) -> Option<i64> {
        self.member_id
    }
    fn aggregate_to_family(&self) -> Option<bool> {
        self.aggregate_to_family
    }
}

impl LedgerEntry for Transaction {
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn account_id(&self) -> Option<i64> {
        self.account_id
    }
    fn member_id(&self) -> Option<i64> {
        Some(self.member_id)
    }
    fn aggregate_to_family(&self) -> Option<bool> {
        self.aggregate_to_family
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub name: String,
    pub color: String,
    pub aggregate_to_family: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub kind: EntryKind,
    pub color: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEntryType {
    pub name: String,
    pub kind: EntryKind,
    pub color: String,
    pub description: Option<String>,
    pub recurrence: Option<Recurrence>,
}

/// Income payload; validated by `ledger::validate_income`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: Option<i64>,
    pub member_id: Option<i64>,
    pub category_id: Option<i64>,
    pub type_id: Option<i64>,
    pub aggregate_to_family: Option<bool>,
}

/// Expense intent as submitted by the user, before installment expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: Option<i64>,
    pub member_id: i64,
    pub category_id: i64,
    pub type_id: i64,
    pub status: Status,
    pub aggregate_to_family: Option<bool>,
    pub installments: Option<u32>,
}

/// How a row in an insert batch refers to its installment parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    None,
    /// The id the store assigns to the first row of the same batch.
    FirstOfBatch,
}

/// A fully formed expense row waiting for its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: Option<i64>,
    pub member_id: i64,
    pub category_id: i64,
    pub type_id: i64,
    pub status: Status,
    pub installment_number: Option<u32>,
    pub total_installments: Option<u32>,
    pub parent: ParentLink,
    pub aggregate_to_family: Option<bool>,
}

impl NewTransaction {
    /// A single, non-installment row carrying the draft as-is.
    pub fn single(draft: &ExpenseDraft) -> Self {
        NewTransaction {
            description: draft.description.clone(),
            amount: draft.amount,
            date: draft.date,
            account_id: draft.account_id,
            member_id: draft.member_id,
            category_id: draft.category_id,
            type_id: draft.type_id,
            status: draft.status,
            installment_number: None,
            total_installments: None,
            parent: ParentLink::None,
            aggregate_to_family: draft.aggregate_to_family,
        }
    }
}

/// Inclusive date range used for filtering and period reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LedgerError> {
        if end < start {
            return Err(LedgerError::validation(format!(
                "period end {} is before start {}",
                end, start
            )));
        }
        Ok(Period { start, end })
    }

    pub fn month(year: i32, month: u32) -> Result<Self, LedgerError> {
        let start = crate::utils::month_start(year, month)
            .ok_or_else(|| LedgerError::validation(format!("invalid month {}-{:02}", year, month)))?;
        let end = crate::utils::month_end(year, month)
            .ok_or_else(|| LedgerError::validation(format!("invalid month {}-{:02}", year, month)))?;
        Ok(Period { start, end })
    }

    /// The default reporting window: the calendar month containing `today`.
    /// Callers pass `today` explicitly; nothing here reads the clock.
    pub fn current_month(today: NaiveDate) -> Self {
        use chrono::Datelike;
        let start = today.with_day(1).unwrap_or(today);
        let end = crate::utils::month_end(today.year(), today.month()).unwrap_or(today);
        Period { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
