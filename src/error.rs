// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors raised by the ledger core and its stores.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The payload was rejected before anything was written.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The store failed; nothing from the failed operation was kept.
    #[error("Storage failure: {0}")]
    Persistence(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Persistence(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
