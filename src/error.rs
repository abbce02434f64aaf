// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy shared by the ledger, the aggregates and the dashboard.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The referenced row does not exist or belongs to another owner.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    Validation(String),

    /// Another writer held the database lock for longer than the busy timeout.
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Store(rusqlite::Error),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                LedgerError::Conflict(err.to_string())
            }
            // UNIQUE / CHECK / foreign key rejections are caused by the input.
            Some(ErrorCode::ConstraintViolation) => LedgerError::Validation(err.to_string()),
            _ => LedgerError::Store(err),
        }
    }
}

impl LedgerError {
    pub fn not_found(what: &str, id: i64) -> Self {
        LedgerError::NotFound(format!("{} {}", what, id))
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Turns "no rows" into `NotFound` for scoped single-row lookups.
pub(crate) trait OptionalRow<T> {
    fn or_not_found(self, what: &str, id: i64) -> Result<T>;
}

impl<T> OptionalRow<T> for rusqlite::Result<T> {
    fn or_not_found(self, what: &str, id: i64) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(LedgerError::not_found(what, id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_maps_to_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(LedgerError::from(err), LedgerError::Conflict(_)));
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let res: rusqlite::Result<i64> = Err(rusqlite::Error::QueryReturnedNoRows);
        let err = res.or_not_found("account", 7).unwrap_err();
        assert_eq!(err.to_string(), "Not found: account 7");
    }
}
