// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{Row, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Enums persisted as their lowercase name in a TEXT column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
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

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(LedgerError::invalid(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: LedgerError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum!(AccountType {
    Checking => "checking",
    Savings => "savings",
    Credit => "credit",
    Investment => "investment",
    Cash => "cash",
    Other => "other",
});

text_enum!(CategoryType {
    Income => "income",
    Expense => "expense",
});

text_enum!(
    /// Decides the sign of a transaction's effect on its account.
    TransactionType {
        Income => "income",
        Expense => "expense",
    }
);

text_enum!(PaymentMethod {
    Cash => "cash",
    Debit => "debit",
    Credit => "credit",
    Bank => "bank",
    Mobile => "mobile",
    Other => "other",
});

pub const DEFAULT_ACCOUNT_COLOR: &str = "#4299E1";
pub const DEFAULT_CATEGORY_COLOR: &str = "#F56565";
pub const MAX_DESCRIPTION_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub preferred_currency: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub account_number: Option<String>,
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub category_type: CategoryType,
    pub color: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub owner_id: i64,
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal, // always >= 0, sign comes from transaction_type
    pub transaction_type: TransactionType,
    pub description: String,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Client-supplied field values for creating or replacing a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Checks the fields and normalises the amount to two decimal places.
    pub fn validated(&self) -> Result<NewTransaction> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(LedgerError::invalid("description is required"));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(LedgerError::invalid(format!(
                "description longer than {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        Ok(NewTransaction {
            amount: check_money("amount", self.amount, false)?,
            description: description.to_string(),
            notes: self
                .notes
                .as_ref()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            ..self.clone()
        })
    }

    pub(crate) fn into_transaction(self, id: i64, owner_id: i64) -> Transaction {
        Transaction {
            id,
            owner_id,
            account_id: self.account_id,
            category_id: self.category_id,
            amount: self.amount,
            transaction_type: self.transaction_type,
            description: self.description,
            date: self.date,
            payment_method: self.payment_method,
            notes: self.notes,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

/// A transaction with the display fields of its account and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account_name: String,
    pub category_name: String,
    pub category_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub owner_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: String,
}

impl Budget {
    /// Whether `date` falls inside [start_date, end_date], open-ended when no end is set.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: NaiveDate,
    pub created_at: String,
}

/// Validates a monetary value: at most 2 fractional digits and 15 significant
/// digits. Returns the value rescaled to exactly 2 decimal places.
pub fn check_money(field: &str, value: Decimal, allow_negative: bool) -> Result<Decimal> {
    if !allow_negative && value.is_sign_negative() && !value.is_zero() {
        return Err(LedgerError::invalid(format!(
            "{} must not be negative (got {})",
            field, value
        )));
    }
    let normalized = value.normalize();
    if normalized.scale() > 2 {
        return Err(LedgerError::invalid(format!(
            "{} has more than 2 decimal places (got {})",
            field, value
        )));
    }
    if normalized.abs() >= Decimal::from(10_000_000_000_000_i64) {
        return Err(LedgerError::invalid(format!(
            "{} exceeds 15 significant digits (got {})",
            field, value
        )));
    }
    let mut out = normalized;
    out.rescale(2);
    Ok(out)
}

/// Reads a decimal stored as TEXT.
pub(crate) fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
