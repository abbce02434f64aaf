// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger store: the persistence contract the mutator, the aggregates and the
//! dashboard are written against, and its SQLite implementation.
//!
//! Every method takes the owner explicitly; a row owned by someone else is
//! reported as `NotFound`.

use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use rusqlite::{Connection, Row, ToSql, params};
use tracing::debug;

use crate::error::{LedgerError, OptionalRow, Result};
use crate::models::{Account, Category, CategoryType, Transaction, TransactionType, decimal_at};

pub trait LedgerStore {
    fn get_account(&self, owner_id: i64, id: i64) -> Result<Account>;
    fn save_account(&self, account: &Account) -> Result<()>;
    fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>>;
    fn get_category(&self, owner_id: i64, id: i64) -> Result<Category>;
    fn list_categories(&self, owner_id: i64, kind: Option<CategoryType>) -> Result<Vec<Category>>;
    fn get_transaction(&self, owner_id: i64, id: i64) -> Result<Transaction>;
    /// Inserts when `tx.id == 0`, otherwise replaces the stored row. Returns the id.
    fn save_transaction(&self, tx: &Transaction) -> Result<i64>;
    fn delete_transaction(&self, owner_id: i64, id: i64) -> Result<()>;
    /// Matching transactions, newest date first, ties broken by descending id.
    fn query_transactions(&self, owner_id: i64, filter: &TransactionFilter)
    -> Result<Vec<Transaction>>;
}

/// Named date-range buckets accepted by the list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    All,
    /// Since the 1st of the current month.
    Month,
    /// Since 90 days ago.
    Quarter,
    /// Since January 1st of the current year.
    Year,
}

impl DateRange {
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateRange::All => None,
            DateRange::Month => today.with_day(1),
            DateRange::Quarter => today.checked_sub_days(Days::new(90)),
            DateRange::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        }
    }
}

impl FromStr for DateRange {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(DateRange::All),
            "month" => Ok(DateRange::Month),
            "quarter" => Ok(DateRange::Quarter),
            "year" => Ok(DateRange::Year),
            other => Err(LedgerError::invalid(format!("unknown date range '{}'", other))),
        }
    }
}

/// Conjunctive transaction filter. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn with_range(mut self, range: DateRange, today: NaiveDate) -> Self {
        if let Some(start) = range.start(today) {
            self.since = Some(start);
        }
        self
    }

    pub fn between(since: NaiveDate, until: NaiveDate) -> Self {
        TransactionFilter {
            since: Some(since),
            until: Some(until),
            ..Default::default()
        }
    }

    pub fn of_type(mut self, kind: TransactionType) -> Self {
        self.transaction_type = Some(kind);
        self
    }

    /// Same predicate as the SQL query, minus the limit.
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.account_id.is_none_or(|a| tx.account_id == a)
            && self.category_id.is_none_or(|c| tx.category_id == c)
            && self.transaction_type.is_none_or(|t| tx.transaction_type == t)
            && self.since.is_none_or(|d| tx.date >= d)
            && self.until.is_none_or(|d| tx.date <= d)
    }
}

const ACCOUNT_COLS: &str = "id, owner_id, name, account_type, balance, account_number, color, created_at, updated_at";
const CATEGORY_COLS: &str = "id, owner_id, name, category_type, color, created_at";
const TRANSACTION_COLS: &str = "id, owner_id, account_id, category_id, amount, transaction_type, description, date, payment_method, notes, created_at, updated_at";

pub(crate) fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        name: r.get(2)?,
        account_type: r.get(3)?,
        balance: decimal_at(r, 4)?,
        account_number: r.get(5)?,
        color: r.get(6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
    })
}

pub(crate) fn category_from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        name: r.get(2)?,
        category_type: r.get(3)?,
        color: r.get(4)?,
        created_at: r.get(5)?,
    })
}

pub(crate) fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        account_id: r.get(2)?,
        category_id: r.get(3)?,
        amount: decimal_at(r, 4)?,
        transaction_type: r.get(5)?,
        description: r.get(6)?,
        date: r.get(7)?,
        payment_method: r.get(8)?,
        notes: r.get(9)?,
        created_at: r.get(10)?,
        updated_at: r.get(11)?,
    })
}

/// Appends the filter's conditions, the newest-first ordering and the limit to
/// a query over `transactions`. `prefix` qualifies the columns in joins (`"t."`).
pub(crate) fn push_filter(
    sql: &mut String,
    args: &mut Vec<Box<dyn ToSql>>,
    prefix: &str,
    filter: &TransactionFilter,
) {
    if let Some(account_id) = filter.account_id {
        sql.push_str(&format!(" AND {}account_id=?", prefix));
        args.push(Box::new(account_id));
    }
    if let Some(category_id) = filter.category_id {
        sql.push_str(&format!(" AND {}category_id=?", prefix));
        args.push(Box::new(category_id));
    }
    if let Some(kind) = filter.transaction_type {
        sql.push_str(&format!(" AND {}transaction_type=?", prefix));
        args.push(Box::new(kind));
    }
    if let Some(since) = filter.since {
        sql.push_str(&format!(" AND {}date>=?", prefix));
        args.push(Box::new(since));
    }
    if let Some(until) = filter.until {
        sql.push_str(&format!(" AND {}date<=?", prefix));
        args.push(Box::new(until));
    }
    sql.push_str(&format!(" ORDER BY {p}date DESC, {p}id DESC", p = prefix));
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        args.push(Box::new(limit as i64));
    }
}

impl LedgerStore for Connection {
    fn get_account(&self, owner_id: i64, id: i64) -> Result<Account> {
        self.query_row(
            &format!("SELECT {} FROM accounts WHERE id=?1 AND owner_id=?2", ACCOUNT_COLS),
            params![id, owner_id],
            account_from_row,
        )
        .or_not_found("account", id)
    }

    fn save_account(&self, account: &Account) -> Result<()> {
        let n = self.execute(
            "UPDATE accounts SET name=?1, account_type=?2, balance=?3, account_number=?4, color=?5,
                    updated_at=datetime('now')
             WHERE id=?6 AND owner_id=?7",
            params![
                account.name,
                account.account_type,
                account.balance.to_string(),
                account.account_number,
                account.color,
                account.id,
                account.owner_id
            ],
        )?;
        if n == 0 {
            return Err(LedgerError::not_found("account", account.id));
        }
        Ok(())
    }

    fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {} FROM accounts WHERE owner_id=?1 ORDER BY created_at DESC, id DESC",
            ACCOUNT_COLS
        ))?;
        let rows = stmt
            .query_map(params![owner_id], account_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn get_category(&self, owner_id: i64, id: i64) -> Result<Category> {
        self.query_row(
            &format!("SELECT {} FROM categories WHERE id=?1 AND owner_id=?2", CATEGORY_COLS),
            params![id, owner_id],
            category_from_row,
        )
        .or_not_found("category", id)
    }

    fn list_categories(&self, owner_id: i64, kind: Option<CategoryType>) -> Result<Vec<Category>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {} FROM categories WHERE owner_id=?1 AND (?2 IS NULL OR category_type=?2)
             ORDER BY name",
            CATEGORY_COLS
        ))?;
        let rows = stmt
            .query_map(params![owner_id, kind], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn get_transaction(&self, owner_id: i64, id: i64) -> Result<Transaction> {
        self.query_row(
            &format!(
                "SELECT {} FROM transactions WHERE id=?1 AND owner_id=?2",
                TRANSACTION_COLS
            ),
            params![id, owner_id],
            transaction_from_row,
        )
        .or_not_found("transaction", id)
    }

    fn save_transaction(&self, tx: &Transaction) -> Result<i64> {
        if tx.id == 0 {
            self.execute(
                "INSERT INTO transactions(owner_id, account_id, category_id, amount, transaction_type,
                                          description, date, payment_method, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    tx.owner_id,
                    tx.account_id,
                    tx.category_id,
                    tx.amount.to_string(),
                    tx.transaction_type,
                    tx.description,
                    tx.date,
                    tx.payment_method,
                    tx.notes
                ],
            )?;
            return Ok(self.last_insert_rowid());
        }
        let n = self.execute(
            "UPDATE transactions SET account_id=?1, category_id=?2, amount=?3, transaction_type=?4,
                    description=?5, date=?6, payment_method=?7, notes=?8, updated_at=datetime('now')
             WHERE id=?9 AND owner_id=?10",
            params![
                tx.account_id,
                tx.category_id,
                tx.amount.to_string(),
                tx.transaction_type,
                tx.description,
                tx.date,
                tx.payment_method,
                tx.notes,
                tx.id,
                tx.owner_id
            ],
        )?;
        if n == 0 {
            return Err(LedgerError::not_found("transaction", tx.id));
        }
        Ok(tx.id)
    }

    fn delete_transaction(&self, owner_id: i64, id: i64) -> Result<()> {
        let n = self.execute(
            "DELETE FROM transactions WHERE id=?1 AND owner_id=?2",
            params![id, owner_id],
        )?;
        if n == 0 {
            return Err(LedgerError::not_found("transaction", id));
        }
        Ok(())
    }

    fn query_transactions(
        &self,
        owner_id: i64,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {} FROM transactions WHERE owner_id=?", TRANSACTION_COLS);
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(owner_id)];
        push_filter(&mut sql, &mut args, "", filter);
        debug!(owner_id, ?filter, "querying transactions");

        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), transaction_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_range_buckets() {
        let today = d(2024, 5, 17);
        assert_eq!(DateRange::All.start(today), None);
        assert_eq!(DateRange::Month.start(today), Some(d(2024, 5, 1)));
        assert_eq!(DateRange::Quarter.start(today), Some(d(2024, 2, 17)));
        assert_eq!(DateRange::Year.start(today), Some(d(2024, 1, 1)));
    }

    #[test]
    fn date_range_parses_names() {
        assert_eq!("all".parse::<DateRange>().unwrap(), DateRange::All);
        assert_eq!("Quarter".parse::<DateRange>().unwrap(), DateRange::Quarter);
        assert!("fortnight".parse::<DateRange>().is_err());
    }

    #[test]
    fn filter_clauses_follow_prefix() {
        let filter = TransactionFilter {
            account_id: Some(3),
            limit: Some(5),
            ..TransactionFilter::between(d(2024, 1, 1), d(2024, 1, 31))
        };
        let mut sql = String::from("SELECT id FROM transactions t WHERE t.owner_id=?");
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(1_i64)];
        push_filter(&mut sql, &mut args, "t.", &filter);
        assert_eq!(
            sql,
            "SELECT id FROM transactions t WHERE t.owner_id=? AND t.account_id=? \
             AND t.date>=? AND t.date<=? ORDER BY t.date DESC, t.id DESC LIMIT ?"
        );
        assert_eq!(args.len(), 5);
    }

    #[test]
    fn range_only_sets_lower_bound() {
        let f = TransactionFilter::default().with_range(DateRange::Month, d(2024, 5, 17));
        assert_eq!(f.since, Some(d(2024, 5, 1)));
        assert_eq!(f.until, None);
        let f = TransactionFilter::default().with_range(DateRange::All, d(2024, 5, 17));
        assert_eq!(f.since, None);
    }
}
