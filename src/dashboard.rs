// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dashboard summary for one owner as of a given day.
//!
//! The report is assembled from several independent queries without a shared
//! snapshot. Under concurrent writes, e.g. the total balance and the month
//! income may reflect slightly different instants. Empty results are zeros;
//! store failures fail the whole report.
//!
//! Monetary values are converted to `f64` here because the report is for
//! display only.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::models::{CategoryType, Transaction, TransactionType, TransactionView};
use crate::store::{LedgerStore, TransactionFilter};
use crate::utils::{first_of_month, last_of_month};

pub const RECENT_TRANSACTIONS: usize = 5;
pub const TRAILING_MONTHS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub category: String,
    pub color: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotals {
    /// `YYYY-MM`
    pub month: String,
    /// Abbreviated month name, e.g. `Jan`.
    pub label: String,
    pub income: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_balance: f64,
    pub month_income: f64,
    pub month_expenses: f64,
    pub recent_transactions: Vec<TransactionView>,
    pub category_spending: Vec<CategorySpending>,
    /// Six complete months before the current one, oldest first.
    pub monthly: Vec<MonthTotals>,
}

pub fn summarize<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: i64,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    let accounts = store.list_accounts(owner_id)?;
    let total_balance: Decimal = accounts.iter().map(|a| a.balance).sum();

    let month_start = first_of_month(today);
    let month_to_date = TransactionFilter::between(month_start, today);
    let month_income = sum(store, owner_id, &month_to_date.clone().of_type(TransactionType::Income))?;
    let month_expenses = sum(store, owner_id, &month_to_date.clone().of_type(TransactionType::Expense))?;

    let categories = store.list_categories(owner_id, None)?;
    let recent = store.query_transactions(
        owner_id,
        &TransactionFilter {
            limit: Some(RECENT_TRANSACTIONS),
            ..Default::default()
        },
    )?;
    let account_names: HashMap<i64, &str> =
        accounts.iter().map(|a| (a.id, a.name.as_str())).collect();
    let category_display: HashMap<i64, (&str, &str)> = categories
        .iter()
        .map(|c| (c.id, (c.name.as_str(), c.color.as_str())))
        .collect();
    let recent_transactions = recent
        .into_iter()
        .map(|t| {
            let (category_name, category_color) =
                category_display.get(&t.category_id).copied().unwrap_or_default();
            TransactionView {
                account_name: account_names.get(&t.account_id).copied().unwrap_or_default().to_string(),
                category_name: category_name.to_string(),
                category_color: category_color.to_string(),
                transaction: t,
            }
        })
        .collect();

    let mut category_spending = Vec::new();
    for category in categories
        .iter()
        .filter(|c| c.category_type == CategoryType::Expense)
    {
        let filter = TransactionFilter {
            category_id: Some(category.id),
            ..month_to_date.clone().of_type(TransactionType::Expense)
        };
        let amount = sum(store, owner_id, &filter)?;
        if amount > Decimal::ZERO {
            category_spending.push(CategorySpending {
                category: category.name.clone(),
                color: category.color.clone(),
                amount: to_f64(amount),
            });
        }
    }

    let monthly = trailing_months(store, owner_id, today)?;
    debug!(owner_id, %today, %total_balance, "dashboard summarized");

    Ok(DashboardSummary {
        total_balance: to_f64(total_balance),
        month_income: to_f64(month_income),
        month_expenses: to_f64(month_expenses),
        recent_transactions,
        category_spending,
        monthly,
    })
}

/// Calendar month windows for the months before `today`'s month, oldest first.
pub fn trailing_windows(today: NaiveDate, months: usize) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::with_capacity(months);
    let mut end = first_of_month(today) - Days::new(1);
    for _ in 0..months {
        let start = first_of_month(end);
        windows.push((start, last_of_month(end)));
        end = start - Days::new(1);
    }
    windows.reverse();
    windows
}

fn trailing_months<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: i64,
    today: NaiveDate,
) -> Result<Vec<MonthTotals>> {
    let mut out = Vec::with_capacity(TRAILING_MONTHS);
    for (start, end) in trailing_windows(today, TRAILING_MONTHS) {
        let window = TransactionFilter::between(start, end);
        let income = sum(store, owner_id, &window.clone().of_type(TransactionType::Income))?;
        let expenses = sum(store, owner_id, &window.of_type(TransactionType::Expense))?;
        out.push(MonthTotals {
            month: start.format("%Y-%m").to_string(),
            label: start.format("%b").to_string(),
            income: to_f64(income),
            expenses: to_f64(expenses),
        });
    }
    Ok(out)
}

fn sum<S: LedgerStore + ?Sized>(store: &S, owner_id: i64, filter: &TransactionFilter) -> Result<Decimal> {
    Ok(store
        .query_transactions(owner_id, filter)?
        .iter()
        .map(|t: &Transaction| t.amount)
        .sum())
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or_default()
}
