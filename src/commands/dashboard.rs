// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::dashboard::summarize;
use crate::utils::{maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

pub fn handle(conn: &Connection, owner_id: i64, today: NaiveDate, m: &clap::ArgMatches) -> Result<()> {
    let as_of = match m.get_one::<String>("as-of") {
        Some(d) => parse_date(d)?,
        None => today,
    };
    let summary = summarize(conn, owner_id, as_of)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &summary)? {
        return Ok(());
    }

    println!(
        "{}",
        pretty_table(
            &["Total balance", "Income (month)", "Expenses (month)"],
            vec![vec![
                format!("{:.2}", summary.total_balance),
                format!("{:.2}", summary.month_income),
                format!("{:.2}", summary.month_expenses),
            ]],
        )
    );

    let recent = summary
        .recent_transactions
        .iter()
        .map(|v| {
            vec![
                v.transaction.date.to_string(),
                v.account_name.clone(),
                v.category_name.clone(),
                v.transaction.transaction_type.to_string(),
                format!("{:.2}", v.transaction.amount),
                v.transaction.description.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Account", "Category", "Type", "Amount", "Description"], recent)
    );

    let spending = summary
        .category_spending
        .iter()
        .map(|c| vec![c.category.clone(), format!("{:.2}", c.amount)])
        .collect();
    println!("{}", pretty_table(&["Category", "Spent (month)"], spending));

    let monthly = summary
        .monthly
        .iter()
        .map(|row| {
            vec![
                format!("{} ({})", row.label, row.month),
                format!("{:.2}", row.income),
                format!("{:.2}", row.expenses),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Month", "Income", "Expenses"], monthly));
    Ok(())
}
