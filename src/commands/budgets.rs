// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregates::budget_status;
use crate::error::{LedgerError, OptionalRow, Result as LedgerResult};
use crate::models::{Budget, check_money, decimal_at};
use crate::store::LedgerStore;
use crate::utils::{
    fmt_money, fmt_percent, id_for_category, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct BudgetFields {
    pub category_id: i64,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// A budget with its display fields and the figures derived from the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetRow {
    #[serde(flatten)]
    pub budget: Budget,
    pub category_name: String,
    pub category_color: String,
    pub spent_amount: Decimal,
    pub remaining_amount: Decimal,
    pub percentage_used: Decimal,
}

pub fn handle(conn: &Connection, owner_id: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let fields = BudgetFields {
                category_id: id_for_category(conn, owner_id, sub.get_one::<String>("category").unwrap())?,
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                start_date: parse_date(sub.get_one::<String>("start").unwrap())?,
                end_date: sub.get_one::<String>("end").map(|d| parse_date(d)).transpose()?,
            };
            let b = create_budget(conn, owner_id, &fields)?;
            println!("Added budget {} of {} from {}", b.id, fmt_money(&b.amount), b.start_date);
        }
        Some(("list", sub)) => list(conn, owner_id, sub)?,
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let cur = get_budget(conn, owner_id, id)?;
            let fields = BudgetFields {
                category_id: match sub.get_one::<String>("category") {
                    Some(c) => id_for_category(conn, owner_id, c)?,
                    None => cur.category_id,
                },
                amount: match sub.get_one::<String>("amount") {
                    Some(a) => parse_decimal(a)?,
                    None => cur.amount,
                },
                start_date: match sub.get_one::<String>("start") {
                    Some(d) => parse_date(d)?,
                    None => cur.start_date,
                },
                end_date: if sub.get_flag("open-ended") {
                    None
                } else {
                    match sub.get_one::<String>("end") {
                        Some(d) => Some(parse_date(d)?),
                        None => cur.end_date,
                    }
                },
            };
            update_budget(conn, owner_id, id, &fields)?;
            println!("Updated budget {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_budget(conn, owner_id, id)?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, owner_id: i64, sub: &clap::ArgMatches) -> Result<()> {
    let data = list_budgets(conn, owner_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.budget.id.to_string(),
                    r.category_name.clone(),
                    fmt_money(&r.budget.amount),
                    fmt_money(&r.spent_amount),
                    fmt_money(&r.remaining_amount),
                    fmt_percent(&r.percentage_used),
                    r.budget.start_date.to_string(),
                    r.budget
                        .end_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "open".into()),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Category", "Budget", "Spent", "Remaining", "Used", "Start", "End"],
                rows
            )
        );
    }
    Ok(())
}

fn check_fields(conn: &Connection, owner_id: i64, fields: &BudgetFields) -> LedgerResult<Decimal> {
    conn.get_category(owner_id, fields.category_id)?;
    if let Some(end) = fields.end_date {
        if end < fields.start_date {
            return Err(LedgerError::invalid(format!(
                "end date {} is before start date {}",
                end, fields.start_date
            )));
        }
    }
    check_money("budget amount", fields.amount, false)
}

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        category_id: r.get(2)?,
        amount: decimal_at(r, 3)?,
        start_date: r.get(4)?,
        end_date: r.get(5)?,
        created_at: r.get(6)?,
    })
}

pub fn get_budget(conn: &Connection, owner_id: i64, id: i64) -> LedgerResult<Budget> {
    conn.query_row(
        "SELECT id, owner_id, category_id, amount, start_date, end_date, created_at
         FROM budgets WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
        budget_from_row,
    )
    .or_not_found("budget", id)
}

pub fn create_budget(conn: &Connection, owner_id: i64, fields: &BudgetFields) -> LedgerResult<Budget> {
    let amount = check_fields(conn, owner_id, fields)?;
    conn.execute(
        "INSERT INTO budgets(owner_id, category_id, amount, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            owner_id,
            fields.category_id,
            amount.to_string(),
            fields.start_date,
            fields.end_date
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(owner_id, budget_id = id, %amount, "budget created");
    get_budget(conn, owner_id, id)
}

pub fn update_budget(
    conn: &Connection,
    owner_id: i64,
    id: i64,
    fields: &BudgetFields,
) -> LedgerResult<Budget> {
    let amount = check_fields(conn, owner_id, fields)?;
    let n = conn.execute(
        "UPDATE budgets SET category_id=?1, amount=?2, start_date=?3, end_date=?4
         WHERE id=?5 AND owner_id=?6",
        params![
            fields.category_id,
            amount.to_string(),
            fields.start_date,
            fields.end_date,
            id,
            owner_id
        ],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("budget", id));
    }
    get_budget(conn, owner_id, id)
}

pub fn delete_budget(conn: &Connection, owner_id: i64, id: i64) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM budgets WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("budget", id));
    }
    Ok(())
}

/// Budgets ordered by category name, each with freshly computed spend figures.
pub fn list_budgets(conn: &Connection, owner_id: i64) -> LedgerResult<Vec<BudgetRow>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.owner_id, b.category_id, b.amount, b.start_date, b.end_date, b.created_at,
                c.name, c.color
         FROM budgets b JOIN categories c ON b.category_id=c.id
         WHERE b.owner_id=?1
         ORDER BY c.name, b.start_date",
    )?;
    let budgets = stmt
        .query_map(params![owner_id], |r| {
            Ok((budget_from_row(r)?, r.get::<_, String>(7)?, r.get::<_, String>(8)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(budgets.len());
    for (budget, category_name, category_color) in budgets {
        let status = budget_status(conn, &budget)?;
        out.push(BudgetRow {
            budget,
            category_name,
            category_color,
            spent_amount: status.spent,
            remaining_amount: status.remaining,
            percentage_used: status.percentage_used,
        });
    }
    Ok(out)
}
