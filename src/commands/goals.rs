// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregates::goal_percentage;
use crate::error::{LedgerError, OptionalRow, Result as LedgerResult};
use crate::models::{Goal, check_money, decimal_at};
use crate::utils::{fmt_money, fmt_percent, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct GoalFields {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalRow {
    #[serde(flatten)]
    pub goal: Goal,
    pub percentage_complete: Decimal,
}

pub fn handle(conn: &Connection, owner_id: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let fields = GoalFields {
                name: sub.get_one::<String>("name").unwrap().to_string(),
                target_amount: parse_decimal(sub.get_one::<String>("target").unwrap())?,
                current_amount: parse_decimal(sub.get_one::<String>("current").unwrap())?,
                target_date: parse_date(sub.get_one::<String>("date").unwrap())?,
            };
            let g = create_goal(conn, owner_id, &fields)?;
            println!("Added goal {} '{}'", g.id, g.name);
        }
        Some(("list", sub)) => {
            let data = list_goals(conn, owner_id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        vec![
                            r.goal.id.to_string(),
                            r.goal.name.clone(),
                            fmt_money(&r.goal.current_amount),
                            fmt_money(&r.goal.target_amount),
                            fmt_percent(&r.percentage_complete),
                            r.goal.target_date.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Goal", "Saved", "Target", "Complete", "By"], rows)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let cur = get_goal(conn, owner_id, id)?;
            let fields = GoalFields {
                name: sub.get_one::<String>("name").cloned().unwrap_or(cur.name),
                target_amount: match sub.get_one::<String>("target") {
                    Some(v) => parse_decimal(v)?,
                    None => cur.target_amount,
                },
                current_amount: match sub.get_one::<String>("current") {
                    Some(v) => parse_decimal(v)?,
                    None => cur.current_amount,
                },
                target_date: match sub.get_one::<String>("date") {
                    Some(d) => parse_date(d)?,
                    None => cur.target_date,
                },
            };
            update_goal(conn, owner_id, id, &fields)?;
            println!("Updated goal {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_goal(conn, owner_id, id)?;
            println!("Removed goal {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn check_fields(fields: &GoalFields) -> LedgerResult<(String, Decimal, Decimal)> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("goal name is required"));
    }
    Ok((
        name.to_string(),
        check_money("target amount", fields.target_amount, false)?,
        // Tracked by hand; may be negative.
        check_money("current amount", fields.current_amount, true)?,
    ))
}

fn goal_from_row(r: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: r.get(0)?,
        owner_id: r.get(1)?,
        name: r.get(2)?,
        target_amount: decimal_at(r, 3)?,
        current_amount: decimal_at(r, 4)?,
        target_date: r.get(5)?,
        created_at: r.get(6)?,
    })
}

pub fn get_goal(conn: &Connection, owner_id: i64, id: i64) -> LedgerResult<Goal> {
    conn.query_row(
        "SELECT id, owner_id, name, target_amount, current_amount, target_date, created_at
         FROM goals WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
        goal_from_row,
    )
    .or_not_found("goal", id)
}

pub fn create_goal(conn: &Connection, owner_id: i64, fields: &GoalFields) -> LedgerResult<Goal> {
    let (name, target, current) = check_fields(fields)?;
    conn.execute(
        "INSERT INTO goals(owner_id, name, target_amount, current_amount, target_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            owner_id,
            name,
            target.to_string(),
            current.to_string(),
            fields.target_date
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(owner_id, goal_id = id, "goal created");
    get_goal(conn, owner_id, id)
}

pub fn update_goal(
    conn: &Connection,
    owner_id: i64,
    id: i64,
    fields: &GoalFields,
) -> LedgerResult<Goal> {
    let (name, target, current) = check_fields(fields)?;
    let n = conn.execute(
        "UPDATE goals SET name=?1, target_amount=?2, current_amount=?3, target_date=?4
         WHERE id=?5 AND owner_id=?6",
        params![
            name,
            target.to_string(),
            current.to_string(),
            fields.target_date,
            id,
            owner_id
        ],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("goal", id));
    }
    get_goal(conn, owner_id, id)
}

pub fn delete_goal(conn: &Connection, owner_id: i64, id: i64) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM goals WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("goal", id));
    }
    Ok(())
}

/// Goals by target date with their completion percentage.
pub fn list_goals(conn: &Connection, owner_id: i64) -> LedgerResult<Vec<GoalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, target_amount, current_amount, target_date, created_at
         FROM goals WHERE owner_id=?1 ORDER BY target_date, id",
    )?;
    let goals = stmt
        .query_map(params![owner_id], goal_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(goals
        .into_iter()
        .map(|goal| GoalRow {
            percentage_complete: goal_percentage(&goal),
            goal,
        })
        .collect())
}
