// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result as LedgerResult};
use crate::models::User;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let ccy = sub.get_one::<String>("currency").unwrap();
            create_user(conn, name, ccy)?;
            println!("Added user '{}'", name.trim());
        }
        Some(("list", sub)) => {
            let users = list_users(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &users)? {
                let rows = users
                    .into_iter()
                    .map(|u| vec![u.username, u.preferred_currency, u.created_at])
                    .collect();
                println!("{}", pretty_table(&["User", "Currency", "Created"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn create_user(conn: &Connection, username: &str, currency: &str) -> LedgerResult<i64> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LedgerError::invalid("username is required"));
    }
    let currency = currency.trim().to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LedgerError::invalid(format!(
            "currency must be a 3-letter code (got '{}')",
            currency
        )));
    }
    conn.execute(
        "INSERT INTO users(username, preferred_currency) VALUES (?1, ?2)",
        params![username, currency],
    )?;
    let id = conn.last_insert_rowid();
    info!(user_id = id, username, "user created");
    Ok(id)
}

pub fn list_users(conn: &Connection) -> LedgerResult<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, preferred_currency, created_at FROM users ORDER BY username",
    )?;
    let users = stmt
        .query_map([], |r| {
            Ok(User {
                id: r.get(0)?,
                username: r.get(1)?,
                preferred_currency: r.get(2)?,
                created_at: r.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}
