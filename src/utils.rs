// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub const USER_ENV: &str = "PENNYLEDGER_USER";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn fmt_percent(d: &Decimal) -> String {
    format!("{:.1}%", d.round_dp(1))
}

pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d - Days::new(u64::from(d.day0()))
}

pub fn last_of_month(d: NaiveDate) -> NaiveDate {
    first_of_month(d) + Months::new(1) - Days::new(1)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_user(conn: &Connection, username: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE username=?1")?;
    let id: i64 = stmt
        .query_row(params![username.trim()], |r| r.get(0))
        .with_context(|| format!("User '{}' not found", username.trim()))?;
    Ok(id)
}

/// Owner for this invocation: `--user`, else `PENNYLEDGER_USER`.
pub fn resolve_owner(conn: &Connection, flag: Option<&String>) -> Result<i64> {
    let username = match flag {
        Some(u) => u.clone(),
        None => std::env::var(USER_ENV)
            .with_context(|| format!("No user selected; pass --user or set {}", USER_ENV))?,
    };
    id_for_user(conn, &username)
}

pub fn id_for_account(conn: &Connection, owner_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE owner_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner_id, name.trim()], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, owner_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE owner_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner_id, name.trim()], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_bounds_handle_short_months() {
        assert_eq!(first_of_month(d(2024, 2, 17)), d(2024, 2, 1));
        assert_eq!(last_of_month(d(2024, 2, 17)), d(2024, 2, 29));
        assert_eq!(last_of_month(d(2023, 2, 1)), d(2023, 2, 28));
        assert_eq!(last_of_month(d(2024, 12, 31)), d(2024, 12, 31));
        assert_eq!(last_of_month(d(2024, 4, 30)), d(2024, 4, 30));
    }

    #[test]
    fn money_formats_with_cents() {
        assert_eq!(fmt_money(&Decimal::new(7, 0)), "7.00");
        assert_eq!(fmt_percent(&Decimal::new(755, 1)), "75.5%");
    }

    #[test]
    fn parse_date_trims() {
        assert_eq!(parse_date(" 2024-01-05 ").unwrap(), d(2024, 1, 5));
        assert!(parse_date("05/01/2024").is_err());
    }
}
