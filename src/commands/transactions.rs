// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result as LedgerResult;
use crate::ledger;
use crate::models::{NewTransaction, PaymentMethod, TransactionType, TransactionView};
use crate::store::{DateRange, LedgerStore, TransactionFilter, push_filter, transaction_from_row};
use crate::utils::{
    fmt_money, id_for_account, id_for_category, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, ToSql};
use tracing::debug;

pub fn handle(
    conn: &mut Connection,
    owner_id: i64,
    today: NaiveDate,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner_id, today, sub)?,
        Some(("list", sub)) => list(conn, owner_id, today, sub)?,
        Some(("edit", sub)) => edit(conn, owner_id, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let old = ledger::delete_transaction(conn, owner_id, id)?;
            println!("Deleted transaction {} ({} {})", id, old.transaction_type, old.amount);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, owner_id: i64, today: NaiveDate, sub: &clap::ArgMatches) -> Result<()> {
    let new = NewTransaction {
        account_id: id_for_account(conn, owner_id, sub.get_one::<String>("account").unwrap())?,
        category_id: id_for_category(conn, owner_id, sub.get_one::<String>("category").unwrap())?,
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        transaction_type: sub.get_one::<String>("type").unwrap().parse()?,
        description: sub.get_one::<String>("description").unwrap().to_string(),
        date: match sub.get_one::<String>("date") {
            Some(d) => parse_date(d)?,
            None => today,
        },
        payment_method: sub.get_one::<String>("method").unwrap().parse()?,
        notes: sub.get_one::<String>("notes").cloned(),
    };
    let tx = ledger::create_transaction(conn, owner_id, &new)?;
    let balance = conn.get_account(owner_id, tx.account_id)?.balance;
    println!(
        "Recorded {} {} on {} (id {}); balance now {}",
        tx.transaction_type,
        tx.amount,
        tx.date,
        tx.id,
        fmt_money(&balance)
    );
    Ok(())
}

/// Unspecified fields keep their stored values; the mutator still reverses and
/// re-applies the full transaction.
fn edit(conn: &mut Connection, owner_id: i64, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let cur = conn.get_transaction(owner_id, id)?;
    let new = NewTransaction {
        account_id: match sub.get_one::<String>("account") {
            Some(a) => id_for_account(conn, owner_id, a)?,
            None => cur.account_id,
        },
        category_id: match sub.get_one::<String>("category") {
            Some(c) => id_for_category(conn, owner_id, c)?,
            None => cur.category_id,
        },
        amount: match sub.get_one::<String>("amount") {
            Some(a) => parse_decimal(a)?,
            None => cur.amount,
        },
        transaction_type: match sub.get_one::<String>("type") {
            Some(t) => t.parse::<TransactionType>()?,
            None => cur.transaction_type,
        },
        description: sub
            .get_one::<String>("description")
            .cloned()
            .unwrap_or(cur.description),
        date: match sub.get_one::<String>("date") {
            Some(d) => parse_date(d)?,
            None => cur.date,
        },
        payment_method: match sub.get_one::<String>("method") {
            Some(p) => p.parse::<PaymentMethod>()?,
            None => cur.payment_method,
        },
        notes: if sub.get_flag("clear-notes") {
            None
        } else {
            sub.get_one::<String>("notes").cloned().or(cur.notes)
        },
    };
    let tx = ledger::update_transaction(conn, owner_id, id, &new)?;
    println!("Updated transaction {} ({} {})", tx.id, tx.transaction_type, tx.amount);
    Ok(())
}

fn list(conn: &Connection, owner_id: i64, today: NaiveDate, sub: &clap::ArgMatches) -> Result<()> {
    let filter = filter_from_matches(conn, owner_id, today, sub)?;
    let data = list_transactions(conn, owner_id, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|v| {
                let t = &v.transaction;
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    v.account_name.clone(),
                    v.category_name.clone(),
                    t.transaction_type.to_string(),
                    fmt_money(&t.amount),
                    t.description.clone(),
                    t.payment_method.to_string(),
                    t.notes.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Account", "Category", "Type", "Amount", "Description", "Method", "Notes"],
                rows,
            )
        );
    }
    Ok(())
}

/// Builds the list filter from `tx list` arguments. `all` means unfiltered.
pub fn filter_from_matches(
    conn: &Connection,
    owner_id: i64,
    today: NaiveDate,
    sub: &clap::ArgMatches,
) -> Result<TransactionFilter> {
    let wanted = |name: &str| {
        sub.get_one::<String>(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
    };
    let mut filter = TransactionFilter::default();
    if let Some(acct) = wanted("account") {
        filter.account_id = Some(id_for_account(conn, owner_id, &acct)?);
    }
    if let Some(cat) = wanted("category") {
        filter.category_id = Some(id_for_category(conn, owner_id, &cat)?);
    }
    if let Some(kind) = wanted("type") {
        filter.transaction_type = Some(kind.parse()?);
    }
    if let Some(range) = sub.get_one::<String>("range") {
        filter = filter.with_range(range.parse::<DateRange>()?, today);
    }
    filter.limit = sub.get_one::<usize>("limit").copied();
    Ok(filter)
}

/// Transactions with their account and category display fields, newest first.
pub fn list_transactions(
    conn: &Connection,
    owner_id: i64,
    filter: &TransactionFilter,
) -> LedgerResult<Vec<TransactionView>> {
    let mut sql = String::from(
        "SELECT t.id, t.owner_id, t.account_id, t.category_id, t.amount, t.transaction_type,
                t.description, t.date, t.payment_method, t.notes, t.created_at, t.updated_at,
                a.name, c.name, c.color
         FROM transactions t
         JOIN accounts a ON t.account_id=a.id
         JOIN categories c ON t.category_id=c.id
         WHERE t.owner_id=?",
    );
    let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(owner_id)];

    push_filter(&mut sql, &mut args, "t.", filter);
    debug!(owner_id, ?filter, "listing transactions");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), |r| {
            Ok(TransactionView {
                transaction: transaction_from_row(r)?,
                account_name: r.get(12)?,
                category_name: r.get(13)?,
                category_color: r.get(14)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
