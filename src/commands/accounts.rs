// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result as LedgerResult};
use crate::models::{Account, AccountType, DEFAULT_ACCOUNT_COLOR};
use crate::store::LedgerStore;
use crate::utils::{fmt_money, id_for_account, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;

/// Client-editable account fields. The balance is not among them.
#[derive(Debug, Clone)]
pub struct AccountFields {
    pub name: String,
    pub account_type: AccountType,
    pub account_number: Option<String>,
    pub color: String,
}

pub fn handle(conn: &Connection, owner_id: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let fields = AccountFields {
                name: sub.get_one::<String>("name").unwrap().to_string(),
                account_type: sub.get_one::<String>("type").unwrap().parse()?,
                account_number: sub.get_one::<String>("number").cloned(),
                color: sub
                    .get_one::<String>("color")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_ACCOUNT_COLOR.to_string()),
            };
            let acct = create_account(conn, owner_id, &fields)?;
            println!("Added account '{}' ({})", acct.name, acct.account_type);
        }
        Some(("list", sub)) => {
            let accounts = conn.list_accounts(owner_id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                let rows = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.name.clone(),
                            a.account_type.to_string(),
                            fmt_money(&a.balance),
                            a.account_number.clone().unwrap_or_default(),
                            a.created_at.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Name", "Type", "Balance", "Number", "Created"], rows)
                );
            }
        }
        Some(("edit", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_account(conn, owner_id, name)?;
            let current = conn.get_account(owner_id, id)?;
            let fields = AccountFields {
                name: sub
                    .get_one::<String>("new-name")
                    .cloned()
                    .unwrap_or(current.name),
                account_type: match sub.get_one::<String>("type") {
                    Some(t) => t.parse()?,
                    None => current.account_type,
                },
                account_number: if sub.get_flag("clear-number") {
                    None
                } else {
                    sub.get_one::<String>("number")
                        .cloned()
                        .or(current.account_number)
                },
                color: sub.get_one::<String>("color").cloned().unwrap_or(current.color),
            };
            let acct = update_account(conn, owner_id, id, &fields)?;
            println!("Updated account '{}'", acct.name);
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_account(conn, owner_id, name)?;
            delete_account(conn, owner_id, id)?;
            println!("Removed account '{}' and its transactions", name.trim());
        }
        _ => {}
    }
    Ok(())
}

fn check_fields(fields: &AccountFields) -> LedgerResult<String> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("account name is required"));
    }
    Ok(name.to_string())
}

/// New accounts always start at a zero balance.
pub fn create_account(
    conn: &Connection,
    owner_id: i64,
    fields: &AccountFields,
) -> LedgerResult<Account> {
    let name = check_fields(fields)?;
    conn.execute(
        "INSERT INTO accounts(owner_id, name, account_type, account_number, color)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            owner_id,
            name,
            fields.account_type,
            fields.account_number,
            fields.color
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(owner_id, account_id = id, "account created");
    conn.get_account(owner_id, id)
}

pub fn update_account(
    conn: &Connection,
    owner_id: i64,
    id: i64,
    fields: &AccountFields,
) -> LedgerResult<Account> {
    let name = check_fields(fields)?;
    let n = conn.execute(
        "UPDATE accounts SET name=?1, account_type=?2, account_number=?3, color=?4,
                updated_at=datetime('now')
         WHERE id=?5 AND owner_id=?6",
        params![
            name,
            fields.account_type,
            fields.account_number,
            fields.color,
            id,
            owner_id
        ],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("account", id));
    }
    info!(owner_id, account_id = id, "account updated");
    conn.get_account(owner_id, id)
}

/// Transactions of the account go with it (ON DELETE CASCADE).
pub fn delete_account(conn: &Connection, owner_id: i64, id: i64) -> LedgerResult<()> {
    let n = conn.execute(
        "DELETE FROM accounts WHERE id=?1 AND owner_id=?2",
        params![id, owner_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("account", id));
    }
    info!(owner_id, account_id = id, "account deleted");
    Ok(())
}
