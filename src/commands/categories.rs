// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result as LedgerResult};
use crate::ledger;
use crate::models::{Category, CategoryType, DEFAULT_CATEGORY_COLOR};
use crate::store::LedgerStore;
use crate::utils::{id_for_category, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;

#[derive(Debug, Clone)]
pub struct CategoryFields {
    pub name: String,
    pub category_type: CategoryType,
    pub color: String,
}

pub fn handle(conn: &mut Connection, owner_id: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let fields = CategoryFields {
                name: sub.get_one::<String>("name").unwrap().to_string(),
                category_type: sub.get_one::<String>("type").unwrap().parse()?,
                color: sub
                    .get_one::<String>("color")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            };
            let cat = create_category(conn, owner_id, &fields)?;
            println!("Added category '{}' ({})", cat.name, cat.category_type);
        }
        Some(("list", sub)) => {
            let kind = match sub.get_one::<String>("type") {
                Some(t) => Some(t.parse::<CategoryType>()?),
                None => None,
            };
            let cats = conn.list_categories(owner_id, kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let rows = cats
                    .into_iter()
                    .map(|c| vec![c.name, c.category_type.to_string(), c.color])
                    .collect();
                println!("{}", pretty_table(&["Category", "Type", "Color"], rows));
            }
        }
        Some(("edit", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_category(conn, owner_id, name)?;
            let current = conn.get_category(owner_id, id)?;
            let fields = CategoryFields {
                name: sub
                    .get_one::<String>("new-name")
                    .cloned()
                    .unwrap_or(current.name),
                category_type: match sub.get_one::<String>("type") {
                    Some(t) => t.parse()?,
                    None => current.category_type,
                },
                color: sub.get_one::<String>("color").cloned().unwrap_or(current.color),
            };
            let cat = update_category(conn, owner_id, id, &fields)?;
            println!("Updated category '{}'", cat.name);
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_category(conn, owner_id, name)?;
            let removed = delete_category(conn, owner_id, id)?;
            println!(
                "Removed category '{}' and {} transaction(s)",
                name.trim(),
                removed
            );
        }
        _ => {}
    }
    Ok(())
}

fn check_fields(fields: &CategoryFields) -> LedgerResult<String> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("category name is required"));
    }
    Ok(name.to_string())
}

pub fn create_category(
    conn: &Connection,
    owner_id: i64,
    fields: &CategoryFields,
) -> LedgerResult<Category> {
    let name = check_fields(fields)?;
    conn.execute(
        "INSERT INTO categories(owner_id, name, category_type, color) VALUES (?1, ?2, ?3, ?4)",
        params![owner_id, name, fields.category_type, fields.color],
    )?;
    let id = conn.last_insert_rowid();
    info!(owner_id, category_id = id, "category created");
    conn.get_category(owner_id, id)
}

/// Changing the type does not reclassify existing transactions: their effect
/// follows their own transaction_type.
pub fn update_category(
    conn: &Connection,
    owner_id: i64,
    id: i64,
    fields: &CategoryFields,
) -> LedgerResult<Category> {
    let name = check_fields(fields)?;
    let n = conn.execute(
        "UPDATE categories SET name=?1, category_type=?2, color=?3 WHERE id=?4 AND owner_id=?5",
        params![name, fields.category_type, fields.color, id, owner_id],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("category", id));
    }
    conn.get_category(owner_id, id)
}

/// Removes the category's transactions through the mutator (reversing each
/// effect), then the category and its budgets, all in one unit.
pub fn delete_category(conn: &mut Connection, owner_id: i64, id: i64) -> LedgerResult<usize> {
    ledger::atomically(conn, |store| {
        store.get_category(owner_id, id)?;
        let removed = ledger::delete_category_transactions_in(store, owner_id, id)?;
        store.execute(
            "DELETE FROM categories WHERE id=?1 AND owner_id=?2",
            params![id, owner_id],
        )?;
        info!(owner_id, category_id = id, removed, "category deleted");
        Ok(removed)
    })
}
