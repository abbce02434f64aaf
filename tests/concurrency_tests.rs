// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::str::FromStr;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use pennyledger::commands::{
    accounts::{self, AccountFields},
    categories::{self, CategoryFields},
    users,
};
use pennyledger::db;
use pennyledger::error::LedgerError;
use pennyledger::ledger;
use pennyledger::models::{AccountType, CategoryType, NewTransaction, PaymentMethod, TransactionType};
use pennyledger::store::LedgerStore;
use rusqlite::TransactionBehavior;
use rust_decimal::Decimal;
use tempfile::tempdir;

struct Ids {
    owner: i64,
    account: i64,
    pay: i64,
    food: i64,
}

fn prepare(path: &std::path::Path) -> Ids {
    let conn = db::open_at(path).unwrap();
    let owner = users::create_user(&conn, "ana", "USD").unwrap();
    let account = accounts::create_account(
        &conn,
        owner,
        &AccountFields {
            name: "Shared".into(),
            account_type: AccountType::Checking,
            account_number: None,
            color: "#4299E1".into(),
        },
    )
    .unwrap()
    .id;
    let category = |name: &str, kind| {
        categories::create_category(
            &conn,
            owner,
            &CategoryFields {
                name: name.into(),
                category_type: kind,
                color: "#F56565".into(),
            },
        )
        .unwrap()
        .id
    };
    let pay = category("Pay", CategoryType::Income);
    let food = category("Food", CategoryType::Expense);
    Ids {
        owner,
        account,
        pay,
        food,
    }
}

fn entry(ids: &Ids, kind: TransactionType, amount: &str) -> NewTransaction {
    NewTransaction {
        account_id: ids.account,
        category_id: match kind {
            TransactionType::Income => ids.pay,
            TransactionType::Expense => ids.food,
        },
        amount: Decimal::from_str(amount).unwrap(),
        transaction_type: kind,
        description: "concurrent".into(),
        date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        payment_method: PaymentMethod::Mobile,
        notes: None,
    }
}

#[test]
fn parallel_writers_lose_no_updates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    let ids = prepare(&path);

    thread::scope(|s| {
        for worker in 0..4 {
            let path = path.clone();
            let ids = &ids;
            s.spawn(move || {
                let mut conn = db::open_at(&path).unwrap();
                for i in 0..25 {
                    let t = if (worker + i) % 5 == 0 {
                        entry(ids, TransactionType::Expense, "0.50")
                    } else {
                        entry(ids, TransactionType::Income, "1.25")
                    };
                    ledger::create_transaction(&mut conn, ids.owner, &t).unwrap();
                }
            });
        }
    });

    let conn = db::open_at(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 100);
    // 20 expenses and 80 incomes.
    let balance = conn.get_account(ids.owner, ids.account).unwrap().balance;
    assert_eq!(balance, Decimal::from_str("90.00").unwrap());
    assert_eq!(balance, ledger::replay_balance(&conn, ids.owner, ids.account).unwrap());
}

#[test]
fn held_write_lock_surfaces_as_conflict() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    let ids = prepare(&path);

    let mut holder = db::open_at(&path).unwrap();
    let mut waiter = db::open_at(&path).unwrap();
    waiter.busy_timeout(Duration::ZERO).unwrap();

    let guard = holder
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();
    let err = ledger::create_transaction(&mut waiter, ids.owner, &entry(&ids, TransactionType::Income, "5.00"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
    guard.rollback().unwrap();

    ledger::create_transaction(&mut waiter, ids.owner, &entry(&ids, TransactionType::Income, "5.00")).unwrap();
    assert_eq!(
        waiter.get_account(ids.owner, ids.account).unwrap().balance,
        Decimal::from_str("5.00").unwrap()
    );
}
