// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction mutator.
//!
//! Keeps `Account.balance` equal to the signed sum of the transactions posted
//! to the account. Every operation first reverses the stored effect (if any)
//! and then applies the new one; the `*_in` functions do that against any
//! [`LedgerStore`], while the public wrappers run them inside a single
//! `BEGIN IMMEDIATE` SQLite transaction so that the balance write and the
//! record write commit or roll back together and writers to the same database
//! are serialised.

use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionType, check_money};
use crate::store::{LedgerStore, TransactionFilter};

/// Signed contribution of a transaction to its account balance.
pub fn effect(kind: TransactionType, amount: Decimal) -> Decimal {
    match kind {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
    }
}

pub fn apply(balance: Decimal, kind: TransactionType, amount: Decimal) -> Decimal {
    balance + effect(kind, amount)
}

pub fn reverse(balance: Decimal, kind: TransactionType, amount: Decimal) -> Decimal {
    balance - effect(kind, amount)
}

/// A balance may be negative but must stay within the money precision.
fn bounded(balance: Decimal) -> Result<Decimal> {
    check_money("balance", balance, true)
}

/// Runs `op` inside one immediate transaction; any error rolls everything back.
pub fn atomically<T>(conn: &mut Connection, op: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match op(&*tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(e) => {
            warn!(error = %e, "ledger operation rolled back");
            Err(e)
        }
    }
}

pub fn create_transaction(
    conn: &mut Connection,
    owner_id: i64,
    new: &NewTransaction,
) -> Result<Transaction> {
    atomically(conn, |store| create_in(store, owner_id, new))
}

pub fn update_transaction(
    conn: &mut Connection,
    owner_id: i64,
    id: i64,
    new: &NewTransaction,
) -> Result<Transaction> {
    atomically(conn, |store| update_in(store, owner_id, id, new))
}

pub fn delete_transaction(conn: &mut Connection, owner_id: i64, id: i64) -> Result<Transaction> {
    atomically(conn, |store| delete_in(store, owner_id, id))
}

pub fn create_in<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: i64,
    new: &NewTransaction,
) -> Result<Transaction> {
    let new = new.validated()?;
    store.get_category(owner_id, new.category_id)?;

    let mut account = store.get_account(owner_id, new.account_id)?;
    account.balance = bounded(apply(account.balance, new.transaction_type, new.amount))?;
    store.save_account(&account)?;

    let id = store.save_transaction(&new.clone().into_transaction(0, owner_id))?;
    info!(
        owner_id,
        transaction_id = id,
        account_id = account.id,
        kind = %new.transaction_type,
        amount = %new.amount,
        balance = %account.balance,
        "transaction created"
    );
    store.get_transaction(owner_id, id)
}

/// Reverses the stored transaction against its stored account, then applies the
/// new values to the (possibly different) new account. Both phases always run.
pub fn update_in<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: i64,
    id: i64,
    new: &NewTransaction,
) -> Result<Transaction> {
    let new = new.validated()?;
    let old = store.get_transaction(owner_id, id)?;
    store.get_category(owner_id, new.category_id)?;
    // Fail before touching any balance when the target account is missing.
    store.get_account(owner_id, new.account_id)?;

    let mut old_account = store.get_account(owner_id, old.account_id)?;
    old_account.balance = bounded(reverse(old_account.balance, old.transaction_type, old.amount))?;
    store.save_account(&old_account)?;

    // Re-read so a same-account update sees the reversal.
    let mut new_account = store.get_account(owner_id, new.account_id)?;
    new_account.balance = bounded(apply(new_account.balance, new.transaction_type, new.amount))?;
    store.save_account(&new_account)?;

    store.save_transaction(&new.clone().into_transaction(id, owner_id))?;
    info!(
        owner_id,
        transaction_id = id,
        from_account = old.account_id,
        to_account = new_account.id,
        old_amount = %old.amount,
        new_amount = %new.amount,
        "transaction updated"
    );
    store.get_transaction(owner_id, id)
}

pub fn delete_in<S: LedgerStore + ?Sized>(store: &S, owner_id: i64, id: i64) -> Result<Transaction> {
    let old = store.get_transaction(owner_id, id)?;
    let mut account = store.get_account(owner_id, old.account_id)?;
    account.balance = bounded(reverse(account.balance, old.transaction_type, old.amount))?;
    store.save_account(&account)?;
    store.delete_transaction(owner_id, id)?;
    info!(
        owner_id,
        transaction_id = id,
        account_id = account.id,
        balance = %account.balance,
        "transaction deleted"
    );
    Ok(old)
}

/// Deletes every transaction of a category through the mutator. Returns how many were removed.
pub fn delete_category_transactions_in<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: i64,
    category_id: i64,
) -> Result<usize> {
    let filter = TransactionFilter {
        category_id: Some(category_id),
        ..Default::default()
    };
    let txs = store.query_transactions(owner_id, &filter)?;
    for tx in &txs {
        delete_in(store, owner_id, tx.id)?;
    }
    Ok(txs.len())
}

/// Signed sum of the live transactions of an account, recomputed from the rows.
pub fn replay_balance<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: i64,
    account_id: i64,
) -> Result<Decimal> {
    let filter = TransactionFilter {
        account_id: Some(account_id),
        ..Default::default()
    };
    Ok(store
        .query_transactions(owner_id, &filter)?
        .iter()
        .map(|t| effect(t.transaction_type, t.amount))
        .sum())
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory store used to exercise the mutator without SQLite.

    use std::cell::RefCell;

    use crate::error::{LedgerError, Result};
    use crate::models::{Account, Category, CategoryType, Transaction};
    use crate::store::{LedgerStore, TransactionFilter};

    #[derive(Default)]
    pub struct MemoryStore {
        pub accounts: RefCell<Vec<Account>>,
        pub categories: RefCell<Vec<Category>>,
        pub transactions: RefCell<Vec<Transaction>>,
        next_id: RefCell<i64>,
    }

    impl LedgerStore for MemoryStore {
        fn get_account(&self, owner_id: i64, id: i64) -> Result<Account> {
            self.accounts
                .borrow()
                .iter()
                .find(|a| a.id == id && a.owner_id == owner_id)
                .cloned()
                .ok_or_else(|| LedgerError::not_found("account", id))
        }

        fn save_account(&self, account: &Account) -> Result<()> {
            let mut accounts = self.accounts.borrow_mut();
            let slot = accounts
                .iter_mut()
                .find(|a| a.id == account.id && a.owner_id == account.owner_id)
                .ok_or_else(|| LedgerError::not_found("account", account.id))?;
            *slot = account.clone();
            Ok(())
        }

        fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>> {
            Ok(self
                .accounts
                .borrow()
                .iter()
                .filter(|a| a.owner_id == owner_id)
                .cloned()
                .collect())
        }

        fn get_category(&self, owner_id: i64, id: i64) -> Result<Category> {
            self.categories
                .borrow()
                .iter()
                .find(|c| c.id == id && c.owner_id == owner_id)
                .cloned()
                .ok_or_else(|| LedgerError::not_found("category", id))
        }

        fn list_categories(
            &self,
            owner_id: i64,
            kind: Option<CategoryType>,
        ) -> Result<Vec<Category>> {
            let mut out: Vec<Category> = self
                .categories
                .borrow()
                .iter()
                .filter(|c| c.owner_id == owner_id && kind.is_none_or(|k| c.category_type == k))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(out)
        }

        fn get_transaction(&self, owner_id: i64, id: i64) -> Result<Transaction> {
            self.transactions
                .borrow()
                .iter()
                .find(|t| t.id == id && t.owner_id == owner_id)
                .cloned()
                .ok_or_else(|| LedgerError::not_found("transaction", id))
        }

        fn save_transaction(&self, tx: &Transaction) -> Result<i64> {
            let mut txs = self.transactions.borrow_mut();
            if tx.id == 0 {
                let mut next = self.next_id.borrow_mut();
                *next += 1;
                txs.push(Transaction {
                    id: *next,
                    ..tx.clone()
                });
                return Ok(*next);
            }
            let slot = txs
                .iter_mut()
                .find(|t| t.id == tx.id && t.owner_id == tx.owner_id)
                .ok_or_else(|| LedgerError::not_found("transaction", tx.id))?;
            *slot = tx.clone();
            Ok(tx.id)
        }

        fn delete_transaction(&self, owner_id: i64, id: i64) -> Result<()> {
            let mut txs = self.transactions.borrow_mut();
            let before = txs.len();
            txs.retain(|t| !(t.id == id && t.owner_id == owner_id));
            if txs.len() == before {
                return Err(LedgerError::not_found("transaction", id));
            }
            Ok(())
        }

        fn query_transactions(
            &self,
            owner_id: i64,
            filter: &TransactionFilter,
        ) -> Result<Vec<Transaction>> {
            let mut out: Vec<Transaction> = self
                .transactions
                .borrow()
                .iter()
                .filter(|t| t.owner_id == owner_id && filter.matches(t))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
            if let Some(limit) = filter.limit {
                out.truncate(limit);
            }
            Ok(out)
        }
    }
}
