// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived budget and goal figures. Nothing here is stored; every value is
//! recomputed from the ledger on each call.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::models::{Budget, Goal, TransactionType};
use crate::store::{LedgerStore, TransactionFilter};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Sum of the owner's expense transactions in the budget's category and window.
pub fn budget_spent<S: LedgerStore + ?Sized>(store: &S, budget: &Budget) -> Result<Decimal> {
    let filter = TransactionFilter {
        category_id: Some(budget.category_id),
        transaction_type: Some(TransactionType::Expense),
        since: Some(budget.start_date),
        until: budget.end_date,
        ..Default::default()
    };
    let spent: Decimal = store
        .query_transactions(budget.owner_id, &filter)?
        .iter()
        .map(|t| t.amount)
        .sum();
    debug!(budget_id = budget.id, %spent, "budget spent");
    Ok(spent)
}

/// Negative when over budget.
pub fn budget_remaining(amount: Decimal, spent: Decimal) -> Decimal {
    amount - spent
}

pub fn budget_percentage(amount: Decimal, spent: Decimal) -> Decimal {
    if amount.is_zero() {
        return Decimal::ZERO;
    }
    spent / amount * HUNDRED
}

/// Not clamped: over-funded goals exceed 100, negative savings go below 0.
pub fn goal_percentage(goal: &Goal) -> Decimal {
    if goal.target_amount.is_zero() {
        return Decimal::ZERO;
    }
    goal.current_amount / goal.target_amount * HUNDRED
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage_used: Decimal,
}

pub fn budget_status<S: LedgerStore + ?Sized>(store: &S, budget: &Budget) -> Result<BudgetStatus> {
    let spent = budget_spent(store, budget)?;
    Ok(BudgetStatus {
        spent,
        remaining: budget_remaining(budget.amount, spent),
        percentage_used: budget_percentage(budget.amount, spent),
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use super::*;
    use crate::ledger::{create_in, fake::MemoryStore};
    use crate::models::{
        Account, AccountType, Category, CategoryType, NewTransaction, PaymentMethod,
    };

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn seeded() -> MemoryStore {
        let s = MemoryStore::default();
        s.accounts.borrow_mut().push(Account {
            id: 1,
            owner_id: 1,
            name: "Wallet".into(),
            account_type: AccountType::Cash,
            balance: Decimal::ZERO,
            account_number: None,
            color: "#000".into(),
            created_at: String::new(),
            updated_at: String::new(),
        });
        for (id, name) in [(1, "Groceries"), (2, "Fuel")] {
            s.categories.borrow_mut().push(Category {
                id,
                owner_id: 1,
                name: name.into(),
                category_type: CategoryType::Expense,
                color: "#fff".into(),
                created_at: String::new(),
            });
        }
        s
    }

    fn spend(s: &MemoryStore, category_id: i64, kind: TransactionType, amount: &str, date: NaiveDate) {
        create_in(
            s,
            1,
            &NewTransaction {
                account_id: 1,
                category_id,
                amount: dec(amount),
                transaction_type: kind,
                description: "x".into(),
                date,
                payment_method: PaymentMethod::Debit,
                notes: None,
            },
        )
        .unwrap();
    }

    fn budget(amount: &str, end: Option<NaiveDate>) -> Budget {
        Budget {
            id: 1,
            owner_id: 1,
            category_id: 1,
            amount: dec(amount),
            start_date: day(1, 1),
            end_date: end,
            created_at: String::new(),
        }
    }

    #[test]
    fn groceries_budget_three_quarters_used() {
        let s = seeded();
        spend(&s, 1, TransactionType::Expense, "100.00", day(1, 5));
        spend(&s, 1, TransactionType::Expense, "50.00", day(2, 9));
        // Not counted: other category, income, and before start.
        spend(&s, 2, TransactionType::Expense, "70.00", day(1, 5));
        spend(&s, 1, TransactionType::Income, "10.00", day(1, 6));
        spend(&s, 1, TransactionType::Expense, "99.00", NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        let status = budget_status(&s, &budget("200.00", None)).unwrap();
        assert_eq!(status.spent, dec("150.00"));
        assert_eq!(status.remaining, dec("50.00"));
        assert_eq!(status.percentage_used, dec("75"));
    }

    #[test]
    fn end_date_is_inclusive() {
        let s = seeded();
        spend(&s, 1, TransactionType::Expense, "10.00", day(1, 31));
        spend(&s, 1, TransactionType::Expense, "20.00", day(2, 1));
        let spent = budget_spent(&s, &budget("100", Some(day(1, 31)))).unwrap();
        assert_eq!(spent, dec("10.00"));
    }

    #[test]
    fn over_budget_goes_negative() {
        let s = seeded();
        spend(&s, 1, TransactionType::Expense, "250.00", day(3, 1));
        let status = budget_status(&s, &budget("200.00", None)).unwrap();
        assert_eq!(status.remaining, dec("-50.00"));
        assert_eq!(status.percentage_used, dec("125"));
    }

    #[test]
    fn empty_budget_is_zero_not_error() {
        let s = seeded();
        let status = budget_status(&s, &budget("0", None)).unwrap();
        assert_eq!(status.spent, Decimal::ZERO);
        assert_eq!(status.percentage_used, Decimal::ZERO);
    }

    #[test]
    fn goal_percentage_edges() {
        let mut g = Goal {
            id: 1,
            owner_id: 1,
            name: "Trip".into(),
            target_amount: Decimal::ZERO,
            current_amount: dec("10"),
            target_date: day(12, 31),
            created_at: String::new(),
        };
        assert_eq!(goal_percentage(&g), Decimal::ZERO);
        g.target_amount = dec("200");
        g.current_amount = dec("50");
        assert_eq!(goal_percentage(&g), dec("25"));
        g.current_amount = dec("300");
        assert_eq!(goal_percentage(&g), dec("150"));
        g.current_amount = dec("-20");
        assert_eq!(goal_percentage(&g), dec("-10"));
    }
}
