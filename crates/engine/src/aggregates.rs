//! Derived metrics over raw entity lists.
//!
//! Every function here is total: no input makes it fail or panic. Sums are
//! plain `f64` additions, so callers comparing results must allow for
//! floating-point rounding.

use api_types::transaction::{Transaction, TransactionType};

/// Share of a budget consumed, clamped to `[0, 100]`.
///
/// Returns `0` when `amount <= 0`. Use [`budget_ratio`] for the unclamped
/// value shown on over-budget badges.
pub fn budget_percentage(spent: f64, amount: f64) -> f64 {
    clamp_percentage(budget_ratio(spent, amount))
}

/// Unclamped `spent / amount * 100`, `0` when `amount <= 0`.
pub fn budget_ratio(spent: f64, amount: f64) -> f64 {
    if amount.is_nan() || amount <= 0.0 {
        return 0.0;
    }
    spent / amount * 100.0
}

pub fn is_over_budget(spent: f64, amount: f64) -> bool {
    budget_ratio(spent, amount) > 100.0
}

/// Goal progress, clamped to `[0, 100]`. `0` when `target <= 0`.
pub fn goal_progress(current: f64, target: f64) -> f64 {
    if target.is_nan() || target <= 0.0 {
        return 0.0;
    }
    clamp_percentage(current / target * 100.0)
}

/// Amount still missing to reach `target`, never negative.
pub fn goal_remaining(current: f64, target: f64) -> f64 {
    (target - current).max(0.0)
}

pub fn total_income<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    sum_of(transactions, TransactionType::Income)
}

pub fn total_expense<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    sum_of(transactions, TransactionType::Expense)
}

/// Income minus expense. Transfers move money between accounts and count
/// toward neither side.
pub fn net_income<'a, I>(transactions: I) -> f64
where
    I: IntoIterator<Item = &'a Transaction>,
    I::IntoIter: Clone,
{
    let iter = transactions.into_iter();
    total_income(iter.clone()) - total_expense(iter)
}

/// Single-pass signed total: income adds, expense subtracts.
pub fn net_total<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    transactions
        .into_iter()
        .map(|tx| match tx.kind {
            TransactionType::Income => tx.amount,
            TransactionType::Expense => -tx.amount,
            TransactionType::Transfer => 0.0,
        })
        .sum()
}

fn sum_of<'a>(transactions: impl IntoIterator<Item = &'a Transaction>, kind: TransactionType) -> f64 {
    transactions
        .into_iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

fn clamp_percentage(value: f64) -> f64 {
    // `f64::max` drops NaN in favour of the other operand.
    value.max(0.0).min(100.0)
}
