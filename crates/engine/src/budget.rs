//! Budget utilization computed from transactions.
//!
//! A budget's active window is the period bucket (day, ISO week, calendar
//! month or calendar year) containing the reference date, clipped to the
//! budget's own `[start_date, end_date]`. Only expenses inside that window
//! count, restricted to the budget's category unless it is an overall budget.

use chrono::NaiveDate;

use api_types::{
    budget::{Budget, BudgetPeriod, Utilization},
    report::Interval,
    transaction::{Transaction, TransactionType},
};

use crate::{aggregates, period};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetUsage {
    pub spent: f64,
    /// Clamped to `[0, 100]`.
    pub percentage: f64,
    /// Unclamped, may exceed 100.
    pub ratio: f64,
    pub remaining: f64,
    /// `None` when the reference date is outside the budget's lifetime.
    pub window: Option<(NaiveDate, NaiveDate)>,
}

impl BudgetUsage {
    pub fn is_over_budget(&self) -> bool {
        self.ratio > 100.0
    }
}

impl From<BudgetUsage> for Utilization {
    fn from(value: BudgetUsage) -> Self {
        Utilization {
            spent: value.spent,
            percentage: value.percentage,
            remaining: value.remaining,
        }
    }
}

/// Window of `period` containing `as_of`, clipped to the budget lifetime.
pub fn active_window(
    period: BudgetPeriod,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    as_of: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    if as_of < start_date {
        return None;
    }
    if let Some(end) = end_date
        && as_of > end
    {
        return None;
    }

    let (from, to) = period::bucket_bounds(Interval::from(period), as_of);
    let from = from.max(start_date);
    let to = match end_date {
        Some(end) => to.min(end),
        None => to,
    };
    Some((from, to))
}

fn counts_toward(budget: &Budget, tx: &Transaction, window: (NaiveDate, NaiveDate)) -> bool {
    tx.kind == TransactionType::Expense
        && tx.transaction_date >= window.0
        && tx.transaction_date <= window.1
        && budget.category_id.is_none_or(|id| id == tx.category_id)
}

/// Computes utilization of `budget` on `as_of`.
pub fn utilization<'a>(
    budget: &Budget,
    transactions: impl IntoIterator<Item = &'a Transaction>,
    as_of: NaiveDate,
) -> BudgetUsage {
    let window = active_window(budget.period, budget.start_date, budget.end_date, as_of);
    let spent = match window {
        Some(window) => transactions
            .into_iter()
            .filter(|tx| counts_toward(budget, tx, window))
            .map(|tx| tx.amount)
            .sum(),
        None => 0.0,
    };

    BudgetUsage {
        spent,
        percentage: aggregates::budget_percentage(spent, budget.amount),
        ratio: aggregates::budget_ratio(spent, budget.amount),
        remaining: (budget.amount - spent).max(0.0),
        window,
    }
}
