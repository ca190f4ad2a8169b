//! Income/expense reports over a date range.
//!
//! [`aggregate`] is the local counterpart of the server's report endpoints:
//! it takes raw transactions and produces totals, per-category breakdowns
//! and a gap-free trend series.

use std::{cmp::Ordering, collections::BTreeMap, collections::HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use api_types::{
    category::Category,
    report::{CategoryReport, Interval, ReportFilters},
    transaction::{Transaction, TransactionType},
};

use crate::{EngineError, ResultEngine, aggregates, categories as taxonomy, period};

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

/// One trend bucket. Buckets without transactions carry zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendBucket {
    /// First day of the bucket.
    pub period: NaiveDate,
    pub label: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub filters: ReportFilters,
    pub totals: Totals,
    pub income_by_category: Vec<CategoryReport>,
    pub expense_by_category: Vec<CategoryReport>,
    pub trend: Vec<TrendBucket>,
}

/// Rejects ranges whose start is after their end.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> ResultEngine<()> {
    if start > end {
        return Err(EngineError::InvalidRange { start, end });
    }
    Ok(())
}

fn in_scope(tx: &Transaction, filters: &ReportFilters) -> bool {
    tx.transaction_date >= filters.start_date
        && tx.transaction_date <= filters.end_date
        && filters.account_id.is_none_or(|id| id == tx.account_id)
        && filters.category_id.is_none_or(|id| id == tx.category_id)
}

/// Builds a report for `filters` out of `transactions`.
///
/// `categories` only resolves display names; a transaction carrying its own
/// embedded category wins over the list.
pub fn aggregate(
    transactions: &[Transaction],
    categories: &[Category],
    filters: &ReportFilters,
) -> ResultEngine<Report> {
    check_range(filters.start_date, filters.end_date)?;

    let known = taxonomy::flatten(categories);
    let names: HashMap<i64, &str> = known.iter().map(|c| (c.id, c.name.as_str())).collect();
    let scoped: Vec<&Transaction> = transactions.iter().filter(|tx| in_scope(tx, filters)).collect();

    let income = aggregates::total_income(scoped.iter().copied());
    let expense = aggregates::total_expense(scoped.iter().copied());
    let totals = Totals {
        income,
        expense,
        net: income - expense,
    };

    Ok(Report {
        filters: filters.clone(),
        totals,
        income_by_category: breakdown(&scoped, TransactionType::Income, income, &names),
        expense_by_category: breakdown(&scoped, TransactionType::Expense, expense, &names),
        trend: trend(&scoped, filters.interval, filters.start_date, filters.end_date),
    })
}

fn category_name(tx: &Transaction, names: &HashMap<i64, &str>) -> String {
    if let Some(category) = &tx.category {
        return category.name.clone();
    }
    names
        .get(&tx.category_id)
        .map_or_else(|| UNCATEGORIZED.to_string(), |name| (*name).to_string())
}

fn breakdown(
    scoped: &[&Transaction],
    kind: TransactionType,
    total: f64,
    names: &HashMap<i64, &str>,
) -> Vec<CategoryReport> {
    let mut rows: HashMap<i64, CategoryReport> = HashMap::new();
    for tx in scoped.iter().filter(|tx| tx.kind == kind) {
        let row = rows.entry(tx.category_id).or_insert_with(|| CategoryReport {
            category_id: tx.category_id,
            category_name: category_name(tx, names),
            amount: 0.0,
            percentage: 0.0,
            transaction_count: 0,
        });
        row.amount += tx.amount;
        row.transaction_count += 1;
    }

    let mut rows: Vec<CategoryReport> = rows
        .into_values()
        .map(|mut row| {
            row.percentage = if total > 0.0 {
                row.amount / total * 100.0
            } else {
                0.0
            };
            row
        })
        .collect();

    rows.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category_name.cmp(&b.category_name))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    rows
}

fn trend(
    scoped: &[&Transaction],
    interval: Interval,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<TrendBucket> {
    let mut sums: BTreeMap<NaiveDate, (f64, f64)> = period::buckets(interval, start, end)
        .into_iter()
        .map(|bucket| (bucket, (0.0, 0.0)))
        .collect();

    for tx in scoped {
        let key = period::bucket_start(interval, tx.transaction_date);
        if let Some((income, expense)) = sums.get_mut(&key) {
            match tx.kind {
                TransactionType::Income => *income += tx.amount,
                TransactionType::Expense => *expense += tx.amount,
                TransactionType::Transfer => {}
            }
        }
    }

    sums.into_iter()
        .map(|(period, (income, expense))| TrendBucket {
            period,
            label: period::bucket_label(interval, period),
            income,
            expense,
            net: income - expense,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{category, date, tx};
    use api_types::category::CategoryType;

    const EPSILON: f64 = 1e-6;

    fn filters(start: &str, end: &str, interval: Interval) -> ReportFilters {
        ReportFilters {
            start_date: date(start),
            end_date: date(end),
            account_id: None,
            category_id: None,
            interval,
        }
    }

    fn january() -> (Vec<Transaction>, Vec<Category>) {
        let txs = vec![
            tx(1, TransactionType::Expense, 100.0, 1, "2024-01-05"),
            tx(2, TransactionType::Expense, 50.0, 2, "2024-01-10"),
            tx(3, TransactionType::Income, 500.0, 3, "2024-01-15"),
        ];
        let categories = vec![
            category(1, "catA", CategoryType::Expense, None),
            category(2, "catB", CategoryType::Expense, None),
            category(3, "catC", CategoryType::Income, None),
        ];
        (txs, categories)
    }

    #[test]
    fn january_scenario() {
        let (txs, categories) = january();
        let report = aggregate(&txs, &categories, &filters("2024-01-01", "2024-01-31", Interval::Monthly)).unwrap();

        assert!((report.totals.expense - 150.0).abs() < EPSILON);
        assert!((report.totals.income - 500.0).abs() < EPSILON);
        assert!((report.totals.net - 350.0).abs() < EPSILON);

        let expense = &report.expense_by_category;
        assert_eq!(expense.len(), 2);
        assert_eq!(expense[0].category_name, "catA");
        assert!((expense[0].amount - 100.0).abs() < EPSILON);
        assert!((expense[0].percentage - 66.666_666).abs() < 0.01);
        assert_eq!(expense[1].category_name, "catB");
        assert!((expense[1].percentage - 33.333_333).abs() < 0.01);
        assert_eq!(report.income_by_category[0].transaction_count, 1);
    }

    #[test]
    fn names_resolve_from_nested_categories() {
        let (txs, _) = january();
        let mut parent = category(10, "Living", CategoryType::Expense, None);
        parent.children = Some(vec![
            category(1, "catA", CategoryType::Expense, Some(10)),
            category(2, "catB", CategoryType::Expense, Some(10)),
        ]);
        let report = aggregate(&txs, &[parent], &filters("2024-01-01", "2024-01-31", Interval::Monthly)).unwrap();
        let names: Vec<&str> = report
            .expense_by_category
            .iter()
            .map(|row| row.category_name.as_str())
            .collect();
        assert_eq!(names, vec!["catA", "catB"]);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let (txs, categories) = january();
        let err = aggregate(&txs, &categories, &filters("2024-02-10", "2024-02-01", Interval::Daily)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRange {
                start: date("2024-02-10"),
                end: date("2024-02-01"),
            }
        );
    }

    #[test]
    fn boundary_dates_are_included() {
        let txs = vec![
            tx(1, TransactionType::Expense, 10.0, 1, "2024-01-01"),
            tx(2, TransactionType::Expense, 20.0, 1, "2024-01-31"),
            tx(3, TransactionType::Expense, 40.0, 1, "2024-02-01"),
        ];
        let report = aggregate(&txs, &[], &filters("2024-01-01", "2024-01-31", Interval::Daily)).unwrap();
        assert!((report.totals.expense - 30.0).abs() < EPSILON);
    }

    #[test]
    fn empty_range_is_all_zero() {
        let report = aggregate(&[], &[], &filters("2024-01-01", "2024-01-07", Interval::Daily)).unwrap();
        assert_eq!(report.totals, Totals::default());
        assert!(report.income_by_category.is_empty());
        assert!(report.expense_by_category.is_empty());
        assert_eq!(report.trend.len(), 7);
        assert!(report.trend.iter().all(|b| b.income == 0.0 && b.expense == 0.0));
    }

    #[test]
    fn trend_has_no_gaps() {
        let (txs, categories) = january();
        let report = aggregate(&txs, &categories, &filters("2024-01-01", "2024-01-31", Interval::Weekly)).unwrap();
        // Jan 1 2024 is a Monday; Jan 29 starts the fifth week.
        assert_eq!(report.trend.len(), 5);
        let periods: Vec<_> = report.trend.iter().map(|b| b.period).collect();
        let mut sorted = periods.clone();
        sorted.sort();
        assert_eq!(periods, sorted);
        let second = &report.trend[1];
        assert_eq!(second.period, date("2024-01-08"));
        assert!((second.expense - 50.0).abs() < EPSILON);
        assert_eq!(report.trend[4].expense, 0.0);
    }

    #[test]
    fn breakdown_percentages_sum_to_hundred() {
        let txs = vec![
            tx(1, TransactionType::Expense, 33.3, 1, "2024-01-02"),
            tx(2, TransactionType::Expense, 12.7, 2, "2024-01-03"),
            tx(3, TransactionType::Expense, 54.1, 3, "2024-01-04"),
            tx(4, TransactionType::Expense, 0.9, 1, "2024-01-05"),
        ];
        let report = aggregate(&txs, &[], &filters("2024-01-01", "2024-01-31", Interval::Monthly)).unwrap();
        let sum: f64 = report.expense_by_category.iter().map(|r| r.percentage).sum();
        assert!((sum - 100.0).abs() < EPSILON);
        let income_sum: f64 = report.income_by_category.iter().map(|r| r.percentage).sum();
        assert_eq!(income_sum, 0.0);
    }

    #[test]
    fn ties_break_on_name() {
        let txs = vec![
            tx(1, TransactionType::Expense, 25.0, 2, "2024-01-02"),
            tx(2, TransactionType::Expense, 25.0, 1, "2024-01-03"),
        ];
        let categories = vec![
            category(1, "Zoo", CategoryType::Expense, None),
            category(2, "Apples", CategoryType::Expense, None),
        ];
        let report = aggregate(&txs, &categories, &filters("2024-01-01", "2024-01-31", Interval::Monthly)).unwrap();
        let names: Vec<_> = report.expense_by_category.iter().map(|r| r.category_name.as_str()).collect();
        assert_eq!(names, vec!["Apples", "Zoo"]);
    }

    #[test]
    fn account_and_category_filters_apply() {
        let mut other_account = tx(4, TransactionType::Expense, 70.0, 1, "2024-01-06");
        other_account.account_id = 2;
        let (mut txs, categories) = january();
        txs.push(other_account);

        let mut scoped = filters("2024-01-01", "2024-01-31", Interval::Monthly);
        scoped.account_id = Some(1);
        let report = aggregate(&txs, &categories, &scoped).unwrap();
        assert!((report.totals.expense - 150.0).abs() < EPSILON);

        scoped.category_id = Some(2);
        let report = aggregate(&txs, &categories, &scoped).unwrap();
        assert!((report.totals.expense - 50.0).abs() < EPSILON);
        assert_eq!(report.totals.income, 0.0);
    }

    #[test]
    fn report_serializes_dates_as_iso() {
        let (txs, categories) = january();
        let report = aggregate(&txs, &categories, &filters("2024-01-01", "2024-01-31", Interval::Monthly)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trend"][0]["period"], "2024-01-01");
        assert_eq!(json["trend"][0]["label"], "2024-01");
        assert_eq!(json["totals"]["net"], 350.0);
    }

    #[test]
    fn unknown_category_is_uncategorized() {
        let txs = vec![tx(1, TransactionType::Expense, 5.0, 42, "2024-01-02")];
        let report = aggregate(&txs, &[], &filters("2024-01-01", "2024-01-31", Interval::Monthly)).unwrap();
        assert_eq!(report.expense_by_category[0].category_name, UNCATEGORIZED);
    }
}
