//! CSV rendering of a locally computed report.

use csv::Writer;
use serde::Serialize;

use engine::Report;

use crate::error::Result;

#[derive(Serialize)]
struct ReportRow<'a> {
    section: &'a str,
    label: String,
    amount: f64,
    percentage: Option<f64>,
    transactions: Option<u64>,
    income: Option<f64>,
    expense: Option<f64>,
}

impl<'a> ReportRow<'a> {
    fn total(label: &str, amount: f64) -> Self {
        Self {
            section: "summary",
            label: label.to_string(),
            amount,
            percentage: None,
            transactions: None,
            income: None,
            expense: None,
        }
    }
}

/// Summary rows first, then income and expense categories, then the trend.
pub fn report_csv(report: &Report) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(vec![]);

    writer.serialize(ReportRow::total("income", report.totals.income))?;
    writer.serialize(ReportRow::total("expense", report.totals.expense))?;
    writer.serialize(ReportRow::total("net", report.totals.net))?;

    let categories = [
        ("income", &report.income_by_category),
        ("expense", &report.expense_by_category),
    ];
    for (section, rows) in categories {
        for row in rows {
            writer.serialize(ReportRow {
                section,
                label: row.category_name.clone(),
                amount: row.amount,
                percentage: Some(row.percentage),
                transactions: Some(row.transaction_count),
                income: None,
                expense: None,
            })?;
        }
    }

    for bucket in &report.trend {
        writer.serialize(ReportRow {
            section: "trend",
            label: bucket.label.clone(),
            amount: bucket.net,
            percentage: None,
            transactions: None,
            income: Some(bucket.income),
            expense: Some(bucket.expense),
        })?;
    }

    writer.into_inner().map_err(|err| err.into_error().into())
}
