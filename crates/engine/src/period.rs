//! Calendar buckets shared by trend reports and budget windows.
//!
//! Weeks follow ISO 8601 and start on Monday. Months and years are calendar
//! aligned.

use chrono::{Datelike, Days, Months, NaiveDate};

use api_types::report::Interval;

/// First day of the bucket containing `date`.
pub fn bucket_start(interval: Interval, date: NaiveDate) -> NaiveDate {
    match interval {
        Interval::Daily => date,
        Interval::Weekly => date - Days::new(u64::from(date.weekday().num_days_from_monday())),
        Interval::Monthly => date.with_day(1).unwrap_or(date),
        Interval::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

/// First day of the bucket after the one starting at `start`.
///
/// Saturates at [`NaiveDate::MAX`].
pub fn next_bucket(interval: Interval, start: NaiveDate) -> NaiveDate {
    let next = match interval {
        Interval::Daily => start.checked_add_days(Days::new(1)),
        Interval::Weekly => start.checked_add_days(Days::new(7)),
        Interval::Monthly => start.checked_add_months(Months::new(1)),
        Interval::Yearly => start.checked_add_months(Months::new(12)),
    };
    next.unwrap_or(NaiveDate::MAX)
}

/// Inclusive bounds of the bucket containing `date`.
pub fn bucket_bounds(interval: Interval, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = bucket_start(interval, date);
    let next = next_bucket(interval, start);
    let end = if next == NaiveDate::MAX {
        next
    } else {
        next.pred_opt().unwrap_or(next)
    };
    (start, end)
}

/// Start dates of every bucket touched by the inclusive range `[start, end]`,
/// in chronological order. Empty when `start > end`.
pub fn buckets(interval: Interval, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    if start > end {
        return out;
    }
    let mut cursor = bucket_start(interval, start);
    while cursor <= end {
        out.push(cursor);
        let next = next_bucket(interval, cursor);
        if next == cursor || next == NaiveDate::MAX {
            break;
        }
        cursor = next;
    }
    out
}

/// Human label of the bucket starting at `start`.
pub fn bucket_label(interval: Interval, start: NaiveDate) -> String {
    match interval {
        Interval::Daily => start.format("%Y-%m-%d").to_string(),
        Interval::Weekly => {
            let week = start.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Interval::Monthly => start.format("%Y-%m").to_string(),
        Interval::Yearly => start.format("%Y").to_string(),
    }
}
