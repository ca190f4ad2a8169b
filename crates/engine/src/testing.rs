use chrono::NaiveDate;

use api_types::{
    category::{Category, CategoryType},
    transaction::{Transaction, TransactionType},
};

pub(crate) fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

pub(crate) fn tx(
    id: i64,
    kind: TransactionType,
    amount: f64,
    category_id: i64,
    on: &str,
) -> Transaction {
    Transaction {
        id,
        account_id: 1,
        category_id,
        kind,
        amount,
        transaction_date: date(on),
        description: None,
        notes: None,
        tags: None,
        account: None,
        category: None,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn category(id: i64, name: &str, kind: CategoryType, parent_id: Option<i64>) -> Category {
    Category {
        id,
        user_id: Some(1),
        name: name.to_string(),
        kind,
        icon: None,
        color: None,
        parent_id,
        children: None,
    }
}
