use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Field name -> messages, as returned by the API on `422` and produced by
/// local validation.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Lenient decoders for values the API may send either as JSON numbers or as
/// decimal strings (`"125.50"`), and dates either as `YYYY-MM-DD` or full
/// timestamps.
pub mod de {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
    }

    fn parse_amount<E: Error>(raw: RawAmount) -> Result<f64, E> {
        match raw {
            RawAmount::Number(value) => Ok(value),
            RawAmount::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid amount: {text}"))),
        }
    }

    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        parse_amount(RawAmount::deserialize(deserializer)?)
    }

    pub fn amount_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<RawAmount>::deserialize(deserializer)?
            .map(parse_amount)
            .transpose()
    }

    fn parse_date<E: Error>(text: &str) -> Result<NaiveDate, E> {
        let head = text.get(..10).unwrap_or(text);
        NaiveDate::parse_from_str(head, "%Y-%m-%d")
            .map_err(|_| E::custom(format!("invalid date: {text}")))
    }

    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_date(&text)
    }

    pub fn date_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.trim().is_empty() => parse_date(&text).map(Some),
            _ => Ok(None),
        }
    }
}

pub mod envelope {
    use super::*;

    /// `{success, message, data}` wrapper used by single and list endpoints.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ApiResponse<T> {
        #[serde(default = "default_success")]
        pub success: bool,
        #[serde(default)]
        pub message: Option<String>,
        pub data: T,
    }

    fn default_success() -> bool {
        true
    }

    /// Body of a failed request.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ApiErrorBody {
        #[serde(default)]
        pub success: bool,
        #[serde(default)]
        pub message: String,
        #[serde(default)]
        pub errors: Option<FieldErrors>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PageMeta {
        pub current_page: u64,
        #[serde(default)]
        pub from: Option<u64>,
        pub last_page: u64,
        pub per_page: u64,
        #[serde(default)]
        pub to: Option<u64>,
        pub total: u64,
    }

    /// `{data, meta}` wrapper used by the transaction listing.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Paginated<T> {
        pub data: Vec<T>,
        pub meta: PageMeta,
    }

    impl<T> Paginated<T> {
        pub fn has_next(&self) -> bool {
            self.meta.current_page < self.meta.last_page
        }
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct User {
        pub id: i64,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LoginCredentials {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RegisterData {
        pub name: String,
        pub email: String,
        pub password: String,
        pub password_confirmation: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub user: User,
        pub token: String,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountType {
        Checking,
        Savings,
        Credit,
        Cash,
        Investment,
    }

    impl AccountType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Checking => "checking",
                Self::Savings => "savings",
                Self::Credit => "credit",
                Self::Cash => "cash",
                Self::Investment => "investment",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Account {
        pub id: i64,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: AccountType,
        /// Signed: credit accounts may be negative.
        #[serde(deserialize_with = "de::amount")]
        pub balance: f64,
        pub currency: String,
        #[serde(default = "active_default")]
        pub is_active: bool,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
        #[serde(default)]
        pub updated_at: Option<DateTime<Utc>>,
    }

    fn active_default() -> bool {
        true
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: AccountType,
        pub balance: f64,
        pub currency: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct AccountUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<AccountType>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub balance: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub currency: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub is_active: Option<bool>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryType {
        Income,
        Expense,
    }

    impl CategoryType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Category {
        pub id: i64,
        /// `None` for system-wide categories.
        #[serde(default)]
        pub user_id: Option<i64>,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        #[serde(default)]
        pub icon: Option<String>,
        #[serde(default)]
        pub color: Option<String>,
        #[serde(default)]
        pub parent_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub children: Option<Vec<Category>>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub icon: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub parent_id: Option<i64>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<CategoryType>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub icon: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub parent_id: Option<i64>,
    }
}

pub mod transaction {
    use super::*;
    use crate::{account::Account, category::Category};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionType {
        Income,
        Expense,
        Transfer,
    }

    impl TransactionType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
                Self::Transfer => "transfer",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Transaction {
        pub id: i64,
        pub account_id: i64,
        pub category_id: i64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        /// Always positive; the sign is implied by `kind`.
        #[serde(deserialize_with = "de::amount")]
        pub amount: f64,
        #[serde(deserialize_with = "de::date")]
        pub transaction_date: NaiveDate,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub notes: Option<String>,
        #[serde(default)]
        pub tags: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub account: Option<Account>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<Category>,
        #[serde(default)]
        pub created_at: Option<DateTime<Utc>>,
        #[serde(default)]
        pub updated_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: i64,
        pub category_id: i64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub amount: f64,
        pub transaction_date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub tags: Option<Vec<String>>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub account_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category_id: Option<i64>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionType>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub transaction_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub tags: Option<Vec<String>>,
    }

    /// Query parameters of `GET /transactions` and `GET /transactions/export`.
    ///
    /// Field order is fixed, so the JSON form doubles as a stable cache scope.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct TransactionFilters {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub account_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category_id: Option<i64>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionType>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub min_amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub max_amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub search: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub page: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub per_page: Option<u64>,
    }
}

pub mod budget {
    use super::*;
    use crate::category::Category;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BudgetPeriod {
        Daily,
        Weekly,
        Monthly,
        Yearly,
    }

    impl BudgetPeriod {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Daily => "daily",
                Self::Weekly => "weekly",
                Self::Monthly => "monthly",
                Self::Yearly => "yearly",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Utilization {
        #[serde(deserialize_with = "de::amount")]
        pub spent: f64,
        #[serde(deserialize_with = "de::amount")]
        pub percentage: f64,
        #[serde(deserialize_with = "de::amount")]
        pub remaining: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Budget {
        pub id: i64,
        /// `None` means an overall budget across every expense category.
        #[serde(default)]
        pub category_id: Option<i64>,
        #[serde(deserialize_with = "de::amount")]
        pub amount: f64,
        pub period: BudgetPeriod,
        #[serde(deserialize_with = "de::date")]
        pub start_date: NaiveDate,
        #[serde(default, deserialize_with = "de::date_opt")]
        pub end_date: Option<NaiveDate>,
        #[serde(default)]
        pub is_active: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<Category>,
        #[serde(default)]
        pub utilization: Option<Utilization>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BudgetNew {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category_id: Option<i64>,
        pub amount: f64,
        pub period: BudgetPeriod,
        pub start_date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub period: Option<BudgetPeriod>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub is_active: Option<bool>,
    }
}

pub mod goal {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GoalStatus {
        #[default]
        Active,
        Completed,
        Cancelled,
    }

    impl GoalStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Active => "active",
                Self::Completed => "completed",
                Self::Cancelled => "cancelled",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Goal {
        pub id: i64,
        pub name: String,
        #[serde(deserialize_with = "de::amount")]
        pub target_amount: f64,
        /// May exceed `target_amount`.
        #[serde(deserialize_with = "de::amount")]
        pub current_amount: f64,
        #[serde(default, deserialize_with = "de::date_opt")]
        pub deadline: Option<NaiveDate>,
        #[serde(default)]
        pub status: GoalStatus,
        #[serde(default, deserialize_with = "de::amount_opt")]
        pub progress_percentage: Option<f64>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct GoalNew {
        pub name: String,
        pub target_amount: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub current_amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub deadline: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub status: Option<GoalStatus>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub target_amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub current_amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub deadline: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub status: Option<GoalStatus>,
    }

    /// Body of `POST /goals/{id}/contribute` and `POST /goals/{id}/withdraw`.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
    pub struct GoalAmount {
        pub amount: f64,
    }
}

pub mod dashboard {
    use super::*;
    use crate::{account::Account, budget::Budget, goal::Goal, transaction::Transaction};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct CategorySpending {
        pub category_id: i64,
        pub category_name: String,
        #[serde(deserialize_with = "de::amount")]
        pub total_amount: f64,
        #[serde(deserialize_with = "de::amount")]
        pub percentage: f64,
        #[serde(default)]
        pub color: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TrendDataPoint {
        pub date: String,
        #[serde(deserialize_with = "de::amount")]
        pub income: f64,
        #[serde(deserialize_with = "de::amount")]
        pub expense: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Dashboard {
        #[serde(deserialize_with = "de::amount")]
        pub total_balance: f64,
        #[serde(deserialize_with = "de::amount")]
        pub total_income: f64,
        #[serde(deserialize_with = "de::amount")]
        pub total_expenses: f64,
        #[serde(deserialize_with = "de::amount")]
        pub net_income: f64,
        #[serde(default)]
        pub accounts: Vec<Account>,
        #[serde(default)]
        pub recent_transactions: Vec<Transaction>,
        #[serde(default)]
        pub budgets: Vec<Budget>,
        #[serde(default)]
        pub goals: Vec<Goal>,
        #[serde(default)]
        pub spending_by_category: Vec<CategorySpending>,
        #[serde(default)]
        pub income_vs_expense_trend: Vec<TrendDataPoint>,
    }
}

pub mod report {
    use super::*;

    /// Width of one trend bucket.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Interval {
        #[default]
        Daily,
        Weekly,
        Monthly,
        Yearly,
    }

    impl Interval {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Daily => "daily",
                Self::Weekly => "weekly",
                Self::Monthly => "monthly",
                Self::Yearly => "yearly",
            }
        }
    }

    impl From<crate::budget::BudgetPeriod> for Interval {
        fn from(value: crate::budget::BudgetPeriod) -> Self {
            use crate::budget::BudgetPeriod;
            match value {
                BudgetPeriod::Daily => Self::Daily,
                BudgetPeriod::Weekly => Self::Weekly,
                BudgetPeriod::Monthly => Self::Monthly,
                BudgetPeriod::Yearly => Self::Yearly,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExportFormat {
        Csv,
        Pdf,
    }

    impl ExportFormat {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Csv => "csv",
                Self::Pdf => "pdf",
            }
        }
    }

    /// Query parameters shared by report endpoints and the local aggregator.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ReportFilters {
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub account_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category_id: Option<i64>,
        #[serde(default)]
        pub interval: Interval,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct CategoryReport {
        pub category_id: i64,
        pub category_name: String,
        #[serde(deserialize_with = "de::amount")]
        pub amount: f64,
        #[serde(deserialize_with = "de::amount")]
        pub percentage: f64,
        pub transaction_count: u64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ReportPeriod {
        pub start: String,
        pub end: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct IncomeExpenseReport {
        pub period: ReportPeriod,
        #[serde(deserialize_with = "de::amount")]
        pub total_income: f64,
        #[serde(deserialize_with = "de::amount")]
        pub total_expense: f64,
        #[serde(deserialize_with = "de::amount")]
        pub net_income: f64,
        #[serde(default)]
        pub income_by_category: Vec<CategoryReport>,
        #[serde(default)]
        pub expense_by_category: Vec<CategoryReport>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TrendData {
        pub date: String,
        #[serde(deserialize_with = "de::amount")]
        pub income: f64,
        #[serde(deserialize_with = "de::amount")]
        pub expense: f64,
        #[serde(deserialize_with = "de::amount")]
        pub balance: f64,
    }
}
