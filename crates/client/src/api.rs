//! Thin typed wrapper over the REST API.
//!
//! Every call injects the bearer token when one is set, unwraps the
//! `{success, message, data}` envelope and maps error statuses onto
//! [`ClientError`]. No caching and no retries happen here.

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use api_types::{
    account::{Account, AccountNew, AccountUpdate},
    auth::{AuthResponse, LoginCredentials, RegisterData, User},
    budget::{Budget, BudgetNew, BudgetUpdate},
    category::{Category, CategoryNew, CategoryType, CategoryUpdate},
    dashboard::Dashboard,
    envelope::{ApiErrorBody, ApiResponse, Paginated},
    goal::{Goal, GoalAmount, GoalNew, GoalUpdate},
    report::{CategoryReport, ExportFormat, IncomeExpenseReport, Interval, ReportFilters, TrendData},
    transaction::{Transaction, TransactionFilters, TransactionNew, TransactionUpdate},
};

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url is empty".to_string()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Config(format!("http client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let req = req.build()?;
        let method = req.method().clone();
        let path = req.url().path().to_string();
        debug!("{method} {path}");

        let resp = self.http.execute(req).await?;
        let status = resp.status();
        debug!("{method} {path} -> {status}");
        if status.is_success() {
            return Ok(resp);
        }
        Err(error_from(status, resp).await)
    }

    /// Sends `req` and returns the envelope's `data`.
    async fn data<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = self.send(req).await?;
        let bytes = resp.bytes().await?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }

    /// Sends `req` and decodes the whole body as `T`.
    async fn body<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = self.send(req).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn unit(&self, req: RequestBuilder) -> Result<()> {
        self.send(req).await?;
        Ok(())
    }

    async fn raw(&self, req: RequestBuilder) -> Result<Vec<u8>> {
        let resp = self.send(req).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    // Auth

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        self.data(self.request(Method::POST, "v1/login").json(credentials))
            .await
    }

    pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse> {
        self.data(self.request(Method::POST, "v1/register").json(data))
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        self.unit(self.request(Method::POST, "v1/logout")).await
    }

    pub async fn me(&self) -> Result<User> {
        self.data(self.request(Method::GET, "v1/me")).await
    }

    // Accounts

    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.data(self.request(Method::GET, "accounts")).await
    }

    pub async fn account(&self, id: i64) -> Result<Account> {
        self.data(self.request(Method::GET, &format!("accounts/{id}")))
            .await
    }

    pub async fn create_account(&self, data: &AccountNew) -> Result<Account> {
        self.data(self.request(Method::POST, "accounts").json(data))
            .await
    }

    pub async fn update_account(&self, id: i64, data: &AccountUpdate) -> Result<Account> {
        self.data(self.request(Method::PUT, &format!("accounts/{id}")).json(data))
            .await
    }

    pub async fn delete_account(&self, id: i64) -> Result<()> {
        self.unit(self.request(Method::DELETE, &format!("accounts/{id}")))
            .await
    }

    pub async fn toggle_account(&self, id: i64) -> Result<Account> {
        self.data(self.request(Method::PATCH, &format!("accounts/{id}/toggle-active")))
            .await
    }

    // Categories

    pub async fn categories(&self, kind: Option<CategoryType>) -> Result<Vec<Category>> {
        let mut req = self.request(Method::GET, "categories");
        if let Some(kind) = kind {
            req = req.query(&[("type", kind.as_str())]);
        }
        self.data(req).await
    }

    pub async fn category(&self, id: i64) -> Result<Category> {
        self.data(self.request(Method::GET, &format!("categories/{id}")))
            .await
    }

    pub async fn create_category(&self, data: &CategoryNew) -> Result<Category> {
        self.data(self.request(Method::POST, "categories").json(data))
            .await
    }

    pub async fn update_category(&self, id: i64, data: &CategoryUpdate) -> Result<Category> {
        self.data(self.request(Method::PUT, &format!("categories/{id}")).json(data))
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        self.unit(self.request(Method::DELETE, &format!("categories/{id}")))
            .await
    }

    // Transactions

    pub async fn transactions(&self, filters: &TransactionFilters) -> Result<Paginated<Transaction>> {
        self.body(self.request(Method::GET, "transactions").query(filters))
            .await
    }

    pub async fn transaction(&self, id: i64) -> Result<Transaction> {
        self.data(self.request(Method::GET, &format!("transactions/{id}")))
            .await
    }

    pub async fn create_transaction(&self, data: &TransactionNew) -> Result<Transaction> {
        self.data(self.request(Method::POST, "transactions").json(data))
            .await
    }

    pub async fn update_transaction(&self, id: i64, data: &TransactionUpdate) -> Result<Transaction> {
        self.data(self.request(Method::PUT, &format!("transactions/{id}")).json(data))
            .await
    }

    pub async fn delete_transaction(&self, id: i64) -> Result<()> {
        self.unit(self.request(Method::DELETE, &format!("transactions/{id}")))
            .await
    }

    /// Uploads a CSV file as the `file` field of a multipart form.
    pub async fn import_transactions(&self, file_name: &str, contents: Vec<u8>) -> Result<()> {
        let part = multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = multipart::Form::new().part("file", part);
        self.unit(self.request(Method::POST, "transactions/import").multipart(form))
            .await
    }

    /// CSV export of the transactions matching `filters`.
    pub async fn export_transactions(&self, filters: &TransactionFilters) -> Result<Vec<u8>> {
        self.raw(self.request(Method::GET, "transactions/export").query(filters))
            .await
    }

    // Budgets

    pub async fn budgets(&self) -> Result<Vec<Budget>> {
        self.data(self.request(Method::GET, "budgets")).await
    }

    pub async fn budget(&self, id: i64) -> Result<Budget> {
        self.data(self.request(Method::GET, &format!("budgets/{id}")))
            .await
    }

    pub async fn create_budget(&self, data: &BudgetNew) -> Result<Budget> {
        self.data(self.request(Method::POST, "budgets").json(data))
            .await
    }

    pub async fn update_budget(&self, id: i64, data: &BudgetUpdate) -> Result<Budget> {
        self.data(self.request(Method::PUT, &format!("budgets/{id}")).json(data))
            .await
    }

    pub async fn delete_budget(&self, id: i64) -> Result<()> {
        self.unit(self.request(Method::DELETE, &format!("budgets/{id}")))
            .await
    }

    pub async fn toggle_budget(&self, id: i64) -> Result<Budget> {
        self.data(self.request(Method::PATCH, &format!("budgets/{id}/toggle-active")))
            .await
    }

    // Goals

    pub async fn goals(&self) -> Result<Vec<Goal>> {
        self.data(self.request(Method::GET, "goals")).await
    }

    pub async fn goal(&self, id: i64) -> Result<Goal> {
        self.data(self.request(Method::GET, &format!("goals/{id}")))
            .await
    }

    pub async fn create_goal(&self, data: &GoalNew) -> Result<Goal> {
        self.data(self.request(Method::POST, "goals").json(data))
            .await
    }

    pub async fn update_goal(&self, id: i64, data: &GoalUpdate) -> Result<Goal> {
        self.data(self.request(Method::PUT, &format!("goals/{id}")).json(data))
            .await
    }

    pub async fn delete_goal(&self, id: i64) -> Result<()> {
        self.unit(self.request(Method::DELETE, &format!("goals/{id}")))
            .await
    }

    pub async fn contribute(&self, id: i64, amount: GoalAmount) -> Result<Goal> {
        self.data(self.request(Method::POST, &format!("goals/{id}/contribute")).json(&amount))
            .await
    }

    pub async fn withdraw(&self, id: i64, amount: GoalAmount) -> Result<Goal> {
        self.data(self.request(Method::POST, &format!("goals/{id}/withdraw")).json(&amount))
            .await
    }

    // Dashboard and reports

    pub async fn dashboard(&self) -> Result<Dashboard> {
        self.data(self.request(Method::GET, "dashboard")).await
    }

    pub async fn income_expense_report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<IncomeExpenseReport> {
        let range = DateRange { start_date, end_date };
        self.data(self.request(Method::GET, "reports/income-expense").query(&range))
            .await
    }

    pub async fn category_report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<CategoryReport>> {
        let range = DateRange { start_date, end_date };
        self.data(self.request(Method::GET, "reports/by-category").query(&range))
            .await
    }

    pub async fn trends(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<TrendData>> {
        let range = DateRange { start_date, end_date };
        let req = self
            .request(Method::GET, "reports/trends")
            .query(&range)
            .query(&[("interval", interval.as_str())]);
        self.data(req).await
    }

    /// Server-rendered CSV or PDF report.
    pub async fn export_report(&self, format: ExportFormat, filters: &ReportFilters) -> Result<Vec<u8>> {
        let req = self
            .request(Method::GET, "reports/export")
            .query(&[("type", format.as_str())])
            .query(filters);
        self.raw(req).await
    }
}

async fn error_from(status: StatusCode, resp: Response) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => return ClientError::Unauthorized,
        StatusCode::FORBIDDEN => return ClientError::Forbidden,
        StatusCode::NOT_FOUND => return ClientError::NotFound,
        _ => {}
    }

    let body = match resp.bytes().await {
        Ok(bytes) => serde_json::from_slice::<ApiErrorBody>(&bytes).unwrap_or_default(),
        Err(_) => ApiErrorBody::default(),
    };
    let message = if body.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("server error")
            .to_string()
    } else {
        body.message
    };
    ClientError::Server {
        status: status.as_u16(),
        message,
        errors: body.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let api = ApiClient::new("http://localhost:8000/api/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(api.url("/accounts"), "http://localhost:8000/api/accounts");
        assert_eq!(api.url("v1/me"), "http://localhost:8000/api/v1/me");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new(" ", DEFAULT_TIMEOUT),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn token_is_shared_between_clones() {
        let api = ApiClient::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT).unwrap();
        let other = api.clone();
        api.set_token("abc");
        assert_eq!(other.token().as_deref(), Some("abc"));
        other.clear_token();
        assert!(!api.is_authenticated());
    }
}
