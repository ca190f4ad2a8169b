//! One authenticated conversation with the API.
//!
//! A [`Session`] owns the API client, the cache and the mutation coordinator.
//! Reads go through the cache; writes are validated locally, sent, then
//! invalidate the families they touch. An `Unauthorized` answer from any
//! call drops the token and empties the cache.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use api_types::{
    account::{Account, AccountNew, AccountUpdate},
    auth::{AuthResponse, LoginCredentials, RegisterData, User},
    budget::{Budget, BudgetNew, BudgetUpdate},
    category::{Category, CategoryNew, CategoryType, CategoryUpdate},
    dashboard::Dashboard,
    envelope::Paginated,
    goal::{Goal, GoalAmount, GoalNew, GoalUpdate},
    report::{CategoryReport, ExportFormat, IncomeExpenseReport, Interval, ReportFilters, TrendData},
    transaction::{Transaction, TransactionFilters, TransactionNew, TransactionUpdate},
};
use engine::{BudgetUsage, Report, Validate, report::check_range};

use crate::{
    api::ApiClient,
    cache::{Cache, CacheKey, ResourceFamily},
    error::{ClientError, Result},
    mutations::{Mutation, MutationCoordinator},
};

/// Page size used when collecting every transaction of a range.
const REPORT_PAGE_SIZE: u64 = 100;

#[derive(Clone, Debug)]
pub struct Session {
    api: ApiClient,
    cache: Cache,
    coordinator: MutationCoordinator,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::new();
        Self {
            coordinator: MutationCoordinator::new(cache.clone()),
            api,
            cache,
        }
    }

    pub fn connect(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::new(ApiClient::new(base_url, timeout)?))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.is_authenticated()
    }

    /// Restores a token saved by an earlier run.
    pub fn resume(&self, token: impl Into<String>) {
        self.api.set_token(token);
        self.cache.clear();
    }

    /// Applies the session-wide policy for authentication failures.
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ClientError::Unauthorized) = &result {
            if self.api.is_authenticated() {
                warn!("session rejected by server, signing out");
            }
            self.api.clear_token();
            self.cache.clear();
        }
        result
    }

    async fn cached<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let api = self.api.clone();
        let result = self.cache.read(key, move || fetch(api)).await;
        self.guard(result)
    }

    async fn mutate<T, Fut>(&self, mutation: Mutation, request: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let result = self.coordinator.run(mutation, request).await;
        self.guard(result)
    }

    // Auth

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        credentials.validate()?;
        let auth = self.api.login(credentials).await?;
        self.api.set_token(auth.token.clone());
        self.cache.clear();
        info!("signed in as {}", auth.user.email);
        Ok(auth)
    }

    pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse> {
        data.validate()?;
        let auth = self.api.register(data).await?;
        self.api.set_token(auth.token.clone());
        self.cache.clear();
        info!("registered {}", auth.user.email);
        Ok(auth)
    }

    /// Signs out. Local credentials and cached data are dropped even when
    /// the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self.api.logout().await;
        if let Err(err) = &result {
            warn!("logout request failed: {err}");
        }
        self.api.clear_token();
        self.cache.clear();
        result
    }

    pub async fn me(&self) -> Result<Arc<User>> {
        self.cached(CacheKey::family(ResourceFamily::User), |api| async move {
            api.me().await
        })
        .await
    }

    // Accounts

    pub async fn accounts(&self) -> Result<Arc<Vec<Account>>> {
        self.cached(CacheKey::family(ResourceFamily::Accounts), |api| async move {
            api.accounts().await
        })
        .await
    }

    pub async fn account(&self, id: i64) -> Result<Arc<Account>> {
        let key = CacheKey::scoped(ResourceFamily::Accounts, format!("id={id}"));
        self.cached(key, move |api| async move { api.account(id).await })
            .await
    }

    pub async fn create_account(&self, data: &AccountNew) -> Result<Account> {
        data.validate()?;
        self.mutate(Mutation::CreateAccount, self.api.create_account(data))
            .await
    }

    pub async fn update_account(&self, id: i64, data: &AccountUpdate) -> Result<Account> {
        data.validate()?;
        self.mutate(Mutation::UpdateAccount, self.api.update_account(id, data))
            .await
    }

    pub async fn toggle_account(&self, id: i64) -> Result<Account> {
        self.mutate(Mutation::ToggleAccount, self.api.toggle_account(id))
            .await
    }

    pub async fn delete_account(&self, id: i64) -> Result<()> {
        self.mutate(Mutation::DeleteAccount, self.api.delete_account(id))
            .await
    }

    // Categories

    pub async fn categories(&self, kind: Option<CategoryType>) -> Result<Arc<Vec<Category>>> {
        let key = match kind {
            Some(kind) => CacheKey::scoped(ResourceFamily::Categories, format!("type={}", kind.as_str())),
            None => CacheKey::family(ResourceFamily::Categories),
        };
        self.cached(key, move |api| async move { api.categories(kind).await })
            .await
    }

    pub async fn create_category(&self, data: &CategoryNew) -> Result<Category> {
        data.validate()?;
        self.mutate(Mutation::CreateCategory, self.api.create_category(data))
            .await
    }

    /// Updates a category, refusing parent changes that would loop the tree.
    pub async fn update_category(&self, id: i64, data: &CategoryUpdate) -> Result<Category> {
        data.validate()?;
        if data.parent_id.is_some() {
            // The check runs against the server's current tree.
            self.cache
                .invalidate(&CacheKey::family(ResourceFamily::Categories));
            let known = self.categories(None).await?;
            engine::ensure_acyclic(&known, Some(id), data.parent_id)?;
        }
        self.mutate(Mutation::UpdateCategory, self.api.update_category(id, data))
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        self.mutate(Mutation::DeleteCategory, self.api.delete_category(id))
            .await
    }

    // Transactions

    pub async fn transactions(&self, filters: &TransactionFilters) -> Result<Arc<Paginated<Transaction>>> {
        let key = CacheKey::with_params(ResourceFamily::Transactions, filters);
        let filters = filters.clone();
        self.cached(key, move |api| async move { api.transactions(&filters).await })
            .await
    }

    pub async fn create_transaction(&self, data: &TransactionNew) -> Result<Transaction> {
        data.validate()?;
        self.mutate(Mutation::CreateTransaction, self.api.create_transaction(data))
            .await
    }

    pub async fn update_transaction(&self, id: i64, data: &TransactionUpdate) -> Result<Transaction> {
        data.validate()?;
        self.mutate(
            Mutation::UpdateTransaction,
            self.api.update_transaction(id, data),
        )
        .await
    }

    pub async fn delete_transaction(&self, id: i64) -> Result<()> {
        self.mutate(Mutation::DeleteTransaction, self.api.delete_transaction(id))
            .await
    }

    pub async fn import_transactions(&self, file_name: &str, contents: Vec<u8>) -> Result<()> {
        if contents.is_empty() {
            return Err(ClientError::Validation({
                let mut errors = engine::ValidationErrors::new();
                errors.add("file", "Import file is empty");
                errors
            }));
        }
        self.mutate(
            Mutation::ImportTransactions,
            self.api.import_transactions(file_name, contents),
        )
        .await
    }

    /// Not cached: exports are one-off downloads.
    pub async fn export_transactions(&self, filters: &TransactionFilters) -> Result<Vec<u8>> {
        let result = self.api.export_transactions(filters).await;
        self.guard(result)
    }

    // Budgets

    pub async fn budgets(&self) -> Result<Arc<Vec<Budget>>> {
        self.cached(CacheKey::family(ResourceFamily::Budgets), |api| async move {
            api.budgets().await
        })
        .await
    }

    pub async fn create_budget(&self, data: &BudgetNew) -> Result<Budget> {
        data.validate()?;
        self.mutate(Mutation::CreateBudget, self.api.create_budget(data))
            .await
    }

    pub async fn update_budget(&self, id: i64, data: &BudgetUpdate) -> Result<Budget> {
        data.validate()?;
        self.mutate(Mutation::UpdateBudget, self.api.update_budget(id, data))
            .await
    }

    pub async fn toggle_budget(&self, id: i64) -> Result<Budget> {
        self.mutate(Mutation::ToggleBudget, self.api.toggle_budget(id))
            .await
    }

    pub async fn delete_budget(&self, id: i64) -> Result<()> {
        self.mutate(Mutation::DeleteBudget, self.api.delete_budget(id))
            .await
    }

    // Goals

    pub async fn goals(&self) -> Result<Arc<Vec<Goal>>> {
        self.cached(CacheKey::family(ResourceFamily::Goals), |api| async move {
            api.goals().await
        })
        .await
    }

    pub async fn create_goal(&self, data: &GoalNew) -> Result<Goal> {
        data.validate()?;
        self.mutate(Mutation::CreateGoal, self.api.create_goal(data))
            .await
    }

    pub async fn update_goal(&self, id: i64, data: &GoalUpdate) -> Result<Goal> {
        data.validate()?;
        self.mutate(Mutation::UpdateGoal, self.api.update_goal(id, data))
            .await
    }

    pub async fn delete_goal(&self, id: i64) -> Result<()> {
        self.mutate(Mutation::DeleteGoal, self.api.delete_goal(id))
            .await
    }

    pub async fn contribute(&self, id: i64, amount: f64) -> Result<Goal> {
        let amount = GoalAmount { amount };
        amount.validate()?;
        self.mutate(Mutation::ContributeGoal, self.api.contribute(id, amount))
            .await
    }

    pub async fn withdraw(&self, id: i64, amount: f64) -> Result<Goal> {
        let amount = GoalAmount { amount };
        amount.validate()?;
        self.mutate(Mutation::WithdrawGoal, self.api.withdraw(id, amount))
            .await
    }

    // Dashboard and reports

    pub async fn dashboard(&self) -> Result<Arc<Dashboard>> {
        self.cached(CacheKey::family(ResourceFamily::Dashboard), |api| async move {
            api.dashboard().await
        })
        .await
    }

    pub fn invalidate(&self, family: ResourceFamily) {
        self.cache.invalidate_family(family);
    }

    pub async fn income_expense_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<IncomeExpenseReport>> {
        check_range(start, end)?;
        let key = CacheKey::scoped(ResourceFamily::Reports, format!("income-expense:{start}:{end}"));
        self.cached(key, move |api| async move {
            api.income_expense_report(start, end).await
        })
        .await
    }

    pub async fn category_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<Vec<CategoryReport>>> {
        check_range(start, end)?;
        let key = CacheKey::scoped(ResourceFamily::Reports, format!("by-category:{start}:{end}"));
        self.cached(key, move |api| async move {
            api.category_report(start, end).await
        })
        .await
    }

    pub async fn trends(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Arc<Vec<TrendData>>> {
        check_range(start, end)?;
        let key = CacheKey::scoped(
            ResourceFamily::Reports,
            format!("trends:{start}:{end}:{}", interval.as_str()),
        );
        self.cached(key, move |api| async move {
            api.trends(start, end, interval).await
        })
        .await
    }

    pub async fn export_report(&self, format: ExportFormat, filters: &ReportFilters) -> Result<Vec<u8>> {
        check_range(filters.start_date, filters.end_date)?;
        let result = self.api.export_report(format, filters).await;
        self.guard(result)
    }

    /// Utilization of `budget` on `as_of`, computed from the transactions in
    /// its active window.
    pub async fn budget_usage(&self, budget: &Budget, as_of: NaiveDate) -> Result<BudgetUsage> {
        let Some((start, end)) =
            engine::budget::active_window(budget.period, budget.start_date, budget.end_date, as_of)
        else {
            return Ok(engine::utilization(budget, &Vec::<Transaction>::new(), as_of));
        };
        let filters = ReportFilters {
            start_date: start,
            end_date: end,
            account_id: None,
            category_id: budget.category_id,
            interval: Interval::from(budget.period),
        };
        let transactions = collect_transactions(&self.api, &filters).await;
        let transactions = self.guard(transactions)?;
        Ok(engine::utilization(budget, &transactions, as_of))
    }

    /// Builds a report locally from every transaction in the range.
    pub async fn local_report(&self, filters: &ReportFilters) -> Result<Arc<Report>> {
        check_range(filters.start_date, filters.end_date)?;
        let key = CacheKey::with_params(ResourceFamily::Reports, &("local", filters));
        let filters = filters.clone();
        self.cached(key, move |api| async move {
            let categories = api.categories(None).await?;
            let transactions = collect_transactions(&api, &filters).await?;
            debug!(
                "aggregating {} transactions from {} to {}",
                transactions.len(),
                filters.start_date,
                filters.end_date
            );
            Ok(engine::aggregate(&transactions, &categories, &filters)?)
        })
        .await
    }
}

/// Walks every page of transactions in the range.
///
/// The walk is bounded by the `last_page` of the first answer, and every
/// answer must be the page that was asked for.
async fn collect_transactions(api: &ApiClient, filters: &ReportFilters) -> Result<Vec<Transaction>> {
    let mut query = TransactionFilters {
        account_id: filters.account_id,
        category_id: filters.category_id,
        start_date: Some(filters.start_date),
        end_date: Some(filters.end_date),
        page: Some(1),
        per_page: Some(REPORT_PAGE_SIZE),
        ..Default::default()
    };

    let mut out = Vec::new();
    let mut expected = 1;
    let mut last_page = None;
    loop {
        let page = api.transactions(&query).await?;
        let current = page.meta.current_page;
        if current != expected {
            return Err(ClientError::Decode(format!(
                "asked for transactions page {expected}, got page {current}"
            )));
        }
        let last = *last_page.get_or_insert(page.meta.last_page);
        out.extend(page.data);
        if current >= last {
            break;
        }
        expected = current + 1;
        query.page = Some(expected);
    }
    Ok(out)
}
