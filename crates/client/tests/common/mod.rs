//! In-process mock of the finance API for integration tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use serde_json::{Value, json};
use tokio::sync::oneshot;

use client::Session;

pub const TOKEN: &str = "test-token";
pub const PASSWORD: &str = "secret123";

#[derive(Default)]
pub struct MockState {
    hits: Mutex<HashMap<String, usize>>,
    /// Delay applied to `GET /accounts`, in milliseconds.
    pub accounts_delay_ms: AtomicU64,
    /// When set every authenticated route answers `401`.
    pub expired: AtomicBool,
    pub fail_logout: AtomicBool,
    /// Answer `GET /categories` as a tree nested through `children`.
    pub nested_categories: AtomicBool,
    /// Report Groceries (1) as a child of Rent (2).
    pub groceries_under_rent: AtomicBool,
    /// `GET /transactions` keeps answering page 1 of 2 whatever is asked.
    pub stuck_pages: AtomicBool,
    pub last_authorization: Mutex<Option<String>>,
    pub last_query: Mutex<HashMap<String, String>>,
    pub imported: Mutex<Option<Vec<u8>>>,
}

impl MockState {
    fn hit(&self, route: &str) {
        let mut hits = self.hits.lock().unwrap();
        *hits.entry(route.to_string()).or_default() += 1;
    }

    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }
}

type Shared = Arc<MockState>;

/// Mock API server bound to an ephemeral local port.
pub struct MockApi {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    pub state: Shared,
}

impl MockApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(MockState::default());
        let app = Router::new()
            .route("/v1/login", post(login))
            .route("/v1/logout", post(logout))
            .route("/v1/me", get(me))
            .route("/accounts", get(accounts).post(create_account))
            .route("/accounts/{id}", delete(delete_account))
            .route("/accounts/{id}/toggle-active", patch(toggle_account))
            .route("/categories", get(categories))
            .route("/categories/{id}", put(update_category))
            .route("/transactions", get(transactions).post(create_transaction))
            .route("/transactions/{id}", delete(delete_transaction))
            .route("/transactions/import", post(import_transactions))
            .route("/transactions/export", get(export_transactions))
            .route("/budgets", get(budgets))
            .route("/goals", get(goals))
            .route("/goals/{id}/contribute", post(contribute))
            .route("/dashboard", get(dashboard))
            .route("/reports/export", get(export_report))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            state,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn session(&self) -> Session {
        Session::connect(&self.url(), Duration::from_secs(5)).unwrap()
    }

    /// A session already holding a valid token.
    pub fn signed_in(&self) -> Session {
        let session = self.session();
        session.resume(TOKEN);
        session
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.stop();
    }
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_authorization.lock().unwrap() = value.clone();

    if state.expired.load(Ordering::SeqCst) || value.as_deref() != Some(format!("Bearer {TOKEN}").as_str()) {
        return Err(fail(StatusCode::UNAUTHORIZED, "Unauthenticated."));
    }
    Ok(())
}

fn user() -> Value {
    json!({ "id": 1, "name": "Ada", "email": "ada@example.com" })
}

fn account(id: i64, name: &str, balance: &str) -> Value {
    json!({
        "id": id, "name": name, "type": "checking", "balance": balance,
        "currency": "USD", "is_active": true
    })
}

fn category(id: i64, name: &str, kind: &str, parent_id: Option<i64>) -> Value {
    json!({ "id": id, "user_id": 1, "name": name, "type": kind, "parent_id": parent_id })
}

fn transaction(id: i64, kind: &str, amount: f64, category_id: i64, date: &str) -> Value {
    json!({
        "id": id, "account_id": 1, "category_id": category_id, "type": kind,
        "amount": format!("{amount:.2}"), "transaction_date": date
    })
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.hit("login");
    if body["password"] != PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    ok(json!({ "user": user(), "token": TOKEN }))
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("logout");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if state.fail_logout.load(Ordering::SeqCst) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Server Error");
    }
    ok(Value::Null)
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("me");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    ok(user())
}

async fn accounts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("accounts");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let delay = state.accounts_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    ok(json!([account(1, "Checking", "1250.50"), account(2, "Card", "-300.00")]))
}

async fn create_account(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("create_account");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let name = body["name"].as_str().unwrap_or_default();
    ok(account(3, name, "0"))
}

async fn delete_account(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.hit("delete_account");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if id != 1 && id != 2 {
        return fail(StatusCode::NOT_FOUND, "Not found");
    }
    ok(Value::Null)
}

async fn toggle_account(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.hit("toggle_account");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let mut toggled = account(id, "Checking", "1250.50");
    toggled["is_active"] = json!(false);
    ok(toggled)
}

async fn categories(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("categories");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let groceries_parent = state
        .groceries_under_rent
        .load(Ordering::SeqCst)
        .then_some(2);
    let all = vec![
        category(1, "Groceries", "expense", groceries_parent),
        category(2, "Rent", "expense", None),
        category(3, "Salary", "income", None),
        category(4, "Fresh produce", "expense", Some(1)),
    ];
    let filtered: Vec<Value> = match query.get("type") {
        Some(kind) => all.into_iter().filter(|c| c["type"] == kind.as_str()).collect(),
        None => all,
    };
    if state.nested_categories.load(Ordering::SeqCst) {
        return ok(json!(nest(&filtered, None)));
    }
    ok(json!(filtered))
}

fn nest(all: &[Value], parent: Option<i64>) -> Vec<Value> {
    all.iter()
        .filter(|c| c["parent_id"].as_i64() == parent)
        .map(|c| {
            let mut node = c.clone();
            node["children"] = json!(nest(all, c["id"].as_i64()));
            node
        })
        .collect()
}

async fn update_category(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    state.hit("update_category");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let parent_id = body["parent_id"].as_i64();
    ok(category(id, "Groceries", "expense", parent_id))
}

async fn transactions(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("transactions");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    *state.last_query.lock().unwrap() = query.clone();

    let page: u64 = if state.stuck_pages.load(Ordering::SeqCst) {
        1
    } else {
        query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1)
    };
    let data = if page == 1 {
        json!([
            transaction(1, "expense", 100.0, 1, "2024-01-05"),
            transaction(2, "expense", 50.0, 2, "2024-01-10"),
        ])
    } else {
        json!([transaction(3, "income", 500.0, 3, "2024-01-15T09:30:00.000000Z")])
    };
    Json(json!({
        "data": data,
        "meta": {
            "current_page": page, "from": null, "last_page": 2,
            "per_page": 2, "to": null, "total": 3
        }
    }))
    .into_response()
}

async fn create_transaction(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("create_transaction");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let amount = body["amount"].as_f64().unwrap_or_default();
    if amount > 10_000.0 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "message": "The given data was invalid.",
                "errors": { "amount": ["The amount may not be greater than 10000."] }
            })),
        )
            .into_response();
    }
    let mut created = transaction(
        10,
        body["type"].as_str().unwrap_or("expense"),
        amount,
        body["category_id"].as_i64().unwrap_or(1),
        body["transaction_date"].as_str().unwrap_or("2024-01-01"),
    );
    created["account_id"] = body["account_id"].clone();
    ok(created)
}

async fn delete_transaction(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    state.hit("delete_transaction");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    ok(Value::Null)
}

async fn import_transactions(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    state.hit("import");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    *state.imported.lock().unwrap() = Some(body.to_vec());
    ok(json!({ "imported": 2 }))
}

async fn export_transactions(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("export_transactions");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    (
        [(header::CONTENT_TYPE, "text/csv")],
        "id,amount\n1,100.00\n2,50.00\n",
    )
        .into_response()
}

async fn budgets(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("budgets");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    ok(json!([{
        "id": 1, "category_id": 1, "amount": "400.00", "period": "monthly",
        "start_date": "2024-01-01", "end_date": null, "is_active": true,
        "utilization": { "spent": 100, "percentage": 25, "remaining": 300 }
    }]))
}

async fn goals(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("goals");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    ok(json!([{
        "id": 1, "name": "Holiday", "target_amount": 1000, "current_amount": 250,
        "deadline": "2024-12-31", "status": "active", "progress_percentage": 25
    }]))
}

async fn contribute(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    state.hit("contribute");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let amount = body["amount"].as_f64().unwrap_or_default();
    ok(json!({
        "id": id, "name": "Holiday", "target_amount": 1000,
        "current_amount": 250.0 + amount, "status": "active"
    }))
}

async fn dashboard(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("dashboard");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    ok(json!({
        "total_balance": 950.5,
        "total_income": 500,
        "total_expenses": 150,
        "net_income": 350,
        "accounts": [],
        "recent_transactions": [],
        "budgets": [],
        "goals": [],
        "spending_by_category": [{
            "category_id": 1, "category_name": "Groceries",
            "total_amount": 100, "percentage": 66.67, "color": "#22c55e"
        }],
        "income_vs_expense_trend": [{ "date": "2024-01", "income": 500, "expense": 150 }]
    }))
}

async fn export_report(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("export_report");
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    *state.last_query.lock().unwrap() = query.clone();
    let kind = query.get("type").cloned().unwrap_or_default();
    format!("report:{kind}").into_response()
}
