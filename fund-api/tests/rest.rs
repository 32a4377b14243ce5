//! REST clients against a mock backend
//!
//! Run with: cargo test -p fund-api --test rest

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fund_api::{ApiClient, ApiConfig, FundApi, InvestmentApi, Origin, PortfolioApi};
use fund_core::{
    FundCategory, FundError, FundFilter, GrowthPeriod, InvestmentRequest, OrderStatus,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

const TOKEN: &str = "t0k";

#[derive(Clone, Default)]
struct Backend {
    hits: Arc<AtomicUsize>,
    last_query: Arc<parking_lot::Mutex<HashMap<String, String>>>,
    last_body: Arc<parking_lot::Mutex<Value>>,
    huge_allocation: Arc<AtomicBool>,
}

fn fund_json(id: &str, one_year: &str) -> Value {
    json!({
        "id": id,
        "name": format!("{} Fund", id),
        "category": "equity",
        "risk_level": "very_high",
        "nav": "101.25",
        "expense_ratio": "0.55",
        "returns": {"one_year": one_year},
        "min_investment": "500",
        "min_sip_amount": "100"
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn list_funds(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    *backend.last_query.lock() = query;
    Json(json!([fund_json("ALPHA", "12.5"), fund_json("BETA", "18.0")])).into_response()
}

async fn search_funds(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    *backend.last_query.lock() = query;
    Json(json!([fund_json("ALPHA", "12.5")]))
}

async fn get_fund(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    if id == "ALPHA" {
        Json(fund_json("ALPHA", "12.5")).into_response()
    } else {
        (StatusCode::NOT_FOUND, format!("no fund {}", id)).into_response()
    }
}

async fn compare_funds(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    *backend.last_body.lock() = body;
    // No best_one_year: the client computes it
    Json(json!({"funds": [fund_json("ALPHA", "12.5"), fund_json("BETA", "18.0")]}))
}

async fn nav_history(
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if id != "ALPHA" || query.get("period").map(String::as_str) != Some("3M") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!([
        {"date": "2024-01-31", "nav": "100.00"},
        {"date": "2024-02-29", "nav": "104.75"}
    ]))
    .into_response()
}

async fn summary(State(backend): State<Backend>) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn allocation(State(backend): State<Backend>) -> Json<Value> {
    if backend.huge_allocation.load(Ordering::SeqCst) {
        return Json(json!([
            {"category": "equity", "value": "70000000000000000000000000000"},
            {"category": "debt", "value": "70000000000000000000000000000"}
        ]));
    }
    Json(json!([
        {"category": "equity", "value": "75000"},
        {"category": "debt", "value": "25000", "percent": "25"}
    ]))
}

async fn holdings() -> &'static str {
    "definitely not json"
}

async fn initiate(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    *backend.last_body.lock() = body.clone();
    Json(json!({
        "order_id": "ORD-77",
        "fund_id": body["fund_id"],
        "amount": body["amount"],
        "kind": body["kind"],
        "status": "pending",
        "payment_url": "https://pay.example.com/ORD-77",
        "created_at": "2024-06-01T10:00:00Z"
    }))
}

async fn confirm(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "order_id": id,
        "fund_id": "ALPHA",
        "amount": "5000",
        "kind": "lumpsum",
        "status": if body["payment_reference"] == "PAY-1" { "confirmed" } else { "failed" },
        "created_at": "2024-06-01T10:00:00Z"
    }))
}

async fn start_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/funds", get(list_funds))
        .route("/api/funds/search", get(search_funds))
        .route("/api/funds/compare", post(compare_funds))
        .route("/api/funds/{id}", get(get_fund))
        .route("/api/funds/{id}/nav", get(nav_history))
        .route("/api/portfolio/summary", get(summary))
        .route("/api/portfolio/allocation", get(allocation))
        .route("/api/portfolio/holdings", get(holdings))
        .route("/api/investments", post(initiate))
        .route("/api/investments/{id}/confirm", post(confirm))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), backend)
}

fn http(base_url: &str, token: Option<&str>) -> ApiClient {
    let mut config = ApiConfig::default().with_base_url(base_url);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    ApiClient::new(&config).unwrap()
}

/// Base URL with nothing listening behind it
async fn unreachable_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

// ============================================================================
// Funds
// ============================================================================

#[tokio::test]
async fn test_list_funds_sends_token_and_filter() {
    let (base, backend) = start_backend().await;
    let api = FundApi::new(http(&base, Some(TOKEN)));

    let filter = FundFilter {
        category: Some(FundCategory::Equity),
        limit: Some(10),
        ..Default::default()
    };
    let funds = api.list_funds(&filter).await.unwrap();
    assert_eq!(funds.len(), 2);
    assert_eq!(funds[1].returns.one_year, dec!(18.0));

    let query = backend.last_query.lock().clone();
    assert_eq!(query.get("category").map(String::as_str), Some("equity"));
    assert_eq!(query.get("limit").map(String::as_str), Some("10"));
    assert!(!query.contains_key("max_risk"));
}

#[tokio::test]
async fn test_missing_token_is_auth_error() {
    let (base, _backend) = start_backend().await;
    let api = FundApi::new(http(&base, None));

    let err = api.list_funds(&FundFilter::default()).await.unwrap_err();
    assert_eq!(err, FundError::auth("missing token"));

    let fetched = api.list_funds_or_demo(&FundFilter::default()).await;
    assert!(fetched.is_demo());
    assert!(!fetched.data.is_empty());
}

#[tokio::test]
async fn test_get_fund_not_found() {
    let (base, _backend) = start_backend().await;
    let api = FundApi::new(http(&base, None));

    assert_eq!(api.get_fund("ALPHA").await.unwrap().nav, dec!(101.25));
    assert_eq!(
        api.get_fund("GHOST").await.unwrap_err(),
        FundError::not_found("no fund GHOST")
    );

    // Unknown to the demo catalogue too: the live error surfaces
    assert!(matches!(
        api.get_fund_or_demo("GHOST").await,
        Err(FundError::NotFound(_))
    ));

    // Known to the demo catalogue: served from it
    let fetched = api.get_fund_or_demo("WILLOW-LIQUID").await.unwrap();
    assert!(fetched.is_demo());
    assert_eq!(fetched.data.category, FundCategory::Liquid);
}

#[tokio::test]
async fn test_empty_search_sends_nothing() {
    let (base, backend) = start_backend().await;
    let api = FundApi::new(http(&base, None));

    assert!(api.search_funds("   ").await.unwrap().is_empty());
    assert_eq!(backend.hits.load(Ordering::SeqCst), 0);

    let found = api.search_funds(" alpha ").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(
        backend.last_query.lock().get("q").map(String::as_str),
        Some("alpha")
    );
}

#[tokio::test]
async fn test_compare_needs_two_and_computes_leader() {
    let (base, backend) = start_backend().await;
    let api = FundApi::new(http(&base, None));

    let err = api.compare_funds(&["ALPHA", " ALPHA "]).await.unwrap_err();
    assert!(err.is_validation());
    assert!(api.compare_funds_or_demo(&["ALPHA"]).await.is_err());
    assert_eq!(backend.hits.load(Ordering::SeqCst), 0);

    let comparison = api.compare_funds(&["ALPHA", "BETA"]).await.unwrap();
    assert_eq!(comparison.best_one_year.as_deref(), Some("BETA"));
    assert_eq!(
        *backend.last_body.lock(),
        json!({"fund_ids": ["ALPHA", "BETA"]})
    );
}

#[tokio::test]
async fn test_nav_history_passes_period() {
    let (base, _backend) = start_backend().await;
    let api = FundApi::new(http(&base, None));

    let history = api.nav_history("ALPHA", GrowthPeriod::ThreeMonths).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].nav, dec!(104.75));

    let err = api.nav_history("ALPHA", GrowthPeriod::OneYear).await.unwrap_err();
    assert_eq!(err, FundError::api(400, "Bad Request"));

    let fallback = api
        .nav_history_or_demo("ALPHA", GrowthPeriod::OneYear)
        .await
        .unwrap();
    assert!(fallback.is_demo());
}

#[tokio::test]
async fn test_blank_nav_history_id_not_replaced_by_demo() {
    let base = unreachable_base().await;
    let api = FundApi::new(http(&base, None));

    let err = api
        .nav_history_or_demo("  ", GrowthPeriod::OneMonth)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

// ============================================================================
// Portfolio
// ============================================================================

#[tokio::test]
async fn test_server_error_falls_back_to_demo() {
    let (base, _backend) = start_backend().await;
    let api = PortfolioApi::new(http(&base, None));

    assert_eq!(
        api.summary().await.unwrap_err(),
        FundError::api(500, "boom")
    );

    let fetched = api.summary_or_demo().await;
    assert_eq!(fetched.data, fund_api::demo::summary());
    assert_eq!(
        fetched.origin,
        Origin::Demo {
            reason: "API error (500): boom".to_string()
        }
    );
}

#[tokio::test]
async fn test_allocation_fills_missing_percent() {
    let (base, _backend) = start_backend().await;
    let api = PortfolioApi::new(http(&base, None));

    let fetched = api.allocation_or_demo().await;
    assert!(!fetched.is_demo());
    assert_eq!(fetched.data[0].percent, dec!(75));
    assert_eq!(fetched.data[1].percent, dec!(25));
}

#[tokio::test]
async fn test_oversized_allocation_falls_back_to_demo() {
    let (base, backend) = start_backend().await;
    backend.huge_allocation.store(true, Ordering::SeqCst);
    let api = PortfolioApi::new(http(&base, None));

    assert!(matches!(api.allocation().await, Err(FundError::Parse(_))));

    let fetched = api.allocation_or_demo().await;
    assert!(fetched.is_demo());
    assert_eq!(fetched.data, fund_api::demo::allocation());
}

#[tokio::test]
async fn test_undecodable_body_is_parse_error() {
    let (base, _backend) = start_backend().await;
    let api = PortfolioApi::new(http(&base, None));

    assert!(matches!(api.holdings().await, Err(FundError::Parse(_))));
    let fetched = api.holdings_or_demo().await;
    assert!(fetched.demo_reason().unwrap().starts_with("Parse error"));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let base = unreachable_base().await;
    let api = PortfolioApi::new(http(&base, None));

    assert!(matches!(api.summary().await, Err(FundError::Network(_))));

    let growth = api.growth_or_demo(GrowthPeriod::SixMonths).await;
    assert!(growth.is_demo());
    assert_eq!(growth.data.len(), 7);
}

// ============================================================================
// Investments
// ============================================================================

#[tokio::test]
async fn test_initiate_and_confirm_live() {
    let (base, backend) = start_backend().await;
    let api = InvestmentApi::new(http(&base, None));

    let order = api
        .initiate(&InvestmentRequest::sip("ALPHA", dec!(2500), 5))
        .await
        .unwrap();
    assert_eq!(order.order_id, "ORD-77");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.amount, dec!(2500));
    assert_eq!(backend.last_body.lock()["sip_day"], json!(5));

    let confirmed = api.confirm("ORD-77", "PAY-1").await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_invalid_request_never_sent_nor_replaced() {
    let (base, backend) = start_backend().await;
    let api = InvestmentApi::new(http(&base, None));

    let zero = InvestmentRequest::lumpsum("ALPHA", dec!(0));
    assert!(api.initiate(&zero).await.unwrap_err().is_validation());
    assert!(api.initiate_or_demo(&zero).await.unwrap_err().is_validation());

    let bad_day = InvestmentRequest::sip("ALPHA", dec!(1000), 31);
    assert!(api.initiate_or_demo(&bad_day).await.is_err());

    assert!(api.confirm("ORD-77", "  ").await.unwrap_err().is_validation());
    assert_eq!(backend.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_demo_order_book_when_offline() {
    let base = unreachable_base().await;
    let api = InvestmentApi::new(http(&base, None));

    // Below the catalogue minimum for this fund
    let too_small = InvestmentRequest::lumpsum("WILLOW-LIQUID", dec!(1000));
    assert!(api.initiate_or_demo(&too_small).await.unwrap_err().is_validation());

    let request = InvestmentRequest::lumpsum("WILLOW-LIQUID", dec!(10000));
    let created = api.initiate_or_demo(&request).await.unwrap();
    assert!(created.is_demo());
    assert_eq!(created.data.status, OrderStatus::Pending);

    let order_id = created.data.order_id.clone();
    let confirmed = api.confirm_or_demo(&order_id, "PAY-9").await.unwrap();
    assert_eq!(confirmed.data.status, OrderStatus::Confirmed);

    let listed = api.list_orders_or_demo().await;
    assert!(listed.is_demo());
    assert_eq!(listed.data[0].order_id, order_id);
    assert_eq!(listed.data[0].status, OrderStatus::Confirmed);

    let fetched = api.get_order_or_demo(&order_id).await.unwrap();
    assert_eq!(fetched.data.amount, dec!(10000));

    assert!(matches!(
        api.confirm_or_demo("DEMO-NOPE", "PAY-9").await,
        Err(FundError::Network(_))
    ));
}
