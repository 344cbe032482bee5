//! HTTP routes for the habit API.
//!
//! # Responsibility
//! - Shape query strings and JSON bodies into core requests.
//! - Run store work on the blocking pool, one operation per request.
//! - Log every request with its status and duration.
//!
//! # Invariants
//! - Unknown `/api/*` routes answer 404 `{"error":"API route not found"}`.
//! - Bodies over `MAX_BODY_BYTES` are refused with 413.
//! - Handlers never hold the store lock across an await point.

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, Local};
use habit_core::stats::{summarize_month, HabitProgress, MonthSummary};
use habit_core::{
    search_habits, Habit, HabitId, HabitListQuery, HabitListRequest, HabitService, HabitStore,
    HabitUpdate, NewHabit, ServiceResult, SqliteHabitRepository, RECENT_HABITS_LIMIT,
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<HabitStore>,
}

impl AppState {
    pub fn new(store: Arc<HabitStore>) -> Self {
        Self { store }
    }
}

/// Builds the full application router.
pub fn router(store: Arc<HabitStore>) -> Router {
    let api = Router::new()
        .route("/habits", get(list_habits).post(create_habit))
        .route(
            "/habits/{id}",
            get(get_habit).put(update_habit).delete(delete_habit),
        )
        .route("/habits/{id}/progress", get(habit_progress))
        .route("/search", get(search))
        .route("/stats", get(month_stats))
        .fallback(api_not_found);

    let layers = ServiceBuilder::new()
        .layer(middleware::from_fn(log_request))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    Router::new()
        .nest("/api", api)
        .layer(layers)
        .with_state(AppState::new(store))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    category: Option<String>,
    sort: Option<String>,
    fields: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MonthParams {
    year: Option<String>,
    month: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    #[serde(rename = "_id")]
    id: HabitId,
    title: String,
    year: i32,
    month: u32,
    #[serde(flatten)]
    progress: HabitProgress,
}

async fn list_habits(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let request = HabitListRequest::from_params(
        params.category.as_deref(),
        params.sort.as_deref(),
        params.fields.as_deref(),
    );
    let query = request.query.clone();
    let habits = with_service(&state, move |service| service.list(&query)).await?;
    let body = request.render(&habits).map_err(ApiError::internal)?;
    Ok(Json(body))
}

async fn get_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Habit>, ApiError> {
    let habit = with_service(&state, move |service| service.get(&id)).await?;
    Ok(Json(habit))
}

async fn create_habit(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let input = NewHabit::from_json(&parse_json_body(&body)?);
    let habit = with_service(&state, move |service| service.create(&input)).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Habit>, ApiError> {
    let update = HabitUpdate::from_json(&parse_json_body(&body)?);
    let habit = with_service(&state, move |service| service.update(&id, &update)).await?;
    Ok(Json(habit))
}

async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    with_service(&state, move |service| service.delete(&id)).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}

async fn habit_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MonthParams>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let (year, month) = resolve_month(&params)?;
    let habit = with_service(&state, move |service| service.get(&id)).await?;
    let progress = HabitProgress::for_month(&habit, year, month);
    Ok(Json(ProgressResponse {
        id: habit.id,
        title: habit.title,
        year,
        month,
        progress,
    }))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let habits = with_service(&state, |service| service.list(&HabitListQuery::default())).await?;
    let query = params.q.unwrap_or_default();
    let found = search_habits(&habits, &query, RECENT_HABITS_LIMIT)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(found))
}

async fn month_stats(
    State(state): State<AppState>,
    Query(params): Query<MonthParams>,
) -> Result<Json<MonthSummary>, ApiError> {
    let (year, month) = resolve_month(&params)?;
    let habits = with_service(&state, |service| service.list(&HabitListQuery::default())).await?;
    Ok(Json(summarize_month(&habits, year, month)))
}

async fn api_not_found() -> ApiError {
    ApiError::api_route_not_found()
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started_at = Instant::now();

    let response = next.run(request).await;

    info!(
        "event=http_request module=http method={} path={} status={} duration_ms={}",
        method,
        uri,
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}

/// Runs one service call against the shared store on the blocking pool.
async fn with_service<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: for<'c> FnOnce(&HabitService<SqliteHabitRepository<'c>>) -> ServiceResult<T>
        + Send
        + 'static,
{
    let store = Arc::clone(&state.store);
    let outcome = tokio::task::spawn_blocking(move || -> ServiceResult<T> {
        let conn = store.collection()?;
        let repo = SqliteHabitRepository::try_new(&conn)?;
        op(&HabitService::new(repo))
    })
    .await
    .map_err(ApiError::internal)?;

    outcome.map_err(ApiError::from)
}

/// Parses a JSON request body; an empty body reads as `{}`.
fn parse_json_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|_| ApiError::bad_request("invalid JSON body"))
}

/// Resolves `year`/`month` query values, defaulting to the current local
/// month.
fn resolve_month(params: &MonthParams) -> Result<(i32, u32), ApiError> {
    let today = Local::now().date_naive();

    let year = match params.year.as_deref().map(str::trim) {
        None | Some("") => today.year(),
        Some(raw) => raw
            .parse::<i32>()
            .ok()
            .filter(|year| (1..=9999).contains(year))
            .ok_or_else(|| ApiError::bad_request("year must be 1-9999"))?,
    };
    let month = match params.month.as_deref().map(str::trim) {
        None | Some("") => today.month(),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|month| (1..=12).contains(month))
            .ok_or_else(|| ApiError::bad_request("month must be 1-12"))?,
    };

    Ok((year, month))
}
