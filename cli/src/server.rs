use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use fitlog_core::TrackerService;
use fitlog_core::macros::MacroResult;
use fitlog_core::models::{
    DailyTotals, DaySummary, FoodLogEntry, SavedFood, TdeeSetting, TimeOfDay, WeightLogEntry,
    WeightWithCalories, parse_date,
};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<TrackerService>>,
    api_key: Option<String>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, TrackerService> {
        self.svc.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct SettingsRequest {
    tdee: i64,
    goal: String,
}

#[derive(Serialize)]
struct SettingsResponse {
    settings: Option<TdeeSetting>,
    targets: MacroResult,
}

#[derive(Deserialize)]
struct CreateFoodRequest {
    date: String,
    name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

#[derive(Deserialize)]
struct UpdateFoodRequest {
    name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

#[derive(Serialize)]
struct DayFoodsResponse {
    entries: Vec<FoodLogEntry>,
    totals: DailyTotals,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct CreateWeightRequest {
    date: String,
    time_of_day: String,
    weight: f64,
}

#[derive(Deserialize)]
struct WeightListQuery {
    time_of_day: Option<String>,
}

#[derive(Serialize)]
struct LatestWeightResponse {
    weight: Option<f64>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<fitlog_core::Error> for ApiError {
    fn from(err: fitlog_core::Error) -> Self {
        match err {
            fitlog_core::Error::NotFound(msg) => Self::NotFound(msg),
            e if e.is_client_error() => Self::BadRequest(e.to_string()),
            e => Self::Internal(e.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Settings handlers ---

async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsResponse>, ApiError> {
    let svc = state.svc();
    let settings = svc.tdee_setting()?;
    let targets = svc.macro_targets()?;
    Ok(Json(SettingsResponse { settings, targets }))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let svc = state.svc();
    let settings = svc.set_settings(req.tdee, &req.goal)?;
    let targets = svc.macro_targets()?;
    Ok(Json(SettingsResponse {
        settings: Some(settings),
        targets,
    }))
}

async fn delete_settings(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.svc().clear_settings()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_macros(State(state): State<AppState>) -> Result<Json<MacroResult>, ApiError> {
    let targets = state.svc().macro_targets()?;
    Ok(Json(targets))
}

// --- Food handlers ---

async fn create_food(
    State(state): State<AppState>,
    Json(req): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodLogEntry>), ApiError> {
    let date = parse_date(&req.date)?;
    let entry = state.svc().add_food(
        date,
        &req.name,
        req.calories,
        req.protein,
        req.carbs,
        req.fat,
    )?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateFoodRequest>,
) -> Result<Json<FoodLogEntry>, ApiError> {
    let entry = state.svc().edit_food(
        id,
        &req.name,
        req.calories,
        req.protein,
        req.carbs,
        req.fat,
    )?;
    Ok(Json(entry))
}

async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.svc().delete_food(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_foods_for_day(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<DayFoodsResponse>, ApiError> {
    let date = parse_date(&date_str)?;
    let svc = state.svc();
    let entries = svc.list_foods_for_date(date)?;
    let totals = DailyTotals::from_entries(&entries);
    Ok(Json(DayFoodsResponse { entries, totals }))
}

async fn get_day_summary(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<DaySummary>, ApiError> {
    let date = parse_date(&date_str)?;
    let summary = state.svc().day_summary(date)?;
    Ok(Json(summary))
}

// --- Saved food handlers ---

async fn search_saved_foods(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SavedFood>>, ApiError> {
    let foods = state.svc().search_saved_foods(&params.q)?;
    Ok(Json(foods))
}

async fn get_saved_food(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SavedFood>, ApiError> {
    let food = state
        .svc()
        .find_saved_food(&name)?
        .ok_or_else(|| ApiError::NotFound(format!("No saved food named '{name}'")))?;
    Ok(Json(food))
}

// --- Weight handlers ---

async fn create_weight(
    State(state): State<AppState>,
    Json(req): Json<CreateWeightRequest>,
) -> Result<(StatusCode, Json<WeightLogEntry>), ApiError> {
    let date = parse_date(&req.date)?;
    let time_of_day: TimeOfDay = req.time_of_day.parse()?;
    let entry = state.svc().add_weight(date, time_of_day, req.weight)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_weight(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.svc().delete_weight(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_weights(
    State(state): State<AppState>,
    Query(params): Query<WeightListQuery>,
) -> Result<Json<Vec<WeightWithCalories>>, ApiError> {
    let time_of_day: TimeOfDay = match params.time_of_day {
        Some(s) => s.parse()?,
        None => TimeOfDay::Morning,
    };
    let rows = state.svc().list_weights(time_of_day)?;
    Ok(Json(rows))
}

async fn get_latest_weight(
    State(state): State<AppState>,
) -> Result<Json<LatestWeightResponse>, ApiError> {
    let weight = state.svc().latest_weight()?;
    Ok(Json(LatestWeightResponse { weight }))
}

// --- Export handlers ---

async fn export_csv(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let mut buf = Vec::new();
    {
        let svc = state.svc();
        match kind.as_str() {
            "foods" => svc.export_foods_csv(&mut buf)?,
            "weights" => svc.export_weights_csv(&mut buf)?,
            "saved-foods" => svc.export_saved_foods_csv(&mut buf)?,
            _ => return Err(ApiError::NotFound(format!("Unknown export '{kind}'"))),
        };
    }
    let body = String::from_utf8(buf).context("CSV export was not valid UTF-8")?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response())
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/settings",
            get(get_settings).put(put_settings).delete(delete_settings),
        )
        .route("/api/macros", get(get_macros))
        .route("/api/foods", post(create_food))
        .route("/api/foods/{id}", put(update_food).delete(delete_food))
        .route("/api/foods/day/{date}", get(get_foods_for_day))
        .route("/api/summary/{date}", get(get_day_summary))
        .route("/api/saved-foods", get(search_saved_foods))
        .route("/api/saved-foods/{name}", get(get_saved_food))
        .route("/api/weights", post(create_weight).get(list_weights))
        .route("/api/weights/latest", get(get_latest_weight))
        .route("/api/weights/{id}", delete(delete_weight))
        .route("/api/export/{kind}", get(export_csv))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    svc: TrackerService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        let tail = key.get(key.len().saturating_sub(4)..).unwrap_or_default();
        info!("API key ends in ...{tail} (see api_key file in data directory)");
    } else {
        warn!("authentication disabled (--no-auth), API is open to anyone");
        if bind != "127.0.0.1" && bind != "localhost" {
            warn!("listening on {bind} with no authentication");
        }
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
