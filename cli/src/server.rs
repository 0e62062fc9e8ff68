use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use mealcoach_core::models::{
    CompletionRecord, CustomFood, InvalidInput, MealPlan, NewMealPlan, validate_macro_type,
};
use mealcoach_core::quantity::Quantity;
use mealcoach_core::reconcile::{CompletionWrite, ReconcilePolicy};
use mealcoach_core::service::{LedgerService, RecordedChoice};
use mealcoach_core::view::{CategoryView, DayView};

const BODY_LIMIT: usize = 2 * 1024 * 1024; // 2 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<LedgerService>>,
    api_key: Option<String>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, LedgerService> {
        self.svc
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

/// Either a catalog selection (`food_option_id` + `quantity`) or a `custom` food.
#[derive(Deserialize)]
struct CreateChoiceRequest {
    meal_slot_id: Option<i64>,
    food_option_id: Option<i64>,
    quantity: Option<Quantity>,
    custom: Option<CustomFood>,
}

#[derive(Deserialize)]
struct UpdateChoiceRequest {
    quantity: Option<Quantity>,
}

#[derive(Deserialize)]
struct SetCompletionRequest {
    is_completed: bool,
}

#[derive(Deserialize, Serialize)]
struct ToleranceBody {
    tolerance: f64,
}

#[derive(Serialize)]
struct DeletedChoice {
    deleted: i64,
    completions: Vec<CompletionWrite>,
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
                error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Input the caller can fix is a 400; anything else (storage, I/O) stays internal.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<InvalidInput>() {
            Some(invalid) => Self::BadRequest(invalid.to_string()),
            None => Self::Internal(err),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{raw}'. Use YYYY-MM-DD")))
}

fn require_plan(svc: &LedgerService, client: &str) -> Result<MealPlan, ApiError> {
    svc.active_plan(client)?
        .ok_or_else(|| ApiError::NotFound(format!("No active meal plan for client '{client}'")))
}

fn require_choice(svc: &LedgerService, client: &str, id: i64) -> Result<(), ApiError> {
    match svc.db().find_choice(id)? {
        Some(choice) if choice.client_id == client => Ok(()),
        _ => Err(ApiError::NotFound(format!("Choice {id} not found"))),
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

// --- Handlers ---

async fn get_plan(
    State(state): State<AppState>,
    Path(client): Path<String>,
) -> Result<Json<MealPlan>, ApiError> {
    let svc = state.svc();
    Ok(Json(require_plan(&svc, &client)?))
}

async fn put_plan(
    State(state): State<AppState>,
    Path(client): Path<String>,
    Json(req): Json<NewMealPlan>,
) -> Result<(StatusCode, Json<MealPlan>), ApiError> {
    let svc = state.svc();
    let plan = svc.import_plan(&client, &req)?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_day(
    State(state): State<AppState>,
    Path((client, date)): Path<(String, String)>,
) -> Result<Json<DayView>, ApiError> {
    let date = parse_date(&date)?;
    let svc = state.svc();
    require_plan(&svc, &client)?;
    Ok(Json(svc.day_view(&client, date)?))
}

async fn reconcile_day(
    State(state): State<AppState>,
    Path((client, date)): Path<(String, String)>,
) -> Result<Json<Vec<CompletionWrite>>, ApiError> {
    let date = parse_date(&date)?;
    let svc = state.svc();
    require_plan(&svc, &client)?;
    Ok(Json(svc.reconcile(&client, date)?))
}

async fn create_choice(
    State(state): State<AppState>,
    Path((client, date)): Path<(String, String)>,
    Json(req): Json<CreateChoiceRequest>,
) -> Result<(StatusCode, Json<RecordedChoice>), ApiError> {
    let date = parse_date(&date)?;
    let svc = state.svc();
    require_plan(&svc, &client)?;

    let recorded = match (req.food_option_id, req.custom) {
        (Some(option_id), None) => {
            svc.record_choice(&client, date, req.meal_slot_id, option_id, req.quantity)?
        }
        (None, Some(custom)) => {
            if req.quantity.is_some() {
                return Err(ApiError::BadRequest(
                    "Custom foods carry absolute macros and take no quantity".to_string(),
                ));
            }
            svc.record_custom_food(&client, date, req.meal_slot_id, custom)?
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Provide exactly one of food_option_id or custom".to_string(),
            ));
        }
    };
    Ok((StatusCode::CREATED, Json(recorded)))
}

async fn update_choice(
    State(state): State<AppState>,
    Path((client, id)): Path<(String, i64)>,
    Json(req): Json<UpdateChoiceRequest>,
) -> Result<Json<RecordedChoice>, ApiError> {
    let svc = state.svc();
    require_choice(&svc, &client, id)?;
    Ok(Json(svc.update_choice_quantity(id, req.quantity)?))
}

async fn delete_choice(
    State(state): State<AppState>,
    Path((client, id)): Path<(String, i64)>,
) -> Result<Json<DeletedChoice>, ApiError> {
    let svc = state.svc();
    require_choice(&svc, &client, id)?;
    let completions = svc.delete_choice(id)?;
    Ok(Json(DeletedChoice {
        deleted: id,
        completions,
    }))
}

async fn set_completion(
    State(state): State<AppState>,
    Path((client, date, slot_id)): Path<(String, String, i64)>,
    Json(req): Json<SetCompletionRequest>,
) -> Result<Json<CompletionRecord>, ApiError> {
    let date = parse_date(&date)?;
    let svc = state.svc();
    let plan = require_plan(&svc, &client)?;
    if plan.slot(slot_id).is_none() {
        return Err(ApiError::NotFound(format!("Meal slot {slot_id} not found")));
    }
    Ok(Json(svc.set_completion(
        &client,
        date,
        slot_id,
        req.is_completed,
    )?))
}

async fn get_allowance(
    State(state): State<AppState>,
    Path((client, date, slot_id, macro_type)): Path<(String, String, i64, String)>,
) -> Result<Json<CategoryView>, ApiError> {
    let date = parse_date(&date)?;
    let macro_type = validate_macro_type(&macro_type)?;
    let svc = state.svc();
    let plan = require_plan(&svc, &client)?;
    let Some(slot) = plan.slot(slot_id) else {
        return Err(ApiError::NotFound(format!("Meal slot {slot_id} not found")));
    };
    if slot.category(macro_type).is_none() {
        return Err(ApiError::NotFound(format!(
            "Meal slot {slot_id} has no {macro_type} category"
        )));
    }
    Ok(Json(svc.category_allowance(&client, date, slot_id, macro_type)?))
}

async fn get_tolerance(State(state): State<AppState>) -> Result<Json<ToleranceBody>, ApiError> {
    let policy = state.svc().policy()?;
    Ok(Json(ToleranceBody {
        tolerance: policy.tolerance,
    }))
}

async fn put_tolerance(
    State(state): State<AppState>,
    Json(req): Json<ToleranceBody>,
) -> Result<Json<ReconcilePolicy>, ApiError> {
    let policy = state.svc().set_tolerance(req.tolerance)?;
    Ok(Json(policy))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/clients/{client}/plan", get(get_plan).put(put_plan))
        .route("/api/clients/{client}/days/{date}", get(get_day))
        .route(
            "/api/clients/{client}/days/{date}/reconcile",
            post(reconcile_day),
        )
        .route(
            "/api/clients/{client}/days/{date}/choices",
            post(create_choice),
        )
        .route(
            "/api/clients/{client}/choices/{id}",
            put(update_choice).delete(delete_choice),
        )
        .route(
            "/api/clients/{client}/days/{date}/completions/{slot_id}",
            put(set_completion),
        )
        .route(
            "/api/clients/{client}/days/{date}/slots/{slot_id}/allowance/{macro_type}",
            get(get_allowance),
        )
        .route(
            "/api/settings/tolerance",
            get(get_tolerance).put(put_tolerance),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    svc: LedgerService,
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
        let prefix = key.get(..4).unwrap_or_default();
        let suffix = key.get(key.len().saturating_sub(4)..).unwrap_or_default();
        eprintln!("API key: {prefix}...{suffix} (see api_key file in data directory)");
    } else {
        warn!("authentication disabled (--no-auth); API is open to anyone");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        warn!(
            bind,
            "listening on a non-loopback address with no authentication"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
