use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use diabeat_core::estimator::{estimate, parse_meal_time};
use diabeat_core::models::{DailyIntakeSnapshot, DiabetesScore, FoodRecord, GlucosePrediction};
use diabeat_core::reconcile::{NutritionProvider, ScanError, scan_barcode, valid_barcode};

const BODY_LIMIT: usize = 64 * 1024; // 64 KB

#[derive(Clone)]
struct AppState {
    usda: Arc<dyn NutritionProvider>,
    off: Arc<dyn NutritionProvider>,
    api_key: Option<String>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct EstimateRequest {
    carbs_g: f64,
    exercise_kcal: Option<f64>,
    water_ml: Option<f64>,
    /// RFC 3339; unparseable values count as unknown.
    last_meal_time: Option<String>,
}

#[derive(Serialize)]
struct ScanResponse {
    #[serde(flatten)]
    food: FoodRecord,
    diabetes_score: DiabetesScore,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        Self::NotFound(err.to_string())
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

async fn scan_food(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<ScanResponse>, ApiError> {
    let Some(barcode) = valid_barcode(&barcode) else {
        return Err(ApiError::BadRequest(format!(
            "Invalid barcode '{}': expected digits only",
            barcode.trim()
        )));
    };

    let food = scan_barcode(state.usda.as_ref(), state.off.as_ref(), barcode).await?;
    let diabetes_score = food.diabetes_score();
    Ok(Json(ScanResponse {
        food,
        diabetes_score,
    }))
}

async fn estimate_glucose(
    Json(req): Json<EstimateRequest>,
) -> Result<Json<GlucosePrediction>, ApiError> {
    for (name, value) in [
        ("carbs_g", Some(req.carbs_g)),
        ("exercise_kcal", req.exercise_kcal),
        ("water_ml", req.water_ml),
    ] {
        if value.is_some_and(|v| v < 0.0 || !v.is_finite()) {
            return Err(ApiError::BadRequest(format!(
                "{name} must be a non-negative number"
            )));
        }
    }

    let snapshot = DailyIntakeSnapshot {
        carbs_g: req.carbs_g,
        exercise_kcal: req.exercise_kcal,
        water_ml: req.water_ml,
        last_meal_at: req.last_meal_time.as_deref().and_then(parse_meal_time),
    };

    Ok(Json(estimate(&snapshot, Utc::now())))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/food/scan/{barcode}", get(scan_food))
        .route("/api/prediction/estimate", post(estimate_glucose))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of `key`, or stars when it is too short to
/// reveal any of it.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    usda: Arc<dyn NutritionProvider>,
    off: Arc<dyn NutritionProvider>,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        usda,
        off,
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        eprintln!(
            "API key: {} (see api_key file in data directory)",
            mask_key(key)
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    tracing::info!(%bind, port, "server listening");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
