use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use fitlog_core::error::MetricsError;
use fitlog_core::metrics::{ActivityStats, DEFAULT_WINDOW_DAYS, Dashboard, WeeklyProgress};
use fitlog_core::models::{
    ExportData, MealEntry, NewMealEntry, NewWaterEvent, NewWorkoutEntry, UserProfile, WaterEvent,
    WorkoutEntry, validate_meal, validate_profile, validate_water, validate_workout,
};
use fitlog_core::service::FitlogService;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<FitlogService>>,
    api_key: Option<String>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, FitlogService> {
        self.svc.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Deserialize)]
struct ProgressQuery {
    date: Option<String>,
    days: Option<u32>,
}

#[derive(Deserialize)]
struct CreateWorkoutRequest {
    exercise: String,
    duration_minutes: i64,
    date: Option<String>,
}

#[derive(Deserialize)]
struct CreateMealRequest {
    name: String,
    calories: i64,
    date: Option<String>,
}

#[derive(Deserialize)]
struct CreateWaterRequest {
    amount_ml: i64,
    date: Option<String>,
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
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: &anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err}"))
}

fn parse_api_date(date_str: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{date_str}'. Use YYYY-MM-DD")))
}

fn date_or_today(date: Option<&str>) -> Result<NaiveDate, ApiError> {
    date.map_or_else(|| Ok(Local::now().date_naive()), parse_api_date)
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
            tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
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

// --- Dashboard / progress handlers ---

async fn get_dashboard_today(State(state): State<AppState>) -> Result<Json<Dashboard>, ApiError> {
    let today = Local::now().date_naive();
    let dash = state.svc().dashboard(today).context("database error")?;
    Ok(Json(dash))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(date_str): Path<String>,
) -> Result<Json<Dashboard>, ApiError> {
    let date = parse_api_date(&date_str)?;
    let dash = state.svc().dashboard(date).context("database error")?;
    Ok(Json(dash))
}

async fn get_progress(
    State(state): State<AppState>,
    Query(q): Query<ProgressQuery>,
) -> Result<Json<WeeklyProgress>, ApiError> {
    let end = date_or_today(q.date.as_deref())?;
    let days = q.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let progress = state
        .svc()
        .weekly_progress(end, days)
        .map_err(|e| match e.downcast_ref::<MetricsError>() {
            Some(window_err) => ApiError::BadRequest(window_err.to_string()),
            None => ApiError::from(e.context("database error")),
        })?;
    Ok(Json(progress))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<ActivityStats>, ApiError> {
    let stats = state.svc().stats().context("database error")?;
    Ok(Json(stats))
}

// --- Workout handlers ---

async fn list_workouts(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<WorkoutEntry>>, ApiError> {
    let date = q.date.as_deref().map(parse_api_date).transpose()?;
    let workouts = state.svc().list_workouts(date).context("database error")?;
    Ok(Json(workouts))
}

async fn create_workout(
    State(state): State<AppState>,
    Json(req): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutEntry>), ApiError> {
    let entry = NewWorkoutEntry {
        date: date_or_today(req.date.as_deref())?,
        exercise: req.exercise,
        duration_minutes: req.duration_minutes,
    };
    validate_workout(&entry).map_err(|e| bad_request(&e))?;

    let workout = state
        .svc()
        .log_workout(&entry)
        .context("failed to insert workout")?;
    Ok((StatusCode::CREATED, Json(workout)))
}

async fn get_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WorkoutEntry>, ApiError> {
    let workout = state
        .svc()
        .get_workout(id)
        .map_err(|_| ApiError::NotFound(format!("Workout {id} not found")))?;
    Ok(Json(workout))
}

async fn delete_workout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.svc().delete_workout(id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Workout {id} not found")))
    }
}

// --- Meal handlers ---

async fn list_meals(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<MealEntry>>, ApiError> {
    let date = q.date.as_deref().map(parse_api_date).transpose()?;
    let meals = state.svc().list_meals(date).context("database error")?;
    Ok(Json(meals))
}

async fn create_meal(
    State(state): State<AppState>,
    Json(req): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<MealEntry>), ApiError> {
    let entry = NewMealEntry {
        date: date_or_today(req.date.as_deref())?,
        name: req.name,
        calories: req.calories,
    };
    validate_meal(&entry).map_err(|e| bad_request(&e))?;

    let meal = state
        .svc()
        .log_meal(&entry)
        .context("failed to insert meal")?;
    Ok((StatusCode::CREATED, Json(meal)))
}

async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MealEntry>, ApiError> {
    let meal = state
        .svc()
        .get_meal(id)
        .map_err(|_| ApiError::NotFound(format!("Meal {id} not found")))?;
    Ok(Json(meal))
}

async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.svc().delete_meal(id).context("database error")? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Meal {id} not found")))
    }
}

// --- Water handlers ---

async fn list_water(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<Vec<WaterEvent>>, ApiError> {
    let date = q.date.as_deref().map(parse_api_date).transpose()?;
    let events = state
        .svc()
        .list_water_events(date)
        .context("database error")?;
    Ok(Json(events))
}

async fn create_water(
    State(state): State<AppState>,
    Json(req): Json<CreateWaterRequest>,
) -> Result<(StatusCode, Json<WaterEvent>), ApiError> {
    let event = NewWaterEvent {
        date: date_or_today(req.date.as_deref())?,
        amount_ml: req.amount_ml,
    };
    validate_water(&event).map_err(|e| bad_request(&e))?;

    let event = state
        .svc()
        .log_water(&event)
        .context("failed to insert water event")?;
    Ok((StatusCode::CREATED, Json(event)))
}

// --- Profile handlers ---

async fn get_profile(State(state): State<AppState>) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.svc().profile().context("database error")?;
    Ok(Json(profile))
}

async fn put_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, ApiError> {
    validate_profile(&profile).map_err(|e| bad_request(&e))?;
    let saved = state
        .svc()
        .save_profile(&profile)
        .context("failed to save profile")?;
    Ok(Json(saved))
}

// --- Export ---

async fn export_data(State(state): State<AppState>) -> Result<Json<ExportData>, ApiError> {
    let data = state.svc().export_all().context("failed to export data")?;
    Ok(Json(data))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard", get(get_dashboard_today))
        .route("/api/dashboard/{date}", get(get_dashboard))
        .route("/api/progress", get(get_progress))
        .route("/api/stats", get(get_stats))
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route("/api/workouts/{id}", get(get_workout).delete(delete_workout))
        .route("/api/meals", get(list_meals).post(create_meal))
        .route("/api/meals/{id}", get(get_meal).delete(delete_meal))
        .route("/api/water", get(list_water).post(create_water))
        .route("/api/profile", get(get_profile).put(put_profile))
        .route("/api/export", get(export_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of the key. Keys of eight characters or
/// fewer are hidden entirely.
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    svc: FitlogService,
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
        eprintln!(
            "API key: {} (see api_key file in data directory)",
            mask_api_key(key)
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    tracing::info!(%bind, port, auth = api_key.is_some(), "server listening");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(api_key: Option<String>) -> AppState {
        AppState {
            svc: Arc::new(Mutex::new(FitlogService::new_in_memory().unwrap())),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> axum::http::Request<Body> {
        axum::http::Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/stats")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/stats")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/profile")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn security_headers_on_auth_failure() {
        let app = test_app(Some("secret".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/profile")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app(None);

        let big_body = vec![0u8; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post("/api/meals")
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let error = ApiError::Internal(anyhow::anyhow!("secret database path /home/user/fitlog.db"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert!(!json["error"].as_str().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn create_workout_stores_burn_estimate() {
        let app = test_app(None);

        let response = app
            .oneshot(post_json(
                "/api/workouts",
                &serde_json::json!({
                    "exercise": "Cycling",
                    "duration_minutes": 30,
                    "date": "2024-06-15"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["calories_burned"], 150);
        assert_eq!(json["date"], "2024-06-15");
    }

    #[tokio::test]
    async fn create_workout_invalid_returns_400() {
        let app = test_app(None);

        let response = app
            .oneshot(post_json(
                "/api/workouts",
                &serde_json::json!({ "exercise": "Run", "duration_minutes": 0 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_water_invalid_date_returns_400() {
        let app = test_app(None);

        let response = app
            .oneshot(post_json(
                "/api/water",
                &serde_json::json!({ "amount_ml": 250, "date": "15/06/2024" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Invalid date"));
    }

    #[tokio::test]
    async fn dashboard_for_date_reflects_entries() {
        let state = test_state(None);
        {
            let svc = state.svc();
            let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
            svc.log_meal(&NewMealEntry {
                date,
                name: "Lunch".to_string(),
                calories: 1500,
            })
            .unwrap();
            svc.log_water(&NewWaterEvent {
                date,
                amount_ml: 500,
            })
            .unwrap();
        }
        let app = build_router(state);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/dashboard/2024-06-15")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["totals"]["total_calories_consumed"], 1500);
        assert_eq!(json["calorie_progress"]["percent"], 75.0);
        assert_eq!(json["water_progress"]["remaining"], 1500);
        assert_eq!(json["profile_name"], "User");
    }

    #[tokio::test]
    async fn dashboard_invalid_date_returns_400() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/dashboard/not-a-date")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn progress_returns_requested_window() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/progress?date=2024-01-03&days=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let buckets = json["workout_minutes"].as_array().unwrap();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0]["date"], "2024-01-01");
        assert_eq!(buckets[0]["label"], "Mon");
        assert_eq!(buckets[2]["date"], "2024-01-03");
    }

    #[tokio::test]
    async fn progress_rejects_huge_window() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/progress?days=100000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn progress_accepts_full_year_and_rejects_one_more() {
        let app = test_app(None);
        let response = app
            .oneshot(
                axum::http::Request::get("/api/progress?date=2024-12-31&days=366")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["hydration_ml"].as_array().unwrap().len(), 366);

        let app = test_app(None);
        let response = app
            .oneshot(
                axum::http::Request::get("/api/progress?days=367")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("at most 366"));
    }

    #[tokio::test]
    async fn create_workout_over_a_day_returns_400() {
        let app = test_app(None);

        let response = app
            .oneshot(post_json(
                "/api/workouts",
                &serde_json::json!({
                    "exercise": "Run",
                    "duration_minutes": i64::MAX,
                    "date": "2024-06-15"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_workout_by_id() {
        let state = test_state(None);
        let id = state
            .svc()
            .log_workout(&NewWorkoutEntry {
                date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                exercise: "Row".to_string(),
                duration_minutes: 25,
            })
            .unwrap()
            .id;
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::get(format!("/api/workouts/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["exercise"], "Row");
        assert_eq!(json["calories_burned"], 125);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/workouts/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_meal_by_id() {
        let state = test_state(None);
        let id = state
            .svc()
            .log_meal(&NewMealEntry {
                date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                name: "Soup".to_string(),
                calories: 320,
            })
            .unwrap()
            .id;
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::get(format!("/api/meals/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["name"], "Soup");
        assert_eq!(json["calories"], 320);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/meals/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn mask_api_key_handles_short_and_non_ascii_keys() {
        let key = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        assert_eq!(mask_api_key(key), "0123...cdef");
        assert_eq!(mask_api_key("ab"), "**");
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("日本語キー"), "*****");
        assert_eq!(mask_api_key("日本語のAPIキーです"), "日本語の...キーです");
    }

    #[tokio::test]
    async fn delete_missing_meal_returns_404() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::delete("/api/meals/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_existing_workout_returns_204() {
        let state = test_state(None);
        let id = state
            .svc()
            .log_workout(&NewWorkoutEntry {
                date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
                exercise: "Swim".to_string(),
                duration_minutes: 20,
            })
            .unwrap()
            .id;
        let app = build_router(state);

        let response = app
            .oneshot(
                axum::http::Request::delete(format!("/api/workouts/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn put_profile_replaces_and_validates() {
        let state = test_state(None);
        let app = build_router(state.clone());

        let response = app
            .oneshot(
                axum::http::Request::put("/api/profile")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "name": "Kai",
                            "daily_calorie_goal": 2200,
                            "daily_water_goal_ml": 2500
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.svc().profile().unwrap().name, "Kai");

        let app = build_router(state.clone());
        let response = app
            .oneshot(
                axum::http::Request::put("/api/profile")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "name": "Kai",
                            "daily_calorie_goal": 100,
                            "daily_water_goal_ml": 2500
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.svc().profile().unwrap().daily_calorie_goal, 2200);
    }

    #[tokio::test]
    async fn list_meals_filters_by_date() {
        let state = test_state(None);
        {
            let svc = state.svc();
            for (day, name) in [(15, "Breakfast"), (16, "Dinner")] {
                svc.log_meal(&NewMealEntry {
                    date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                    name: name.to_string(),
                    calories: 400,
                })
                .unwrap();
            }
        }
        let app = build_router(state);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/meals?date=2024-06-16")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        let meals = json.as_array().unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0]["name"], "Dinner");
    }

    #[tokio::test]
    async fn export_returns_versioned_payload() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["version"], 1);
        assert_eq!(json["profile"]["name"], "User");
    }
}
