use std::sync::Arc;

use adres_normalize::NormalizeMode;
use adres_types::Address;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::parser::{LevelMatches, StaticParser};

#[derive(Clone)]
pub struct AppState {
    pub parser: Arc<StaticParser>,
}

#[derive(Deserialize)]
pub struct ParseQuery {
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct NormalizeQuery {
    pub text: Option<String>,
    pub mode: Option<String>,
}

#[derive(Deserialize)]
pub struct NeighbourhoodsQuery {
    pub province: Option<String>,
    pub district: Option<String>,
}

#[derive(Serialize)]
pub struct ParseResponse {
    #[serde(flatten)]
    address: Address,
    normalized: String,
    tokens: Vec<String>,
    matches: LevelMatches,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/parse", get(parse_get).post(parse_post))
        .route("/v1/normalize", get(normalize))
        .route("/v1/provinces", get(provinces))
        .route("/v1/provinces/{province}/districts", get(districts))
        .route("/v1/neighbourhoods", get(neighbourhoods))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn parse_get(
    State(state): State<AppState>,
    Query(params): Query<ParseQuery>,
) -> Result<Json<ParseResponse>, ApiError> {
    let text = params.text.ok_or_else(|| ApiError::bad_request("text is required"))?;
    Ok(Json(parse_text(&state, &text)))
}

async fn parse_post(
    State(state): State<AppState>,
    Json(body): Json<ParseQuery>,
) -> Result<Json<ParseResponse>, ApiError> {
    let text = body.text.ok_or_else(|| ApiError::bad_request("text is required"))?;
    Ok(Json(parse_text(&state, &text)))
}

fn parse_text(state: &AppState, text: &str) -> ParseResponse {
    let trace = state.parser.trace(text);
    ParseResponse {
        address: trace.to_address(),
        normalized: trace.normalized,
        tokens: trace.tokens,
        matches: trace.matches,
    }
}

async fn normalize(
    State(state): State<AppState>,
    Query(params): Query<NormalizeQuery>,
) -> Result<Response, ApiError> {
    let text = params.text.ok_or_else(|| ApiError::bad_request("text is required"))?;
    let mode_name = params.mode.unwrap_or_else(|| "full".to_string());
    let mode = NormalizeMode::from_name(&mode_name).ok_or_else(|| {
        ApiError::bad_request(format!(
            "invalid mode {mode_name:?}; expected full, static or punctuation"
        ))
    })?;
    let normalized = state.parser.normalizer().normalize_with(mode, &text);
    Ok(Json(json!({
        "mode": mode_name,
        "text": text,
        "normalized": normalized,
    }))
    .into_response())
}

async fn provinces(State(state): State<AppState>) -> Response {
    let tree = state.parser.tree();
    let provinces: Vec<&str> = tree.provinces().collect();
    Json(json!({
        "count": provinces.len(),
        "provinces": provinces,
    }))
    .into_response()
}

async fn districts(
    State(state): State<AppState>,
    Path(province): Path<String>,
) -> Result<Response, ApiError> {
    let tree = state.parser.tree();
    let key = tree.key(&province);
    let districts = tree.districts_of(&key);
    if districts.is_empty() {
        return Err(ApiError::NotFound(format!("unknown province {province:?}")));
    }
    Ok(Json(json!({
        "province": key,
        "districts": districts,
    }))
    .into_response())
}

async fn neighbourhoods(
    State(state): State<AppState>,
    Query(params): Query<NeighbourhoodsQuery>,
) -> Response {
    let tree = state.parser.tree();
    let province = params.province.as_deref().map(|p| tree.key(p)).filter(|p| !p.is_empty());
    let district = params.district.as_deref().map(|d| tree.key(d)).filter(|d| !d.is_empty());
    let neighbourhoods = tree.neighbourhoods_of(province.as_deref(), district.as_deref());
    Json(json!({
        "province": province,
        "district": district,
        "count": neighbourhoods.len(),
        "neighbourhoods": neighbourhoods,
    }))
    .into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
