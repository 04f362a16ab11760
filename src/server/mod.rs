pub mod routes;
pub mod types;

use crate::errors::EngineError;
use crate::state::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Engine failure surfaced to an HTTP client.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            EngineError::InvalidParameter(_) | EngineError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            EngineError::NumericDegeneracy(_) | EngineError::NonConvergence { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            EngineError::Config(_) | EngineError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(error = %self.0, kind = self.0.kind(), status = status.as_u16(), "request failed");
        let body = serde_json::json!({ "error": self.0.to_string(), "kind": self.0.kind() });
        (status, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/counters", get(routes::get_counters))
        .route("/api/price/black-scholes", post(routes::price_black_scholes))
        .route("/api/price/binomial-tree", post(routes::price_binomial_tree))
        .route("/api/price/monte-carlo", post(routes::price_monte_carlo))
        .route("/api/compare", post(routes::compare))
        .route("/api/analyze/payoff", post(routes::analyze_payoff))
        .route("/api/analyze/sensitivity", post(routes::analyze_sensitivity))
        .route("/api/implied-volatility", post(routes::implied_volatility))
        .route("/api/simulate/paths", post(routes::simulate_paths))
        .route("/api/analyze/price-profile", post(routes::analyze_price_profile))
        .route("/api/analyze/greeks-profile", post(routes::analyze_greeks_profile))
        .route("/api/analyze/price-surface", post(routes::analyze_price_surface))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
