//! Liveness HTTP surface. The actual evaluation pipeline is driven by the
//! `evaluate` subcommand today; this router exists so the process can be
//! run as a long-lived service that a forge webhook dispatcher health-checks.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::NaysayerConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: NaysayerConfig,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy".into(), version: env!("CARGO_PKG_VERSION").into() })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz_returns_200() {
        let router = build_router(AppState { config: NaysayerConfig::from_env() });
        let response = router.oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
