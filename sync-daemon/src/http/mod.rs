//! HTTP endpoints for sync-daemon.
//!
//! Provides health checks and Prometheus metrics.

pub mod health;
mod metrics;

use crate::runner::SyncMetrics;
use crate::storage::SqliteStore;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;
use sync_types::ResourceType;

pub use health::HealthStatus;

/// State shared with the handlers.
#[derive(Debug)]
pub struct AppState {
    /// Counters published by the runner.
    pub metrics: Arc<SyncMetrics>,
    /// Store queried for row counts.
    pub store: SqliteStore,
    /// Synchronized types, in processing order.
    pub resources: Vec<ResourceType>,
}

/// Build the HTTP router with all endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(Extension(state))
}

/// Serve the router on `bind_address` until `shutdown` flips to true.
pub async fn serve(
    bind_address: &str,
    state: Arc<AppState>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    async fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            metrics: Arc::new(SyncMetrics::default()),
            store: SqliteStore::in_memory().await.unwrap(),
            resources: vec![ResourceType::Account, ResourceType::Call],
        })
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = build_router(test_state().await);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_ok() {
        let app = build_router(test_state().await);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = build_router(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
