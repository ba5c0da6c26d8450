//! Liveness HTTP endpoint.
//!
//! Hosting platforms ping this to keep the process alive and to health
//! check it; it reports nothing but process liveness.

use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use tracing::{error, info};

/// Build the liveness router.
pub fn create_router() -> Router {
    Router::new().route("/", get(health_check)).route("/health", get(health_check))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(json!({"status": "ok"})))
}

/// Serve the liveness endpoint until the process exits.
pub async fn serve(port: u16) {
    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%addr, error = %err, "Failed to bind liveness endpoint");
            return;
        }
    };
    info!(%addr, "Liveness endpoint listening");
    if let Err(err) = axum::serve(listener, create_router()).await {
        error!(error = %err, "Liveness endpoint stopped");
    }
}
