use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Mail is reported but never fails the probe; uploads still succeed when
/// the relay is down.
async fn mail_status(state: &AppState) -> Value {
    if !state.mailer.is_enabled() {
        return json!({ "status": "disabled" });
    }
    match state.mailer.health_check().await {
        Ok(_) => json!({ "status": "ok" }),
        Err(e) => {
            tracing::warn!(error = %e, "Mail relay health check failed");
            json!({ "status": "unreachable", "error": e.to_string() })
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let mail = mail_status(&state).await;

    match state.stores.ledger.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "reconcile-service",
                "version": env!("CARGO_PKG_VERSION"),
                "mail": mail
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "reconcile-service",
                    "error": e.to_string(),
                    "mail": mail
                })),
            )
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
