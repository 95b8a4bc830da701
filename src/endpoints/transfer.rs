//! Transfer lifecycle routes kept for the dashboard's server actions

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::Result;
use crate::services::PreinstalledCertificate;
use crate::state::AppState;

/// Create transfer routes (mounted under /api)
pub fn transfer_routes(state: AppState) -> Router {
    Router::new()
        .route("/end", get(end_placeholder).post(end_transfer))
        .route("/reset", get(reset_placeholder))
        .route("/reset-certificates", get(reset_certificates_placeholder))
        .route("/pre-install-certificates", get(pre_install_certificates))
        .with_state(state)
}

// ============================================================================
// Placeholders
// ============================================================================

async fn end_placeholder() -> Json<Value> {
    Json(json!({ "message": "End Endpoint - Not yet implemented" }))
}

async fn reset_placeholder() -> Json<Value> {
    Json(json!({ "message": "Reset Endpoint - Not yet implemented" }))
}

async fn reset_certificates_placeholder() -> Json<Value> {
    Json(json!({ "message": "Reset Certificates Endpoint - Not yet implemented" }))
}

// ============================================================================
// Handlers
// ============================================================================

/// Mark the posted transfer state as ended and echo it back
async fn end_transfer(body: Bytes) -> Response {
    match mark_ended(&body) {
        Ok(state) => Json(state).into_response(),
        Err(error) => {
            tracing::warn!(%error, "Rejected end-transfer payload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to end transfer",
                    "error": error,
                })),
            )
                .into_response()
        }
    }
}

fn mark_ended(body: &[u8]) -> std::result::Result<Value, String> {
    let mut state: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    let fields = state
        .as_object_mut()
        .ok_or_else(|| "transfer state must be a JSON object".to_string())?;
    fields.insert("transferStatus".to_string(), json!("ended"));
    Ok(state)
}

/// Certificates already present on the controller
async fn pre_install_certificates(
    State(state): State<AppState>,
) -> Result<Json<Vec<PreinstalledCertificate>>> {
    let certificates = state.certificate_source.fetch().await?;
    Ok(Json(certificates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_ended_merges_status() {
        let state = mark_ended(br#"{"progress": 0.4, "transferStatus": "running"}"#).unwrap();
        assert_eq!(state, json!({ "progress": 0.4, "transferStatus": "ended" }));
    }

    #[test]
    fn test_mark_ended_rejects_non_objects() {
        assert!(mark_ended(b"[1, 2]").is_err());
        assert!(mark_ended(b"{oops").is_err());
    }
}
