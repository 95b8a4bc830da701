use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::simulation::workflow::ActionDescriptor;
use crate::simulation::{ChargingAction, SessionSnapshot};
use crate::state::AppState;

use super::stream::forward_session;

/// Create charging session routes
pub fn charging_routes(state: AppState) -> Router {
    Router::new()
        .route("/session", get(get_session))
        .route("/actions", get(list_actions))
        .route("/actions/{action}", post(dispatch_action))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.charging.snapshot())
}

async fn list_actions(State(state): State<AppState>) -> Json<&'static [ActionDescriptor]> {
    Json(state.catalog.charging_actions())
}

/// Start, end or reset the charging session
async fn dispatch_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Result<Json<SessionSnapshot>> {
    let action = ChargingAction::from_key(&action).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown charging action '{}', expected start, end or reset",
            action
        ))
    })?;

    Ok(Json(state.charging.dispatch_charging(&state.catalog, action)))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("Charging WebSocket upgrade request received");
    ws.on_upgrade(move |socket| forward_session(socket, state.charging))
}
