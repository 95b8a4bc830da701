use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::simulation::workflow::ActionDescriptor;
use crate::simulation::SessionSnapshot;
use crate::state::AppState;

use super::stream::forward_session;

/// Create certificate workflow routes
pub fn certificates_routes(state: AppState) -> Router {
    Router::new()
        .route("/session", get(get_session))
        .route("/actions", get(list_actions))
        .route("/actions/{key}", post(dispatch_action))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.certificates.snapshot())
}

async fn list_actions(State(state): State<AppState>) -> Json<&'static [ActionDescriptor]> {
    Json(state.catalog.certificate_actions())
}

/// Run a certificate workflow. Unknown keys run the default workflow.
async fn dispatch_action(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<SessionSnapshot> {
    Json(state.certificates.dispatch_certificate(&state.catalog, &key))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("Certificate WebSocket upgrade request received");
    ws.on_upgrade(move |socket| forward_session(socket, state.certificates))
}
