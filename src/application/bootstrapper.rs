//! Application bootstrapper
//!
//! Handles all initialization and setup for the EVCC dashboard backend.

use std::sync::Arc;

use http::HeaderValue;
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::endpoints;
use crate::services::HttpCertificateSource;
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting EVCC dashboard backend v{}", env!("CARGO_PKG_VERSION"));

    let state = init_services()?;
    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("evcc_dashboard={},tower_http=debug", CONFIG.log_level).into()
    });
    let json = CONFIG.json_logs();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_ansi(false)))
        .init();
}

/// Initialize all application services
fn init_services() -> anyhow::Result<AppState> {
    let certificate_source = HttpCertificateSource::new(&CONFIG.certificates)?;
    tracing::info!(url = %CONFIG.certificates.url, "Certificate inventory client initialized");

    let simulation = &CONFIG.simulation;
    tracing::info!(
        charging_ms = simulation.charging_duration.as_millis() as u64,
        certificate_ms = simulation.certificate_duration.as_millis() as u64,
        tick_ms = simulation.tick_interval.as_millis() as u64,
        "Simulation timing loaded"
    );

    Ok(AppState::new(simulation, Arc::new(certificate_source)))
}

/// CORS policy for `origins`; an empty list allows any origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(allowed))
    }
}

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&CONFIG.server.allowed_origins))
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let addr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use http::Request;
    use tower::util::ServiceExt;

    async fn allow_origin(origins: &[String], origin: &str) -> Option<String> {
        let app = Router::new()
            .route("/api/health", get(|| async { "OK" }))
            .layer(cors_layer(origins));
        let request = Request::builder()
            .uri("/api/health")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        response
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        assert_eq!(
            allow_origin(&[], "http://anything.local").await.as_deref(),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_cors_restricts_to_configured_origins() {
        let origins = vec!["http://dashboard.local".to_string()];
        assert_eq!(
            allow_origin(&origins, "http://dashboard.local").await.as_deref(),
            Some("http://dashboard.local")
        );
        assert_eq!(allow_origin(&origins, "http://evil.local").await, None);
    }
}
