//! Transfer lifecycle endpoint integration tests
//!
//! Covers:
//! - POST /api/end
//! - GET /api/end, /api/reset, /api/reset-certificates
//! - GET /api/pre-install-certificates

use axum::http::StatusCode;
use tower::util::ServiceExt;

mod common;
use common::{
    body_json, build_app_state, build_app_state_with_source, certificate, get, post,
    StaticCertificateSource,
};

use evcc_dashboard::endpoints::create_router;

// ============================================================================
// POST /api/end
// ============================================================================

#[tokio::test]
async fn test_end_marks_transfer_ended() {
    let app = create_router(build_app_state());

    let response = app
        .oneshot(post(
            "/api/end",
            r#"{"transferStatus": "transferring", "progress": 0.7}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["transferStatus"], "ended");
    assert_eq!(json["progress"], 0.7);
}

#[tokio::test]
async fn test_end_with_invalid_json_is_500() {
    let app = create_router(build_app_state());

    let response = app.oneshot(post("/api/end", "{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["message"].is_string());
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_end_with_non_object_is_500() {
    let app = create_router(build_app_state());

    let response = app.oneshot(post("/api/end", "42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Placeholders
// ============================================================================

#[tokio::test]
async fn test_placeholder_routes() {
    for (uri, message) in [
        ("/api/end", "End Endpoint - Not yet implemented"),
        ("/api/reset", "Reset Endpoint - Not yet implemented"),
        (
            "/api/reset-certificates",
            "Reset Certificates Endpoint - Not yet implemented",
        ),
    ] {
        let app = create_router(build_app_state());
        let response = app.oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(body_json(response).await["message"], message);
    }
}

// ============================================================================
// GET /api/pre-install-certificates
// ============================================================================

#[tokio::test]
async fn test_pre_install_lists_inventory() {
    let app = create_router(build_app_state_with_source(StaticCertificateSource {
        certificates: Some(vec![
            certificate("root-ca", "OEM Root CA"),
            certificate("evcc-leaf", "EVCC Leaf"),
        ]),
    }));

    let response = app
        .oneshot(get("/api/pre-install-certificates"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["id"], "evcc-leaf");
}

#[tokio::test]
async fn test_pre_install_upstream_failure() {
    let app = create_router(build_app_state_with_source(StaticCertificateSource {
        certificates: None,
    }));

    let response = app
        .oneshot(get("/api/pre-install-certificates"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_json(response).await["detail"]
        .as_str()
        .unwrap()
        .contains("inventory offline"));
}
