//! Test helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;

use evcc_dashboard::config::simulation::SimulationConfig;
use evcc_dashboard::error::{AppError, Result};
use evcc_dashboard::services::{CertificateSource, PreinstalledCertificate};
use evcc_dashboard::state::AppState;

pub const TICK: Duration = Duration::from_millis(60);

/// Certificate inventory answering from memory
pub struct StaticCertificateSource {
    pub certificates: Option<Vec<PreinstalledCertificate>>,
}

#[async_trait]
impl CertificateSource for StaticCertificateSource {
    async fn fetch(&self) -> Result<Vec<PreinstalledCertificate>> {
        self.certificates
            .clone()
            .ok_or_else(|| AppError::ServiceUnavailable("inventory offline".to_string()))
    }
}

pub fn certificate(id: &str, name: &str) -> PreinstalledCertificate {
    PreinstalledCertificate {
        id: id.to_string(),
        name: name.to_string(),
        extra: serde_json::Map::new(),
    }
}

pub fn simulation_config() -> SimulationConfig {
    SimulationConfig {
        charging_duration: Duration::from_millis(8000),
        certificate_duration: Duration::from_millis(10000),
        tick_interval: TICK,
    }
}

pub fn build_app_state() -> AppState {
    build_app_state_with_source(StaticCertificateSource {
        certificates: Some(vec![certificate("root-ca", "OEM Root CA")]),
    })
}

pub fn build_app_state_with_source(source: StaticCertificateSource) -> AppState {
    AppState::new(&simulation_config(), Arc::new(source))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

pub fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
