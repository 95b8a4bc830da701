//! Client for the certificates already installed on the controller.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::certificates::CertificatesConfig;
use crate::error::{AppError, Result};

/// A certificate reported by the upstream inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PreinstalledCertificate {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    /// Anything else the upstream sends is passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The inventory answers with either one certificate or a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InventoryPayload {
    Many(Vec<PreinstalledCertificate>),
    One(PreinstalledCertificate),
}

impl InventoryPayload {
    fn into_vec(self) -> Vec<PreinstalledCertificate> {
        match self {
            Self::Many(certificates) => certificates,
            Self::One(certificate) => vec![certificate],
        }
    }
}

/// Parse and validate an inventory response body
pub fn parse_inventory(body: &[u8]) -> Result<Vec<PreinstalledCertificate>> {
    let payload: InventoryPayload = serde_json::from_slice(body)?;
    let certificates = payload.into_vec();
    for certificate in &certificates {
        certificate.validate()?;
    }
    Ok(certificates)
}

#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<PreinstalledCertificate>>;
}

pub struct HttpCertificateSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpCertificateSource {
    pub fn new(config: &CertificatesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("evcc-dashboard")
            .timeout(Duration::from_secs(30))
            .build()?;

        if config.api_token.is_none() {
            tracing::warn!("EVCC_API_TOKEN not set; certificate inventory requests are unauthenticated");
        }

        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl CertificateSource for HttpCertificateSource {
    async fn fetch(&self) -> Result<Vec<PreinstalledCertificate>> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url = %self.url, %status, "Certificate inventory request failed");
            return Err(AppError::ServiceUnavailable(format!(
                "Certificate inventory returned {}",
                status
            )));
        }

        let body = resp.bytes().await?;
        let certificates = parse_inventory(&body)?;
        tracing::debug!(count = certificates.len(), "Fetched pre-installed certificates");
        Ok(certificates)
    }
}
