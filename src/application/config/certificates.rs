use std::env;

/// Upstream source of pre-installed certificates
#[derive(Clone)]
pub struct CertificatesConfig {
    /// Bearer token (env: `EVCC_API_TOKEN`)
    pub api_token: Option<String>,
    /// Endpoint listing installed certificates (env: `EVCC_CERTIFICATES_URL`)
    pub url: String,
}

impl CertificatesConfig {
    pub fn from_env() -> Self {
        Self {
            api_token: env::var("EVCC_API_TOKEN").ok().filter(|t| !t.is_empty()),
            url: env::var("EVCC_CERTIFICATES_URL")
                .unwrap_or_else(|_| "https://test-endpoint.com/api/certificates".to_string()),
        }
    }
}

impl std::fmt::Debug for CertificatesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificatesConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("url", &self.url)
            .finish()
    }
}
