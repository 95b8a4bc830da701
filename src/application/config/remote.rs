use std::env;

/// SSH target for remote certificate scripts
#[derive(Clone)]
pub struct RemoteConfig {
    /// env: `HOSTNAME`
    pub host: String,
    /// env: `PORT`
    pub port: u16,
    /// env: `USERNAME`
    pub username: String,
    /// env: `PASSWORD`; key-based auth is used when unset
    pub password: Option<String>,
}

impl RemoteConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            username: env::var("USERNAME").unwrap_or_else(|_| "admin".to_string()),
            password: env::var("PASSWORD").ok().filter(|p| !p.is_empty()),
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
