use crate::api::{ApiError, ApiResult};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PUSH_PATH: &str = "/ws";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the transfer backend lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    pub push_path: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: Url::parse(DEFAULT_SERVER_URL).expect("default server URL is valid"),
            push_path: DEFAULT_PUSH_PATH.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a config for a backend at `server`, e.g. `http://10.0.0.5:5000`
    pub fn with_server(server: &str) -> ApiResult<Self> {
        let server_url =
            Url::parse(server).map_err(|e| ApiError::InvalidUrl(format!("{server}: {e}")))?;

        match server_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ApiError::InvalidUrl(format!(
                    "{server}: unsupported scheme '{other}'"
                )))
            }
        }

        Ok(Self {
            server_url,
            ..Default::default()
        })
    }

    /// Absolute URL of a REST endpoint, resolved under the server URL's path.
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        let mut base = self.server_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        base.join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// URL of the push channel: the push path with `ws`/`wss` in place of `http`/`https`.
    pub fn push_url(&self) -> ApiResult<Url> {
        let mut url = self.endpoint(&self.push_path)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };

        url.set_scheme(scheme)
            .map_err(|_| ApiError::InvalidUrl(format!("cannot use {scheme} for {url}")))?;
        Ok(url)
    }
}
