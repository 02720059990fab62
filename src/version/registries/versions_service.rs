//! JSON-RPC client of the versions service

use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::version::error::{ConnectivityKind, FetchError};
use crate::version::registry::VersionService;

/// Method returning a named report of the versions service
const VERSION_METHOD: &str = "MobileVersionControl.LoadReport";

/// Request timeout of a single report call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`VersionService`] over HTTP
pub struct HttpVersionService {
    client: reqwest::Client,
    base_url: String,
    report_name: String,
}

impl HttpVersionService {
    pub fn new(config: &ServiceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("app-versioning")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            report_name: config.report_name.clone(),
        })
    }

    fn classify(error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Connectivity(ConnectivityKind::Timeout)
        } else if error.is_connect() {
            FetchError::Connectivity(ConnectivityKind::NoInternet)
        } else {
            FetchError::Network(error)
        }
    }
}

#[async_trait::async_trait]
impl VersionService for HttpVersionService {
    async fn request_versions_report(&self) -> Result<String, FetchError> {
        let body = json!({
            "jsonrpc": "2.0",
            "protocol": 6,
            "method": VERSION_METHOD,
            "params": { "name": self.report_name },
            "id": 1
        });

        debug!("Requesting versions report {}", self.report_name);
        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(Self::classify)?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::Connectivity(ConnectivityKind::Unauthorized));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Connectivity(ConnectivityKind::ConnectionLimit));
        }

        if !status.is_success() {
            warn!("Versions service returned status {}: {}", status, self.base_url);
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(Self::classify)
    }
}
