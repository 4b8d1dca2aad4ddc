//! HTTP transport for reports.
//!
//! One POST per event, JSON both ways:
//!
//! ```text
//! Pipeline ──> HttpReporter ──(POST url, JSON)──> Authority
//!                    <────────(200, JSON)──────────┘
//! ```

use crate::{ReportError, Reporter};
use gatepost_core::constants::DEFAULT_REPORT_TIMEOUT_MS;
use gatepost_protocol::{ReportRequest, ReportResponse};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Endpoint receiving the POST
    pub url: String,

    /// Timeout for the whole exchange (connect, send, receive)
    pub timeout: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/".to_string(),
            timeout: Duration::from_millis(DEFAULT_REPORT_TIMEOUT_MS),
        }
    }
}

/// Reporter posting events to an HTTP endpoint.
///
/// The underlying client is created once and reused, so consecutive
/// reports can share a pooled connection.
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpReporter {
    /// Create a reporter for the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Setup` if the HTTP client cannot be built.
    pub fn new(config: ReporterConfig) -> Result<Self, ReportError> {
        debug!("Creating HTTP reporter for {}", config.url);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url,
            timeout: config.timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(&self, error: reqwest::Error) -> ReportError {
        if error.is_timeout() {
            warn!("Report timeout after {}ms", self.timeout.as_millis());
            ReportError::Timeout(self.timeout.as_millis() as u64)
        } else {
            warn!("Report to {} failed: {}", self.url, error);
            ReportError::Transport(error.to_string())
        }
    }
}

impl Reporter for HttpReporter {
    async fn report(&mut self, request: &ReportRequest) -> Result<ReportResponse, ReportError> {
        debug!("Posting report for device {}", request.device_id);

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Authority answered {}", status);
            return Err(ReportError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let reply = ReportResponse::from_json(&body)?;

        debug!("Authority replied {:?}", reply);
        Ok(reply)
    }
}
