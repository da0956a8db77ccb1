use crate::error::{ClientError, Result};
use crate::result::{ComparisonRequest, ComparisonResult};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/compare_websites";

/// Client for the external analysis service.
///
/// Issues exactly one request per call. There is no retry and no request
/// timeout; a failure is only reported when the transport gives up.
pub struct AnalysisClient {
    client: Client,
    endpoint: Url,
}

impl AnalysisClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let client = Client::builder()
            .user_agent(concat!(
                "webcompare/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/trapdoorsec/webcompare)"
            ))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResult> {
        info!(
            "Requesting comparison of {} websites ({}) from {}",
            request.websites.len(),
            request.category,
            self.endpoint
        );
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(
            "Analysis service answered {} after {:?} ({} bytes)",
            status,
            started.elapsed(),
            body.len()
        );

        if !status.is_success() {
            let message = server_message(&body);
            warn!("Analysis request rejected with {}: {}", status, message);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::DecodeError(e.to_string()))
    }
}

/// The service reports failures as `{"error": "..."}`; fall back to the raw body
fn server_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = value.get("error").and_then(|m| m.as_str())
    {
        return message.to_string();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.to_string()
    }
}
