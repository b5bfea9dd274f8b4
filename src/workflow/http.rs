use async_trait::async_trait;
use reqwest::{header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE}, Client};
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;

use crate::app::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::workflow::endpoint::{WorkflowEndpoint, WorkflowRequest};

/// Posts chat turns to a workflow webhook over HTTP
pub struct HttpWorkflowEndpoint {
    client: Client,
    url: Url,
}

impl HttpWorkflowEndpoint {
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::validation(format!("Invalid workflow URL '{}': {}", url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(format!(
                "Workflow URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        // No timeout unless configured; a hung webhook keeps the turn open
        let mut builder = Client::builder().default_headers(Self::default_headers());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, url })
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Self::new(&config.url, config.timeout_seconds.map(Duration::from_secs))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

#[async_trait]
impl WorkflowEndpoint for HttpWorkflowEndpoint {
    async fn send(&self, request: &WorkflowRequest) -> Result<serde_json::Value> {
        debug!(
            "Posting to workflow: url={}, session={}, input_len={}",
            self.url,
            request.session_id,
            request.chat_input.len()
        );

        let start_time = Instant::now();

        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        debug!("Workflow responded with {} in {:?}", status, start_time.elapsed());

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Workflow error: {} - {}", status, error_text);
            return Err(Error::transport(format!("Workflow returned {}: {}", status, error_text)));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| Error::transport(format!("Failed to parse workflow response: {}", e)))
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}
