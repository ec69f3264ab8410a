// HTTP log source - reqwest implementation of LogSource with endpoint fallback
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::log_source::{FetchError, LogSource};
use crate::infrastructure::config::SourceSettings;

#[derive(Debug, Clone)]
pub struct HttpLogSource {
    client: reqwest::Client,
    endpoints: Vec<String>,
    cache_bust: bool,
}

impl HttpLogSource {
    pub fn new(settings: &SourceSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoints: unique(&settings.endpoints),
            cache_bust: settings.cache_bust,
        })
    }

    async fn fetch_from(&self, endpoint: &str) -> Result<String, FetchError> {
        let url = if self.cache_bust {
            with_cache_bust(endpoint, Utc::now().timestamp_millis())
        } else {
            endpoint.to_string()
        };

        let response = self
            .client
            .get(&url)
            .header("Cache-Control", "no-store")
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(endpoint, e))
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch_text(&self) -> Result<String, FetchError> {
        let mut last_error = FetchError::NoEndpoints;

        for endpoint in &self.endpoints {
            match self.fetch_from(endpoint).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!("Log endpoint {} failed: {}", endpoint, e);
                    last_error = e;
                }
            }
        }

        if self.endpoints.is_empty() {
            return Err(last_error);
        }

        Err(FetchError::AllEndpointsFailed {
            tried: self.endpoints.join(", "),
            last: Box::new(last_error),
        })
    }
}

/// Append a unique `t=` parameter so intermediate caches never serve a stale log
pub fn with_cache_bust(url: &str, now_ms: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, separator, now_ms)
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn unique(endpoints: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
        if !seen.iter().any(|s: &String| s == endpoint) {
            seen.push(endpoint.to_string());
        }
    }
    seen
}
