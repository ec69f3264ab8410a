// Log source trait - access to the current full log snapshot
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no log endpoints configured")]
    NoEndpoints,

    #[error("failed to load sensors log. Tried: {tried}. Last error: {last}")]
    AllEndpointsFailed { tried: String, last: Box<FetchError> },
}

#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch the whole log as text. Each call returns a fresh snapshot, not
    /// a delta.
    async fn fetch_text(&self) -> Result<String, FetchError>;
}
