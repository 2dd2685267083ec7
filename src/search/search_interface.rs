use async_trait::async_trait;
use thiserror::Error;

/// A short document returned by the search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedDocument {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search index unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search index returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Full-text lookup used to build extra context for the caller.
#[async_trait]
pub trait DocumentSearch: Send + Sync {
    /// Return up to the configured number of documents, best match first.
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>, SearchError>;
}
