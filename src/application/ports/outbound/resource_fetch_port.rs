//! Resource fetch port - Interface for downloading referenced assets
//!
//! The export engine never talks HTTP directly. It asks this port for the
//! content type of a URL (to pick a file extension) and to stream a URL into
//! a local file. The infrastructure layer provides the reqwest-backed adapter.

use std::path::Path;

use async_trait::async_trait;

/// Errors a fetch can fail with
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Server returned {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for fetching external resources
#[async_trait]
pub trait ResourceFetchPort: Send + Sync {
    /// Content type reported by the server for `url`, if any
    async fn probe_content_type(&self, url: &str) -> Result<Option<String>, FetchError>;

    /// Stream the body of `url` into `dest`, returning the number of bytes written
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}
