//! HTTP adapter for the resource fetch port

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::application::ports::outbound::{FetchError, ResourceFetchPort};

/// reqwest-backed fetcher for asset backups
pub struct HttpResourceFetcher {
    client: Client,
    chunk_size: usize,
}

impl HttpResourceFetcher {
    pub fn new(user_agent: &str, chunk_size: usize) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            chunk_size: chunk_size.max(1),
        })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match (e.status(), e.url()) {
            (Some(status), Some(url)) => FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            },
            _ => FetchError::Http(e.to_string()),
        }
    }
}

#[async_trait]
impl ResourceFetchPort for HttpResourceFetcher {
    async fn probe_content_type(&self, url: &str) -> Result<Option<String>, FetchError> {
        let response = self.client.head(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let file = tokio::fs::File::create(dest).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        Ok(written)
    }
}
