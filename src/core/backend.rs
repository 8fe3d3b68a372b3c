//! HTTP client for the extraction backend

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Result, StreamSaverError};
use crate::types::AnalysisResult;

const USER_AGENT: &str = concat!("stream-saver/", env!("CARGO_PKG_VERSION"));

/// Error body returned with non-2xx analyze responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Cheap to clone; clones share the connection pool
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str, probe_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness check against `GET /`. Any HTTP response counts as reachable.
    pub async fn probe(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .timeout(self.probe_timeout)
            .send()
            .await?;
        debug!(status = %response.status(), "probe answered");
        Ok(())
    }

    /// Submit a URL to `POST /analyze`
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&json!({ "url": url }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| "Failed to fetch info".into());
            return Err(StreamSaverError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Address of `GET /download` for a media reference and format id
    pub fn download_url(&self, reference: &str, format_id: &str) -> String {
        format!(
            "{}/download?url={}&format={}",
            self.base_url,
            urlencoding::encode(reference),
            urlencoding::encode(format_id)
        )
    }

    /// Backend-hosted thumbnails pass through; anything else goes via `/proxy_thumbnail`
    pub fn thumbnail_src(&self, thumbnail: &str) -> String {
        if thumbnail.starts_with(&self.base_url) {
            return thumbnail.to_string();
        }
        format!(
            "{}/proxy_thumbnail?url={}",
            self.base_url,
            urlencoding::encode(thumbnail)
        )
    }

    /// Fetch image bytes from a thumbnail source, bounded like a probe
    pub async fn fetch_thumbnail(&self, src: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(src)
            .timeout(self.probe_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StreamSaverError::Backend {
                status: status.as_u16(),
                message: "thumbnail unavailable".into(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
