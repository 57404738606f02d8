//! Single-attempt HTTP downloads.
//!
//! Failures are reported as [`ProvisionError::Transport`] and never retried;
//! retry policy belongs to whatever orchestrates the build.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::io::Write;
use std::time::Duration;

use crate::error::ProvisionError;

/// Default overall request timeout for archive downloads.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connect timeout applied when building the client.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client with the given overall timeout and the default connect timeout.
    pub fn with_timeouts(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    /// Downloads `url`, streaming the body into the writer produced by
    /// `create_writer`. The writer is only created once the server has answered
    /// with a success status, so a failed request leaves nothing on disk.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let transport = |reason: String| ProvisionError::Transport {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport(format!("HTTP {}", status)).into());
        }

        let mut response = response;
        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport(format!("failed to read response body: {}", e)))?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_file_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/v1.1.1/archive.xz")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let bytes = client
            .download_file(&format!("{}/v1.1.1/archive.xz", url), || {
                Ok(std::io::sink())
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 12);
    }

    #[tokio::test]
    async fn test_download_file_not_found_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/missing.xz")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download_file(&format!("{}/missing.xz", url), || -> Result<std::io::Sink> {
                panic!("writer must not be created for a failed response")
            })
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        match err.downcast_ref::<ProvisionError>() {
            Some(ProvisionError::Transport { url: u, reason }) => {
                assert!(u.ends_with("/missing.xz"));
                assert!(reason.contains("404"));
            }
            other => panic!("Expected Transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_file_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/flaky.xz")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download_file(&format!("{}/flaky.xz", url), || Ok(std::io::sink()))
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_download_file_connection_refused() {
        let client = HttpClient::with_timeouts("par2-turbo-test", Duration::from_secs(5)).unwrap();
        // Port 9 (discard) on localhost is essentially never listening
        let result = client
            .download_file("http://127.0.0.1:9/archive.xz", || Ok(std::io::sink()))
            .await;

        assert!(matches!(
            result.unwrap_err().downcast_ref::<ProvisionError>(),
            Some(ProvisionError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_file_writer_error_propagates() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _mock = server
            .mock("GET", "/a.xz")
            .with_status(200)
            .with_body("data")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download_file(&format!("{}/a.xz", url), || -> Result<std::io::Sink> {
                Err(anyhow::anyhow!("disk full"))
            })
            .await;

        assert!(result.unwrap_err().to_string().contains("disk full"));
    }
}
