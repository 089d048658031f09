//! Remote exchange with the chat endpoint
//!
//! One exchange is one multipart `POST` carrying the API key, the user's text
//! and any attached files. The whole response body is read as text and
//! handed back unchanged. There is no streaming, no retry and no
//! cancellation: a failed request is reported once and the caller decides
//! what to show.

use crate::config::TransportConfig;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// A file attached to the next message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name sent with the upload
    pub name: String,
    /// File contents
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read an attachment from disk
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Attachment` if the path has no file name or
    /// cannot be read
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                ChatError::Attachment(format!("Not a file path: {}", path.display()))
            })?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            ChatError::Attachment(format!("Failed to read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded attachment {} ({} bytes)", name, data.len());
        Ok(Self { name, data })
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Sends one message to the chat endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single exchange and return the response body
    ///
    /// # Errors
    ///
    /// Returns `ChatError::RequestFailed` on network failure or a
    /// non-success status
    async fn send(&self, api_key: &str, text: &str, attachments: &[Attachment]) -> Result<String>;

    /// Check whether the endpoint accepts `api_key`
    ///
    /// Sends the text `test` and reports whether the status was a success.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::RequestFailed` when the endpoint cannot be reached
    async fn verify_key(&self, api_key: &str) -> Result<bool>;
}

/// HTTP implementation of [`Transport`]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use quillchat::config::TransportConfig;
    /// use quillchat::transport::HttpTransport;
    ///
    /// let transport = HttpTransport::new(&TransportConfig::default()).unwrap();
    /// assert_eq!(transport.endpoint(), TransportConfig::default().endpoint);
    /// ```
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized chat transport: endpoint={}", config.endpoint);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Configured endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(api_key: &str, text: &str, attachments: &[Attachment]) -> Form {
        let mut form = Form::new()
            .text("key", api_key.to_string())
            .text("text", text.to_string());
        for attachment in attachments {
            let part = Part::bytes(attachment.data.clone()).file_name(attachment.name.clone());
            form = form.part("files[]", part);
        }
        form
    }

    async fn post(&self, form: Form) -> Result<reqwest::Response> {
        self.client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()).into())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, api_key: &str, text: &str, attachments: &[Attachment]) -> Result<String> {
        tracing::debug!(
            "Sending message: {} chars, {} attachment(s)",
            text.chars().count(),
            attachments.len()
        );

        let response = self
            .post(Self::build_form(api_key, text, attachments))
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Chat endpoint returned {}", status);
            return Err(ChatError::RequestFailed(format!(
                "HTTP error! status: {}",
                status.as_u16()
            ))
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;
        tracing::debug!("Received response: {} bytes", body.len());
        Ok(body)
    }

    async fn verify_key(&self, api_key: &str) -> Result<bool> {
        let response = self.post(Self::build_form(api_key, "test", &[])).await?;
        let ok = response.status().is_success();
        tracing::info!("API key check returned {}", response.status());
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_size() {
        let a = Attachment::new("a.txt", b"hello".to_vec());
        assert_eq!(a.size(), 5);
        assert_eq!(a.name, "a.txt");
    }

    #[tokio::test]
    async fn test_attachment_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# notes").unwrap();

        let a = Attachment::from_path(&path).await.unwrap();
        assert_eq!(a.name, "notes.md");
        assert_eq!(a.data, b"# notes");
    }

    #[tokio::test]
    async fn test_attachment_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Attachment::from_path(&dir.path().join("missing.bin"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_new_uses_configured_endpoint() {
        let config = TransportConfig {
            endpoint: "http://127.0.0.1:9/chat".to_string(),
            ..TransportConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/chat");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_failed() {
        let config = TransportConfig {
            endpoint: "http://127.0.0.1:9/chat".to_string(),
            timeout_seconds: 2,
            ..TransportConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let err = transport.send("k", "hi", &[]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::RequestFailed(_))
        ));
    }
}
