//! Delivery client — talks to the WhatsApp Web gateway that owns the paired
//! session.
//!
//! The gateway handles device pairing and session persistence; this side only
//! checks whether a chat identifier belongs to a registered account and pushes
//! a media message to it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use courier_common::error::{AppError, Result};

use crate::payload::MediaFile;

/// Operations the dispatch loop needs from the messaging channel.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Whether `identifier` maps to a reachable account on the channel.
    async fn validate(&self, identifier: &str) -> Result<bool>;

    /// Send the media attachment with `caption` to `identifier`.
    async fn send(&self, identifier: &str, media: &MediaFile, caption: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct RegisteredResponse {
    registered: bool,
}

#[derive(Debug, Deserialize)]
struct SessionStatusResponse {
    state: String,
}

#[derive(Debug, Serialize)]
struct SendMediaRequest<'a> {
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    caption: &'a str,
    media: &'a MediaFile,
}

/// HTTP client for the WhatsApp Web gateway.
pub struct GatewayClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    /// Fail unless the gateway reports a connected session.
    pub async fn ensure_connected(&self) -> Result<()> {
        let response = self
            .authorized(self.client.get(self.url("/session/status")))
            .send()
            .await?;
        let status: SessionStatusResponse = Self::check(response).await?.json().await?;

        if status.state != "CONNECTED" {
            return Err(AppError::Delivery(format!(
                "WhatsApp session not ready (state = {})",
                status.state
            )));
        }

        tracing::info!(gateway = %self.base_url, "WhatsApp session connected");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Delivery(format!("gateway returned {status}: {body}")))
    }
}

#[async_trait]
impl DeliveryClient for GatewayClient {
    async fn validate(&self, identifier: &str) -> Result<bool> {
        let path = format!("/contacts/{identifier}/registered");
        let response = self
            .authorized(self.client.get(self.url(&path)))
            .send()
            .await?;
        let body: RegisteredResponse = Self::check(response).await?.json().await?;
        Ok(body.registered)
    }

    async fn send(&self, identifier: &str, media: &MediaFile, caption: &str) -> Result<()> {
        let request = SendMediaRequest {
            chat_id: identifier,
            caption,
            media,
        };
        let response = self
            .authorized(self.client.post(self.url("/messages/media")))
            .json(&request)
            .send()
            .await?;
        Self::check(response).await?;

        tracing::debug!(identifier, "Media message accepted by gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            GatewayClient::new("http://localhost:3000/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.url("/messages/media"),
            "http://localhost:3000/messages/media"
        );
    }

    #[test]
    fn test_send_request_shape() {
        let media = MediaFile {
            mimetype: "image/png".to_string(),
            filename: "a.png".to_string(),
            data: "AAAA".to_string(),
        };
        let body = serde_json::to_value(SendMediaRequest {
            chat_id: "5511987654321@c.us",
            caption: "oi",
            media: &media,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "chatId": "5511987654321@c.us",
                "caption": "oi",
                "media": { "mimetype": "image/png", "filename": "a.png", "data": "AAAA" }
            })
        );
    }
}
