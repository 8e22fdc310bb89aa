//! HTTP client for the hosted search and insights APIs

use crate::config::BackendSettings;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response};
use std::time::Duration;

const APPLICATION_ID_HEADER: &str = "X-Algolia-Application-Id";
const API_KEY_HEADER: &str = "X-Algolia-API-Key";

/// Raw HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl HttpResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error message carried in the body, or the raw body
    pub fn message(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.text)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| self.text.clone())
    }
}

/// HTTP client carrying the application credentials on every request
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&BackendSettings::default())
    }

    /// Create a client with custom settings
    pub fn with_settings(settings: &BackendSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(app_id) = HeaderValue::from_str(&settings.app_id) {
            headers.insert(APPLICATION_ID_HEADER, app_id);
        }
        if let Ok(api_key) = HeaderValue::from_str(&settings.api_key) {
            headers.insert(API_KEY_HEADER, api_key);
        }

        let timeout = Duration::try_from_secs_f64(settings.request_timeout).map_err(|e| {
            Error::InvalidParams(format!("request_timeout {}: {}", settings.request_timeout, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// POST with JSON body
    pub async fn post_json(&self, url: &str, json: &serde_json::Value) -> Result<HttpResponse> {
        let response = self.client.post(url).json(json).send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response(response: Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(HttpResponse { status, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        for request_timeout in [-1.0, f64::NAN, f64::INFINITY] {
            let settings = BackendSettings {
                request_timeout,
                ..Default::default()
            };
            assert!(matches!(
                HttpClient::with_settings(&settings),
                Err(Error::InvalidParams(_))
            ));
        }
    }

    #[test]
    fn test_response_message() {
        let response = HttpResponse {
            status: 403,
            text: r#"{"message":"Invalid Application-ID or API key","status":403}"#.to_string(),
        };
        assert!(!response.is_success());
        assert_eq!(response.message(), "Invalid Application-ID or API key");

        let plain = HttpResponse {
            status: 502,
            text: "Bad Gateway".to_string(),
        };
        assert_eq!(plain.message(), "Bad Gateway");
    }
}
