//! Outbound HTTP for every Steam endpoint
//!
//! All requests go through an [`HttpTransport`] so callers and tests can
//! swap the network out. [`FetchClient`] turns raw responses into typed
//! errors: a status error carrying code and reason text, and a dedicated
//! rate-limit variant for 429.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::SteamConfig;

/// Errors that can occur during fetching
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("HTTP {status} {status_text} from {url}")]
    Status {
        status: u16,
        status_text: String,
        url: String,
    },
    #[error("Rate limited by {url}, retry after {retry_after:?}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// An outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// POST with an `application/x-www-form-urlencoded` body
    pub fn post_form(url: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Value of a request header (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response as seen by the client, before any status checks
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: default_reason(status).to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn default_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// The network primitive every Steam call goes through
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Configuration for the reqwest transport
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string
    pub user_agent: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&SteamConfig::default())
    }
}

impl From<&SteamConfig> for FetchConfig {
    fn from(config: &SteamConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            max_redirects: 10,
        }
    }
}

/// [`HttpTransport`] backed by a pooled reqwest client
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = match request.method {
            Method::Get => self.http_client.get(&request.url),
            Method::Post => self.http_client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

/// Typed-error wrapper over a shared transport
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn HttpTransport>,
}

impl FetchClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Send without status checks
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        debug!(method = ?request.method, url = %request.url, "Outbound request");
        self.transport.send(request).await
    }

    /// Send and fail on any non-2xx status
    pub async fn send_checked(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url.clone();
        let response = self.send(request).await?;
        ensure_success(&url, response)
    }

    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.send_checked(HttpRequest::get(url)).await?.text())
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.send_checked(HttpRequest::get(url)).await?.body)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.get_bytes(url).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Map a non-2xx response to its typed error
pub fn ensure_success(url: &str, response: HttpResponse) -> Result<HttpResponse, FetchError> {
    if response.is_ok() {
        return Ok(response);
    }
    if response.status == 429 {
        let retry_after = response
            .header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(FetchError::RateLimited {
            url: url.to_string(),
            retry_after,
        });
    }
    Err(FetchError::Status {
        status: response.status,
        status_text: response.status_text,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steam::testing::MockTransport;

    #[test]
    fn test_post_form_encodes_body() {
        let req = HttpRequest::post_form(
            "https://example.com/agecheckset",
            &[("sessionid", "abc"), ("ageMonth", "January")],
        );
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_deref(), Some("sessionid=abc&ageMonth=January"));
        assert_eq!(
            req.header_value("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_ensure_success_maps_statuses() {
        let ok = ensure_success("u", HttpResponse::new(204, "")).unwrap();
        assert_eq!(ok.status, 204);

        let err = ensure_success("u", HttpResponse::new(404, "")).unwrap_err();
        match &err {
            FetchError::Status {
                status,
                status_text,
                ..
            } => {
                assert_eq!(*status, 404);
                assert_eq!(status_text, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_rate_limit_reads_retry_after() {
        let mut response = HttpResponse::new(429, "");
        response
            .headers
            .push(("Retry-After".to_string(), "30".to_string()));
        let err = ensure_success("https://store.steampowered.com", response).unwrap_err();
        assert!(err.is_rate_limited());
        assert!(matches!(
            err,
            FetchError::RateLimited { retry_after: Some(d), .. } if d == Duration::from_secs(30)
        ));
    }

    #[tokio::test]
    async fn test_get_json_decodes_and_reports_bad_bodies() {
        let transport = Arc::new(
            MockTransport::new()
                .on_get("/good", HttpResponse::new(200, r#"{"value": 7}"#))
                .on_get("/bad", HttpResponse::new(200, "<html>")),
        );
        let client = FetchClient::new(transport);

        let value: serde_json::Value = client.get_json("https://x/good").await.unwrap();
        assert_eq!(value["value"], 7);

        let err = client
            .get_json::<serde_json::Value>("https://x/bad")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
