//! HTTP fetch of the country dataset.
//!
//! ### Request
//! - One GET to the canonicalized endpoint, no pagination, no auth.
//! - Configured User-Agent and request timeout.
//! - Max redirects: 5
//!
//! ### Failure mapping
//! - Non-2xx status or transport failure → `HTTP_ERROR`
//! - Request timeout → `FETCH_TIMEOUT`
//! - Body over `max_bytes` (declared or streamed) → `FETCH_TOO_LARGE`
//! - Body that is not a country array → `PARSE_ERROR`

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};

pub use url::{UrlError, canonicalize};

use crate::payload::parse_countries;
use globe_core::{AppConfig, Country, CountrySource, Error};

const MAX_REDIRECTS: usize = 5;

/// Configuration for the country API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Dataset endpoint, canonicalized on client construction.
    pub api_url: String,

    /// User agent string (default: "globe/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl ClientConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
        }
    }
}

/// Network source for the country list.
pub struct CountryApiClient {
    http: Client,
    endpoint: ::url::Url,
    config: ClientConfig,
}

impl CountryApiClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let endpoint = canonicalize(&config.api_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, endpoint, config })
    }

    pub fn endpoint(&self) -> &::url::Url {
        &self.endpoint
    }

    /// Download the raw dataset body, enforcing status and size limits.
    pub async fn fetch_body(&self) -> Result<Vec<u8>, Error> {
        let start = Instant::now();

        let mut response = self
            .http
            .get(self.endpoint.as_str())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len > self.config.max_bytes as u64
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport_error(e))? {
            if body.len() + chunk.len() > self.config.max_bytes {
                return Err(Error::FetchTooLarge(format!(
                    "body exceeds {} bytes",
                    self.config.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            fetch_ms = start.elapsed().as_millis() as u64,
            bytes = body.len(),
            "fetched country dataset"
        );

        Ok(body)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(format!("no response within {}ms", self.config.timeout.as_millis()))
        } else {
            Error::HttpError(format!("network error: {err}"))
        }
    }
}

#[async_trait]
impl CountrySource for CountryApiClient {
    async fn fetch_countries(&self) -> Result<Vec<Country>, Error> {
        let body = self.fetch_body().await?;
        let countries = parse_countries(&body)?;
        tracing::debug!(count = countries.len(), "parsed country dataset");
        Ok(countries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(head: String, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();

            // the client may hang up early on oversize bodies
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body.as_bytes()).await;
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{addr}/countries.json"), handle)
    }

    fn json_head(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        )
    }

    fn client_for(url: &str) -> CountryApiClient {
        CountryApiClient::new(ClientConfig {
            api_url: url.to_string(),
            user_agent: "globe-test/1.0".to_string(),
            max_bytes: 1024,
            timeout: Duration::from_millis(500),
        })
        .unwrap()
    }

    #[test]
    fn test_client_config_from_app_config() {
        let app = AppConfig { timeout_ms: 1500, max_bytes: 2048, ..Default::default() };
        let config = ClientConfig::from_app_config(&app);
        assert_eq!(config.api_url, app.api_url);
        assert_eq!(config.user_agent, "globe/0.1");
        assert_eq!(config.max_bytes, 2048);
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_new_canonicalizes_endpoint() {
        let client = client_for("  HTTPS://Example.COM/c.json#frag ");
        assert_eq!(client.endpoint().as_str(), "https://example.com/c.json");
    }

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let config = ClientConfig { api_url: "ftp://example.com/c.json".into(), ..Default::default() };
        let result = CountryApiClient::new(config);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_countries_success() {
        let body = r#"[{"name": "Norway", "capital": "Oslo"}, {"name": "Sweden"}]"#.to_string();
        let (url, server) = serve_once(json_head("200 OK", &body), body).await;

        let countries = client_for(&url).fetch_countries().await.unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].capital.as_deref(), Some("Oslo"));
        assert_eq!(countries[1].name, "Sweden");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /countries.json"));
        assert!(request.contains("user-agent: globe-test/1.0"));
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let body = "unavailable".to_string();
        let (url, _server) = serve_once(json_head("503 Service Unavailable", &body), body).await;

        let result = client_for(&url).fetch_countries().await;
        assert!(matches!(result, Err(Error::HttpError(ref msg)) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_fetch_rejects_declared_oversize_body() {
        let body = format!("[{}]", vec![r#"{"name":"X"}"#; 200].join(","));
        let (url, _server) = serve_once(json_head("200 OK", &body), body).await;

        let result = client_for(&url).fetch_countries().await;
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_streamed_oversize_body() {
        let body = format!("[{}]", vec![r#"{"name":"X"}"#; 200].join(","));
        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\nconnection: close\r\n\r\n".to_string();
        let (url, _server) = serve_once(head, body).await;

        let result = client_for(&url).fetch_countries().await;
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[tokio::test]
    async fn test_fetch_reports_parse_error() {
        let body = r#"{"countries": []}"#.to_string();
        let (url, _server) = serve_once(json_head("200 OK", &body), body).await;

        let result = client_for(&url).fetch_countries().await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let result = client_for(&format!("http://{addr}/countries.json")).fetch_countries().await;
        assert!(matches!(result, Err(Error::FetchTimeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client_for(&format!("http://{addr}/countries.json")).fetch_countries().await;
        assert!(matches!(result, Err(Error::HttpError(_))));
    }
}
