//! Page fetching for pubtrace.
//!
//! Everything that touches the network goes through [`PageFetcher`]. The
//! production implementation is [`HttpFetcher`], a reqwest client with a
//! fixed timeout and User-Agent; tests substitute in-memory fakes.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use pubtrace_shared::{HttpConfig, PubtraceError};

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// FetchError / FetchedPage
// ---------------------------------------------------------------------------

/// Why a fetch produced no content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The URL could not be parsed or uses a scheme other than http/https.
    #[error("{url}: invalid URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("{url}: timed out")]
    Timeout { url: String },

    /// Connection, TLS, redirect or other transport failure.
    #[error("{url}: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("{url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body could not be read as text.
    #[error("{url}: failed to read body: {reason}")]
    Body { url: String, reason: String },

    /// The body exceeds the accepted size.
    #[error("{url}: response too large ({size} bytes, max {MAX_RESPONSE_SIZE})")]
    TooLarge { url: String, size: u64 },
}

impl From<FetchError> for PubtraceError {
    fn from(err: FetchError) -> Self {
        PubtraceError::Network(err.to_string())
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL the content was finally served from (after redirects).
    pub final_url: String,
    /// Response body as text.
    pub body: String,
}

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// Fetch-by-URL capability consumed by the locator, resolver and catalog loader.
///
/// Implementations must bound every request in time; a timeout is reported
/// as an error like any other failure.
pub trait PageFetcher: Send + Sync {
    /// Retrieve the textual content at `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// Whether `url` starts with an accepted scheme (`http://` or `https://`).
pub fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// reqwest-backed [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher from the `[http]` configuration.
    pub fn new(config: &HttpConfig) -> pubtrace_shared::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PubtraceError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = parse_http_url(url)?;
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Check content-length if available
        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    size: len,
                });
            }
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if body.len() as u64 > MAX_RESPONSE_SIZE {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                size: body.len() as u64,
            });
        }

        debug!(%url, %final_url, bytes = body.len(), "page fetched");
        Ok(FetchedPage { final_url, body })
    }
}

/// Parse `url` and require an http/https scheme.
fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn request_error(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
