//! HttpClient middleware used by PokedexClient
//!
//! Responsible for
//!  - handing all HTTP api requests
//!  - logging/tracing
//!  - retries and backoff (for timeouts and connection errors)
//!  - rate limiting

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use reqwest::{ClientBuilder, Method, StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use snafu::prelude::*;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Result,
    config::{MAX_RETRIES, RATE_LIMIT_WAIT_MAX_SECS, RATE_LIMIT_WAIT_WARN_SECS},
    error::{HttpSnafu, PokedexError},
};

/// HTTP metrics tracked using atomic counters for thread-safe access.
/// These counters are cumulative and never reset during the client's lifetime.
#[derive(Debug, Default)]
pub struct HttpMetrics {
    /// Total number of HTTP requests sent to the server (excludes cached responses)
    total_requests: AtomicU64,
    /// Total number of successful responses (2xx status codes)
    successful_responses: AtomicU64,
    /// Total number of error responses (non-2xx status codes, excluding rate limit errors)
    errors: AtomicU64,
    /// Total number of retry attempts (connection failures, timeouts, retryable statuses)
    retries: AtomicU64,
    /// Total bytes received in response bodies
    bytes_received: AtomicU64,
    /// Total number of rate limit errors (429 responses)
    rate_limit_errors: AtomicU64,
    /// Total seconds spent waiting for rate limit backoff
    rate_limit_delay_secs: AtomicU64,
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of current metrics as plain u64 values
    pub fn snapshot(&self) -> HttpMetricsSnapshot {
        HttpMetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_responses: self.successful_responses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            rate_limit_errors: self.rate_limit_errors.load(Ordering::Relaxed),
            rate_limit_delay_secs: self.rate_limit_delay_secs.load(Ordering::Relaxed),
        }
    }

    fn increment_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_success(&self) {
        self.successful_responses.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    fn increment_rate_limit_errors(&self) {
        self.rate_limit_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn add_rate_limit_delay(&self, secs: u64) {
        self.rate_limit_delay_secs
            .fetch_add(secs, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of HTTP metrics with plain u64 values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpMetricsSnapshot {
    /// Total number of HTTP requests sent to the server
    pub total_requests: u64,
    /// Total number of successful responses (2xx status codes)
    pub successful_responses: u64,
    /// Total number of error responses (non-2xx status codes, excluding rate limit errors)
    pub errors: u64,
    /// Total number of retry attempts
    pub retries: u64,
    /// Total bytes received in response bodies
    pub bytes_received: u64,
    /// Total number of rate limit errors (429 responses)
    pub rate_limit_errors: u64,
    /// Total seconds spent waiting for rate limit backoff
    pub rate_limit_delay_secs: u64,
}

impl std::fmt::Display for HttpMetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requests={} success={} errors={} retries={} rate_limit={}/{}s recv={}",
            self.total_requests,
            self.successful_responses,
            self.errors,
            self.retries,
            self.rate_limit_errors,
            self.rate_limit_delay_secs,
            format_bytes(self.bytes_received),
        )
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes}B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// status codes where it's ok to retry and backoff
fn retry_for_status(code: StatusCode) -> bool {
    matches!(
        code,
        StatusCode::TOO_MANY_REQUESTS /* 429 */
            | StatusCode::GATEWAY_TIMEOUT /* 504 */
            | StatusCode::REQUEST_TIMEOUT /* 408 */
            | StatusCode::BAD_GATEWAY /* 502 */
            | StatusCode::SERVICE_UNAVAILABLE /* 503 */
    )
}

/// A GET request. `target` is either a path relative to the base url,
/// or an absolute url (references returned by the index endpoints are absolute).
#[derive(Clone, Default)]
pub(crate) struct HttpRequest {
    pub target: String,
    pub query: Vec<(String, String)>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("target", &self.target)
            .field("query", &self.query)
            .finish()
    }
}

impl HttpRequest {
    pub(crate) fn get(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            query: Vec::new(),
        }
    }

    pub(crate) fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    pub client: reqwest::Client,

    /// Base URL for API requests (e.g., "https://pokeapi.co/api/v2")
    pub base_url: String,

    // Max consecutive 429 retries before failing; 0 disables cap.
    rate_limit_max_retries: u32,

    /// HTTP request/response metrics
    pub metrics: std::sync::Arc<HttpMetrics>,
}

struct ParsedRetry {
    header: String,
    duration: Duration,
}

/// Parse rate limit headers from a 429 response to determine retry duration.
/// Checks the standard `Retry-After` (seconds form) and the common
/// `RateLimit-Reset` / `X-Rate-Limit-Duration` headers.
fn parse_retry_after(headers: &HeaderMap) -> Result<ParsedRetry> {
    for header_name in ["retry-after", "ratelimit-reset", "x-rate-limit-duration"] {
        if let Some(header_value) = headers.get(header_name)
            && let Ok(header) = header_value.to_str()
        {
            if let Ok(secs) = header.trim().parse::<u64>() {
                return Ok(ParsedRetry {
                    duration: Duration::from_secs(secs),
                    header: header.to_string(),
                });
            }
            error!("Could not parse 429 response header '{header_name}: {header}'");
        }
    }

    // couldn't parse header
    Err(PokedexError::RateLimitExceeded {
        header: "Received 429 response but couldn't parse rate limit headers. See logs".to_string(),
        duration: Duration::from_secs(0),
    })
}

impl HttpClient {
    pub fn new(builder: ClientBuilder, base_url: String, rate_limit_max_retries: u32) -> Result<Self> {
        let client = builder.build().context(HttpSnafu {
            method: "client-init",
            url: "",
        })?;
        Ok(HttpClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limit_max_retries,
            metrics: std::sync::Arc::new(HttpMetrics::new()),
        })
    }

    /// Returns a snapshot of current HTTP metrics
    pub fn metrics_snapshot(&self) -> HttpMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Full url for a request target
    pub(crate) fn url_for(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}/{}", self.base_url, target.trim_start_matches('/'))
        }
    }

    /// This function handles all rest api requests
    /// - handles 429 rate limit feedback
    /// - retries up to N(=3) times for connection failures or server timeout
    /// - maps http error codes into PokedexErrors
    /// - deserializes json response body into return type T
    pub(crate) async fn send<T: DeserializeOwned>(&self, req: HttpRequest) -> Result<T> {
        // attempt counter is for server busy and connection drop errors
        // counter is reset to 0 whenever we wait based on 429 rate limit response
        let mut attempt = 0u32;
        let mut rate_limit_retries = 0u32;

        // time to wait on next iteration
        let mut retry_wait: Option<Duration> = None;

        let full_url = self.url_for(&req.target);
        let req_builder = self
            .client
            .request(Method::GET, &full_url)
            .query(&req.query);

        // debug log (if tracing enabled)
        log_request(&req_builder);

        loop {
            if let Some(wait_time) = retry_wait {
                info!("RateLimit: pausing for {} sec", wait_time.as_secs());
                tokio::time::sleep(wait_time).await;
                retry_wait = None;
                attempt = 0;
            }
            let request = req_builder.try_clone().ok_or_else(|| {
                // try_clone with no body should never return None
                PokedexError::Other {
                    message: "reqwest::RequestBuilder internal error".into(),
                }
            })?;

            self.metrics.increment_requests();

            match request.send().await {
                Ok(response) => {
                    let code = response.status();
                    if code != StatusCode::TOO_MANY_REQUESTS {
                        rate_limit_retries = 0;
                    }
                    match code {
                        ok if ok.is_success() => {
                            let body: Bytes = response.bytes().await.context(HttpSnafu {
                                method: "GET",
                                url: full_url.clone(),
                            })?;
                            self.metrics.increment_success();
                            self.metrics.add_bytes_received(body.len() as u64);

                            log_response(&full_url, &body);

                            // deserialization failure should not be retried
                            return deserialize_json(&body);
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            self.metrics.increment_rate_limit_errors();
                            rate_limit_retries = rate_limit_retries.saturating_add(1);
                            let ParsedRetry { header, duration } =
                                parse_retry_after(response.headers()).inspect_err(|e| {
                                    error!("{e:?}");
                                })?;
                            if self.rate_limit_max_retries > 0
                                && rate_limit_retries > self.rate_limit_max_retries
                            {
                                error!(
                                    attempt,
                                    ?req,
                                    "http 429 Rate-limit retries exceeded max={}",
                                    self.rate_limit_max_retries
                                );
                                return Err(PokedexError::RateLimitExceeded { header, duration });
                            }
                            if duration > Duration::from_secs(RATE_LIMIT_WAIT_MAX_SECS) {
                                error!(
                                    attempt,
                                    ?req,
                                    "http 429 Rate-limit backoff={}s exceeds max",
                                    duration.as_secs()
                                );
                                return Err(PokedexError::RateLimitExceeded { header, duration });
                            }
                            if duration > Duration::from_secs(RATE_LIMIT_WAIT_WARN_SECS) {
                                warn!(attempt, "http 429 Rate-limit backoff={}s", duration.as_secs());
                            }
                            self.metrics.increment_retries();
                            self.metrics.add_rate_limit_delay(duration.as_secs());
                            retry_wait = Some(duration);
                        }
                        StatusCode::NOT_FOUND | StatusCode::GONE => {
                            self.metrics.increment_errors();
                            let message = response.text().await.unwrap_or_else(|_| "NotFound".into());
                            debug!(?code, ?message, ?req, "http");
                            let (kind, key) = not_found_key(&req.target);
                            return Err(PokedexError::NotFound { kind, key });
                        }
                        _ => {
                            let message = response.text().await.unwrap_or_default();
                            error!(?code, ?req, message, attempt, "http");
                            self.metrics.increment_errors();
                            if attempt < MAX_RETRIES && retry_for_status(code) {
                                log_and_backoff(attempt, code.to_string()).await;
                                self.metrics.increment_retries();
                                attempt += 1;
                                continue;
                            }
                            return Err(PokedexError::ApiError {
                                code: code.as_u16(),
                                method: "GET".to_string(),
                                url: full_url,
                                message,
                            });
                        }
                    }
                }
                Err(e) => {
                    error!(source=?e, ?req, "http");
                    // Check for connection or timeout errors
                    if (e.is_connect() || e.is_timeout()) && attempt < MAX_RETRIES {
                        rate_limit_retries = 0;
                        log_and_backoff(attempt, e.to_string()).await;
                        self.metrics.increment_retries();
                        attempt += 1;
                        continue;
                    }
                    // Other non-recoverable errors (e.g., DNS error, invalid URL, etc.)
                    self.metrics.increment_errors();
                    return Err(PokedexError::Http {
                        method: "GET".to_string(),
                        url: full_url,
                        source: e,
                    });
                }
            }
        }
    }
}

// "pokemon/25/" -> ("pokemon", "25"), "type/fire" -> ("type", "fire")
fn not_found_key(target: &str) -> (String, String) {
    let mut segments = target.rsplit('/').filter(|segment| !segment.is_empty());
    let key = segments.next().unwrap_or_default().to_string();
    let kind = segments.next().unwrap_or("resource").to_string();
    (kind, key)
}

// dump request
// requires RUST_LOG=pokedex::http_json=trace
fn log_request(builder: &reqwest::RequestBuilder) {
    if tracing::enabled!(target: "pokedex::http_json", tracing::Level::TRACE)
        && let Some(req) = builder.try_clone().and_then(|b| b.build().ok())
    {
        trace!(target: "pokedex::http_json", "GET url={}", req.url());
    }
}

// dump json response, for debugging
fn log_response(url: &str, body: &Bytes) {
    if tracing::enabled!(target: "pokedex::http_json", tracing::Level::TRACE) {
        trace!(target: "pokedex::http_json", "Response url={url} body={}",
            String::from_utf8_lossy(body)
        );
    }
}

// deserialize, reporting errors with 'serde_path_to_error', which provides
// detailed json path to the error
pub(crate) fn deserialize_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        error!("Deserialization failed at {}: {}", err.path(), err);
        PokedexError::Deserialization {
            path: err.path().to_string(),
            source: err.into_inner(),
        }
    })
}

// log attempt and sleep for exponential backoff
async fn log_and_backoff(attempt: u32, err: String) {
    // exponential backoff: 1s, 2s, 4s, with jitter
    let base_delay = 2u64.pow(attempt);
    let jitter = f64::from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos(),
    ) / 1_000_000_000.0;
    let jittered_delay = ((base_delay as f64) * (0.5 + jitter)).round() as u64;
    let delay = jittered_delay.max(1);
    warn!("Recoverable error {err}. Attempt {attempt}. Waiting {delay}s before retry");
    tokio::time::sleep(Duration::from_secs(delay)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_retry_for_status() {
        assert!(retry_for_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(retry_for_status(StatusCode::REQUEST_TIMEOUT));
        assert!(retry_for_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(retry_for_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!retry_for_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!retry_for_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        let parsed = parse_retry_after(&headers).expect("parse retry header");
        assert_eq!(parsed.duration.as_secs(), 3);
        assert_eq!(parsed.header, "3");
    }

    #[test]
    fn test_parse_retry_after_x_rate_limit_duration() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-duration", HeaderValue::from_static("10"));
        let parsed = parse_retry_after(&headers).expect("parse retry header");
        assert_eq!(parsed.duration.as_secs(), 10);
    }

    #[test]
    fn test_parse_retry_after_missing() {
        assert!(matches!(
            parse_retry_after(&HeaderMap::new()),
            Err(PokedexError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_url_for() {
        let client = HttpClient::new(
            reqwest::Client::builder(),
            "https://pokeapi.co/api/v2/".into(),
            0,
        )
        .expect("client");
        assert_eq!(client.url_for("pokemon"), "https://pokeapi.co/api/v2/pokemon");
        assert_eq!(client.url_for("/type/fire"), "https://pokeapi.co/api/v2/type/fire");
        assert_eq!(
            client.url_for("http://127.0.0.1:8080/pokemon/25/"),
            "http://127.0.0.1:8080/pokemon/25/"
        );
    }

    #[test]
    fn test_not_found_key() {
        assert_eq!(
            not_found_key("https://pokeapi.co/api/v2/pokemon/99999/"),
            ("pokemon".to_string(), "99999".to_string())
        );
        assert_eq!(
            not_found_key("type/shadow"),
            ("type".to_string(), "shadow".to_string())
        );
    }

    #[test]
    fn test_deserialize_json_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Outer {
            #[allow(dead_code)]
            inner: Inner,
        }
        #[derive(Debug, serde::Deserialize)]
        struct Inner {
            #[allow(dead_code)]
            id: u32,
        }
        let err = deserialize_json::<Outer>(br#"{"inner":{"id":"x"}}"#).expect_err("bad id");
        match err {
            PokedexError::Deserialization { path, .. } => assert_eq!(path, "inner.id"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_metrics_display() {
        let snapshot = HttpMetricsSnapshot {
            total_requests: 3,
            successful_responses: 2,
            errors: 1,
            bytes_received: 2048,
            ..Default::default()
        };
        assert_eq!(
            snapshot.to_string(),
            "requests=3 success=2 errors=1 retries=0 rate_limit=0/0s recv=2.0KB"
        );
    }
}
