//! Blocking HTTP client shared by every remote collaborator.
//!
//! Retries connectivity errors, 429 and 5xx responses with exponential
//! backoff. Other HTTP statuses fail immediately.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP {code} from {url}")]
    Status { code: u16, url: String },

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl HttpError {
    /// Timeouts and connection failures, as opposed to an HTTP status answer.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, HttpError::Timeout(_) | HttpError::Unreachable(_))
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Override the first backoff delay (doubles on every retry).
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` with query parameters and return the body as text.
    pub fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, HttpError> {
        self.send(url, || self.client.get(url).query(query))
    }

    /// Send the request produced by `build`, retrying as described in the
    /// module docs. `url` is only used for logging and error messages.
    pub fn send<F>(&self, url: &str, build: F) -> Result<String, HttpError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(url, attempt, ?delay, "retrying request");
                std::thread::sleep(delay);
            }

            match build().send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.text().map_err(|e| HttpError::Body(e.to_string()));
                    }

                    let body = resp.text().unwrap_or_default();
                    debug!(url, %status, body = %truncate(&body, 300), "non-success response");
                    let err = HttpError::Status {
                        code: status.as_u16(),
                        url: url.to_string(),
                    };
                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        warn!(url, %status, attempt, "retryable HTTP status");
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) if e.is_timeout() => {
                    warn!(url, attempt, "request timed out");
                    last_error = Some(HttpError::Timeout(e.to_string()));
                }
                Err(e) if e.is_connect() => {
                    warn!(url, attempt, error = %e, "connection failed");
                    last_error = Some(HttpError::Unreachable(e.to_string()));
                }
                Err(e) => return Err(HttpError::Unreachable(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| HttpError::Unreachable("max retries exceeded".into())))
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
