use crate::utils::error::{Result, SyncError};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 512;

/// Bounded retry for transient failures (connect errors, timeouts, 5xx, 429).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

/// Sends the request produced by `build`, retrying while the failure is transient.
///
/// `build` is called once per attempt since a sent request is consumed.
/// Non-success statuses become `HttpStatus` errors; the last error is
/// returned once attempts run out.
pub async fn send_with_retry<F>(
    retry: &RetryPolicy,
    operation: &str,
    target: &str,
    build: F,
) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        tracing::debug!("{} -> {} (attempt {})", operation, target, attempt + 1);

        let error = match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status().as_u16();
                let mut body = response.text().await.unwrap_or_default();
                body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
                SyncError::HttpStatus {
                    operation: operation.to_string(),
                    target: target.to_string(),
                    status,
                    body,
                }
            }
            Err(e) => SyncError::transport(operation, target, e),
        };

        if attempt >= retry.attempts || !error.is_retryable() {
            return Err(error);
        }

        attempt += 1;
        let wait = retry.delay * attempt;
        tracing::warn!(
            "{} (retry {}/{} in {:?})",
            error,
            attempt,
            retry.attempts,
            wait
        );
        tokio::time::sleep(wait).await;
    }
}

/// Reads the body and decodes it, reporting decode problems as malformed payloads.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    operation: &str,
    target: &str,
) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| SyncError::transport(operation, target, e))?;
    serde_json::from_str(&text).map_err(|e| SyncError::malformed(operation, target, e.to_string()))
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}
