use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::ApiEnvelope;
use crate::config::{Config, RetryConfig};
use crate::error::{McpError, McpResult};

/// Low-level Slack Web API client: auth, rate limiting and retries
pub struct SlackApiClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
}

impl SlackApiClient {
    pub fn new(config: &Config) -> McpResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.connection.timeout_seconds))
            .pool_max_idle_per_host(config.connection.max_idle_per_host as usize)
            .pool_idle_timeout(Duration::from_secs(
                config.connection.pool_idle_timeout_seconds,
            ))
            .build()?;

        let per_minute =
            NonZeroU32::new(config.slack.requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http,
            token: config.slack.token.clone(),
            base_url: config.slack.base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            retry: config.retry.clone(),
        })
    }

    /// Call a Web API method with query parameters and decode the payload.
    ///
    /// 429, 5xx and transport failures are retried with backoff; an
    /// `ok: false` body is returned as [`McpError::SlackApi`] right away.
    pub async fn get<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> McpResult<T> {
        let url = format!("{}/{}", self.base_url, method);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.until_ready().await;
            debug!("Slack {} (attempt {}/{})", method, attempt, max_attempts);

            let response = match self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .query(params)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if attempt < max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!("Slack {} request failed: {}, retrying in {:?}", method, e, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if attempt < max_attempts {
                    let delay = self.retry_delay(&response, attempt);
                    warn!("Slack {} returned {}, retrying in {:?}", method, status, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(McpError::SlackApi(format!(
                    "{} failed with status {} after {} attempts",
                    method, status, attempt
                )));
            }

            if !status.is_success() {
                return Err(McpError::SlackApi(format!(
                    "{} failed with status {}",
                    method, status
                )));
            }

            let body: Value = response.json().await?;
            let envelope = ApiEnvelope::deserialize(&body)?;
            if !envelope.ok {
                return Err(McpError::SlackApi(format!(
                    "{}: {}",
                    method,
                    envelope.error.as_deref().unwrap_or("unknown_error")
                )));
            }

            return Ok(serde_json::from_value(body)?);
        }
    }

    fn retry_delay(&self, response: &Response, attempt: u32) -> Duration {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(Duration::from_millis(self.retry.max_delay_ms)))
            .unwrap_or_else(|| self.retry.delay_for_attempt(attempt))
    }
}
