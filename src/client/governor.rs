//! Retry/backoff policy applied to every outbound call.
//!
//! The governor reads each response fully into an [`HttpReply`], decides
//! whether the server signalled a throttle (primary or secondary rate limit)
//! or a transient failure, and either sleeps and re-issues the request or
//! hands the reply back to the caller. Retries are bounded by
//! [`RateLimitPolicy::max_retries`]; running out surfaces as
//! [`SyncError::TransportError`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::constants::{
    DEFAULT_FALLBACK_WAIT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_TRANSIENT_BACKOFF_MS,
};
use crate::error::{SyncError, SyncResult};
use crate::logging::{log_debug, log_warn};

/// What to do when the server signals a rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitAction {
    /// Wait the advised delay and retry while the retry budget lasts.
    Retry,
    /// Wait and retry at most once per call.
    RetryOnce,
    /// Fail the call immediately.
    Abort,
}

impl FromStr for LimitAction {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retry" => Ok(LimitAction::Retry),
            "retry-once" | "retry_once" | "once" => Ok(LimitAction::RetryOnce),
            "abort" => Ok(LimitAction::Abort),
            other => Err(SyncError::ConfigError(format!(
                "unknown rate limit action '{}' (expected retry, retry-once or abort)",
                other
            ))),
        }
    }
}

impl fmt::Display for LimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimitAction::Retry => "retry",
            LimitAction::RetryOnce => "retry-once",
            LimitAction::Abort => "abort",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_retries: u32,
    pub on_primary_limit: LimitAction,
    pub on_secondary_limit: LimitAction,
    /// First delay for transient failures, doubled per retry.
    pub transient_backoff: Duration,
    /// Delay used when a throttle response carries no timing headers.
    pub fallback_wait: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            on_primary_limit: LimitAction::Retry,
            on_secondary_limit: LimitAction::Abort,
            transient_backoff: Duration::from_millis(DEFAULT_TRANSIENT_BACKOFF_MS),
            fallback_wait: Duration::from_secs(DEFAULT_FALLBACK_WAIT_SECS),
        }
    }
}

impl RateLimitPolicy {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_primary_limit(mut self, action: LimitAction) -> Self {
        self.on_primary_limit = action;
        self
    }

    #[must_use]
    pub fn with_secondary_limit(mut self, action: LimitAction) -> Self {
        self.on_secondary_limit = action;
        self
    }

    #[must_use]
    pub fn with_transient_backoff(mut self, backoff: Duration) -> Self {
        self.transient_backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_fallback_wait(mut self, wait: Duration) -> Self {
        self.fallback_wait = wait;
        self
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpReply {
    async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(Self { status, headers, body })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> SyncResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
    }

    fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    fn reset_wait(&self) -> Option<Duration> {
        let reset = self.header("x-ratelimit-reset")?.parse::<i64>().ok()?;
        let remaining = reset - chrono::Utc::now().timestamp();
        Some(Duration::from_secs(remaining.max(0) as u64))
    }
}

/// A server signal that the call should be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Throttle {
    Primary(Duration),
    Secondary(Duration),
    Transient(String),
}

impl fmt::Display for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throttle::Primary(wait) => write!(f, "primary rate limit (retry after {:?})", wait),
            Throttle::Secondary(wait) => write!(f, "secondary rate limit (retry after {:?})", wait),
            Throttle::Transient(reason) => write!(f, "transient failure: {}", reason),
        }
    }
}

/// Decide whether a reply is a throttle or transient failure.
pub fn classify(reply: &HttpReply, fallback: Duration) -> Option<Throttle> {
    let status = reply.status;
    let limit_status = status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;
    let body = reply.body.to_lowercase();

    if limit_status && (body.contains("secondary rate limit") || body.contains("abuse")) {
        return Some(Throttle::Secondary(reply.retry_after().unwrap_or(fallback)));
    }

    let exhausted = reply.header("x-ratelimit-remaining") == Some("0");
    let graphql_limited =
        reply.body.contains("RATE_LIMITED") && has_rate_limited_error(&reply.body);
    if (exhausted && limit_status) || graphql_limited || status == StatusCode::TOO_MANY_REQUESTS {
        let wait = reply
            .retry_after()
            .or_else(|| reply.reset_wait())
            .unwrap_or(fallback);
        return Some(Throttle::Primary(wait));
    }

    if matches!(
        status,
        StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    ) {
        return Some(Throttle::Transient(format!("status {}", status)));
    }

    None
}

// GitHub's GraphQL API reports primary limits as a 200 with a typed error
fn has_rate_limited_error(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("errors").and_then(|e| e.as_array()).cloned())
        .map(|errors| {
            errors
                .iter()
                .any(|e| e.get("type").and_then(|t| t.as_str()) == Some("RATE_LIMITED"))
        })
        .unwrap_or(false)
}

/// Per-call retry bookkeeping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub retries: u32,
    primary: u32,
    secondary: u32,
    transient: u32,
}

#[derive(Debug, Clone)]
pub struct Governor {
    policy: RateLimitPolicy,
}

impl Governor {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { policy }
    }

    /// Issue `request` until it yields a reply that is not a throttle.
    ///
    /// `label` names the call in logs and errors; it must not contain secrets.
    pub async fn send<F, Fut>(&self, label: &str, mut request: F) -> SyncResult<HttpReply>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        self.drive(label, || {
            let pending = request();
            async move {
                let response = pending.await.map_err(|e| e.to_string())?;
                HttpReply::read(response).await.map_err(|e| e.to_string())
            }
        })
        .await
    }

    /// Retry loop over already-read replies; an `Err` is a transport failure.
    async fn drive<F, Fut>(&self, label: &str, mut attempt: F) -> SyncResult<HttpReply>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpReply, String>>,
    {
        let mut state = RetryState::default();

        loop {
            let throttle = match attempt().await {
                Ok(reply) => match classify(&reply, self.policy.fallback_wait) {
                    Some(throttle) => throttle,
                    None => {
                        log_debug(&format!("{} -> {}", label, reply.status));
                        return Ok(reply);
                    }
                },
                Err(reason) => Throttle::Transient(reason),
            };

            let wait = self
                .plan(&throttle, &mut state)
                .map_err(|reason| SyncError::TransportError(format!("{}: {}", label, reason)))?;

            log_warn(&format!(
                "{}: {}; retrying in {:?} (attempt {}/{})",
                label, throttle, wait, state.retries, self.policy.max_retries
            ));
            tokio::time::sleep(wait).await;
        }
    }

    /// Consume one retry for `throttle`, returning how long to wait.
    pub fn plan(&self, throttle: &Throttle, state: &mut RetryState) -> Result<Duration, String> {
        if state.retries >= self.policy.max_retries {
            return Err(format!(
                "gave up after {} retries, last error: {}",
                state.retries, throttle
            ));
        }

        let wait = match throttle {
            Throttle::Primary(wait) => {
                Self::admit(self.policy.on_primary_limit, &mut state.primary, throttle)?;
                *wait
            }
            Throttle::Secondary(wait) => {
                Self::admit(self.policy.on_secondary_limit, &mut state.secondary, throttle)?;
                *wait
            }
            Throttle::Transient(_) => {
                let factor = 1u32 << state.transient.min(16);
                state.transient += 1;
                self.policy.transient_backoff.saturating_mul(factor)
            }
        };

        state.retries += 1;
        Ok(wait)
    }

    fn admit(action: LimitAction, taken: &mut u32, throttle: &Throttle) -> Result<(), String> {
        match action {
            LimitAction::Abort => Err(format!("{}; policy is to abort", throttle)),
            LimitAction::RetryOnce if *taken >= 1 => {
                Err(format!("{} again after one retry", throttle))
            }
            LimitAction::Retry | LimitAction::RetryOnce => {
                *taken += 1;
                Ok(())
            }
        }
    }
}

impl Default for Governor {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
