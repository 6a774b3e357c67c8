use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;
use tracing::warn;

use crate::retry::{RetryError, RetryPolicy, TRANSIENT_STATUSES};

/// Realistic browser identifiers rotated across requests so naive anti-bot
/// rules don't reject the whole pool at once.
pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Safari/605.1.15",
];

#[must_use]
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Build a pooled blocking client with browser-profile defaults. The client
/// clones cheaply and is safe to share across threads.
#[must_use]
pub fn build_client(timeout: Duration) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .default_headers(headers)
        .build()
        .expect("failed to build reqwest client")
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Only transient statuses qualify for another attempt; timeouts and
    /// connection failures at this layer are terminal once raised.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => TRANSIENT_STATUSES.contains(status),
            Self::Transport { .. } => false,
        }
    }
}

/// GET transport wrapping the shared client with the retry schedule.
/// Responses with non-transient error statuses are handed back to the
/// caller for interpretation (a 404 means different things per endpoint).
#[derive(Debug)]
pub struct Http {
    client: Client,
    policy: RetryPolicy,
}

impl Http {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_policy(timeout, RetryPolicy::default())
    }

    #[must_use]
    pub fn with_policy(timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            client: build_client(timeout),
            policy,
        }
    }

    pub fn get(&self, url: &str, headers: &HeaderMap) -> Result<Response, RetryError> {
        self.policy.run(TransportError::is_transient, |_attempt| {
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, random_user_agent())
                .headers(headers.clone())
                .send()
                .map_err(|source| {
                    warn!(url, error = %source, "GET failed");
                    TransportError::Transport {
                        url: url.to_string(),
                        source,
                    }
                })?;

            let status = response.status().as_u16();
            if TRANSIENT_STATUSES.contains(&status) {
                return Err(TransportError::Status {
                    status,
                    url: url.to_string(),
                });
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn transient_statuses_are_retryable() {
        for status in TRANSIENT_STATUSES {
            let error = TransportError::Status {
                status,
                url: "https://example.com".to_string(),
            };
            assert!(error.is_transient());
        }
        let error = TransportError::Status {
            status: 404,
            url: "https://example.com".to_string(),
        };
        assert!(!error.is_transient());
    }
}
