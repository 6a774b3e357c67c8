pub mod types;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::retry::{RetryError, RetryPolicy};
use crate::transport::Http;

use self::types::{ContentsEntry, Repository, RepositorySearchPage};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const SEARCH_PAGE_CAP: usize = 10;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("not found")]
    NotFound,
    #[error("unexpected status code: {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] RetryError),
    #[error("failed to decode content: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    /// Bearer token raising the API rate limit; its absence is not an error.
    pub token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: std::env::var(TOKEN_ENV).ok(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub struct GithubClient {
    http: Http,
    config: ClientConfig,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let http = Http::with_policy(config.timeout, config.retry.clone());
        Self { http, config }
    }

    #[instrument(name = "github_client.get_repository", skip(self))]
    pub fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, GithubError> {
        let url = format!("{}/repos/{owner}/{repo}", self.config.api_base);
        self.get_json(&url)
    }

    #[instrument(name = "github_client.get_contents", skip(self))]
    pub fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<ContentsEntry, GithubError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/contents/{path}",
            self.config.api_base
        );
        self.get_json(&url)
    }

    /// Repository search ordered by stars, page size capped the way the
    /// upstream endpoint expects.
    #[instrument(name = "github_client.search_repositories", skip(self))]
    pub fn search_repositories(
        &self,
        query: &str,
        per_page: usize,
    ) -> Result<Vec<Repository>, GithubError> {
        let url = format!(
            "{}/search/repositories?q={}&sort=stars&order=desc&per_page={}",
            self.config.api_base,
            urlencoding::encode(query),
            per_page.clamp(1, SEARCH_PAGE_CAP)
        );
        let page: RepositorySearchPage = self.get_json(&url)?;
        debug!(total = page.total_count, returned = page.items.len(), "repository search done");
        Ok(page.items)
    }

    fn get_json<T>(&self, url: &str) -> Result<T, GithubError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.http.get(url, &self.api_headers())?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GithubError::NotFound);
        }
        if !status.is_success() {
            warn!(%status, url, "GitHub API request failed");
            return Err(GithubError::Status(status));
        }
        response
            .json::<T>()
            .map_err(|error| GithubError::Decode(error.to_string()))
    }

    fn api_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = self.config.token.as_deref() {
            match HeaderValue::try_from(format!("token {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(error) => warn!(%error, "ignoring malformed GitHub token"),
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_public_api() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn token_header_is_attached_when_configured() {
        let client = GithubClient::with_config(ClientConfig {
            token: Some("abc123".to_string()),
            ..ClientConfig::default()
        });
        let headers = client.api_headers();
        assert_eq!(
            headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("token abc123")
        );
    }

    #[test]
    fn token_header_is_absent_without_token() {
        let client = GithubClient::with_config(ClientConfig {
            token: None,
            ..ClientConfig::default()
        });
        assert!(client.api_headers().get(AUTHORIZATION).is_none());
    }
}
