mod duckduckgo;

pub use duckduckgo::{DuckDuckGoProvider, SearchConfig};

use thiserror::Error;

use webfetch_client::github::types::Repository;

use crate::record::ContentRecord;

pub const METHOD_GITHUB_SEARCH: &str = "github_search";

/// Query terms suggesting the caller also wants repository results.
pub const REPO_INTENT_KEYWORDS: [&str; 4] = ["github", "repository", "repo", "code"];

/// One hit from a search provider: title, landing URL, provider snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("search provider returned status {0}")]
    Status(u16),
}

/// Text-search seam; the aggregator is written against this so providers
/// can be swapped (or faked in tests) without touching the batch logic.
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// The three buckets every aggregate search returns. Per-item failures land
/// in `errors`; the batch itself never aborts.
#[derive(Debug, Default)]
pub struct ComprehensiveResults {
    pub web: Vec<ContentRecord>,
    pub repositories: Vec<ContentRecord>,
    pub errors: Vec<ContentRecord>,
}

#[must_use]
pub fn has_repository_intent(query: &str) -> bool {
    let query = query.to_lowercase();
    REPO_INTENT_KEYWORDS
        .iter()
        .any(|keyword| query.contains(keyword))
}

/// Render a repository-search hit as a record: description and popularity
/// only, no content fetch.
pub(crate) fn repository_record(repo: &Repository) -> ContentRecord {
    let description = repo
        .description
        .as_deref()
        .unwrap_or("No description available.");
    let content = format!(
        "# {}\n\n{description}\n\nStars: {} | Forks: {} | Language: {}",
        repo.name,
        repo.stargazers_count,
        repo.forks_count,
        repo.language.as_deref().unwrap_or("Not specified")
    );
    let mut record = ContentRecord::ok(
        repo.html_url.as_str(),
        format!(
            "{} - {}",
            repo.full_name,
            repo.description.as_deref().unwrap_or_default()
        ),
        content,
        "repository_info",
        METHOD_GITHUB_SEARCH,
    )
    .with_meta("stars", repo.stargazers_count)
    .with_meta("forks", repo.forks_count);
    if let Some(language) = repo.language.as_deref() {
        record = record.with_meta("language", language);
    }
    if let Some(updated_at) = repo.updated_at {
        record = record.with_meta("updated_at", updated_at);
    }
    record
}
