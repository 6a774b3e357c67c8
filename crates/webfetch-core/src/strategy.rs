use std::sync::Arc;

use tracing::{debug, info, instrument};

use webfetch_client::github::{ClientConfig, GithubClient};

use crate::github_url::{classify, RepoRef};
use crate::record::ContentRecord;
use crate::resolver::RepositoryResolver;
use crate::scrape::{ensure_scheme, ScrapeConfig, Scraper};
use crate::search::{
    has_repository_intent, repository_record, ComprehensiveResults, DuckDuckGoProvider,
    SearchConfig, SearchProvider,
};

/// A normalized URL plus whatever classification succeeded on it.
#[derive(Debug, Clone)]
pub struct FetchTarget {
    pub url: String,
    pub repo_ref: Option<RepoRef>,
}

/// Outcome of offering a target to one strategy.
#[derive(Debug)]
pub enum Attempt {
    /// The strategy owned the target and produced a record (which may still
    /// describe a failure).
    Handled(ContentRecord),
    /// The strategy does not apply to this target.
    Declined,
}

/// One retrieval capability in the ordered fallback chain.
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, target: &FetchTarget) -> Attempt;
}

impl FetchStrategy for RepositoryResolver {
    fn name(&self) -> &'static str {
        "repository_resolver"
    }

    fn attempt(&self, target: &FetchTarget) -> Attempt {
        match &target.repo_ref {
            Some(reference) => Attempt::Handled(self.resolve(reference)),
            None => Attempt::Declined,
        }
    }
}

impl FetchStrategy for Scraper {
    fn name(&self) -> &'static str {
        "scraper"
    }

    fn attempt(&self, target: &FetchTarget) -> Attempt {
        Attempt::Handled(self.scrape(&target.url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetcherConfig {
    pub github: ClientConfig,
    pub scrape: ScrapeConfig,
    pub search: SearchConfig,
}

/// Single entry point: classifies, walks the strategy chain, and composes
/// search results from many such fetches.
pub struct Fetcher {
    strategies: Vec<Box<dyn FetchStrategy>>,
    github: Arc<GithubClient>,
    provider: Box<dyn SearchProvider>,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FetcherConfig::default())
    }

    #[must_use]
    pub fn with_config(config: FetcherConfig) -> Self {
        let github = Arc::new(GithubClient::with_config(config.github));
        let strategies: Vec<Box<dyn FetchStrategy>> = vec![
            Box::new(RepositoryResolver::new(Arc::clone(&github))),
            Box::new(Scraper::new(config.scrape)),
        ];
        Self {
            strategies,
            github,
            provider: Box::new(DuckDuckGoProvider::new(config.search)),
        }
    }

    /// Explicit token wins over the environment; `None` keeps the
    /// environment default.
    #[must_use]
    pub fn with_token(token: Option<String>) -> Self {
        let mut config = FetcherConfig::default();
        config.github.token = token.or(config.github.token);
        Self::with_config(config)
    }

    /// Swap the search provider (used to inject fakes in tests).
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn SearchProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Fetch content from any URL. Strategies are tried in order; the first
    /// success wins, a handling strategy's failure falls through silently,
    /// and if every handling strategy fails the first failure is returned
    /// (the platform record names the missing repository, which is the more
    /// useful message).
    #[instrument(name = "fetcher.fetch_url", skip(self))]
    pub fn fetch_url(&self, url: &str) -> ContentRecord {
        let url = ensure_scheme(url);
        let target = FetchTarget {
            repo_ref: classify(&url),
            url,
        };

        let mut first_failure = None;
        for strategy in &self.strategies {
            match strategy.attempt(&target) {
                Attempt::Declined => continue,
                Attempt::Handled(record) if record.success => {
                    info!(strategy = strategy.name(), url = %target.url, "fetch succeeded");
                    return record;
                }
                Attempt::Handled(record) => {
                    debug!(
                        strategy = strategy.name(),
                        error = %record.error_message,
                        "strategy failed, falling through"
                    );
                    if first_failure.is_none() {
                        first_failure = Some(record);
                    }
                }
            }
        }

        first_failure.unwrap_or_else(|| {
            ContentRecord::failed(
                &target.url,
                "no retrieval strategy handled the request",
                "none",
            )
        })
    }

    /// Web search with per-result content fetching. Every hit yields exactly
    /// one record: the fetched page when retrieval works (retitled with the
    /// provider's hit title), otherwise the provider's snippet.
    #[instrument(name = "fetcher.web_search", skip(self))]
    pub fn web_search(&self, query: &str, max_results: usize) -> Vec<ContentRecord> {
        let hits = match self.provider.search(query, max_results) {
            Ok(hits) => hits,
            Err(error) => {
                return vec![ContentRecord::failed(
                    "",
                    format!("Web search failed: {error}"),
                    "search_error",
                )];
            }
        };

        hits.into_iter()
            .map(|hit| {
                let mut record = self.fetch_url(&hit.url);
                if record.success {
                    record.title = hit.title;
                    record
                } else {
                    debug!(url = %hit.url, "fetch failed, using search snippet");
                    ContentRecord::ok(
                        hit.url,
                        hit.title,
                        hit.snippet,
                        "search_snippet",
                        format!("{}_search", self.provider.name()),
                    )
                    .with_meta("search_query", query)
                }
            })
            .collect()
    }

    /// Repository search: title, description, and popularity metadata only.
    #[instrument(name = "fetcher.search_repositories", skip(self))]
    pub fn search_repositories(&self, query: &str, max_results: usize) -> Vec<ContentRecord> {
        match self.github.search_repositories(query, max_results) {
            Ok(repos) => repos.iter().map(repository_record).collect(),
            Err(error) => vec![ContentRecord::failed(
                "",
                format!("GitHub search failed: {error}"),
                "github_search_error",
            )],
        }
    }

    /// Aggregate search across the web and, when the query suggests it, the
    /// repository index. Individual failures land in the errors bucket; the
    /// batch always completes.
    #[instrument(name = "fetcher.comprehensive_search", skip(self))]
    pub fn comprehensive_search(
        &self,
        query: &str,
        include_github: bool,
        max_results: usize,
    ) -> ComprehensiveResults {
        let mut results = ComprehensiveResults::default();

        for record in self.web_search(query, max_results) {
            if record.success {
                results.web.push(record);
            } else {
                results.errors.push(record);
            }
        }

        if include_github && has_repository_intent(query) {
            for record in self.search_repositories(query, max_results) {
                if record.success {
                    results.repositories.push(record);
                } else {
                    results.errors.push(record);
                }
            }
        }

        info!(
            web = results.web.len(),
            repositories = results.repositories.len(),
            errors = results.errors.len(),
            "search completed"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStrategy {
        name: &'static str,
        record: Option<ContentRecord>,
    }

    impl FetchStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn attempt(&self, _target: &FetchTarget) -> Attempt {
            match &self.record {
                Some(record) => Attempt::Handled(record.clone()),
                None => Attempt::Declined,
            }
        }
    }

    fn chain(strategies: Vec<Box<dyn FetchStrategy>>) -> Fetcher {
        let mut fetcher = Fetcher::new();
        fetcher.strategies = strategies;
        fetcher
    }

    #[test]
    fn first_successful_strategy_wins() {
        let fetcher = chain(vec![
            Box::new(FixedStrategy {
                name: "declines",
                record: None,
            }),
            Box::new(FixedStrategy {
                name: "wins",
                record: Some(ContentRecord::ok("u", "t", "c", "html", "wins")),
            }),
            Box::new(FixedStrategy {
                name: "unreached",
                record: Some(ContentRecord::ok("u", "t", "other", "html", "unreached")),
            }),
        ]);
        let record = fetcher.fetch_url("https://example.com");
        assert!(record.success);
        assert_eq!(record.source_method, "wins");
    }

    #[test]
    fn failing_strategy_falls_through_silently() {
        let fetcher = chain(vec![
            Box::new(FixedStrategy {
                name: "fails",
                record: Some(ContentRecord::failed("u", "specific failure", "first")),
            }),
            Box::new(FixedStrategy {
                name: "recovers",
                record: Some(ContentRecord::ok("u", "t", "c", "html", "second")),
            }),
        ]);
        let record = fetcher.fetch_url("https://example.com");
        assert!(record.success);
        assert_eq!(record.source_method, "second");
    }

    #[test]
    fn first_failure_is_returned_when_every_strategy_fails() {
        let fetcher = chain(vec![
            Box::new(FixedStrategy {
                name: "first",
                record: Some(ContentRecord::failed("u", "repository missing", "first")),
            }),
            Box::new(FixedStrategy {
                name: "second",
                record: Some(ContentRecord::failed("u", "scrape exhausted", "second")),
            }),
        ]);
        let record = fetcher.fetch_url("https://example.com");
        assert!(!record.success);
        assert_eq!(record.error_message, "repository missing");
    }

    #[test]
    fn github_urls_are_classified_before_the_chain_runs() {
        let fetcher = Fetcher::new();
        let url = ensure_scheme("github.com/owner/repo");
        let target = FetchTarget {
            repo_ref: classify(&url),
            url,
        };
        assert!(target.repo_ref.is_some());
        assert!(fetcher.strategies.len() >= 2);
        assert_eq!(fetcher.strategies[0].name(), "repository_resolver");
        assert_eq!(fetcher.strategies[1].name(), "scraper");
    }
}
