use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use webfetch_client::retry::RetryPolicy;
use webfetch_client::transport::Http;

use super::{SearchError, SearchHit, SearchProvider};

pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.result").expect("result selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("result link selector"));
static SNIPPET_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__snippet").expect("result snippet selector"));

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Web search against DuckDuckGo's HTML interface. No API key required.
pub struct DuckDuckGoProvider {
    http: Http,
    config: SearchConfig,
}

impl Default for DuckDuckGoProvider {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl DuckDuckGoProvider {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            http: Http::with_policy(config.timeout, config.retry.clone()),
            config,
        }
    }
}

impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    #[instrument(name = "duckduckgo.search", skip(self))]
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}?q={}", self.config.endpoint, urlencoding::encode(query));
        let response = self
            .http
            .get(&url, &HeaderMap::new())
            .map_err(|error| SearchError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .map_err(|error| SearchError::Transport(error.to_string()))?;
        let hits = parse_results(&html, max_results);
        debug!(hits = hits.len(), "search done");
        Ok(hits)
    }
}

/// Pull title/url/snippet triples out of the result markup.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let mut hits = Vec::new();

    for result in document.select(&RESULT_SELECTOR) {
        if hits.len() >= max_results {
            break;
        }
        let Some(link) = result.select(&LINK_SELECTOR).next() else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(resolve_result_url)
        else {
            continue;
        };
        if title.is_empty() {
            continue;
        }
        let snippet = result
            .select(&SNIPPET_SELECTOR)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            url,
            snippet,
        });
    }

    hits
}

/// Result anchors point at a redirect carrying the destination in the
/// `uddg` query parameter; direct links pass through untouched.
fn resolve_result_url(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    if let Some((_, destination)) = parsed.query_pairs().find(|(key, _)| key == "uddg") {
        return Some(destination.into_owned());
    }
    if absolute.starts_with("http://") || absolute.starts_with("https://") {
        return Some(absolute);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
          <div class="result results_links">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fdocs&rut=abc">Example Docs</a>
            <a class="result__snippet">Documentation for <b>example</b> things.</a>
          </div>
          <div class="result results_links">
            <a class="result__a" href="https://direct.example.org/page">Direct Result</a>
            <a class="result__snippet">A directly linked page.</a>
          </div>
          <div class="result">
            <span>malformed block without link</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_titles_urls_and_snippets() {
        let hits = parse_results(FIXTURE, 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Example Docs");
        assert_eq!(hits[0].url, "https://example.com/docs");
        assert_eq!(hits[0].snippet, "Documentation for example things.");
        assert_eq!(hits[1].url, "https://direct.example.org/page");
    }

    #[test]
    fn respects_max_results() {
        let hits = parse_results(FIXTURE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_page_yields_no_hits() {
        assert!(parse_results("", 10).is_empty());
        assert!(parse_results("<html><body></body></html>", 10).is_empty());
    }

    #[test]
    fn resolves_redirect_urls() {
        assert_eq!(
            resolve_result_url("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=x"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            resolve_result_url("/l/?uddg=https%3A%2F%2Fexample.com%2Fa%20b"),
            Some("https://example.com/a b".to_string())
        );
        assert_eq!(
            resolve_result_url("https://example.com/direct"),
            Some("https://example.com/direct".to_string())
        );
        assert_eq!(resolve_result_url("javascript:void(0)"), None);
    }
}
