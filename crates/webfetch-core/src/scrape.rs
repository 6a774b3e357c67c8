use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use webfetch_client::retry::{RetryPolicy, TRANSIENT_STATUSES};
use webfetch_client::transport::{build_client, random_user_agent};

use crate::record::ContentRecord;

pub const MAX_CONTENT_CHARS: usize = 5000;
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated for length...]";

/// Subtrees dropped before text extraction.
const NOISE_TAGS: [&str; 6] = ["script", "style", "nav", "footer", "aside", "header"];

/// Main-content hints, most specific first; whole body as last resort.
static CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["main", "article", ".content", "#content", ".main", "#main"]
        .iter()
        .map(|raw| Selector::parse(raw).expect("content selector"))
        .collect()
});
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector"));
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("body selector"));

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub timeout: Duration,
    pub max_content_chars: usize,
    pub retry: RetryPolicy,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_content_chars: MAX_CONTENT_CHARS,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
enum ScrapeError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
}

impl ScrapeError {
    /// Unlike the API transport, the scraper retries connection and timeout
    /// failures; HTTP errors burn retries only when transient.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => TRANSIENT_STATUSES.contains(status),
        }
    }
}

/// Fetch-and-extract strategy for arbitrary web pages.
#[derive(Debug)]
pub struct Scraper {
    client: Client,
    config: ScrapeConfig,
}

impl Default for Scraper {
    fn default() -> Self {
        Self::new(ScrapeConfig::default())
    }
}

impl Scraper {
    #[must_use]
    pub fn new(config: ScrapeConfig) -> Self {
        Self {
            client: build_client(config.timeout),
            config,
        }
    }

    /// Fetch a page and reduce it to readable text. Never panics and never
    /// returns an error: every failure shape is folded into the record.
    #[instrument(name = "scraper.scrape", skip(self))]
    pub fn scrape(&self, url: &str) -> ContentRecord {
        let url = ensure_scheme(url);
        let outcome = self
            .config
            .retry
            .run(ScrapeError::is_retryable, |attempt| {
                self.attempt_fetch(&url, attempt)
            });
        match outcome {
            Ok(record) => record,
            Err(error) => {
                debug!(%url, attempts = error.attempts, "scrape exhausted");
                ContentRecord::failed(
                    &url,
                    format!(
                        "All request attempts failed. Last error: {}",
                        error.last_error
                    ),
                    "scrape_failed",
                )
                .with_meta("attempts", i64::from(error.attempts))
            }
        }
    }

    fn attempt_fetch(&self, url: &str, attempt: u32) -> Result<ContentRecord, ScrapeError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .map_err(ScrapeError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        if content_type.contains("text/html") || content_type.contains("text/plain") {
            let body = response.text().map_err(ScrapeError::Transport)?;
            Ok(self.extract_page(url, &body, status.as_u16(), attempt))
        } else {
            let bytes = response.bytes().map_err(ScrapeError::Transport)?;
            Ok(ContentRecord::ok(
                url,
                format!("Content from {}", domain_of(url)),
                format!(
                    "Binary content detected (Content-Type: {content_type}). Size: {} bytes",
                    bytes.len()
                ),
                content_type.as_str(),
                format!("scrape_attempt_{attempt}"),
            )
            .with_meta("status_code", i64::from(status.as_u16()))
            .with_meta("content_type", content_type.as_str()))
        }
    }

    /// Reduce an HTML document to title + readable text.
    fn extract_page(&self, url: &str, html: &str, status: u16, attempt: u32) -> ContentRecord {
        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| domain_of(url));

        let region = CONTENT_SELECTORS
            .iter()
            .find_map(|selector| document.select(selector).next())
            .or_else(|| document.select(&BODY_SELECTOR).next())
            .unwrap_or_else(|| document.root_element());

        let mut lines = Vec::new();
        collect_text_lines(region, &mut lines);
        let mut content = lines.join("\n");

        let mut truncated = false;
        if content.len() > self.config.max_content_chars {
            let mut cut = self.config.max_content_chars;
            while !content.is_char_boundary(cut) {
                cut -= 1;
            }
            content.truncate(cut);
            content.push_str(TRUNCATION_MARKER);
            truncated = true;
        }

        let mut record = ContentRecord::ok(
            url,
            title,
            content.as_str(),
            "html",
            format!("scrape_attempt_{attempt}"),
        )
        .with_meta("status_code", i64::from(status))
        .with_meta("content_length", content.len() as i64);
        if truncated {
            record = record.with_meta("truncated", 1_i64);
        }
        record
    }
}

/// Bare hostnames are treated as https.
#[must_use]
pub fn ensure_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Depth-first text collection that skips noise subtrees, one trimmed line
/// per text node, mirroring what a separator-joined extraction produces.
fn collect_text_lines(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if NOISE_TAGS.contains(&child_element.value().name()) {
                continue;
            }
            collect_text_lines(child_element, lines);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
}
