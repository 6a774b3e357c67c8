use crate::record::ContentRecord;
use crate::search::ComprehensiveResults;

/// Human-readable rendering of a single fetch result.
#[must_use]
pub fn render_fetch(record: &ContentRecord) -> String {
    if record.success {
        format!(
            "{}\n\n{}\nSource: {} (via {})",
            record.title, record.content, record.url, record.source_method
        )
    } else {
        format!(
            "Failed to fetch content from {}: {}",
            record.url, record.error_message
        )
    }
}

/// Human-readable rendering of an aggregate search: web results first, then
/// repository results, blank-line separated.
#[must_use]
pub fn render_search(results: &ComprehensiveResults) -> String {
    let mut sections = Vec::new();
    for record in &results.web {
        sections.push(format!(
            "{}\n{}\nSource: {}",
            record.title, record.content, record.url
        ));
    }
    for record in &results.repositories {
        sections.push(format!(
            "[GitHub Repository] {}\n{}\nSource: {}",
            record.title, record.content, record.url
        ));
    }

    if sections.is_empty() {
        if results.errors.is_empty() {
            return "No results found.".to_string();
        }
        let joined = results
            .errors
            .iter()
            .map(|record| record.error_message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return format!("Search failed: {joined}");
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_successful_fetch() {
        let record = ContentRecord::ok(
            "https://example.com",
            "Example",
            "Body text.",
            "html",
            "scrape_attempt_1",
        );
        assert_eq!(
            render_fetch(&record),
            "Example\n\nBody text.\nSource: https://example.com (via scrape_attempt_1)"
        );
    }

    #[test]
    fn renders_failed_fetch() {
        let record = ContentRecord::failed("https://example.com", "timed out", "scrape_failed");
        assert_eq!(
            render_fetch(&record),
            "Failed to fetch content from https://example.com: timed out"
        );
    }

    #[test]
    fn renders_web_and_repository_buckets() {
        let results = ComprehensiveResults {
            web: vec![ContentRecord::ok("u1", "Web Hit", "web text", "html", "m")],
            repositories: vec![ContentRecord::ok(
                "u2",
                "octo/demo - A demo",
                "repo text",
                "repository_info",
                "github_search",
            )],
            errors: vec![],
        };
        let rendered = render_search(&results);
        assert_eq!(
            rendered,
            "Web Hit\nweb text\nSource: u1\n\n\
             [GitHub Repository] octo/demo - A demo\nrepo text\nSource: u2"
        );
    }

    #[test]
    fn renders_error_summary_when_all_buckets_empty() {
        let results = ComprehensiveResults {
            web: vec![],
            repositories: vec![],
            errors: vec![
                ContentRecord::failed("", "provider down", "search_error"),
                ContentRecord::failed("", "api down", "github_search_error"),
            ],
        };
        assert_eq!(
            render_search(&results),
            "Search failed: provider down; api down"
        );
    }

    #[test]
    fn renders_no_results_message() {
        let results = ComprehensiveResults::default();
        assert_eq!(render_search(&results), "No results found.");
    }
}
