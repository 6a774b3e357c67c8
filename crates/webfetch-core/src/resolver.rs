use std::sync::Arc;

use tracing::{debug, instrument, warn};

use webfetch_client::github::types::Repository;
use webfetch_client::github::{GithubClient, GithubError};

use crate::github_url::RepoRef;
use crate::record::ContentRecord;

pub const METHOD_GITHUB_API: &str = "github_api";

/// Conventional default-document filenames, tried in priority order when a
/// URL addresses a whole repository.
pub const README_CANDIDATES: [&str; 5] =
    ["README.md", "readme.md", "README.txt", "readme.txt", "README"];

/// Platform-API retrieval: confirm the repository exists, then either walk
/// the default-document ladder or fetch the explicitly requested path.
#[derive(Debug)]
pub struct RepositoryResolver {
    client: Arc<GithubClient>,
}

impl RepositoryResolver {
    #[must_use]
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }

    /// Every outcome, success or failure, is encoded in the returned record;
    /// nothing escapes as an error.
    #[instrument(name = "resolver.resolve", skip(self))]
    pub fn resolve(&self, reference: &RepoRef) -> ContentRecord {
        let repo = match self.client.get_repository(&reference.owner, &reference.repo) {
            Ok(repo) => repo,
            Err(GithubError::NotFound) => {
                return ContentRecord::failed(
                    reference.repo_url(),
                    format!(
                        "Repository {}/{} not found or is private",
                        reference.owner, reference.repo
                    ),
                    METHOD_GITHUB_API,
                );
            }
            Err(error) => {
                return ContentRecord::failed(
                    reference.repo_url(),
                    format!("GitHub API error: {error}"),
                    METHOD_GITHUB_API,
                );
            }
        };

        if reference.has_path() {
            self.resolve_file(reference, &repo)
        } else {
            self.resolve_readme(reference, &repo)
        }
    }

    fn resolve_readme(&self, reference: &RepoRef, repo: &Repository) -> ContentRecord {
        for candidate in README_CANDIDATES {
            let entry =
                match self
                    .client
                    .get_contents(&reference.owner, &reference.repo, candidate)
                {
                    Ok(entry) => entry,
                    Err(GithubError::NotFound) => {
                        debug!(candidate, "default document candidate missing");
                        continue;
                    }
                    Err(error) => {
                        warn!(candidate, %error, "default document fetch failed");
                        continue;
                    }
                };

            match entry.decoded_text() {
                Ok(text) => {
                    let description = repo.description.as_deref().unwrap_or_default();
                    return self
                        .repo_record(
                            reference,
                            repo,
                            format!("# {}\n\n{description}\n\n{text}", repo.name),
                        )
                        .with_meta("readme_file", candidate);
                }
                Err(error) => {
                    warn!(candidate, %error, "default document decode failed");
                    continue;
                }
            }
        }

        // Repository confirmed to exist; its description alone still counts.
        let description = repo
            .description
            .as_deref()
            .unwrap_or("No description available.");
        self.repo_record(
            reference,
            repo,
            format!(
                "# {}\n\n{description}\n\nRepository found but no README file detected.",
                repo.name
            ),
        )
    }

    fn resolve_file(&self, reference: &RepoRef, repo: &Repository) -> ContentRecord {
        let entry = match self
            .client
            .get_contents(&reference.owner, &reference.repo, &reference.path)
        {
            Ok(entry) => entry,
            Err(error) => {
                return ContentRecord::failed(
                    reference.blob_url(),
                    format!("GitHub API error: {error}"),
                    METHOD_GITHUB_API,
                );
            }
        };

        match entry.decoded_text() {
            Ok(text) => ContentRecord::ok(
                reference.blob_url(),
                format!("{} - {}", reference.path, repo.name),
                text,
                "file",
                METHOD_GITHUB_API,
            )
            .with_meta("file_path", reference.path.as_str())
            .with_meta("repo", repo.name.as_str()),
            Err(error) => ContentRecord::failed(
                reference.blob_url(),
                format!("GitHub API error: {error}"),
                METHOD_GITHUB_API,
            ),
        }
    }

    fn repo_record(&self, reference: &RepoRef, repo: &Repository, content: String) -> ContentRecord {
        let title = format!(
            "{} - {}",
            repo.name,
            repo.description.as_deref().unwrap_or("GitHub Repository")
        );
        let mut record = ContentRecord::ok(
            reference.repo_url(),
            title,
            content,
            "markdown",
            METHOD_GITHUB_API,
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
}
