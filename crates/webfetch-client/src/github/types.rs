use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::GithubError;

/// Repository metadata as returned by `/repos/{owner}/{repo}` and by the
/// repository-search endpoint. Fields the API may omit are defaulted so one
/// model covers both payload shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// One entry from `/repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentsEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ContentsEntry {
    /// Decode the base64 payload into UTF-8 text. The API wraps the payload
    /// in newlines, which the base64 alphabet does not admit.
    pub fn decoded_text(&self) -> Result<String, GithubError> {
        let Some(content) = self.content.as_deref() else {
            return Err(GithubError::Decode(format!(
                "contents entry {} carries no inline content",
                self.path
            )));
        };
        match self.encoding.as_deref() {
            Some("base64") => {
                let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = STANDARD
                    .decode(compact.as_bytes())
                    .map_err(|error| GithubError::Decode(error.to_string()))?;
                String::from_utf8(bytes).map_err(|error| GithubError::Decode(error.to_string()))
            }
            Some(other) => Err(GithubError::Decode(format!(
                "unsupported contents encoding \"{other}\""
            ))),
            None => Err(GithubError::Decode(
                "contents entry carries no encoding".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositorySearchPage {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub items: Vec<Repository>,
}
