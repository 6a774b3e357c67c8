use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_BRANCH: &str = "main";

/// Owner/repository/branch/path tuple extracted from a recognized GitHub
/// URL. Derived per call and discarded; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Empty means the URL addresses the whole repository.
    pub path: String,
}

impl RepoRef {
    #[must_use]
    pub fn repo_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    #[must_use]
    pub fn blob_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.owner, self.repo, self.branch, self.path
        )
    }

    #[must_use]
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }
}

static BLOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([^/]+)/([^/]+)/blob/([^/]+)/(.+)$").expect("blob url regex")
});
static TREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([^/]+)/([^/]+)/tree/([^/]+)/?(.*)$").expect("tree url regex")
});
static ROOT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$").expect("root url regex")
});

/// Recognize GitHub URL shapes, most specific first; the first match wins.
/// Anything else (including malformed input) is simply not classified.
#[must_use]
pub fn classify(url: &str) -> Option<RepoRef> {
    if let Some(captures) = BLOB_RE.captures(url) {
        return Some(RepoRef {
            owner: captures[1].to_string(),
            repo: strip_git_suffix(&captures[2]),
            branch: captures[3].to_string(),
            path: captures[4].to_string(),
        });
    }
    if let Some(captures) = TREE_RE.captures(url) {
        return Some(RepoRef {
            owner: captures[1].to_string(),
            repo: strip_git_suffix(&captures[2]),
            branch: captures[3].to_string(),
            path: captures[4].to_string(),
        });
    }
    if let Some(captures) = ROOT_RE.captures(url) {
        return Some(RepoRef {
            owner: captures[1].to_string(),
            repo: strip_git_suffix(&captures[2]),
            branch: DEFAULT_BRANCH.to_string(),
            path: String::new(),
        });
    }
    None
}

fn strip_git_suffix(repo: &str) -> String {
    repo.trim_end_matches(".git").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_blob_urls_with_branch_and_path() {
        let reference =
            classify("https://github.com/owner/repo/blob/branchX/path/to/file.md").unwrap();
        assert_eq!(reference.owner, "owner");
        assert_eq!(reference.repo, "repo");
        assert_eq!(reference.branch, "branchX");
        assert_eq!(reference.path, "path/to/file.md");
    }

    #[test]
    fn classifies_tree_urls() {
        let reference = classify("https://github.com/owner/repo/tree/dev/src").unwrap();
        assert_eq!(reference.branch, "dev");
        assert_eq!(reference.path, "src");
    }

    #[test]
    fn tree_url_without_path_yields_empty_path() {
        let reference = classify("https://github.com/owner/repo/tree/dev").unwrap();
        assert_eq!(reference.branch, "dev");
        assert!(!reference.has_path());
    }

    #[test]
    fn classifies_repo_root_with_branch_defaulted() {
        let reference = classify("https://github.com/owner/repo").unwrap();
        assert_eq!(reference.owner, "owner");
        assert_eq!(reference.repo, "repo");
        assert_eq!(reference.branch, DEFAULT_BRANCH);
        assert!(!reference.has_path());
    }

    #[test]
    fn strips_git_suffix_and_trailing_slash() {
        assert_eq!(
            classify("https://github.com/owner/repo.git").unwrap().repo,
            "repo"
        );
        assert_eq!(
            classify("https://github.com/owner/repo/").unwrap().repo,
            "repo"
        );
    }

    #[test]
    fn leaves_other_urls_unclassified() {
        assert!(classify("https://example.com/owner/repo").is_none());
        assert!(classify("https://github.com/just-an-owner").is_none());
        assert!(classify("not even a url").is_none());
    }

    #[test]
    fn blob_urls_construct_blob_links() {
        let reference = classify("https://github.com/o/r/blob/main/src/lib.rs").unwrap();
        assert_eq!(
            reference.blob_url(),
            "https://github.com/o/r/blob/main/src/lib.rs"
        );
        assert_eq!(reference.repo_url(), "https://github.com/o/r");
    }
}
