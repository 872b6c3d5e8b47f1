use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use vigil_core::{AnchorMode, ChangedFile, FileStatus, Finding, VigilError};

/// GitHub Pull Request client: lists changed files, resolves the head
/// commit, fetches blob content, and posts review comments.
///
/// Raw REST reads go through `reqwest` against the configured API base;
/// authenticated writes go through `octocrab`.
///
/// # Examples
///
/// ```
/// use vigil_review::github::parse_repo_slug;
///
/// let (owner, repo) = parse_repo_slug("rust-lang/rust").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "rust");
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    api_base: String,
}

#[derive(Deserialize)]
struct RawPrFile {
    filename: String,
    status: FileStatus,
    sha: String,
    patch: Option<String>,
    contents_url: Option<String>,
}

#[derive(Deserialize)]
struct RawCommit {
    sha: String,
}

#[derive(Deserialize)]
struct RawContents {
    content: Option<String>,
    encoding: Option<String>,
}

impl GitHubClient {
    /// Create a client from an explicit token or the `GITHUB_TOKEN`
    /// environment variable. This is the startup credential check: a missing
    /// token fails here, before any network call is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Config`] if no token is available, or
    /// [`VigilError::Github`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vigil_review::github::GitHubClient;
    ///
    /// let client = GitHubClient::new("https://api.github.com", Some("ghp_xxxx")).unwrap();
    /// ```
    pub fn new(api_base: &str, token: Option<&str>) -> Result<Self, VigilError> {
        let token = match token {
            Some(t) => t.to_string(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                VigilError::Config(
                    "GITHUB_TOKEN not set. Set the GITHUB_TOKEN env var or [github].token".into(),
                )
            })?,
        };

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.clone())
            .base_uri(api_base)
            .map_err(|e| VigilError::Github(format!("invalid API base URL: {e}")))?
            .build()
            .map_err(|e| VigilError::Github(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::new();

        Ok(Self {
            octocrab,
            http,
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, VigilError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "vigil")
            .send()
            .await
            .map_err(|e| VigilError::Github(format!("failed to {context}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VigilError::Github(format!(
                "GitHub API error {status} while trying to {context}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| VigilError::Github(format!("failed to parse {context} response: {e}")))
    }

    /// List the files changed by a pull request.
    ///
    /// A single page of up to 100 files is requested; full pagination is an
    /// upstream concern.
    ///
    /// # Errors
    ///
    /// Any non-success status is fatal for the run: no partial listing is
    /// returned.
    pub async fn list_pr_files(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<ChangedFile>, VigilError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/pulls/{pr_number}/files?per_page=100",
            self.api_base
        );
        let raw: Vec<RawPrFile> = self.get_json(&url, "list pull request files").await?;

        Ok(raw
            .into_iter()
            .map(|f| ChangedFile {
                path: f.filename.into(),
                status: f.status,
                sha: f.sha,
                patch: f.patch,
                contents_url: f.contents_url,
                content: None,
            })
            .collect())
    }

    /// Resolve the head commit SHA of a pull request: the last entry of the
    /// commit list. The pipeline resolves this once per run and reuses it
    /// for every comment.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Github`] on API errors or when the PR has no
    /// commits.
    pub async fn head_commit_sha(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<String, VigilError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/pulls/{pr_number}/commits?per_page=100",
            self.api_base
        );
        let commits: Vec<RawCommit> = self.get_json(&url, "list pull request commits").await?;

        commits
            .last()
            .map(|c| c.sha.clone())
            .ok_or_else(|| VigilError::Github("pull request has no commits".into()))
    }

    /// Fetch a changed file's blob via its `contents_url` and decode it from
    /// base64 into text.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Github`] when the file has no contents URL, the
    /// request fails, or the payload cannot be decoded. Callers treat this
    /// as non-fatal and skip the file.
    pub async fn fetch_content(&self, file: &ChangedFile) -> Result<String, VigilError> {
        let url = file.contents_url.as_deref().ok_or_else(|| {
            VigilError::Github(format!("{} has no contents URL", file.path.display()))
        })?;
        let raw: RawContents = self.get_json(url, "fetch file contents").await?;

        match raw.encoding.as_deref() {
            Some("base64") => {}
            other => {
                return Err(VigilError::Github(format!(
                    "unsupported content encoding {other:?} for {}",
                    file.path.display()
                )))
            }
        }
        let encoded = raw.content.ok_or_else(|| {
            VigilError::Github(format!("no content returned for {}", file.path.display()))
        })?;

        decode_blob(&encoded)
    }

    /// Post a single review comment anchored by diff position or absolute
    /// line, depending on `anchor`.
    ///
    /// One call creates one comment; repeated runs over the same PR produce
    /// duplicate comments. Deduplication across runs is out of scope.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Github`] when the API rejects the comment
    /// (e.g. invalid position or stale commit SHA). Callers log the failure
    /// and continue with the rest of the batch.
    pub async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        finding: &Finding,
        commit_id: &str,
        anchor: AnchorMode,
    ) -> Result<(), VigilError> {
        let mut body = serde_json::json!({
            "body": finding.body,
            "path": finding.file_path.to_string_lossy(),
            "commit_id": commit_id,
        });
        match anchor {
            AnchorMode::Position => {
                body["position"] = serde_json::json!(finding.line);
            }
            AnchorMode::Line => {
                body["line"] = serde_json::json!(finding.line);
                body["side"] = serde_json::json!("RIGHT");
            }
        }

        let route = format!("/repos/{owner}/{repo}/pulls/{pr_number}/comments");
        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&body))
            .await
            .map_err(|e| VigilError::Github(format!("failed to post comment: {e}")))?;

        Ok(())
    }

    /// Post all findings as a single review submission.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Github`] on API errors.
    pub async fn post_review(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        findings: &[Finding],
        commit_id: &str,
        anchor: AnchorMode,
        summary: &str,
    ) -> Result<(), VigilError> {
        let comments: Vec<serde_json::Value> = findings
            .iter()
            .map(|f| {
                let mut comment = serde_json::json!({
                    "path": f.file_path.to_string_lossy(),
                    "body": f.body,
                });
                match anchor {
                    AnchorMode::Position => {
                        comment["position"] = serde_json::json!(f.line);
                    }
                    AnchorMode::Line => {
                        comment["line"] = serde_json::json!(f.line);
                        comment["side"] = serde_json::json!("RIGHT");
                    }
                }
                comment
            })
            .collect();

        let route = format!("/repos/{owner}/{repo}/pulls/{pr_number}/reviews");
        let body = serde_json::json!({
            "commit_id": commit_id,
            "event": "COMMENT",
            "body": summary,
            "comments": comments,
        });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&body))
            .await
            .map_err(|e| VigilError::Github(format!("failed to post review: {e}")))?;

        Ok(())
    }
}

fn decode_blob(encoded: &str) -> Result<String, VigilError> {
    // GitHub wraps base64 payloads at 60 columns
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| VigilError::Github(format!("failed to decode base64 content: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| VigilError::Github(format!("file content is not valid UTF-8: {e}")))
}

/// Parse a repository slug (`owner/name`) into its components.
///
/// # Errors
///
/// Returns [`VigilError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use vigil_review::github::parse_repo_slug;
///
/// let (owner, repo) = parse_repo_slug("octocat/hello-world").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// ```
pub fn parse_repo_slug(slug: &str) -> Result<(String, String), VigilError> {
    let Some((owner, repo)) = slug.split_once('/') else {
        return Err(VigilError::Config(format!(
            "invalid repository '{slug}', expected owner/name"
        )));
    };
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(VigilError::Config(format!(
            "invalid repository '{slug}', expected owner/name"
        )));
    }
    Ok((owner.to_string(), repo.to_string()))
}
