use std::fmt;
use std::path::Path;

use serde::Serialize;

use vigil_core::{FileStatus, Finding, ReviewConfig, Strategy, VigilError};

use crate::analyze::Analyzer;
use crate::github::GitHubClient;

const REVIEW_SUMMARY: &str = "Automated review by Vigil.";

/// Result of a completed review run.
///
/// # Examples
///
/// ```
/// use vigil_core::Strategy;
/// use vigil_review::pipeline::RunReport;
///
/// let report = RunReport::new(Strategy::Heuristic);
/// assert_eq!(report.files_listed, 0);
/// assert!(report.findings.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Strategy used for the run.
    pub strategy: Strategy,
    /// Number of files the PR listing returned.
    pub files_listed: usize,
    /// Files skipped: removed, outside the allowlist, or unfetchable.
    pub files_skipped: usize,
    /// Files that reached the analyzer.
    pub files_analyzed: usize,
    /// Every finding produced during the run.
    pub findings: Vec<Finding>,
    /// Comments accepted by GitHub.
    pub comments_posted: usize,
    /// Comments rejected by GitHub.
    pub publish_failures: usize,
}

impl RunReport {
    /// Create an empty report for `strategy`.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            files_listed: 0,
            files_skipped: 0,
            files_analyzed: 0,
            findings: Vec::new(),
            comments_posted: 0,
            publish_failures: 0,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Review Report")?;
        writeln!(f, "=============")?;
        writeln!(
            f,
            "Strategy: {} | Files: {} listed, {} analyzed, {} skipped",
            self.strategy, self.files_listed, self.files_analyzed, self.files_skipped,
        )?;
        writeln!(
            f,
            "Findings: {} | Posted: {} (failed: {})\n",
            self.findings.len(),
            self.comments_posted,
            self.publish_failures,
        )?;

        if self.findings.is_empty() {
            writeln!(f, "No findings.")?;
        } else {
            for finding in &self.findings {
                writeln!(
                    f,
                    "{}:{}  {}",
                    finding.file_path.display(),
                    finding.line,
                    finding.body,
                )?;
            }
        }
        Ok(())
    }
}

impl RunReport {
    /// Render the report as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::Strategy;
    /// use vigil_review::pipeline::RunReport;
    ///
    /// let md = RunReport::new(Strategy::Heuristic).to_markdown();
    /// assert!(md.contains("# Review Report"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Review Report\n\n");
        out.push_str(&format!(
            "**Strategy:** {} | **Files:** {} listed, {} analyzed, {} skipped | \
             **Findings:** {} | **Posted:** {} (failed: {})\n\n",
            self.strategy,
            self.files_listed,
            self.files_analyzed,
            self.files_skipped,
            self.findings.len(),
            self.comments_posted,
            self.publish_failures,
        ));
        if self.findings.is_empty() {
            out.push_str("No findings.\n");
        } else {
            for finding in &self.findings {
                out.push_str(&format!(
                    "- `{}:{}` — {}\n",
                    finding.file_path.display(),
                    finding.line,
                    finding.body,
                ));
            }
        }
        out
    }
}

/// Review orchestrator: lists the PR's changed files, resolves the head
/// commit once, then analyzes and publishes strictly one file at a time.
pub struct Pipeline {
    github: GitHubClient,
    analyzer: Analyzer,
    review: ReviewConfig,
    dry_run: bool,
}

impl Pipeline {
    /// Create a new pipeline from a GitHub client, an analyzer, and the
    /// review configuration.
    pub fn new(github: GitHubClient, analyzer: Analyzer, review: ReviewConfig) -> Self {
        Self {
            github,
            analyzer,
            review,
            dry_run: false,
        }
    }

    /// Collect findings but skip publishing.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Run a full review pass over one pull request.
    ///
    /// The head commit SHA is resolved once, before the first file is
    /// processed, and reused for every comment in the run. Per-file fetch
    /// failures and rejected comments are logged and do not abort the rest
    /// of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Github`] when the file listing or commit
    /// resolution fails; both are fatal for the run.
    pub async fn run(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<RunReport, VigilError> {
        let files = self.github.list_pr_files(owner, repo, pr_number).await?;
        let commit_id = self.github.head_commit_sha(owner, repo, pr_number).await?;

        let mut report = RunReport::new(self.analyzer.strategy());
        report.files_listed = files.len();

        let mut all_findings: Vec<Finding> = Vec::new();

        for mut file in files {
            if file.status == FileStatus::Removed {
                report.files_skipped += 1;
                continue;
            }
            if !extension_allowed(&file.path, &self.review.extensions) {
                report.files_skipped += 1;
                continue;
            }

            if self.review.fetch_contents {
                match self.github.fetch_content(&file).await {
                    Ok(text) => file.content = Some(text),
                    Err(e) => {
                        eprintln!("warning: skipping {}: {e}", file.path.display());
                        report.files_skipped += 1;
                        continue;
                    }
                }
            }
            let Some(text) = file.content.as_deref().or(file.patch.as_deref()) else {
                report.files_skipped += 1;
                continue;
            };

            let findings = self.analyzer.analyze(&file.path, text).await;
            report.files_analyzed += 1;

            if !self.dry_run && !self.review.batch {
                for finding in &findings {
                    match self
                        .github
                        .post_comment(
                            owner,
                            repo,
                            pr_number,
                            finding,
                            &commit_id,
                            self.review.anchor,
                        )
                        .await
                    {
                        Ok(()) => report.comments_posted += 1,
                        Err(e) => {
                            eprintln!(
                                "warning: comment on {}:{} rejected: {e}",
                                finding.file_path.display(),
                                finding.line,
                            );
                            report.publish_failures += 1;
                        }
                    }
                }
            }

            all_findings.extend(findings);
        }

        if !self.dry_run && self.review.batch && !all_findings.is_empty() {
            match self
                .github
                .post_review(
                    owner,
                    repo,
                    pr_number,
                    &all_findings,
                    &commit_id,
                    self.review.anchor,
                    REVIEW_SUMMARY,
                )
                .await
            {
                Ok(()) => report.comments_posted += all_findings.len(),
                Err(e) => {
                    eprintln!("warning: review submission rejected: {e}");
                    report.publish_failures += all_findings.len();
                }
            }
        }

        report.findings = all_findings;
        Ok(report)
    }
}

fn extension_allowed(path: &Path, allowlist: &[String]) -> bool {
    if allowlist.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| allowlist.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}
