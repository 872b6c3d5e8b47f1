use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a file within a pull request, as reported by GitHub.
///
/// GitHub also reports statuses like `renamed` and `copied`; anything we do
/// not special-case lands in [`FileStatus::Other`].
///
/// # Examples
///
/// ```
/// use vigil_core::FileStatus;
///
/// let s: FileStatus = serde_json::from_str("\"modified\"").unwrap();
/// assert_eq!(s, FileStatus::Modified);
///
/// let s: FileStatus = serde_json::from_str("\"renamed\"").unwrap();
/// assert_eq!(s, FileStatus::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// File was added by the pull request.
    Added,
    /// File was modified in place.
    Modified,
    /// File was removed.
    Removed,
    /// Any other status GitHub may report.
    #[serde(other)]
    Other,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Other => write!(f, "other"),
        }
    }
}

/// A file changed by a pull request.
///
/// Populated once at fetch time and read-only afterward. `content` is only
/// filled in when the run is configured to fetch full blobs.
///
/// # Examples
///
/// ```
/// use vigil_core::{ChangedFile, FileStatus};
/// use std::path::PathBuf;
///
/// let file = ChangedFile {
///     path: PathBuf::from("src/app.py"),
///     status: FileStatus::Modified,
///     sha: "3b18e5".into(),
///     patch: Some("+print('hi')".into()),
///     contents_url: None,
///     content: None,
/// };
/// assert_eq!(file.status, FileStatus::Modified);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path of the file within the repository.
    pub path: PathBuf,
    /// Change status reported by GitHub.
    pub status: FileStatus,
    /// Blob SHA for this version of the file.
    pub sha: String,
    /// Unified diff for this file, when GitHub includes one.
    pub patch: Option<String>,
    /// API URL for fetching the file's blob content.
    pub contents_url: Option<String>,
    /// Decoded file content, when fetched.
    pub content: Option<String>,
}

/// A single review finding produced by an analyzer.
///
/// Consumed immediately by the publisher; never persisted.
///
/// # Examples
///
/// ```
/// use vigil_core::Finding;
/// use std::path::PathBuf;
///
/// let finding = Finding {
///     file_path: PathBuf::from("app.py"),
///     line: 5,
///     body: "Consider adding a docstring.".into(),
/// };
/// assert_eq!(finding.line, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Path to the file being commented on.
    pub file_path: PathBuf,
    /// Anchor within the file: a 1-based line number, or a diff-relative
    /// position depending on the configured [`AnchorMode`].
    pub line: u32,
    /// Comment body to post.
    pub body: String,
}

/// GitHub comment anchoring convention.
///
/// GitHub's review comment API accepts either a diff-relative `position` or
/// an absolute `line` paired with a `side`. The two are mutually exclusive,
/// so the choice is a configuration knob rather than a guessed default.
///
/// # Examples
///
/// ```
/// use vigil_core::AnchorMode;
///
/// let mode: AnchorMode = "position".parse().unwrap();
/// assert_eq!(mode, AnchorMode::Position);
/// assert_eq!(AnchorMode::default(), AnchorMode::Line);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// Absolute file line paired with `side: "RIGHT"`.
    #[default]
    Line,
    /// Offset within the diff hunk.
    Position,
}

impl fmt::Display for AnchorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorMode::Line => write!(f, "line"),
            AnchorMode::Position => write!(f, "position"),
        }
    }
}

impl FromStr for AnchorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(AnchorMode::Line),
            "position" => Ok(AnchorMode::Position),
            other => Err(format!("unknown anchor mode: {other}")),
        }
    }
}

/// Analysis strategy used to produce review findings.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument
/// parsing.
///
/// # Examples
///
/// ```
/// use vigil_core::Strategy;
///
/// let s: Strategy = "generative".parse().unwrap();
/// assert_eq!(s, Strategy::Generative);
/// assert_eq!(Strategy::default(), Strategy::Heuristic);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Line-by-line structural scan, no model calls.
    #[default]
    Heuristic,
    /// Text classification endpoint mapped to fixed comment templates.
    Classifier,
    /// Chat-completion endpoint returning free-form review text.
    Generative,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Heuristic => write!(f, "heuristic"),
            Strategy::Classifier => write!(f, "classifier"),
            Strategy::Generative => write!(f, "generative"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heuristic" => Ok(Strategy::Heuristic),
            "classifier" => Ok(Strategy::Classifier),
            "generative" => Ok(Strategy::Generative),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Output format for CLI subcommands.
///
/// # Examples
///
/// ```
/// use vigil_core::OutputFormat;
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary (default).
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
