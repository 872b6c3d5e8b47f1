use std::path::Path;

use serde::Deserialize;

use vigil_core::VigilError;

/// Subset of a GitHub webhook event payload carrying a pull request number.
#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    /// The pull request the event refers to, when present.
    pub pull_request: Option<PullRequestRef>,
}

/// Minimal pull request reference inside an event payload.
#[derive(Debug, Deserialize)]
pub struct PullRequestRef {
    /// Pull request number.
    pub number: u64,
}

/// Read the pull request number from a webhook event payload file, as named
/// by `GITHUB_EVENT_PATH` in GitHub Actions.
///
/// # Errors
///
/// Returns [`VigilError::Io`] if the file cannot be read,
/// [`VigilError::Serialization`] if it is not valid JSON, or
/// [`VigilError::Config`] if the payload carries no `pull_request.number`.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use vigil_review::event::pr_number_from_event;
///
/// let number = pr_number_from_event(Path::new("/tmp/event.json")).unwrap();
/// assert!(number >= 1);
/// ```
pub fn pr_number_from_event(path: &Path) -> Result<u64, VigilError> {
    let raw = std::fs::read_to_string(path)?;
    let event: PullRequestEvent = serde_json::from_str(&raw)?;
    event
        .pull_request
        .map(|pr| pr.number)
        .ok_or_else(|| VigilError::Config("event payload has no pull_request.number".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_event(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_number_from_pull_request_payload() {
        let file = write_event(
            r#"{"action":"opened","pull_request":{"number":42,"title":"Add feature"}}"#,
        );
        assert_eq!(pr_number_from_event(file.path()).unwrap(), 42);
    }

    #[test]
    fn payload_without_pull_request_is_config_error() {
        let file = write_event(r#"{"action":"push","ref":"refs/heads/main"}"#);
        assert!(matches!(
            pr_number_from_event(file.path()),
            Err(VigilError::Config(_))
        ));
    }

    #[test]
    fn invalid_json_is_serialization_error() {
        let file = write_event("not json");
        assert!(matches!(
            pr_number_from_event(file.path()),
            Err(VigilError::Serialization(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            pr_number_from_event(Path::new("/nonexistent/event.json")),
            Err(VigilError::Io(_))
        ));
    }
}
