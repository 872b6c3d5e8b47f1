use std::path::Path;

const SYSTEM_PROMPT: &str = "\
You are Vigil, an automated code reviewer. You receive one file from a pull \
request and respond with a single short review comment.

Rules:
- Point out the most important concrete improvement: error handling, input \
validation, missing documentation, or a likely bug
- Be specific to the code you were given
- Respond in plain text, at most three sentences
- No markdown headings, no lists, no praise padding";

/// Build the system prompt for the generative analyzer.
///
/// # Examples
///
/// ```
/// use vigil_review::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("Vigil"));
/// assert!(prompt.contains("review comment"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the user prompt containing the file to review.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vigil_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt(Path::new("app.py"), "def foo(): pass");
/// assert!(prompt.contains("app.py"));
/// assert!(prompt.contains("def foo()"));
/// ```
pub fn build_review_prompt(path: &Path, code: &str) -> String {
    format!(
        "Review the following file and point out the most important improvement.\n\n\
         File: {}\n\n```\n{code}\n```\n",
        path.display()
    )
}
