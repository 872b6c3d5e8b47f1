use std::path::Path;

use vigil_core::{Finding, ModelConfig, Strategy, VigilError};

use crate::classify::ClassifierClient;
use crate::llm::{ChatMessage, LlmClient, Role};
use crate::prompt;

/// Comment emitted by the heuristic for an undocumented function definition.
pub const DOCSTRING_HINT: &str =
    "Consider adding a docstring to document this function.";

/// Comment substituted when a model endpoint fails.
pub const ANALYSIS_UNAVAILABLE: &str =
    "Automated analysis was unavailable for this file.";

/// Fixed comment templates indexed by classifier class.
const CLASS_TEMPLATES: [&str; 2] = [
    "This file likely needs attention: review error handling, input validation, \
     and documentation before merging.",
    "No significant issues detected in this file. Consider adding tests to lock \
     in the current behavior.",
];

/// One polymorphic analyzer: three interchangeable strategies behind a
/// single `analyze` entry point, selected from configuration.
///
/// Enum dispatch rather than a trait object because the model-backed
/// variants are async.
pub enum Analyzer {
    /// Line-by-line structural scan.
    Heuristic(Heuristic),
    /// Classification endpoint mapped to fixed templates.
    Classifier(ClassifierClient),
    /// Chat completion returning free-form review text.
    Generative(LlmClient),
}

impl Analyzer {
    /// Build the analyzer selected by `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Model`] if a model-backed client cannot be
    /// built.
    pub fn from_strategy(strategy: Strategy, model: &ModelConfig) -> Result<Self, VigilError> {
        match strategy {
            Strategy::Heuristic => Ok(Analyzer::Heuristic(Heuristic::default())),
            Strategy::Classifier => Ok(Analyzer::Classifier(ClassifierClient::new(model)?)),
            Strategy::Generative => Ok(Analyzer::Generative(LlmClient::new(model)?)),
        }
    }

    /// The strategy this analyzer implements.
    pub fn strategy(&self) -> Strategy {
        match self {
            Analyzer::Heuristic(_) => Strategy::Heuristic,
            Analyzer::Classifier(_) => Strategy::Classifier,
            Analyzer::Generative(_) => Strategy::Generative,
        }
    }

    /// Analyze one file's text and return zero or more findings.
    ///
    /// Empty or whitespace-only input yields zero findings for every
    /// strategy. Model endpoint failures never propagate: they are logged
    /// and replaced by a single "analysis unavailable" finding so the rest
    /// of the batch keeps going.
    pub async fn analyze(&self, path: &Path, text: &str) -> Vec<Finding> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        match self {
            Analyzer::Heuristic(h) => h.scan(path, text),
            Analyzer::Classifier(client) => match client.classify(text).await {
                Ok(class) => vec![file_level(path, template_for(class))],
                Err(e) => {
                    eprintln!("warning: classification failed for {}: {e}", path.display());
                    vec![file_level(path, ANALYSIS_UNAVAILABLE)]
                }
            },
            Analyzer::Generative(client) => {
                let messages = vec![
                    ChatMessage {
                        role: Role::System,
                        content: prompt::build_system_prompt(),
                    },
                    ChatMessage {
                        role: Role::User,
                        content: prompt::build_review_prompt(path, text),
                    },
                ];
                match client.chat(messages).await {
                    Ok(reply) if reply.trim().is_empty() => Vec::new(),
                    Ok(reply) => vec![file_level(path, reply.trim())],
                    Err(e) => {
                        eprintln!("warning: chat review failed for {}: {e}", path.display());
                        vec![file_level(path, ANALYSIS_UNAVAILABLE)]
                    }
                }
            }
        }
    }
}

fn template_for(class: usize) -> &'static str {
    CLASS_TEMPLATES.get(class).copied().unwrap_or(CLASS_TEMPLATES[0])
}

// File-level findings anchor at line 1 by convention.
fn file_level(path: &Path, body: &str) -> Finding {
    Finding {
        file_path: path.to_path_buf(),
        line: 1,
        body: body.to_string(),
    }
}

/// Heuristic analyzer: flags function definitions that are not followed by a
/// documentation string.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vigil_review::analyze::Heuristic;
///
/// let findings = Heuristic::default().scan(Path::new("app.py"), "x = 1\ndef foo():\n    pass");
/// assert_eq!(findings.len(), 1);
/// assert_eq!(findings[0].line, 2);
/// ```
pub struct Heuristic {
    marker: String,
}

impl Default for Heuristic {
    fn default() -> Self {
        Self {
            marker: "def ".into(),
        }
    }
}

impl Heuristic {
    /// Scan `text` line by line, emitting one finding per marker occurrence
    /// that lacks an adjacent docstring, anchored at that 1-based line.
    pub fn scan(&self, path: &Path, text: &str) -> Vec<Finding> {
        let lines: Vec<&str> = text.lines().collect();
        let mut findings = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if !line.contains(&self.marker) {
                continue;
            }
            if has_adjacent_docstring(&lines, idx) {
                continue;
            }
            findings.push(Finding {
                file_path: path.to_path_buf(),
                line: (idx + 1) as u32,
                body: DOCSTRING_HINT.to_string(),
            });
        }
        findings
    }
}

fn has_adjacent_docstring(lines: &[&str], idx: usize) -> bool {
    lines
        .iter()
        .skip(idx + 1)
        // diff lines carry a +/- prefix; strip it before inspecting
        .map(|l| l.trim_start_matches(['+', '-']).trim())
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.starts_with("\"\"\"") || l.starts_with("'''"))
}
