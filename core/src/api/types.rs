use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// One file touched by a merge request, as reported by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub old_path: Option<String>,
    pub new_path: String,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
    pub diff: String,
}

/// MR metadata that does not vary per file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrDetails {
    pub title: String,
    pub author: String,
    pub source_branch: String,
    pub target_branch: String,
}

/// Per-evaluation snapshot of one merge request. Immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MrContext {
    pub project_id: String,
    pub mr_iid: u64,
    pub changes: Vec<FileChange>,
    pub details: MrDetails,
    pub environment: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl MrContext {
    /// Best-effort environment extraction from the first changed path that
    /// contains a recognized environment segment.
    pub fn derive_environment(&self) -> Option<String> {
        const ENVS: &[&str] = &["prod", "preprod", "staging", "dev", "test"];
        for change in &self.changes {
            let lower = change.new_path.to_lowercase();
            for env in ENVS {
                if path_contains_segment(&lower, env) {
                    return Some((*env).to_string());
                }
            }
        }
        None
    }
}

/// True if `segment` appears in `path` bounded by `/` or `_` on both sides
/// (or string start/end), so "preprod" doesn't match inside "preprodigy".
pub fn path_contains_segment(path: &str, segment: &str) -> bool {
    let bytes = path.as_bytes();
    let seg_len = segment.len();
    if seg_len == 0 || seg_len > path.len() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = path[start..].find(segment) {
        let idx = start + pos;
        let before_ok = idx == 0 || matches!(bytes[idx - 1], b'/' | b'_');
        let after_idx = idx + seg_len;
        let after_ok = after_idx == bytes.len() || matches!(bytes[after_idx], b'/' | b'_');
        if before_ok && after_ok {
            return true;
        }
        start = idx + 1;
        if start >= path.len() {
            break;
        }
    }
    false
}

/// Outcome kind of a decision. `ManualReview` is absorbing under aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approve,
    ManualReview,
}

/// A verdict with a human-readable explanation, suitable for posting as an
/// MR comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub kind: DecisionKind,
    pub reason: String,
    pub summary: String,
    pub details: Option<String>,
}

impl Decision {
    pub fn approve(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            kind: DecisionKind::Approve,
            summary: reason.clone(),
            reason,
            details: None,
        }
    }

    pub fn manual_review(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            kind: DecisionKind::ManualReview,
            summary: reason.clone(),
            reason,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn is_approve(&self) -> bool {
        self.kind == DecisionKind::Approve
    }

    pub fn is_manual_review(&self) -> bool {
        self.kind == DecisionKind::ManualReview
    }

    /// `manual_review`-absorbing combination: if either side requires manual
    /// review, the combination does too, carrying that side's reason.
    pub fn absorb(self, other: Decision) -> Decision {
        if self.is_manual_review() {
            self
        } else if other.is_manual_review() {
            other
        } else {
            other
        }
    }
}

/// Canonical inclusive line range, 1-based. `start_line <= end_line` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl LineRange {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        if start_line <= end_line {
            Self { start_line, end_line }
        } else {
            Self { start_line: end_line, end_line: start_line }
        }
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start_line <= other.end_line && other.start_line <= self.end_line
    }

    /// `[a,b]` and `[c,d]` are adjacent (mergeable) when `c <= b + 1`.
    pub fn adjacent_or_overlapping(&self, other: &LineRange) -> bool {
        if self.start_line <= other.start_line {
            other.start_line <= self.end_line.saturating_add(1)
        } else {
            self.start_line <= other.end_line.saturating_add(1)
        }
    }

    pub fn is_subrange_of(&self, other: &LineRange) -> bool {
        self.start_line >= other.start_line && self.end_line <= other.end_line
    }

    pub fn len(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

/// Declarative rule reference inside a `SectionDefinition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfigRef {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// One named, path-addressed region of a file a section of rules applies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub name: String,
    pub yaml_path: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub rule_configs: Vec<RuleConfigRef>,
    #[serde(default)]
    pub auto_approve: bool,
}

/// The parser a `FileRuleConfig` selects for files it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserType {
    Yaml,
    Text,
}

/// Declarative binding of a file selector to a parser and sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRuleConfig {
    pub name: String,
    pub path_glob: String,
    #[serde(default)]
    pub filename_glob: Option<String>,
    pub parser_type: ParserType,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,
}

/// A scalar or nested value lifted out of a parsed YAML section, used so
/// rules can inspect section structure without re-parsing YAML themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Sequence(Vec<FieldValue>),
    Mapping(BTreeMap<String, FieldValue>),
}

/// Result of parsing one file into a named, line-spanned region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub file_path: String,
    pub yaml_path: String,
    pub required: bool,
    pub rule_configs: Vec<RuleConfigRef>,
    pub auto_approve: bool,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Section {
    pub fn line_range(&self) -> LineRange {
        LineRange::new(self.start_line, self.end_line)
    }
}

/// Outcome of dispatching one rule's `validate_lines` within a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineValidationResult {
    pub rule_name: String,
    pub line_ranges: Vec<LineRange>,
    pub decision: Decision,
    pub was_evaluated: bool,
}

/// Per-file roll-up of coverage and rule outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidationSummary {
    pub file_path: String,
    pub total_lines: u32,
    pub covered_lines: Vec<LineRange>,
    pub uncovered_lines: Vec<LineRange>,
    pub rule_results: Vec<LineValidationResult>,
    pub file_decision: Decision,
}

/// Aggregate counts across every file in a `RuleEvaluation`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvaluationCounts {
    pub total_files: u32,
    pub approved_files: u32,
    pub review_files: u32,
    pub uncovered_files: u32,
}

/// Top-level output of evaluating one merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub final_decision: Decision,
    pub files: BTreeMap<String, FileValidationSummary>,
    pub counts: EvaluationCounts,
    pub duration_ms: u64,
}

/// Error kinds surfaced by the core engine. Every fallible path in this
/// crate returns one of these rather than panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed YAML or navigation to a missing required path.
    Parse(String),
    /// Forge fetch failure (timeout, non-404 error) truncated to ~200 chars.
    Fetch(String),
    /// No file rule config matches a changed file.
    Config(String),
    /// Touched lines not claimed by any rule.
    CoverageGap(String),
    /// A rule returned an ambiguous or invalid result.
    Rule(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Parse(s) => write!(f, "parse error: {s}"),
            CoreError::Fetch(s) => write!(f, "fetch error: {s}"),
            CoreError::Config(s) => write!(f, "config error: {s}"),
            CoreError::CoverageGap(s) => write!(f, "coverage gap: {s}"),
            CoreError::Rule(s) => write!(f, "rule error: {s}"),
        }
    }
}

impl std::error::Error for CoreError {}

/// Truncate an error message to ~200 chars for inclusion in a file decision
/// reason, per the error handling design's fetch_error policy.
pub fn truncate_message(msg: &str) -> String {
    const MAX: usize = 200;
    if msg.len() <= MAX {
        msg.to_string()
    } else {
        let mut truncated: String = msg.chars().take(MAX).collect();
        truncated.push('\u{2026}');
        truncated
    }
}
