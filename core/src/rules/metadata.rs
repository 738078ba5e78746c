//! Metadata Rule: blanket approval for documentation and ancillary files,
//! with a file-type-specific reason for the comment.

use crate::api::traits::Rule;
use crate::api::types::{Decision, LineRange};
use crate::pattern;

const METADATA_GLOBS: &[&str] = &[
    "**/README.md",
    "**/CHANGELOG.md",
    "**/LICENSE",
    "docs/**",
    "*.md",
    "*.txt",
    "**/developers.yaml",
    "**/data_elements.md",
    "**/promotion_checklist.md",
    "**/CODEOWNERS",
];

#[derive(Default)]
pub struct MetadataRule;

impl MetadataRule {
    pub fn applies_to(file_path: &str) -> bool {
        pattern::matches_any(file_path, &METADATA_GLOBS.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }
}

impl Rule for MetadataRule {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn description(&self) -> &'static str {
        "Approves documentation and ancillary file changes"
    }

    fn covered_lines(&self, _file_path: &str, _content: &str) -> Vec<LineRange> {
        vec![LineRange::new(1, 1)]
    }

    fn validate_lines(&self, file_path: &str, _content: &str, _line_ranges: &[LineRange]) -> Decision {
        let basename = file_path.rsplit('/').next().unwrap_or(file_path);
        Decision::approve(format!("documentation/ancillary file '{basename}' auto-approved"))
    }
}
