//! Decision Reporter: renders a `RuleEvaluation` as Markdown for the bot
//! comment, or as JSON for machine consumption.

use crate::api::traits::Reporter;
use crate::api::types::RuleEvaluation;

pub struct TextReporter;
pub struct JsonReporter;

impl Reporter for TextReporter {
    fn report(&self, evaluation: &RuleEvaluation) -> String {
        tracing::debug!(files = evaluation.files.len(), "rendering markdown report");
        let mut out = String::new();

        out.push_str("## What was checked\n\n");
        for (file_path, summary) in &evaluation.files {
            if summary.rule_results.is_empty() {
                continue;
            }
            for result in &summary.rule_results {
                if !result.was_evaluated {
                    continue;
                }
                let status = if result.decision.is_approve() { "✅" } else { "🚫" };
                out.push_str(&format!("{status} `{file_path}` [{}]: {}\n", result.rule_name, result.decision.reason));
            }
        }

        out.push_str("\n## Files without validation rules\n\n");
        let mut uncovered_any = false;
        for (file_path, summary) in &evaluation.files {
            if summary.rule_results.is_empty() && !summary.file_decision.is_approve() {
                out.push_str(&format!("- `{file_path}`\n"));
                uncovered_any = true;
            }
        }
        if !uncovered_any {
            out.push_str("_none_\n");
        }

        out.push_str("\n## Final verdict\n\n");
        let verdict = if evaluation.final_decision.is_approve() { "APPROVE" } else { "MANUAL REVIEW" };
        out.push_str(&format!(
            "**{verdict}** — {} file(s) checked, {} approved, {} require review.\n",
            evaluation.counts.total_files, evaluation.counts.approved_files, evaluation.counts.review_files
        ));

        out
    }
}

impl Reporter for JsonReporter {
    fn report(&self, evaluation: &RuleEvaluation) -> String {
        serde_json::to_string_pretty(evaluation)
            .unwrap_or_else(|e| format!("{{\"error\": \"JSON serialization failed: {e}\"}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Decision, EvaluationCounts, FileValidationSummary};
    use std::collections::BTreeMap;

    fn eval(approve: bool) -> RuleEvaluation {
        let mut files = BTreeMap::new();
        files.insert(
            "README.md".to_string(),
            FileValidationSummary {
                file_path: "README.md".to_string(),
                total_lines: 3,
                covered_lines: vec![],
                uncovered_lines: vec![],
                rule_results: vec![crate::api::types::LineValidationResult {
                    rule_name: "metadata".to_string(),
                    line_ranges: vec![],
                    decision: Decision::approve("documentation auto-approved"),
                    was_evaluated: true,
                }],
                file_decision: Decision::approve("ok"),
            },
        );
        RuleEvaluation {
            final_decision: if approve { Decision::approve("ok") } else { Decision::manual_review("no") },
            files,
            counts: EvaluationCounts { total_files: 1, approved_files: 1, review_files: 0, uncovered_files: 0 },
            duration_ms: 5,
        }
    }

    #[test]
    fn test_text_reporter_has_three_sections() {
        let report = TextReporter.report(&eval(true));
        assert!(report.contains("## What was checked"));
        assert!(report.contains("## Files without validation rules"));
        assert!(report.contains("## Final verdict"));
        assert!(report.contains("APPROVE"));
    }

    #[test]
    fn test_text_reporter_deterministic() {
        let evaluation = eval(true);
        assert_eq!(TextReporter.report(&evaluation), TextReporter.report(&evaluation));
    }

    #[test]
    fn test_json_reporter_produces_valid_json() {
        let report = JsonReporter.report(&eval(false));
        let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert!(parsed.get("final_decision").is_some());
    }
}
