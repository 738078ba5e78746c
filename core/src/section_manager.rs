//! Section Manager: for one MR, walks changed files, resolves each to a
//! file-rule config, parses sections, dispatches section -> rules, and
//! aggregates file decisions into the MR-level verdict.
//!
//! Content fetching is the caller's concern (the CLI crate holds the forge
//! client); this module is handed already-resolved `content(f, sourceRef)`
//! results so it stays a pure, synchronous, forge-agnostic function of its
//! inputs — rules never mutate shared state, and neither does this module.

use std::collections::{BTreeMap, HashMap};

use crate::api::types::{
    CoreError, Decision, EvaluationCounts, FileChange, FileRuleConfig, FileValidationSummary, LineRange,
    LineValidationResult, MrContext, ParserType, RuleEvaluation, Section,
};
use crate::config;
use crate::diff;
use crate::line_range;
use crate::registry::RuleRegistry;
use crate::section_parser;

pub struct SectionManager<'a> {
    configs: &'a [FileRuleConfig],
    registry: &'a RuleRegistry,
}

impl<'a> SectionManager<'a> {
    pub fn new(configs: &'a [FileRuleConfig], registry: &'a RuleRegistry) -> Self {
        Self { configs, registry }
    }

    /// Evaluate every non-deleted changed file and aggregate the MR-level
    /// decision. `contents` maps `newPath -> fetch result`; a file absent
    /// from the map is treated as a fetch error.
    pub fn evaluate_mr(&self, ctx: &MrContext, contents: &HashMap<String, Result<String, CoreError>>) -> RuleEvaluation {
        let start = std::time::Instant::now();
        let mut files = BTreeMap::new();

        tracing::info!(project_id = %ctx.project_id, mr_iid = ctx.mr_iid, changes = ctx.changes.len(), "evaluating merge request");

        for change in &ctx.changes {
            if change.deleted_file {
                tracing::debug!(file = %change.new_path, "skipping deleted file");
                continue;
            }
            let content = contents
                .get(&change.new_path)
                .map(|r| r.as_deref().map_err(Clone::clone))
                .unwrap_or_else(|| Err(CoreError::Fetch("no content fetched for changed file".to_string())));

            let summary = self.evaluate_file(ctx, change, content);
            tracing::debug!(
                file = %change.new_path,
                decision = ?summary.file_decision.kind,
                reason = %summary.file_decision.reason,
                "file evaluated"
            );
            files.insert(change.new_path.clone(), summary);
        }

        finalize(files, start.elapsed().as_millis() as u64)
    }

    /// Evaluate a single changed file in isolation. Exposed (beyond what
    /// `evaluate_mr` needs internally) so a caller that wants to fan file
    /// evaluation out across tasks — this crate stays synchronous and has
    /// no opinion on how — can drive files independently and combine the
    /// results with [`finalize`].
    pub fn evaluate_file(&self, ctx: &MrContext, change: &FileChange, content: Result<&str, CoreError>) -> FileValidationSummary {
        let Some(file_config) = config::select_config(self.configs, &change.new_path) else {
            tracing::warn!(file = %change.new_path, "no file rule config matches");
            return FileValidationSummary {
                file_path: change.new_path.clone(),
                total_lines: 0,
                covered_lines: vec![],
                uncovered_lines: vec![],
                rule_results: vec![],
                file_decision: Decision::manual_review("no file rule matches"),
            };
        };

        let content = match content {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(file = %change.new_path, error = %e, "could not fetch file content");
                return FileValidationSummary {
                    file_path: change.new_path.clone(),
                    total_lines: 0,
                    covered_lines: vec![],
                    uncovered_lines: vec![],
                    rule_results: vec![],
                    file_decision: Decision::manual_review(format!(
                        "could not fetch file content: {}",
                        crate::api::types::truncate_message(&e.to_string())
                    )),
                };
            }
        };

        let total_lines = line_range::count_lines(content);
        let sections = match file_config.parser_type {
            ParserType::Yaml => section_parser::parse_sections(&change.new_path, content, &file_config.sections),
            ParserType::Text => section_parser::parse_text_sections(&change.new_path, content, &file_config.sections),
        };

        let sections = match sections {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(file = %change.new_path, error = %e, "section parsing failed");
                return FileValidationSummary {
                    file_path: change.new_path.clone(),
                    total_lines,
                    covered_lines: vec![],
                    uncovered_lines: vec![LineRange::new(1, total_lines.max(1))],
                    rule_results: vec![],
                    file_decision: Decision::manual_review(format!("{e}")),
                };
            }
        };

        let touched = diff::touched_lines(&change.diff);

        let mut rule_results = Vec::new();
        let mut covered_ranges: Vec<LineRange> = Vec::new();
        let mut file_decision = Decision::approve("no sections required manual review");
        let mut any_manual_review = false;

        for section in &sections {
            if !section_overlaps_touched(section, &touched) {
                continue;
            }

            let (section_decision, section_results, section_coverage) = self.evaluate_section(ctx, section);
            rule_results.extend(section_results);
            covered_ranges.extend(section_coverage);

            if section_decision.is_manual_review() {
                if !any_manual_review {
                    file_decision = section_decision;
                }
                any_manual_review = true;
            } else if !any_manual_review {
                file_decision = section_decision;
            }
        }

        let covered_lines = line_range::merge(&covered_ranges);
        let uncovered_all = line_range::uncovered(total_lines, &covered_lines);
        let uncovered_lines = line_range::intersect_with_lines(&uncovered_all, &touched);

        if !any_manual_review && !uncovered_lines.is_empty() {
            let gap = uncovered_lines.iter().map(LineRange::len).sum::<u32>();
            tracing::debug!(file = %change.new_path, gap, "touched lines uncovered by any rule");
            file_decision = Decision::manual_review(format!("{gap} touched line(s) not claimed by any rule"));
        }

        FileValidationSummary {
            file_path: change.new_path.clone(),
            total_lines,
            covered_lines,
            uncovered_lines,
            rule_results,
            file_decision,
        }
    }

    fn evaluate_section(&self, ctx: &MrContext, section: &Section) -> (Decision, Vec<LineValidationResult>, Vec<LineRange>) {
        let mut results = Vec::new();
        let mut coverage = Vec::new();
        let mut claimed_any = false;
        let mut decision: Option<Decision> = None;

        for rule_ref in &section.rule_configs {
            if !rule_ref.enabled {
                continue;
            }
            let Some(mut rule) = self.registry.get(&rule_ref.name) else {
                tracing::warn!(rule = %rule_ref.name, section = %section.name, "rule not found in registry");
                continue;
            };
            rule.set_mr_context(ctx);

            let covered = rule.covered_lines(&section.file_path, &section.content);
            if covered.is_empty() {
                results.push(LineValidationResult {
                    rule_name: rule.name().to_string(),
                    line_ranges: vec![],
                    decision: Decision::approve("rule does not apply"),
                    was_evaluated: false,
                });
                continue;
            }
            claimed_any = true;
            coverage.extend(effective_coverage(&covered, section));

            let section_range = section.line_range();
            let verdict = rule.validate_lines(&section.file_path, &section.content, &[section_range]);
            let is_manual_review = verdict.is_manual_review();
            results.push(LineValidationResult {
                rule_name: rule.name().to_string(),
                line_ranges: vec![section_range],
                decision: verdict.clone(),
                was_evaluated: true,
            });
            decision = Some(verdict);
            if is_manual_review {
                tracing::debug!(rule = %rule_ref.name, section = %section.name, "short-circuiting section on manual_review");
                break;
            }
        }

        let final_decision = if !claimed_any {
            if section.auto_approve {
                Decision::approve("auto-approved: no validation required")
            } else {
                Decision::manual_review(format!("no validation rules configured for {}", section.name))
            }
        } else {
            decision.unwrap_or_else(|| Decision::approve("auto-approved: no validation required"))
        };

        (final_decision, results, coverage)
    }
}

/// Roll a completed per-file map into the MR-level `RuleEvaluation`,
/// computing counts and the absorbing final decision. Shared by
/// `evaluate_mr` and any caller that fans file evaluation out itself via
/// [`SectionManager::evaluate_file`].
pub fn finalize(files: BTreeMap<String, FileValidationSummary>, duration_ms: u64) -> RuleEvaluation {
    let mut counts = EvaluationCounts::default();
    for summary in files.values() {
        counts.total_files += 1;
        if summary.file_decision.is_approve() {
            counts.approved_files += 1;
        } else {
            counts.review_files += 1;
        }
        if !summary.uncovered_lines.is_empty() {
            counts.uncovered_files += 1;
        }
    }

    let final_decision = if files.values().all(|f| f.file_decision.is_approve()) {
        Decision::approve("all files approved")
    } else {
        Decision::manual_review("one or more files require manual review")
    };

    tracing::info!(decision = ?final_decision.kind, files = counts.total_files, "merge request evaluation complete");

    RuleEvaluation { final_decision, files, counts, duration_ms }
}

/// Expand a rule's covered-lines report into real file-line coverage. The
/// `[{1,1}]` sentinel means "I cover my parent section's whole range."
fn effective_coverage(covered: &[LineRange], section: &Section) -> Vec<LineRange> {
    if covered.len() == 1 && covered[0] == LineRange::new(1, 1) {
        vec![section.line_range()]
    } else {
        covered.to_vec()
    }
}

fn section_overlaps_touched(section: &Section, touched: &std::collections::BTreeSet<u32>) -> bool {
    touched.range(section.start_line..=section.end_line).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{MrDetails, RuleConfigRef, SectionDefinition};

    fn change(path: &str, diff: &str, new_file: bool) -> FileChange {
        FileChange { old_path: None, new_path: path.to_string(), new_file, deleted_file: false, diff: diff.to_string() }
    }

    fn mr(changes: Vec<FileChange>) -> MrContext {
        MrContext {
            project_id: "1".into(),
            mr_iid: 1,
            changes,
            details: MrDetails { title: "normal change".into(), author: "alice".into(), ..Default::default() },
            environment: None,
            metadata: HashMap::new(),
        }
    }

    fn product_config() -> FileRuleConfig {
        FileRuleConfig {
            name: "product".into(),
            path_glob: "**/product.yaml".into(),
            filename_glob: None,
            parser_type: ParserType::Yaml,
            enabled: true,
            sections: vec![
                SectionDefinition {
                    name: "whole_file".into(),
                    yaml_path: ".".into(),
                    required: true,
                    rule_configs: vec![RuleConfigRef { name: "toc_approval".into(), enabled: true }],
                    auto_approve: false,
                },
                SectionDefinition {
                    name: "warehouses".into(),
                    yaml_path: "warehouses".into(),
                    required: false,
                    rule_configs: vec![RuleConfigRef { name: "warehouse_size".into(), enabled: true }],
                    auto_approve: false,
                },
            ],
        }
    }

    #[test]
    fn test_deleted_file_skipped() {
        let registry = RuleRegistry::builtin();
        let configs = vec![product_config()];
        let manager = SectionManager::new(&configs, &registry);
        let mut c = change("dataproducts/x/product.yaml", "", false);
        c.deleted_file = true;
        let ctx = mr(vec![c]);
        let evaluation = manager.evaluate_mr(&ctx, &HashMap::new());
        assert!(evaluation.files.is_empty());
    }

    #[test]
    fn test_uncovered_file_manual_review() {
        let registry = RuleRegistry::builtin();
        let configs = vec![product_config()];
        let manager = SectionManager::new(&configs, &registry);
        let c = change("migrations/001_add_column.sql", "@@ -0,0 +1,1 @@\n+ALTER TABLE\n", true);
        let ctx = mr(vec![c]);
        let evaluation = manager.evaluate_mr(&ctx, &HashMap::new());
        let summary = &evaluation.files["migrations/001_add_column.sql"];
        assert!(summary.file_decision.is_manual_review());
        assert!(summary.file_decision.reason.contains("no file rule matches"));
        assert!(evaluation.final_decision.is_manual_review());
    }

    #[test]
    fn test_warehouse_decrease_end_to_end() {
        let registry = RuleRegistry::builtin();
        let configs = vec![product_config()];
        let manager = SectionManager::new(&configs, &registry);

        let new_content = "warehouses:\n  - type: user\n    size: SMALL\n";
        let diff = "@@ -2,1 +2,1 @@\n-    size: MEDIUM\n+    size: SMALL\n";
        let path = "dataproducts/marketing/prod/product.yaml";
        let c = change(path, diff, false);
        let ctx = mr(vec![c]);

        let mut contents = HashMap::new();
        contents.insert(path.to_string(), Ok(new_content.to_string()));

        let mut ctx_with_old = ctx;
        ctx_with_old
            .metadata
            .insert(crate::rules::warehouse::old_content_key(path), "warehouses:\n  - type: user\n    size: MEDIUM\n".to_string());

        let evaluation = manager.evaluate_mr(&ctx_with_old, &contents);
        let summary = &evaluation.files[path];
        assert!(summary.file_decision.is_approve(), "{:?}", summary.file_decision);
    }

    #[test]
    fn test_fetch_error_manual_review() {
        let registry = RuleRegistry::builtin();
        let configs = vec![product_config()];
        let manager = SectionManager::new(&configs, &registry);
        let path = "dataproducts/x/product.yaml";
        let c = change(path, "@@ -1,1 +1,1 @@\n+a\n", false);
        let ctx = mr(vec![c]);
        let mut contents = HashMap::new();
        contents.insert(path.to_string(), Err(CoreError::Fetch("timeout".to_string())));
        let evaluation = manager.evaluate_mr(&ctx, &contents);
        assert!(evaluation.files[path].file_decision.is_manual_review());
    }
}
