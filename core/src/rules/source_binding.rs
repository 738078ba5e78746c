//! Source-Binding Rule: approves source binding files only when every file
//! touched by the MR is itself "dataverse-safe" (a product descriptor or
//! another source binding).

use crate::api::traits::Rule;
use crate::api::types::{Decision, LineRange, MrContext};
use crate::pattern;

const DATAVERSE_SAFE_GLOBS: &[&str] = &["**/product.yaml", "**/product.yml", "**/*sourcebinding*"];

#[derive(Default)]
pub struct SourceBindingRule {
    mr_context: Option<MrContext>,
}

impl SourceBindingRule {
    pub fn is_dataverse_safe_path(file_path: &str) -> bool {
        pattern::matches_any(file_path, &DATAVERSE_SAFE_GLOBS.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }
}

impl Rule for SourceBindingRule {
    fn name(&self) -> &'static str {
        "source_binding"
    }

    fn description(&self) -> &'static str {
        "Approves source binding changes only within an all-dataverse-safe change set"
    }

    fn covered_lines(&self, _file_path: &str, _content: &str) -> Vec<LineRange> {
        vec![LineRange::new(1, 1)]
    }

    fn validate_lines(&self, _file_path: &str, _content: &str, _line_ranges: &[LineRange]) -> Decision {
        let Some(ctx) = self.mr_context.as_ref() else {
            return Decision::manual_review("no MR context available to classify the change set");
        };

        let unsafe_file = ctx
            .changes
            .iter()
            .find(|change| !change.deleted_file && !Self::is_dataverse_safe_path(&change.new_path));

        match unsafe_file {
            Some(change) => Decision::manual_review(format!(
                "change set is not entirely dataverse-safe: '{}' is neither a product descriptor nor a source binding",
                change.new_path
            )),
            None => Decision::approve("entire change set is dataverse-safe"),
        }
    }

    fn set_mr_context(&mut self, ctx: &MrContext) {
        self.mr_context = Some(ctx.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::FileChange;
    use std::collections::HashMap;

    fn change(path: &str) -> FileChange {
        FileChange { old_path: None, new_path: path.to_string(), new_file: false, deleted_file: false, diff: String::new() }
    }

    fn ctx(paths: &[&str]) -> MrContext {
        MrContext {
            project_id: "1".into(),
            mr_iid: 1,
            changes: paths.iter().map(|p| change(p)).collect(),
            details: Default::default(),
            environment: None,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_all_safe_approves() {
        let mut rule = SourceBindingRule::default();
        rule.set_mr_context(&ctx(&["dataproducts/a/product.yaml", "dataproducts/a/sourcebinding.yaml"]));
        let decision = rule.validate_lines("dataproducts/a/sourcebinding.yaml", "", &[]);
        assert!(decision.is_approve());
    }

    #[test]
    fn test_unsafe_sibling_manual_review() {
        let mut rule = SourceBindingRule::default();
        rule.set_mr_context(&ctx(&["dataproducts/a/sourcebinding.yaml", "README.md"]));
        let decision = rule.validate_lines("dataproducts/a/sourcebinding.yaml", "", &[]);
        assert!(decision.is_manual_review());
    }

    #[test]
    fn test_missing_context_manual_review() {
        let rule = SourceBindingRule::default();
        let decision = rule.validate_lines("dataproducts/a/sourcebinding.yaml", "", &[]);
        assert!(decision.is_manual_review());
    }
}
