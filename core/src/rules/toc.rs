//! TOC Approval Rule: flags brand-new product descriptors landing directly
//! in a critical environment.

use crate::api::traits::Rule;
use crate::api::types::{path_contains_segment, Decision, LineRange, MrContext};

/// Environment segments that require table-of-contents sign-off for new files.
const CRITICAL_ENVIRONMENTS: &[&str] = &["preprod", "prod"];

#[derive(Default)]
pub struct TocApprovalRule {
    mr_context: Option<MrContext>,
}

impl Rule for TocApprovalRule {
    fn name(&self) -> &'static str {
        "toc_approval"
    }

    fn description(&self) -> &'static str {
        "Requires manual TOC sign-off for new product descriptors in a critical environment"
    }

    fn covered_lines(&self, _file_path: &str, _content: &str) -> Vec<LineRange> {
        vec![LineRange::new(1, 1)]
    }

    fn validate_lines(&self, file_path: &str, _content: &str, _line_ranges: &[LineRange]) -> Decision {
        let is_new = self
            .mr_context
            .as_ref()
            .and_then(|ctx| ctx.changes.iter().find(|c| c.new_path == file_path))
            .map(|c| c.new_file)
            .unwrap_or(false);

        if !is_new {
            return Decision::approve("existing file; no TOC sign-off required");
        }

        let lower = file_path.to_lowercase();
        match CRITICAL_ENVIRONMENTS.iter().find(|env| path_contains_segment(&lower, env)) {
            Some(env) => Decision::manual_review(format!(
                "new product descriptor in {env} environment requires TOC approval"
            )),
            None => Decision::approve("new file outside a critical environment"),
        }
    }

    fn set_mr_context(&mut self, ctx: &MrContext) {
        self.mr_context = Some(ctx.clone());
    }
}
