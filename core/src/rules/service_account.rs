//! Service-Account Rule: Astro-typed service account files must name
//! themselves after their own basename; all other service accounts always
//! require manual review.

use crate::api::traits::Rule;
use crate::api::types::{CoreError, Decision, LineRange};
use crate::yaml_doc;

#[derive(Default)]
pub struct ServiceAccountRule;

impl ServiceAccountRule {
    /// An "Astro-typed" service account basename contains `_astro_` and ends
    /// in `_appuser.yaml`/`_appuser.yml`.
    pub fn is_astro_typed(file_path: &str) -> bool {
        let basename = basename(file_path);
        basename.contains("_astro_") && (basename.ends_with("_appuser.yaml") || basename.ends_with("_appuser.yml"))
    }
}

fn basename(file_path: &str) -> &str {
    file_path.rsplit('/').next().unwrap_or(file_path)
}

fn stem(file_path: &str) -> &str {
    let base = basename(file_path);
    base.strip_suffix(".yaml").or_else(|| base.strip_suffix(".yml")).unwrap_or(base)
}

impl Rule for ServiceAccountRule {
    fn name(&self) -> &'static str {
        "service_account"
    }

    fn description(&self) -> &'static str {
        "Validates Astro-typed service account naming; all other service accounts require manual review"
    }

    fn covered_lines(&self, _file_path: &str, _content: &str) -> Vec<LineRange> {
        vec![LineRange::new(1, 1)]
    }

    fn validate_lines(&self, file_path: &str, content: &str, _line_ranges: &[LineRange]) -> Decision {
        if !Self::is_astro_typed(file_path) {
            return Decision::manual_review("non-Astro service account requires manual review");
        }

        let expected = stem(file_path);
        match name_field(content) {
            Ok(Some(name)) if name == expected => {
                Decision::approve(format!("service account name '{name}' matches file basename"))
            }
            Ok(Some(name)) => Decision::manual_review(format!(
                "service account name '{name}' does not match expected '{expected}'"
            )),
            Ok(None) => Decision::manual_review("service account file is missing a 'name' field"),
            Err(CoreError::Parse(msg)) => Decision::manual_review(format!("could not parse service account YAML: {msg}")),
            Err(other) => Decision::manual_review(other.to_string()),
        }
    }
}

fn name_field(content: &str) -> Result<Option<String>, CoreError> {
    let doc = yaml_doc::parse(content)?;
    Ok(doc.get("name").and_then(|(_, node)| match node {
        yaml_doc::YamlNode::Scalar { value, .. } => Some(value.clone()),
        _ => None,
    }))
}
