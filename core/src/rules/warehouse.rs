//! Warehouse Rule: compares `warehouses[].size` between the MR's source and
//! target refs, keyed by `type`.

use std::collections::HashMap;

use crate::api::traits::Rule;
use crate::api::types::{Decision, LineRange, MrContext};
use crate::rules::size_code;
use crate::yaml_doc::{self, YamlNode};

/// Key under which the assembler stashes a file's pre-change content in
/// `MrContext.metadata`, since the core otherwise only ever sees the new
/// side of a change.
pub fn old_content_key(file_path: &str) -> String {
    format!("old_content::{file_path}")
}

#[derive(Default)]
pub struct WarehouseRule {
    mr_context: Option<MrContext>,
}

impl Rule for WarehouseRule {
    fn name(&self) -> &'static str {
        "warehouse_size"
    }

    fn description(&self) -> &'static str {
        "Validates warehouse size changes in product.yaml against the fixed size hierarchy"
    }

    fn covered_lines(&self, _file_path: &str, _content: &str) -> Vec<LineRange> {
        vec![LineRange::new(1, 1)]
    }

    fn validate_lines(&self, file_path: &str, content: &str, _line_ranges: &[LineRange]) -> Decision {
        let new_map = match warehouses_by_type(content) {
            Ok(map) => map,
            Err(e) => return Decision::manual_review(format!("could not parse warehouses section: {e}")),
        };

        let old_content = self
            .mr_context
            .as_ref()
            .and_then(|ctx| ctx.metadata.get(&old_content_key(file_path)));

        let Some(old_content) = old_content else {
            return Decision::approve(
                "no prior version available; deferring warehouse classification to the TOC rule",
            );
        };

        let old_map = match warehouses_by_type(old_content) {
            Ok(map) => map,
            Err(e) => return Decision::manual_review(format!("could not parse prior warehouses section: {e}")),
        };

        let mut decreased_any = false;
        for (wh_type, new_size) in &new_map {
            let Some(old_size) = old_map.get(wh_type) else {
                return Decision::manual_review(format!("new warehouse creation: type '{wh_type}'"));
            };

            let (Some(new_code), Some(old_code)) = (size_code(new_size), size_code(old_size)) else {
                return Decision::manual_review(format!(
                    "unknown warehouse size for type '{wh_type}': '{old_size}' -> '{new_size}'"
                ));
            };

            if new_code > old_code {
                return Decision::manual_review(format!(
                    "warehouse size increase for type '{wh_type}': {old_size} -> {new_size}"
                ));
            }
            if new_code < old_code {
                decreased_any = true;
            }
        }

        if decreased_any {
            Decision::approve("warehouse size decrease")
        } else {
            Decision::approve("no warehouse size change detected")
        }
    }

    fn set_mr_context(&mut self, ctx: &MrContext) {
        self.mr_context = Some(ctx.clone());
    }
}

/// Parse a `warehouses:` section into a `type -> size` map. Errors on
/// malformed YAML or entries missing `type`/`size`.
fn warehouses_by_type(content: &str) -> Result<HashMap<String, String>, String> {
    let doc = yaml_doc::parse(content).map_err(|e| e.to_string())?;
    let Some((_, warehouses)) = doc.get("warehouses") else {
        return Ok(HashMap::new());
    };

    let YamlNode::Sequence { items, .. } = warehouses else {
        return Err("'warehouses' is not a sequence".to_string());
    };

    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let wh_type = item.get("type").and_then(|(_, node)| scalar_value(node));
        let size = item.get("size").and_then(|(_, node)| scalar_value(node));
        match (wh_type, size) {
            (Some(t), Some(s)) => {
                map.insert(t, s);
            }
            _ => return Err("warehouse entry missing 'type' or 'size'".to_string()),
        }
    }
    Ok(map)
}

fn scalar_value(node: &YamlNode) -> Option<String> {
    match node {
        YamlNode::Scalar { value, .. } => Some(value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_old(file_path: &str, old: &str) -> MrContext {
        MrContext {
            project_id: "1".into(),
            mr_iid: 1,
            changes: vec![],
            details: Default::default(),
            environment: None,
            metadata: HashMap::from([(old_content_key(file_path), old.to_string())]),
        }
    }

    const NEW_SMALL: &str = "warehouses:\n  - type: user\n    size: SMALL\n";
    const OLD_MEDIUM: &str = "warehouses:\n  - type: user\n    size: MEDIUM\n";
    const OLD_SMALL: &str = "warehouses:\n  - type: user\n    size: SMALL\n";

    #[test]
    fn test_warehouse_decrease_approves() {
        let mut rule = WarehouseRule::default();
        rule.set_mr_context(&ctx_with_old("f.yaml", OLD_MEDIUM));
        let decision = rule.validate_lines("f.yaml", NEW_SMALL, &[]);
        assert!(decision.is_approve());
        assert!(decision.reason.contains("warehouse size decrease"));
    }

    #[test]
    fn test_warehouse_increase_manual_review() {
        let mut rule = WarehouseRule::default();
        rule.set_mr_context(&ctx_with_old("f.yaml", OLD_SMALL));
        let new_medium = "warehouses:\n  - type: user\n    size: MEDIUM\n";
        let decision = rule.validate_lines("f.yaml", new_medium, &[]);
        assert!(decision.is_manual_review());
        assert!(decision.reason.contains("warehouse size increase"));
    }

    #[test]
    fn test_new_warehouse_manual_review() {
        let mut rule = WarehouseRule::default();
        rule.set_mr_context(&ctx_with_old("f.yaml", "warehouses: []\n"));
        let decision = rule.validate_lines("f.yaml", NEW_SMALL, &[]);
        assert!(decision.is_manual_review());
        assert!(decision.reason.contains("new warehouse creation"));
    }

    #[test]
    fn test_missing_old_content_defers() {
        let rule = WarehouseRule::default();
        let decision = rule.validate_lines("f.yaml", NEW_SMALL, &[]);
        assert!(decision.is_approve());
        assert!(decision.reason.contains("deferring"));
    }

    #[test]
    fn test_unknown_size_manual_review() {
        let mut rule = WarehouseRule::default();
        rule.set_mr_context(&ctx_with_old("f.yaml", "warehouses:\n  - type: user\n    size: HUGE\n"));
        let decision = rule.validate_lines("f.yaml", NEW_SMALL, &[]);
        assert!(decision.is_manual_review());
        assert!(decision.reason.contains("unknown warehouse size"));
    }

    #[test]
    fn test_unchanged_size_approves_with_neutral_reason() {
        let mut rule = WarehouseRule::default();
        rule.set_mr_context(&ctx_with_old("f.yaml", OLD_SMALL));
        let decision = rule.validate_lines("f.yaml", NEW_SMALL, &[]);
        assert!(decision.is_approve());
        assert!(decision.reason.contains("no warehouse size change"));
    }
}
