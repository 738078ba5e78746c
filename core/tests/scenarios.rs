//! End-to-end scenarios driving the section manager directly against
//! fixture `MRContext`/file-content maps. No forge calls are needed since
//! rules are pure functions of their inputs.

use std::collections::HashMap;

use naysayer_core::api::types::{FileChange, MrContext, MrDetails};
use naysayer_core::config::{self, DEFAULT_RULES};
use naysayer_core::registry::RuleRegistry;
use naysayer_core::rules::warehouse::old_content_key;
use naysayer_core::section_manager::SectionManager;

fn change(path: &str, diff: &str, new_file: bool) -> FileChange {
    FileChange { old_path: None, new_path: path.to_string(), new_file, deleted_file: false, diff: diff.to_string() }
}

fn ctx(title: &str, author: &str, changes: Vec<FileChange>) -> MrContext {
    MrContext {
        project_id: "42".into(),
        mr_iid: 7,
        changes,
        details: MrDetails { title: title.into(), author: author.into(), source_branch: "feature".into(), target_branch: "main".into() },
        environment: None,
        metadata: HashMap::new(),
    }
}

fn configs() -> Vec<naysayer_core::api::types::FileRuleConfig> {
    config::parse_rules(DEFAULT_RULES).unwrap()
}

#[test]
fn scenario_warehouse_decrease() {
    let registry = RuleRegistry::builtin();
    let cfgs = configs();
    let manager = SectionManager::new(&cfgs, &registry);

    let path = "dataproducts/marketing/prod/product.yaml";
    let new_content = "warehouses:\n  - type: user\n    size: SMALL\n";
    let old_content = "warehouses:\n  - type: user\n    size: MEDIUM\n";
    let diff = "@@ -2,1 +2,1 @@\n-    size: MEDIUM\n+    size: SMALL\n";

    let mut mr_ctx = ctx("resize user warehouse", "alice", vec![change(path, diff, false)]);
    mr_ctx.metadata.insert(old_content_key(path), old_content.to_string());

    let mut contents = HashMap::new();
    contents.insert(path.to_string(), Ok(new_content.to_string()));

    let evaluation = manager.evaluate_mr(&mr_ctx, &contents);
    let summary = &evaluation.files[path];
    assert!(summary.file_decision.is_approve());
    assert!(summary.file_decision.reason.contains("warehouse size decrease"));
}

#[test]
fn scenario_warehouse_increase() {
    let registry = RuleRegistry::builtin();
    let cfgs = configs();
    let manager = SectionManager::new(&cfgs, &registry);

    let path = "dataproducts/marketing/prod/product.yaml";
    let new_content = "warehouses:\n  - type: user\n    size: MEDIUM\n";
    let old_content = "warehouses:\n  - type: user\n    size: SMALL\n";
    let diff = "@@ -2,1 +2,1 @@\n-    size: SMALL\n+    size: MEDIUM\n";

    let mut mr_ctx = ctx("resize user warehouse", "alice", vec![change(path, diff, false)]);
    mr_ctx.metadata.insert(old_content_key(path), old_content.to_string());

    let mut contents = HashMap::new();
    contents.insert(path.to_string(), Ok(new_content.to_string()));

    let evaluation = manager.evaluate_mr(&mr_ctx, &contents);
    let summary = &evaluation.files[path];
    assert!(summary.file_decision.is_manual_review());
    assert!(summary.file_decision.reason.contains("warehouse size increase"));
}

#[test]
fn scenario_toc_new_prod() {
    let registry = RuleRegistry::builtin();
    let cfgs = configs();
    let manager = SectionManager::new(&cfgs, &registry);

    let path = "dataproducts/sales/prod/product.yaml";
    let content = "warehouses:\n  - type: user\n    size: SMALL\n";
    let diff = "@@ -0,0 +1,3 @@\n+warehouses:\n+  - type: user\n+    size: SMALL\n";

    let mr_ctx = ctx("add sales product", "bob", vec![change(path, diff, true)]);
    let mut contents = HashMap::new();
    contents.insert(path.to_string(), Ok(content.to_string()));

    let evaluation = manager.evaluate_mr(&mr_ctx, &contents);
    let summary = &evaluation.files[path];
    assert!(summary.file_decision.is_manual_review());
    assert!(summary.file_decision.reason.contains("prod"));
    assert!(summary.file_decision.reason.to_lowercase().contains("toc"));
}

#[test]
fn scenario_consumer_only_prod() {
    let registry = RuleRegistry::builtin();
    let cfgs = configs();
    let manager = SectionManager::new(&cfgs, &registry);

    let path = "dataproducts/analytics/prod/product.yaml";
    let content = "data_product_db:\n  presentation_schemas:\n    - consumers:\n        - name: journey\n          kind: data_product\n";
    let diff = "@@ -4,0 +4,2 @@\n+        - name: journey\n+          kind: data_product\n";

    let mr_ctx = ctx("grant consumer access", "carol", vec![change(path, diff, false)]);
    let mut contents = HashMap::new();
    contents.insert(path.to_string(), Ok(content.to_string()));

    let evaluation = manager.evaluate_mr(&mr_ctx, &contents);
    let summary = &evaluation.files[path];
    assert!(summary.file_decision.is_approve(), "{:?}", summary.file_decision);
    let mentions_consumer = summary.rule_results.iter().any(|r| r.decision.reason.contains("consumer"));
    assert!(mentions_consumer);
}

#[test]
fn scenario_metadata_readme() {
    let registry = RuleRegistry::builtin();
    let cfgs = configs();
    let manager = SectionManager::new(&cfgs, &registry);

    let path = "dataproducts/analytics/README.md";
    let content = "# Analytics\n\nUpdated docs.\n";
    let diff = "@@ -1,1 +1,3 @@\n+# Analytics\n+\n+Updated docs.\n";

    let mr_ctx = ctx("update readme", "dave", vec![change(path, diff, false)]);
    let mut contents = HashMap::new();
    contents.insert(path.to_string(), Ok(content.to_string()));

    let evaluation = manager.evaluate_mr(&mr_ctx, &contents);
    assert!(evaluation.files[path].file_decision.is_approve());
    assert!(evaluation.final_decision.is_approve());
}

#[test]
fn scenario_integration_uncovered_lines() {
    let registry = RuleRegistry::builtin();
    let cfgs = configs();
    let manager = SectionManager::new(&cfgs, &registry);

    let path = "migrations/001_add_column.sql";
    let diff = "@@ -0,0 +1,1 @@\n+ALTER TABLE foo ADD COLUMN bar INT;\n";

    let mr_ctx = ctx("add migration", "erin", vec![change(path, diff, true)]);
    let evaluation = manager.evaluate_mr(&mr_ctx, &HashMap::new());

    let summary = &evaluation.files[path];
    assert!(summary.file_decision.is_manual_review());
    assert!(summary.file_decision.reason.contains("no file rule matches"));
}

#[test]
fn scenario_integration_multi_file_mixed() {
    let registry = RuleRegistry::builtin();
    let cfgs = configs();
    let manager = SectionManager::new(&cfgs, &registry);

    let readme_path = "README.md";
    let readme_content = "# Root\n";
    let readme_diff = "@@ -0,0 +1,1 @@\n+# Root\n";

    let product_path = "dataproducts/new/prod/product.yaml";
    let product_content = "warehouses:\n  - type: user\n    size: SMALL\n";
    let product_diff = "@@ -0,0 +1,3 @@\n+warehouses:\n+  - type: user\n+    size: SMALL\n";

    let mr_ctx = ctx(
        "add new product and readme",
        "frank",
        vec![change(readme_path, readme_diff, true), change(product_path, product_diff, true)],
    );

    let mut contents = HashMap::new();
    contents.insert(readme_path.to_string(), Ok(readme_content.to_string()));
    contents.insert(product_path.to_string(), Ok(product_content.to_string()));

    let evaluation = manager.evaluate_mr(&mr_ctx, &contents);
    assert!(evaluation.final_decision.is_manual_review());
    assert!(evaluation.files[readme_path].file_decision.is_approve());
    assert!(evaluation.files[product_path].file_decision.is_manual_review());
}
