//! Fans per-file evaluation out across blocking tasks, bounded by a
//! semaphore and abortable via a cancellation token. The section manager
//! itself stays synchronous; this is the only place the CLI crate adds
//! concurrency on top of it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use naysayer_core::api::types::{Decision, FileRuleConfig, FileValidationSummary};
use naysayer_core::{CoreError, MrContext, RuleEvaluation, RuleRegistry, SectionManager};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub async fn evaluate_concurrently(
    configs: Arc<Vec<FileRuleConfig>>,
    registry: Arc<RuleRegistry>,
    ctx: Arc<MrContext>,
    contents: Arc<HashMap<String, Result<String, CoreError>>>,
    max_concurrent_files: usize,
    cancellation: CancellationToken,
) -> RuleEvaluation {
    let start = Instant::now();
    let semaphore = Arc::new(Semaphore::new(max_concurrent_files.max(1)));
    let mut handles = Vec::new();

    for change in ctx.changes.iter().filter(|c| !c.deleted_file).cloned() {
        let configs = configs.clone();
        let registry = registry.clone();
        let ctx = ctx.clone();
        let contents = contents.clone();
        let semaphore = semaphore.clone();
        let cancellation = cancellation.clone();

        handles.push(tokio::spawn(async move {
            let permit = semaphore.acquire_owned().await.expect("semaphore never closes");
            let path = change.new_path.clone();

            if cancellation.is_cancelled() {
                drop(permit);
                return (
                    path,
                    FileValidationSummary {
                        file_path: change.new_path,
                        total_lines: 0,
                        covered_lines: vec![],
                        uncovered_lines: vec![],
                        rule_results: vec![],
                        file_decision: Decision::manual_review("evaluation cancelled"),
                    },
                );
            }

            let summary = tokio::task::spawn_blocking(move || {
                let manager = SectionManager::new(&configs, &registry);
                let content = contents
                    .get(&change.new_path)
                    .map(|r| r.as_deref().map_err(Clone::clone))
                    .unwrap_or_else(|| Err(CoreError::Fetch("no content fetched for changed file".to_string())));
                manager.evaluate_file(&ctx, &change, content)
            })
            .await
            .expect("file evaluation task panicked");

            drop(permit);
            (path, summary)
        }));
    }

    let mut files = BTreeMap::new();
    for handle in handles {
        let (path, summary) = handle.await.expect("file evaluation task was aborted");
        files.insert(path, summary);
    }

    naysayer_core::finalize(files, start.elapsed().as_millis() as u64)
}
