//! MR Context Assembler: resolves draft/bot short-circuits, then fetches
//! changes and per-file content through a `ForgeClient` to build the
//! immutable `MrContext` the section manager evaluates.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use naysayer_core::api::types::MrDetails as CoreMrDetails;
use naysayer_core::{CoreError, Decision, MrContext};
use naysayer_forge::{ForgeClient, ForgeError};
use regex::Regex;

const AUTOMATED_AUTHORS: &[&str] = &["dependabot", "renovate", "greenkeeper", "snyk-bot"];

pub enum AssemblerOutcome {
    /// The assembler decided without consulting the section manager.
    ShortCircuit(Decision),
    /// Context is assembled; hand it and its fetched contents to the
    /// section manager.
    Ready { context: MrContext, contents: HashMap<String, Result<String, CoreError>> },
}

pub struct MrContextAssembler<'a> {
    forge: &'a dyn ForgeClient,
    timeout: Duration,
}

impl<'a> MrContextAssembler<'a> {
    pub fn new(forge: &'a dyn ForgeClient, timeout: Duration) -> Self {
        Self { forge, timeout }
    }

    pub async fn assemble(&self, project_id: &str, mr_iid: u64) -> Result<AssemblerOutcome, ForgeError> {
        let details = self.call(self.forge.get_mr_details(project_id, mr_iid)).await?;

        if is_draft_title(&details.title) {
            tracing::info!(project_id, mr_iid, "short-circuit: draft MR");
            return Ok(AssemblerOutcome::ShortCircuit(Decision::approve("draft MR")));
        }
        if is_automated_author(&details.author) {
            tracing::info!(project_id, mr_iid, author = %details.author, "short-circuit: automated user");
            return Ok(AssemblerOutcome::ShortCircuit(Decision::approve("automated user")));
        }

        let changes = self.call(self.forge.fetch_mr_changes(project_id, mr_iid)).await?;
        tracing::debug!(project_id, mr_iid, changes = changes.len(), "fetched MR changes");

        let mut contents = HashMap::new();
        let mut metadata = HashMap::new();

        for change in &changes {
            if change.deleted_file {
                continue;
            }

            let new_content = match self
                .call(self.forge.fetch_file_content(project_id, &change.new_path, &details.source_branch))
                .await
            {
                Ok(fc) => fc.decode().map_err(|e| CoreError::Fetch(e.to_string())),
                Err(e) => Err(CoreError::Fetch(e.to_string())),
            };
            contents.insert(change.new_path.clone(), new_content);

            // The warehouse rule needs the "before" version to compare sizes;
            // an absent old side (genuinely new file) is left unset so the
            // rule defers to the TOC rule rather than guessing.
            if !change.new_file {
                let old_path = change.old_path.as_deref().unwrap_or(&change.new_path);
                if let Ok(fc) = self
                    .call(self.forge.fetch_file_content(project_id, old_path, &details.target_branch))
                    .await
                {
                    if let Ok(text) = fc.decode() {
                        metadata.insert(naysayer_core::rules::warehouse::old_content_key(&change.new_path), text);
                    }
                }
            }
        }

        let mut context = MrContext {
            project_id: project_id.to_string(),
            mr_iid,
            changes,
            details: CoreMrDetails {
                title: details.title,
                author: details.author,
                source_branch: details.source_branch,
                target_branch: details.target_branch,
            },
            environment: None,
            metadata,
        };
        context.environment = context.derive_environment();

        Ok(AssemblerOutcome::Ready { context, contents })
    }

    async fn call<T>(&self, fut: impl Future<Output = Result<T, ForgeError>>) -> Result<T, ForgeError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ForgeError::Timeout(self.timeout)),
        }
    }
}

fn is_draft_title(title: &str) -> bool {
    let re = Regex::new(r"(?i)^\s*(draft|wip)\b").expect("static regex is valid");
    if re.is_match(title) {
        return true;
    }
    let lower = title.to_lowercase();
    lower.contains("draft") || lower.contains("wip")
}

fn is_automated_author(author: &str) -> bool {
    let lower = author.to_lowercase();
    AUTOMATED_AUTHORS.iter().any(|marker| lower.contains(marker))
}
