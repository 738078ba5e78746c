//! In-memory `ForgeClient` for tests and local dry-runs. Fixtures are seeded
//! by the caller before the assembler runs; no network access is ever made.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::traits::ForgeClient;
use crate::types::{CommentKind, FileChange, FileContent, MrDetails, UserRef};

#[derive(Default)]
struct MockState {
    changes: HashMap<(String, u64), Vec<FileChange>>,
    details: HashMap<(String, u64), MrDetails>,
    content: HashMap<(String, String, String), FileContent>,
    comments: HashMap<(String, u64, CommentKind), String>,
    approvals: HashMap<(String, u64), Option<String>>,
    resets: Vec<(String, u64)>,
    not_found_paths: Vec<(String, String, String)>,
}

/// Fixture-driven forge client. Seed it with `seed_*` calls, then hand it to
/// the assembler the same way a real client would be injected.
pub struct MockForgeClient {
    state: Mutex<MockState>,
    bot_username: String,
}

impl MockForgeClient {
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self { state: Mutex::new(MockState::default()), bot_username: bot_username.into() }
    }

    pub fn seed_changes(&self, project_id: &str, mr_iid: u64, changes: Vec<FileChange>) {
        self.state.lock().unwrap().changes.insert((project_id.to_string(), mr_iid), changes);
    }

    pub fn seed_details(&self, project_id: &str, mr_iid: u64, details: MrDetails) {
        self.state.lock().unwrap().details.insert((project_id.to_string(), mr_iid), details);
    }

    pub fn seed_content(&self, project_id: &str, path: &str, rev: &str, content: FileContent) {
        self.state
            .lock()
            .unwrap()
            .content
            .insert((project_id.to_string(), path.to_string(), rev.to_string()), content);
    }

    /// Marks a `(path, rev)` pair as deliberately absent, so `fetch_file_content`
    /// returns `ForgeError::NotFound` instead of a missing-fixture panic —
    /// used to exercise the "old side is new" warehouse-rule path.
    pub fn seed_not_found(&self, project_id: &str, path: &str, rev: &str) {
        self.state
            .lock()
            .unwrap()
            .not_found_paths
            .push((project_id.to_string(), path.to_string(), rev.to_string()));
    }

    pub fn posted_comment(&self, project_id: &str, mr_iid: u64, kind: CommentKind) -> Option<String> {
        self.state.lock().unwrap().comments.get(&(project_id.to_string(), mr_iid, kind)).cloned()
    }

    pub fn is_approved(&self, project_id: &str, mr_iid: u64) -> bool {
        self.state.lock().unwrap().approvals.contains_key(&(project_id.to_string(), mr_iid))
    }

    pub fn was_reset(&self, project_id: &str, mr_iid: u64) -> bool {
        self.state.lock().unwrap().resets.contains(&(project_id.to_string(), mr_iid))
    }
}

#[async_trait]
impl ForgeClient for MockForgeClient {
    async fn fetch_mr_changes(&self, project_id: &str, mr_iid: u64) -> Result<Vec<FileChange>, ForgeError> {
        self.state
            .lock()
            .unwrap()
            .changes
            .get(&(project_id.to_string(), mr_iid))
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("no changes fixture for MR {project_id}!{mr_iid}")))
    }

    async fn fetch_file_content(&self, project_id: &str, path: &str, rev: &str) -> Result<FileContent, ForgeError> {
        let key = (project_id.to_string(), path.to_string(), rev.to_string());
        let state = self.state.lock().unwrap();
        if state.not_found_paths.contains(&key) {
            return Err(ForgeError::NotFound(format!("{path} not found at {rev}")));
        }
        state
            .content
            .get(&key)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("no content fixture for {path} at {rev}")))
    }

    async fn get_mr_details(&self, project_id: &str, mr_iid: u64) -> Result<MrDetails, ForgeError> {
        self.state
            .lock()
            .unwrap()
            .details
            .get(&(project_id.to_string(), mr_iid))
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("no details fixture for MR {project_id}!{mr_iid}")))
    }

    async fn post_or_update_bot_comment(
        &self,
        project_id: &str,
        mr_iid: u64,
        body: &str,
        kind: CommentKind,
    ) -> Result<(), ForgeError> {
        self.state
            .lock()
            .unwrap()
            .comments
            .insert((project_id.to_string(), mr_iid, kind), body.to_string());
        Ok(())
    }

    async fn approve_mr(&self, project_id: &str, mr_iid: u64, message: Option<&str>) -> Result<(), ForgeError> {
        self.state
            .lock()
            .unwrap()
            .approvals
            .insert((project_id.to_string(), mr_iid), message.map(str::to_string));
        Ok(())
    }

    async fn reset_approval(&self, project_id: &str, mr_iid: u64) -> Result<(), ForgeError> {
        let mut state = self.state.lock().unwrap();
        state.approvals.remove(&(project_id.to_string(), mr_iid));
        state.resets.push((project_id.to_string(), mr_iid));
        Ok(())
    }

    fn bot_username(&self) -> &str {
        &self.bot_username
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use naysayer_core::FileChange;

    fn change(path: &str) -> FileChange {
        FileChange { old_path: None, new_path: path.to_string(), new_file: true, deleted_file: false, diff: String::new() }
    }

    #[tokio::test]
    async fn test_seeded_changes_round_trip() {
        let client = MockForgeClient::new("naysayer-bot");
        client.seed_changes("42", 7, vec![change("product.yaml")]);
        let changes = client.fetch_mr_changes("42", 7).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_path, "product.yaml");
    }

    #[tokio::test]
    async fn test_unseeded_changes_not_found() {
        let client = MockForgeClient::new("naysayer-bot");
        let err = client.fetch_mr_changes("42", 7).await.unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_seeded_not_found_path_returns_not_found() {
        let client = MockForgeClient::new("naysayer-bot");
        client.seed_not_found("42", "product.yaml", "main");
        let err = client.fetch_file_content("42", "product.yaml", "main").await.unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comment_replace_keeps_latest_only() {
        let client = MockForgeClient::new("naysayer-bot");
        client
            .post_or_update_bot_comment("42", 7, "first", CommentKind::RuleEvaluation)
            .await
            .unwrap();
        client
            .post_or_update_bot_comment("42", 7, "second", CommentKind::RuleEvaluation)
            .await
            .unwrap();
        assert_eq!(client.posted_comment("42", 7, CommentKind::RuleEvaluation), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_approve_then_reset() {
        let client = MockForgeClient::new("naysayer-bot");
        client.approve_mr("42", 7, Some("auto")).await.unwrap();
        assert!(client.is_approved("42", 7));
        client.reset_approval("42", 7).await.unwrap();
        assert!(!client.is_approved("42", 7));
        assert!(client.was_reset("42", 7));
    }

    #[test]
    fn test_is_bot_author_case_insensitive() {
        let client = MockForgeClient::new("naysayer-bot");
        assert!(client.is_bot_author(&UserRef { username: "Naysayer-Bot".to_string() }));
        assert!(!client.is_bot_author(&UserRef { username: "alice".to_string() }));
    }
}
