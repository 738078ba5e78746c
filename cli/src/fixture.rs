//! Loads a local JSON fixture describing a merge request and seeds a
//! `MockForgeClient` from it, for the `evaluate` subcommand's dry-run mode.

use naysayer_core::FileChange;
use naysayer_forge::mock::MockForgeClient;
use naysayer_forge::types::{FileContent, MrDetails};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub project_id: String,
    pub mr_iid: u64,
    pub details: MrDetails,
    #[serde(default)]
    pub changes: Vec<FileChange>,
    #[serde(default)]
    pub contents: Vec<ContentFixture>,
    #[serde(default)]
    pub not_found: Vec<NotFoundFixture>,
}

#[derive(Debug, Deserialize)]
pub struct ContentFixture {
    pub path: String,
    pub rev: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct NotFoundFixture {
    pub path: String,
    pub rev: String,
}

impl Fixture {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&raw)?;
        Ok(fixture)
    }

    pub fn seed(&self, client: &MockForgeClient) {
        client.seed_details(&self.project_id, self.mr_iid, self.details.clone());
        client.seed_changes(&self.project_id, self.mr_iid, self.changes.clone());
        for content in &self.contents {
            client.seed_content(&self.project_id, &content.path, &content.rev, FileContent::text(&content.text));
        }
        for nf in &self.not_found {
            client.seed_not_found(&self.project_id, &nf.path, &nf.rev);
        }
    }
}
