use async_trait::async_trait;

use crate::error::ForgeError;
use crate::types::{CommentKind, FileChange, FileContent, MrDetails, UserRef};

/// The hosted Git platform's surface this system consumes. No real HTTP
/// implementation lives in this crate — the production client is a separate
/// concern; this trait plus [`crate::mock::MockForgeClient`] are what the
/// rule engine is built and tested against.
///
/// Retries for transient 5xx/429 responses are the implementation's
/// responsibility; the core treats every `ForgeClient` as an oracle and
/// never retries itself.
#[async_trait]
pub trait ForgeClient: Send + Sync {
    /// The file changes (paths, diffs, new/deleted flags) for one MR.
    async fn fetch_mr_changes(&self, project_id: &str, mr_iid: u64) -> Result<Vec<FileChange>, ForgeError>;

    /// File content at a given ref (a branch name or commit SHA).
    async fn fetch_file_content(&self, project_id: &str, path: &str, rev: &str) -> Result<FileContent, ForgeError>;

    /// MR-wide metadata not carried on individual file changes.
    async fn get_mr_details(&self, project_id: &str, mr_iid: u64) -> Result<MrDetails, ForgeError>;

    /// Creates or replaces the bot's one comment of this `kind` on the MR.
    async fn post_or_update_bot_comment(
        &self,
        project_id: &str,
        mr_iid: u64,
        body: &str,
        kind: CommentKind,
    ) -> Result<(), ForgeError>;

    /// Approves the MR on the gating approver's behalf.
    async fn approve_mr(&self, project_id: &str, mr_iid: u64, message: Option<&str>) -> Result<(), ForgeError>;

    /// Withdraws a prior bot approval (e.g. on a later manual_review push).
    async fn reset_approval(&self, project_id: &str, mr_iid: u64) -> Result<(), ForgeError>;

    /// True when `user` is the bot's own identity, so the assembler can
    /// ignore its own comments and approvals.
    fn is_bot_author(&self, user: &UserRef) -> bool {
        user.username.eq_ignore_ascii_case(self.bot_username())
    }

    /// The bot's username on this forge.
    fn bot_username(&self) -> &str;
}
