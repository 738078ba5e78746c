use serde::{Deserialize, Serialize};

pub use naysayer_core::FileChange;

/// Transport encoding of fetched file content. A hosted forge typically
/// returns base64 for binary-safety; the core decodes it transparently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentEncoding {
    Text,
    Base64,
}

/// Raw response from `fetchFileContent`, before decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub content: String,
    pub encoding: ContentEncoding,
}

impl FileContent {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), encoding: ContentEncoding::Text }
    }

    pub fn base64(raw: impl AsRef<[u8]>) -> Self {
        use base64::Engine;
        Self {
            content: base64::engine::general_purpose::STANDARD.encode(raw),
            encoding: ContentEncoding::Base64,
        }
    }

    /// Decode to a UTF-8 string regardless of wire encoding.
    pub fn decode(&self) -> Result<String, crate::error::ForgeError> {
        match self.encoding {
            ContentEncoding::Text => Ok(self.content.clone()),
            ContentEncoding::Base64 => {
                use base64::Engine;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(&self.content)
                    .map_err(|e| crate::error::ForgeError::Transport(format!("invalid base64 content: {e}")))?;
                String::from_utf8(bytes)
                    .map_err(|e| crate::error::ForgeError::Transport(format!("non-UTF8 file content: {e}")))
            }
        }
    }
}

/// MR-wide fields not tied to an individual file change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MrDetails {
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    pub author: String,
}

/// Distinguishes the bot's own comment threads so
/// `postOrUpdateBotComment` can find and replace the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    RuleEvaluation,
}

impl CommentKind {
    pub fn marker(&self) -> &'static str {
        match self {
            CommentKind::RuleEvaluation => "<!-- naysayer:rule-evaluation -->",
        }
    }
}

/// A user reference as it appears on comments/approvals/events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub username: String,
}
