//! Forge client interface: the hosted Git platform surface the rule engine
//! consumes (fetch changes/content/details, post comments, approve/reset).
//! No real HTTP client lives here — only the trait and an in-memory mock
//! for tests and local dry-runs.

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::ForgeError;
pub use mock::MockForgeClient;
pub use traits::ForgeClient;
pub use types::{CommentKind, ContentEncoding, FileChange, FileContent, MrDetails, UserRef};
