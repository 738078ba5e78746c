//! Loads the `[]FileRuleConfig` list `rules.yaml` describes, and selects the
//! first enabled config matching a given changed file.

use crate::api::types::{CoreError, FileRuleConfig};
use crate::pattern;

/// The rule engine's default configuration, embedded at build time so the
/// binary runs without an external file present.
pub const DEFAULT_RULES: &str = include_str!("../config/rules.yaml");

#[derive(serde::Deserialize)]
struct RawRuleFile {
    file_rules: Vec<FileRuleConfig>,
}

pub fn parse_rules(yaml_str: &str) -> Result<Vec<FileRuleConfig>, CoreError> {
    let raw: RawRuleFile =
        serde_yml::from_str(yaml_str).map_err(|e| CoreError::Config(format!("rules.yaml parse error: {e}")))?;
    tracing::info!(file_rules = raw.file_rules.len(), "rule configuration loaded");
    Ok(raw.file_rules)
}

/// First enabled config whose `pathGlob` (and, if present, `filenameGlob`)
/// matches `file_path`. A file matching multiple configs uses the first
/// match only, in declaration order.
pub fn select_config<'a>(configs: &'a [FileRuleConfig], file_path: &str) -> Option<&'a FileRuleConfig> {
    let basename = file_path.rsplit('/').next().unwrap_or(file_path);
    configs.iter().find(|c| {
        c.enabled
            && pattern::matches(file_path, &c.path_glob)
            && match c.filename_glob.as_deref() {
                Some(glob) => pattern::matches(basename, glob),
                None => true,
            }
    })
}
