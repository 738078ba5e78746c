use std::path::PathBuf;
use std::time::Duration;

/// Process configuration loaded from environment variables, with CLI flags
/// taking precedence where both exist.
#[derive(Debug, Clone)]
pub struct NaysayerConfig {
    pub host: String,
    pub port: u16,
    pub rules_path: Option<PathBuf>,
    pub forge_timeout: Duration,
    pub max_concurrent_files: usize,
    pub bot_username: String,
}

impl NaysayerConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("NAYSAYER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("NAYSAYER_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080),
            rules_path: std::env::var("NAYSAYER_RULES_PATH").ok().map(PathBuf::from),
            forge_timeout: Duration::from_secs(
                std::env::var("NAYSAYER_FORGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_concurrent_files: std::env::var("NAYSAYER_MAX_CONCURRENT_FILES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8),
            bot_username: std::env::var("NAYSAYER_BOT_USERNAME").unwrap_or_else(|_| "naysayer-bot".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_unset() {
        std::env::remove_var("NAYSAYER_PORT");
        std::env::remove_var("NAYSAYER_HOST");
        let config = NaysayerConfig::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_concurrent_files, 8);
        assert_eq!(config.forge_timeout, Duration::from_secs(30));
    }
}
