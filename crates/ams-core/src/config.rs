//! Manager configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default manager socket path.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/ams.sock";

/// Default bundle name of the native launcher ability.
pub const DEFAULT_LAUNCHER_BUNDLE: &str = "com.ams.launcher";

/// Depth of the manager's request inbox. Small and bounded: the inbox
/// serializes every mutation of the ability list and stack.
pub const DEFAULT_INBOX_DEPTH: usize = 32;

/// Depth of each per-application command queue.
pub const DEFAULT_APP_QUEUE_DEPTH: usize = 8;

/// Manager configuration, assembled once at startup.
#[derive(Debug, Clone)]
pub struct AmsConfig {
    /// Unix socket the IPC front end binds and clients discover.
    pub socket_path: PathBuf,
    /// Bundle name owned by the launcher record.
    pub launcher_bundle: String,
    /// Manager inbox depth.
    pub inbox_depth: usize,
    /// Per-application queue depth.
    pub app_queue_depth: usize,
    /// When set, the launcher's payload is cleared once the first time it
    /// confirms background behind a foreground application.
    pub clean_ability_data: bool,
    /// Client discovery retry ceiling.
    pub discovery_retries: u32,
    /// Sleep between client discovery attempts.
    pub discovery_retry_interval: Duration,
}

impl Default for AmsConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            launcher_bundle: DEFAULT_LAUNCHER_BUNDLE.to_string(),
            inbox_depth: DEFAULT_INBOX_DEPTH,
            app_queue_depth: DEFAULT_APP_QUEUE_DEPTH,
            clean_ability_data: false,
            discovery_retries: 10,
            discovery_retry_interval: Duration::from_millis(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AmsConfig::default();
        assert_eq!(config.launcher_bundle, DEFAULT_LAUNCHER_BUNDLE);
        assert_eq!(config.inbox_depth, DEFAULT_INBOX_DEPTH);
        assert!(!config.clean_ability_data);
    }
}
