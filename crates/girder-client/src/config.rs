//! Endpoint configuration. Environment variables override the localhost
//! defaults the original deployment shipped with.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Agent gateway WebSocket endpoint, e.g. `ws://127.0.0.1:8765`.
    pub gateway_url: String,
    /// File-store / config REST base URL, e.g. `http://127.0.0.1:8766`.
    pub files_base_url: String,
    /// Directory for the durable task archive.
    pub archive_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: "ws://127.0.0.1:8765".to_string(),
            files_base_url: "http://127.0.0.1:8766".to_string(),
            archive_dir: PathBuf::from(".girder"),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `GIRDER_GATEWAY_URL`, `GIRDER_FILES_URL`,
    /// and `GIRDER_ARCHIVE_DIR` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GIRDER_GATEWAY_URL") {
            if !url.is_empty() {
                config.gateway_url = url;
            }
        }
        if let Ok(url) = std::env::var("GIRDER_FILES_URL") {
            if !url.is_empty() {
                config.files_base_url = url;
            }
        }
        if let Ok(dir) = std::env::var("GIRDER_ARCHIVE_DIR") {
            if !dir.is_empty() {
                config.archive_dir = PathBuf::from(dir);
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_fall_back_to_defaults() {
        std::env::remove_var("GIRDER_GATEWAY_URL");
        std::env::set_var("GIRDER_FILES_URL", "http://files.internal:9000");
        let config = ClientConfig::from_env();
        assert_eq!(config.gateway_url, ClientConfig::default().gateway_url);
        assert_eq!(config.files_base_url, "http://files.internal:9000");
        std::env::remove_var("GIRDER_FILES_URL");
    }
}
