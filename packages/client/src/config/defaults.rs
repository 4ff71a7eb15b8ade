//! Process-wide configuration defaults.

use std::sync::OnceLock;

use super::{Config, Settings};
use crate::http::compression;

/// URL schemes a request may target.
pub const SCHEMES: [&str; 2] = ["http", "https"];

static DEFAULTS: OnceLock<Config> = OnceLock::new();

/// `User-Agent` sent unless a caller overrides it.
#[must_use]
pub fn default_user_agent() -> String {
    format!("courier/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// The process defaults, constructed once on first use.
    pub fn defaults() -> &'static Config {
        DEFAULTS.get_or_init(|| Config {
            settings: Settings {
                max_redirects: 30,
                max_retries: 0,
                pool_connections: 10,
                pool_maxsize: 10,
                keep_alive: true,
                strict_mode: false,
                danger_mode: false,
                safe_mode: false,
                trust_env: true,
                store_cookies: true,
                encode_uri: true,
                verbose: false,
            },
            base_headers: vec![
                ("User-Agent".to_string(), default_user_agent()),
                (
                    "Accept-Encoding".to_string(),
                    compression::SUPPORTED.join(", "),
                ),
                ("Accept".to_string(), "*/*".to_string()),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::defaults();
        assert_eq!(config.max_redirects(), 30);
        assert_eq!(config.max_retries(), 0);
        assert_eq!(config.pool_connections(), 10);
        assert_eq!(config.pool_maxsize(), 10);
        assert!(config.keep_alive());
        assert!(config.trust_env());
        assert!(config.store_cookies());
        assert!(!config.strict_mode());
        assert!(!config.danger_mode());
        assert!(!config.safe_mode());
    }

    #[test]
    fn test_default_headers_order() {
        let names: Vec<&str> = Config::defaults()
            .base_headers()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, ["User-Agent", "Accept-Encoding", "Accept"]);
        assert!(Config::defaults().base_headers()[0].1.starts_with("courier/"));
        assert_eq!(Config::defaults().base_headers()[1].1, "gzip, deflate, br");
    }
}
