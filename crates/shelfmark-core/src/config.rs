//! Configuration for the metadata resolution pipeline.
//!
//! Configuration is stored in TOML format at the platform config directory
//! and loaded with sensible defaults when no file exists. The outbound proxy
//! defaults from the system `http_proxy`/`HTTP_PROXY` environment (format
//! `host:port`) when the file does not pin one.
//!
//! ```toml
//! [search]
//! product_url = "http://www.amazon.com"
//! reference_url = "http://www.shelfari.com"
//! timeout_secs = 30
//!
//! [proxy]
//! host = "proxy.example.com"
//! port = 8080
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Browser user agent sent with identifier searches.
///
/// The identifier search service serves a different (unparseable) page to
/// non-browser agents, so the fixed desktop Firefox string is the default.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; WOW64; rv:46.0) Gecko/20100101 Firefox/46.0";

/// Global configuration for shelfmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Settings for the two outbound search services.
    #[serde(default)]
    pub search: SearchConfig,

    /// Optional HTTP proxy both connections tunnel through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

/// Settings for the outbound search services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the product-identifier search service.
    #[serde(default = "default_product_url")]
    pub product_url: String,

    /// Base URL of the reference-page search service.
    #[serde(default = "default_reference_url")]
    pub reference_url: String,

    /// User agent for identifier searches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bound on each request, in seconds.
    ///
    /// The original tooling configured no timeout and could hang a whole
    /// session on a stalled read; a bounded timeout is deliberate hardening.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// An HTTP proxy address in `host:port` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy host name or address.
    pub host: String,
    /// Proxy port.
    pub port: u16,
}

fn default_product_url() -> String {
    "http://www.amazon.com".to_string()
}

fn default_reference_url() -> String {
    "http://www.shelfari.com".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            product_url: default_product_url(),
            reference_url: default_reference_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            proxy: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location or create with defaults.
    ///
    /// A missing file yields defaults; a malformed file is an error. When
    /// the file does not pin a proxy, the system proxy environment is
    /// consulted.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Self::default()
        };

        if config.proxy.is_none() {
            config.proxy = ProxyConfig::from_env();
        }

        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        let parent = config_path
            .parent()
            .ok_or_else(|| Error::Config("Invalid config path".into()))?;

        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("dev", "shelfmark", "shelfmark")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }
}

impl ProxyConfig {
    /// Read the proxy from `http_proxy` / `HTTP_PROXY`, if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let raw = std::env::var("http_proxy")
            .or_else(|_| std::env::var("HTTP_PROXY"))
            .ok()?;
        Self::parse(&raw)
    }

    /// Parse a `host:port` proxy address, tolerating a scheme prefix.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw
            .trim()
            .trim_start_matches("http://")
            .trim_end_matches('/');
        let (host, port) = trimmed.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        let port = port.parse::<u16>().ok()?;
        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Render the address for `reqwest::Proxy`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_live_services() {
        let config = Config::default();
        assert_eq!(config.search.product_url, "http://www.amazon.com");
        assert_eq!(config.search.reference_url, "http://www.shelfari.com");
        assert_eq!(config.search.timeout_secs, 30);
        assert!(config.search.user_agent.starts_with("Mozilla/5.0"));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [search]
            product_url = "http://127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.search.product_url, "http://127.0.0.1:9000");
        assert_eq!(config.search.reference_url, "http://www.shelfari.com");
        assert_eq!(config.search.timeout_secs, 30);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.proxy = Some(ProxyConfig {
            host: "proxy.example.com".into(),
            port: 8080,
        });

        let rendered = toml::to_string_pretty(&config).unwrap();
        let reloaded: Config = toml::from_str(&rendered).unwrap();

        assert_eq!(reloaded.search.product_url, config.search.product_url);
        assert_eq!(reloaded.proxy, config.proxy);
    }

    #[test]
    fn proxy_parse_accepts_host_port() {
        let proxy = ProxyConfig::parse("proxy.example.com:3128").unwrap();
        assert_eq!(proxy.host, "proxy.example.com");
        assert_eq!(proxy.port, 3128);
        assert_eq!(proxy.url(), "http://proxy.example.com:3128");
    }

    #[test]
    fn proxy_parse_tolerates_scheme_prefix() {
        let proxy = ProxyConfig::parse("http://10.0.0.1:8080/").unwrap();
        assert_eq!(proxy.host, "10.0.0.1");
        assert_eq!(proxy.port, 8080);
    }

    #[test]
    fn proxy_parse_rejects_garbage() {
        assert!(ProxyConfig::parse("").is_none());
        assert!(ProxyConfig::parse("no-port").is_none());
        assert!(ProxyConfig::parse(":8080").is_none());
        assert!(ProxyConfig::parse("host:notaport").is_none());
    }
}
