use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::MenuSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub menu: MenuSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Base URL of the hosted store, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempt one-shot schema provisioning when a probe reports the
    /// keywords relation missing.
    #[serde(default = "default_auto_provision")]
    pub auto_provision: bool,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_auto_provision() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalConfig {
    /// Where the serialized cache snapshot lives between sessions.
    pub snapshot_path: PathBuf,
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: bool,
}

fn default_bootstrap_samples() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlConfig {
    #[serde(default = "default_max_keywords_per_site")]
    pub max_keywords_per_site: usize,
    /// Keywords strictly older than this many days are eligible for purge.
    #[serde(default = "default_purge_after_days")]
    pub purge_after_days: i64,
}

fn default_max_keywords_per_site() -> usize {
    20
}
fn default_purge_after_days() -> i64 {
    90
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_keywords_per_site: default_max_keywords_per_site(),
            purge_after_days: default_purge_after_days(),
        }
    }
}

impl Config {
    /// A configuration suitable for tests: in-memory-ish snapshot path,
    /// unreachable remote, short timeout.
    pub fn minimal() -> Self {
        Self {
            remote: RemoteConfig {
                url: "http://127.0.0.1:1".to_string(),
                api_key: "test".to_string(),
                timeout_secs: 1,
                auto_provision: false,
            },
            local: LocalConfig {
                snapshot_path: std::env::temp_dir().join("trendsync-snapshot.json"),
                bootstrap_samples: false,
            },
            crawl: CrawlConfig::default(),
            menu: MenuSettings::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.remote.url.trim().is_empty() {
        anyhow::bail!("remote.url must not be empty");
    }
    if !config.remote.url.starts_with("http://") && !config.remote.url.starts_with("https://") {
        anyhow::bail!("remote.url must be an http(s) URL");
    }
    if config.remote.timeout_secs == 0 {
        anyhow::bail!("remote.timeout_secs must be > 0");
    }
    if config.crawl.max_keywords_per_site == 0 {
        anyhow::bail!("crawl.max_keywords_per_site must be > 0");
    }
    if config.crawl.purge_after_days < 1 {
        anyhow::bail!("crawl.purge_after_days must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trendsync.toml");
        std::fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn menu_toggles_default_to_enabled() {
        let (_dir, path) = write_config(
            r#"
[remote]
url = "https://example.supabase.co"
api_key = "anon"

[local]
snapshot_path = "/tmp/snap.json"

[menu]
show_share_tab = false
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert!(cfg.menu.show_keywords_tab);
        assert!(cfg.menu.show_trends_tab);
        assert!(!cfg.menu.show_share_tab);
        assert_eq!(cfg.remote.timeout_secs, 10);
        assert!(cfg.remote.auto_provision);
    }

    #[test]
    fn zero_timeout_rejected() {
        let (_dir, path) = write_config(
            r#"
[remote]
url = "https://example.supabase.co"
api_key = "anon"
timeout_secs = 0

[local]
snapshot_path = "/tmp/snap.json"
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn non_http_url_rejected() {
        let (_dir, path) = write_config(
            r#"
[remote]
url = "postgres://example"
api_key = "anon"

[local]
snapshot_path = "/tmp/snap.json"
"#,
        );
        assert!(load_config(&path).is_err());
    }
}
