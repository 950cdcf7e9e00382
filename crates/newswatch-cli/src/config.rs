use std::path::Path;

use anyhow::{Context, Result, bail};
use newswatch_client::adapters::{adapter_by_name, known_adapters};
use newswatch_core::models::{FetchMode, Source};
use serde::Deserialize;
use url::Url;

/// Top-level run configuration, loaded from a JSON file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Seconds between monitoring cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// How many sources may be polled at the same time within a cycle.
    #[serde(default = "default_max_concurrent_sources")]
    pub max_concurrent_sources: usize,

    /// Per-request timeout for HTTP and rendered fetches.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Maximum number of browser tabs open at once.
    #[serde(default = "default_browser_pool_size")]
    pub browser_pool_size: usize,

    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub name: String,
    pub landing_url: String,
    pub base_url: String,
    /// Adapter registry key, e.g. "verge" or "techcrunch".
    pub adapter: String,
    #[serde(default = "default_landing_mode")]
    pub landing_mode: FetchMode,
    #[serde(default = "default_article_mode")]
    pub article_mode: FetchMode,
}

fn default_interval_secs() -> u64 {
    300
}

fn default_max_concurrent_sources() -> usize {
    4
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_browser_pool_size() -> usize {
    2
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: FileConfig =
            serde_json::from_str(&raw).context("Invalid JSON in config file")?;
        if config.sources.is_empty() {
            bail!("Config defines no sources");
        }
        Ok(config)
    }

    /// Resolve every entry into a runnable [`Source`], validating adapter
    /// names and base URLs up front so a bad config fails at startup.
    pub fn build_sources(&self) -> Result<Vec<Source>> {
        self.sources.iter().map(SourceEntry::build).collect()
    }
}

impl SourceEntry {
    fn build(&self) -> Result<Source> {
        let adapter = adapter_by_name(&self.adapter).with_context(|| {
            format!(
                "Unknown adapter '{}' for source '{}' (known: {})",
                self.adapter,
                self.name,
                known_adapters().join(", ")
            )
        })?;
        let base_url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url for source '{}'", self.name))?;
        Ok(
            Source::new(&self.name, &self.landing_url, base_url, adapter)
                .with_landing_mode(self.landing_mode)
                .with_article_mode(self.article_mode),
        )
    }
}

fn default_landing_mode() -> FetchMode {
    FetchMode::Rendered
}

fn default_article_mode() -> FetchMode {
    FetchMode::Static
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "sources": [
            {
                "name": "verge",
                "landing_url": "https://www.theverge.com/tech",
                "base_url": "https://www.theverge.com",
                "adapter": "verge"
            }
        ]
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: FileConfig = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(config.interval_secs, 300);
        assert_eq!(config.max_concurrent_sources, 4);
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.browser_pool_size, 2);

        let sources = config.build_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "verge");
        assert_eq!(sources[0].landing_mode, FetchMode::Rendered);
        assert_eq!(sources[0].article_mode, FetchMode::Static);
    }

    #[test]
    fn modes_can_be_overridden_per_source() {
        let raw = r#"{
            "interval_secs": 30,
            "sources": [
                {
                    "name": "techcrunch",
                    "landing_url": "https://techcrunch.com/",
                    "base_url": "https://techcrunch.com",
                    "adapter": "techcrunch",
                    "landing_mode": "static",
                    "article_mode": "rendered"
                }
            ]
        }"#;
        let config: FileConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.interval_secs, 30);

        let sources = config.build_sources().unwrap();
        assert_eq!(sources[0].landing_mode, FetchMode::Static);
        assert_eq!(sources[0].article_mode, FetchMode::Rendered);
    }

    #[test]
    fn unknown_adapter_is_rejected_with_candidates() {
        let raw = r#"{
            "sources": [
                {
                    "name": "x",
                    "landing_url": "https://x.test/",
                    "base_url": "https://x.test",
                    "adapter": "nope"
                }
            ]
        }"#;
        let config: FileConfig = serde_json::from_str(raw).unwrap();
        let err = config.build_sources().unwrap_err().to_string();
        assert!(err.contains("Unknown adapter 'nope'"));
        assert!(err.contains("verge"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let raw = r#"{
            "sources": [
                {
                    "name": "x",
                    "landing_url": "https://x.test/",
                    "base_url": "not a url",
                    "adapter": "verge"
                }
            ]
        }"#;
        let config: FileConfig = serde_json::from_str(raw).unwrap();
        assert!(config.build_sources().is_err());
    }

    #[test]
    fn load_rejects_empty_source_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"sources": []}"#).unwrap();
        let err = FileConfig::load(&path).unwrap_err().to_string();
        assert!(err.contains("no sources"));
    }
}
