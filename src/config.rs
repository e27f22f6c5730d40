//! TOML configuration parsing and validation.
//!
//! Only `[db]` is required; every other section falls back to defaults.
//!
//! ```toml
//! [db]
//! path = "./data/papers.sqlite"
//!
//! [legacy]
//! path = "./data/papers.json"
//!
//! [segmenter]
//! line_threshold = 5.0
//! default_title = "Introduction"
//! title_max_chars = 100
//!
//! [summarizer]
//! base_url = "https://summarizer.example"
//! timeout_secs = 120
//! max_document_chars = 16000
//! ```

use anyhow::{Context, Result};
use paper_digest_core::segment::{
    SegmenterOptions, DEFAULT_LINE_THRESHOLD, DEFAULT_SECTION_TITLE, DEFAULT_TITLE_MAX_CHARS,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub legacy: LegacyConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Location of the legacy flat collection, migrated on startup.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LegacyConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SegmenterConfig {
    #[serde(default = "default_line_threshold")]
    pub line_threshold: f64,
    #[serde(default = "default_section_title")]
    pub default_title: String,
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            line_threshold: DEFAULT_LINE_THRESHOLD,
            default_title: DEFAULT_SECTION_TITLE.to_string(),
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
        }
    }
}

impl SegmenterConfig {
    pub fn options(&self) -> SegmenterOptions {
        SegmenterOptions {
            line_threshold: self.line_threshold,
            default_title: self.default_title.clone(),
            title_max_chars: self.title_max_chars,
        }
    }
}

fn default_line_threshold() -> f64 {
    DEFAULT_LINE_THRESHOLD
}
fn default_section_title() -> String {
    DEFAULT_SECTION_TITLE.to_string()
}
fn default_title_max_chars() -> usize {
    DEFAULT_TITLE_MAX_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    /// Base URL of the summarization service. Summarize commands fail
    /// with a configuration error while this is unset.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 120,
            max_document_chars: 16_000,
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_max_document_chars() -> usize {
    16_000
}

impl Config {
    /// All-defaults configuration with the database at `./data/papers.sqlite`.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/papers.sqlite"),
            },
            legacy: LegacyConfig::default(),
            segmenter: SegmenterConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(config.segmenter.line_threshold > 0.0) {
        anyhow::bail!("segmenter.line_threshold must be > 0");
    }
    if config.segmenter.title_max_chars == 0 {
        anyhow::bail!("segmenter.title_max_chars must be > 0");
    }
    if config.summarizer.max_document_chars == 0 {
        anyhow::bail!("summarizer.max_document_chars must be > 0");
    }
    if let Some(url) = &config.summarizer.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!(
                "summarizer.base_url must start with http:// or https://, got '{}'",
                url
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Config> {
        let config: Config = toml::from_str(s)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let cfg = parse("[db]\npath = \"papers.sqlite\"\n").unwrap();
        assert_eq!(cfg.segmenter.line_threshold, 5.0);
        assert_eq!(cfg.segmenter.default_title, "Introduction");
        assert_eq!(cfg.summarizer.max_document_chars, 16_000);
        assert!(cfg.summarizer.base_url.is_none());
        assert!(cfg.legacy.path.is_none());
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let err = parse("[db]\npath = \"p\"\n[segmenter]\nline_threshold = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("line_threshold"));
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = parse("[db]\npath = \"p\"\n[summarizer]\nbase_url = \"ftp://x\"\n").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn missing_db_section_fails() {
        assert!(parse("[segmenter]\nline_threshold = 3.0\n").is_err());
    }
}
