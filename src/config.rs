//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top of it key
//! by key, so a config file only needs the values it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! endpoint = "https://your-repository.cdn.prismic.io/api/v2"
//! # access_token = "..."       # Only for private repositories
//! document_type = "posts"      # Custom type holding the articles
//! page_size = 1                # Posts per listing page (1-100)
//! max_pages = 100              # Stop following cursors after this many pages
//! timeout_secs = 10            # Per-request timeout
//!
//! [site]
//! title = "spacetraveling"
//! lang = "pt-BR"
//! load_more_label = "Carregar mais posts"
//! loading_label = "Carregando..."
//! not_found_label = "Post não encontrado"
//!
//! [colors]
//! background = "#1a1d23"
//! heading = "#f8f8f8"
//! body = "#d7d7d7"
//! info = "#bbbbbb"
//! highlight = "#ff57b2"
//! ```
//!
//! ## Credentials From The Environment
//!
//! `PRISMIC_API_ENDPOINT` and `PRISMIC_ACCESS_TOKEN` override
//! `source.endpoint` and `source.access_token`, so tokens never have to be
//! committed. A `.env` file in the working directory is honoured.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ENV_API_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// The content API caps search pages at 100 documents.
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where and how to read content.
    pub source: SourceConfig,
    /// Titles and user-facing labels.
    pub site: SiteInfo,
    /// Color palette emitted as CSS custom properties.
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.document_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source.document_type must not be empty".into(),
            ));
        }
        if self.source.page_size == 0 || self.source.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Validation(format!(
                "source.page_size must be 1-{MAX_PAGE_SIZE}"
            )));
        }
        if self.source.max_pages == 0 {
            return Err(ConfigError::Validation(
                "source.max_pages must be at least 1".into(),
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "source.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Apply credential overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENV_API_ENDPOINT).filter(|v| !v.is_empty()) {
            self.source.endpoint = endpoint;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            self.source.access_token = Some(token);
        }
    }
}

/// Content API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`.
    pub endpoint: String,
    /// Access token for private repositories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Custom type of the article documents.
    pub document_type: String,
    /// Posts per listing page.
    pub page_size: u32,
    /// Upper bound on listing pages followed in one build.
    pub max_pages: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://your-repository.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 1,
            max_pages: 100,
            timeout_secs: 10,
        }
    }
}

/// Site identity and labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Site name, shown as the header logo and the listing page title.
    pub title: String,
    /// `lang` attribute of every page.
    pub lang: String,
    pub load_more_label: String,
    pub loading_label: String,
    pub not_found_label: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            lang: "pt-BR".to_string(),
            load_more_label: "Carregar mais posts".to_string(),
            loading_label: "Carregando...".to_string(),
            not_found_label: "Post não encontrado".to_string(),
        }
    }
}

/// Site palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Page background.
    pub background: String,
    /// Titles and headings.
    pub heading: String,
    /// Body text.
    pub body: String,
    /// Dates, authors, reading time.
    pub info: String,
    /// Links, buttons and the logo accent.
    pub highlight: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: "#1a1d23".to_string(),
            heading: "#f8f8f8".to_string(),
            body: "#d7d7d7".to_string(),
            info: "#bbbbbb".to_string(),
            highlight: "#ff57b2".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys, and
/// validates the result. Environment overrides are applied by the caller.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# headless-blog configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content source
# ---------------------------------------------------------------------------
[source]
# Root of the content API. Overridden by PRISMIC_API_ENDPOINT.
endpoint = "https://your-repository.cdn.prismic.io/api/v2"

# Access token for private repositories. Prefer PRISMIC_ACCESS_TOKEN.
# access_token = ""

# Custom type holding the articles.
document_type = "posts"

# Posts per listing page; each further page is loaded by the
# "load more" button. The API allows 1-100.
page_size = 1

# Stop following "next page" cursors after this many pages.
max_pages = 100

# Timeout for each request to the content API, in seconds.
timeout_secs = 10

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "spacetraveling"
lang = "pt-BR"
load_more_label = "Carregar mais posts"
loading_label = "Carregando..."
not_found_label = "Post não encontrado"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
background = "#1a1d23"
heading = "#f8f8f8"    # Titles and headings
body = "#d7d7d7"       # Article text
info = "#bbbbbb"       # Dates, authors, reading time
highlight = "#ff57b2"  # Links, buttons, logo accent
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {background};
    --color-heading: {heading};
    --color-body: {body};
    --color-info: {info};
    --color-highlight: {highlight};
}}"#,
        background = colors.background,
        heading = colors.heading,
        body = colors.body,
        info = colors.info,
        highlight = colors.highlight,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.source.document_type, "posts");
        assert_eq!(config.source.page_size, 1);
        assert_eq!(config.source.timeout_secs, 10);
        assert_eq!(config.site.lang, "pt-BR");
        assert_eq!(config.colors.highlight, "#ff57b2");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[source]
page_size = 5
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.source.page_size, 5);
        // Defaults preserved
        assert_eq!(config.source.document_type, "posts");
        assert_eq!(config.site.title, "spacetraveling");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[source]
endpoint = "https://blog.cdn.prismic.io/api/v2"
page_size = 20

[colors]
highlight = "#00ff00"
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.source.endpoint, "https://blog.cdn.prismic.io/api/v2");
        assert_eq!(config.source.page_size, 20);
        assert_eq!(config.colors.highlight, "#00ff00");
        assert_eq!(config.colors.background, "#1a1d23");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[source]\npagesize = 3\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[themes]\nx = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_page_size_bounds() {
        let mut config = SiteConfig::default();
        config.source.page_size = 100;
        assert!(config.validate().is_ok());
        config.source.page_size = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.source.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_timeout() {
        let mut config = SiteConfig::default();
        config.source.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_max_pages() {
        let mut config = SiteConfig::default();
        config.source.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_document_type() {
        let mut config = SiteConfig::default();
        config.source.document_type = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[source]\npage_size = 500\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[source]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[source]\ny = 5\nz = 6").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["source"]["x"].as_integer(), Some(1));
        assert_eq!(merged["source"]["y"].as_integer(), Some(5));
        assert_eq!(merged["source"]["z"].as_integer(), Some(6));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn env_overrides_credentials() {
        let env: HashMap<&str, &str> = [
            (ENV_API_ENDPOINT, "https://env.cdn.prismic.io/api/v2"),
            (ENV_ACCESS_TOKEN, "token-123"),
        ]
        .into();
        let mut config = SiteConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.source.endpoint, "https://env.cdn.prismic.io/api/v2");
        assert_eq!(config.source.access_token.as_deref(), Some("token-123"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = SiteConfig::default();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn color_css_has_all_variables() {
        let css = generate_color_css(&ColorConfig::default());
        for var in [
            "--color-bg: #1a1d23",
            "--color-heading: #f8f8f8",
            "--color-body: #d7d7d7",
            "--color-info: #bbbbbb",
            "--color-highlight: #ff57b2",
        ] {
            assert!(css.contains(var), "missing {var}");
        }
    }
}
