//! Application configuration for pubtrace.
//!
//! User config lives at `~/.pubtrace/pubtrace.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PubtraceError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pubtrace.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pubtrace";

// ---------------------------------------------------------------------------
// Config structs (matching pubtrace.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seed catalog and output locations.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// HTTP client settings shared by every fetch.
    #[serde(default)]
    pub http: HttpConfig,

    /// Orchestrator settings.
    #[serde(default)]
    pub enrich: EnrichConfig,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Seed catalog location: an `http(s)` URL or a local file path.
    #[serde(default = "default_seed")]
    pub seed: String,

    /// Path the enriched catalog is written to.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            output: default_output(),
        }
    }
}

fn default_seed() -> String {
    "https://raw.githubusercontent.com/samapriya/awesome-gee-community-datasets/refs/heads/master/community_datasets.json".into()
}
fn default_output() -> String {
    "community_datasets_with_publications.json".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum number of redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
}
fn default_max_redirects() -> usize {
    5
}

/// `[enrich]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Record field holding the documentation page URL.
    #[serde(default = "default_docs_field")]
    pub docs_field: String,

    /// Records processed concurrently. `1` means a strictly sequential pass.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            docs_field: default_docs_field(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_docs_field() -> String {
    "docs".into()
}
fn default_concurrency() -> usize {
    1
}

impl AppConfig {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.seed.trim().is_empty() {
            return Err(PubtraceError::config("catalog.seed must not be empty"));
        }
        if self.catalog.output.trim().is_empty() {
            return Err(PubtraceError::config("catalog.output must not be empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(PubtraceError::config(
                "http.timeout_secs must be greater than zero",
            ));
        }
        if self.enrich.concurrency == 0 {
            return Err(PubtraceError::config(
                "enrich.concurrency must be greater than zero",
            ));
        }
        if self.enrich.docs_field.is_empty() {
            return Err(PubtraceError::config("enrich.docs_field must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pubtrace/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PubtraceError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pubtrace/pubtrace.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PubtraceError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PubtraceError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PubtraceError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PubtraceError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PubtraceError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("community_datasets.json"));
        assert!(toml_str.contains("timeout_secs = 15"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.http.timeout_secs, 15);
        assert_eq!(parsed.enrich.docs_field, "docs");
        assert_eq!(parsed.enrich.concurrency, 1);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[catalog]
seed = "/data/seed.json"

[enrich]
concurrency = 8
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.catalog.seed, "/data/seed.json");
        assert_eq!(config.catalog.output, "community_datasets_with_publications.json");
        assert_eq!(config.enrich.concurrency, 8);
        assert_eq!(config.enrich.docs_field, "docs");
        assert_eq!(config.http.max_redirects, 5);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.http.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.enrich.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("pubtrace-definitely-missing.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, PubtraceError::Io { .. }));
    }
}
