//! Configuration management for raiz.
//!
//! Loads configuration from ${RAIZ_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments/sections from the template stay present while the user's
/// values win.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for raiz configuration and data directories.
    //!
    //! RAIZ_HOME resolution order:
    //! 1. RAIZ_HOME environment variable (if set)
    //! 2. ~/.config/raiz (default)

    use std::path::PathBuf;

    /// Returns the raiz home directory.
    ///
    /// Falls back to `./.raiz` when no home directory is known.
    pub fn raiz_home() -> PathBuf {
        if let Ok(home) = std::env::var("RAIZ_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".raiz"),
            |h| h.join(".config").join("raiz"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        raiz_home().join("config.toml")
    }
}

/// Image loading knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Per-attempt timeout in seconds
    pub load_timeout_secs: u64,
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Linear backoff unit in milliseconds
    pub backoff_base_ms: u64,
    /// Debounce before the automatic preload, in milliseconds
    pub preload_delay_ms: u64,
    /// Server-relative prefixes that only need the origin prepended
    pub upload_prefixes: Vec<String>,
    /// Per-plant upload directory used for bare filenames
    pub upload_dir: String,
}

impl ImagesConfig {
    const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_MAX_RETRIES: u32 = 2;
    const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
    const DEFAULT_PRELOAD_DELAY_MS: u64 = 100;
    const DEFAULT_UPLOAD_DIR: &str = "/uploads/plantas_imagens";

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs.max(1))
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn preload_delay(&self) -> Duration {
        Duration::from_millis(self.preload_delay_ms)
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            load_timeout_secs: Self::DEFAULT_LOAD_TIMEOUT_SECS,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            backoff_base_ms: Self::DEFAULT_BACKOFF_BASE_MS,
            preload_delay_ms: Self::DEFAULT_PRELOAD_DELAY_MS,
            upload_prefixes: vec!["/uploads/".to_string()],
            upload_dir: Self::DEFAULT_UPLOAD_DIR.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive
    pub filter: String,
    /// Optional log file (in addition to stderr)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin of the backend REST API
    pub api_origin: String,

    /// Bearer token for the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Language for labels and messages
    pub language: Language,

    /// Image loading configuration
    pub images: ImagesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    pub const DEFAULT_API_ORIGIN: &str = "http://localhost:3001";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API origin with precedence: flag > env > config > default.
    ///
    /// `RAIZ_API_ORIGIN` wins over the generic `API_ORIGIN`.
    ///
    /// # Errors
    /// Returns an error if the winning value is not a valid URL.
    pub fn effective_api_origin(&self, flag: Option<&str>) -> Result<String> {
        let env = ["RAIZ_API_ORIGIN", "API_ORIGIN"]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|v| !v.trim().is_empty());
        resolve_api_origin(flag, env.as_deref(), Some(&self.api_origin))
    }

    /// Returns the bearer token with precedence: env > config.
    pub fn effective_api_token(&self) -> Option<String> {
        std::env::var("RAIZ_API_TOKEN")
            .ok()
            .or_else(|| self.api_token.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Saves only the language field to a specific config file path.
    ///
    /// Creates the file from the template if it doesn't exist; otherwise
    /// merges the user's values into the latest template first.
    pub fn save_language_to(path: &Path, language: Language) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["language"] = value(language.code());

        Self::write_config(path, &doc.to_string())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Used by `xtask update-default-config` to keep `default_config.toml`
    /// in sync with Rust default values.
    pub fn generate() -> Result<String> {
        let generated = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;
        merge_with_template(&generated)
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_origin: Self::DEFAULT_API_ORIGIN.to_string(),
            api_token: None,
            language: Language::default(),
            images: ImagesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Picks the first non-blank candidate (flag, env, config) or the default,
/// validates it and strips trailing slashes.
///
/// # Errors
/// Returns an error if the chosen origin does not parse as a URL.
pub fn resolve_api_origin(
    flag: Option<&str>,
    env: Option<&str>,
    config: Option<&str>,
) -> Result<String> {
    let chosen = [flag, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(Config::DEFAULT_API_ORIGIN);

    url::Url::parse(chosen).with_context(|| format!("Invalid API origin: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.api_origin, Config::DEFAULT_API_ORIGIN);
        assert_eq!(config.images.max_retries, 2);
        assert_eq!(config.images.load_timeout(), Duration::from_secs(10));
        assert_eq!(config.images.backoff_base(), Duration::from_millis(1000));
        assert_eq!(config.images.preload_delay(), Duration::from_millis(100));
        assert_eq!(config.language, Language::Pt);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_origin = \"https://api.raiz.example\"\nlanguage = \"en\"\n[images]\nmax_retries = 0\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_origin, "https://api.raiz.example");
        assert_eq!(config.language, Language::En);
        assert_eq!(config.images.max_retries, 0);
        assert_eq!(config.images.backoff_base_ms, 1000);
        assert_eq!(config.images.upload_prefixes, vec!["/uploads/".to_string()]);
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_origin = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_resolve_api_origin_precedence() {
        assert_eq!(
            resolve_api_origin(Some("http://flag:1/"), Some("http://env:2"), Some("http://cfg:3"))
                .unwrap(),
            "http://flag:1"
        );
        assert_eq!(
            resolve_api_origin(Some("  "), Some("http://env:2"), Some("http://cfg:3")).unwrap(),
            "http://env:2"
        );
        assert_eq!(
            resolve_api_origin(None, None, Some("http://cfg:3///")).unwrap(),
            "http://cfg:3"
        );
        assert_eq!(
            resolve_api_origin(None, None, None).unwrap(),
            Config::DEFAULT_API_ORIGIN
        );
    }

    #[test]
    fn test_resolve_api_origin_rejects_garbage() {
        let err = resolve_api_origin(Some("not a url"), None, None).unwrap_err();
        assert!(err.to_string().contains("Invalid API origin"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::init(&path).unwrap();
        assert!(path.exists());
        let err = Config::init(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        // The template itself must load.
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_origin, Config::DEFAULT_API_ORIGIN);
    }

    #[test]
    fn test_save_language_preserves_user_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_origin = \"http://example.org\"\n").unwrap();

        Config::save_language_to(&path, Language::En).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# Per-attempt timeout"));
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_origin, "http://example.org");
        assert_eq!(config.language, Language::En);
    }

    #[test]
    fn test_generate_round_trips_defaults() {
        let generated = Config::generate().unwrap();
        assert!(generated.contains("load_timeout_secs = 10"));
        let parsed: Config = toml::from_str(&generated).unwrap();
        assert_eq!(parsed.images.upload_dir, "/uploads/plantas_imagens");
    }
}
