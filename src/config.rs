//! Configuration file loading and setting resolution.
//!
//! The file is a flat `key = value` list in TOML syntax. Resolution order is
//! command-line flag, then file value, then built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::corpus::CorpusFilter;
use crate::crawl::{CONNECT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, READ_TIMEOUT_SECS};
use crate::extract::FieldDefaults;

/// Portal base URL.
pub const DEFAULT_BASE_URL: &str = "http://www.riss.kr";

/// Default minimum delay between requests to one host, in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 3000;

/// Default number of tokens selected for matrices.
pub const DEFAULT_TOP_N: usize = 50;

/// Upper bound for `rate_limit`, in milliseconds.
pub const MAX_RATE_LIMIT_MS: u64 = 60_000;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Values read from a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub base_url: Option<String>,
    /// Minimum delay between requests to one host, in milliseconds.
    pub rate_limit: Option<u64>,
    pub max_retries: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub top_n: Option<usize>,
    /// Comma-separated language names dropped from the corpus.
    pub excluded_languages: Option<Vec<String>>,
    pub default_organization: Option<String>,
    pub default_venue: Option<String>,
    pub default_media: Option<String>,
    /// Extra stop words for the built-in tagger, one per line.
    pub stop_words_file: Option<PathBuf>,
}

impl FileConfig {
    /// Validates values against the ranges the CLI accepts.
    ///
    /// # Errors
    /// Returns an error naming the first out-of-range key.
    pub fn validate(&self) -> Result<()> {
        if let Some(rate_limit) = self.rate_limit
            && rate_limit > MAX_RATE_LIMIT_MS
        {
            bail!(
                "Invalid config value for `rate_limit`: {rate_limit}. Expected range: 0..={MAX_RATE_LIMIT_MS}"
            );
        }
        if let Some(max_retries) = self.max_retries
            && max_retries > MAX_RETRIES_LIMIT
        {
            bail!(
                "Invalid config value for `max_retries`: {max_retries}. Expected range: 0..={MAX_RETRIES_LIMIT}"
            );
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(top_n) = self.top_n
            && top_n == 0
        {
            bail!("Invalid config value for `top_n`: 0. Expected a positive integer");
        }
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url)
                .with_context(|| format!("Invalid config value for `base_url`: '{base_url}'"))?;
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Config file path and contents, if one was loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: Option<FileConfig>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/journal-miner/config.toml`
/// 2. `$HOME/.config/journal-miner/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("journal-miner")
                .join("config.toml"),
        );
    }
    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("journal-miner")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. The default path is used only when present.
///
/// # Errors
/// Returns an error if the file cannot be read or holds an invalid entry.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(default_path) if default_path.exists() => {
            let config = load_file_config(default_path)?;
            Ok(LoadedConfig {
                path,
                config: Some(config),
            })
        }
        _ => {
            debug!(path = ?path, "no config file, using defaults");
            Ok(LoadedConfig { path, config: None })
        }
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };
        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "base_url" => cfg.base_url = Some(parse_string_literal(value).with_context(invalid)?),
            "rate_limit" => cfg.rate_limit = Some(parse_integer_u64(value).with_context(invalid)?),
            "max_retries" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.max_retries = Some(u32::try_from(parsed).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "top_n" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.top_n = Some(usize::try_from(parsed).with_context(invalid)?);
            }
            "excluded_languages" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.excluded_languages = Some(
                    parsed
                        .split(',')
                        .map(str::trim)
                        .filter(|language| !language.is_empty())
                        .map(String::from)
                        .collect(),
                );
            }
            "default_organization" => {
                cfg.default_organization = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "default_venue" => {
                cfg.default_venue = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "default_media" => {
                cfg.default_media = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "stop_words_file" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.stop_words_file = Some(PathBuf::from(parsed));
            }
            unknown => bail!("Unknown configuration key: '{unknown}' on line {line_no}"),
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    let Some(inner) = raw_value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        bail!("Expected double-quoted string");
    };
    Ok(inner.to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub top_n: usize,
    pub excluded_languages: Vec<String>,
    pub field_defaults: FieldDefaults,
    pub stop_words_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            top_n: DEFAULT_TOP_N,
            excluded_languages: Vec::new(),
            field_defaults: FieldDefaults::default(),
            stop_words_file: None,
        }
    }
}

impl Settings {
    /// Built-in defaults overlaid with file values.
    #[must_use]
    pub fn from_file(file: Option<&FileConfig>) -> Self {
        let mut settings = Self::default();
        let Some(file) = file else {
            return settings;
        };
        if let Some(base_url) = &file.base_url {
            settings.base_url.clone_from(base_url);
        }
        if let Some(rate_limit) = file.rate_limit {
            settings.rate_limit_ms = rate_limit;
        }
        if let Some(max_retries) = file.max_retries {
            settings.max_retries = max_retries;
        }
        if let Some(secs) = file.connect_timeout_secs {
            settings.connect_timeout_secs = secs;
        }
        if let Some(secs) = file.read_timeout_secs {
            settings.read_timeout_secs = secs;
        }
        if let Some(top_n) = file.top_n {
            settings.top_n = top_n;
        }
        if let Some(languages) = &file.excluded_languages {
            settings.excluded_languages.clone_from(languages);
        }
        settings.field_defaults = FieldDefaults {
            organization: file.default_organization.clone(),
            name: file.default_venue.clone(),
            media: file.default_media.clone(),
        };
        settings.stop_words_file.clone_from(&file.stop_words_file);
        settings
    }

    /// Applies command-line values, which win over everything else.
    #[must_use]
    pub fn with_overrides(mut self, rate_limit_ms: Option<u64>, max_retries: Option<u32>) -> Self {
        if let Some(rate_limit_ms) = rate_limit_ms {
            self.rate_limit_ms = rate_limit_ms;
        }
        if let Some(max_retries) = max_retries {
            self.max_retries = max_retries;
        }
        self
    }

    #[must_use]
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Total fetch attempts: the first try plus `max_retries`.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    #[must_use]
    pub fn corpus_filter(&self) -> CorpusFilter {
        CorpusFilter::excluding(self.excluded_languages.iter().cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
            # crawl settings
            rate_limit = 5000
            excluded_languages = "English, Japanese"  # comment
            default_venue = "한국음악치료학회지"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.rate_limit, Some(5000));
        assert_eq!(
            cfg.excluded_languages,
            Some(vec!["English".to_string(), "Japanese".to_string()])
        );
        assert_eq!(cfg.default_venue.as_deref(), Some("한국음악치료학회지"));
        assert_eq!(cfg.max_retries, None);
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        let cfg = parse_config_str(r#"base_url = "http://www.riss.kr/#top""#).unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("http://www.riss.kr/#top"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(parse_config_str("rate_limit = 60001").is_err());
        assert!(parse_config_str("max_retries = 11").is_err());
        assert!(parse_config_str("read_timeout_secs = 0").is_err());
        assert!(parse_config_str("top_n = 0").is_err());
        assert!(parse_config_str("rate_limit = -1").is_err());
    }

    #[test]
    fn test_bad_syntax_rejected() {
        assert!(parse_config_str("rate_limit 3000").is_err());
        assert!(parse_config_str("base_url = http://x").is_err());
        assert!(parse_config_str(r#"base_url = "not a url""#).is_err());
    }

    #[test]
    fn test_settings_precedence_cli_over_file_over_default() {
        let file = FileConfig {
            rate_limit: Some(5000),
            max_retries: Some(1),
            top_n: Some(20),
            ..FileConfig::default()
        };

        let settings = Settings::from_file(Some(&file)).with_overrides(Some(0), None);

        assert_eq!(settings.rate_limit_ms, 0);
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.max_attempts(), 2);
        assert_eq!(settings.top_n, 20);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_file(None);
        assert_eq!(settings.rate_limit(), Duration::from_millis(3000));
        assert_eq!(settings.max_attempts(), DEFAULT_MAX_RETRIES + 1);
        assert_eq!(settings.field_defaults, FieldDefaults::default());
    }

    #[test]
    fn test_default_settings_match_default_retry_policy() {
        let settings = Settings::from_file(None);
        let policy = crate::crawl::RetryPolicy::with_max_attempts(settings.max_attempts());
        assert_eq!(
            policy.max_attempts(),
            crate::crawl::RetryPolicy::default().max_attempts()
        );
    }

    #[test]
    fn test_field_defaults_from_file() {
        let file = FileConfig {
            default_organization: Some("한국음악치료학회".to_string()),
            default_media: Some("학술저널".to_string()),
            ..FileConfig::default()
        };
        let defaults = Settings::from_file(Some(&file)).field_defaults;
        assert_eq!(defaults.organization.as_deref(), Some("한국음악치료학회"));
        assert_eq!(defaults.name, None);
        assert_eq!(defaults.media.as_deref(), Some("학술저널"));
    }

    #[test]
    fn test_load_config_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "top_n = 10").unwrap();

        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.config.unwrap().top_n, Some(10));
        assert_eq!(loaded.path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_config_explicit_missing_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/journal-miner.toml"))).is_err());
    }
}
