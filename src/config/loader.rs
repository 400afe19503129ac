//! Configuration file loading with precedence handling.

use crate::model::HeightEstimator;
use crate::view_state::{BufferPolicy, EngineConfig, Font, LayoutParams};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PARLAY_CONFIG";
/// Environment variable overriding the buffer mode.
pub const BUFFER_MODE_ENV: &str = "PARLAY_BUFFER_MODE";
/// Environment variable overriding the cache ceiling.
pub const CACHE_CEILING_ENV: &str = "PARLAY_CACHE_CEILING";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML or unknown fields.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting has a value the engine cannot use.
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Setting name (config key or environment variable).
        key: String,
        /// Offending value as written.
        value: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Buffer band measurement unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferMode {
    /// Buffer a number of paragraphs.
    #[default]
    Paragraphs,
    /// Buffer a pixel distance.
    Pixels,
}

impl std::str::FromStr for BufferMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paragraphs" => Ok(Self::Paragraphs),
            "pixels" => Ok(Self::Pixels),
            _ => Err(ConfigError::InvalidValue {
                key: "buffer_mode".to_string(),
                value: s.to_string(),
                reason: "expected \"paragraphs\" or \"pixels\"",
            }),
        }
    }
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/parlay/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Layout width in pixels.
    #[serde(default)]
    pub width: Option<f64>,

    /// Font family name.
    #[serde(default)]
    pub font_family: Option<String>,

    /// Font size in pixels.
    #[serde(default)]
    pub font_size: Option<u16>,

    /// Buffer mode, `"paragraphs"` or `"pixels"`.
    #[serde(default)]
    pub buffer_mode: Option<BufferMode>,

    /// Paragraphs buffered on each side in paragraph mode.
    #[serde(default)]
    pub buffer_paragraphs: Option<usize>,

    /// Pixels buffered on each side in pixel mode.
    #[serde(default)]
    pub buffer_pixels: Option<f64>,

    /// Maximum number of cached layouts.
    #[serde(default)]
    pub cache_ceiling: Option<usize>,

    /// Line height used for height estimates.
    #[serde(default)]
    pub estimated_line_height: Option<f64>,

    /// Chars per line used for height estimates.
    #[serde(default)]
    pub estimated_chars_per_line: Option<usize>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Layout width in pixels.
    pub width: f64,
    /// Font family name.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: u16,
    /// Buffer mode.
    pub buffer_mode: BufferMode,
    /// Paragraph buffer size.
    pub buffer_paragraphs: usize,
    /// Pixel buffer size.
    pub buffer_pixels: f64,
    /// Layout cache ceiling.
    pub cache_ceiling: usize,
    /// Estimated line height.
    pub estimated_line_height: f64,
    /// Estimated chars per line.
    pub estimated_chars_per_line: usize,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let estimator = HeightEstimator::default();
        let font = Font::default();
        Self {
            width: LayoutParams::default().width,
            font_family: font.family,
            font_size: font.pixel_size,
            buffer_mode: BufferMode::Paragraphs,
            buffer_paragraphs: crate::view_state::viewport::DEFAULT_BUFFER_PARAGRAPHS,
            buffer_pixels: crate::view_state::viewport::DEFAULT_BUFFER_PIXELS,
            cache_ceiling: crate::view_state::cache::DEFAULT_CACHE_CEILING,
            estimated_line_height: estimator.line_height,
            estimated_chars_per_line: estimator.chars_per_line,
            log_file_path: default_log_path(),
        }
    }
}

fn invalid(key: &str, value: impl ToString, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

impl ResolvedConfig {
    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(invalid("width", self.width, "must be a positive number"));
        }
        if self.font_size == 0 {
            return Err(invalid("font_size", self.font_size, "must be positive"));
        }
        if !(self.buffer_pixels.is_finite() && self.buffer_pixels >= 0.0) {
            return Err(invalid(
                "buffer_pixels",
                self.buffer_pixels,
                "must be a non-negative number",
            ));
        }
        if self.cache_ceiling == 0 {
            return Err(invalid("cache_ceiling", self.cache_ceiling, "must be positive"));
        }
        if !(self.estimated_line_height.is_finite() && self.estimated_line_height > 0.0) {
            return Err(invalid(
                "estimated_line_height",
                self.estimated_line_height,
                "must be a positive number",
            ));
        }
        if self.estimated_chars_per_line == 0 {
            return Err(invalid(
                "estimated_chars_per_line",
                self.estimated_chars_per_line,
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Buffer policy selected by `buffer_mode`.
    pub fn buffer_policy(&self) -> BufferPolicy {
        match self.buffer_mode {
            BufferMode::Paragraphs => BufferPolicy::Paragraphs(self.buffer_paragraphs),
            BufferMode::Pixels => BufferPolicy::Pixels(self.buffer_pixels),
        }
    }

    /// Engine parameters for this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            params: LayoutParams::new(self.width, Font::new(&self.font_family, self.font_size)),
            buffer: self.buffer_policy(),
            cache_ceiling: self.cache_ceiling,
            estimator: HeightEstimator::new(
                self.estimated_line_height,
                self.estimated_chars_per_line,
            ),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/parlay/parlay.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("parlay").join("parlay.log")
    } else {
        PathBuf::from("parlay.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/parlay/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("parlay").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `PARLAY_CONFIG` environment variable
/// 3. Default path `~/.config/parlay/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        width: config.width.unwrap_or(defaults.width),
        font_family: config.font_family.unwrap_or(defaults.font_family),
        font_size: config.font_size.unwrap_or(defaults.font_size),
        buffer_mode: config.buffer_mode.unwrap_or(defaults.buffer_mode),
        buffer_paragraphs: config.buffer_paragraphs.unwrap_or(defaults.buffer_paragraphs),
        buffer_pixels: config.buffer_pixels.unwrap_or(defaults.buffer_pixels),
        cache_ceiling: config.cache_ceiling.unwrap_or(defaults.cache_ceiling),
        estimated_line_height: config
            .estimated_line_height
            .unwrap_or(defaults.estimated_line_height),
        estimated_chars_per_line: config
            .estimated_chars_per_line
            .unwrap_or(defaults.estimated_chars_per_line),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `PARLAY_BUFFER_MODE`: `paragraphs` or `pixels`
/// - `PARLAY_CACHE_CEILING`: positive integer
///
/// # Errors
///
/// `ConfigError::InvalidValue` if a variable is set but unparseable.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(mode) = std::env::var(BUFFER_MODE_ENV) {
        config.buffer_mode = mode.parse().map_err(|_| {
            invalid(BUFFER_MODE_ENV, &mode, "expected \"paragraphs\" or \"pixels\"")
        })?;
    }

    if let Ok(ceiling) = std::env::var(CACHE_CEILING_ENV) {
        config.cache_ceiling = ceiling
            .trim()
            .parse()
            .map_err(|_| invalid(CACHE_CEILING_ENV, &ceiling, "expected a positive integer"))?;
    }

    Ok(config)
}

/// CLI flags that override configuration.
///
/// Each field is `None` unless the user passed the flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    /// `--width`
    pub width: Option<f64>,
    /// `--buffer-paragraphs`; also selects paragraph mode.
    pub buffer_paragraphs: Option<usize>,
    /// `--buffer-pixels`; also selects pixel mode.
    pub buffer_pixels: Option<f64>,
    /// `--cache-ceiling`
    pub cache_ceiling: Option<usize>,
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, cli: &CliOverrides) -> ResolvedConfig {
    if let Some(width) = cli.width {
        config.width = width;
    }

    if let Some(paragraphs) = cli.buffer_paragraphs {
        config.buffer_mode = BufferMode::Paragraphs;
        config.buffer_paragraphs = paragraphs;
    }

    if let Some(pixels) = cli.buffer_pixels {
        config.buffer_mode = BufferMode::Pixels;
        config.buffer_pixels = pixels;
    }

    if let Some(ceiling) = cli.cache_ceiling {
        config.cache_ceiling = ceiling;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

#[cfg(test)]
mod log_path_tests {
    use super::*;

    #[test]
    fn default_log_path_ends_with_parlay_log() {
        let path = default_log_path();
        assert!(
            path.to_string_lossy().ends_with("parlay.log"),
            "Default log path should end with 'parlay.log', got: {:?}",
            path
        );
    }

    #[test]
    fn resolved_config_default_includes_log_path() {
        let config = ResolvedConfig::default();
        assert!(!config.log_file_path.as_os_str().is_empty());
    }

    #[test]
    fn config_file_log_path_overrides_default() {
        let custom_path = PathBuf::from("/custom/path/to/app.log");
        let config_file = ConfigFile {
            log_file_path: Some(custom_path.clone()),
            ..ConfigFile::default()
        };

        let resolved = merge_config(Some(config_file));
        assert_eq!(resolved.log_file_path, custom_path);
    }
}
