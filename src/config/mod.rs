//! Configuration module.
//!
//! Settings come from, lowest precedence first: built-in defaults, a TOML
//! file, `PARLAY_*` environment variables, and CLI flags.

mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, BufferMode, CliOverrides,
    ConfigError, ConfigFile, ResolvedConfig, BUFFER_MODE_ENV, CACHE_CEILING_ENV, CONFIG_ENV,
};
