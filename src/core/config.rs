//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.lumen/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LumenConfig {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub title: Option<String>,
    pub history_max: Option<usize>,
    pub compact_lines: Option<usize>,
    pub autocomplete_debounce_ms: Option<u64>,
    pub frame_interval_ms: Option<u64>,
    pub esc_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: Option<String>,
    pub capacity: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TITLE: &str = "lumen";
pub const DEFAULT_HISTORY_MAX: usize = 500;
pub const DEFAULT_COMPACT_LINES: usize = 10;
pub const DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS: u64 = 150;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
pub const DEFAULT_ESC_TIMEOUT_MS: u64 = 50;
pub const DEFAULT_LOG_FILE: &str = "lumen.log";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;
pub const DEFAULT_LOG_CAPACITY: usize = 2000;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub title: String,
    pub history_max: usize,
    pub compact_lines: usize,
    pub autocomplete_debounce: Duration,
    pub frame_interval: Duration,
    pub esc_timeout: Duration,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub log_capacity: usize,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve_from(&LumenConfig::default(), &CliOverrides::default(), |_| None)
    }
}

/// Values taken from command-line flags; `None` means not given.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub history_max: Option<usize>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.lumen/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".lumen").join("config.toml"))
}

/// Load config from `~/.lumen/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LumenConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<LumenConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(LumenConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<LumenConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(LumenConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: LumenConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Lumen Configuration
# All settings are optional: defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [ui]
# title = "lumen"
# history_max = 500                  # Or set LUMEN_HISTORY_MAX
# compact_lines = 10                 # Lines kept by collapsed messages
# autocomplete_debounce_ms = 150
# frame_interval_ms = 16             # Paint batching window
# esc_timeout_ms = 50                # Lone ESC vs. escape sequence

# [logging]
# file = "lumen.log"
# level = "debug"                    # Or set LUMEN_LOG_LEVEL
# capacity = 2000                    # Records kept for the log viewer
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &LumenConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_from(config, cli, |key| std::env::var(key).ok())
}

/// [`resolve`] with the environment supplied by the caller.
pub fn resolve_from(
    config: &LumenConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Log level: CLI → env → config → default
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| env("LUMEN_LOG_LEVEL"))
        .or_else(|| config.logging.level.clone())
        .map(|raw| parse_level(&raw))
        .unwrap_or(DEFAULT_LOG_LEVEL);

    // History size: CLI → env → config → default
    let history_max = cli
        .history_max
        .or_else(|| env("LUMEN_HISTORY_MAX").and_then(|v| v.trim().parse().ok()))
        .or(config.ui.history_max)
        .unwrap_or(DEFAULT_HISTORY_MAX);

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.logging.file.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    let ms = |value: Option<u64>, default: u64| Duration::from_millis(value.unwrap_or(default));

    ResolvedConfig {
        title: config
            .ui
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        history_max,
        compact_lines: config.ui.compact_lines.unwrap_or(DEFAULT_COMPACT_LINES),
        autocomplete_debounce: ms(
            config.ui.autocomplete_debounce_ms,
            DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS,
        ),
        frame_interval: ms(config.ui.frame_interval_ms, DEFAULT_FRAME_INTERVAL_MS),
        esc_timeout: ms(config.ui.esc_timeout_ms, DEFAULT_ESC_TIMEOUT_MS),
        log_file: PathBuf::from(log_file),
        log_level,
        log_capacity: config.logging.capacity.unwrap_or(DEFAULT_LOG_CAPACITY),
    }
}

fn parse_level(raw: &str) -> LevelFilter {
    LevelFilter::from_str(raw.trim()).unwrap_or_else(|_| {
        warn!("Unknown log level '{raw}', using {DEFAULT_LOG_LEVEL}");
        DEFAULT_LOG_LEVEL
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_from(&LumenConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.title, "lumen");
        assert_eq!(resolved.history_max, DEFAULT_HISTORY_MAX);
        assert_eq!(resolved.compact_lines, 10);
        assert_eq!(resolved.autocomplete_debounce, Duration::from_millis(150));
        assert_eq!(resolved.frame_interval, Duration::from_millis(16));
        assert_eq!(resolved.log_file, PathBuf::from("lumen.log"));
        assert_eq!(resolved.log_level, LevelFilter::Debug);
        assert_eq!(resolved.log_capacity, 2000);
    }

    #[test]
    fn test_override_hierarchy() {
        let config = LumenConfig {
            ui: UiConfig {
                history_max: Some(10),
                ..Default::default()
            },
            logging: LoggingConfig {
                level: Some("warn".to_string()),
                ..Default::default()
            },
        };
        let env = |key: &str| match key {
            "LUMEN_HISTORY_MAX" => Some("20".to_string()),
            "LUMEN_LOG_LEVEL" => Some("info".to_string()),
            _ => None,
        };

        let from_env = resolve_from(&config, &CliOverrides::default(), env);
        assert_eq!(from_env.history_max, 20);
        assert_eq!(from_env.log_level, LevelFilter::Info);

        let cli = CliOverrides {
            log_level: Some("trace".to_string()),
            history_max: Some(30),
            ..Default::default()
        };
        let from_cli = resolve_from(&config, &cli, env);
        assert_eq!(from_cli.history_max, 30);
        assert_eq!(from_cli.log_level, LevelFilter::Trace);

        let from_file = resolve_from(&config, &CliOverrides::default(), no_env);
        assert_eq!(from_file.history_max, 10);
        assert_eq!(from_file.log_level, LevelFilter::Warn);
    }

    #[test]
    fn test_bad_level_falls_back() {
        let cli = CliOverrides {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        let resolved = resolve_from(&LumenConfig::default(), &cli, no_env);
        assert_eq!(resolved.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[ui]
frame_interval_ms = 33
"#;
        let config: LumenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ui.frame_interval_ms, Some(33));
        assert!(config.ui.history_max.is_none());
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("lumen-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[ui\nbroken").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_generates_commented_default() {
        let dir = std::env::temp_dir().join(format!("lumen-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let config = load_config_from(&path).unwrap();
        assert!(config.ui.title.is_none());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Lumen Configuration"));
        // Everything in the generated file is commented out.
        let parsed: LumenConfig = toml::from_str(&written).unwrap();
        assert!(parsed.logging.file.is_none());
        fs::remove_dir_all(&dir).unwrap();
    }
}
