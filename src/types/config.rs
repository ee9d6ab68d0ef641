//! Configuration for gitcache.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::requests::CommandKind;
use crate::GitCacheResult;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "gitcache.toml";

/// Main configuration for gitcache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Batch dispatcher settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Git binary settings.
    #[serde(default)]
    pub git: GitConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Default timeout for a git command (in seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            timeout_secs: default_timeout(),
        }
    }
}

impl GeneralConfig {
    /// Default command timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// TTL multiplier applied on top of the per-command base TTL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    /// Keeps results twice as long.
    Aggressive,
    /// Uses the configured TTLs as-is.
    #[default]
    Balanced,
    /// Halves the configured TTLs.
    Conservative,
}

impl CacheStrategy {
    /// Factor applied to the base TTL.
    pub fn multiplier(self) -> f64 {
        match self {
            CacheStrategy::Aggressive => 2.0,
            CacheStrategy::Balanced => 1.0,
            CacheStrategy::Conservative => 0.5,
        }
    }

    /// Scales a base TTL by this strategy.
    pub fn apply(self, base: Duration) -> Duration {
        base.mul_f64(self.multiplier())
    }
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::Aggressive => write!(f, "aggressive"),
            CacheStrategy::Balanced => write!(f, "balanced"),
            CacheStrategy::Conservative => write!(f, "conservative"),
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached results.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Share of entries removed by one eviction sweep (0.0-1.0].
    #[serde(default = "default_eviction_fraction")]
    pub eviction_fraction: f64,

    /// TTL multiplier strategy.
    #[serde(default)]
    pub strategy: CacheStrategy,

    /// Base TTLs per command kind.
    #[serde(default)]
    pub ttl: TtlConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
            eviction_fraction: default_eviction_fraction(),
            strategy: CacheStrategy::default(),
            ttl: TtlConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    500
}

fn default_eviction_fraction() -> f64 {
    0.1
}

/// Base TTLs (in seconds) per command kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlConfig {
    /// `git status`.
    #[serde(default = "default_status_ttl")]
    pub status_secs: u64,

    /// `git diff`.
    #[serde(default = "default_diff_ttl")]
    pub diff_secs: u64,

    /// `git log` / `git show`.
    #[serde(default = "default_log_ttl")]
    pub log_secs: u64,

    /// `git branch` / `git rev-parse`.
    #[serde(default = "default_branch_ttl")]
    pub branch_secs: u64,

    /// Any other subcommand.
    #[serde(default = "default_other_ttl")]
    pub default_secs: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            status_secs: default_status_ttl(),
            diff_secs: default_diff_ttl(),
            log_secs: default_log_ttl(),
            branch_secs: default_branch_ttl(),
            default_secs: default_other_ttl(),
        }
    }
}

impl TtlConfig {
    /// Base TTL for a command kind, before the strategy multiplier.
    pub fn base_for(&self, kind: CommandKind) -> Duration {
        let secs = match kind {
            CommandKind::Status => self.status_secs,
            CommandKind::Diff => self.diff_secs,
            CommandKind::Log => self.log_secs,
            CommandKind::Branch => self.branch_secs,
            CommandKind::Other => self.default_secs,
        };
        Duration::from_secs(secs)
    }
}

fn default_status_ttl() -> u64 {
    5
}

fn default_diff_ttl() -> u64 {
    10
}

fn default_log_ttl() -> u64 {
    60
}

fn default_branch_ttl() -> u64 {
    30
}

fn default_other_ttl() -> u64 {
    30
}

/// Batch dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Interval between queue drains (in milliseconds).
    #[serde(default = "default_batch_interval")]
    pub batch_interval_ms: u64,

    /// Commands with priority <= this value skip batching.
    #[serde(default = "default_immediate_threshold")]
    pub immediate_threshold: u8,

    /// Maximum concurrent git subprocesses.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Maximum number of queued commands.
    #[serde(default = "default_max_queue_len")]
    pub max_queue_len: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_interval_ms: default_batch_interval(),
            immediate_threshold: default_immediate_threshold(),
            max_workers: default_max_workers(),
            max_queue_len: default_max_queue_len(),
        }
    }
}

impl DispatcherConfig {
    /// Batch interval as a `Duration`.
    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }
}

fn default_batch_interval() -> u64 {
    100
}

fn default_immediate_threshold() -> u8 {
    2
}

fn default_max_workers() -> usize {
    4
}

fn default_max_queue_len() -> usize {
    1000
}

/// Git binary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Git executable (name on PATH or absolute path).
    #[serde(default = "default_git_binary")]
    pub binary: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
        }
    }
}

fn default_git_binary() -> String {
    "git".to_string()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> GitCacheResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GitCacheResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
            dispatcher: DispatcherConfig::default(),
            git: GitConfig::default(),
        }
    }

    /// Rejects values the cache and dispatcher cannot work with.
    pub fn validate(&self) -> GitCacheResult<()> {
        if self.cache.capacity == 0 {
            return Err(crate::GitCacheError::config("cache.capacity must be > 0"));
        }
        if !(self.cache.eviction_fraction > 0.0 && self.cache.eviction_fraction <= 1.0) {
            return Err(crate::GitCacheError::config(
                "cache.eviction_fraction must be in (0.0, 1.0]",
            ));
        }
        if self.dispatcher.max_workers == 0 {
            return Err(crate::GitCacheError::config(
                "dispatcher.max_workers must be > 0",
            ));
        }
        if self.dispatcher.batch_interval_ms == 0 {
            return Err(crate::GitCacheError::config(
                "dispatcher.batch_interval_ms must be > 0",
            ));
        }
        Ok(())
    }

    /// User-level configuration path (`~/.config/gitcache/gitcache.toml` on Linux).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gitcache").join(CONFIG_FILE_NAME))
    }

    /// Tries the current directory, then the user config dir, then defaults.
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::load(CONFIG_FILE_NAME) {
            return config;
        }

        Self::user_config_path()
            .filter(|path| path.exists())
            .and_then(|path| Self::load(path).ok())
            .unwrap_or_else(Self::default_config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.general.timeout_secs, 10);
        assert_eq!(config.cache.capacity, 500);
        assert!((config.cache.eviction_fraction - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.cache.strategy, CacheStrategy::Balanced);
        assert_eq!(config.dispatcher.immediate_threshold, 2);
        assert_eq!(config.git.binary, "git");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_multiplier() {
        let base = Duration::from_secs(10);

        assert_eq!(CacheStrategy::Aggressive.apply(base), Duration::from_secs(20));
        assert_eq!(CacheStrategy::Balanced.apply(base), Duration::from_secs(10));
        assert_eq!(CacheStrategy::Conservative.apply(base), Duration::from_secs(5));
    }

    #[test]
    fn test_ttl_per_kind() {
        let ttl = TtlConfig::default();

        assert_eq!(ttl.base_for(CommandKind::Status), Duration::from_secs(5));
        assert_eq!(ttl.base_for(CommandKind::Log), Duration::from_secs(60));
        assert_eq!(ttl.base_for(CommandKind::Other), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            capacity = 42
            strategy = "aggressive"

            [dispatcher]
            max_workers = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.capacity, 42);
        assert_eq!(config.cache.strategy, CacheStrategy::Aggressive);
        assert_eq!(config.cache.ttl.status_secs, 5);
        assert_eq!(config.dispatcher.max_workers, 8);
        assert_eq!(config.dispatcher.batch_interval_ms, 100);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.eviction_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dispatcher.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.cache.strategy = CacheStrategy::Conservative;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.cache.strategy, CacheStrategy::Conservative);
        assert_eq!(loaded.cache.capacity, config.cache.capacity);
    }
}
