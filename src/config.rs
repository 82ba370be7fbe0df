use crate::deduplication::{Blacklist, DEFAULT_MAX_FINGERPRINTS};
use crate::grammar::{builtin_grammars, FieldLayout, GrammarError, SourceGrammar};
use crate::pipeline::SignalPipeline;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "TICKERWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct GrammarCfg {
    pub name: String,
    /// Sender username; defaults to the grammar name.
    #[serde(default)]
    pub username: Option<String>,
    pub pattern: String,
    #[serde(default = "default_ticker_group")]
    pub ticker_group: usize,
    #[serde(default)]
    pub direction_group: Option<usize>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BlacklistCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tickers: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SettingsCfg {
    #[serde(default = "default_true")]
    pub auto_copy_clipboard: bool,
    #[serde(default = "default_true")]
    pub auto_open_gmgn: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
    #[serde(default = "default_max_errors")]
    pub max_errors: u64,
    #[serde(default = "default_cache_size")]
    pub dedup_cache_size: usize,
}

impl SettingsCfg {
    /// Maps `log_level` onto a tracing level name. Accepts the Python
    /// spellings `WARNING` and `CRITICAL` as well.
    pub fn tracing_level(&self) -> Result<&'static str, ConfigError> {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok("trace"),
            "debug" => Ok("debug"),
            "info" => Ok("info"),
            "warn" | "warning" => Ok("warn"),
            "error" | "critical" => Ok("error"),
            "off" => Ok("off"),
            other => Err(ConfigError::InvalidValue(format!("unknown settings.log_level {}", other))),
        }
    }
}

impl Default for SettingsCfg {
    fn default() -> Self {
        Self {
            auto_copy_clipboard: true,
            auto_open_gmgn: true,
            log_level: default_log_level(),
            stats_interval: default_stats_interval(),
            max_errors: default_max_errors(),
            dedup_cache_size: default_cache_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationsCfg {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub desktop: bool,
    #[serde(default)]
    pub sound: bool,
}

impl Default for NotificationsCfg {
    fn default() -> Self {
        Self { enabled: true, desktop: true, sound: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForwardingCfg {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub monitored_bots: Option<Vec<GrammarCfg>>,
    #[serde(default)]
    pub blacklist: BlacklistCfg,
    #[serde(default)]
    pub settings: SettingsCfg,
    #[serde(default)]
    pub notifications: NotificationsCfg,
    #[serde(default)]
    pub forwarding: Option<ForwardingCfg>,
}

fn default_true() -> bool {
    true
}
fn default_ticker_group() -> usize {
    1
}
fn default_log_level() -> String {
    "info".into()
}
fn default_stats_interval() -> u64 {
    10
}
fn default_max_errors() -> u64 {
    100
}
fn default_cache_size() -> usize {
    DEFAULT_MAX_FINGERPRINTS
}

impl AppConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path: path.to_path_buf(), source },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_json::from_str(raw)
            .map_err(|source| ConfigError::Parse { path: PathBuf::from("<inline>"), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads `TICKERWATCH_CONFIG` (or `config.json`), then applies
    /// `SIGNAL_WEBHOOK_URL` / `SIGNAL_WEBHOOK_TOKEN`. A missing default file
    /// means built-in defaults; a missing explicit file is an error.
    pub fn load_from_env_or_default() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let (mut cfg, path) = match env::var(CONFIG_ENV) {
            Ok(explicit) => {
                let path = PathBuf::from(explicit);
                (Self::load_from_path(&path)?, Some(path))
            }
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    (Self::load_from_path(&path)?, Some(path))
                } else {
                    (Self::default(), None)
                }
            }
        };

        if let Ok(url) = env::var("SIGNAL_WEBHOOK_URL") {
            let token = env::var("SIGNAL_WEBHOOK_TOKEN").ok();
            cfg.forwarding = Some(ForwardingCfg { url, token });
        }
        cfg.validate()?;
        Ok((cfg, path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings.tracing_level()?;
        if self.settings.dedup_cache_size < 2 {
            return Err(ConfigError::InvalidValue(format!(
                "settings.dedup_cache_size must be at least 2, got {}",
                self.settings.dedup_cache_size
            )));
        }
        if let Some(forwarding) = &self.forwarding {
            if !forwarding.url.starts_with("http://") && !forwarding.url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(
                    "forwarding.url must start with http:// or https://".to_string(),
                ));
            }
        }
        if let Some(bots) = &self.monitored_bots {
            let mut names = std::collections::HashSet::new();
            for bot in bots {
                if !names.insert(bot.name.as_str()) {
                    return Err(ConfigError::InvalidValue(format!("duplicate grammar name {}", bot.name)));
                }
            }
        }
        self.grammars()?;
        Ok(())
    }

    /// Compiles the configured grammars, or the built-in table when none are configured.
    pub fn grammars(&self) -> Result<Vec<SourceGrammar>, ConfigError> {
        match &self.monitored_bots {
            Some(bots) => bots
                .iter()
                .map(|bot| {
                    SourceGrammar::new(
                        &bot.name,
                        bot.username.as_deref().unwrap_or(&bot.name),
                        &bot.pattern,
                        FieldLayout { ticker_group: bot.ticker_group, direction_group: bot.direction_group },
                        bot.enabled,
                    )
                    .map_err(ConfigError::from)
                })
                .collect(),
            None => Ok(builtin_grammars()?),
        }
    }

    pub fn blacklist(&self) -> Blacklist {
        Blacklist::new(self.blacklist.enabled, &self.blacklist.tickers)
    }

    pub fn build_pipeline(&self) -> Result<SignalPipeline, ConfigError> {
        Ok(SignalPipeline::new(self.grammars()?, self.blacklist(), self.settings.dedup_cache_size))
    }
}
