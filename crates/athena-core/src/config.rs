// ABOUTME: Layered settings for search presets and logging
// ABOUTME: default.toml, <env>.toml, local.toml, then ATHENA__* environment variables

use crate::error::{AthenaError, Result};
use crate::stage::AnalysisDepth;
use config as cfg;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::debug;

/// Search parameters applied for one analysis depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthPreset {
    pub n_candidates: usize,
    pub max_depth: usize,
    pub quality_threshold: f64,
}

impl DepthPreset {
    pub const fn new(n_candidates: usize, max_depth: usize, quality_threshold: f64) -> Self {
        Self {
            n_candidates,
            max_depth,
            quality_threshold,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.n_candidates == 0 {
            return Err(AthenaError::Config(format!(
                "lats.{}.n_candidates must be > 0",
                name
            )));
        }
        if self.max_depth == 0 {
            return Err(AthenaError::Config(format!(
                "lats.{}.max_depth must be > 0",
                name
            )));
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(AthenaError::Config(format!(
                "lats.{}.quality_threshold must be within [0, 1], got {}",
                name, self.quality_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatsSettings {
    /// Route Scout and Strategy through tree search
    pub enabled: bool,
    pub quick: DepthPreset,
    pub standard: DepthPreset,
    pub deep: DepthPreset,
}

impl Default for LatsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            quick: DepthPreset::new(1, 1, 0.50),
            standard: DepthPreset::new(2, 2, 0.65),
            deep: DepthPreset::new(3, 3, 0.75),
        }
    }
}

impl LatsSettings {
    pub fn preset(&self, depth: AnalysisDepth) -> DepthPreset {
        match depth {
            AnalysisDepth::Quick => self.quick,
            AnalysisDepth::Standard => self.standard,
            AnalysisDepth::Deep => self.deep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Newline-delimited JSON
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AthenaSettings {
    pub lats: LatsSettings,
    pub logging: LoggingSettings,
}

impl AthenaSettings {
    fn default_env() -> String {
        env::var("APP_ENV")
            .ok()
            .or_else(|| env::var("RUST_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    /// Load from `config_dir` using the environment named by `APP_ENV`/`RUST_ENV`.
    pub fn load(config_dir: &Path) -> Result<Self> {
        Self::load_from_sources(config_dir, &Self::default_env())
    }

    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Self> {
        let settings: AthenaSettings = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("ATHENA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        debug!(
            config_dir = %config_dir.display(),
            env = env_name,
            lats_enabled = settings.lats.enabled,
            "Settings loaded"
        );

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.lats.quick.validate("quick")?;
        self.lats.standard.validate("standard")?;
        self.lats.deep.validate("deep")?;
        if self.logging.level.trim().is_empty() {
            return Err(AthenaError::Config(
                "logging.level cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
