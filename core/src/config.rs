//! Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file: an explicit path, else `CADENCE_CONFIG_PATH`, else
//!    `cadence.toml` in the current directory when it exists
//! 3. Environment variables: `CADENCE_<SECTION>__<KEY>`, for example
//!    `CADENCE_ENGINE__SLICE_STEPS=500`
//! 4. Overrides set on the builder
//!
//! A `.env` file is loaded into the process environment first.

use ::config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "CADENCE_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Load(#[from] ::config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Host directory mounted as the virtual filesystem root
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interpreter steps per engine slice before control returns to the host
    pub slice_steps: usize,
    /// Deepest import nesting allowed before an import fails
    pub max_import_depth: usize,
    /// Working directory a fresh chain starts from
    pub initial_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slice_steps: 10_000,
            max_import_depth: 256,
            initial_dir: "/".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load with no overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.slice_steps == 0 {
            return Err(ConfigError::Invalid(
                "engine.slice_steps must be at least 1".to_string(),
            ));
        }
        if self.engine.max_import_depth == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_import_depth must be at least 1".to_string(),
            ));
        }
        if !self.engine.initial_dir.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "engine.initial_dir must be an absolute virtual path, got '{}'",
                self.engine.initial_dir
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    root_dir: Option<PathBuf>,
    slice_steps: Option<usize>,
    log_level: Option<String>,
    skip_env: bool,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn root_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.root_dir = dir;
        self
    }

    pub fn slice_steps(mut self, steps: Option<usize>) -> Self {
        self.slice_steps = steps;
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    /// Ignore the process environment (tests)
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if !self.skip_env {
            let _ = dotenvy::dotenv();
        }

        let defaults = Config::default();
        let mut builder = ::config::Config::builder()
            .set_default(
                "project.root_dir",
                defaults.project.root_dir.to_string_lossy().into_owned(),
            )?
            .set_default("engine.slice_steps", defaults.engine.slice_steps as i64)?
            .set_default(
                "engine.max_import_depth",
                defaults.engine.max_import_depth as i64,
            )?
            .set_default("engine.initial_dir", defaults.engine.initial_dir)?
            .set_default("logging.level", defaults.logging.level)?;

        let env_path = if self.skip_env {
            None
        } else {
            std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from)
        };
        match self.config_path.or(env_path) {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path));
                }
                builder = builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml));
            }
            None => {
                builder = builder.add_source(
                    File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
                );
            }
        }

        if !self.skip_env {
            builder = builder.add_source(
                Environment::with_prefix("CADENCE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        if let Some(dir) = self.root_dir {
            builder = builder.set_override("project.root_dir", dir.to_string_lossy().into_owned())?;
        }
        if let Some(steps) = self.slice_steps {
            builder = builder.set_override("engine.slice_steps", steps as i64)?;
        }
        if let Some(level) = self.log_level {
            builder = builder.set_override("logging.level", level)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::builder().skip_env().build().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.engine.max_import_depth, 256);
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::builder()
            .skip_env()
            .root_dir(Some(PathBuf::from("/srv/app")))
            .slice_steps(Some(64))
            .log_level(Some("debug".to_string()))
            .build()
            .unwrap();
        assert_eq!(config.project.root_dir, PathBuf::from("/srv/app"));
        assert_eq!(config.engine.slice_steps, 64);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_file_layer() {
        let path = std::env::temp_dir().join(format!("cadence-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[engine]\nslice_steps = 7\ninitial_dir = \"/proj\"\n").unwrap();

        let config = Config::builder()
            .skip_env()
            .config_path(Some(path.clone()))
            .build()
            .unwrap();
        assert_eq!(config.engine.slice_steps, 7);
        assert_eq!(config.engine.initial_dir, "/proj");
        assert_eq!(config.engine.max_import_depth, 256);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Config::builder()
            .skip_env()
            .config_path(Some(PathBuf::from("/definitely/not/here.toml")))
            .build();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_rejects_zero_slice() {
        let result = Config::builder().skip_env().slice_steps(Some(0)).build();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_to_toml() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("[engine]"));
        assert!(rendered.contains("slice_steps = 10000"));
    }
}
