use crate::{AppConfig, ConfigError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const ORG: &str = "io";
const AUTHOR: &str = "Cairn";
const APP: &str = "CairnMail";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from(ORG, AUTHOR, APP).ok_or(ConfigError::MissingDirectories)?;
        Self::with_dirs(
            dirs.config_dir().to_path_buf(),
            dirs.data_dir().to_path_buf(),
            dirs.cache_dir().to_path_buf(),
        )
    }

    /// Roots the layout at explicit directories instead of the platform ones.
    pub fn with_dirs(
        config_dir: PathBuf,
        data_dir: PathBuf,
        cache_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        fs::create_dir_all(&config_dir)?;
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&cache_dir)?;

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            let initial = AppConfig::default();
            let content = toml::to_string_pretty(&initial)?;
            fs::write(&config_path, content)?;
            tracing::info!(path = %config_path.display(), "wrote default config");
        }

        Ok(Self {
            config_path,
            data_dir,
            cache_dir,
        })
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(&self.config_path)?;
        let config: AppConfig = toml::from_str(&content)?;
        validate(&config)?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        validate(config)?;
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.service.max_thread_results == 0 {
        return Err(ConfigError::Invalid(
            "service.max_thread_results must be at least 1".to_string(),
        ));
    }
    if config.ui.refresh_interval_secs == 0 {
        return Err(ConfigError::Invalid(
            "ui.refresh_interval_secs must be at least 1".to_string(),
        ));
    }
    if config.ui.default_label_ids.is_empty() {
        return Err(ConfigError::Invalid(
            "ui.default_label_ids must name at least one label".to_string(),
        ));
    }
    if config.fixtures.enabled && config.fixtures.directory.is_none() {
        return Err(ConfigError::Invalid(
            "fixtures.directory is required when fixtures are enabled".to_string(),
        ));
    }
    Ok(())
}
