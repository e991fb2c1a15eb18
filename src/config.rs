//! Application configuration loaded from an optional TOML file.
//!
//! Lookup order: the path in `REAL_INCOME_CONFIG`, then `real_income.toml` in
//! the working directory, then built-in defaults. Every key is optional.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable that points at a configuration file.
pub const CONFIG_ENV_VAR: &str = "REAL_INCOME_CONFIG";

/// File name probed in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "real_income.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub view: ViewConfig,
    pub window: WindowConfig,
}

/// Names used to locate data inside the uploaded workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Sheet read from spreadsheet workbooks
    pub sheet_name: String,
    /// Income topic used when present
    pub preferred_income_topic: String,
    /// Series used as the CPI deflator
    pub cpi_series: String,
    pub national_level: String,
    pub state_level: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sheet_name: "cleaned_long".to_string(),
            preferred_income_topic: "income_per_capita".to_string(),
            cpi_series: "CPIAUCSL".to_string(),
            national_level: "national".to_string(),
            state_level: "state".to_string(),
        }
    }
}

/// Initial values and bounds of the dashboard controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// State shown when the dataset has no state rows
    pub default_state: String,
    pub default_start_year: i32,
    pub default_base_year: i32,
    pub min_base_year: i32,
    pub max_base_year: i32,
    /// Rows in each of the top/bottom ranking tables
    pub ranking_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_state: "MD".to_string(),
            default_start_year: 2000,
            default_base_year: 2017,
            min_base_year: 1985,
            max_base_year: 2030,
            ranking_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 850.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration file and load it, falling back to defaults
    /// when no file exists.
    pub fn discover() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) => {
                info!(path = %path.display(), "loading configuration");
                Self::from_file(path)
            }
            None => {
                debug!("no configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let view = &self.view;
        if view.min_base_year > view.max_base_year {
            anyhow::bail!(
                "view.min_base_year ({}) is greater than view.max_base_year ({})",
                view.min_base_year,
                view.max_base_year
            );
        }
        if view.ranking_size == 0 {
            anyhow::bail!("view.ranking_size must be at least 1");
        }
        if self.data.sheet_name.trim().is_empty() {
            anyhow::bail!("data.sheet_name must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.data.sheet_name, "cleaned_long");
        assert_eq!(config.view.default_base_year, 2017);
        assert_eq!(config.view.ranking_size, 10);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [data]
            cpi_series = "CPILFESL"

            [view]
            default_state = "VA"
            "#,
        )
        .unwrap();

        assert_eq!(config.data.cpi_series, "CPILFESL");
        assert_eq!(config.data.sheet_name, "cleaned_long");
        assert_eq!(config.view.default_state, "VA");
        assert_eq!(config.view.default_start_year, 2000);
    }

    #[test]
    fn rejects_inverted_base_year_bounds() {
        let err = AppConfig::from_toml_str(
            r#"
            [view]
            min_base_year = 2030
            max_base_year = 1985
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("min_base_year"));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(AppConfig::from_toml_str("[view\nranking_size = ").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[view]\nranking_size = 5").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.view.ranking_size, 5);
    }
}
