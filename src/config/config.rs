use crate::data::data_exporter::ExportFormat;
use crate::data::filter::FilterMap;
use crate::data::paginator::{DEFAULT_PAGE_SIZE, RECOMMENDED_PAGE_SIZES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub view: ViewConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
    pub filter_presets: Vec<FilterPreset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Rows per page when a table first renders
    pub default_page_size: usize,

    /// Choices offered by the rows-per-page selector
    pub page_sizes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,

    /// Files are named `<prefix>-<timestamp>.<ext>`
    pub filename_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when RUST_LOG is not set
    pub level: String,
}

/// A named, ready-made set of filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub label: String,
    #[serde(default)]
    pub filter: FilterMap,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_sizes: RECOMMENDED_PAGE_SIZES.to_vec(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            filename_prefix: "data".to_string(),
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
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        // A zero page size would make every page empty
        if config.view.default_page_size == 0 {
            config.view.default_page_size = DEFAULT_PAGE_SIZE;
        }
        config.view.page_sizes.retain(|&size| size > 0);

        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("filterable-table").join("config.toml"))
    }

    pub fn find_preset(&self, label: &str) -> Option<&FilterPreset> {
        self.filter_presets
            .iter()
            .find(|preset| preset.label.eq_ignore_ascii_case(label))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Filterable table configuration
# Location: ~/.config/filterable-table/config.toml (Linux)
#           ~/Library/Application Support/filterable-table/config.toml (macOS)
#           %APPDATA%\filterable-table\config.toml (Windows)

[view]
# Rows per page when a table is first shown
default_page_size = 20

# Choices in the rows-per-page selector (any positive size is accepted)
page_sizes = [20, 50, 100, 1000, 5000, 10000]

[export]
# "csv", "tsv" or "json"
format = "csv"

# Exported files are named <prefix>-<ISO 8601 timestamp>.<ext>
filename_prefix = "data"

[logging]
# Log level used when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
level = "info"

# Filter presets, applied with --preset <label>
# [[filter_presets]]
# label = "Active Montreal candidates"
# [filter_presets.filter.site]
# value = "MTL"
# exactMatch = true
# [filter_presets.filter.active]
# value = true
"#
        .to_string()
    }
}
