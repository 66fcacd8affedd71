use crate::data::datatable::{DataColumn, DataTable, DataType};
use crate::data::filter::{FilterSpec, FilterType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Column settings for a loaded table: visibility and filter declarations.
///
/// Loaded from JSON (`{"columns": [...]}` or a bare array) or TOML
/// (`[[columns]]`). Matched against the table by column label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub columns: Vec<DataColumn>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonTableConfig {
    Wrapped(TableConfig),
    Bare(Vec<DataColumn>),
}

impl TableConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read column config {:?}", path))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse column config {:?}", path)),
            _ => Self::from_json(&content)
                .with_context(|| format!("Failed to parse column config {:?}", path)),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config = match serde_json::from_str(content)? {
            JsonTableConfig::Wrapped(config) => config,
            JsonTableConfig::Bare(columns) => TableConfig { columns },
        };
        Ok(config)
    }

    /// Settings for a table loaded without a column config: every column is
    /// shown and filterable under its own label, with the widget picked from
    /// the inferred column type.
    pub fn inferred(table: &DataTable) -> Self {
        let columns = table
            .columns
            .iter()
            .map(|column| {
                let filter_type = match column.data_type {
                    DataType::Integer | DataType::Float => FilterType::Numeric,
                    DataType::Boolean => FilterType::Checkbox,
                    DataType::List => FilterType::Multiselect,
                    _ => FilterType::Text,
                };
                DataColumn::new(&column.label)
                    .with_filter(FilterSpec::new(&column.label, filter_type))
            })
            .collect();
        TableConfig { columns }
    }

    /// Copy `show` and `filter` onto the table's columns with the same label.
    ///
    /// Returns the number of columns updated. Labels the table does not
    /// have are skipped with a warning.
    pub fn apply(&self, table: &mut DataTable) -> usize {
        let mut applied = 0;
        for configured in &self.columns {
            let Some(index) = table.get_column_index(&configured.label) else {
                tracing::warn!(
                    target: "loader",
                    "Column config names unknown column '{}'",
                    configured.label
                );
                continue;
            };

            let column = &mut table.columns[index];
            column.show = configured.show;
            column.filter = configured.filter.clone();
            applied += 1;
        }

        tracing::debug!(
            target: "loader",
            "Applied column config to {} of {} columns",
            applied,
            table.column_count()
        );
        applied
    }
}
