use crate::data::datatable::{DataColumn, DataRow, DataValue};
use crate::error::ExportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Per-cell transform applied on export: `(column label, raw value) -> exported value`
pub type CellMapper = Arc<dyn Fn(&str, &DataValue) -> DataValue + Send + Sync>;

/// Column-labelled snapshot of a derived dataset, ready for a file writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<DataValue>>,
}

impl ExportData {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Builds export payloads and serializes them
pub struct DataExporter;

impl DataExporter {
    /// Map rows into an export payload.
    ///
    /// Headers list every declared column, hidden ones included. Each cell
    /// goes through `mapper` when one is given; cells missing from a short
    /// row export as null.
    pub fn build_export<'a, I>(
        rows: I,
        columns: &[DataColumn],
        mapper: Option<&CellMapper>,
    ) -> ExportData
    where
        I: IntoIterator<Item = &'a DataRow>,
    {
        let headers: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        let value = row.get(idx).unwrap_or(&DataValue::Null);
                        match mapper {
                            Some(mapper) => mapper(&column.label, value),
                            None => value.clone(),
                        }
                    })
                    .collect()
            })
            .collect();

        ExportData { headers, rows }
    }

    pub fn serialize(
        headers: &[String],
        rows: &[Vec<DataValue>],
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Csv => Self::to_delimited(headers, rows, b','),
            ExportFormat::Tsv => Self::to_delimited(headers, rows, b'\t'),
            ExportFormat::Json => Self::to_json(headers, rows),
        }
    }

    /// CSV/TSV bytes with a header record; nulls become empty fields
    pub fn to_delimited(
        headers: &[String],
        rows: &[Vec<DataValue>],
        delimiter: u8,
    ) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        writer.flush()?;

        writer
            .into_inner()
            .map_err(|e| ExportError::ExportFailed(e.to_string()))
    }

    /// Pretty JSON array of objects keyed by header
    pub fn to_json(headers: &[String], rows: &[Vec<DataValue>]) -> Result<Vec<u8>, ExportError> {
        let mut json_array = Vec::with_capacity(rows.len());
        for row in rows {
            let mut json_obj = serde_json::Map::new();
            for (header, value) in headers.iter().zip(row) {
                json_obj.insert(header.clone(), serde_json::to_value(value)?);
            }
            json_array.push(Value::Object(json_obj));
        }
        Ok(serde_json::to_vec_pretty(&json_array)?)
    }

    /// `<prefix>-<ISO 8601 UTC, millisecond precision>.<ext>`,
    /// e.g. `data-2024-03-01T09:15:00.250Z.csv`
    pub fn export_filename(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
        format!(
            "{}-{}.{}",
            prefix,
            at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            extension
        )
    }
}
