use crate::data::datatable::{DataColumn, DataRow, DataTable, DataType, DataValue};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Rows sampled for per-column type inference
const TYPE_SAMPLE_SIZE: usize = 100;

/// Load a CSV file into a DataTable
pub fn load_csv_to_datatable<P: AsRef<Path>>(path: P, table_name: &str) -> Result<DataTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let mut table = DataTable::new(table_name);
    table
        .metadata
        .insert("source_type".to_string(), "csv".to_string());
    table.metadata.insert(
        "source_path".to_string(),
        path.as_ref().display().to_string(),
    );

    for header in headers.iter() {
        table.add_column(DataColumn::new(header));
    }

    let mut string_rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        row.resize(headers.len(), String::new());
        string_rows.push(row);
    }

    let mut column_types = vec![DataType::Null; headers.len()];
    for row in string_rows.iter().take(TYPE_SAMPLE_SIZE) {
        for (col_idx, value) in row.iter().enumerate() {
            if !value.is_empty() {
                let inferred = DataType::infer_from_string(value);
                column_types[col_idx] = column_types[col_idx].merge(&inferred);
            }
        }
    }

    for string_row in string_rows {
        let values = string_row
            .iter()
            .zip(&column_types)
            .map(|(value, data_type)| DataValue::from_string(value, data_type))
            .collect();
        table.add_row(DataRow::new(values))?;
    }

    table.infer_column_types();
    tracing::debug!(
        target: "loader",
        "Loaded {} rows x {} columns from {:?}",
        table.row_count(),
        table.column_count(),
        path.as_ref()
    );
    Ok(table)
}

/// Load a JSON file into a DataTable.
///
/// Accepts an array of objects; columns come from the first object's keys,
/// in the order they appear in the file.
/// Array values become multi-valued cells.
pub fn load_json_to_datatable<P: AsRef<Path>>(path: P, table_name: &str) -> Result<DataTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open JSON file: {:?}", path.as_ref()))?;
    let reader = BufReader::new(file);

    let json_data: Vec<JsonValue> =
        serde_json::from_reader(reader).with_context(|| "Failed to parse JSON file")?;

    let mut table = DataTable::new(table_name);
    table
        .metadata
        .insert("source_type".to_string(), "json".to_string());
    table.metadata.insert(
        "source_path".to_string(),
        path.as_ref().display().to_string(),
    );

    let Some(first) = json_data.first() else {
        return Ok(table);
    };
    let first_obj = first
        .as_object()
        .context("JSON data must be an array of objects")?;

    let column_names: Vec<String> = first_obj.keys().cloned().collect();
    for name in &column_names {
        table.add_column(DataColumn::new(name));
    }

    for json_obj in &json_data {
        let obj = json_obj
            .as_object()
            .context("JSON data must be an array of objects")?;
        let values = column_names
            .iter()
            .map(|name| {
                obj.get(name)
                    .map(DataValue::from_json)
                    .unwrap_or(DataValue::Null)
            })
            .collect();
        table.add_row(DataRow::new(values))?;
    }

    table.infer_column_types();
    Ok(table)
}

/// Pick a loader from the file extension
pub fn load_datatable<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let path = path.as_ref();
    let table_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("data")
        .to_string();

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json_to_datatable(path, &table_name),
        _ => load_csv_to_datatable(path, &table_name),
    }
}
