use crate::data::filter::FilterSpec;
use crate::error::ViewError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// Represents the data type of a column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    List,
    Null,
    Mixed, // For columns with mixed types
}

impl DataType {
    /// Infer type from a string value
    pub fn infer_from_string(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return DataType::Null;
        }

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return DataType::Boolean;
        }

        if value.parse::<i64>().is_ok() {
            return DataType::Integer;
        }

        if value.parse::<f64>().is_ok() {
            return DataType::Float;
        }

        DataType::String
    }

    /// Merge two types (for columns with mixed types)
    pub fn merge(&self, other: &DataType) -> DataType {
        if self == other {
            return self.clone();
        }

        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => t.clone(),
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                DataType::Float
            }
            _ => DataType::Mixed,
        }
    }
}

fn default_show() -> bool {
    true
}

/// Column definition: a label, a visibility flag and an optional filter.
///
/// Hidden columns stay in row storage and in exports; only rendering
/// skips them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataColumn {
    pub label: String,
    #[serde(default = "default_show")]
    pub show: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
    #[serde(default, skip_serializing)]
    pub data_type: DataType,
}

impl DataColumn {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            show: true,
            filter: None,
            data_type: DataType::String,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.show = false;
        self
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

/// A single cell value in the table
///
/// Serialized untagged so that rows read naturally as JSON arrays,
/// e.g. `[1, "b", null, ["x", "y"]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Multi-valued cell
    List(Vec<String>),
}

impl DataValue {
    pub fn from_string(s: &str, data_type: &DataType) -> Self {
        if s.is_empty() || s.eq_ignore_ascii_case("null") {
            return DataValue::Null;
        }

        match data_type {
            DataType::String | DataType::List => DataValue::String(s.to_string()),
            DataType::Integer => s
                .parse::<i64>()
                .map(DataValue::Integer)
                .unwrap_or_else(|_| DataValue::String(s.to_string())),
            DataType::Float => s
                .parse::<f64>()
                .map(DataValue::Float)
                .unwrap_or_else(|_| DataValue::String(s.to_string())),
            DataType::Boolean => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => DataValue::Boolean(true),
                "false" | "0" | "no" => DataValue::Boolean(false),
                _ => DataValue::String(s.to_string()),
            },
            DataType::Null => DataValue::Null,
            DataType::Mixed => {
                let inferred = DataType::infer_from_string(s);
                Self::from_string(s, &inferred)
            }
        }
    }

    /// Convert a JSON value; arrays become multi-valued cells.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => DataValue::Null,
            JsonValue::Bool(b) => DataValue::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DataValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    DataValue::Float(f)
                } else {
                    DataValue::String(n.to_string())
                }
            }
            JsonValue::String(s) => DataValue::String(s.clone()),
            JsonValue::Array(items) => DataValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        JsonValue::String(s) => s.clone(),
                        other => DataValue::from_json(other).to_string(),
                    })
                    .collect(),
            ),
            JsonValue::Object(_) => DataValue::String(json.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::List(_) => DataType::List,
            DataValue::Null => DataType::Null,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::List(items) => write!(f, "{}", items.join(",")),
            DataValue::Null => write!(f, ""),
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Integer(i64::from(value))
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DataValue::Null)
    }
}

/// A row of data in the table, positional by column index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRow {
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(values: Vec<DataValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build a `DataRow` from heterogeneous literals: `row![1, "b", None::<i64>]`
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::data::datatable::DataRow::new(vec![
            $($crate::data::datatable::DataValue::from($value)),*
        ])
    };
}

/// Cells of one row keyed by column label, handed to display formatters.
pub type LabeledRow<'a> = HashMap<&'a str, &'a DataValue>;

/// The raw dataset: fixed column order plus positional rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    pub rows: Vec<DataRow>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Build a table without checking row widths.
    ///
    /// Ragged rows are the caller's responsibility; missing cells read as null.
    pub fn from_parts(name: impl Into<String>, columns: Vec<DataColumn>, rows: Vec<DataRow>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
            metadata: HashMap::new(),
        }
    }

    pub fn add_column(&mut self, column: DataColumn) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn add_row(&mut self, row: DataRow) -> Result<(), ViewError> {
        if row.len() != self.columns.len() {
            return Err(ViewError::RaggedRow {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn get_column(&self, label: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    pub fn get_column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.label == label)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    /// Infer column types from the stored values
    pub fn infer_column_types(&mut self) {
        for (col_idx, column) in self.columns.iter_mut().enumerate() {
            let mut inferred_type = DataType::Null;
            for row in &self.rows {
                if let Some(value) = row.get(col_idx) {
                    if !value.is_null() {
                        inferred_type = inferred_type.merge(&value.data_type());
                    }
                }
            }
            column.data_type = inferred_type;
        }
    }

    pub fn get_value(&self, row: usize, col: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(col)
    }

    pub fn get_value_by_label(&self, row: usize, label: &str) -> Option<&DataValue> {
        let col_idx = self.get_column_index(label)?;
        self.get_value(row, col_idx)
    }

    /// Map every declared column label to the row's cell.
    pub fn labeled_row<'a>(&'a self, row: &'a DataRow) -> LabeledRow<'a> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(idx, column)| row.get(idx).map(|value| (column.label.as_str(), value)))
            .collect()
    }
}
