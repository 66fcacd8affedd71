//! Column filters.
//!
//! A [`FilterSpec`] declares that a column can be filtered and under which
//! name; a [`FilterMap`] carries the values currently selected by the user,
//! keyed by that name. At apply time each active pair is compiled once into
//! a [`ColumnFilter`] and evaluated against every row.

use crate::data::datatable::{DataColumn, DataRow, DataValue};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Widget kind a filter is rendered with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Text,
    Select,
    Multiselect,
    Numeric,
    Date,
    Checkbox,
}

impl FilterType {
    /// Free-text widgets match on substrings; every other widget submits
    /// a complete value.
    pub fn default_exact_match(self) -> bool {
        !matches!(self, FilterType::Text | FilterType::Date)
    }
}

/// Filter declaration attached to a column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub filter_type: FilterType,
    /// Option key -> display label, for select widgets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub exact_match: bool,
    #[serde(default)]
    pub opposite: bool,
    /// Keep the filter out of the filter form (still applied if set)
    #[serde(default)]
    pub hide: bool,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>, filter_type: FilterType) -> Self {
        Self {
            name: name.into(),
            filter_type,
            ..Self::default()
        }
    }

    pub fn with_options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options = Some(
            options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

/// Value selected for a filter.
///
/// Untagged, so JSON `3`, `"abc"`, `true` and `["a", "b"]` map onto the
/// matching variant. Anything else lands in `Unsupported` and matches no row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Boolean(bool),
    Numeric(f64),
    Text(String),
    MultiValue(Vec<String>),
    Unsupported(JsonValue),
}

impl FilterValue {
    /// Nothing selected: empty text, empty selection or null.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(text) => text.is_empty(),
            FilterValue::MultiValue(items) => items.is_empty(),
            FilterValue::Unsupported(JsonValue::Null) => true,
            _ => false,
        }
    }

    /// Single-valued selection as an option key
    fn as_option_key(&self) -> Option<String> {
        match self {
            FilterValue::Text(text) => Some(text.clone()),
            FilterValue::Numeric(n) => Some(DataValue::Float(*n).to_string()),
            FilterValue::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Numeric(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Numeric(value as f64)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Numeric(f64::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::MultiValue(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(value: Vec<&str>) -> Self {
        FilterValue::MultiValue(value.into_iter().map(str::to_string).collect())
    }
}

/// Active value for one filter plus its modifiers.
///
/// Unset modifiers fall back to the column's [`FilterSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEntry {
    pub value: FilterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opposite: Option<bool>,
}

impl FilterEntry {
    pub fn new(value: impl Into<FilterValue>) -> Self {
        Self {
            value: value.into(),
            exact_match: None,
            opposite: None,
        }
    }

    pub fn exact(mut self, exact_match: bool) -> Self {
        self.exact_match = Some(exact_match);
        self
    }

    pub fn opposite(mut self, opposite: bool) -> Self {
        self.opposite = Some(opposite);
        self
    }
}

/// Active filters keyed by filter name. A missing key means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMap {
    entries: BTreeMap<String, FilterEntry>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, entry: FilterEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: FilterEntry) -> Option<FilterEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterEntry> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FilterEntry> {
        self.entries.get(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Apply a filter form field change and return the resulting map.
    ///
    /// An empty value drops the entry; anything else replaces it, with
    /// `exactMatch` derived from the widget type.
    pub fn update_field(
        &self,
        name: &str,
        value: impl Into<FilterValue>,
        field_type: FilterType,
    ) -> FilterMap {
        let value = value.into();
        let mut next = self.clone();
        if value.is_empty() {
            next.remove(name);
        } else {
            next.insert(
                name,
                FilterEntry::new(value).exact(field_type.default_exact_match()),
            );
        }
        next
    }

    /// Drop entries no column can use.
    ///
    /// Unknown names go, and so do select values that are not among the
    /// column's option keys (stale presets or hand-edited query strings).
    pub fn validated(&self, columns: &[DataColumn]) -> FilterMap {
        let mut valid = FilterMap::new();
        for spec in columns.iter().filter_map(|c| c.filter.as_ref()) {
            let Some(entry) = self.get(&spec.name) else {
                continue;
            };

            if spec.filter_type == FilterType::Select {
                let known = match (&spec.options, entry.value.as_option_key()) {
                    (Some(options), Some(key)) => options.contains_key(&key),
                    _ => false,
                };
                if !known {
                    tracing::debug!(
                        target: "filter",
                        "Dropping filter '{}': value {:?} is not a select option",
                        spec.name,
                        entry.value
                    );
                    continue;
                }
            }

            valid.insert(spec.name.clone(), entry.clone());
        }
        valid
    }
}

impl FromIterator<(String, FilterEntry)> for FilterMap {
    fn from_iter<T: IntoIterator<Item = (String, FilterEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// How a text filter compares against a scalar cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Exact,
    Opposite,
    Contains,
}

/// A filter value resolved against its spec, ready to test cells
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Equality with the cell parsed as a base-10 integer
    Numeric(f64),
    /// Case-folded comparison against the cell text
    Text { key: String, mode: TextMode },
    /// Strict equality with a boolean cell
    Boolean(bool),
    /// Any case-folded key is a substring of the cell text
    AnyOf(Vec<String>),
    /// Unsupported filter value
    Never,
}

impl Predicate {
    pub fn compile(spec: &FilterSpec, entry: &FilterEntry) -> Self {
        let exact_match = entry.exact_match.unwrap_or(spec.exact_match);
        let opposite = entry.opposite.unwrap_or(spec.opposite);

        match &entry.value {
            FilterValue::Numeric(n) => Predicate::Numeric(*n),
            FilterValue::Text(text) => {
                let mode = if exact_match {
                    TextMode::Exact
                } else if opposite {
                    TextMode::Opposite
                } else {
                    TextMode::Contains
                };
                Predicate::Text {
                    key: text.to_lowercase(),
                    mode,
                }
            }
            FilterValue::Boolean(b) => Predicate::Boolean(*b),
            FilterValue::MultiValue(items) => {
                Predicate::AnyOf(items.iter().map(|item| item.to_lowercase()).collect())
            }
            FilterValue::Unsupported(_) => Predicate::Never,
        }
    }

    pub fn evaluate(&self, cell: &DataValue) -> bool {
        match self {
            Predicate::Numeric(expected) => {
                parse_int_prefix(&cell_text(cell)).is_some_and(|n| n == *expected)
            }
            Predicate::Text { key, mode } => match cell {
                // Multi-valued cells only distinguish exact from substring
                DataValue::List(items) => {
                    let mut folded = items.iter().map(|item| item.to_lowercase());
                    if *mode == TextMode::Exact {
                        folded.any(|item| item == *key)
                    } else {
                        folded.any(|item| item.contains(key.as_str()))
                    }
                }
                _ => {
                    let haystack = cell_text(cell).to_lowercase();
                    match mode {
                        TextMode::Exact => haystack == *key,
                        TextMode::Opposite => haystack != *key,
                        TextMode::Contains => haystack.contains(key.as_str()),
                    }
                }
            },
            Predicate::Boolean(expected) => matches!(cell, DataValue::Boolean(b) if b == expected),
            Predicate::AnyOf(keys) => {
                let haystack = cell_text(cell).to_lowercase();
                keys.iter().any(|key| haystack.contains(key.as_str()))
            }
            Predicate::Never => false,
        }
    }
}

/// Text a cell is matched against; null reads as empty
fn cell_text(cell: &DataValue) -> String {
    match cell {
        DataValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Leading base-10 integer of `text`, ignoring leading whitespace and any
/// trailing garbage ("42abc" -> 42, "3.9" -> 3, "abc" -> None).
/// Digit runs past the i64 range round to the nearest f64.
fn parse_int_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: f64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Test one cell against one filter value.
pub fn matches(spec: &FilterSpec, entry: &FilterEntry, cell: &DataValue) -> bool {
    Predicate::compile(spec, entry).evaluate(cell)
}

/// Compiled filter bound to a column position
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub column: usize,
    pub predicate: Predicate,
}

impl ColumnFilter {
    pub fn evaluate(&self, row: &DataRow) -> bool {
        self.predicate
            .evaluate(row.get(self.column).unwrap_or(&DataValue::Null))
    }
}

/// Resolve every column filter that has an active entry.
///
/// Columns without a spec, or whose spec name is absent from `filters`,
/// produce nothing and so never constrain a row.
pub fn compile_filters(columns: &[DataColumn], filters: &FilterMap) -> Vec<ColumnFilter> {
    columns
        .iter()
        .enumerate()
        .filter_map(|(column, col)| {
            let spec = col.filter.as_ref()?;
            let entry = filters.get(&spec.name)?;
            Some(ColumnFilter {
                column,
                predicate: Predicate::compile(spec, entry),
            })
        })
        .collect()
}

/// A row passes when every compiled filter accepts it
pub fn row_matches(row: &DataRow, filters: &[ColumnFilter]) -> bool {
    filters.iter().all(|filter| filter.evaluate(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_spec() -> FilterSpec {
        FilterSpec::new("name", FilterType::Text)
    }

    fn list(items: &[&str]) -> DataValue {
        DataValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42"), Some(42.0));
        assert_eq!(parse_int_prefix("  -7px"), Some(-7.0));
        assert_eq!(parse_int_prefix("3.9"), Some(3.0));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
    }

    #[test]
    fn test_numeric_filter_beyond_i64_range() {
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(1e20));
        assert_eq!(parse_int_prefix("-99999999999999999999 units"), Some(-1e20));

        let spec = FilterSpec::new("count", FilterType::Numeric);
        let entry = FilterEntry::new(1e20);
        assert!(matches(&spec, &entry, &DataValue::from("99999999999999999999")));
        assert!(!matches(&spec, &entry, &DataValue::from("9999999999")));
    }

    #[test]
    fn test_numeric_filter() {
        let spec = FilterSpec::new("age", FilterType::Numeric);
        let entry = FilterEntry::new(30);

        assert!(matches(&spec, &entry, &DataValue::Integer(30)));
        assert!(matches(&spec, &entry, &DataValue::from("30 years")));
        assert!(matches(&spec, &entry, &DataValue::Float(30.6)));
        assert!(!matches(&spec, &entry, &DataValue::Integer(31)));
        assert!(!matches(&spec, &entry, &DataValue::from("thirty")));
        assert!(!matches(&spec, &entry, &DataValue::Null));
        assert!(!matches(&spec, &entry, &DataValue::Boolean(true)));
    }

    #[test]
    fn test_fractional_numeric_filter_never_matches() {
        let spec = FilterSpec::new("age", FilterType::Numeric);
        let entry = FilterEntry::new(2.5);
        assert!(!matches(&spec, &entry, &DataValue::Float(2.5)));
    }

    #[test]
    fn test_text_substring_is_case_insensitive() {
        let entry = FilterEntry::new("ALI");
        assert!(matches(&text_spec(), &entry, &DataValue::from("Alice")));
        assert!(matches(&text_spec(), &entry, &DataValue::from("Natalie")));
        assert!(!matches(&text_spec(), &entry, &DataValue::from("Bob")));
    }

    #[test]
    fn test_text_matches_stringified_numbers() {
        let entry = FilterEntry::new("12");
        assert!(matches(&text_spec(), &entry, &DataValue::Integer(3120)));
    }

    #[test]
    fn test_text_exact_match() {
        let entry = FilterEntry::new("alice").exact(true);
        assert!(matches(&text_spec(), &entry, &DataValue::from("ALICE")));
        assert!(!matches(&text_spec(), &entry, &DataValue::from("Alice B")));
    }

    #[test]
    fn test_text_opposite() {
        let entry = FilterEntry::new("Pending").opposite(true);
        assert!(matches(&text_spec(), &entry, &DataValue::from("Done")));
        assert!(!matches(&text_spec(), &entry, &DataValue::from("pending")));
        // Only whole-value inequality; substrings still pass
        assert!(matches(&text_spec(), &entry, &DataValue::from("Pending review")));
    }

    #[test]
    fn test_exact_match_wins_over_opposite() {
        let entry = FilterEntry::new("a").exact(true).opposite(true);
        assert!(matches(&text_spec(), &entry, &DataValue::from("A")));
    }

    #[test]
    fn test_modifiers_fall_back_to_spec() {
        let mut spec = text_spec();
        spec.exact_match = true;
        assert!(!matches(&spec, &FilterEntry::new("ali"), &DataValue::from("Alice")));
        assert!(matches(
            &spec,
            &FilterEntry::new("ali").exact(false),
            &DataValue::from("Alice")
        ));
    }

    #[test]
    fn test_text_against_null_cell() {
        assert!(matches(&text_spec(), &FilterEntry::new(""), &DataValue::Null));
        assert!(!matches(&text_spec(), &FilterEntry::new("x"), &DataValue::Null));
        assert!(matches(
            &text_spec(),
            &FilterEntry::new("x").opposite(true),
            &DataValue::Null
        ));
    }

    #[test]
    fn test_text_against_multi_valued_cell() {
        let cell = list(&["Montreal", "Ottawa"]);
        assert!(matches(&text_spec(), &FilterEntry::new("OTT"), &cell));
        assert!(matches(&text_spec(), &FilterEntry::new("ottawa").exact(true), &cell));
        assert!(!matches(&text_spec(), &FilterEntry::new("otta").exact(true), &cell));
        // Negation does not apply to multi-valued cells
        assert!(matches(
            &text_spec(),
            &FilterEntry::new("montreal").opposite(true),
            &cell
        ));
    }

    #[test]
    fn test_boolean_filter_is_strict() {
        let spec = FilterSpec::new("active", FilterType::Checkbox);
        let entry = FilterEntry::new(true);
        assert!(matches(&spec, &entry, &DataValue::Boolean(true)));
        assert!(!matches(&spec, &entry, &DataValue::Boolean(false)));
        assert!(!matches(&spec, &entry, &DataValue::from("true")));
        assert!(!matches(&spec, &entry, &DataValue::Integer(1)));
    }

    #[test]
    fn test_multiselect_filter() {
        let spec = FilterSpec::new("site", FilterType::Multiselect);
        let entry = FilterEntry::new(vec!["mtl", "OTT"]);
        assert!(matches(&spec, &entry, &DataValue::from("MTL-01")));
        assert!(matches(&spec, &entry, &DataValue::from("ottawa")));
        assert!(!matches(&spec, &entry, &DataValue::from("Toronto")));
        assert!(!matches(&spec, &FilterEntry::new(Vec::<String>::new()), &DataValue::from("x")));
    }

    #[test]
    fn test_unsupported_value_matches_nothing() {
        let entry: FilterEntry = serde_json::from_str(r#"{"value": {"min": 3}}"#).unwrap();
        assert_eq!(entry.value, FilterValue::Unsupported(serde_json::json!({"min": 3})));
        assert!(!matches(&text_spec(), &entry, &DataValue::from("anything")));
        assert!(!matches(&text_spec(), &entry, &DataValue::Null));
    }

    #[test]
    fn test_filter_map_from_json() {
        let map: FilterMap = serde_json::from_str(
            r#"{
                "letter": {"value": "a", "exactMatch": false},
                "num": {"value": 3},
                "flag": {"value": true},
                "sites": {"value": ["a", "b"], "opposite": true}
            }"#,
        )
        .unwrap();

        assert_eq!(map.len(), 4);
        assert_eq!(map.get("letter").unwrap().exact_match, Some(false));
        assert_eq!(map.get("num").unwrap().value, FilterValue::Numeric(3.0));
        assert_eq!(map.get("flag").unwrap().value, FilterValue::Boolean(true));
        assert_eq!(
            map.get("sites").unwrap().value,
            FilterValue::MultiValue(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_compile_filters_skips_unfiltered_columns() {
        let columns = vec![
            DataColumn::new("id"),
            DataColumn::new("name").with_filter(text_spec()),
            DataColumn::new("site").with_filter(FilterSpec::new("site", FilterType::Select)),
        ];
        let filters = FilterMap::new()
            .with("name", FilterEntry::new("al"))
            .with("unused", FilterEntry::new("zzz"));

        let compiled = compile_filters(&columns, &filters);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].column, 1);

        let row = DataRow::new(vec![DataValue::Integer(1), "Alice".into(), "MTL".into()]);
        assert!(row_matches(&row, &compiled));
    }

    #[test]
    fn test_missing_cell_reads_as_null() {
        let filter = ColumnFilter {
            column: 5,
            predicate: Predicate::Text {
                key: String::new(),
                mode: TextMode::Contains,
            },
        };
        assert!(filter.evaluate(&DataRow::new(vec![])));
    }

    #[test]
    fn test_update_field() {
        let map = FilterMap::new()
            .update_field("name", "ali", FilterType::Text)
            .update_field("site", "MTL", FilterType::Select);

        assert_eq!(map.get("name").unwrap().exact_match, Some(false));
        assert_eq!(map.get("site").unwrap().exact_match, Some(true));

        let cleared = map.update_field("name", "", FilterType::Text);
        assert!(cleared.get("name").is_none());
        assert_eq!(cleared.len(), 1);

        let cleared = cleared.update_field("site", Vec::<String>::new(), FilterType::Multiselect);
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_validated_drops_unknown_select_options() {
        let columns = vec![
            DataColumn::new("site").with_filter(
                FilterSpec::new("site", FilterType::Select)
                    .with_options([("1", "Montreal"), ("2", "Ottawa")]),
            ),
            DataColumn::new("name").with_filter(text_spec()),
        ];

        let filters = FilterMap::new()
            .with("site", FilterEntry::new("3"))
            .with("name", FilterEntry::new("x"))
            .with("ghost", FilterEntry::new("y"));
        let valid = filters.validated(&columns);
        assert_eq!(valid.len(), 1);
        assert!(valid.get("name").is_some());

        let filters = FilterMap::new().with("site", FilterEntry::new(2));
        assert!(filters.validated(&columns).get("site").is_some());
    }
}
