use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::data_exporter::{CellMapper, DataExporter, ExportData};
use crate::data::datatable::{DataColumn, DataRow, DataTable, DataValue, LabeledRow};
use crate::data::datavalue_compare::compare;
use crate::data::export_worker::ExportRequest;
use crate::data::filter::{compile_filters, row_matches, ColumnFilter, FilterMap};
use crate::data::paginator::{PageState, Paginator};
use crate::error::ViewError;
use crate::{trace_filter, trace_sort};

/// Display transform: `(column label, value, whole row by label) -> text`
pub type CellFormatter = Arc<dyn Fn(&str, &DataValue, &LabeledRow<'_>) -> String + Send + Sync>;

/// Column and direction of the last sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: usize,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: 0,
            ascending: true,
        }
    }
}

/// What a renderer needs for one page
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Labels of `show` columns only
    pub headers: Vec<String>,
    /// Formatted cells of `show` columns, one vec per row on the page
    pub cells: Vec<Vec<String>>,
    /// Rows in the derived dataset, for pagination math
    pub total_rows: usize,
}

/// A filtered and sorted view over an immutable DataTable.
///
/// The table itself is never touched. Sorting reorders `base_order`, a
/// permutation of the raw rows, and the derived rows are always recomputed
/// from that permutation, so a filter applied after a sort keeps the sort.
#[derive(Clone)]
pub struct DataView {
    /// The underlying immutable data source
    source: Arc<DataTable>,

    /// Raw row indices in current sort order
    base_order: Vec<usize>,

    /// Row indices that pass the active filters, in `base_order` order
    visible_rows: Vec<usize>,

    /// None until the first sort
    sort: Option<SortState>,

    filter: FilterMap,

    mapper: Option<CellMapper>,
    formatter: Option<CellFormatter>,
}

impl DataView {
    /// Create a new view showing all data from the table
    pub fn new(source: Arc<DataTable>) -> Self {
        let row_count = source.row_count();

        Self {
            source,
            base_order: (0..row_count).collect(),
            visible_rows: (0..row_count).collect(),
            sort: None,
            filter: FilterMap::new(),
            mapper: None,
            formatter: None,
        }
    }

    /// Set the per-cell transform used when exporting
    pub fn with_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&str, &DataValue) -> DataValue + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Set the per-cell transform used when rendering
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, &DataValue, &LabeledRow<'_>) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn set_mapper(&mut self, mapper: Option<CellMapper>) {
        self.mapper = mapper;
    }

    pub fn set_formatter(&mut self, formatter: Option<CellFormatter>) {
        self.formatter = formatter;
    }

    /// Replace the active filters and recompute the derived rows.
    ///
    /// Every row of the (possibly sorted) raw dataset is tested again; an
    /// empty map yields all rows. Returns the derived row count.
    pub fn apply_filter(&mut self, filter: FilterMap) -> usize {
        let compiled = compile_filters(&self.source.columns, &filter);
        self.filter = filter;
        self.rederive(&compiled);

        trace_filter!(
            compiled.len(),
            self.visible_rows.len(),
            self.source.row_count()
        );
        self.visible_rows.len()
    }

    /// Drop all filters
    pub fn clear_filter(&mut self) -> usize {
        self.apply_filter(FilterMap::new())
    }

    /// Current filters
    pub fn filter(&self) -> &FilterMap {
        &self.filter
    }

    /// Sort by a column, toggling direction on repeated clicks.
    ///
    /// The same column as the last sort flips the direction; any other
    /// column (or the first sort ever) sorts ascending. The sort is stable
    /// and applies to the whole dataset, not just the visible page.
    pub fn sort_by(&mut self, column_index: usize) -> Result<SortState, ViewError> {
        let column_count = self.source.column_count();
        if column_index >= column_count {
            return Err(ViewError::ColumnOutOfRange {
                index: column_index,
                column_count,
            });
        }

        let ascending = match self.sort {
            Some(current) if current.column == column_index => !current.ascending,
            _ => true,
        };
        let state = SortState {
            column: column_index,
            ascending,
        };

        let source = &self.source;
        self.base_order.sort_by(|&a, &b| {
            compare(
                source.get_value(a, column_index),
                source.get_value(b, column_index),
                ascending,
            )
        });
        self.sort = Some(state);

        let compiled = compile_filters(&self.source.columns, &self.filter);
        self.rederive(&compiled);

        trace_sort!(
            self.source.columns[column_index].label,
            ascending,
            self.visible_rows.len()
        );
        Ok(state)
    }

    /// Last sort applied, or the default (first column, ascending)
    pub fn sort_state(&self) -> SortState {
        self.sort.unwrap_or_default()
    }

    pub fn is_sorted(&self) -> bool {
        self.sort.is_some()
    }

    fn rederive(&mut self, compiled: &[ColumnFilter]) {
        let source = &self.source;
        self.visible_rows = self
            .base_order
            .iter()
            .copied()
            .filter(|&row_idx| row_matches(&source.rows[row_idx], compiled))
            .collect();
    }

    /// The derived dataset, unpaginated
    pub fn current_view(&self) -> Vec<DataRow> {
        self.rows().cloned().collect()
    }

    /// Iterate the derived rows in order
    pub fn rows(&self) -> impl Iterator<Item = &DataRow> + '_ {
        self.visible_rows
            .iter()
            .map(move |&row_idx| &self.source.rows[row_idx])
    }

    /// Get a derived row by position
    pub fn get_row(&self, index: usize) -> Option<&DataRow> {
        let row_idx = *self.visible_rows.get(index)?;
        self.source.rows.get(row_idx)
    }

    /// Number of derived rows
    pub fn row_count(&self) -> usize {
        self.visible_rows.len()
    }

    /// Number of raw rows
    pub fn raw_row_count(&self) -> usize {
        self.source.row_count()
    }

    pub fn columns(&self) -> &[DataColumn] {
        &self.source.columns
    }

    /// Labels of columns with `show` set
    pub fn visible_headers(&self) -> Vec<String> {
        self.source
            .columns
            .iter()
            .filter(|c| c.show)
            .map(|c| c.label.clone())
            .collect()
    }

    /// Get the source DataTable
    pub fn source(&self) -> &DataTable {
        &self.source
    }

    /// Raw row indices of the derived rows
    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }

    /// Raw rows in the current sort order, ignoring filters
    pub fn sorted_raw_rows(&self) -> impl Iterator<Item = &DataRow> + '_ {
        self.base_order
            .iter()
            .map(move |&row_idx| &self.source.rows[row_idx])
    }

    /// Rows on one page of the derived dataset
    pub fn page(&self, page: &PageState) -> Vec<&DataRow> {
        Paginator::slice(&self.visible_rows, page)
            .iter()
            .map(|&row_idx| &self.source.rows[row_idx])
            .collect()
    }

    /// Reset `page` to 1 if the derived dataset no longer reaches it
    pub fn sync_page(&self, page: &mut PageState) -> bool {
        page.clamp_to(self.row_count())
    }

    /// Format one page for display through the formatter, if any
    pub fn render_page(&self, page: &PageState) -> RenderedPage {
        let columns = &self.source.columns;
        let cells = self
            .page(page)
            .into_iter()
            .map(|row| {
                let labeled = self.formatter.as_ref().map(|_| self.source.labeled_row(row));
                columns
                    .iter()
                    .enumerate()
                    .filter(|(_, column)| column.show)
                    .map(|(idx, column)| {
                        let value = row.get(idx).unwrap_or(&DataValue::Null);
                        match (&self.formatter, &labeled) {
                            (Some(format), Some(labeled)) => format(&column.label, value, labeled),
                            _ => value.to_string(),
                        }
                    })
                    .collect()
            })
            .collect();

        RenderedPage {
            headers: self.visible_headers(),
            cells,
            total_rows: self.row_count(),
        }
    }

    /// Export payload for every derived row, not just the visible page
    pub fn build_export(&self) -> ExportData {
        DataExporter::build_export(self.rows(), &self.source.columns, self.mapper.as_ref())
    }

    /// Snapshot of the derived rows for the export worker
    pub fn export_request(&self) -> ExportRequest {
        self.build_export().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterEntry, FilterSpec, FilterType};
    use crate::row;

    fn letters_table() -> DataTable {
        let mut table = DataTable::new("letters");
        table.add_column(
            DataColumn::new("num").with_filter(FilterSpec::new("num", FilterType::Numeric)),
        );
        table.add_column(
            DataColumn::new("letter").with_filter(FilterSpec::new("letter", FilterType::Text)),
        );
        table.add_row(row![1, "b"]).unwrap();
        table.add_row(row![3, "a"]).unwrap();
        table.add_row(row![2, "c"]).unwrap();
        table
    }

    fn nums(view: &DataView) -> Vec<i64> {
        view.rows()
            .map(|row| match row.get(0) {
                Some(DataValue::Integer(n)) => *n,
                other => panic!("unexpected cell {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_new_view_shows_all_rows_in_order() {
        let view = DataView::new(Arc::new(letters_table()));
        assert_eq!(view.row_count(), 3);
        assert_eq!(nums(&view), vec![1, 3, 2]);
        assert!(!view.is_sorted());
        assert_eq!(view.sort_state(), SortState::default());
    }

    #[test]
    fn test_sort_toggles_direction() {
        let mut view = DataView::new(Arc::new(letters_table()));

        let state = view.sort_by(0).unwrap();
        assert!(state.ascending);
        assert_eq!(nums(&view), vec![1, 2, 3]);

        let state = view.sort_by(0).unwrap();
        assert!(!state.ascending);
        assert_eq!(nums(&view), vec![3, 2, 1]);

        // Another column starts ascending again
        let state = view.sort_by(1).unwrap();
        assert_eq!(
            state,
            SortState {
                column: 1,
                ascending: true
            }
        );
        assert_eq!(nums(&view), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_out_of_range_column() {
        let mut view = DataView::new(Arc::new(letters_table()));
        assert_eq!(
            view.sort_by(2),
            Err(ViewError::ColumnOutOfRange {
                index: 2,
                column_count: 2
            })
        );
        assert!(!view.is_sorted());
    }

    #[test]
    fn test_filter_by_substring() {
        let mut view = DataView::new(Arc::new(letters_table()));
        let count =
            view.apply_filter(FilterMap::new().with("letter", FilterEntry::new("a").exact(false)));
        assert_eq!(count, 1);
        assert_eq!(view.current_view(), vec![row![3, "a"]]);
    }

    #[test]
    fn test_filter_after_sort_keeps_sort_order() {
        let mut view = DataView::new(Arc::new(letters_table()));
        view.sort_by(0).unwrap();
        view.sort_by(0).unwrap();

        view.apply_filter(FilterMap::new().with("letter", FilterEntry::new("b").opposite(true)));
        assert_eq!(nums(&view), vec![3, 2]);

        view.clear_filter();
        assert_eq!(nums(&view), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_keeps_active_filter() {
        let mut view = DataView::new(Arc::new(letters_table()));
        view.apply_filter(FilterMap::new().with("letter", FilterEntry::new("b").opposite(true)));
        view.sort_by(0).unwrap();
        assert_eq!(nums(&view), vec![2, 3]);
    }

    #[test]
    fn test_render_page_skips_hidden_columns() {
        let mut table = letters_table();
        table.columns[0].show = false;
        let view = DataView::new(Arc::new(table)).with_formatter(|label, value, row| {
            format!("{}={} (num {})", label, value, row["num"])
        });

        let page = view.render_page(&PageState::new(1, 2).unwrap());
        assert_eq!(page.headers, vec!["letter"]);
        assert_eq!(page.total_rows, 3);
        assert_eq!(
            page.cells,
            vec![vec!["letter=b (num 1)".to_string()], vec!["letter=a (num 3)".to_string()]]
        );
    }

    #[test]
    fn test_export_covers_all_derived_rows() {
        let view = DataView::new(Arc::new(letters_table()))
            .with_mapper(|_, value| DataValue::String(format!("<{}>", value)));

        let export = view.build_export();
        assert_eq!(export.headers, vec!["num", "letter"]);
        assert_eq!(export.rows.len(), 3);
        assert_eq!(export.rows[0][1], DataValue::from("<b>"));
    }
}
