pub mod config;
pub mod data;
pub mod error;
pub mod logging;

pub use data::data_exporter::{CellMapper, DataExporter, ExportData, ExportFormat};
pub use data::data_view::{CellFormatter, DataView, RenderedPage, SortState};
pub use data::datatable::{DataColumn, DataRow, DataTable, DataType, DataValue};
pub use data::export_worker::{ExportRequest, ExportSink, ExportUpdate};
pub use data::filter::{FilterEntry, FilterMap, FilterSpec, FilterType, FilterValue};
pub use data::paginator::{PageLink, PageState, Paginator};
pub use error::{ExportError, ViewError};
