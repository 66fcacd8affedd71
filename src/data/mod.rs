//! Data layer for the DataTable/DataView architecture
//!
//! An immutable [`datatable::DataTable`] holds the raw rows; a
//! [`data_view::DataView`] derives the filtered, sorted rows a user sees.

// Core data modules
pub mod data_view;
pub mod datatable;
pub mod datavalue_compare;
pub mod filter;
pub mod paginator;

// Export
pub mod data_exporter;
pub mod export_worker;

// Data source modules
pub mod datatable_loaders;
