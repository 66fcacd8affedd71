//! Configuration module
//!
//! Application settings and per-table column configuration.

pub mod config;
pub mod table_config;
