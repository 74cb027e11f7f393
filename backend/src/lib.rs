//! # Shortfall - requested vs. received quantity reports
//!
//! Shortfall reads an order spreadsheet, cleans the material identifiers,
//! keeps the rows where more was requested than received and writes them,
//! with the difference, to a new `.xlsx` workbook.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌─────────────┐
//! │ .xlsx/.xlsb │──▶│ Normalize │──▶│  Filter   │──▶│ Annotate  │──▶│    .xlsx    │
//! │  (loader)   │   │ ID + qty  │   │ req > rec │   │ req - rec │   │  (writer)   │
//! └─────────────┘   └───────────┘   └───────────┘   └───────────┘   └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shortfall::process_file;
//! use std::path::Path;
//!
//! let summary = process_file(Path::new("orders.xlsb"), Path::new("shortfall.xlsx"))?;
//! println!("Kept {} rows", summary.retained_rows);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Table, cells and column names
//! - [`parser`] - Spreadsheet loader
//! - [`transform`] - Normalize, filter, annotate and the pipeline
//! - [`writer`] - `.xlsx` writer
//! - [`config`] - Environment configuration and storage layout
//! - [`jobs`] - Job store and upload runner
//! - [`api`] - HTTP API server

// Core
pub mod error;
pub mod models;

// Spreadsheet I/O
pub mod parser;
pub mod writer;

// Transformation
pub mod transform;

// Service
pub mod api;
pub mod config;
pub mod jobs;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    ConfigError, PipelineError, PipelineResult, ServerError, StoreError, StoreResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, Column, ColumnNames, Table};

// =============================================================================
// Re-exports - Spreadsheet I/O
// =============================================================================

pub use parser::{load_table, sheet_names, ContainerFormat, SheetSelector};
pub use writer::{table_to_bytes, write_table, XLSX_CONTENT_TYPE};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    add_difference, filter_shortfall, normalize, normalize_identifier, parse_quantity,
    process_file, transform, Pipeline, PipelineOptions, RunSummary, Stage,
};

// =============================================================================
// Re-exports - Service
// =============================================================================

pub use config::{Config, StorageLayout};
pub use jobs::{run_job, FileJobStore, JobRecord, JobState, JobStore, MemoryJobStore};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
