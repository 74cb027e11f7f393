//! HTTP API module.
//!
//! Upload, status and result endpoints around the spreadsheet pipeline.

pub mod logs;
pub mod server;
pub mod types;

pub use server::{router, start_server, AppState};
pub use types::*;
