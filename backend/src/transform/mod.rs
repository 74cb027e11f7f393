//! Transformation module.
//!
//! The stages run strictly in this order, each taking the previous table
//! by value and returning the next one:
//! - Normalize: clean the identifier column, coerce quantities to numbers
//! - Filter: keep rows where requested > received
//! - Annotate: append the requested - received column
//! - Pipeline: load, transform and save with stage tracking

pub mod annotate;
pub mod filter;
pub mod normalize;
pub mod pipeline;

pub use annotate::add_difference;
pub use filter::filter_shortfall;
pub use normalize::{normalize, normalize_identifier, parse_quantity};
pub use pipeline::*;
