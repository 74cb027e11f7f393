//! Identifier and quantity normalization.
//!
//! Source sheets are typed by hand: the digit `1` is often entered as the
//! letter `I`, and identifiers carry prefixes, suffixes and separators.
//! The substitution always runs before digits are extracted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Cell, ColumnNames, Table};

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").expect("valid regex"));
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// `I` -> `1`, then drop everything that is not an ASCII digit.
///
/// ```
/// use shortfall::normalize_identifier;
///
/// assert_eq!(normalize_identifier("ABI23"), "123");
/// assert_eq!(normalize_identifier("I45X"), "145");
/// assert_eq!(normalize_identifier("n/a"), "");
/// ```
pub fn normalize_identifier(raw: &str) -> String {
    let substituted = raw.replace('I', "1");
    NON_DIGITS.replace_all(&substituted, "").into_owned()
}

/// `I` -> `1`, then parse the first run of ASCII digits.
///
/// Returns `None` when the text holds no digits. Only the first run is
/// used, so `"12.5"` parses as `12` and `"-4"` as `4`.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let substituted = raw.replace('I', "1");
    DIGIT_RUN
        .find(&substituted)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Normalize the identifier column and both quantity columns.
///
/// Each column is handled only if present. Identifier cells become digit
/// strings (possibly empty); quantity cells become numbers or empty.
pub fn normalize(table: Table, columns: &ColumnNames) -> Table {
    let table = table.map_column(&columns.material_id, |cell| {
        Cell::Text(normalize_identifier(&cell.to_text()))
    });

    [&columns.requested, &columns.received]
        .into_iter()
        .fold(table, |table, name| {
            table.map_column(name, |cell| {
                parse_quantity(&cell.to_text())
                    .map(Cell::Number)
                    .unwrap_or(Cell::Empty)
            })
        })
}
