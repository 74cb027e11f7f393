//! Domain models for the shortfall pipeline.
//!
//! - [`Table`] - Ordered, row-aligned named columns
//! - [`Column`] - One named column of cells
//! - [`Cell`] - A single cell value (empty, text or number)
//! - [`ColumnNames`] - Headers of the columns the transforms act on

use serde::{Deserialize, Serialize};

// =============================================================================
// Cell
// =============================================================================

/// A single cell value.
///
/// Freshly loaded tables only hold [`Cell::Empty`] and [`Cell::Text`];
/// numbers appear once quantity columns are normalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form of the cell; empty cells render as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }
}

/// Render a number the way a spreadsheet shows it: integral values without
/// a decimal point, everything else in shortest round-trip form.
///
/// Very small or very large magnitudes use exponent notation with a signed,
/// two-digit exponent (`1e-05`, `1.5e+16`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    let magnitude = value.abs();
    if value.is_finite() && (magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4)) {
        exponent_form(value)
    } else {
        value.to_string()
    }
}

fn exponent_form(value: f64) -> String {
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

// =============================================================================
// Column
// =============================================================================

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Ordered collection of named columns, all of the same length.
///
/// Columns are looked up by exact name. Every operation that targets a
/// column by name is a no-op when the column is absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from a header row and data rows.
    ///
    /// Short rows are padded with empty cells; cells beyond the header
    /// width are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for row in rows {
            let mut values = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(values.next().unwrap_or_default());
            }
        }

        Self { columns, row_count }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell at `row` in the column called `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name).and_then(|c| c.cells.get(row))
    }

    /// Replace every cell of the named column with `f(cell)`.
    pub fn map_column<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Cell) -> Cell,
    {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.cells = column.cells.iter().map(f).collect();
        }
        self
    }

    /// Keep the rows whose flag in `keep` is true, preserving order.
    ///
    /// Rows without a flag (when `keep` is shorter than the table) are dropped.
    pub fn retain_rows(mut self, keep: &[bool]) -> Self {
        for column in self.columns.iter_mut() {
            let cells = std::mem::take(&mut column.cells);
            column.cells = cells
                .into_iter()
                .zip(keep.iter())
                .filter_map(|(cell, keep)| keep.then_some(cell))
                .collect();
        }
        self.row_count = keep.iter().take(self.row_count).filter(|k| **k).count();
        self
    }

    /// Append a column. `cells` is padded or truncated to the row count.
    pub fn with_column(mut self, name: impl Into<String>, mut cells: Vec<Cell>) -> Self {
        cells.resize(self.row_count, Cell::Empty);
        self.columns.push(Column::new(name, cells));
        self
    }
}

// =============================================================================
// Column Names
// =============================================================================

/// Headers of the columns the transforms read and write.
///
/// Matching is exact: case and whitespace matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    /// Free-text material identifier, normalized to digits.
    pub material_id: String,
    /// Requested quantity.
    pub requested: String,
    /// Received quantity.
    pub received: String,
    /// Derived `requested - received` column.
    pub difference: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            material_id: "ID Материала".to_string(),
            requested: "Кол-во по заявке".to_string(),
            received: "Поступило всего".to_string(),
            difference: "Расхождение заявка-приход".to_string(),
        }
    }
}
