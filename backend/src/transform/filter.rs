//! Row filter: keep rows where more was requested than received.

use crate::models::{ColumnNames, Table};

/// Keep the rows where `requested > received`.
///
/// A row with a missing quantity on either side is dropped. When either
/// quantity column is absent the table is returned untouched.
pub fn filter_shortfall(table: Table, columns: &ColumnNames) -> Table {
    let keep: Option<Vec<bool>> = match (table.column(&columns.requested), table.column(&columns.received)) {
        (Some(requested), Some(received)) => Some(
            requested
                .cells
                .iter()
                .zip(&received.cells)
                .map(|(req, rec)| match (req.as_number(), rec.as_number()) {
                    (Some(req), Some(rec)) => req > rec,
                    _ => false,
                })
                .collect(),
        ),
        _ => None,
    };

    match keep {
        Some(keep) => table.retain_rows(&keep),
        None => table,
    }
}
