//! Difference column.

use crate::models::{Cell, ColumnNames, Table};

/// Append `requested - received` as the difference column.
///
/// Runs after [`super::filter_shortfall`], so only retained rows get a
/// value. Rows with a missing quantity get an empty cell. Without both
/// quantity columns the table is returned unchanged.
pub fn add_difference(table: Table, columns: &ColumnNames) -> Table {
    let cells: Option<Vec<Cell>> = match (table.column(&columns.requested), table.column(&columns.received)) {
        (Some(requested), Some(received)) => Some(
            requested
                .cells
                .iter()
                .zip(&received.cells)
                .map(|(req, rec)| match (req.as_number(), rec.as_number()) {
                    (Some(req), Some(rec)) => Cell::Number(req - rec),
                    _ => Cell::Empty,
                })
                .collect(),
        ),
        _ => None,
    };

    match cells {
        Some(cells) => table.with_column(columns.difference.clone(), cells),
        None => table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_appended_last() {
        let names = ColumnNames::default();
        let table = Table::from_rows(
            vec![names.requested.clone(), names.received.clone()],
            vec![
                vec![Cell::Number(10.0), Cell::Number(8.0)],
                vec![Cell::Number(3.0), Cell::Number(2.0)],
                vec![Cell::Number(3.0), Cell::Empty],
            ],
        );

        let out = add_difference(table, &names);
        assert_eq!(out.headers().last(), Some(&names.difference.as_str()));
        assert_eq!(
            out.column(&names.difference).unwrap().cells,
            vec![Cell::Number(2.0), Cell::Number(1.0), Cell::Empty]
        );
    }

    #[test]
    fn test_missing_source_column() {
        let names = ColumnNames::default();
        let table = Table::from_rows(
            vec![names.received.clone()],
            vec![vec![Cell::Number(1.0)]],
        );

        let out = add_difference(table.clone(), &names);
        assert_eq!(out, table);
        assert!(!out.has_column(&names.difference));
    }
}
