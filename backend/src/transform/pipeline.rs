//! End-to-end pipeline: load, normalize, filter, annotate, save.
//!
//! # Example
//!
//! ```rust,ignore
//! use shortfall::process_file;
//! use std::path::Path;
//!
//! let summary = process_file(Path::new("orders.xlsb"), Path::new("shortfall.xlsx"))?;
//! println!("{} of {} rows kept", summary.retained_rows, summary.loaded_rows);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::{add_difference, filter_shortfall, normalize};
use crate::error::PipelineResult;
use crate::models::{ColumnNames, Table};
use crate::parser::{load_table, SheetSelector};
use crate::writer::write_table;

/// Pipeline progress. Strictly linear; any failure ends in [`Stage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Created,
    Loaded,
    Normalized,
    Filtered,
    Annotated,
    Saved,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Created => "created",
            Stage::Loaded => "loaded",
            Stage::Normalized => "normalized",
            Stage::Filtered => "filtered",
            Stage::Annotated => "annotated",
            Stage::Saved => "saved",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Options for a pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    /// Worksheet to read (default: the first one)
    pub sheet: SheetSelector,

    /// Headers of the identifier, quantity and difference columns
    pub columns: ColumnNames,
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Data rows read from the sheet
    pub loaded_rows: usize,

    /// Data rows written to the output
    pub retained_rows: usize,

    /// Output columns, in order
    pub columns: Vec<String>,

    /// Whether the difference column was added
    pub annotated: bool,
}

/// Apply normalize, filter and annotate to an already loaded table.
pub fn transform(table: Table, columns: &ColumnNames) -> Table {
    let table = normalize(table, columns);
    let table = filter_shortfall(table, columns);
    add_difference(table, columns)
}

/// One pipeline run over one file.
#[derive(Debug)]
pub struct Pipeline {
    options: PipelineOptions,
    stage: Stage,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            stage: Stage::Created,
        }
    }

    /// Current stage; `Saved` after success, `Failed` after any error.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Read `input`, transform it and write the result to `output`.
    pub fn run(&mut self, input: &Path, output: &Path) -> PipelineResult<RunSummary> {
        let result = self.execute(input, output);
        if result.is_err() {
            self.stage = Stage::Failed;
        }
        result
    }

    fn execute(&mut self, input: &Path, output: &Path) -> PipelineResult<RunSummary> {
        let columns = self.options.columns.clone();

        let table = load_table(input, &self.options.sheet)?;
        let loaded_rows = table.row_count();
        self.stage = Stage::Loaded;

        let table = normalize(table, &columns);
        self.stage = Stage::Normalized;

        let table = filter_shortfall(table, &columns);
        self.stage = Stage::Filtered;

        let table = add_difference(table, &columns);
        self.stage = Stage::Annotated;

        write_table(&table, output)?;
        self.stage = Stage::Saved;

        Ok(RunSummary {
            loaded_rows,
            retained_rows: table.row_count(),
            columns: table.headers().into_iter().map(String::from).collect(),
            annotated: table.has_column(&columns.difference),
        })
    }
}

/// Run the full pipeline on `input` with default options.
pub fn process_file(input: &Path, output: &Path) -> PipelineResult<RunSummary> {
    Pipeline::new(PipelineOptions::default()).run(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::models::Cell;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_input(path: &Path, headers: &[&str], rows: &[[&str; 3]]) {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        for (c, h) in headers.iter().enumerate() {
            ws.write_string(0, c as u16, *h).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                ws.write_string(r as u32 + 1, c as u16, *v).unwrap();
            }
        }
        workbook.save(path).unwrap();
    }

    fn sample_rows() -> [[&'static str; 3]; 3] {
        [["ABI23", "10", "8"], ["I45X", "I5", "15"], ["C67", "3", "2"]]
    }

    #[test]
    fn test_transform_example() {
        let names = ColumnNames::default();
        let table = Table::from_rows(
            vec![names.material_id.clone(), names.requested.clone(), names.received.clone()],
            sample_rows()
                .iter()
                .map(|r| r.iter().map(|v| Cell::text(*v)).collect())
                .collect(),
        );

        let out = transform(table, &names);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.cell(0, &names.material_id), Some(&Cell::text("123")));
        assert_eq!(out.cell(1, &names.material_id), Some(&Cell::text("67")));
        assert_eq!(
            out.column(&names.difference).unwrap().cells,
            vec![Cell::Number(2.0), Cell::Number(1.0)]
        );
    }

    #[test]
    fn test_process_file_end_to_end() {
        let names = ColumnNames::default();
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let output = dir.path().join("output.xlsx");
        write_input(
            &input,
            &[&names.material_id, &names.requested, &names.received],
            &sample_rows(),
        );

        let summary = process_file(&input, &output).unwrap();
        assert_eq!(summary.loaded_rows, 3);
        assert_eq!(summary.retained_rows, 2);
        assert!(summary.annotated);

        let result = load_table(&output, &SheetSelector::default()).unwrap();
        assert_eq!(
            result.headers(),
            vec![
                names.material_id.as_str(),
                names.requested.as_str(),
                names.received.as_str(),
                names.difference.as_str()
            ]
        );
        let row = |i: usize| -> Vec<String> {
            result.columns().iter().map(|c| c.cells[i].to_text()).collect()
        };
        assert_eq!(row(0), vec!["123", "10", "8", "2"]);
        assert_eq!(row(1), vec!["67", "3", "2", "1"]);
    }

    #[test]
    fn test_process_xlsb_end_to_end() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("orders_result.xlsx");

        let summary = process_file(&crate::parser::xlsb_fixture(), &output).unwrap();
        assert_eq!(summary.loaded_rows, 3);
        assert_eq!(summary.retained_rows, 2);
        assert!(summary.annotated);

        let result = load_table(&output, &SheetSelector::default()).unwrap();
        let row = |i: usize| -> Vec<String> {
            result.columns().iter().map(|c| c.cells[i].to_text()).collect()
        };
        // 2.5 received keeps only its first digit run
        assert_eq!(row(0), vec!["123", "10", "8", "2"]);
        assert_eq!(row(1), vec!["67", "3", "2", "1"]);
    }

    #[test]
    fn test_missing_quantity_column_keeps_all_rows() {
        let names = ColumnNames::default();
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let output = dir.path().join("output.xlsx");
        write_input(
            &input,
            &[&names.material_id, &names.requested, "comment"],
            &sample_rows(),
        );

        let summary = process_file(&input, &output).unwrap();
        assert_eq!(summary.retained_rows, 3);
        assert!(!summary.annotated);
        assert!(!summary.columns.contains(&names.difference));
    }

    #[test]
    fn test_stage_transitions() {
        let names = ColumnNames::default();
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        write_input(
            &input,
            &[&names.material_id, &names.requested, &names.received],
            &sample_rows(),
        );

        let mut pipeline = Pipeline::new(PipelineOptions::default());
        assert_eq!(pipeline.stage(), Stage::Created);
        pipeline.run(&input, &dir.path().join("ok.xlsx")).unwrap();
        assert_eq!(pipeline.stage(), Stage::Saved);

        let mut failing = Pipeline::new(PipelineOptions::default());
        let err = failing
            .run(&input, &dir.path().join("missing/out.xlsx"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
        assert_eq!(failing.stage(), Stage::Failed);
    }

    #[test]
    fn test_unsupported_input_fails_before_loading() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();
        let output = dir.path().join("output.xlsx");

        let mut pipeline = Pipeline::new(PipelineOptions::default());
        let err = pipeline.run(&input, &output).unwrap_err();
        assert!(matches!(err, PipelineError::FileFormat { .. }));
        assert_eq!(pipeline.stage(), Stage::Failed);
        assert!(!output.exists());
    }

    #[test]
    fn test_sheet_option() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        write_input(&input, &["a", "b", "c"], &[["1", "2", "3"]]);

        let mut pipeline = Pipeline::new(PipelineOptions {
            sheet: SheetSelector::Name("Missing".into()),
            ..Default::default()
        });
        let err = pipeline.run(&input, &dir.path().join("out.xlsx")).unwrap_err();
        assert!(matches!(err, PipelineError::SheetNotFound { .. }));
    }

    #[test]
    fn test_round_trip_without_transforms() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.xlsx");
        let output = dir.path().join("copy.xlsx");
        write_input(&input, &["x", "y", "z"], &sample_rows());

        let table = load_table(&input, &SheetSelector::default()).unwrap();
        write_table(&table, &output).unwrap();
        let copy = load_table(&output, &SheetSelector::default()).unwrap();

        assert_eq!(copy.headers(), table.headers());
        assert_eq!(copy.row_count(), table.row_count());
    }
}
