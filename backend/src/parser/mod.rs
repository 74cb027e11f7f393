//! Spreadsheet loader.
//!
//! Reads one worksheet of an `.xlsx`-family or `.xlsb` workbook into a
//! [`Table`] of text cells. No type inference happens here: numbers, dates
//! and booleans are rendered to text the way they display.

use calamine::{open_workbook, Data, Range, Reader, Xlsb, Xlsx};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{format_number, Cell, Table};

// =============================================================================
// Container format
// =============================================================================

/// Spreadsheet container, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Zip/XML workbook (`.xlsx`, `.xlsm`, `.xltx`, `.xltm`).
    Xlsx,
    /// Binary workbook (`.xlsb`).
    Xlsb,
}

impl ContainerFormat {
    /// Detect the container from the (case-insensitive) file extension.
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xlsm" | "xltx" | "xltm" => Ok(ContainerFormat::Xlsx),
            "xlsb" => Ok(ContainerFormat::Xlsb),
            "" => Err(PipelineError::file_format(path, "missing file extension")),
            other => Err(PipelineError::file_format(
                path,
                format!("unsupported extension '.{}'", other),
            )),
        }
    }
}

// =============================================================================
// Sheet selection
// =============================================================================

/// Which worksheet to read: by name or by zero-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Name(String),
    Index(usize),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl FromStr for SheetSelector {
    type Err = std::convert::Infallible;

    /// Plain non-negative integers select by index, anything else by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(index) => SheetSelector::Index(index),
            Err(_) => SheetSelector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Name(name) => write!(f, "'{}'", name),
            SheetSelector::Index(index) => write!(f, "#{}", index),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load the selected worksheet of `path` into a [`Table`].
///
/// # Errors
/// - [`PipelineError::FileFormat`] for unsupported extensions or unreadable files
/// - [`PipelineError::SheetNotFound`] when the selector matches no sheet
pub fn load_table(path: &Path, sheet: &SheetSelector) -> PipelineResult<Table> {
    match ContainerFormat::from_path(path)? {
        ContainerFormat::Xlsx => {
            let mut workbook: Xlsx<_> =
                open_workbook(path).map_err(|e| PipelineError::file_format(path, e))?;
            read_sheet(&mut workbook, path, sheet)
        }
        ContainerFormat::Xlsb => {
            let mut workbook: Xlsb<_> =
                open_workbook(path).map_err(|e| PipelineError::file_format(path, e))?;
            read_sheet(&mut workbook, path, sheet)
        }
    }
}

/// List the worksheet names of a workbook, in workbook order.
pub fn sheet_names(path: &Path) -> PipelineResult<Vec<String>> {
    match ContainerFormat::from_path(path)? {
        ContainerFormat::Xlsx => {
            let workbook: Xlsx<_> =
                open_workbook(path).map_err(|e| PipelineError::file_format(path, e))?;
            Ok(workbook.sheet_names())
        }
        ContainerFormat::Xlsb => {
            let workbook: Xlsb<_> =
                open_workbook(path).map_err(|e| PipelineError::file_format(path, e))?;
            Ok(workbook.sheet_names())
        }
    }
}

fn read_sheet<R>(workbook: &mut R, path: &Path, sheet: &SheetSelector) -> PipelineResult<Table>
where
    R: Reader<BufReader<File>>,
    R::Error: fmt::Display,
{
    let names = workbook.sheet_names();
    let name = resolve_sheet(&names, sheet)?;

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| PipelineError::file_format(path, e))?;

    Ok(range_to_table(&range))
}

fn resolve_sheet(names: &[String], sheet: &SheetSelector) -> PipelineResult<String> {
    let found = match sheet {
        SheetSelector::Name(name) => names.iter().find(|n| *n == name),
        SheetSelector::Index(index) => names.get(*index),
    };

    found.cloned().ok_or_else(|| PipelineError::SheetNotFound {
        sheet: sheet.to_string(),
        available: names.join(", "),
    })
}

/// Convert a worksheet range into a table; the first row is the header.
///
/// Ranges start at the first used cell, so blank leading columns are
/// restored to keep positions anchored at column A.
pub(crate) fn range_to_table(range: &Range<Data>) -> Table {
    let leading = range.start().map_or(0, |(_, col)| col as usize);
    let mut rows = range.rows();

    let headers = match rows.next() {
        Some(header_row) => unique_headers(&pad_leading(header_row, leading)),
        None => return Table::default(),
    };

    let mut body: Vec<Vec<Cell>> = rows
        .map(|row| {
            pad_leading(row, leading)
                .iter()
                .map(cell_text)
                .collect()
        })
        .collect();

    while body
        .last()
        .is_some_and(|row| row.iter().all(Cell::is_empty))
    {
        body.pop();
    }

    Table::from_rows(headers, body)
}

fn pad_leading(row: &[Data], leading: usize) -> Vec<Data> {
    std::iter::repeat(Data::Empty)
        .take(leading)
        .chain(row.iter().cloned())
        .collect()
}

/// Header names: blanks become `Unnamed: <i>`, repeats get `.1`, `.2`, ...
///
/// A generated name never collides with a literal header: when `a.1` is
/// already taken, the next `a` becomes `a.1.1`.
fn unique_headers(row: &[Data]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    row.iter()
        .enumerate()
        .map(|(i, data)| {
            let mut name = match cell_text(data) {
                Cell::Empty => format!("Unnamed: {}", i),
                cell => cell.to_text(),
            };
            let mut count = counts.get(&name).copied().unwrap_or(0);
            while count > 0 {
                counts.insert(name.clone(), count + 1);
                name = format!("{}.{}", name, count);
                count = counts.get(&name).copied().unwrap_or(0);
            }
            counts.insert(name.clone(), count + 1);
            name
        })
        .collect()
}

/// Render a native cell as text.
pub(crate) fn cell_text(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Text(i.to_string()),
        Data::Float(f) => Cell::Text(format_number(*f)),
        Data::Bool(b) => Cell::text(if *b { "True" } else { "False" }),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::Text(value.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Text(format_number(dt.as_f64())),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Path of the committed `.xlsb` workbook used by tests across the crate.
#[cfg(test)]
pub(crate) fn xlsb_fixture() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/orders.xlsb")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();

        let first = workbook.add_worksheet();
        first.set_name("Orders").unwrap();
        first.write_string(0, 0, "ID Материала").unwrap();
        first.write_string(0, 1, "Кол-во по заявке").unwrap();
        first.write_string(1, 0, "ABI23").unwrap();
        first.write_number(1, 1, 10.0).unwrap();
        first.write_string(2, 0, "C67").unwrap();
        first.write_number(2, 1, 2.5).unwrap();

        let second = workbook.add_worksheet();
        second.set_name("Other").unwrap();
        second.write_string(0, 0, "only").unwrap();
        second.write_boolean(1, 0, true).unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ContainerFormat::from_path(Path::new("a.XLSX")).unwrap(),
            ContainerFormat::Xlsx
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("a.xlsm")).unwrap(),
            ContainerFormat::Xlsx
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("a.XlsB")).unwrap(),
            ContainerFormat::Xlsb
        );
        assert!(matches!(
            ContainerFormat::from_path(Path::new("a.csv")),
            Err(PipelineError::FileFormat { .. })
        ));
        assert!(matches!(
            ContainerFormat::from_path(Path::new("noext")),
            Err(PipelineError::FileFormat { .. })
        ));
    }

    #[test]
    fn test_sheet_selector_parse() {
        assert_eq!("2".parse::<SheetSelector>().unwrap(), SheetSelector::Index(2));
        assert_eq!(
            "Orders".parse::<SheetSelector>().unwrap(),
            SheetSelector::Name("Orders".into())
        );
        assert_eq!(SheetSelector::default(), SheetSelector::Index(0));
    }

    #[test]
    fn test_load_first_sheet_as_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.xlsx");
        write_fixture(&path);

        let table = load_table(&path, &SheetSelector::default()).unwrap();
        assert_eq!(table.headers(), vec!["ID Материала", "Кол-во по заявке"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "Кол-во по заявке"), Some(&Cell::text("10")));
        assert_eq!(table.cell(1, "Кол-во по заявке"), Some(&Cell::text("2.5")));
    }

    #[test]
    fn test_load_sheet_by_name_and_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.xlsx");
        write_fixture(&path);

        let by_name = load_table(&path, &SheetSelector::Name("Other".into())).unwrap();
        let by_index = load_table(&path, &SheetSelector::Index(1)).unwrap();
        assert_eq!(by_name, by_index);
        assert_eq!(by_name.cell(0, "only"), Some(&Cell::text("True")));
    }

    #[test]
    fn test_missing_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.xlsx");
        write_fixture(&path);

        let err = load_table(&path, &SheetSelector::Name("Nope".into())).unwrap_err();
        match err {
            PipelineError::SheetNotFound { available, .. } => {
                assert_eq!(available, "Orders, Other")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            load_table(&path, &SheetSelector::Index(5)),
            Err(PipelineError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_sheet_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.xlsx");
        write_fixture(&path);
        assert_eq!(sheet_names(&path).unwrap(), vec!["Orders", "Other"]);
    }

    #[test]
    fn test_corrupt_container() {
        let dir = tempdir().unwrap();
        let xlsx = dir.path().join("broken.xlsx");
        std::fs::write(&xlsx, b"definitely not a zip").unwrap();
        assert!(matches!(
            load_table(&xlsx, &SheetSelector::default()),
            Err(PipelineError::FileFormat { .. })
        ));

        let xlsb = dir.path().join("broken.xlsb");
        std::fs::write(&xlsb, b"definitely not a zip").unwrap();
        assert!(matches!(
            load_table(&xlsb, &SheetSelector::default()),
            Err(PipelineError::FileFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.xlsx");
        assert!(matches!(
            load_table(&path, &SheetSelector::default()),
            Err(PipelineError::FileFormat { .. })
        ));
    }

    #[test]
    fn test_headers_blank_and_duplicate() {
        let row = vec![
            Data::String("qty".into()),
            Data::Empty,
            Data::String("qty".into()),
            Data::String("qty".into()),
        ];
        assert_eq!(
            unique_headers(&row),
            vec!["qty", "Unnamed: 1", "qty.1", "qty.2"]
        );
    }

    #[test]
    fn test_cell_text_rendering() {
        assert_eq!(cell_text(&Data::Int(7)), Cell::text("7"));
        assert_eq!(cell_text(&Data::Float(15.0)), Cell::text("15"));
        assert_eq!(cell_text(&Data::Float(0.25)), Cell::text("0.25"));
        assert_eq!(cell_text(&Data::Bool(false)), Cell::text("False"));
        assert_eq!(cell_text(&Data::Empty), Cell::Empty);
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-03-15".into())),
            Cell::text("2024-03-15")
        );
    }

    #[test]
    fn test_generated_headers_never_collide() {
        let row = vec![
            Data::String("a".into()),
            Data::String("a.1".into()),
            Data::String("a".into()),
            Data::String("a".into()),
        ];
        let headers = unique_headers(&row);
        assert_eq!(headers, vec!["a", "a.1", "a.1.1", "a.2"]);

        let distinct: std::collections::HashSet<&String> = headers.iter().collect();
        assert_eq!(distinct.len(), headers.len());
    }

    #[test]
    fn test_trailing_blank_rows_dropped() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), Data::String("a".into()));
        range.set_value((0, 1), Data::String("b".into()));
        range.set_value((1, 0), Data::String("1".into()));

        let table = range_to_table(&range);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "b"), Some(&Cell::Empty));
    }

    #[test]
    fn test_blank_leading_columns_restored() {
        let mut range: Range<Data> = Range::new((0, 1), (1, 3));
        range.set_value((0, 1), Data::String("x".into()));
        range.set_value((0, 3), Data::String("y".into()));
        range.set_value((1, 1), Data::String("1".into()));
        range.set_value((1, 3), Data::String("2".into()));

        let table = range_to_table(&range);
        assert_eq!(table.headers(), vec!["Unnamed: 0", "x", "Unnamed: 2", "y"]);
        assert_eq!(table.cell(0, "Unnamed: 0"), Some(&Cell::Empty));
        assert_eq!(table.cell(0, "x"), Some(&Cell::text("1")));
        assert_eq!(table.cell(0, "y"), Some(&Cell::text("2")));
    }

    #[test]
    fn test_load_xlsb_workbook() {
        let path = xlsb_fixture();
        assert_eq!(sheet_names(&path).unwrap(), vec!["Orders", "Notes"]);

        let table = load_table(&path, &SheetSelector::default()).unwrap();
        assert_eq!(
            table.headers(),
            vec!["ID Материала", "Кол-во по заявке", "Поступило всего"]
        );
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(0, "ID Материала"), Some(&Cell::text("ABI23")));
        assert_eq!(table.cell(0, "Кол-во по заявке"), Some(&Cell::text("10")));
        assert_eq!(table.cell(0, "Поступило всего"), Some(&Cell::text("8")));
        assert_eq!(table.cell(1, "Кол-во по заявке"), Some(&Cell::text("I5")));
        assert_eq!(table.cell(2, "Поступило всего"), Some(&Cell::text("2.5")));

        let notes = load_table(&path, &SheetSelector::Name("Notes".into())).unwrap();
        assert_eq!(notes.cell(0, "note"), Some(&Cell::text("kept as text")));
    }
}
