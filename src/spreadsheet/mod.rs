//! Spreadsheet access layer
//!
//! Workbooks are read with calamine and written back with rust_xlsxwriter.
//! Saving rewrites the whole file: cell values, date cells and sheet order
//! survive, other formatting does not.

pub mod compare;
pub mod mapping;

pub use calamine::Data;
pub use compare::{compare_sheets, ModifiedRow, TableDiff};
pub use mapping::{apply_mapping, parse_mapping_rules, suggest_mappings, Confidence, MappingSuggestion};

use std::path::Path;

use calamine::{open_workbook_auto, CellErrorType, ExcelDateTime, ExcelDateTimeType, Reader};
use rust_xlsxwriter::{Format, Formula, Worksheet};
use thiserror::Error;
use tracing::debug;

/// Rows per worksheet in the xlsx format
pub const MAX_ROWS: usize = 1_048_576;

/// Columns per worksheet in the xlsx format
pub const MAX_COLUMNS: usize = 16_384;

/// Days between the 1900 and 1904 date systems
const EPOCH_1904_OFFSET: f64 = 1462.0;

/// Errors that can occur while reading or writing spreadsheets
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::Error),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook has no worksheets: {0}")]
    EmptyWorkbook(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid mapping rules: {0}")]
    InvalidMapping(String),

    #[error("Sheet '{sheet}' is {rows}x{columns}, larger than an xlsx sheet allows (1048576x16384)")]
    SheetTooLarge {
        sheet: String,
        rows: usize,
        columns: usize,
    },
}

static EMPTY: Data = Data::Empty;

/// Text of a cell, with empty cells rendered as `""`
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// One worksheet, held as rows of cells; row 0 is the header row
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<Data>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Data>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build a sheet of text cells; empty strings become empty cells
    pub fn from_strings(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| {
                        if value.is_empty() {
                            Data::Empty
                        } else {
                            Data::String(value.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(name, rows)
    }

    /// Number of rows, header included
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (the widest row)
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<Data>] {
        &self.rows
    }

    /// Rows below the header
    pub fn data_rows(&self) -> &[Vec<Data>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Cell at zero-based `row`/`col`, empty when out of range
    pub fn cell(&self, row: usize, col: usize) -> &Data {
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    /// Header names; blank headers are named `Column_<n>` (1-based)
    pub fn headers(&self) -> Vec<String> {
        (0..self.width())
            .map(|col| match self.cell(0, col) {
                Data::Empty => format!("Column_{}", col + 1),
                cell => cell.to_string(),
            })
            .collect()
    }

    /// A row rendered as text, padded to the sheet width
    pub fn row_text(&self, row: usize) -> Vec<String> {
        (0..self.width()).map(|col| cell_text(self.cell(row, col))).collect()
    }

    /// Resolve a 1-based column index ("3") or an exact header name
    ///
    /// Returns the zero-based column index.
    pub fn resolve_column(&self, column: &str) -> Result<usize, SpreadsheetError> {
        let column = column.trim();
        if !column.is_empty() && column.chars().all(|c| c.is_ascii_digit()) {
            let index: usize = column
                .parse()
                .map_err(|_| SpreadsheetError::ColumnNotFound(column.to_string()))?;
            if index == 0 || index > self.width() {
                return Err(SpreadsheetError::ColumnNotFound(format!(
                    "{} (sheet has {} columns)",
                    column,
                    self.width()
                )));
            }
            return Ok(index - 1);
        }

        self.headers()
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| SpreadsheetError::ColumnNotFound(column.to_string()))
    }

    /// Non-empty values of `col` among the first `limit` data rows
    pub fn samples(&self, col: usize, limit: usize) -> Vec<String> {
        self.data_rows()
            .iter()
            .take(limit)
            .filter_map(|row| match row.get(col) {
                None | Some(Data::Empty) => None,
                Some(cell) => Some(cell.to_string()),
            })
            .collect()
    }

    /// Drop every data row, keeping the header
    pub fn clear_data(&mut self) -> usize {
        let removed = self.data_rows().len();
        self.rows.truncate(1);
        removed
    }

    /// Replace the data rows, keeping the header
    pub fn replace_data(&mut self, rows: Vec<Vec<Data>>) {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        self.rows.truncate(1);
        self.rows.extend(rows);
    }
}

/// Number formats that make date and time cells read back as dates
struct CellFormats {
    date: Format,
    time: Format,
    datetime: Format,
    duration: Format,
}

impl CellFormats {
    fn new() -> Self {
        Self {
            date: Format::new().set_num_format("yyyy-mm-dd"),
            time: Format::new().set_num_format("hh:mm:ss"),
            datetime: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
            duration: Format::new().set_num_format("[h]:mm:ss"),
        }
    }

    fn for_serial(&self, serial: f64, is_duration: bool) -> &Format {
        if is_duration {
            &self.duration
        } else if serial.fract() == 0.0 {
            &self.date
        } else if serial < 1.0 {
            &self.time
        } else {
            &self.datetime
        }
    }
}

/// Serial number in the 1900 date system, and whether the value is a duration
fn date_serial(value: &ExcelDateTime) -> (f64, bool) {
    let serial = value.as_f64();
    for (kind, is_duration) in [
        (ExcelDateTimeType::DateTime, false),
        (ExcelDateTimeType::TimeDelta, true),
    ] {
        if *value == ExcelDateTime::new(serial, kind, false) {
            return (serial, is_duration);
        }
        if *value == ExcelDateTime::new(serial, kind, true) {
            let serial = if is_duration { serial } else { serial + EPOCH_1904_OFFSET };
            return (serial, is_duration);
        }
    }
    (serial, false)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Data,
    formats: &CellFormats,
) -> Result<(), SpreadsheetError> {
    match cell {
        Data::Empty => {}
        Data::String(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        Data::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Data::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Data::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Data::DateTime(value) => {
            let (serial, is_duration) = date_serial(value);
            worksheet.write_number_with_format(row, col, serial, formats.for_serial(serial, is_duration))?;
        }
        // ISO text from OpenDocument sources has no serial form; keep the text
        Data::DateTimeIso(text) | Data::DurationIso(text) => {
            worksheet.write_string(row, col, text.as_str())?;
        }
        Data::Error(CellErrorType::GettingData) => {
            worksheet.write_string(row, col, cell.to_string())?;
        }
        // Excel evaluates an error literal formula back to the same error
        Data::Error(error) => {
            let formula = Formula::new(format!("={}", error)).set_result(error.to_string());
            worksheet.write_formula(row, col, formula)?;
        }
    }
    Ok(())
}

/// An in-memory workbook; the first sheet is the one tools operate on
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Load every worksheet of the file at `path`
    pub fn load(path: &Path) -> Result<Self, SpreadsheetError> {
        if !path.exists() {
            return Err(SpreadsheetError::FileNotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path)?;
        let mut sheets = Vec::new();

        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;

            // Ranges start at the first used cell; pad back to A1
            let (row_offset, col_offset) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));

            let mut rows: Vec<Vec<Data>> = vec![Vec::new(); row_offset];
            rows.extend(range.rows().map(|row| {
                let mut padded = vec![Data::Empty; col_offset];
                padded.extend(row.iter().cloned());
                padded
            }));

            sheets.push(Sheet::new(name, rows));
        }

        if sheets.is_empty() {
            return Err(SpreadsheetError::EmptyWorkbook(path.display().to_string()));
        }

        debug!("Loaded {} sheet(s) from {}", sheets.len(), path.display());
        Ok(Self { sheets })
    }

    /// Write every sheet to `path` as `.xlsx`, replacing the file
    ///
    /// Nothing is written when a sheet exceeds the xlsx size limits.
    pub fn save(&self, path: &Path) -> Result<(), SpreadsheetError> {
        for sheet in &self.sheets {
            let (rows, columns) = (sheet.row_count(), sheet.width());
            if rows > MAX_ROWS || columns > MAX_COLUMNS {
                return Err(SpreadsheetError::SheetTooLarge {
                    sheet: sheet.name.clone(),
                    rows,
                    columns,
                });
            }
        }

        let formats = CellFormats::new();
        let mut workbook = rust_xlsxwriter::Workbook::new();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name.as_str())?;

            for (r, row) in sheet.rows().iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let out_of_range = || SpreadsheetError::SheetTooLarge {
                        sheet: sheet.name.clone(),
                        rows: r + 1,
                        columns: c + 1,
                    };
                    let row_num = u32::try_from(r).map_err(|_| out_of_range())?;
                    let col_num = u16::try_from(c).map_err(|_| out_of_range())?;
                    write_cell(worksheet, row_num, col_num, cell, &formats)?;
                }
            }
        }

        workbook.save(path)?;
        debug!("Saved {} sheet(s) to {}", self.sheets.len(), path.display());
        Ok(())
    }

    /// Panics on a workbook with no sheets; `load` never returns one
    pub fn first_sheet(&self) -> &Sheet {
        &self.sheets[0]
    }

    pub fn first_sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[0]
    }
}
