use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use arrow::csv::WriterBuilder;
use arrow::error::ArrowError;

use crate::errors::{SharedError, SharedResult};
use crate::models::arrow_utils::dbase_arrow::Table;

/// Name of the single worksheet written to spreadsheet exports
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Comma-separated text
    Csv,
    /// Single-sheet Office Open XML workbook
    Xlsx,
}

impl ExportFormat {
    /// Get the default file extension for this format
    pub fn default_extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// Result of an export operation
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Path where the file was exported
    pub file_path: PathBuf,
    /// Format used for export
    pub format: ExportFormat,
    /// Number of records exported
    pub records_exported: usize,
    /// Number of fields exported
    pub fields_exported: usize,
    /// File size in bytes
    pub file_size_bytes: Option<u64>,
}

/// Export `table` to `file_path`, replacing any existing file
pub fn export_table<P: AsRef<Path>>(
    table: &Table,
    file_path: P,
    format: ExportFormat,
) -> SharedResult<ExportResult> {
    let path = file_path.as_ref();
    log::info!(
        "Exporting {} records, {} fields as {} to {}",
        table.n_rows(),
        table.n_columns(),
        format.default_extension().to_uppercase(),
        path.display()
    );

    match format {
        ExportFormat::Csv => write_csv(table, path)?,
        ExportFormat::Xlsx => write_xlsx(table, path, DEFAULT_SHEET_NAME)?,
    }

    let file_size_bytes = std::fs::metadata(path).ok().map(|m| m.len());

    Ok(ExportResult {
        file_path: path.to_path_buf(),
        format,
        records_exported: table.n_rows(),
        fields_exported: table.n_columns(),
        file_size_bytes,
    })
}

fn arrow_write_error(path: &Path, err: ArrowError) -> SharedError {
    match err {
        ArrowError::IoError(_, source) => SharedError::file_access(path, source),
        other => SharedError::Arrow(other),
    }
}

/// Write a header line and one line per row, without a row index
pub fn write_csv<P: AsRef<Path>>(table: &Table, file_path: P) -> SharedResult<()> {
    let path = file_path.as_ref();
    let file = File::create(path).map_err(|e| SharedError::file_access(path, e))?;

    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer
        .write(table.batch())
        .map_err(|e| arrow_write_error(path, e))?;

    let mut inner = writer.into_inner();
    std::io::Write::flush(&mut inner).map_err(|e| SharedError::file_access(path, e))?;
    Ok(())
}

/// Write a single-sheet workbook: header row, then one row per record
#[cfg(feature = "xlsx")]
pub fn write_xlsx<P: AsRef<Path>>(table: &Table, file_path: P, sheet_name: &str) -> SharedResult<()> {
    use chrono::Timelike;
    use rust_xlsxwriter::{Format, Workbook, XlsxError};

    use crate::models::arrow_utils::dbase_arrow::CellValue;

    let path = file_path.as_ref();
    let xlsx_error = |err: XlsxError| match err {
        XlsxError::IoError(source) => SharedError::file_access(path, source),
        other => SharedError::Spreadsheet(other),
    };
    let limit_error = |what: &str, index: usize| {
        SharedError::Spreadsheet(XlsxError::ParameterError(format!(
            "{what} {index} exceeds the worksheet limit"
        )))
    };

    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(xlsx_error)?;

    let mut col_nums = Vec::with_capacity(table.n_columns());
    for (col, name) in table.column_names().iter().enumerate() {
        let col_num = u16::try_from(col).map_err(|_| limit_error("column", col))?;
        worksheet.write_string(0, col_num, name.as_str()).map_err(xlsx_error)?;
        col_nums.push(col_num);
    }

    for row in 0..table.n_rows() {
        let row_num = u32::try_from(row + 1).map_err(|_| limit_error("row", row + 1))?;
        for (col, &col_num) in col_nums.iter().enumerate() {
            let Some(cell) = table.cell(row, col) else {
                continue;
            };
            match cell {
                CellValue::Null => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row_num, col_num, s).map_err(xlsx_error)?;
                }
                CellValue::Integer(v) => {
                    worksheet.write_number(row_num, col_num, v as f64).map_err(xlsx_error)?;
                }
                CellValue::Float(v) => {
                    worksheet.write_number(row_num, col_num, v).map_err(xlsx_error)?;
                }
                CellValue::Boolean(b) => {
                    worksheet.write_boolean(row_num, col_num, b).map_err(xlsx_error)?;
                }
                // dates the workbook epoch cannot represent are kept as text
                CellValue::Date(d) => {
                    let written = match excel_date(d) {
                        Ok(value) => worksheet.write_datetime_with_format(row_num, col_num, &value, &date_format),
                        Err(_) => worksheet.write_string(row_num, col_num, d.format("%Y-%m-%d").to_string()),
                    };
                    written.map_err(xlsx_error)?;
                }
                CellValue::DateTime(dt) => {
                    let value = excel_date(dt.date())
                        .and_then(|date| date.and_hms(dt.hour() as u16, dt.minute() as u8, dt.second()));
                    let written = match value {
                        Ok(value) => worksheet.write_datetime_with_format(row_num, col_num, &value, &datetime_format),
                        Err(_) => worksheet.write_string(row_num, col_num, dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                    };
                    written.map_err(xlsx_error)?;
                }
            }
        }
    }

    workbook.save(path).map_err(xlsx_error)?;
    Ok(())
}

#[cfg(feature = "xlsx")]
fn excel_date(date: chrono::NaiveDate) -> Result<rust_xlsxwriter::ExcelDateTime, rust_xlsxwriter::XlsxError> {
    use chrono::Datelike;
    rust_xlsxwriter::ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
}

/// Spreadsheet backend compiled out: always fails
#[cfg(not(feature = "xlsx"))]
pub fn write_xlsx<P: AsRef<Path>>(_table: &Table, _file_path: P, _sheet_name: &str) -> SharedResult<()> {
    Err(SharedError::DependencyMissing("rust_xlsxwriter"))
}
