use std::io::Write;
use std::path::PathBuf;

use crate::errors::SharedResult;
use crate::models::arrow_utils::dbase_arrow::{
    DbaseInterface, DbaseInterfaceConfig, DescribeConfig, ExportFormat, ExportResult,
    describe_table, export_table, read_dbase_table,
};

/// Configuration for one conversion run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// dBase file to read
    pub input_path: PathBuf,
    /// Destination of the CSV export
    pub csv_path: PathBuf,
    /// Destination of the spreadsheet export
    pub xlsx_path: PathBuf,
    /// Number of rows shown in the preview
    pub preview_rows: usize,
    /// Whether confirmation lines are printed after each export
    pub show_confirmations: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("BMS6T.DBF"),
            csv_path: PathBuf::from("BMS6T.csv"),
            xlsx_path: PathBuf::from("BMS6T.xlsx"),
            preview_rows: 5,
            show_confirmations: true,
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub shape: (usize, usize),
    pub columns: Vec<String>,
    pub csv: ExportResult,
    pub xlsx: ExportResult,
}

/// Read, describe and export a dBase file.
///
/// The report and confirmation lines go to `out`. Any failure aborts the run;
/// outputs already written by earlier steps are left in place.
pub fn run_pipeline<W: Write>(config: &PipelineConfig, out: W) -> SharedResult<PipelineSummary> {
    let mut interface = DbaseInterface::new(
        DbaseInterfaceConfig {
            verbose: config.show_confirmations,
        },
        out,
    );

    interface.status("Reading", &config.input_path.display().to_string());
    let table = read_dbase_table(&config.input_path)?;

    let describe_config = DescribeConfig {
        preview_rows: config.preview_rows,
        source_name: Some(
            config
                .input_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| config.input_path.display().to_string()),
        ),
    };
    describe_table(interface.out(), &table, &describe_config)?;
    if config.show_confirmations {
        writeln!(interface.out())?;
    }

    let csv = export_table(&table, &config.csv_path, ExportFormat::Csv)?;
    interface.exported(&csv)?;

    let xlsx = export_table(&table, &config.xlsx_path, ExportFormat::Xlsx)?;
    interface.exported(&xlsx)?;

    interface.out().flush()?;

    Ok(PipelineSummary {
        shape: table.shape(),
        columns: table.column_names(),
        csv,
        xlsx,
    })
}
