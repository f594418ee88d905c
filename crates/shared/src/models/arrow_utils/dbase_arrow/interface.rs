use std::io::Write;

use crate::errors::SharedResult;
use crate::models::arrow_utils::dbase_arrow::ExportResult;

/// Interface configuration for user-facing pipeline messages
#[derive(Debug, Clone)]
pub struct DbaseInterfaceConfig {
    /// Whether confirmation lines are printed
    pub verbose: bool,
}

impl Default for DbaseInterfaceConfig {
    fn default() -> Self {
        Self { verbose: true }
    }
}

/// Standardized console output for pipeline steps.
///
/// Progress goes to the log; only confirmations are written to `out`.
pub struct DbaseInterface<W: Write> {
    config: DbaseInterfaceConfig,
    out: W,
}

impl<W: Write> DbaseInterface<W> {
    pub fn new(config: DbaseInterfaceConfig, out: W) -> Self {
        Self { config, out }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Log a status message for an operation
    pub fn status(&self, operation: &str, status: &str) {
        log::info!("{operation}: {status}");
    }

    /// Print the confirmation line for a finished export
    pub fn exported(&mut self, result: &ExportResult) -> SharedResult<()> {
        log::info!(
            "{} export: {} records, {} fields, {} bytes",
            result.format.default_extension().to_uppercase(),
            result.records_exported,
            result.fields_exported,
            result.file_size_bytes.unwrap_or(0)
        );
        if self.config.verbose {
            writeln!(self.out, "✓ Successfully exported to {}", result.file_path.display())?;
        }
        Ok(())
    }
}
