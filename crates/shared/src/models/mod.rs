pub mod dbase_utils;
pub mod arrow_utils;
pub mod pipeline;

pub use dbase_utils::{DbfHeader, FieldDescriptor, read_dbf_header};
pub use arrow_utils::dbase_arrow::{
    CellValue, DbaseFile, ExportFormat, ExportResult, Record, Table, describe_table,
    export_table, read_dbase_table,
};
pub use pipeline::{PipelineConfig, PipelineSummary, run_pipeline};
