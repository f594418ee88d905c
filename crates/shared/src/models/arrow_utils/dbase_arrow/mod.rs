//! dBase to Arrow conversion utilities
//!
//! Reading dBase files into an Arrow-backed [`Table`], describing the loaded
//! table, and exporting it to CSV and XLSX.

pub mod mappings;
pub mod utilities;
pub mod table;
pub mod read;
pub mod describe;
pub mod write;
pub mod interface;

#[cfg(test)]
pub(crate) mod fixtures;

pub use mappings::{CellValue, DbaseType, convert_dbase_value};

pub use table::{ColumnSpec, Record, Table};

pub use read::{DbaseFile, read_dbase_table};

pub use describe::{DescribeConfig, describe_table, format_columns, format_shape, write_preview};

pub use write::{
    DEFAULT_SHEET_NAME,
    ExportFormat,
    ExportResult,
    export_table,
    write_csv,
    write_xlsx,
};

pub use interface::{DbaseInterface, DbaseInterfaceConfig};
