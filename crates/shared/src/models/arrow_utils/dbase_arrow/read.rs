use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dbase::{ErrorKind, Reader, ReadingOptions, TrimOption};

use crate::errors::{SharedError, SharedResult};
use crate::models::arrow_utils::dbase_arrow::{ColumnSpec, DbaseType, Record, Table, convert_dbase_value};
use crate::models::dbase_utils::{DbfHeader, dbase_field_to_arrow_type, read_dbf_header};

/// An open dBase file.
///
/// The underlying file handle lives exactly as long as this value, so it is
/// released when the value is dropped, whether or not iteration finished.
pub struct DbaseFile {
    path: PathBuf,
    header: DbfHeader,
    columns: Vec<ColumnSpec>,
    names: Arc<[String]>,
    reader: Reader<BufReader<File>>,
}

impl DbaseFile {
    /// Open `path`, validating its header before any record is read
    pub fn open<P: AsRef<Path>>(path: P) -> SharedResult<Self> {
        let path = path.as_ref();
        let header = read_dbf_header(path)?;

        let columns = header
            .fields
            .iter()
            .map(|field| -> SharedResult<ColumnSpec> {
                let dbase_type = DbaseType::from_code(field.type_code).ok_or_else(|| {
                    SharedError::format(path, format!("unrecognized field type '{}'", field.type_code))
                })?;
                Ok(ColumnSpec {
                    name: field.name.clone(),
                    dbase_type,
                    length: field.length,
                    decimal_count: field.decimal_count,
                    data_type: dbase_field_to_arrow_type(field),
                })
            })
            .collect::<SharedResult<Vec<_>>>()?;
        let names: Arc<[String]> = columns.iter().map(|c| c.name.clone()).collect();

        let mut reader = Reader::from_path(path).map_err(|e| open_error(path, e))?;
        // leading blanks in character fields are data
        reader.set_options(ReadingOptions::default().character_trim(TrimOption::End));
        log::info!(
            "Opened {}: {} fields, {} records declared",
            path.display(),
            columns.len(),
            header.num_records
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            columns,
            names,
            reader,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Lazily decode records in file order
    pub fn records(&mut self) -> impl Iterator<Item = SharedResult<Record>> + '_ {
        let path = self.path.as_path();
        let names = Arc::clone(&self.names);
        self.reader.iter_records().map(move |result| {
            let record = result.map_err(|e| SharedError::format(path, e.to_string()))?;
            let mut values = Vec::with_capacity(names.len());
            for name in names.iter() {
                let field_value = record
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SharedError::format(path, format!("record has no field {name}")))?;
                let cell = convert_dbase_value(field_value)
                    .map_err(|msg| SharedError::format(path, format!("field {name}: {msg}")))?;
                values.push(cell);
            }
            Ok(Record::new(Arc::clone(&names), values))
        })
    }
}

fn open_error(path: &Path, err: dbase::Error) -> SharedError {
    match err.kind() {
        ErrorKind::IoError(source) | ErrorKind::ErrorOpeningMemoFile(source) => {
            SharedError::file_access(path, io::Error::new(source.kind(), err.to_string()))
        }
        ErrorKind::MissingMemoFile => {
            SharedError::file_access(path, io::Error::new(io::ErrorKind::NotFound, err.to_string()))
        }
        _ => SharedError::format(path, err.to_string()),
    }
}

/// Read a whole dBase file into a [`Table`].
///
/// Room for the declared record count is reserved up front so that a file
/// too large for memory fails with [`SharedError::OutOfMemory`] instead of
/// aborting midway.
pub fn read_dbase_table<P: AsRef<Path>>(path: P) -> SharedResult<Table> {
    let mut file = DbaseFile::open(path)?;

    let declared = file.header().num_records as usize;
    let mut records: Vec<Record> = Vec::new();
    records
        .try_reserve_exact(declared)
        .map_err(|source| SharedError::OutOfMemory { rows: declared, source })?;

    for record in file.records() {
        records.push(record?);
    }

    let columns = file.columns().to_vec();
    log::info!("Read {} records from {}", records.len(), file.path().display());
    drop(file);

    Table::from_records(&columns, &records)
}
