use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use arrow::datatypes::{DataType, TimeUnit};
use chrono::NaiveDate;

use crate::errors::{SharedError, SharedResult};

/// Size of the fixed part of a dBase header
pub const DBF_HEADER_PREFIX_LEN: usize = 32;
/// Size of one field descriptor in the header
pub const DBF_FIELD_DESCRIPTOR_LEN: usize = 32;
/// Byte closing the field descriptor array
pub const DBF_FIELD_TERMINATOR: u8 = 0x0D;
/// Field type codes the reader can decode
pub const KNOWN_FIELD_TYPES: [char; 10] = ['C', 'N', 'F', 'D', 'L', 'M', 'I', 'B', 'Y', 'T'];

/// One field descriptor as declared in the dBase header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_code: char,
    pub length: u8,
    pub decimal_count: u8,
}

/// Fixed header of a dBase file.
///
/// This is parsed independently of the `dbase` crate so that the reader can
/// reject malformed files up front and learn each numeric field's decimal
/// count, which the crate does not expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfHeader {
    pub version: u8,
    pub last_update: Option<NaiveDate>,
    pub num_records: u32,
    pub header_length: u16,
    pub record_length: u16,
    pub fields: Vec<FieldDescriptor>,
}

impl DbfHeader {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Parse a complete header block (prefix and field descriptors)
pub fn parse_dbf_header(bytes: &[u8]) -> Result<DbfHeader, String> {
    if bytes.len() < DBF_HEADER_PREFIX_LEN + 1 {
        return Err(format!(
            "header is {} bytes, expected at least {}",
            bytes.len(),
            DBF_HEADER_PREFIX_LEN + 1
        ));
    }

    let version = bytes[0];
    let last_update = NaiveDate::from_ymd_opt(
        1900 + i32::from(bytes[1]),
        u32::from(bytes[2]),
        u32::from(bytes[3]),
    );
    let num_records = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let header_length = u16::from_le_bytes([bytes[8], bytes[9]]);
    let record_length = u16::from_le_bytes([bytes[10], bytes[11]]);

    if usize::from(header_length) < DBF_HEADER_PREFIX_LEN + 1 {
        return Err(format!("declared header length {header_length} is too small"));
    }

    let limit = bytes.len().min(usize::from(header_length));
    let mut fields = Vec::new();
    let mut offset = DBF_HEADER_PREFIX_LEN;
    loop {
        if offset >= limit {
            return Err("field descriptor array is not terminated".to_string());
        }
        if bytes[offset] == DBF_FIELD_TERMINATOR {
            break;
        }
        let end = offset + DBF_FIELD_DESCRIPTOR_LEN;
        if end > limit {
            return Err(format!("field descriptor at byte {offset} is truncated"));
        }
        fields.push(parse_field_descriptor(&bytes[offset..end])?);
        offset = end;
    }

    let declared_width: usize = fields.iter().map(|f| usize::from(f.length)).sum::<usize>() + 1;
    if declared_width != usize::from(record_length) {
        return Err(format!(
            "record length {record_length} does not match the {declared_width} bytes declared by the fields"
        ));
    }

    Ok(DbfHeader {
        version,
        last_update,
        num_records,
        header_length,
        record_length,
        fields,
    })
}

fn parse_field_descriptor(raw: &[u8]) -> Result<FieldDescriptor, String> {
    let name_bytes = &raw[..11];
    let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
    let name = String::from_utf8_lossy(&name_bytes[..name_end]).trim().to_string();
    if name.is_empty() {
        return Err("field descriptor has an empty name".to_string());
    }

    let type_code = char::from(raw[11]);
    if !KNOWN_FIELD_TYPES.contains(&type_code) {
        return Err(format!("field {name} has unrecognized type code '{type_code}'"));
    }

    Ok(FieldDescriptor {
        name,
        type_code,
        length: raw[16],
        decimal_count: raw[17],
    })
}

/// Check that the records a header declares fit in a file of `file_len` bytes
pub fn check_declared_size(header: &DbfHeader, file_len: u64) -> Result<(), String> {
    let needed = u64::from(header.header_length)
        + u64::from(header.num_records) * u64::from(header.record_length);
    if needed > file_len {
        return Err(format!(
            "header declares {} records of {} bytes but the file holds only {file_len} bytes",
            header.num_records, header.record_length
        ));
    }
    Ok(())
}

/// Read and validate the header of the dBase file at `file_path`.
///
/// The file handle is closed before returning.
pub fn read_dbf_header<P: AsRef<Path>>(file_path: P) -> SharedResult<DbfHeader> {
    let path = file_path.as_ref();
    let file = File::open(path).map_err(|e| SharedError::file_access(path, e))?;
    let file_len = file.metadata().map_err(|e| SharedError::file_access(path, e))?.len();
    let mut reader = BufReader::new(file);

    let mut prefix = [0u8; DBF_HEADER_PREFIX_LEN];
    read_header_bytes(&mut reader, &mut prefix, path)?;

    let header_length = usize::from(u16::from_le_bytes([prefix[8], prefix[9]]));
    let mut block = prefix.to_vec();
    if header_length > DBF_HEADER_PREFIX_LEN {
        block.resize(header_length, 0);
        read_header_bytes(&mut reader, &mut block[DBF_HEADER_PREFIX_LEN..], path)?;
    }

    let header = parse_dbf_header(&block).map_err(|msg| SharedError::format(path, msg))?;
    check_declared_size(&header, file_len).map_err(|msg| SharedError::format(path, msg))?;
    for field in &header.fields {
        log::debug!(
            "{}: field {} type {} length {} decimals {}",
            path.display(),
            field.name,
            field.type_code,
            field.length,
            field.decimal_count
        );
    }
    Ok(header)
}

fn read_header_bytes<R: Read>(reader: &mut R, buf: &mut [u8], path: &Path) -> SharedResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            SharedError::format(path, "file ends inside the header")
        } else {
            SharedError::file_access(path, e)
        }
    })
}

/// Convert a declared dBase field to the Arrow type it materializes as.
///
/// Numeric fields without decimals start out as integers; the reader widens
/// them to floats if a stored value turns out not to be integral.
pub fn dbase_field_to_arrow_type(field: &FieldDescriptor) -> DataType {
    match field.type_code {
        'N' if field.decimal_count == 0 => DataType::Int64,
        'N' | 'F' | 'B' | 'Y' => DataType::Float64,
        'I' => DataType::Int64,
        'D' => DataType::Date32,
        'T' => DataType::Timestamp(TimeUnit::Millisecond, None),
        'L' => DataType::Boolean,
        _ => DataType::Utf8,
    }
}
