use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanBuilder, Date32Builder, Float64Builder, Int64Builder,
    StringBuilder, TimestampMillisecondBuilder,
};
use arrow::datatypes::{
    DataType, Date32Type, Field, Float64Type, Int64Type, Schema, TimeUnit,
    TimestampMillisecondType,
};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::array_value_to_string;

use crate::errors::SharedResult;
use crate::models::arrow_utils::dbase_arrow::{
    CellValue, DbaseType,
    utilities::{
        epoch_days_to_naive_date, epoch_millis_to_naive_datetime, naive_date_to_epoch_days,
        naive_datetime_to_epoch_millis,
    },
};

/// Declared column of a table: name, dBase origin and target Arrow type
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub dbase_type: DbaseType,
    pub length: u8,
    pub decimal_count: u8,
    pub data_type: DataType,
}

/// One row as produced by the reader, keyed by the shared column names
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<CellValue>,
}

impl Record {
    pub fn new(columns: Arc<[String]>, values: Vec<CellValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|column| column == name)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// In-memory table with a fixed, ordered set of named columns
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Build a table from records that all follow `columns`.
    ///
    /// Integer columns whose values are not all integral are widened to
    /// Float64 so that nothing is truncated.
    pub fn from_records(columns: &[ColumnSpec], records: &[Record]) -> SharedResult<Self> {
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

        for (idx, spec) in columns.iter().enumerate() {
            let values: Vec<&CellValue> = records.iter().map(|r| &r.values()[idx]).collect();
            let data_type = resolve_column_type(&spec.data_type, &values);
            arrays.push(build_array(&spec.name, &data_type, &values)?);

            let metadata = HashMap::from([
                ("dbase_type".to_string(), spec.dbase_type.to_string()),
                ("dbase_length".to_string(), spec.length.to_string()),
                ("dbase_decimals".to_string(), spec.decimal_count.to_string()),
            ]);
            fields.push(Field::new(&spec.name, data_type, true).with_metadata(metadata));
        }

        let options = RecordBatchOptions::new().with_row_count(Some(records.len()));
        let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(Self { batch })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn n_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn n_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_columns())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    /// The first `n` rows (all of them if the table is shorter)
    pub fn head(&self, n: usize) -> RecordBatch {
        self.batch.slice(0, n.min(self.n_rows()))
    }

    /// Value at `row`, `col`, or `None` when out of range
    pub fn cell(&self, row: usize, col: usize) -> Option<CellValue> {
        if row >= self.n_rows() || col >= self.n_columns() {
            return None;
        }
        let array = self.batch.column(col);
        if array.is_null(row) {
            return Some(CellValue::Null);
        }

        let cell = match array.data_type() {
            DataType::Utf8 => CellValue::Text(array.as_string::<i32>().value(row).to_string()),
            DataType::Int64 => CellValue::Integer(array.as_primitive::<Int64Type>().value(row)),
            DataType::Float64 => CellValue::Float(array.as_primitive::<Float64Type>().value(row)),
            DataType::Boolean => CellValue::Boolean(array.as_boolean().value(row)),
            DataType::Date32 => {
                let days = array.as_primitive::<Date32Type>().value(row);
                epoch_days_to_naive_date(days).map_or(CellValue::Null, CellValue::Date)
            }
            DataType::Timestamp(TimeUnit::Millisecond, _) => {
                let millis = array.as_primitive::<TimestampMillisecondType>().value(row);
                epoch_millis_to_naive_datetime(millis).map_or(CellValue::Null, CellValue::DateTime)
            }
            _ => CellValue::Text(array_value_to_string(array, row).unwrap_or_default()),
        };
        Some(cell)
    }

    /// All values of one row in column order
    pub fn row(&self, row: usize) -> Option<Vec<CellValue>> {
        (0..self.n_columns()).map(|col| self.cell(row, col)).collect()
    }
}

fn is_integral(value: &CellValue) -> bool {
    match value {
        CellValue::Null | CellValue::Integer(_) => true,
        CellValue::Float(v) => v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64,
        _ => false,
    }
}

fn resolve_column_type(declared: &DataType, values: &[&CellValue]) -> DataType {
    if *declared == DataType::Int64 && !values.iter().all(|v| is_integral(v)) {
        log::debug!("widening integer column to Float64");
        return DataType::Float64;
    }
    declared.clone()
}

fn mismatch(column: &str, expected: &DataType, value: &CellValue) -> ArrowError {
    ArrowError::InvalidArgumentError(format!(
        "column {column} expects {expected}, got {value:?}"
    ))
}

fn build_array(column: &str, data_type: &DataType, values: &[&CellValue]) -> SharedResult<ArrayRef> {
    let array: ArrayRef = match data_type {
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    CellValue::Null => builder.append_null(),
                    CellValue::Integer(v) => builder.append_value(*v),
                    CellValue::Float(v) => builder.append_value(*v as i64),
                    other => return Err(mismatch(column, data_type, other).into()),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(values.len());
            for value in values {
                match value {
                    CellValue::Null => builder.append_null(),
                    other => match other.as_f64() {
                        Some(v) => builder.append_value(v),
                        None => return Err(mismatch(column, data_type, other).into()),
                    },
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            for value in values {
                match value {
                    CellValue::Null => builder.append_null(),
                    CellValue::Boolean(b) => builder.append_value(*b),
                    other => return Err(mismatch(column, data_type, other).into()),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Date32 => {
            let mut builder = Date32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    CellValue::Null => builder.append_null(),
                    CellValue::Date(d) => builder.append_value(naive_date_to_epoch_days(*d)),
                    other => return Err(mismatch(column, data_type, other).into()),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Timestamp(TimeUnit::Millisecond, None) => {
            let mut builder = TimestampMillisecondBuilder::with_capacity(values.len());
            for value in values {
                match value {
                    CellValue::Null => builder.append_null(),
                    CellValue::DateTime(dt) => builder.append_value(naive_datetime_to_epoch_millis(*dt)),
                    other => return Err(mismatch(column, data_type, other).into()),
                }
            }
            Arc::new(builder.finish())
        }
        _ => {
            let mut builder = StringBuilder::with_capacity(values.len(), values.len() * 8);
            for value in values {
                match value {
                    CellValue::Null => builder.append_null(),
                    other => builder.append_value(other.to_string()),
                }
            }
            Arc::new(builder.finish())
        }
    };
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, dbase_type: DbaseType, data_type: DataType) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            dbase_type,
            length: 10,
            decimal_count: 0,
            data_type,
        }
    }

    fn sample() -> (Vec<ColumnSpec>, Vec<Record>) {
        let columns = vec![
            spec("ID", DbaseType::Numeric, DataType::Int64),
            spec("NAME", DbaseType::Character, DataType::Utf8),
            spec("VALUE", DbaseType::Numeric, DataType::Float64),
        ];
        let names: Arc<[String]> = columns.iter().map(|c| c.name.clone()).collect();
        let records = vec![
            Record::new(
                names.clone(),
                vec![CellValue::Float(1.0), CellValue::Text("A".into()), CellValue::Float(10.5)],
            ),
            Record::new(
                names.clone(),
                vec![CellValue::Float(2.0), CellValue::Null, CellValue::Float(20.0)],
            ),
        ];
        (columns, records)
    }

    #[test]
    fn test_record_lookup() {
        let (_, records) = sample();
        let record = &records[0];
        assert_eq!(record.len(), 3);
        assert!(!record.is_empty());
        assert_eq!(record.values()[2], CellValue::Float(10.5));
        assert_eq!(record.get("NAME"), Some(&CellValue::Text("A".into())));
        assert_eq!(record.get("MISSING"), None);
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ID", "NAME", "VALUE"]);

        let empty = Record::new(Arc::from(Vec::<String>::new()), Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.get("ID"), None);
    }

    #[test]
    fn test_from_records_shape_and_cells() {
        let (columns, records) = sample();
        let table = Table::from_records(&columns, &records).unwrap();

        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.column_names(), vec!["ID", "NAME", "VALUE"]);
        assert_eq!(table.batch().schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(table.cell(0, 0), Some(CellValue::Integer(1)));
        assert_eq!(table.cell(1, 1), Some(CellValue::Null));
        assert_eq!(table.cell(1, 2), Some(CellValue::Float(20.0)));
        assert_eq!(table.cell(2, 0), None);
        assert_eq!(
            table.batch().schema().field(1).metadata().get("dbase_type"),
            Some(&"Character".to_string())
        );
    }

    #[test]
    fn test_integer_column_widens_on_fraction() {
        let columns = vec![spec("AMOUNT", DbaseType::Numeric, DataType::Int64)];
        let names: Arc<[String]> = Arc::from(vec!["AMOUNT".to_string()]);
        let records = vec![
            Record::new(names.clone(), vec![CellValue::Float(1.0)]),
            Record::new(names.clone(), vec![CellValue::Float(1.5)]),
        ];
        let table = Table::from_records(&columns, &records).unwrap();
        assert_eq!(table.batch().schema().field(0).data_type(), &DataType::Float64);
        assert_eq!(table.cell(1, 0), Some(CellValue::Float(1.5)));
    }

    #[test]
    fn test_empty_table_keeps_columns() {
        let (columns, _) = sample();
        let table = Table::from_records(&columns, &[]).unwrap();
        assert_eq!(table.shape(), (0, 3));
        assert_eq!(table.head(5).num_rows(), 0);
    }

    #[test]
    fn test_head_is_bounded() {
        let (columns, records) = sample();
        let table = Table::from_records(&columns, &records).unwrap();
        assert_eq!(table.head(5).num_rows(), 2);
        assert_eq!(table.head(1).num_rows(), 1);
        assert_eq!(
            table.row(0),
            Some(vec![
                CellValue::Integer(1),
                CellValue::Text("A".into()),
                CellValue::Float(10.5)
            ])
        );
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let columns = vec![spec("FLAG", DbaseType::Logical, DataType::Boolean)];
        let names: Arc<[String]> = Arc::from(vec!["FLAG".to_string()]);
        let records = vec![Record::new(names, vec![CellValue::Text("yes".into())])];
        assert!(Table::from_records(&columns, &records).is_err());
    }
}
