use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use dbase::FieldValue;

/// Enum representing dBase field types for conversion mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbaseType {
    Character,
    Currency,
    Numeric,
    Float,
    Date,
    DateTime,
    Logical,
    Memo,
    Integer,
    Double,
}

impl DbaseType {
    /// Map a header type code to its dBase type
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(DbaseType::Character),
            'Y' => Some(DbaseType::Currency),
            'N' => Some(DbaseType::Numeric),
            'F' => Some(DbaseType::Float),
            'D' => Some(DbaseType::Date),
            'T' => Some(DbaseType::DateTime),
            'L' => Some(DbaseType::Logical),
            'M' => Some(DbaseType::Memo),
            'I' => Some(DbaseType::Integer),
            'B' => Some(DbaseType::Double),
            _ => None,
        }
    }
}

impl fmt::Display for DbaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DbaseType::Character => "Character",
            DbaseType::Currency => "Currency",
            DbaseType::Numeric => "Numeric",
            DbaseType::Float => "Float",
            DbaseType::Date => "Date",
            DbaseType::DateTime => "DateTime",
            DbaseType::Logical => "Logical",
            DbaseType::Memo => "Memo",
            DbaseType::Integer => "Integer",
            DbaseType::Double => "Double",
        };
        f.write_str(name)
    }
}

/// A single scalar read from a dBase record
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Boolean(bool),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view used when deciding a column's final type
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            CellValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

fn text_or_null(s: &str) -> CellValue {
    let trimmed = s.trim_end();
    if trimmed.is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(trimmed.to_string())
    }
}

fn to_naive_date(date: &dbase::Date) -> Result<NaiveDate, String> {
    NaiveDate::from_ymd_opt(date.year() as i32, date.month() as u32, date.day() as u32).ok_or_else(
        || format!("invalid date {:04}-{:02}-{:02}", date.year(), date.month(), date.day()),
    )
}

/// Convert a dBase FieldValue to a CellValue
pub fn convert_dbase_value(field_value: FieldValue) -> Result<CellValue, String> {
    let cell = match field_value {
        FieldValue::Character(Some(s)) => text_or_null(&s),
        FieldValue::Character(None) => CellValue::Null,
        FieldValue::Memo(s) => text_or_null(&s),
        FieldValue::Numeric(Some(n)) => CellValue::Float(n),
        FieldValue::Numeric(None) => CellValue::Null,
        // go through the shortest f32 text so 0.1 stays 0.1 after widening
        FieldValue::Float(Some(n)) => CellValue::Float(n.to_string().parse().unwrap_or(n as f64)),
        FieldValue::Float(None) => CellValue::Null,
        FieldValue::Double(n) => CellValue::Float(n),
        FieldValue::Currency(n) => CellValue::Float(n),
        FieldValue::Integer(n) => CellValue::Integer(i64::from(n)),
        FieldValue::Logical(Some(b)) => CellValue::Boolean(b),
        FieldValue::Logical(None) => CellValue::Null,
        FieldValue::Date(Some(date)) => CellValue::Date(to_naive_date(&date)?),
        FieldValue::Date(None) => CellValue::Null,
        FieldValue::DateTime(datetime) => {
            let date = to_naive_date(&datetime.date())?;
            let time = datetime.time();
            let value = date
                .and_hms_opt(time.hours() as u32, time.minutes() as u32, time.seconds() as u32)
                .ok_or_else(|| {
                    format!(
                        "invalid time {:02}:{:02}:{:02}",
                        time.hours(),
                        time.minutes(),
                        time.seconds()
                    )
                })?;
            CellValue::DateTime(value)
        }
        #[allow(unreachable_patterns)]
        other => return Err(format!("unsupported dBase value {other:?}")),
    };
    Ok(cell)
}
