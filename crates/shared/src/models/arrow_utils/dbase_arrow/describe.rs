use std::io::Write;

use arrow::util::pretty::pretty_format_batches;

use crate::errors::SharedResult;
use crate::models::arrow_utils::dbase_arrow::Table;

/// Configuration for describing a loaded table
#[derive(Debug, Clone)]
pub struct DescribeConfig {
    /// Number of leading rows shown in the preview
    pub preview_rows: usize,
    /// Source name used in the title line, if any
    pub source_name: Option<String>,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            source_name: None,
        }
    }
}

/// Quote a string the way a Python `repr` would
fn python_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// `Shape: (rows, columns)`
pub fn format_shape(table: &Table) -> String {
    let (rows, columns) = table.shape();
    format!("Shape: ({rows}, {columns})")
}

/// `Columns: ['A', 'B']`
pub fn format_columns(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| python_repr(name)).collect();
    format!("Columns: [{}]", quoted.join(", "))
}

/// Write an aligned text table of the first `rows` rows
pub fn write_preview<W: Write>(out: &mut W, table: &Table, rows: usize) -> SharedResult<()> {
    let head = table.head(rows);
    let rendered = pretty_format_batches(&[head])?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

/// Print preview, shape and column names of `table` to `out`
pub fn describe_table<W: Write>(out: &mut W, table: &Table, config: &DescribeConfig) -> SharedResult<()> {
    if let Some(name) = &config.source_name {
        writeln!(out, "Data from {name}:")?;
    }
    write_preview(out, table, config.preview_rows)?;
    writeln!(out)?;
    writeln!(out, "{}", format_shape(table))?;
    writeln!(out)?;
    writeln!(out, "{}", format_columns(&table.column_names()))?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arrow_utils::dbase_arrow::fixtures::{
        DbfFixture, FixtureField, sample_table_fixture,
    };
    use crate::models::arrow_utils::dbase_arrow::read_dbase_table;
    use std::io;

    fn load(fixture: &DbfFixture) -> Table {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dbf");
        fixture.write_to(&path);
        read_dbase_table(&path).unwrap()
    }

    #[test]
    fn test_python_repr() {
        assert_eq!(python_repr("ID"), "'ID'");
        assert_eq!(python_repr("O'NEIL"), "\"O'NEIL\"");
        assert_eq!(python_repr("A'\"B"), "'A\\'\"B'");
    }

    #[test]
    fn test_python_repr_escapes_control_characters() {
        assert_eq!(python_repr("A\nB"), "'A\\nB'");
        assert_eq!(python_repr("T\tX\r"), "'T\\tX\\r'");
        assert_eq!(python_repr("C\u{1}D"), "'C\\x01D'");
        assert_eq!(python_repr("P\\Q"), "'P\\\\Q'");
        assert_eq!(
            format_columns(&["A\tB".to_string(), "CODE".to_string()]),
            "Columns: ['A\\tB', 'CODE']"
        );
    }

    #[test]
    fn test_describe_sample_table() {
        let table = load(&sample_table_fixture());
        let config = DescribeConfig {
            source_name: Some("BMS6T.DBF".to_string()),
            ..Default::default()
        };

        let mut out = Vec::new();
        describe_table(&mut out, &table, &config).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Data from BMS6T.DBF:\n"));
        assert!(text.contains("| ID | NAME | VALUE |"), "{text}");
        assert!(text.contains("| 3  | C    | 30.25 |"), "{text}");
        assert!(text.contains("\nShape: (3, 3)\n"));
        assert!(text.ends_with("\nColumns: ['ID', 'NAME', 'VALUE']\n"));
    }

    #[test]
    fn test_preview_is_limited_to_five_rows() {
        let mut fixture = DbfFixture::new(vec![FixtureField::numeric("N", 3, 0)]);
        for i in 0..8 {
            fixture = fixture.row(&[i.to_string().as_str()]);
        }
        let table = load(&fixture);

        let mut out = Vec::new();
        write_preview(&mut out, &table, 5).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("| 4 |"));
        assert!(!text.contains("| 5 |"));
        assert_eq!(format_shape(&table), "Shape: (8, 1)");
    }

    #[test]
    fn test_describe_empty_table() {
        let table = load(&DbfFixture::new(vec![FixtureField::character("CODE", 4)]));
        let mut out = Vec::new();
        describe_table(&mut out, &table, &DescribeConfig::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Shape: (0, 1)"));
        assert!(text.contains("Columns: ['CODE']"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unwritable_output_is_propagated() {
        let table = load(&sample_table_fixture());
        let err = describe_table(&mut BrokenPipe, &table, &DescribeConfig::default()).unwrap_err();
        assert!(matches!(err, crate::errors::SharedError::Output(_)));
    }
}
