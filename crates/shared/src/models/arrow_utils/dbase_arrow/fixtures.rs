//! Test-only writer for small dBase III files.

use std::path::Path;

#[derive(Debug, Clone)]
pub struct FixtureField {
    name: &'static str,
    type_code: u8,
    length: u8,
    decimals: u8,
}

impl FixtureField {
    pub fn character(name: &'static str, length: u8) -> Self {
        Self { name, type_code: b'C', length, decimals: 0 }
    }

    pub fn numeric(name: &'static str, length: u8, decimals: u8) -> Self {
        Self { name, type_code: b'N', length, decimals }
    }

    pub fn float(name: &'static str, length: u8, decimals: u8) -> Self {
        Self { name, type_code: b'F', length, decimals }
    }

    pub fn date(name: &'static str) -> Self {
        Self { name, type_code: b'D', length: 8, decimals: 0 }
    }

    pub fn logical(name: &'static str) -> Self {
        Self { name, type_code: b'L', length: 1, decimals: 0 }
    }

    pub fn memo(name: &'static str) -> Self {
        Self { name, type_code: b'M', length: 10, decimals: 0 }
    }

    fn right_aligned(&self) -> bool {
        matches!(self.type_code, b'N' | b'F')
    }
}

/// In-memory description of a dBase file; cells are given as their stored text
#[derive(Debug, Clone)]
pub struct DbfFixture {
    version: u8,
    code_page: u8,
    fields: Vec<FixtureField>,
    rows: Vec<Vec<Vec<u8>>>,
}

impl DbfFixture {
    pub fn new(fields: Vec<FixtureField>) -> Self {
        Self { version: 0x03, code_page: 0, fields, rows: Vec::new() }
    }

    /// Version byte; 0x83 declares a dBase III file with a memo file
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Language driver byte, e.g. 0x03 for Windows-1252
    pub fn code_page(mut self, code_page: u8) -> Self {
        self.code_page = code_page;
        self
    }

    pub fn row(self, cells: &[&str]) -> Self {
        let raw: Vec<&[u8]> = cells.iter().map(|c| c.as_bytes()).collect();
        self.raw_row(&raw)
    }

    /// Row given as already-encoded bytes
    pub fn raw_row(mut self, cells: &[&[u8]]) -> Self {
        assert_eq!(cells.len(), self.fields.len(), "row width must match the field count");
        self.rows.push(cells.iter().map(|c| c.to_vec()).collect());
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let header_length = 32 + 32 * self.fields.len() + 1;
        let record_length = 1 + self.fields.iter().map(|f| usize::from(f.length)).sum::<usize>();

        let mut out = Vec::with_capacity(header_length + record_length * self.rows.len() + 1);
        out.push(self.version);
        out.extend_from_slice(&[124, 1, 1]);
        out.extend_from_slice(&(self.rows.len() as u32).to_le_bytes());
        out.extend_from_slice(&(header_length as u16).to_le_bytes());
        out.extend_from_slice(&(record_length as u16).to_le_bytes());
        out.extend_from_slice(&[0u8; 17]);
        out.push(self.code_page);
        out.extend_from_slice(&[0u8; 2]);

        for field in &self.fields {
            let mut name = [0u8; 11];
            name[..field.name.len()].copy_from_slice(field.name.as_bytes());
            out.extend_from_slice(&name);
            out.push(field.type_code);
            out.extend_from_slice(&[0u8; 4]);
            out.push(field.length);
            out.push(field.decimals);
            out.extend_from_slice(&[0u8; 14]);
        }
        out.push(0x0D);

        for row in &self.rows {
            out.push(b' ');
            for (field, cell) in self.fields.iter().zip(row) {
                let width = usize::from(field.length);
                let padding = width.checked_sub(cell.len()).unwrap_or_else(|| {
                    panic!("cell {:?} does not fit field {}", String::from_utf8_lossy(cell), field.name)
                });
                if field.right_aligned() {
                    out.extend(std::iter::repeat_n(b' ', padding));
                    out.extend_from_slice(cell);
                } else {
                    out.extend_from_slice(cell);
                    out.extend(std::iter::repeat_n(b' ', padding));
                }
            }
        }
        out.push(0x1A);
        out
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) {
        std::fs::write(path, self.to_bytes()).expect("write dbf fixture");
    }
}

/// The three-row ID/NAME/VALUE table used across the crate's tests
pub fn sample_table_fixture() -> DbfFixture {
    DbfFixture::new(vec![
        FixtureField::numeric("ID", 5, 0),
        FixtureField::character("NAME", 10),
        FixtureField::numeric("VALUE", 8, 2),
    ])
    .row(&["1", "A", "10.50"])
    .row(&["2", "B", "20.00"])
    .row(&["3", "C", "30.25"])
}
