//! CSV parsing for bronze loads
//!
//! Reads a whole scratch file into memory as strings. Bronze tables are a
//! raw landing zone, so every column is TEXT and no typing or validation
//! happens here beyond format parsing.

use std::path::Path;

/// Parsed CSV file: sanitized column names plus row values as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvFile {
    /// Read and parse the file at `path`.
    pub fn read(path: &Path) -> Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_path(path)?;

        let columns = sanitize_columns(reader.headers()?.iter());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|field| field.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Turn CSV headers into safe lowercase SQL column names.
///
/// Anything that is not alphanumeric becomes an underscore, names starting
/// with a digit get a leading underscore, blanks fall back to a positional
/// name, and duplicates get a numeric suffix.
fn sanitize_columns<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();

    for (index, header) in headers.enumerate() {
        let mut name: String = header
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        if name.is_empty() || name.chars().all(|c| c == '_') {
            name = format!("column_{}", index + 1);
        } else if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }

        let mut candidate = name.clone();
        let mut suffix = 2;
        while columns.contains(&candidate) {
            candidate = format!("{}_{}", name, suffix);
            suffix += 1;
        }

        columns.push(candidate);
    }

    columns
}
