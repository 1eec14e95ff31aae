//! Header-indexed CSV access for the cleaned reference exports and the
//! batch template. Cells are trimmed; short rows read as empty cells.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::LoadError;

#[derive(Debug, Clone)]
pub struct CsvDocument {
    path: PathBuf,
    headers: StringRecord,
    records: Vec<CsvRecord>,
}

/// One data row with the 1-based source line it starts on.
#[derive(Debug, Clone)]
pub struct CsvRecord {
    pub line: usize,
    fields: StringRecord,
}

impl CsvRecord {
    /// Trimmed cell text; missing trailing cells read as empty.
    pub fn get(&self, index: usize) -> &str {
        self.fields.get(index).unwrap_or("")
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(str::is_empty)
    }
}

impl CsvDocument {
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, LoadError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let csv_error = |source: csv::Error| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers().map_err(csv_error)?.clone();
        if headers.iter().all(str::is_empty) {
            return Err(LoadError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        let mut records = Vec::new();
        for result in reader.records() {
            let fields = result.map_err(csv_error)?;
            let line = fields.position().map_or(0, |p| p.line() as usize);
            let record = CsvRecord { line, fields };
            if !record.is_blank() {
                records.push(record);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[CsvRecord] {
        &self.records
    }

    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Result<usize, LoadError> {
        self.optional_column(name).ok_or_else(|| LoadError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })
    }

    /// Parses an optional numeric cell: empty is `None`.
    pub fn number(
        &self,
        record: &CsvRecord,
        index: usize,
        column: &str,
    ) -> Result<Option<f64>, LoadError> {
        let raw = record.get(index);
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>().map(Some).map_err(|_| LoadError::NotNumeric {
            path: self.path.clone(),
            line: record.line,
            column: column.to_string(),
            raw: raw.to_string(),
        })
    }
}
