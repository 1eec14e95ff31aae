use std::path::PathBuf;

use thiserror::Error;

/// A calculation request that cannot reach the resolvers.
///
/// Each variant names the offending field so the calling layer can point
/// the user at it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("product code {0:?} must be 4 to 8 digits")]
    ProductCode(String),
    #[error("country of origin must not be empty")]
    EmptyCountry,
    #[error("declaration year {0} is before the first CBAM compliance year 2026")]
    YearTooEarly(i32),
    #[error("declaration year {0} is beyond the supported range")]
    YearTooLate(i32),
    #[error("route tag {0:?} must be a single letter or empty")]
    RouteTag(String),
    #[error("{field} must be a finite non-negative number, got {value}")]
    NotNonNegative { field: &'static str, value: f64 },
    #[error("free allowance percentage must be within [0, 100], got {0}")]
    FreeAllowanceOutOfRange(f64),
    #[error("required field {0} is missing")]
    Missing(&'static str),
    #[error("field {field} is not a number: {raw:?}")]
    NotNumeric { field: &'static str, raw: String },
}

/// A reference table that violates its typed schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("product code prefix {0:?} must be 4 to 8 digits")]
    Prefix(String),
    #[error("route tag {0:?} must be a single letter or empty")]
    RouteTag(String),
    #[error("period tag {0:?} is not one of 1, 2, 2026-27, 2028-30 or empty")]
    Period(String),
    #[error("country name must not be empty")]
    EmptyCountry,
    #[error("{column} must be a finite non-negative number, got {value}")]
    Value { column: &'static str, value: f64 },
}

/// Failure while reading reference tables or batch input from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: file has no header row", path.display())]
    MissingHeader { path: PathBuf },
    #[error("{}: missing required column {column:?}", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{}: malformed CSV: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{}:{line}: column {column:?} is not a number: {raw:?}", path.display())]
    NotNumeric {
        path: PathBuf,
        line: usize,
        column: String,
        raw: String,
    },
    #[error("{}:{line}: {source}", path.display())]
    Table {
        path: PathBuf,
        line: usize,
        #[source]
        source: TableError,
    },
    #[error("{}:{line}: {source}", path.display())]
    Request {
        path: PathBuf,
        line: usize,
        #[source]
        source: RequestError,
    },
}

/// Configuration file faults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
}
