//! Builds typed reference tables from the cleaned CSV exports.

use std::path::Path;

use tracing::info;

use crate::codes::YearBucket;
use crate::error::LoadError;
use crate::tables::{
    BenchmarkEntry, BenchmarkTable, DefaultEmissionsEntry, DefaultsTable, ReferenceTables,
};
use crate::tabular::CsvDocument;

pub const BENCHMARK_CODE: &str = "CN_code";
pub const BENCHMARK_TAG: &str = "Main_Tag";
pub const BENCHMARK_PERIOD: &str = "Year_Tag";
pub const BENCHMARK_VALUE: &str = "Benchmark_Value";

pub const DEFAULT_COUNTRY: &str = "Country";
pub const DEFAULT_CODE: &str = "Product CN Code";

pub fn load_tables(benchmarks: &Path, defaults: &Path) -> Result<ReferenceTables, LoadError> {
    let tables = ReferenceTables {
        benchmarks: load_benchmarks(benchmarks)?,
        defaults: load_defaults(defaults)?,
    };
    info!(
        benchmarks = tables.benchmarks.len(),
        defaults = tables.defaults.len(),
        "reference tables loaded"
    );
    Ok(tables)
}

pub fn load_benchmarks(path: &Path) -> Result<BenchmarkTable, LoadError> {
    benchmarks_from_document(&CsvDocument::read(path)?)
}

pub fn load_defaults(path: &Path) -> Result<DefaultsTable, LoadError> {
    defaults_from_document(&CsvDocument::read(path)?)
}

pub fn benchmarks_from_document(doc: &CsvDocument) -> Result<BenchmarkTable, LoadError> {
    let code = doc.column(BENCHMARK_CODE)?;
    let tag = doc.optional_column(BENCHMARK_TAG);
    let period = doc.optional_column(BENCHMARK_PERIOD);
    let value = doc.column(BENCHMARK_VALUE)?;

    doc.records()
        .iter()
        // Rows without a value carry no benchmark.
        .filter(|r| !r.get(value).is_empty())
        .map(|record| {
            let v = doc.number(record, value, BENCHMARK_VALUE)?.unwrap_or_default();
            BenchmarkEntry::from_cells(
                record.get(code),
                tag.map(|i| record.get(i)).unwrap_or(""),
                period.map(|i| record.get(i)).unwrap_or(""),
                v,
            )
            .map_err(|source| LoadError::Table {
                path: doc.path().to_path_buf(),
                line: record.line,
                source,
            })
        })
        .collect()
}

pub fn defaults_from_document(doc: &CsvDocument) -> Result<DefaultsTable, LoadError> {
    let country = doc.column(DEFAULT_COUNTRY)?;
    let code = doc.column(DEFAULT_CODE)?;
    let mut bucket_columns = [None; 3];
    for (slot, bucket) in bucket_columns.iter_mut().zip(YearBucket::ALL) {
        *slot = doc.optional_column(bucket.column_name());
    }
    if bucket_columns.iter().all(Option::is_none) {
        return Err(LoadError::MissingColumn {
            path: doc.path().to_path_buf(),
            column: YearBucket::Y2026.column_name().to_string(),
        });
    }

    doc.records()
        .iter()
        .map(|record| {
            let mut values = [None; 3];
            let cells = values.iter_mut().zip(bucket_columns).zip(YearBucket::ALL);
            for ((value, column), bucket) in cells {
                if let Some(index) = column {
                    *value = doc.number(record, index, bucket.column_name())?;
                }
            }
            let [v2026, v2027, v2028] = values;
            DefaultEmissionsEntry::new(record.get(country), record.get(code), v2026, v2027, v2028)
                .map_err(|source| LoadError::Table {
                    path: doc.path().to_path_buf(),
                    line: record.line,
                    source,
                })
        })
        .collect()
}
