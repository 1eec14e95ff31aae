//! Batch processing over the input template: one calculation per row,
//! rendered into the results sheet.

use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::emissions::EmissionsProvenance;
use crate::error::{LoadError, RequestError};
use crate::request::{CalculationRequest, RequestGuard, RequestInput};
use crate::tables::ReferenceTables;
use crate::tabular::{CsvDocument, CsvRecord};
use crate::{calculate, Calculation};

pub const INPUT_COLUMNS: [&str; 9] = [
    "hs_code",
    "country_origin",
    "year",
    "actual_direct_emissions_tco2_tn",
    "production_route_tag",
    "volume_imported_tn",
    "ets_price_eur",
    "free_allowance_perc",
    "already_paid_eur",
];

pub const RESULT_COLUMNS: [&str; 9] = [
    "HS Code",
    "Year",
    "Emissions Used",
    "Is Default",
    "Benchmark Used",
    "Benchmark Tier",
    "Emissions Source",
    "CBAM Cost/tn",
    "Total to Pay",
];

/// One priced input row.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub line: usize,
    pub request: CalculationRequest,
    pub calculation: Calculation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub unresolved_benchmarks: usize,
    pub unresolved_defaults: usize,
    pub total_to_pay: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Writes the results sheet, header first.
    pub fn write_csv<W: io::Write>(&self, out: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(RESULT_COLUMNS)?;
        for row in &self.rows {
            let res = &row.calculation.resolution;
            let cost = &row.calculation.cost;
            let is_default = if res.emissions.provenance.is_default() { "True" } else { "False" };
            writer.write_record([
                row.request.product_code().to_string(),
                row.request.year().to_string(),
                res.emissions.value.to_string(),
                is_default.to_string(),
                res.benchmark.value.to_string(),
                res.benchmark.tier.label().to_string(),
                res.emissions.provenance.label().to_string(),
                cost.unit_cost.to_string(),
                cost.total_cost.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Reads and validates every row of an input template file. Rows with an
/// empty `already_paid_eur` take `default_already_paid`.
pub fn read_requests(
    path: &Path,
    default_already_paid: f64,
) -> Result<Vec<(usize, CalculationRequest)>, LoadError> {
    requests_from_document(&CsvDocument::read(path)?, default_already_paid)
}

pub fn requests_from_document(
    doc: &CsvDocument,
    default_already_paid: f64,
) -> Result<Vec<(usize, CalculationRequest)>, LoadError> {
    let mut columns = [None; INPUT_COLUMNS.len()];
    for (slot, name) in columns.iter_mut().zip(INPUT_COLUMNS) {
        *slot = doc.optional_column(name);
    }
    // Everything but the foreign carbon price is required in the header.
    if let Some((_, name)) = columns
        .iter()
        .zip(INPUT_COLUMNS)
        .take(INPUT_COLUMNS.len() - 1)
        .find(|(index, _)| index.is_none())
    {
        return Err(LoadError::MissingColumn {
            path: doc.path().to_path_buf(),
            column: name.to_string(),
        });
    }

    doc.records()
        .iter()
        .map(|record| {
            let request = input_from_record(record, &columns)
                .and_then(|mut input| {
                    input.already_paid_eur = input.already_paid_eur.or(Some(default_already_paid));
                    RequestGuard::validate_request(&input)
                })
                .map_err(|source| LoadError::Request {
                    path: doc.path().to_path_buf(),
                    line: record.line,
                    source,
                })?;
            Ok((record.line, request))
        })
        .collect()
}

fn input_from_record(
    record: &CsvRecord,
    columns: &[Option<usize>; INPUT_COLUMNS.len()],
) -> Result<RequestInput, RequestError> {
    let text = |i: usize| columns[i].map(|c| record.get(c)).unwrap_or("");
    let number = |i: usize| -> Result<Option<f64>, RequestError> {
        let raw = text(i);
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>().map(Some).map_err(|_| RequestError::NotNumeric {
            field: INPUT_COLUMNS[i],
            raw: raw.to_string(),
        })
    };
    let year = match number(2)? {
        Some(y) if y.fract() == 0.0 && y.abs() < f64::from(i32::MAX) => Some(y as i32),
        Some(_) => {
            return Err(RequestError::NotNumeric {
                field: INPUT_COLUMNS[2],
                raw: text(2).to_string(),
            })
        }
        None => None,
    };
    let tag = text(4);

    Ok(RequestInput {
        hs_code: text(0).to_string(),
        country_origin: text(1).to_string(),
        year,
        actual_direct_emissions: number(3)?,
        production_route_tag: (!tag.is_empty()).then(|| tag.to_string()),
        volume_imported_tn: number(5)?,
        ets_price_eur: number(6)?,
        free_allowance_perc: number(7)?,
        already_paid_eur: number(8)?,
    })
}

/// Prices every request against the tables and tallies unresolved lookups.
pub fn run_batch(
    tables: &ReferenceTables,
    requests: Vec<(usize, CalculationRequest)>,
) -> BatchReport {
    let mut summary = BatchSummary::default();
    let rows: Vec<BatchRow> = requests
        .into_iter()
        .map(|(line, request)| {
            let calculation = calculate(&request, tables);
            let res = &calculation.resolution;
            if !res.benchmark.is_resolved() {
                summary.unresolved_benchmarks += 1;
                warn!(
                    line,
                    code = %request.product_code(),
                    "benchmark not found; priced with benchmark 0"
                );
            }
            if res.emissions.provenance == EmissionsProvenance::DefaultUnresolved {
                summary.unresolved_defaults += 1;
                warn!(
                    line,
                    code = %request.product_code(),
                    country = request.country(),
                    "default emissions not found; priced with 0"
                );
            }
            summary.rows += 1;
            summary.total_to_pay += calculation.cost.total_cost;
            BatchRow {
                line,
                request,
                calculation,
            }
        })
        .collect();

    info!(
        rows = summary.rows,
        unresolved_benchmarks = summary.unresolved_benchmarks,
        unresolved_defaults = summary.unresolved_defaults,
        total_to_pay = summary.total_to_pay,
        "batch complete"
    );
    BatchReport { rows, summary }
}

/// Writes an empty input sheet with one illustrative row.
pub fn write_template<W: io::Write>(out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(INPUT_COLUMNS)?;
    writer.write_record(["72024910", "China", "2026", "0", "A", "10", "75", "97.5", "0"])?;
    writer.flush()?;
    Ok(())
}
