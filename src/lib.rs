#![forbid(unsafe_code)]

//! CBAM certificate cost core.
//!
//! Resolves an emissions benchmark and an embedded-emissions figure from
//! read-only reference tables, then prices the gap at the ETS price.
//! The two lookups sit behind [`BenchmarkLookup`] and
//! [`DefaultEmissionsLookup`] so other table backends can be composed into a
//! [`CbamCalculator`].

pub mod batch;
pub mod benchmark;
pub mod codes;
pub mod config;
pub mod cost;
pub mod emissions;
pub mod error;
pub mod loader;
pub mod request;
pub mod resolution;
pub mod tables;
pub mod tabular;

use serde::Serialize;

pub use benchmark::{BenchmarkLookup, BenchmarkMatch, BenchmarkTier};
pub use codes::{BenchmarkPeriod, DeclarationYear, ProductCode, RouteTag, YearBucket};
pub use cost::{compute_cost, CostResult};
pub use emissions::{CountryScope, DefaultEmissionsLookup, EmissionsMatch, EmissionsProvenance};
pub use error::{ConfigError, LoadError, RequestError, TableError};
pub use request::{CalculationRequest, EconomicParams, RequestGuard, RequestInput};
pub use resolution::{resolve, ResolutionResult};
pub use tables::{
    BenchmarkEntry, BenchmarkTable, DefaultEmissionsEntry, DefaultsTable, ReferenceTables,
};

/// Resolution plus the priced result for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calculation {
    pub resolution: ResolutionResult,
    pub cost: CostResult,
}

/// Composes a benchmark source and a defaults source into the full
/// resolve-then-price pipeline. Holds no mutable state; one instance can
/// serve any number of requests, from any number of threads when `B` and
/// `D` are `Sync`.
#[derive(Debug, Clone)]
pub struct CbamCalculator<B, D>
where
    B: BenchmarkLookup,
    D: DefaultEmissionsLookup,
{
    pub benchmarks: B,
    pub defaults: D,
}

impl<B, D> CbamCalculator<B, D>
where
    B: BenchmarkLookup,
    D: DefaultEmissionsLookup,
{
    pub fn new(benchmarks: B, defaults: D) -> Self {
        Self {
            benchmarks,
            defaults,
        }
    }

    pub fn resolve(&self, request: &CalculationRequest) -> ResolutionResult {
        resolve(request, &self.benchmarks, &self.defaults)
    }

    pub fn calculate(&self, request: &CalculationRequest) -> Calculation {
        let resolution = self.resolve(request);
        let cost = compute_cost(&resolution, request.economics());
        Calculation { resolution, cost }
    }
}

impl<'a> From<&'a ReferenceTables> for CbamCalculator<&'a BenchmarkTable, &'a DefaultsTable> {
    fn from(tables: &'a ReferenceTables) -> Self {
        CbamCalculator::new(&tables.benchmarks, &tables.defaults)
    }
}

/// Resolves and prices one request against a pair of loaded tables.
pub fn calculate(request: &CalculationRequest, tables: &ReferenceTables) -> Calculation {
    CbamCalculator::from(tables).calculate(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::GENERIC_COUNTRY;

    fn tables() -> ReferenceTables {
        ReferenceTables {
            benchmarks: BenchmarkTable::new(vec![
                BenchmarkEntry::from_cells("7202", "A", "1", 0.702).unwrap(),
                BenchmarkEntry::from_cells("7202", "A", "2", 0.65).unwrap(),
            ]),
            defaults: DefaultsTable::new(vec![
                DefaultEmissionsEntry::new("China", "72024910", Some(2.103), Some(2.2), Some(2.4))
                    .unwrap(),
                DefaultEmissionsEntry::new(GENERIC_COUNTRY, "7202", Some(3.0), Some(3.1), Some(3.2))
                    .unwrap(),
            ]),
        }
    }

    fn request(country: &str, year: i32, actual: Option<f64>) -> CalculationRequest {
        RequestGuard::validate_request(&RequestInput {
            hs_code: "72024910".into(),
            country_origin: country.into(),
            year: Some(year),
            actual_direct_emissions: actual,
            production_route_tag: Some("A".into()),
            volume_imported_tn: Some(10.0),
            ets_price_eur: Some(75.0),
            free_allowance_perc: Some(97.5),
            already_paid_eur: None,
        })
        .unwrap()
    }

    #[test]
    fn end_to_end_default_path() {
        let calc = calculate(&request("China", 2026, Some(0.0)), &tables());
        assert_eq!(calc.resolution.benchmark_value(), 0.702);
        assert_eq!(calc.resolution.emissions_value(), 2.103);
        assert!(calc.resolution.emissions.provenance.is_default());
        assert!((calc.cost.total_cost - 1063.9125).abs() < 1e-6);
        assert!(!calc.resolution.has_unresolved());
    }

    #[test]
    fn actual_emissions_bypass_defaults() {
        let calc = calculate(&request("China", 2028, Some(1.7)), &tables());
        assert_eq!(calc.resolution.emissions.provenance, EmissionsProvenance::Actual);
        assert_eq!(calc.resolution.emissions_value(), 1.7);
        assert_eq!(calc.resolution.benchmark_value(), 0.65);
    }

    #[test]
    fn generic_calculator_over_borrowed_tables() {
        let tables = tables();
        let calculator = CbamCalculator::new(&tables.benchmarks, &tables.defaults);
        let calc = calculator.calculate(&request("Brazil", 2027, None));
        assert_eq!(calc.resolution.emissions_value(), 3.1);
        assert!(matches!(
            calc.resolution.emissions.provenance,
            EmissionsProvenance::Default {
                scope: CountryScope::Generic,
                prefix_len: 4
            }
        ));
    }

    #[test]
    fn empty_tables_give_zero_with_unresolved_provenance() {
        let calc = calculate(&request("China", 2026, None), &ReferenceTables::default());
        assert!(calc.resolution.has_unresolved());
        assert_eq!(calc.resolution.benchmark.tier, BenchmarkTier::Unresolved);
        assert_eq!(calc.cost.total_cost, 0.0);
    }
}
