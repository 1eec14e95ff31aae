use serde::Serialize;

use crate::benchmark::{BenchmarkLookup, BenchmarkMatch};
use crate::emissions::{
    resolve_emissions, DefaultEmissionsLookup, EmissionsMatch, EmissionsProvenance,
};
use crate::request::CalculationRequest;

/// Reference values chosen for one request, with their provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub benchmark: BenchmarkMatch,
    pub emissions: EmissionsMatch,
}

impl ResolutionResult {
    pub fn benchmark_value(&self) -> f64 {
        self.benchmark.value
    }

    pub fn emissions_value(&self) -> f64 {
        self.emissions.value
    }

    /// True when either lookup fell through every tier.
    pub fn has_unresolved(&self) -> bool {
        !self.benchmark.is_resolved()
            || self.emissions.provenance == EmissionsProvenance::DefaultUnresolved
    }
}

/// Resolves benchmark and emissions values for a validated request.
pub fn resolve<B, D>(request: &CalculationRequest, benchmarks: &B, defaults: &D) -> ResolutionResult
where
    B: BenchmarkLookup + ?Sized,
    D: DefaultEmissionsLookup + ?Sized,
{
    let benchmark =
        benchmarks.resolve_benchmark(request.product_code(), request.route_tag(), request.year());
    let emissions = resolve_emissions(defaults, request);
    ResolutionResult {
        benchmark,
        emissions,
    }
}
