use serde::Serialize;

use crate::request::EconomicParams;
use crate::resolution::ResolutionResult;

/// Certificate cost for one declaration line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostResult {
    /// Emissions above the free allocation, tCO2e per tonne, floored at 0.
    pub emissions_gap: f64,
    /// EUR per tonne of product.
    pub unit_cost: f64,
    /// Unit cost times volume, before the foreign carbon price deduction.
    pub gross_cost: f64,
    /// EUR owed, floored at 0.
    pub total_cost: f64,
}

/// CBAM formula:
/// gap = max(0, E - B * FA/100), unit = gap * P, total = max(0, unit * V - paid).
pub fn compute_cost(resolution: &ResolutionResult, params: &EconomicParams) -> CostResult {
    cost_from_values(resolution.benchmark.value, resolution.emissions.value, params)
}

pub fn cost_from_values(benchmark: f64, emissions: f64, params: &EconomicParams) -> CostResult {
    let free_allowance_factor = params.free_allowance_percent / 100.0;
    let emissions_gap = (emissions - benchmark * free_allowance_factor).max(0.0);
    let unit_cost = emissions_gap * params.ets_price;
    let gross_cost = unit_cost * params.volume_tonnes;
    let total_cost = (gross_cost - params.already_paid).max(0.0);
    CostResult {
        emissions_gap,
        unit_cost,
        gross_cost,
        total_cost,
    }
}
