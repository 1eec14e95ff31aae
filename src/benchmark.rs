use serde::Serialize;
use tracing::{debug, warn};

use crate::codes::{DeclarationYear, ProductCode, RouteTag};
use crate::tables::{BenchmarkEntry, BenchmarkTable};

/// Which fallback stage produced the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BenchmarkTier {
    /// Route tag and validity period both matched.
    RouteAndPeriod,
    /// Route tag matched; period did not or was unspecified.
    RouteOnly,
    /// Period matched; no entry carried the requested route.
    PeriodOnly,
    /// First remaining entry for the product prefix, in load order.
    AnyForProduct,
    /// No entry covers the product code; value is 0.
    Unresolved,
}

impl BenchmarkTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::RouteAndPeriod => "route+period",
            Self::RouteOnly => "route",
            Self::PeriodOnly => "period",
            Self::AnyForProduct => "product",
            Self::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BenchmarkMatch {
    pub value: f64,
    pub tier: BenchmarkTier,
    /// Digits of the table prefix that matched; `None` when unresolved.
    pub prefix_len: Option<usize>,
}

impl BenchmarkMatch {
    pub const UNRESOLVED: BenchmarkMatch = BenchmarkMatch {
        value: 0.0,
        tier: BenchmarkTier::Unresolved,
        prefix_len: None,
    };

    pub fn is_resolved(&self) -> bool {
        self.tier != BenchmarkTier::Unresolved
    }
}

/// Source of benchmark values for the calculator.
pub trait BenchmarkLookup {
    /// Returns the applicable benchmark. Absence is reported through
    /// [`BenchmarkTier::Unresolved`], never as an error.
    fn resolve_benchmark(
        &self,
        code: &ProductCode,
        route: Option<RouteTag>,
        year: DeclarationYear,
    ) -> BenchmarkMatch;
}

impl<T: BenchmarkLookup + ?Sized> BenchmarkLookup for &T {
    fn resolve_benchmark(
        &self,
        code: &ProductCode,
        route: Option<RouteTag>,
        year: DeclarationYear,
    ) -> BenchmarkMatch {
        (**self).resolve_benchmark(code, route, year)
    }
}

impl BenchmarkLookup for BenchmarkTable {
    fn resolve_benchmark(
        &self,
        code: &ProductCode,
        route: Option<RouteTag>,
        year: DeclarationYear,
    ) -> BenchmarkMatch {
        let Some(prefix_len) = self
            .entries()
            .iter()
            .filter(|e| code.is_covered_by(&e.prefix))
            .map(|e| e.prefix.len())
            .max()
        else {
            warn!(code = %code, "no benchmark entry covers product code");
            return BenchmarkMatch::UNRESOLVED;
        };

        // Only the most specific prefix group competes.
        let subset: Vec<&BenchmarkEntry> = self
            .entries()
            .iter()
            .filter(|e| e.prefix.len() == prefix_len && code.is_covered_by(&e.prefix))
            .collect();

        let Some((entry, tier)) = pick_in_tier_order(&subset, route, year) else {
            return BenchmarkMatch::UNRESOLVED;
        };

        debug!(
            code = %code,
            prefix = %entry.prefix,
            tier = tier.label(),
            value = entry.value,
            "benchmark resolved"
        );
        BenchmarkMatch {
            value: entry.value,
            tier,
            prefix_len: Some(prefix_len),
        }
    }
}

fn pick_in_tier_order<'a>(
    subset: &[&'a BenchmarkEntry],
    route: Option<RouteTag>,
    year: DeclarationYear,
) -> Option<(&'a BenchmarkEntry, BenchmarkTier)> {
    let period = Some(year.benchmark_period());
    let find = |pred: &dyn Fn(&BenchmarkEntry) -> bool| subset.iter().copied().find(|&e| pred(e));

    let by_route = route.and_then(|tag| {
        let tagged = |e: &BenchmarkEntry| e.route_tag == Some(tag);
        find(&|e| tagged(e) && e.period == period)
            .map(|e| (e, BenchmarkTier::RouteAndPeriod))
            .or_else(|| {
                find(&|e| tagged(e) && e.period.is_none())
                    .or_else(|| find(&tagged))
                    .map(|e| (e, BenchmarkTier::RouteOnly))
            })
    });

    by_route
        .or_else(|| {
            find(&|e| e.period == period && e.route_tag.is_none())
                .or_else(|| find(&|e| e.period == period))
                .map(|e| (e, BenchmarkTier::PeriodOnly))
        })
        .or_else(|| subset.first().map(|e| (*e, BenchmarkTier::AnyForProduct)))
}
