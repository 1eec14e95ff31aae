use serde::Serialize;
use tracing::{debug, warn};

use crate::codes::{DeclarationYear, ProductCode};
use crate::request::CalculationRequest;
use crate::tables::{DefaultEmissionsEntry, DefaultsTable};

/// Which country rows satisfied a default lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CountryScope {
    /// A row for the declared country of origin.
    Country,
    /// The "Other Countries and Territories" catch-all.
    Generic,
}

/// Where the emissions figure came from. A `DefaultUnresolved` zero is a
/// failed lookup, not a published zero; check this before trusting the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EmissionsProvenance {
    Actual,
    Default { scope: CountryScope, prefix_len: usize },
    DefaultUnresolved,
}

impl EmissionsProvenance {
    pub fn is_default(self) -> bool {
        !matches!(self, Self::Actual)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Actual => "actual",
            Self::Default {
                scope: CountryScope::Country,
                ..
            } => "default",
            Self::Default {
                scope: CountryScope::Generic,
                ..
            } => "default-generic",
            Self::DefaultUnresolved => "default-unresolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmissionsMatch {
    /// tCO2e per tonne of product.
    pub value: f64,
    pub provenance: EmissionsProvenance,
}

impl EmissionsMatch {
    pub const UNRESOLVED: EmissionsMatch = EmissionsMatch {
        value: 0.0,
        provenance: EmissionsProvenance::DefaultUnresolved,
    };
}

/// Source of regulator default emission values.
pub trait DefaultEmissionsLookup {
    /// Returns a `Default` or `DefaultUnresolved` match, never `Actual`.
    fn resolve_default(
        &self,
        code: &ProductCode,
        country: &str,
        year: DeclarationYear,
    ) -> EmissionsMatch;
}

impl<T: DefaultEmissionsLookup + ?Sized> DefaultEmissionsLookup for &T {
    fn resolve_default(
        &self,
        code: &ProductCode,
        country: &str,
        year: DeclarationYear,
    ) -> EmissionsMatch {
        (**self).resolve_default(code, country, year)
    }
}

impl DefaultEmissionsLookup for DefaultsTable {
    fn resolve_default(
        &self,
        code: &ProductCode,
        country: &str,
        year: DeclarationYear,
    ) -> EmissionsMatch {
        let bucket = year.default_bucket();
        let country_key = country.trim().to_lowercase();

        let usable = |e: &&DefaultEmissionsEntry| e.value_for(bucket).is_some();
        let specific: Vec<&DefaultEmissionsEntry> =
            self.entries().iter().filter(|e| !e.is_generic()).filter(usable).collect();
        let generic: Vec<&DefaultEmissionsEntry> =
            self.entries().iter().filter(|e| e.is_generic()).filter(usable).collect();

        // Each pass walks every prefix length before the next pass starts.
        let hit = search_by_prefix(&specific, code, |e| e.country_key() == country_key)
            .or_else(|| {
                search_by_prefix(&specific, code, |e| {
                    is_qualified_form(e.country_key(), &country_key)
                })
            })
            .map(|(e, len)| (e, len, CountryScope::Country))
            .or_else(|| {
                search_by_prefix(&generic, code, |_| true)
                    .map(|(e, len)| (e, len, CountryScope::Generic))
            });

        match hit.and_then(|(e, len, scope)| e.value_for(bucket).map(|v| (e, v, len, scope))) {
            Some((entry, value, prefix_len, scope)) => {
                debug!(
                    code = %code,
                    country = %entry.country,
                    prefix = %entry.prefix,
                    ?scope,
                    value,
                    "default emissions resolved"
                );
                EmissionsMatch {
                    value,
                    provenance: EmissionsProvenance::Default { scope, prefix_len },
                }
            }
            None => {
                warn!(code = %code, country, year = year.get(), "no default emissions value found");
                EmissionsMatch::UNRESOLVED
            }
        }
    }
}

/// True when `entry_key` is the qualified form of `request_key`: the part
/// before the first comma or parenthesis equals the request, as in
/// "korea, republic of" or "iran (islamic republic of)". "niger" does not
/// match "nigeria" and "guinea" does not match "equatorial guinea".
fn is_qualified_form(entry_key: &str, request_key: &str) -> bool {
    if request_key.is_empty() || entry_key == request_key {
        return false;
    }
    entry_key
        .split([',', '('])
        .next()
        .is_some_and(|base| base.trim() == request_key)
}

/// Walks prefix lengths longest first and returns the first accepted
/// entry in load order.
fn search_by_prefix<'a>(
    entries: &[&'a DefaultEmissionsEntry],
    code: &ProductCode,
    accept: impl Fn(&DefaultEmissionsEntry) -> bool,
) -> Option<(&'a DefaultEmissionsEntry, usize)> {
    code.lookup_lengths().into_iter().find_map(|len| {
        let prefix = code.truncated(len)?;
        entries
            .iter()
            .copied()
            .find(|e| e.prefix.as_str() == prefix && accept(e))
            .map(|e| (e, len))
    })
}

/// Picks the emissions figure for a request: measured emissions when
/// strictly positive, otherwise the regulator default.
pub fn resolve_emissions<D: DefaultEmissionsLookup + ?Sized>(
    defaults: &D,
    request: &CalculationRequest,
) -> EmissionsMatch {
    match request.actual_emissions() {
        Some(actual) if actual > 0.0 => EmissionsMatch {
            value: actual,
            provenance: EmissionsProvenance::Actual,
        },
        _ => defaults.resolve_default(request.product_code(), request.country(), request.year()),
    }
}
