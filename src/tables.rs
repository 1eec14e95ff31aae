use serde::Serialize;

use crate::codes::{BenchmarkPeriod, ProductCode, RouteTag, YearBucket};
use crate::error::TableError;

/// Country label used by the regulator for the catch-all default rows.
pub const GENERIC_COUNTRY: &str = "Other Countries and Territories";

/// One benchmark row: a product prefix, an optional production route and
/// validity period, and the benchmark in tCO2e per tonne.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkEntry {
    pub prefix: ProductCode,
    pub route_tag: Option<RouteTag>,
    pub period: Option<BenchmarkPeriod>,
    pub value: f64,
}

impl BenchmarkEntry {
    /// Builds an entry from cleaned table cells.
    pub fn from_cells(
        prefix: &str,
        route_tag: &str,
        period: &str,
        value: f64,
    ) -> Result<Self, TableError> {
        let prefix =
            ProductCode::parse(prefix).ok_or_else(|| TableError::Prefix(prefix.to_string()))?;
        let route_tag = RouteTag::parse(route_tag)
            .map_err(|_| TableError::RouteTag(route_tag.to_string()))?;
        let period =
            BenchmarkPeriod::parse(period).map_err(|_| TableError::Period(period.to_string()))?;
        let value = checked_value("Benchmark_Value", value)?;
        Ok(Self {
            prefix,
            route_tag,
            period,
            value,
        })
    }
}

/// One default-emissions row. Absent bucket values stay `None`; they are
/// not the same thing as a published zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultEmissionsEntry {
    pub country: String,
    pub prefix: ProductCode,
    pub value_2026: Option<f64>,
    pub value_2027: Option<f64>,
    pub value_2028_onwards: Option<f64>,
    /// Lower-cased country, cached for matching.
    #[serde(skip)]
    country_key: String,
}

impl DefaultEmissionsEntry {
    pub fn new(
        country: &str,
        prefix: &str,
        value_2026: Option<f64>,
        value_2027: Option<f64>,
        value_2028_onwards: Option<f64>,
    ) -> Result<Self, TableError> {
        let country = country.trim();
        if country.is_empty() {
            return Err(TableError::EmptyCountry);
        }
        let prefix =
            ProductCode::parse(prefix).ok_or_else(|| TableError::Prefix(prefix.to_string()))?;
        let check = |bucket: YearBucket, v: Option<f64>| {
            v.map(|v| checked_value(bucket.column_name(), v)).transpose()
        };
        Ok(Self {
            country: country.to_string(),
            country_key: country.to_lowercase(),
            prefix,
            value_2026: check(YearBucket::Y2026, value_2026)?,
            value_2027: check(YearBucket::Y2027, value_2027)?,
            value_2028_onwards: check(YearBucket::Y2028Onwards, value_2028_onwards)?,
        })
    }

    pub fn value_for(&self, bucket: YearBucket) -> Option<f64> {
        match bucket {
            YearBucket::Y2026 => self.value_2026,
            YearBucket::Y2027 => self.value_2027,
            YearBucket::Y2028Onwards => self.value_2028_onwards,
        }
    }

    /// Lower-cased, trimmed country name.
    pub fn country_key(&self) -> &str {
        &self.country_key
    }

    pub fn is_generic(&self) -> bool {
        self.country_key.contains("other countries")
    }
}

fn checked_value(column: &'static str, value: f64) -> Result<f64, TableError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(TableError::Value { column, value })
    }
}

/// Benchmark table in load order. Load order is the tie-breaker for every
/// resolution tier, so it is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BenchmarkTable {
    entries: Vec<BenchmarkEntry>,
}

impl BenchmarkTable {
    pub fn new(entries: Vec<BenchmarkEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[BenchmarkEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<BenchmarkEntry> for BenchmarkTable {
    fn from_iter<I: IntoIterator<Item = BenchmarkEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Default-emissions table in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefaultsTable {
    entries: Vec<DefaultEmissionsEntry>,
}

impl DefaultsTable {
    pub fn new(entries: Vec<DefaultEmissionsEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DefaultEmissionsEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<DefaultEmissionsEntry> for DefaultsTable {
    fn from_iter<I: IntoIterator<Item = DefaultEmissionsEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Both reference tables for one calculation session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceTables {
    pub benchmarks: BenchmarkTable,
    pub defaults: DefaultsTable,
}
