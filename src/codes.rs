use std::fmt;

use serde::Serialize;

/// Shortest and longest product-code prefix accepted anywhere in the crate.
pub const MIN_CODE_LEN: usize = 4;
pub const MAX_CODE_LEN: usize = 8;

/// Combined Nomenclature code or prefix: 4 to 8 ASCII digits.
///
/// Spaces and dots are stripped on parse so "7202 49 10" and "7202.49.10"
/// both normalize to "72024910".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductCode(String);

impl ProductCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '.'))
            .collect();
        let len_ok = (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&digits.len());
        if len_ok && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(digits))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` equals this code or is a shorter prefix of it.
    pub fn is_covered_by(&self, prefix: &ProductCode) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    /// Leading `len` digits; `None` when the code is shorter than `len`.
    pub fn truncated(&self, len: usize) -> Option<&str> {
        self.0.get(..len)
    }

    /// Prefix lengths to try for default-value lookups, longest first:
    /// the full code, then 6 and 4 digits when shorter.
    pub fn lookup_lengths(&self) -> Vec<usize> {
        let mut lengths = vec![self.len()];
        lengths.extend([6, 4].into_iter().filter(|&l| l < self.len()));
        lengths
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw text that is neither empty nor a recognised tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrecognized;

/// Production-route tag, a single upper-case letter (A, B, C, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RouteTag(char);

impl RouteTag {
    /// Empty input is "no route"; anything other than one letter is rejected.
    pub fn parse(raw: &str) -> Result<Option<Self>, Unrecognized> {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(None),
            (Some(c), None) if c.is_ascii_alphabetic() => Ok(Some(Self(c.to_ascii_uppercase()))),
            _ => Err(Unrecognized),
        }
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for RouteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Benchmark validity period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BenchmarkPeriod {
    /// 2026-27, tagged "1" in the cleaned tables.
    First,
    /// 2028-30, tagged "2".
    Second,
}

impl BenchmarkPeriod {
    /// Empty input is "unspecified period".
    pub fn parse(raw: &str) -> Result<Option<Self>, Unrecognized> {
        match raw.trim() {
            "" => Ok(None),
            "1" | "2026-27" | "2026-2027" => Ok(Some(Self::First)),
            "2" | "2028-30" | "2028-2030" => Ok(Some(Self::Second)),
            _ => Err(Unrecognized),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "2026-27",
            Self::Second => "2028-30",
        }
    }
}

/// Column of the default-emissions table that applies to a declaration year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum YearBucket {
    Y2026,
    Y2027,
    Y2028Onwards,
}

impl YearBucket {
    pub const ALL: [YearBucket; 3] = [Self::Y2026, Self::Y2027, Self::Y2028Onwards];

    pub fn column_name(self) -> &'static str {
        match self {
            Self::Y2026 => "2026 Default Value (Including mark-up)",
            Self::Y2027 => "2027 Default Value (Including mark-up)",
            Self::Y2028Onwards => "2028 Default Value (Including mark-up)",
        }
    }
}

/// Declaration year, 2026 or later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DeclarationYear(u16);

impl DeclarationYear {
    pub const FIRST: i32 = 2026;
    /// Sanity ceiling; catches two-digit and mistyped years.
    pub const LAST: i32 = 2100;

    pub fn new(year: i32) -> Option<Self> {
        if (Self::FIRST..=Self::LAST).contains(&year) {
            u16::try_from(year).ok().map(Self)
        } else {
            None
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn benchmark_period(self) -> BenchmarkPeriod {
        if self.0 <= 2027 {
            BenchmarkPeriod::First
        } else {
            BenchmarkPeriod::Second
        }
    }

    pub fn default_bucket(self) -> YearBucket {
        match self.0 {
            2026 => YearBucket::Y2026,
            2027 => YearBucket::Y2027,
            _ => YearBucket::Y2028Onwards,
        }
    }
}

impl fmt::Display for DeclarationYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_code_normalizes_separators() {
        let code = ProductCode::parse(" 7202.49 10 ").unwrap();
        assert_eq!(code.as_str(), "72024910");
        assert!(ProductCode::parse("720").is_none());
        assert!(ProductCode::parse("720249101").is_none());
        assert!(ProductCode::parse("72a4").is_none());
    }

    #[test]
    fn lookup_lengths_descend() {
        let eight = ProductCode::parse("72024910").unwrap();
        assert_eq!(eight.lookup_lengths(), vec![8, 6, 4]);
        let seven = ProductCode::parse("7202491").unwrap();
        assert_eq!(seven.lookup_lengths(), vec![7, 6, 4]);
        let four = ProductCode::parse("7202").unwrap();
        assert_eq!(four.lookup_lengths(), vec![4]);
    }

    #[test]
    fn route_tag_parse() {
        assert_eq!(RouteTag::parse(""), Ok(None));
        assert_eq!(RouteTag::parse(" a ").unwrap().unwrap().as_char(), 'A');
        assert!(RouteTag::parse("AB").is_err());
        assert!(RouteTag::parse("1").is_err());
    }

    #[test]
    fn year_maps_to_period_and_bucket() {
        let y = |v| DeclarationYear::new(v).unwrap();
        assert_eq!(y(2026).benchmark_period(), BenchmarkPeriod::First);
        assert_eq!(y(2027).benchmark_period(), BenchmarkPeriod::First);
        assert_eq!(y(2028).benchmark_period(), BenchmarkPeriod::Second);
        assert_eq!(y(2026).default_bucket(), YearBucket::Y2026);
        assert_eq!(y(2027).default_bucket(), YearBucket::Y2027);
        assert_eq!(y(2031).default_bucket(), YearBucket::Y2028Onwards);
        assert!(DeclarationYear::new(2025).is_none());
    }

    #[test]
    fn period_labels() {
        assert_eq!(BenchmarkPeriod::parse("2026-27"), Ok(Some(BenchmarkPeriod::First)));
        assert_eq!(BenchmarkPeriod::parse("2"), Ok(Some(BenchmarkPeriod::Second)));
        assert_eq!(BenchmarkPeriod::parse(" "), Ok(None));
        assert!(BenchmarkPeriod::parse("3").is_err());
    }
}
