use serde::{Deserialize, Serialize};

use crate::codes::{DeclarationYear, ProductCode, RouteTag};
use crate::error::RequestError;

/// Request record as handed over by a form, CLI, or batch row.
/// Nothing here is trusted until it passes [`RequestGuard`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    pub hs_code: String,
    pub country_origin: String,
    pub year: Option<i32>,
    /// `None` or `0` both mean "use the regulator default".
    pub actual_direct_emissions: Option<f64>,
    #[serde(default)]
    pub production_route_tag: Option<String>,
    pub volume_imported_tn: Option<f64>,
    pub ets_price_eur: Option<f64>,
    pub free_allowance_perc: Option<f64>,
    #[serde(default)]
    pub already_paid_eur: Option<f64>,
}

/// Validated, immutable calculation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationRequest {
    product_code: ProductCode,
    country: String,
    year: DeclarationYear,
    actual_emissions: Option<f64>,
    route_tag: Option<RouteTag>,
    economics: EconomicParams,
}

impl CalculationRequest {
    pub fn product_code(&self) -> &ProductCode {
        &self.product_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn year(&self) -> DeclarationYear {
        self.year
    }

    /// Measured direct emissions per tonne, if the importer supplied any.
    pub fn actual_emissions(&self) -> Option<f64> {
        self.actual_emissions
    }

    pub fn route_tag(&self) -> Option<RouteTag> {
        self.route_tag
    }

    pub fn economics(&self) -> &EconomicParams {
        &self.economics
    }
}

impl TryFrom<RequestInput> for CalculationRequest {
    type Error = RequestError;

    fn try_from(input: RequestInput) -> Result<Self, Self::Error> {
        RequestGuard::validate_request(&input)
    }
}

/// Market parameters that monetize the emissions gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicParams {
    /// EUR per tonne CO2e.
    pub ets_price: f64,
    /// Share of the benchmark exempted, in percent [0, 100].
    pub free_allowance_percent: f64,
    pub volume_tonnes: f64,
    /// Carbon price already paid in the country of origin, EUR.
    pub already_paid: f64,
}

/// Rejects malformed requests before they reach the resolvers.
pub struct RequestGuard;

impl RequestGuard {
    pub fn validate_request(input: &RequestInput) -> Result<CalculationRequest, RequestError> {
        let product_code = ProductCode::parse(&input.hs_code)
            .ok_or_else(|| RequestError::ProductCode(input.hs_code.clone()))?;

        let country = input.country_origin.trim();
        if country.is_empty() {
            return Err(RequestError::EmptyCountry);
        }

        let raw_year = input.year.ok_or(RequestError::Missing("year"))?;
        let year = DeclarationYear::new(raw_year).ok_or(if raw_year < DeclarationYear::FIRST {
            RequestError::YearTooEarly(raw_year)
        } else {
            RequestError::YearTooLate(raw_year)
        })?;

        let actual_emissions = input
            .actual_direct_emissions
            .map(|v| Self::non_negative("actual_direct_emissions", v))
            .transpose()?;

        let route_tag = match input.production_route_tag.as_deref() {
            Some(raw) => RouteTag::parse(raw).map_err(|_| RequestError::RouteTag(raw.to_string()))?,
            None => None,
        };

        let volume_tonnes = Self::required("volume_imported_tn", input.volume_imported_tn)?;
        let ets_price = Self::required("ets_price_eur", input.ets_price_eur)?;
        let free_allowance_percent = input
            .free_allowance_perc
            .ok_or(RequestError::Missing("free_allowance_perc"))?;
        Self::validate_free_allowance(free_allowance_percent)?;
        let already_paid =
            Self::non_negative("already_paid_eur", input.already_paid_eur.unwrap_or(0.0))?;

        Ok(CalculationRequest {
            product_code,
            country: country.to_string(),
            year,
            actual_emissions,
            route_tag,
            economics: EconomicParams {
                ets_price,
                free_allowance_percent,
                volume_tonnes,
                already_paid,
            },
        })
    }

    pub fn validate_free_allowance(percent: f64) -> Result<(), RequestError> {
        if (0.0..=100.0).contains(&percent) {
            Ok(())
        } else {
            Err(RequestError::FreeAllowanceOutOfRange(percent))
        }
    }

    fn required(field: &'static str, value: Option<f64>) -> Result<f64, RequestError> {
        Self::non_negative(field, value.ok_or(RequestError::Missing(field))?)
    }

    fn non_negative(field: &'static str, value: f64) -> Result<f64, RequestError> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(RequestError::NotNonNegative { field, value })
        }
    }
}
