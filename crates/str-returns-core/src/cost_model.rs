use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calculator::MAX_AMOUNT;
use crate::error::StrReturnsError;
use crate::types::{Money, Rate};
use crate::StrReturnsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed cost and financing assumptions applied to every simulation.
///
/// The defaults describe the current Swiss short-term-rental regime. A cost
/// model is immutable once built; alternate regimes (a different mortgage
/// rate, no tourist tax) are separate values rather than edits to globals.
///
/// Loadable from TOML; any key left out keeps its default:
///
/// ```toml
/// mortgage_rate = "0.021"
/// tourist_tax_per_night = "4.2"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Annual mortgage interest rate (interest-only, never amortised)
    pub mortgage_rate: Rate,
    /// Booking-platform commission as a share of gross income
    pub platform_commission_rate: Rate,
    /// Cost of one cleaning
    pub cleaning_fee: Money,
    /// Occupied nights covered by one cleaning
    pub nights_per_cleaning: Decimal,
    /// Utilities, internet, insurance and similar annual services
    pub annual_services: Money,
    /// Annual maintenance allowance
    pub annual_maintenance: Money,
    /// Tourist tax per occupied night. `None` removes the cost line entirely.
    pub tourist_tax_per_night: Option<Money>,
    /// Rentable days when the apartment is let all year
    pub full_year_days: u32,
    /// Rentable days when the apartment is let for the season only
    pub seasonal_days: u32,
    /// Years covered by the IRR cash-flow series and break-even series
    pub horizon_years: u32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            mortgage_rate: dec!(0.019),
            platform_commission_rate: dec!(0.13),
            cleaning_fee: dec!(80),
            nights_per_cleaning: dec!(4),
            annual_services: dec!(2500),
            annual_maintenance: dec!(1500),
            tourist_tax_per_night: Some(dec!(3.5)),
            full_year_days: 365,
            seasonal_days: 200,
            horizon_years: 20,
        }
    }
}

impl CostModel {
    /// The default regime with the tourist-tax cost line removed.
    pub fn without_tourist_tax() -> Self {
        Self {
            tourist_tax_per_night: None,
            ..Self::default()
        }
    }

    /// Parse a cost model from TOML text and validate it.
    pub fn from_toml_str(contents: &str) -> StrReturnsResult<Self> {
        let model: CostModel = toml::from_str(contents)?;
        model.validate()?;
        Ok(model)
    }

    /// Load a cost model from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> StrReturnsResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            StrReturnsError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Rentable days for the selected letting period.
    pub fn occupiable_days(&self, rented_all_year: bool) -> u32 {
        if rented_all_year {
            self.full_year_days
        } else {
            self.seasonal_days
        }
    }

    pub fn validate(&self) -> StrReturnsResult<()> {
        for (field, rate) in [
            ("mortgage_rate", self.mortgage_rate),
            ("platform_commission_rate", self.platform_commission_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(StrReturnsError::InvalidInput {
                    field: field.into(),
                    reason: "Rate must be between 0 and 1".into(),
                });
            }
        }

        for (field, amount) in [
            ("cleaning_fee", self.cleaning_fee),
            ("annual_services", self.annual_services),
            ("annual_maintenance", self.annual_maintenance),
            (
                "tourist_tax_per_night",
                self.tourist_tax_per_night.unwrap_or(Decimal::ZERO),
            ),
        ] {
            if amount < Decimal::ZERO {
                return Err(StrReturnsError::InvalidInput {
                    field: field.into(),
                    reason: "Amount cannot be negative".into(),
                });
            }
            if amount > MAX_AMOUNT {
                return Err(StrReturnsError::InvalidInput {
                    field: field.into(),
                    reason: format!("Amount cannot exceed CHF {MAX_AMOUNT}"),
                });
            }
        }

        if self.nights_per_cleaning <= Decimal::ZERO {
            return Err(StrReturnsError::InvalidInput {
                field: "nights_per_cleaning".into(),
                reason: "Nights per cleaning must be positive".into(),
            });
        }

        for (field, days) in [
            ("full_year_days", self.full_year_days),
            ("seasonal_days", self.seasonal_days),
        ] {
            if !(1..=366).contains(&days) {
                return Err(StrReturnsError::InvalidInput {
                    field: field.into(),
                    reason: "Days must be between 1 and 366".into(),
                });
            }
        }

        if !(1..=100).contains(&self.horizon_years) {
            return Err(StrReturnsError::InvalidInput {
                field: "horizon_years".into(),
                reason: "Horizon must be between 1 and 100 years".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_regime() {
        let m = CostModel::default();
        assert_eq!(m.mortgage_rate, dec!(0.019));
        assert_eq!(m.platform_commission_rate, dec!(0.13));
        assert_eq!(m.tourist_tax_per_night, Some(dec!(3.5)));
        assert_eq!(m.horizon_years, 20);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_without_tourist_tax() {
        let m = CostModel::without_tourist_tax();
        assert_eq!(m.tourist_tax_per_night, None);
        assert_eq!(m.annual_services, dec!(2500));
    }

    #[test]
    fn test_occupiable_days() {
        let m = CostModel::default();
        assert_eq!(m.occupiable_days(true), 365);
        assert_eq!(m.occupiable_days(false), 200);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let m = CostModel::from_toml_str("mortgage_rate = \"0.025\"\nannual_services = \"3000\"\n")
            .unwrap();
        assert_eq!(
            m,
            CostModel {
                mortgage_rate: dec!(0.025),
                annual_services: dec!(3000),
                ..CostModel::default()
            }
        );
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(CostModel::from_toml_str("").unwrap(), CostModel::default());
    }

    #[test]
    fn test_toml_rejects_negative_fee() {
        let err = CostModel::from_toml_str("cleaning_fee = \"-10\"\n").unwrap_err();
        assert!(matches!(err, StrReturnsError::InvalidInput { ref field, .. } if field == "cleaning_fee"));
    }

    #[test]
    fn test_toml_rejects_oversized_fee() {
        let err = CostModel::from_toml_str("annual_services = \"100000000000000000000\"\n").unwrap_err();
        assert!(matches!(err, StrReturnsError::InvalidInput { ref field, .. } if field == "annual_services"));
    }

    #[test]
    fn test_toml_rejects_zero_nights_per_cleaning() {
        let err = CostModel::from_toml_str("nights_per_cleaning = \"0\"\n").unwrap_err();
        assert!(matches!(err, StrReturnsError::InvalidInput { .. }));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = CostModel::from_toml_str("mortgage_rate = [").unwrap_err();
        assert!(matches!(err, StrReturnsError::Config(_)));
    }
}
