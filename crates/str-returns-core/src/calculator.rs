use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::cost_model::CostModel;
use crate::eligibility::{check_zone, Location};
use crate::error::StrReturnsError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::StrReturnsResult;

/// ROI below this level triggers a low-return advisory.
const LOW_ROI_THRESHOLD_PCT: Percent = dec!(5);

/// Starting guess handed to the IRR solver.
const IRR_GUESS: Rate = dec!(0.10);

/// Apartment sizes offered on the input form (guests).
pub const CAPACITY_OPTIONS: [u32; 3] = [2, 4, 6];

/// Largest price or nightly rate accepted (CHF). Keeps every derived
/// amount well inside the Decimal range.
pub const MAX_AMOUNT: Money = dec!(1000000000000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// User-supplied parameters for one simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentInputs {
    /// Purchase price of the apartment (CHF)
    pub property_price: Money,
    /// Own funds as a percentage of the price (20 = 20%)
    pub down_payment_pct: Percent,
    /// Average nightly rate charged to guests (CHF)
    pub nightly_rate: Money,
    /// Average occupancy of the rentable days (65 = 65%)
    pub occupancy_pct: Percent,
    /// Let all year (365 days) or for the season only (200 days)
    pub rented_all_year: bool,
    /// Guest capacity. Informational; not used by the formulas.
    pub capacity: u32,
}

impl Default for InvestmentInputs {
    /// The values the input form starts with.
    fn default() -> Self {
        Self {
            property_price: dec!(600000),
            down_payment_pct: dec!(20),
            nightly_rate: dec!(280),
            occupancy_pct: dec!(65),
            rented_all_year: true,
            capacity: 4,
        }
    }
}

/// A simulation request as handed over by the input-collection surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(flatten)]
    pub inputs: InvestmentInputs,
    /// Cost regime; the current defaults when omitted
    #[serde(default)]
    pub cost_model: CostModel,
    /// Buyer permit and apartment zone, checked for purchase eligibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Annual operating cost lines (mortgage interest excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingCosts {
    pub cleaning: Money,
    pub commission: Money,
    pub services: Money,
    /// Absent when the cost model does not levy tourist tax
    pub tourist_tax: Option<Money>,
    pub maintenance: Money,
    pub total: Money,
}

impl OperatingCosts {
    /// Named cost lines in display order, skipping lines that are not modelled.
    pub fn lines(&self) -> Vec<(&'static str, Money)> {
        let mut lines = vec![
            ("cleaning", self.cleaning),
            ("commission", self.commission),
            ("services", self.services),
        ];
        if let Some(tax) = self.tourist_tax {
            lines.push(("tourist_tax", tax));
        }
        lines.push(("maintenance", self.maintenance));
        lines
    }
}

/// Internal rate of return of the flat 20-year cash-flow series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrEstimate {
    Computed { rate: Rate },
    NotComputable { reason: String },
}

impl IrrEstimate {
    pub fn rate(&self) -> Option<Rate> {
        match self {
            IrrEstimate::Computed { rate } => Some(*rate),
            IrrEstimate::NotComputable { .. } => None,
        }
    }

    pub fn is_computable(&self) -> bool {
        matches!(self, IrrEstimate::Computed { .. })
    }
}

/// One year of the cumulative break-even trajectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEvenYear {
    /// 1-based year index
    pub year: u32,
    pub cumulative_profit: Money,
    pub cumulative_cost: Money,
}

/// Derived metrics for one set of inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Rentable days for the selected letting period
    pub occupied_days: u32,
    pub occupied_nights: u32,
    pub gross_income: Money,
    pub costs: OperatingCosts,
    pub mortgage_principal: Money,
    pub annual_mortgage_interest: Money,
    pub net_profit_after_financing: Money,
    pub initial_equity: Money,
    pub roi_pct: Percent,
    pub gross_yield_pct: Percent,
    /// Annual cash flow over cash invested. With no amortisation and no
    /// taxes this equals `roi_pct`.
    pub cash_on_cash_pct: Percent,
    pub internal_rate_of_return: IrrEstimate,
    /// First year in which cumulative profit covers the initial equity
    pub payback_year: Option<u32>,
    pub break_even_series: Vec<BreakEvenYear>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a full simulation: validate, compute and attach advisories.
///
/// Returns a `ComputationOutput<SimulationResult>` whose warnings flag low
/// returns, a missing payback within the horizon, a non-computable IRR and,
/// when a location is given, a purchase the buyer's permit does not allow.
pub fn simulate(
    request: &SimulationRequest,
) -> StrReturnsResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = calculate(&request.inputs, &request.cost_model)?;

    if let Some(ref location) = request.location {
        let eligibility = check_zone(location.permit, &location.zone);
        if let Some(reason) = eligibility.reason {
            warnings.push(reason);
        }
    }

    if result.roi_pct < LOW_ROI_THRESHOLD_PCT {
        warnings.push(format!(
            "ROI of {:.1}% is below {}%; this project may have a low return, consider adjusting prices or reducing costs",
            result.roi_pct, LOW_ROI_THRESHOLD_PCT
        ));
    }

    if let IrrEstimate::NotComputable { ref reason } = result.internal_rate_of_return {
        warnings.push(format!("IRR not computable: {reason}"));
    }

    if result.payback_year.is_none() {
        warnings.push(format!(
            "Initial equity of CHF {:.0} is not recovered within {} years",
            result.initial_equity, request.cost_model.horizon_years
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Short-term rental return (interest-only financing, flat annual profit)",
        request,
        warnings,
        elapsed,
        result,
    ))
}

/// Validate `inputs` and `cost_model`, then derive every metric.
pub fn calculate(
    inputs: &InvestmentInputs,
    cost_model: &CostModel,
) -> StrReturnsResult<SimulationResult> {
    validate_inputs(inputs)?;
    cost_model.validate()?;
    compute(inputs, cost_model)
}

/// Range checks for a simulation. A down payment that leaves no equity is
/// reported separately as `DegenerateEquity` since every equity-based metric
/// divides by it.
pub fn validate_inputs(inputs: &InvestmentInputs) -> StrReturnsResult<()> {
    if inputs.property_price <= Decimal::ZERO {
        return Err(StrReturnsError::InvalidInput {
            field: "property_price".into(),
            reason: "Property price must be positive".into(),
        });
    }
    if inputs.property_price > MAX_AMOUNT {
        return Err(StrReturnsError::InvalidInput {
            field: "property_price".into(),
            reason: format!("Property price cannot exceed CHF {MAX_AMOUNT}"),
        });
    }

    if inputs.down_payment_pct.is_zero() {
        return Err(StrReturnsError::DegenerateEquity);
    }
    if inputs.down_payment_pct < Decimal::ZERO || inputs.down_payment_pct > dec!(100) {
        return Err(StrReturnsError::InvalidInput {
            field: "down_payment_pct".into(),
            reason: "Down payment must be greater than 0% and at most 100%".into(),
        });
    }
    // A down payment can be positive and still round to no equity at all.
    if (inputs.property_price * (inputs.down_payment_pct / dec!(100))).is_zero() {
        return Err(StrReturnsError::DegenerateEquity);
    }

    if inputs.nightly_rate <= Decimal::ZERO {
        return Err(StrReturnsError::InvalidInput {
            field: "nightly_rate".into(),
            reason: "Nightly rate must be positive".into(),
        });
    }
    if inputs.nightly_rate > MAX_AMOUNT {
        return Err(StrReturnsError::InvalidInput {
            field: "nightly_rate".into(),
            reason: format!("Nightly rate cannot exceed CHF {MAX_AMOUNT}"),
        });
    }

    if inputs.occupancy_pct < Decimal::ZERO || inputs.occupancy_pct > dec!(100) {
        return Err(StrReturnsError::InvalidInput {
            field: "occupancy_pct".into(),
            reason: "Occupancy must be between 0% and 100%".into(),
        });
    }

    if !CAPACITY_OPTIONS.contains(&inputs.capacity) {
        return Err(StrReturnsError::InvalidInput {
            field: "capacity".into(),
            reason: format!("Capacity must be one of {:?}", CAPACITY_OPTIONS),
        });
    }

    Ok(())
}

/// Nights sold per year: occupancy share of the rentable days, truncated.
pub fn occupied_nights(occupancy_pct: Percent, occupied_days: u32) -> u32 {
    let nights = (occupancy_pct * Decimal::from(occupied_days) / dec!(100)).floor();
    // Occupancy is validated to 0..=100, so nights never exceed the day count.
    nights.to_u32().unwrap_or(0).min(occupied_days)
}

/// Operating cost lines for a given number of occupied nights.
pub fn operating_costs(
    occupied_nights: u32,
    gross_income: Money,
    cost_model: &CostModel,
) -> StrReturnsResult<OperatingCosts> {
    let nights = Decimal::from(occupied_nights);

    let cleaning = nights
        .checked_mul(cost_model.cleaning_fee)
        .and_then(|c| c.checked_div(cost_model.nights_per_cleaning))
        .ok_or_else(|| out_of_range("cleaning_fee"))?;
    let commission = gross_income
        .checked_mul(cost_model.platform_commission_rate)
        .ok_or_else(|| out_of_range("platform_commission_rate"))?;
    let services = cost_model.annual_services;
    let tourist_tax = cost_model
        .tourist_tax_per_night
        .map(|per_night| {
            nights
                .checked_mul(per_night)
                .ok_or_else(|| out_of_range("tourist_tax_per_night"))
        })
        .transpose()?;
    let maintenance = cost_model.annual_maintenance;

    let total = [commission, services, tourist_tax.unwrap_or(Decimal::ZERO), maintenance]
        .into_iter()
        .try_fold(cleaning, |acc, line| acc.checked_add(line))
        .ok_or_else(|| out_of_range("operating_costs"))?;

    Ok(OperatingCosts {
        cleaning,
        commission,
        services,
        tourist_tax,
        maintenance,
        total,
    })
}

/// Cumulative profit and cost for each year of the horizon.
pub fn break_even_series(
    annual_profit: Money,
    annual_cost: Money,
    horizon_years: u32,
) -> StrReturnsResult<Vec<BreakEvenYear>> {
    let mut series = Vec::with_capacity(horizon_years as usize);
    let mut cumulative_profit = Decimal::ZERO;
    let mut cumulative_cost = Decimal::ZERO;

    for year in 1..=horizon_years {
        cumulative_profit = cumulative_profit
            .checked_add(annual_profit)
            .ok_or_else(|| out_of_range("break_even_series"))?;
        cumulative_cost = cumulative_cost
            .checked_add(annual_cost)
            .ok_or_else(|| out_of_range("break_even_series"))?;
        series.push(BreakEvenYear {
            year,
            cumulative_profit,
            cumulative_cost,
        });
    }

    Ok(series)
}

/// First year whose cumulative profit reaches `initial_equity`.
pub fn payback_year(series: &[BreakEvenYear], initial_equity: Money) -> Option<u32> {
    series
        .iter()
        .find(|y| y.cumulative_profit >= initial_equity)
        .map(|y| y.year)
}

/// IRR of `-initial_equity` followed by `horizon_years` flat profits.
pub fn estimate_irr(initial_equity: Money, annual_profit: Money, horizon_years: u32) -> IrrEstimate {
    if annual_profit <= Decimal::ZERO {
        return IrrEstimate::NotComputable {
            reason: "net profit after financing is not positive, so the cash flows never turn positive".into(),
        };
    }

    let flows = time_value::flat_cash_flows(initial_equity, annual_profit, horizon_years);
    match time_value::irr(&flows, IRR_GUESS) {
        Ok(rate) => IrrEstimate::Computed { rate },
        Err(e) => IrrEstimate::NotComputable {
            reason: e.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Derive every metric. Callers must have validated the inputs: the equity
/// divisions assume a down payment that leaves some equity.
fn compute(inputs: &InvestmentInputs, cost_model: &CostModel) -> StrReturnsResult<SimulationResult> {
    let occupied_days = cost_model.occupiable_days(inputs.rented_all_year);
    let occupied_nights = occupied_nights(inputs.occupancy_pct, occupied_days);
    let gross_income = inputs
        .nightly_rate
        .checked_mul(Decimal::from(occupied_nights))
        .ok_or_else(|| out_of_range("nightly_rate"))?;

    let costs = operating_costs(occupied_nights, gross_income, cost_model)?;

    let equity_share = inputs.down_payment_pct / dec!(100);
    let mortgage_principal = inputs.property_price * (Decimal::ONE - equity_share);
    let annual_mortgage_interest = mortgage_principal * cost_model.mortgage_rate;

    let net_profit_after_financing = gross_income
        .checked_sub(costs.total)
        .and_then(|n| n.checked_sub(annual_mortgage_interest))
        .ok_or_else(|| out_of_range("net_profit_after_financing"))?;
    let initial_equity = inputs.property_price * equity_share;
    if initial_equity.is_zero() {
        return Err(StrReturnsError::DegenerateEquity);
    }

    let roi_pct = net_profit_after_financing
        .checked_div(initial_equity)
        .and_then(|r| r.checked_mul(dec!(100)))
        .ok_or_else(|| out_of_range("down_payment_pct"))?;
    let gross_yield_pct = gross_income
        .checked_div(inputs.property_price)
        .and_then(|y| y.checked_mul(dec!(100)))
        .ok_or_else(|| out_of_range("property_price"))?;
    let cash_on_cash_pct = roi_pct;

    let internal_rate_of_return = estimate_irr(
        initial_equity,
        net_profit_after_financing,
        cost_model.horizon_years,
    );

    let annual_cost = costs
        .total
        .checked_add(annual_mortgage_interest)
        .ok_or_else(|| out_of_range("operating_costs"))?;
    let break_even_series = break_even_series(
        net_profit_after_financing,
        annual_cost,
        cost_model.horizon_years,
    )?;
    let payback_year = payback_year(&break_even_series, initial_equity);

    debug!(
        occupied_nights,
        %gross_income,
        total_operating_cost = %costs.total,
        %annual_mortgage_interest,
        %net_profit_after_financing,
        %roi_pct,
        ?payback_year,
        "simulation computed"
    );

    Ok(SimulationResult {
        occupied_days,
        occupied_nights,
        gross_income,
        costs,
        mortgage_principal,
        annual_mortgage_interest,
        net_profit_after_financing,
        initial_equity,
        roi_pct,
        gross_yield_pct,
        cash_on_cash_pct,
        internal_rate_of_return,
        payback_year,
        break_even_series,
    })
}

/// A derived amount left the Decimal range; blamed on the input that drives it.
fn out_of_range(field: &str) -> StrReturnsError {
    StrReturnsError::InvalidInput {
        field: field.into(),
        reason: "Value is too large or too small to compute a result".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_scenario_intermediates() {
        let result = calculate(&InvestmentInputs::default(), &CostModel::default()).unwrap();
        assert_eq!(result.occupied_days, 365);
        assert_eq!(result.occupied_nights, 237);
        assert_eq!(result.gross_income, dec!(66360));
        assert_eq!(result.costs.cleaning, dec!(4740));
        assert_eq!(result.costs.commission, dec!(8626.8));
        assert_eq!(result.costs.tourist_tax, Some(dec!(829.5)));
        assert_eq!(result.costs.total, dec!(18196.3));
        assert_eq!(result.mortgage_principal, dec!(480000));
        assert_eq!(result.annual_mortgage_interest, dec!(9120));
        assert_eq!(result.initial_equity, dec!(120000));
        assert_eq!(result.net_profit_after_financing, dec!(39043.7));
    }

    #[test]
    fn test_seasonal_letting_uses_200_days() {
        let inputs = InvestmentInputs {
            rented_all_year: false,
            ..InvestmentInputs::default()
        };
        let result = calculate(&inputs, &CostModel::default()).unwrap();
        assert_eq!(result.occupied_days, 200);
        assert_eq!(result.occupied_nights, 130);
    }

    #[test]
    fn test_occupied_nights_truncates() {
        // 33% of 365 = 120.45
        assert_eq!(occupied_nights(dec!(33), 365), 120);
        // 99.9% of 200 = 199.8
        assert_eq!(occupied_nights(dec!(99.9), 200), 199);
        assert_eq!(occupied_nights(dec!(100), 365), 365);
        assert_eq!(occupied_nights(dec!(0), 365), 0);
    }

    #[test]
    fn test_cost_lines_without_tourist_tax() {
        let costs = operating_costs(237, dec!(66360), &CostModel::without_tourist_tax()).unwrap();
        assert_eq!(costs.tourist_tax, None);
        assert_eq!(costs.total, dec!(17366.8));
        let names: Vec<&str> = costs.lines().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["cleaning", "commission", "services", "maintenance"]);
    }

    #[test]
    fn test_cost_lines_with_tourist_tax() {
        let costs = operating_costs(10, dec!(2800), &CostModel::default()).unwrap();
        assert_eq!(costs.lines().len(), 5);
        assert_eq!(costs.lines()[3], ("tourist_tax", dec!(35)));
    }

    #[test]
    fn test_break_even_series_accumulates() {
        let series = break_even_series(dec!(100), dec!(40), 3).unwrap();
        assert_eq!(
            series,
            vec![
                BreakEvenYear { year: 1, cumulative_profit: dec!(100), cumulative_cost: dec!(40) },
                BreakEvenYear { year: 2, cumulative_profit: dec!(200), cumulative_cost: dec!(80) },
                BreakEvenYear { year: 3, cumulative_profit: dec!(300), cumulative_cost: dec!(120) },
            ]
        );
    }

    #[test]
    fn test_payback_year_is_first_reaching_year() {
        let series = break_even_series(dec!(100), dec!(0), 5).unwrap();
        assert_eq!(payback_year(&series, dec!(200)), Some(2));
        assert_eq!(payback_year(&series, dec!(201)), Some(3));
        assert_eq!(payback_year(&series, dec!(500)), Some(5));
        assert_eq!(payback_year(&series, dec!(501)), None);
    }

    #[test]
    fn test_payback_never_with_losses() {
        let series = break_even_series(dec!(-10), dec!(50), 20).unwrap();
        assert_eq!(payback_year(&series, dec!(1)), None);
    }

    #[test]
    fn test_irr_not_computable_for_zero_profit() {
        let irr = estimate_irr(dec!(1000), Decimal::ZERO, 20);
        assert!(!irr.is_computable());
        assert_eq!(irr.rate(), None);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let base = InvestmentInputs::default();
        let cases = vec![
            InvestmentInputs { property_price: dec!(0), ..base.clone() },
            InvestmentInputs { down_payment_pct: dec!(100.5), ..base.clone() },
            InvestmentInputs { down_payment_pct: dec!(-5), ..base.clone() },
            InvestmentInputs { nightly_rate: dec!(0), ..base.clone() },
            InvestmentInputs { occupancy_pct: dec!(101), ..base.clone() },
            InvestmentInputs { occupancy_pct: dec!(-1), ..base.clone() },
            InvestmentInputs { capacity: 3, ..base.clone() },
        ];
        for inputs in cases {
            assert!(
                matches!(validate_inputs(&inputs), Err(StrReturnsError::InvalidInput { .. })),
                "expected InvalidInput for {inputs:?}"
            );
        }
    }

    #[test]
    fn test_zero_down_payment_is_degenerate_equity() {
        let inputs = InvestmentInputs {
            down_payment_pct: Decimal::ZERO,
            ..InvestmentInputs::default()
        };
        assert!(matches!(
            calculate(&inputs, &CostModel::default()),
            Err(StrReturnsError::DegenerateEquity)
        ));
    }

    #[test]
    fn test_vanishing_down_payment_is_degenerate_equity() {
        let inputs = InvestmentInputs {
            down_payment_pct: dec!(0.0000000000000000000000000001),
            ..InvestmentInputs::default()
        };
        assert!(matches!(validate_inputs(&inputs), Err(StrReturnsError::DegenerateEquity)));
        assert!(matches!(
            calculate(&inputs, &CostModel::default()),
            Err(StrReturnsError::DegenerateEquity)
        ));
    }

    #[test]
    fn test_oversized_amounts_rejected() {
        let huge = dec!(1000000000000000000000000000);
        for inputs in [
            InvestmentInputs { nightly_rate: huge, ..InvestmentInputs::default() },
            InvestmentInputs { property_price: huge, ..InvestmentInputs::default() },
        ] {
            assert!(matches!(
                calculate(&inputs, &CostModel::default()),
                Err(StrReturnsError::InvalidInput { .. })
            ));
        }

        // At the cap every derived amount still fits.
        let capped = InvestmentInputs {
            property_price: MAX_AMOUNT,
            nightly_rate: MAX_AMOUNT,
            occupancy_pct: dec!(100),
            ..InvestmentInputs::default()
        };
        assert!(calculate(&capped, &CostModel::default()).is_ok());
    }

    #[test]
    fn test_overflowing_cost_line_is_an_error() {
        let model = CostModel {
            nights_per_cleaning: dec!(0.0000000000000000000000000001),
            ..CostModel::default()
        };
        let err = calculate(&InvestmentInputs::default(), &model).unwrap_err();
        assert!(matches!(err, StrReturnsError::InvalidInput { ref field, .. } if field == "cleaning_fee"));
    }

    #[test]
    fn test_simulate_low_roi_warning() {
        let request = SimulationRequest {
            inputs: InvestmentInputs {
                nightly_rate: dec!(120),
                occupancy_pct: dec!(40),
                ..InvestmentInputs::default()
            },
            ..SimulationRequest::default()
        };
        let output = simulate(&request).unwrap();
        assert!(output.result.roi_pct < dec!(5));
        assert!(output.warnings.iter().any(|w| w.contains("low return")));
    }

    #[test]
    fn test_simulate_reference_has_no_warnings() {
        let output = simulate(&SimulationRequest::default()).unwrap();
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    }
}
