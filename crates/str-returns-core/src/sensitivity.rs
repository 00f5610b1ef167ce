use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calculator::{calculate, InvestmentInputs, SimulationResult};
use crate::cost_model::CostModel;
use crate::error::StrReturnsError;
use crate::types::*;
use crate::StrReturnsResult;

/// Upper bound on sweep points per axis.
const MAX_SWEEP_POINTS: usize = 500;

/// Inclusive sweep from `min` to `max` in increments of `step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sweep {
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Metric reported in each cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    RoiPct,
    NetProfit,
    GrossYieldPct,
    Irr,
}

impl SensitivityMetric {
    fn read(&self, result: &SimulationResult) -> Option<Decimal> {
        match self {
            SensitivityMetric::RoiPct => Some(result.roi_pct),
            SensitivityMetric::NetProfit => Some(result.net_profit_after_financing),
            SensitivityMetric::GrossYieldPct => Some(result.gross_yield_pct),
            SensitivityMetric::Irr => result.internal_rate_of_return.rate(),
        }
    }
}

/// Input for an occupancy x nightly-rate sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    /// Base case; occupancy and nightly rate are overridden per cell
    #[serde(default)]
    pub base_inputs: InvestmentInputs,
    #[serde(default)]
    pub cost_model: CostModel,
    /// Occupancy sweep in percent (rows)
    pub occupancy_pct: Sweep,
    /// Nightly rate sweep in CHF (columns)
    pub nightly_rate: Sweep,
    pub metric: SensitivityMetric,
}

/// Output of the sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub occupancy_values: Vec<Decimal>,
    pub nightly_rate_values: Vec<Decimal>,
    pub metric: SensitivityMetric,
    /// Matrix[i][j] = metric at occupancy_values[i], nightly_rate_values[j].
    /// `None` where the metric is undefined (IRR not computable).
    pub matrix: Vec<Vec<Option<Decimal>>>,
    /// Metric at the base-case inputs
    pub base_case_value: Option<Decimal>,
    /// Cell closest to the base case (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values from min to max with step, always including max.
fn generate_sweep_values(field: &str, sweep: &Sweep) -> StrReturnsResult<Vec<Decimal>> {
    if sweep.step <= Decimal::ZERO {
        return Err(StrReturnsError::InvalidInput {
            field: field.into(),
            reason: "Step must be positive".into(),
        });
    }
    if sweep.min > sweep.max {
        return Err(StrReturnsError::InvalidInput {
            field: field.into(),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = sweep.min;
    while current <= sweep.max {
        if values.len() == MAX_SWEEP_POINTS {
            return Err(StrReturnsError::InvalidInput {
                field: field.into(),
                reason: format!("Sweep produces more than {MAX_SWEEP_POINTS} points"),
            });
        }
        values.push(current);
        current += sweep.step;
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < sweep.max {
            values.push(sweep.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate the chosen metric over every occupancy / nightly-rate pair.
///
/// Cells whose inputs fail validation are left empty and reported in the
/// warnings; the base case itself must be valid.
pub fn occupancy_rate_grid(
    input: &SensitivityInput,
) -> StrReturnsResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let occupancy_values = generate_sweep_values("occupancy_pct", &input.occupancy_pct)?;
    let rate_values = generate_sweep_values("nightly_rate", &input.nightly_rate)?;

    let base = calculate(&input.base_inputs, &input.cost_model)?;
    let base_case_value = input.metric.read(&base);

    let mut matrix = Vec::with_capacity(occupancy_values.len());
    for occupancy in &occupancy_values {
        let mut row = Vec::with_capacity(rate_values.len());
        for rate in &rate_values {
            let cell_inputs = InvestmentInputs {
                occupancy_pct: *occupancy,
                nightly_rate: *rate,
                ..input.base_inputs.clone()
            };
            match calculate(&cell_inputs, &input.cost_model) {
                Ok(result) => row.push(input.metric.read(&result)),
                Err(e) => {
                    warnings.push(format!(
                        "Evaluation failed at ({occupancy}%, CHF {rate}): {e}"
                    ));
                    row.push(None);
                }
            }
        }
        matrix.push(row);
    }

    let base_row = closest_index(&occupancy_values, input.base_inputs.occupancy_pct);
    let base_col = closest_index(&rate_values, input.base_inputs.nightly_rate);

    let output = SensitivityOutput {
        occupancy_values,
        nightly_rate_values: rate_values,
        metric: input.metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity: occupancy x nightly rate",
        &serde_json::json!({
            "metric": input.metric,
            "base_occupancy_pct": input.base_inputs.occupancy_pct.to_string(),
            "base_nightly_rate": input.base_inputs.nightly_rate.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn grid_input(metric: SensitivityMetric) -> SensitivityInput {
        SensitivityInput {
            base_inputs: InvestmentInputs::default(),
            cost_model: CostModel::default(),
            occupancy_pct: Sweep { min: dec!(40), max: dec!(80), step: dec!(10) },
            nightly_rate: Sweep { min: dec!(200), max: dec!(350), step: dec!(50) },
            metric,
        }
    }

    #[test]
    fn test_grid_shape_and_base_case() {
        let out = occupancy_rate_grid(&grid_input(SensitivityMetric::RoiPct)).unwrap();
        let g = &out.result;
        assert_eq!(g.occupancy_values.len(), 5);
        assert_eq!(g.nightly_rate_values, vec![dec!(200), dec!(250), dec!(300), dec!(350)]);
        assert_eq!(g.matrix.len(), 5);
        assert!(g.matrix.iter().all(|r| r.len() == 4));
        // base 65% / CHF 280 -> closest cell 60% (ties keep the first) / CHF 300
        assert_eq!(g.base_case_position, (2, 2));
        assert!(g.base_case_value.unwrap() > dec!(32));
    }

    #[test]
    fn test_roi_increases_with_occupancy_and_rate() {
        let out = occupancy_rate_grid(&grid_input(SensitivityMetric::NetProfit)).unwrap();
        let m = &out.result.matrix;
        for i in 1..m.len() {
            assert!(m[i][0].unwrap() > m[i - 1][0].unwrap());
        }
        for j in 1..m[0].len() {
            assert!(m[0][j].unwrap() > m[0][j - 1].unwrap());
        }
    }

    #[test]
    fn test_sweep_includes_max() {
        let values = generate_sweep_values(
            "x",
            &Sweep { min: dec!(0), max: dec!(25), step: dec!(10) },
        )
        .unwrap();
        assert_eq!(values, vec![dec!(0), dec!(10), dec!(20), dec!(25)]);
    }

    #[test]
    fn test_invalid_sweeps() {
        let bad_step = Sweep { min: dec!(0), max: dec!(1), step: dec!(0) };
        assert!(generate_sweep_values("x", &bad_step).is_err());
        let inverted = Sweep { min: dec!(5), max: dec!(1), step: dec!(1) };
        assert!(generate_sweep_values("x", &inverted).is_err());
        let huge = Sweep { min: dec!(0), max: dec!(100000), step: dec!(1) };
        assert!(generate_sweep_values("x", &huge).is_err());
    }

    #[test]
    fn test_out_of_range_cells_are_empty() {
        let mut input = grid_input(SensitivityMetric::RoiPct);
        input.occupancy_pct = Sweep { min: dec!(90), max: dec!(110), step: dec!(10) };
        let out = occupancy_rate_grid(&input).unwrap();
        assert!(out.result.matrix[2].iter().all(|c| c.is_none()));
        assert_eq!(out.warnings.len(), 4);
    }
}
