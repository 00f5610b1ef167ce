use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use str_returns_core::calculator::InvestmentInputs;
use str_returns_core::sensitivity::{self, SensitivityInput, SensitivityMetric, Sweep};
use str_returns_core::CostModel;

use crate::input;

/// Arguments for the occupancy x nightly-rate sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON sensitivity input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Occupancy sweep in percent as min:max:step
    #[arg(long, default_value = "40:90:10")]
    pub occupancy: String,

    /// Nightly-rate sweep in CHF as min:max:step
    #[arg(long, default_value = "200:360:40")]
    pub nightly_rate: String,

    /// Metric per cell: roi-pct, net-profit, gross-yield-pct, irr
    #[arg(long, default_value = "roi-pct")]
    pub metric: String,

    /// Path to JSON investment inputs for the base case
    #[arg(long)]
    pub base_inputs: Option<String>,

    /// TOML file overriding the default cost model
    #[arg(long)]
    pub cost_model: Option<String>,
}

fn parse_sweep(spec: &str) -> Result<Sweep, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Sweep must be min:max:step, got '{}'", spec).into());
    }
    Ok(Sweep {
        min: parts[0].trim().parse::<Decimal>()?,
        max: parts[1].trim().parse::<Decimal>()?,
        step: parts[2].trim().parse::<Decimal>()?,
    })
}

fn parse_metric(name: &str) -> Result<SensitivityMetric, Box<dyn std::error::Error>> {
    match name.to_lowercase().replace('_', "-").as_str() {
        "roi-pct" | "roi" => Ok(SensitivityMetric::RoiPct),
        "net-profit" => Ok(SensitivityMetric::NetProfit),
        "gross-yield-pct" | "gross-yield" => Ok(SensitivityMetric::GrossYieldPct),
        "irr" => Ok(SensitivityMetric::Irr),
        other => Err(format!(
            "Unknown metric '{}'. Available metrics: roi-pct, net-profit, gross-yield-pct, irr",
            other
        )
        .into()),
    }
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: SensitivityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        let base_inputs: InvestmentInputs = match args.base_inputs {
            Some(ref path) => input::file::read_json(path)?,
            None => InvestmentInputs::default(),
        };
        let cost_model = match args.cost_model {
            Some(ref path) => CostModel::load(path)?,
            None => CostModel::default(),
        };

        SensitivityInput {
            base_inputs,
            cost_model,
            occupancy_pct: parse_sweep(&args.occupancy)?,
            nightly_rate: parse_sweep(&args.nightly_rate)?,
            metric: parse_metric(&args.metric)?,
        }
    };

    let result = sensitivity::occupancy_rate_grid(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}
