use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use str_returns_core::calculator::{self, InvestmentInputs, SimulationRequest};
use str_returns_core::eligibility::{Location, ResidencePermit, Zone};
use str_returns_core::listing;
use str_returns_core::CostModel;

use crate::input;

/// Arguments for a return simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON simulation request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Recognised listing text used to pre-fill the price
    #[arg(long, conflicts_with = "input")]
    pub listing: Option<String>,

    /// TOML file overriding the default cost model
    #[arg(long)]
    pub cost_model: Option<String>,

    /// Leave tourist tax out of the operating costs
    #[arg(long)]
    pub no_tourist_tax: bool,

    /// Purchase price in CHF [default: 600000, or the listing price]
    #[arg(long, conflicts_with = "input")]
    pub property_price: Option<Decimal>,

    /// Own funds as a percentage of the price [default: 20]
    #[arg(long, conflicts_with = "input")]
    pub down_payment_pct: Option<Decimal>,

    /// Average nightly rate in CHF [default: 280]
    #[arg(long, conflicts_with = "input")]
    pub nightly_rate: Option<Decimal>,

    /// Average occupancy in percent [default: 65]
    #[arg(long, conflicts_with = "input")]
    pub occupancy_pct: Option<Decimal>,

    /// Let for the season only (200 days) instead of all year
    #[arg(long, conflicts_with = "input")]
    pub seasonal: bool,

    /// Guest capacity: 2, 4 or 6 [default: 4]
    #[arg(long, conflicts_with = "input")]
    pub capacity: Option<u32>,

    /// Buyer residence permit: B, C or Swiss (requires --zone)
    #[arg(long, conflicts_with = "input")]
    pub permit: Option<String>,

    /// Apartment location, e.g. Interlaken (requires --permit)
    #[arg(long, conflicts_with = "input")]
    pub zone: Option<String>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = build_request(&args)?;
    let result = calculator::simulate(&request)?;
    Ok(serde_json::to_value(result)?)
}

/// The break-even series as rows, with the equity marker alongside.
pub fn run_breakeven(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = build_request(&args)?;
    let output = calculator::simulate(&request)?;
    let r = output.result;

    Ok(json!({
        "initial_equity": r.initial_equity,
        "payback_year": r.payback_year,
        "results": r.break_even_series,
        "warnings": output.warnings,
    }))
}

fn build_request(args: &SimulateArgs) -> Result<SimulationRequest, Box<dyn std::error::Error>> {
    let mut request: SimulationRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        reject_inline_inputs(args)?;
        serde_json::from_value(data)?
    } else {
        SimulationRequest {
            inputs: inputs_from_flags(args)?,
            cost_model: CostModel::default(),
            location: location_from_flags(args)?,
        }
    };

    if let Some(ref path) = args.cost_model {
        request.cost_model = CostModel::load(path)?;
    }
    if args.no_tourist_tax {
        request.cost_model.tourist_tax_per_night = None;
    }

    Ok(request)
}

/// Flags that describe the request itself, as opposed to cost-model
/// overrides which apply on top of any request source.
fn inline_inputs(args: &SimulateArgs) -> Vec<&'static str> {
    let mut given = Vec::new();
    if args.listing.is_some() {
        given.push("--listing");
    }
    if args.property_price.is_some() {
        given.push("--property-price");
    }
    if args.down_payment_pct.is_some() {
        given.push("--down-payment-pct");
    }
    if args.nightly_rate.is_some() {
        given.push("--nightly-rate");
    }
    if args.occupancy_pct.is_some() {
        given.push("--occupancy-pct");
    }
    if args.seasonal {
        given.push("--seasonal");
    }
    if args.capacity.is_some() {
        given.push("--capacity");
    }
    if args.permit.is_some() {
        given.push("--permit");
    }
    if args.zone.is_some() {
        given.push("--zone");
    }
    given
}

fn reject_inline_inputs(args: &SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let given = inline_inputs(args);
    if given.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} cannot be combined with a JSON request on stdin",
            given.join(", ")
        )
        .into())
    }
}

fn inputs_from_flags(args: &SimulateArgs) -> Result<InvestmentInputs, Box<dyn std::error::Error>> {
    let mut inputs = InvestmentInputs::default();

    if let Some(ref path) = args.listing {
        let text = input::file::read_text(path)?;
        inputs = listing::extract_fields(&text).seed_inputs(inputs);
    }

    if let Some(price) = args.property_price {
        inputs.property_price = price;
    }
    if let Some(pct) = args.down_payment_pct {
        inputs.down_payment_pct = pct;
    }
    if let Some(rate) = args.nightly_rate {
        inputs.nightly_rate = rate;
    }
    if let Some(pct) = args.occupancy_pct {
        inputs.occupancy_pct = pct;
    }
    if args.seasonal {
        inputs.rented_all_year = false;
    }
    if let Some(capacity) = args.capacity {
        inputs.capacity = capacity;
    }

    Ok(inputs)
}

fn location_from_flags(args: &SimulateArgs) -> Result<Option<Location>, Box<dyn std::error::Error>> {
    match (&args.permit, &args.zone) {
        (Some(permit), Some(zone)) => Ok(Some(Location {
            permit: permit.parse::<ResidencePermit>()?,
            zone: zone.parse::<Zone>()?,
        })),
        (None, None) => Ok(None),
        _ => Err("--permit and --zone must be given together".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SimulateArgs,
    }

    fn parse(argv: &[&str]) -> Result<SimulateArgs, clap::Error> {
        TestCli::try_parse_from(std::iter::once("strr").chain(argv.iter().copied()))
            .map(|cli| cli.args)
    }

    #[test]
    fn test_input_file_conflicts_with_value_flags() {
        for flag in [
            vec!["--nightly-rate", "300"],
            vec!["--listing", "listing.txt"],
            vec!["--permit", "B"],
            vec!["--seasonal"],
        ] {
            let mut argv = vec!["--input", "request.json"];
            argv.extend(flag.iter().copied());
            let err = parse(&argv).err().expect("flags should conflict with --input");
            assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn test_input_file_allows_cost_model_overrides() {
        let args = parse(&["--input", "request.json", "--no-tourist-tax"]).unwrap();
        assert!(args.no_tourist_tax);
    }

    #[test]
    fn test_stdin_request_rejects_inline_inputs() {
        let args = parse(&["--occupancy-pct", "70", "--zone", "Zermatt", "--permit", "C"]).unwrap();
        let err = reject_inline_inputs(&args).unwrap_err().to_string();
        assert!(err.contains("--occupancy-pct"));
        assert!(err.contains("--zone"));

        let args = parse(&["--cost-model", "regime.toml"]).unwrap();
        assert!(reject_inline_inputs(&args).is_ok());
    }
}
