use clap::Args;
use serde_json::{json, Value};

use str_returns_core::eligibility::{self, ResidencePermit, Zone};

/// Arguments for the permit zone lookup
#[derive(Args)]
pub struct ZonesArgs {
    /// Residence permit: B, C or Swiss
    #[arg(long)]
    pub permit: String,

    /// Check a single zone instead of listing the allowed ones
    #[arg(long)]
    pub zone: Option<String>,
}

pub fn run_zones(args: ZonesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let permit: ResidencePermit = args.permit.parse()?;

    if let Some(ref zone) = args.zone {
        let zone: Zone = zone.parse()?;
        let check = eligibility::check_zone(permit, &zone);
        return Ok(json!({ "result": check }));
    }

    let zones: Vec<String> = eligibility::allowed_zones(permit)
        .iter()
        .map(|z| z.to_string())
        .collect();
    let note = match permit {
        ResidencePermit::Swiss => Some("Swiss citizens may buy in any zone"),
        _ => None,
    };

    Ok(json!({
        "permit": permit,
        "zones": zones,
        "note": note,
    }))
}
