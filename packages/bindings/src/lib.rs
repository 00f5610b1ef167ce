use napi::Result as NapiResult;
use napi_derive::napi;

use str_returns_core::eligibility::{ResidencePermit, Zone};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Run a simulation from a JSON `SimulationRequest`; returns the JSON envelope.
#[napi]
pub fn simulate(input_json: String) -> NapiResult<String> {
    let input: str_returns_core::calculator::SimulationRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = str_returns_core::calculator::simulate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sensitivity_grid(input_json: String) -> NapiResult<String> {
    let input: str_returns_core::sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        str_returns_core::sensitivity::occupancy_rate_grid(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Cost model
// ---------------------------------------------------------------------------

#[napi]
pub fn default_cost_model() -> NapiResult<String> {
    serde_json::to_string(&str_returns_core::CostModel::default()).map_err(to_napi_error)
}

/// Parse and validate a TOML cost model; returns it as JSON.
#[napi]
pub fn cost_model_from_toml(toml_text: String) -> NapiResult<String> {
    let model = str_returns_core::CostModel::from_toml_str(&toml_text).map_err(to_napi_error)?;
    serde_json::to_string(&model).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Listing text
// ---------------------------------------------------------------------------

/// Extract listing fields from recognised text. Never fails on content;
/// unmatched fields come back as null with a warning each.
#[napi]
pub fn extract_listing(text: String) -> NapiResult<String> {
    let output = str_returns_core::listing::extract_listing(&text);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

#[napi]
pub fn allowed_zones(permit: String) -> NapiResult<Vec<String>> {
    let permit: ResidencePermit = permit.parse().map_err(to_napi_error)?;
    Ok(str_returns_core::eligibility::allowed_zones(permit)
        .iter()
        .map(|z| z.to_string())
        .collect())
}

#[napi]
pub fn check_zone(permit: String, zone: String) -> NapiResult<String> {
    let permit: ResidencePermit = permit.parse().map_err(to_napi_error)?;
    let zone: Zone = zone.parse().map_err(to_napi_error)?;
    let check = str_returns_core::eligibility::check_zone(permit, &zone);
    serde_json::to_string(&check).map_err(to_napi_error)
}
