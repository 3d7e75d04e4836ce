use consorcio_core::insights::{calculate_insights, InsightsInput};
use consorcio_core::simulation::{
    calculate_bid_simulation, InsuranceRates, SimulationForm, SimulationInput, SimulationParams,
};
use consorcio_core::ConsorcioResult;
use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Simulate one plan. `input_json` holds fractional rates and both insurance rates.
#[napi]
pub fn simulate_bid(input_json: String) -> NapiResult<String> {
    simulate_bid_json(&input_json).map_err(to_napi_error)
}

/// Simulate an array of plans; the first invalid plan fails the whole call.
#[napi]
pub fn simulate_batch(inputs_json: String) -> NapiResult<String> {
    simulate_batch_json(&inputs_json).map_err(to_napi_error)
}

/// Convert a percent-unit form into validated parameters. `rates_json` falls
/// back to the reference insurance rates when omitted.
#[napi]
pub fn simulation_form_to_input(
    form_json: String,
    rates_json: Option<String>,
) -> NapiResult<String> {
    form_to_input_json(&form_json, rates_json.as_deref()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[napi]
pub fn simulation_insights(input_json: String) -> NapiResult<String> {
    insights_json(&input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// JSON plumbing
// ---------------------------------------------------------------------------

fn simulate_bid_json(input_json: &str) -> ConsorcioResult<String> {
    let input = SimulationInput::from_json(input_json)?;
    let output = calculate_bid_simulation(&input)?;
    Ok(serde_json::to_string(&output)?)
}

fn simulate_batch_json(inputs_json: &str) -> ConsorcioResult<String> {
    let params: Vec<SimulationParams> = serde_json::from_str(inputs_json)?;
    let outputs = params
        .into_iter()
        .map(SimulationInput::new)
        .map(|input| calculate_bid_simulation(&input?))
        .collect::<ConsorcioResult<Vec<_>>>()?;
    Ok(serde_json::to_string(&outputs)?)
}

fn form_to_input_json(form_json: &str, rates_json: Option<&str>) -> ConsorcioResult<String> {
    let form: SimulationForm = serde_json::from_str(form_json)?;
    let rates: InsuranceRates = match rates_json {
        Some(r) => serde_json::from_str(r)?,
        None => InsuranceRates::default(),
    };
    let input = form.into_input(rates)?;
    Ok(serde_json::to_string(&input)?)
}

fn insights_json(input_json: &str) -> ConsorcioResult<String> {
    let input = InsightsInput::from_json(input_json)?;
    let output = calculate_insights(&input)?;
    Ok(serde_json::to_string(&output)?)
}
