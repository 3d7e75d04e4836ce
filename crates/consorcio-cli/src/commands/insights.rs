use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use consorcio_core::insights::{calculate_insights, InsightsInput, SimulationRecord};
use consorcio_core::simulation::SimulationInput;

use crate::config::CliConfig;
use crate::input;

/// Arguments for aggregating logged simulations
#[derive(Args)]
pub struct InsightsArgs {
    /// Path to JSON file: an array of simulation records, or an object with a `records` array
    #[arg(long)]
    pub input: Option<String>,

    /// Restrict metrics to one team
    #[arg(long)]
    pub equipe: Option<String>,

    /// Credit distribution bucket width (defaults to the configured value)
    #[arg(long)]
    pub faixa: Option<Decimal>,
}

pub fn run_insights(
    args: InsightsArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::read_json_source(args.input.as_deref())?
        .ok_or("--input file (or piped JSON) is required for insights")?;

    let records_value = match data {
        Value::Object(mut map) => map
            .remove("records")
            .ok_or("insights input object must contain a `records` array")?,
        other => other,
    };
    let Value::Array(mut items) = records_value else {
        return Err("simulation records must be a JSON array".into());
    };
    for (i, item) in items.iter_mut().enumerate() {
        if let Some(sim) = item.get_mut("input") {
            config.fill_rates(sim);
            SimulationInput::from_value(sim.clone())
                .map_err(|e| format!("record {}: {}", i, e))?;
        }
    }
    let records: Vec<SimulationRecord> = serde_json::from_value(Value::Array(items))?;

    let insights_input = InsightsInput {
        records,
        equipe: args.equipe,
        faixa_credito: args.faixa.unwrap_or(config.faixa_distribuicao_credito),
    };
    let output = calculate_insights(&insights_input)?;
    for w in &output.warnings {
        log::warn!("{}", w);
    }
    log::info!(
        "aggregated {} simulations",
        output.result.geral.total_simulacoes
    );

    Ok(serde_json::to_value(output)?)
}
