use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use consorcio_core::simulation::{
    calculate_bid_simulation, BidDilution, CreditInsurance, LightPlan, SimulationForm,
    SimulationInput,
};

use crate::config::CliConfig;
use crate::input;

/// Arguments for a single bid simulation. Percentages are in percent units,
/// as typed into the simulator form (18.5 = 18.5%).
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON input file with fractional rates (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Client name, echoed in the output
    #[arg(long)]
    pub cliente: Option<String>,

    /// Credit amount
    #[arg(long, alias = "valor-credito")]
    pub credito: Option<Decimal>,

    /// Plan term in months
    #[arg(long, alias = "prazo-meses")]
    pub prazo: Option<u32>,

    /// Total administration fee, percent
    #[arg(long, alias = "taxa-administracao")]
    pub taxa: Option<Decimal>,

    /// Plano light code: 1=100% 2=50% 3=60% 4=70% 5=80% 6=90%
    #[arg(long, default_value_t = 1)]
    pub plano_light: u8,

    /// Seguro prestamista code: 0=none 1=auto 2=property
    #[arg(long, default_value_t = 0)]
    pub seguro: u8,

    /// Offered bid, percent of credit
    #[arg(long)]
    pub lance_ofertado: Option<Decimal>,

    /// Embedded bid, percent of credit
    #[arg(long)]
    pub lance_embutido: Option<Decimal>,

    /// Offered bid in installments
    #[arg(long)]
    pub parcelas_lance: Option<u32>,

    /// Diluir lance code: 1=dilute 3=do not dilute
    #[arg(long, default_value_t = 1)]
    pub diluir: u8,

    /// Assembly at which the bid is placed
    #[arg(long)]
    pub assembleia: Option<u32>,
}

/// Arguments for simulating many plans at once
#[derive(Args)]
pub struct BatchArgs {
    /// Path to JSON file holding an array of parameter objects
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_simulate(
    args: SimulateArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: SimulationInput = match input::read_json_source(args.input.as_deref())? {
        Some(value) => input_from_json(value, config)?,
        None => form_from_args(&args).into_input(config.insurance_rates())?,
    };

    let output = calculate_bid_simulation(&sim_input)?;
    for w in &output.warnings {
        log::warn!("{}", w);
    }
    log::info!(
        "simulated credit {} over {} months: new installment {}",
        sim_input.valor_credito(),
        sim_input.prazo_meses(),
        output.result.nova_parcela_pos_lance.round_dp(2),
    );

    let mut value = serde_json::to_value(output)?;
    if let (Some(name), Value::Object(map)) = (args.cliente, &mut value) {
        map.insert("nome_cliente".into(), Value::String(name));
    }
    Ok(value)
}

pub fn run_batch(
    args: BatchArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::read_json_source(args.input.as_deref())?
        .ok_or("--input file (or piped JSON array) is required for batch simulation")?;
    let Value::Array(items) = data else {
        return Err("batch input must be a JSON array of parameter objects".into());
    };

    let mut results = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let sim_input = input_from_json(item, config)
            .map_err(|e| format!("item {}: {}", i, e))?;
        let output = calculate_bid_simulation(&sim_input)
            .map_err(|e| format!("item {}: {}", i, e))?;
        for w in &output.warnings {
            log::warn!("item {}: {}", i, w);
        }
        results.push(serde_json::to_value(output.result)?);
    }
    log::info!("simulated {} plans", results.len());

    Ok(serde_json::json!({ "results": results }))
}

fn input_from_json(
    mut value: Value,
    config: &CliConfig,
) -> Result<SimulationInput, Box<dyn std::error::Error>> {
    config.fill_rates(&mut value);
    Ok(SimulationInput::from_value(value)?)
}

fn form_from_args(args: &SimulateArgs) -> SimulationForm {
    SimulationForm {
        nome_cliente: args.cliente.clone(),
        valor_credito: args.credito,
        prazo_meses: args.prazo,
        taxa_administracao_total: args.taxa,
        opcao_plano_light: Some(LightPlan::from(args.plano_light)),
        opcao_seguro_prestamista: Some(CreditInsurance::from(args.seguro)),
        percentual_lance_ofertado: args.lance_ofertado,
        percentual_lance_embutido: args.lance_embutido,
        qtd_parcelas_lance_ofertado: args.parcelas_lance,
        opcao_diluir_lance: Some(BidDilution::from(args.diluir)),
        assembleia_atual: args.assembleia,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args() -> SimulateArgs {
        SimulateArgs {
            input: None,
            cliente: Some("Maria".into()),
            credito: Some(dec!(250_000)),
            prazo: Some(240),
            taxa: Some(dec!(18.5)),
            plano_light: 1,
            seguro: 0,
            lance_ofertado: Some(dec!(30)),
            lance_embutido: None,
            parcelas_lance: Some(180),
            diluir: 1,
            assembleia: None,
        }
    }

    #[test]
    fn test_flags_are_percent_units() {
        let input = form_from_args(&args())
            .into_input(CliConfig::default().insurance_rates())
            .unwrap();
        assert_eq!(input.taxa_administracao_total(), dec!(0.185));
        assert_eq!(input.percentual_lance_ofertado(), dec!(0.30));
        assert_eq!(input.assembleia_atual(), 1);
    }

    #[test]
    fn test_missing_required_flags_reported() {
        let mut a = args();
        a.credito = None;
        let err = form_from_args(&a)
            .into_input(CliConfig::default().insurance_rates())
            .unwrap_err();
        assert!(err.to_string().contains("valor_credito"));
    }

    #[test]
    fn test_json_input_takes_configured_rates() {
        let config = CliConfig {
            taxa_seguro_auto: dec!(0.0007),
            ..CliConfig::default()
        };
        let value = serde_json::json!({
            "valor_credito": "100000",
            "prazo_meses": 100,
            "taxa_administracao_total": "0.2",
        });
        let input = input_from_json(value, &config).unwrap();
        assert_eq!(input.taxa_seguro_auto(), dec!(0.0007));
        assert_eq!(input.taxa_seguro_imovel(), dec!(0.000392));
    }
}
