use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::options::{BidDilution, CreditInsurance, InsuranceRates, LightPlan};
use crate::error::ConsorcioError;
use crate::types::{Money, Months, Rate};
use crate::ConsorcioResult;

// ---------------------------------------------------------------------------
// Raw parameters
// ---------------------------------------------------------------------------

/// Plan parameters as supplied by the caller, before validation.
///
/// Rates and bid percentages are fractions (0.185 = 18.5%). Use
/// [`SimulationForm`](super::form::SimulationForm) for percent-unit input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub valor_credito: Money,
    pub prazo_meses: Months,
    pub taxa_administracao_total: Rate,
    #[serde(default = "first_assembly")]
    pub assembleia_atual: Months,
    #[serde(default)]
    pub opcao_plano_light: LightPlan,
    #[serde(default)]
    pub opcao_seguro_prestamista: CreditInsurance,
    #[serde(default)]
    pub percentual_lance_ofertado: Rate,
    #[serde(default)]
    pub percentual_lance_embutido: Rate,
    #[serde(default)]
    pub qtd_parcelas_lance_ofertado: Months,
    #[serde(default)]
    pub opcao_diluir_lance: BidDilution,
    pub taxa_seguro_auto: Rate,
    pub taxa_seguro_imovel: Rate,
}

fn first_assembly() -> Months {
    1
}

impl SimulationParams {
    /// Minimal parameter set: no bid, full plan, no insurance, first assembly.
    pub fn new(
        valor_credito: Money,
        prazo_meses: Months,
        taxa_administracao_total: Rate,
        rates: InsuranceRates,
    ) -> Self {
        SimulationParams {
            valor_credito,
            prazo_meses,
            taxa_administracao_total,
            assembleia_atual: first_assembly(),
            opcao_plano_light: LightPlan::default(),
            opcao_seguro_prestamista: CreditInsurance::default(),
            percentual_lance_ofertado: Decimal::ZERO,
            percentual_lance_embutido: Decimal::ZERO,
            qtd_parcelas_lance_ofertado: 0,
            opcao_diluir_lance: BidDilution::default(),
            taxa_seguro_auto: rates.taxa_seguro_auto,
            taxa_seguro_imovel: rates.taxa_seguro_imovel,
        }
    }

    pub fn insurance_rates(&self) -> InsuranceRates {
        InsuranceRates {
            taxa_seguro_auto: self.taxa_seguro_auto,
            taxa_seguro_imovel: self.taxa_seguro_imovel,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated input
// ---------------------------------------------------------------------------

/// Validated, immutable plan parameters. The only way to obtain one is
/// [`SimulationInput::new`] (deserialisation goes through it as well), so a
/// value of this type always satisfies every plan invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimulationParams", into = "SimulationParams")]
pub struct SimulationInput {
    params: SimulationParams,
}

impl SimulationInput {
    pub fn new(params: SimulationParams) -> ConsorcioResult<Self> {
        validate_params(&params)?;
        Ok(SimulationInput { params })
    }

    /// Parse raw parameters, then validate them. Unlike deserializing a
    /// `SimulationInput` directly, a broken invariant surfaces as
    /// `InvalidInput` rather than a serialization error.
    pub fn from_json(json: &str) -> ConsorcioResult<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> ConsorcioResult<Self> {
        Self::new(serde_json::from_value(value)?)
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn into_params(self) -> SimulationParams {
        self.params
    }

    pub fn valor_credito(&self) -> Money {
        self.params.valor_credito
    }

    pub fn prazo_meses(&self) -> Months {
        self.params.prazo_meses
    }

    pub fn taxa_administracao_total(&self) -> Rate {
        self.params.taxa_administracao_total
    }

    pub fn assembleia_atual(&self) -> Months {
        self.params.assembleia_atual
    }

    pub fn opcao_plano_light(&self) -> LightPlan {
        self.params.opcao_plano_light
    }

    pub fn opcao_seguro_prestamista(&self) -> CreditInsurance {
        self.params.opcao_seguro_prestamista
    }

    pub fn percentual_lance_ofertado(&self) -> Rate {
        self.params.percentual_lance_ofertado
    }

    pub fn percentual_lance_embutido(&self) -> Rate {
        self.params.percentual_lance_embutido
    }

    pub fn qtd_parcelas_lance_ofertado(&self) -> Months {
        self.params.qtd_parcelas_lance_ofertado
    }

    pub fn opcao_diluir_lance(&self) -> BidDilution {
        self.params.opcao_diluir_lance
    }

    pub fn taxa_seguro_auto(&self) -> Rate {
        self.params.taxa_seguro_auto
    }

    pub fn taxa_seguro_imovel(&self) -> Rate {
        self.params.taxa_seguro_imovel
    }
}

impl TryFrom<SimulationParams> for SimulationInput {
    type Error = ConsorcioError;

    fn try_from(params: SimulationParams) -> Result<Self, Self::Error> {
        SimulationInput::new(params)
    }
}

impl From<SimulationInput> for SimulationParams {
    fn from(input: SimulationInput) -> Self {
        input.params
    }
}

fn validate_params(p: &SimulationParams) -> ConsorcioResult<()> {
    if p.valor_credito <= Decimal::ZERO {
        return Err(ConsorcioError::invalid(
            "valor_credito",
            "Credit amount must be positive.",
        ));
    }
    if p.prazo_meses == 0 {
        return Err(ConsorcioError::invalid(
            "prazo_meses",
            "Plan term must be at least one month.",
        ));
    }
    if p.taxa_administracao_total < Decimal::ZERO {
        return Err(ConsorcioError::invalid(
            "taxa_administracao_total",
            "Administration fee cannot be negative.",
        ));
    }
    if p.assembleia_atual == 0 {
        return Err(ConsorcioError::invalid(
            "assembleia_atual",
            "Assemblies are numbered from 1.",
        ));
    }
    if p.assembleia_atual > p.prazo_meses {
        return Err(ConsorcioError::invalid(
            "assembleia_atual",
            format!(
                "Bid assembly {} is beyond the {}-month plan term.",
                p.assembleia_atual, p.prazo_meses
            ),
        ));
    }
    if p.percentual_lance_ofertado < Decimal::ZERO {
        return Err(ConsorcioError::invalid(
            "percentual_lance_ofertado",
            "Offered bid percentage cannot be negative.",
        ));
    }
    if p.percentual_lance_embutido < Decimal::ZERO {
        return Err(ConsorcioError::invalid(
            "percentual_lance_embutido",
            "Embedded bid percentage cannot be negative.",
        ));
    }
    if p.percentual_lance_embutido > p.percentual_lance_ofertado {
        return Err(ConsorcioError::invalid(
            "percentual_lance_embutido",
            "Embedded bid cannot exceed the total offered bid.",
        ));
    }
    if p.taxa_seguro_auto < Decimal::ZERO {
        return Err(ConsorcioError::invalid(
            "taxa_seguro_auto",
            "Insurance rate cannot be negative.",
        ));
    }
    if p.taxa_seguro_imovel < Decimal::ZERO {
        return Err(ConsorcioError::invalid(
            "taxa_seguro_imovel",
            "Insurance rate cannot be negative.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_params() -> SimulationParams {
        SimulationParams::new(dec!(100_000), 120, dec!(0.16), InsuranceRates::default())
    }

    fn rejected_field(params: SimulationParams) -> String {
        match SimulationInput::new(params).unwrap_err() {
            ConsorcioError::InvalidInput { field, .. } => field,
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_params_accepted() {
        let input = SimulationInput::new(base_params()).unwrap();
        assert_eq!(input.valor_credito(), dec!(100_000));
        assert_eq!(input.assembleia_atual(), 1);
        assert_eq!(input.opcao_diluir_lance(), BidDilution::Dilute);
    }

    #[test]
    fn test_zero_assembly_rejected() {
        let mut p = base_params();
        p.assembleia_atual = 0;
        assert_eq!(rejected_field(p), "assembleia_atual");
    }

    #[test]
    fn test_negative_bid_percentages_rejected() {
        let mut p = base_params();
        p.percentual_lance_ofertado = dec!(-0.1);
        p.percentual_lance_embutido = dec!(-0.2);
        assert_eq!(rejected_field(p), "percentual_lance_ofertado");
    }

    #[test]
    fn test_negative_insurance_rate_rejected() {
        let mut p = base_params();
        p.taxa_seguro_imovel = dec!(-0.0001);
        assert_eq!(rejected_field(p), "taxa_seguro_imovel");
    }

    #[test]
    fn test_assembly_equal_to_term_is_valid() {
        let mut p = base_params();
        p.assembleia_atual = p.prazo_meses;
        assert!(SimulationInput::new(p).is_ok());
    }

    #[test]
    fn test_deserialise_applies_defaults_and_validation() {
        let json = r#"{
            "valor_credito": "50000",
            "prazo_meses": 60,
            "taxa_administracao_total": "0.2",
            "taxa_seguro_auto": "0.000599",
            "taxa_seguro_imovel": "0.000392"
        }"#;
        let input: SimulationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.prazo_meses(), 60);
        assert_eq!(input.opcao_plano_light(), LightPlan::Full);
        assert_eq!(input.opcao_seguro_prestamista(), CreditInsurance::None);
        assert_eq!(input.qtd_parcelas_lance_ofertado(), 0);

        let bad = json.replace("\"prazo_meses\": 60", "\"prazo_meses\": 0");
        assert!(serde_json::from_str::<SimulationInput>(&bad).is_err());
    }

    #[test]
    fn test_from_json_keeps_invalid_input_kind() {
        let json = r#"{
            "valor_credito": "50000",
            "prazo_meses": 60,
            "taxa_administracao_total": "0.2",
            "percentual_lance_ofertado": "0.1",
            "percentual_lance_embutido": "0.3",
            "taxa_seguro_auto": "0.000599",
            "taxa_seguro_imovel": "0.000392"
        }"#;
        match SimulationInput::from_json(json).unwrap_err() {
            ConsorcioError::InvalidInput { field, .. } => {
                assert_eq!(field, "percentual_lance_embutido");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }

        let malformed = SimulationInput::from_json(r#"{"prazo_meses": 60}"#);
        assert!(matches!(malformed, Err(ConsorcioError::SerializationError(_))));
    }

    #[test]
    fn test_serialises_as_flat_params() {
        let input = SimulationInput::new(base_params()).unwrap();
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["prazo_meses"], 120);
        assert_eq!(value["opcao_plano_light"], 1);
        assert_eq!(value["valor_credito"], "100000");
    }
}
