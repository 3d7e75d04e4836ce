use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::{SimulationInput, SimulationParams};
use super::options::{BidDilution, CreditInsurance, InsuranceRates, LightPlan};
use crate::error::{ArithmeticFault, CalculationStage, ConsorcioError};
use crate::types::{percent_to_rate, rate_to_percent, Money, Months, Percent, Rate};
use crate::ConsorcioResult;

/// Parameters as typed into the simulator form.
///
/// Every field is optional and the fee and bid fields are percentages
/// (18.5 means 18.5%). Insurance rates are not part of the form: they come
/// from configuration when the form is converted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_cliente: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_credito: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prazo_meses: Option<Months>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxa_administracao_total: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcao_plano_light: Option<LightPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcao_seguro_prestamista: Option<CreditInsurance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentual_lance_ofertado: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentual_lance_embutido: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qtd_parcelas_lance_ofertado: Option<Months>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcao_diluir_lance: Option<BidDilution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembleia_atual: Option<Months>,
}

impl SimulationForm {
    /// Convert to fractional parameters. All missing required fields are
    /// reported together.
    pub fn into_params(self, rates: InsuranceRates) -> ConsorcioResult<SimulationParams> {
        let missing: Vec<&str> = [
            ("valor_credito", self.valor_credito.is_none()),
            ("prazo_meses", self.prazo_meses.is_none()),
            (
                "taxa_administracao_total",
                self.taxa_administracao_total.is_none(),
            ),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();

        let (Some(valor_credito), Some(prazo_meses), Some(taxa)) = (
            self.valor_credito,
            self.prazo_meses,
            self.taxa_administracao_total,
        ) else {
            return Err(ConsorcioError::invalid(
                &missing.join(", "),
                "Required field not provided.",
            ));
        };

        Ok(SimulationParams {
            valor_credito,
            prazo_meses,
            taxa_administracao_total: percent_to_rate(taxa),
            // 0 from the form means "not filled in", same as absent
            assembleia_atual: self.assembleia_atual.filter(|a| *a > 0).unwrap_or(1),
            opcao_plano_light: self.opcao_plano_light.unwrap_or_default(),
            opcao_seguro_prestamista: self.opcao_seguro_prestamista.unwrap_or_default(),
            percentual_lance_ofertado: percent_to_rate(
                self.percentual_lance_ofertado.unwrap_or(Decimal::ZERO),
            ),
            percentual_lance_embutido: percent_to_rate(
                self.percentual_lance_embutido.unwrap_or(Decimal::ZERO),
            ),
            qtd_parcelas_lance_ofertado: self.qtd_parcelas_lance_ofertado.unwrap_or(0),
            opcao_diluir_lance: self.opcao_diluir_lance.unwrap_or_default(),
            taxa_seguro_auto: rates.taxa_seguro_auto,
            taxa_seguro_imovel: rates.taxa_seguro_imovel,
        })
    }

    pub fn into_input(self, rates: InsuranceRates) -> ConsorcioResult<SimulationInput> {
        SimulationInput::new(self.into_params(rates)?)
    }

    /// Pre-populate a form from an earlier simulation (fractions back to percent).
    pub fn from_input(
        input: &SimulationInput,
        nome_cliente: Option<String>,
    ) -> ConsorcioResult<Self> {
        Ok(SimulationForm {
            nome_cliente,
            valor_credito: Some(input.valor_credito()),
            prazo_meses: Some(input.prazo_meses()),
            taxa_administracao_total: Some(as_percent(
                input.taxa_administracao_total(),
                "taxa_administracao_total",
            )?),
            opcao_plano_light: Some(input.opcao_plano_light()),
            opcao_seguro_prestamista: Some(input.opcao_seguro_prestamista()),
            percentual_lance_ofertado: Some(as_percent(
                input.percentual_lance_ofertado(),
                "percentual_lance_ofertado",
            )?),
            percentual_lance_embutido: Some(as_percent(
                input.percentual_lance_embutido(),
                "percentual_lance_embutido",
            )?),
            qtd_parcelas_lance_ofertado: Some(input.qtd_parcelas_lance_ofertado()),
            opcao_diluir_lance: Some(input.opcao_diluir_lance()),
            assembleia_atual: Some(input.assembleia_atual()),
        })
    }
}

fn as_percent(rate: Rate, field: &str) -> ConsorcioResult<Percent> {
    rate_to_percent(rate).ok_or_else(|| {
        ConsorcioError::calculation(
            CalculationStage::FormConversion,
            field,
            ArithmeticFault::Overflow,
        )
    })
}
