use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::input::SimulationInput;
use crate::error::{ArithmeticFault, CalculationStage, ConsorcioError};
use crate::types::*;
use crate::ConsorcioResult;

// ---------------------------------------------------------------------------
// Output type
// ---------------------------------------------------------------------------

/// Credit schedule after a bid. Only produced by [`BidSimulationCalculator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Credit released to the participant: contracted credit minus the embedded bid.
    pub credito_disponivel: Money,
    /// Installment due after the bid, insurance included.
    pub nova_parcela_pos_lance: Money,
    pub saldo_devedor_base_final: Money,
    /// Out-of-pocket part of the bid. Never negative.
    pub valor_lance_recurso_proprio: Money,
    pub credito_contratado: Money,
    pub valor_parcela_inicial: Money,
    pub valor_lance_ofertado_total: Money,
    pub valor_lance_embutido: Money,
    pub total_parcelas_pagas_no_lance: i64,
    /// Can be zero or negative when bid installments cover the whole term.
    pub prazo_restante_final: i64,
    pub percentual_parcela_base: Rate,
    pub percentual_lance_recurso_proprio: Rate,
    pub taxa_amortizacao_mensal_pos_assembleia: Rate,
    pub valor_parcela_base_pos_assembleia: Money,
    pub qtd_parcelas_lance_embutido: i64,
    /// Installment after the bid, before insurance.
    pub nova_parcela_base: Money,
    /// The input this result was computed from. Kept for the caller's audit trail.
    pub input: SimulationInput,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Deterministic, stateless bid simulation. Safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidSimulationCalculator;

impl BidSimulationCalculator {
    pub fn new() -> Self {
        BidSimulationCalculator
    }

    /// Run every stage of the bid computation on a validated input.
    ///
    /// Full decimal precision is carried between stages; the embedded-bid
    /// installment count is the single rounding point (half to even).
    pub fn compute(&self, input: &SimulationInput) -> ConsorcioResult<SimulationResult> {
        let base = base_amortization(input)?;
        let plan = plan_loading(input, &base)?;
        let initial = initial_installment(input, &base, &plan)?;
        let post = post_assembly(input, &base, &plan)?;
        let bid = bid_sizing(input, &post)?;
        let term = dilution(input, &bid)?;
        let fin = final_balance(input, &base, &plan, &post, &term)?;

        let credito_contratado = input.valor_credito();
        let credito_disponivel = Checked::at(CalculationStage::FinalBalance).sub(
            credito_contratado,
            bid.valor_lance_embutido,
            "credito_disponivel",
        )?;

        Ok(SimulationResult {
            credito_disponivel,
            nova_parcela_pos_lance: fin.nova_parcela_pos_lance,
            saldo_devedor_base_final: fin.saldo_devedor_base_final,
            valor_lance_recurso_proprio: bid.valor_lance_recurso_proprio,
            credito_contratado,
            valor_parcela_inicial: initial.valor_parcela_inicial,
            valor_lance_ofertado_total: bid.valor_lance_ofertado_total,
            valor_lance_embutido: bid.valor_lance_embutido,
            total_parcelas_pagas_no_lance: term.total_parcelas_pagas_no_lance,
            prazo_restante_final: term.prazo_restante_final,
            percentual_parcela_base: plan.percentual_parcela_base,
            percentual_lance_recurso_proprio: bid.percentual_lance_recurso_proprio,
            taxa_amortizacao_mensal_pos_assembleia: post.taxa_amortizacao_mensal_pos_assembleia,
            valor_parcela_base_pos_assembleia: post.valor_parcela_base_pos_assembleia,
            qtd_parcelas_lance_embutido: bid.qtd_parcelas_lance_embutido,
            nova_parcela_base: fin.nova_parcela_base,
            input: input.clone(),
        })
    }
}

/// Run the bid simulation and wrap the result in the standard envelope with
/// warnings for the terminal-edge cases.
pub fn calculate_bid_simulation(
    input: &SimulationInput,
) -> ConsorcioResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();

    let result = BidSimulationCalculator.compute(input)?;
    let warnings = collect_warnings(input, &result);

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "embedded_bid_rounding": "half_to_even",
        "fator_plano_light": input.opcao_plano_light().factor().to_string(),
        "seguro_prestamista": input.opcao_seguro_prestamista().label(),
        "diluir_lance": input.opcao_diluir_lance().label(),
        "taxa_seguro_auto": input.taxa_seguro_auto().to_string(),
        "taxa_seguro_imovel": input.taxa_seguro_imovel().to_string(),
    });

    Ok(with_metadata(
        "Consortium bid simulation (percentage-based amortization, single rounding point)",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

struct BaseAmortization {
    fator_taxa_total: Decimal,
    valor_total_a_pagar: Money,
    taxa_amortizacao_mensal: Rate,
}

fn base_amortization(input: &SimulationInput) -> ConsorcioResult<BaseAmortization> {
    let m = Checked::at(CalculationStage::BaseAmortization);
    let fator_taxa_total = m.add(
        Decimal::ONE,
        input.taxa_administracao_total(),
        "fator_taxa_total",
    )?;
    // prazo_meses >= 1 by construction of SimulationInput
    let taxa_amortizacao_mensal = m.div(
        fator_taxa_total,
        Decimal::from(input.prazo_meses()),
        "taxa_amortizacao_mensal",
    )?;
    let valor_total_a_pagar = m.mul(
        input.valor_credito(),
        fator_taxa_total,
        "valor_total_a_pagar",
    )?;
    Ok(BaseAmortization {
        fator_taxa_total,
        valor_total_a_pagar,
        taxa_amortizacao_mensal,
    })
}

struct PlanLoading {
    flag_seguro_auto: Decimal,
    flag_seguro_imovel: Decimal,
    percentual_parcela_base: Rate,
}

fn plan_loading(input: &SimulationInput, base: &BaseAmortization) -> ConsorcioResult<PlanLoading> {
    let m = Checked::at(CalculationStage::InsuranceAndLightPlan);
    let (flag_seguro_auto, flag_seguro_imovel) = input.opcao_seguro_prestamista().flags();
    let percentual_parcela_base = m.mul(
        base.taxa_amortizacao_mensal,
        input.opcao_plano_light().factor(),
        "percentual_parcela_base",
    )?;
    Ok(PlanLoading {
        flag_seguro_auto,
        flag_seguro_imovel,
        percentual_parcela_base,
    })
}

struct InitialInstallment {
    valor_parcela_inicial: Money,
}

fn initial_installment(
    input: &SimulationInput,
    base: &BaseAmortization,
    plan: &PlanLoading,
) -> ConsorcioResult<InitialInstallment> {
    let m = Checked::at(CalculationStage::InitialInstallment);
    let (seguro_auto, seguro_imovel) = m.insurance(input, base.valor_total_a_pagar, plan)?;
    let parcela_base = m.mul(
        input.valor_credito(),
        plan.percentual_parcela_base,
        "valor_parcela_inicial",
    )?;
    let valor_parcela_inicial = m.add(
        m.add(parcela_base, seguro_auto, "valor_parcela_inicial")?,
        seguro_imovel,
        "valor_parcela_inicial",
    )?;
    Ok(InitialInstallment {
        valor_parcela_inicial,
    })
}

struct PostAssembly {
    valor_pago_ate_assembleia: Rate,
    taxa_amortizacao_mensal_pos_assembleia: Rate,
    valor_parcela_base_pos_assembleia: Money,
}

fn post_assembly(
    input: &SimulationInput,
    base: &BaseAmortization,
    plan: &PlanLoading,
) -> ConsorcioResult<PostAssembly> {
    let m = Checked::at(CalculationStage::PostAssembly);
    let prazo_restante_inicial =
        i64::from(input.prazo_meses()) - i64::from(input.assembleia_atual());
    let valor_pago_ate_assembleia = m.mul(
        Decimal::from(input.assembleia_atual()),
        plan.percentual_parcela_base,
        "valor_pago_ate_assembleia",
    )?;
    let saldo_devedor_faturado_inicial = m.sub(
        base.fator_taxa_total,
        valor_pago_ate_assembleia,
        "saldo_devedor_faturado_inicial",
    )?;

    // Bid at (or past) the last installment: nothing left to re-amortize.
    let taxa_amortizacao_mensal_pos_assembleia = if prazo_restante_inicial <= 0 {
        Decimal::ZERO
    } else {
        m.div(
            saldo_devedor_faturado_inicial,
            Decimal::from(prazo_restante_inicial),
            "taxa_amortizacao_mensal_pos_assembleia",
        )?
    };
    let valor_parcela_base_pos_assembleia = m.mul(
        input.valor_credito(),
        taxa_amortizacao_mensal_pos_assembleia,
        "valor_parcela_base_pos_assembleia",
    )?;

    Ok(PostAssembly {
        valor_pago_ate_assembleia,
        taxa_amortizacao_mensal_pos_assembleia,
        valor_parcela_base_pos_assembleia,
    })
}

struct BidSizing {
    valor_lance_ofertado_total: Money,
    qtd_parcelas_lance_embutido: i64,
    valor_lance_embutido: Money,
    percentual_lance_recurso_proprio: Rate,
    valor_lance_recurso_proprio: Money,
}

fn bid_sizing(input: &SimulationInput, post: &PostAssembly) -> ConsorcioResult<BidSizing> {
    let m = Checked::at(CalculationStage::BidSizing);
    let parcela = post.valor_parcela_base_pos_assembleia;

    let valor_lance_ofertado_total = m.mul(
        Decimal::from(input.qtd_parcelas_lance_ofertado()),
        parcela,
        "valor_lance_ofertado_total",
    )?;

    let qtd_embutido = if parcela > Decimal::ZERO {
        let valor_embutido_bruto = m.mul(
            input.valor_credito(),
            input.percentual_lance_embutido(),
            "qtd_parcelas_lance_embutido",
        )?;
        m.div(valor_embutido_bruto, parcela, "qtd_parcelas_lance_embutido")?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
    } else {
        Decimal::ZERO
    };
    let valor_lance_embutido = m.mul(qtd_embutido, parcela, "valor_lance_embutido")?;

    let percentual_lance_recurso_proprio = m.sub(
        input.percentual_lance_ofertado(),
        input.percentual_lance_embutido(),
        "percentual_lance_recurso_proprio",
    )?;
    // An embedded bid larger than the offered total needs no own resources.
    let valor_lance_recurso_proprio = m
        .sub(
            valor_lance_ofertado_total,
            valor_lance_embutido,
            "valor_lance_recurso_proprio",
        )?
        .max(Decimal::ZERO);

    Ok(BidSizing {
        valor_lance_ofertado_total,
        qtd_parcelas_lance_embutido: m.count(qtd_embutido, "qtd_parcelas_lance_embutido")?,
        valor_lance_embutido,
        percentual_lance_recurso_proprio,
        valor_lance_recurso_proprio,
    })
}

struct Dilution {
    total_parcelas_pagas_no_lance: i64,
    prazo_restante_final: i64,
}

fn dilution(input: &SimulationInput, bid: &BidSizing) -> ConsorcioResult<Dilution> {
    let m = Checked::at(CalculationStage::Dilution);
    let (flag_embutido, flag_ofertado) = input.opcao_diluir_lance().flags();

    let pagas_embutido = m.mul(
        Decimal::from(bid.qtd_parcelas_lance_embutido),
        flag_embutido,
        "parcelas_pagas_no_lance_embutido",
    )?;
    let pagas_ofertado = m.mul(
        Decimal::from(input.qtd_parcelas_lance_ofertado()),
        flag_ofertado,
        "parcelas_pagas_no_lance_ofertado",
    )?;
    let total = m.add(
        m.add(
            Decimal::from(input.assembleia_atual()),
            pagas_embutido,
            "total_parcelas_pagas_no_lance",
        )?,
        pagas_ofertado,
        "total_parcelas_pagas_no_lance",
    )?;
    let restante = m.sub(
        Decimal::from(input.prazo_meses()),
        total,
        "prazo_restante_final",
    )?;

    Ok(Dilution {
        total_parcelas_pagas_no_lance: m.count(total, "total_parcelas_pagas_no_lance")?,
        prazo_restante_final: m.count(restante, "prazo_restante_final")?,
    })
}

struct FinalBalance {
    saldo_devedor_base_final: Money,
    nova_parcela_base: Money,
    nova_parcela_pos_lance: Money,
}

fn final_balance(
    input: &SimulationInput,
    base: &BaseAmortization,
    plan: &PlanLoading,
    post: &PostAssembly,
    term: &Dilution,
) -> ConsorcioResult<FinalBalance> {
    let m = Checked::at(CalculationStage::FinalBalance);

    let pago_no_lance = m.mul(
        Decimal::from(input.qtd_parcelas_lance_ofertado()),
        post.taxa_amortizacao_mensal_pos_assembleia,
        "valor_pago_total_com_lance",
    )?;
    let pago_ate_assembleia = m.mul(
        post.valor_pago_ate_assembleia,
        input.valor_credito(),
        "valor_pago_total_com_lance",
    )?;
    let valor_pago_total_com_lance =
        m.add(pago_no_lance, pago_ate_assembleia, "valor_pago_total_com_lance")?;
    let saldo_devedor_base_final = m.sub(
        base.valor_total_a_pagar,
        valor_pago_total_com_lance,
        "saldo_devedor_base_final",
    )?;

    // No installments left: the new installment is zero by definition.
    let nova_parcela_base = if term.prazo_restante_final > 0 {
        m.div(
            saldo_devedor_base_final,
            Decimal::from(term.prazo_restante_final),
            "nova_parcela_base",
        )?
    } else {
        Decimal::ZERO
    };

    let (seguro_auto, seguro_imovel) = m.insurance(input, saldo_devedor_base_final, plan)?;
    let nova_parcela_pos_lance = m.add(
        m.add(nova_parcela_base, seguro_auto, "nova_parcela_pos_lance")?,
        seguro_imovel,
        "nova_parcela_pos_lance",
    )?;

    Ok(FinalBalance {
        saldo_devedor_base_final,
        nova_parcela_base,
        nova_parcela_pos_lance,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Checked decimal arithmetic that reports faults against a stage.
struct Checked {
    stage: CalculationStage,
}

impl Checked {
    fn at(stage: CalculationStage) -> Self {
        Checked { stage }
    }

    fn fault(&self, quantity: &str, source: ArithmeticFault) -> ConsorcioError {
        ConsorcioError::calculation(self.stage, quantity, source)
    }

    fn add(&self, a: Decimal, b: Decimal, quantity: &str) -> ConsorcioResult<Decimal> {
        a.checked_add(b)
            .ok_or_else(|| self.fault(quantity, ArithmeticFault::Overflow))
    }

    fn sub(&self, a: Decimal, b: Decimal, quantity: &str) -> ConsorcioResult<Decimal> {
        a.checked_sub(b)
            .ok_or_else(|| self.fault(quantity, ArithmeticFault::Overflow))
    }

    fn mul(&self, a: Decimal, b: Decimal, quantity: &str) -> ConsorcioResult<Decimal> {
        a.checked_mul(b)
            .ok_or_else(|| self.fault(quantity, ArithmeticFault::Overflow))
    }

    fn div(&self, a: Decimal, b: Decimal, quantity: &str) -> ConsorcioResult<Decimal> {
        if b.is_zero() {
            return Err(self.fault(quantity, ArithmeticFault::DivisionByZero));
        }
        a.checked_div(b)
            .ok_or_else(|| self.fault(quantity, ArithmeticFault::Overflow))
    }

    /// Integral decimal to an installment count.
    fn count(&self, value: Decimal, quantity: &str) -> ConsorcioResult<i64> {
        if !value.fract().is_zero() {
            return Err(self.fault(
                quantity,
                ArithmeticFault::Unrepresentable(value.to_string()),
            ));
        }
        value.to_i64().ok_or_else(|| {
            self.fault(quantity, ArithmeticFault::Unrepresentable(value.to_string()))
        })
    }

    /// (auto, property) insurance charged on `amount`.
    fn insurance(
        &self,
        input: &SimulationInput,
        amount: Money,
        plan: &PlanLoading,
    ) -> ConsorcioResult<(Money, Money)> {
        let auto = self.mul(
            self.mul(input.taxa_seguro_auto(), amount, "seguro_auto")?,
            plan.flag_seguro_auto,
            "seguro_auto",
        )?;
        let imovel = self.mul(
            self.mul(input.taxa_seguro_imovel(), amount, "seguro_imovel")?,
            plan.flag_seguro_imovel,
            "seguro_imovel",
        )?;
        Ok((auto, imovel))
    }
}

fn collect_warnings(input: &SimulationInput, result: &SimulationResult) -> Vec<String> {
    let mut warnings = Vec::new();

    if !input.opcao_plano_light().is_known() {
        warnings.push(format!(
            "Unknown plano light code {}; full installment (factor 1.0) applied.",
            input.opcao_plano_light().code()
        ));
    }
    if !input.opcao_seguro_prestamista().is_known() {
        warnings.push(format!(
            "Unknown seguro prestamista code {}; no insurance applied.",
            input.opcao_seguro_prestamista().code()
        ));
    }
    if !input.opcao_diluir_lance().is_known() {
        warnings.push(format!(
            "Unknown diluir lance code {}; bid installments do not shorten the term.",
            input.opcao_diluir_lance().code()
        ));
    }
    if input.assembleia_atual() >= input.prazo_meses() {
        warnings.push(
            "Bid placed at the final assembly: no installments remain to re-amortize.".into(),
        );
    } else if result.prazo_restante_final <= 0 {
        warnings.push(format!(
            "Bid installments cover the whole term (remaining term {}); new installment is zero.",
            result.prazo_restante_final
        ));
    }
    if result.valor_lance_embutido > result.valor_lance_ofertado_total {
        warnings.push(
            "Embedded bid exceeds the offered bid total; own-resource contribution set to zero."
                .into(),
        );
    }
    if result.saldo_devedor_base_final < Decimal::ZERO {
        warnings.push(format!(
            "Final outstanding balance is negative ({}).",
            result.saldo_devedor_base_final
        ));
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
