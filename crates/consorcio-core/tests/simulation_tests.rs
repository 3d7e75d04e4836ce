use consorcio_core::simulation::{
    calculate_bid_simulation, BidDilution, BidSimulationCalculator, CreditInsurance,
    InsuranceRates, LightPlan, SimulationInput, SimulationParams, SimulationResult,
};
use consorcio_core::ConsorcioError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn reference_rates() -> InsuranceRates {
    InsuranceRates {
        taxa_seguro_auto: dec!(0.000599),
        taxa_seguro_imovel: dec!(0.000392),
    }
}

/// 250k over 240 months at 18.5%, 30% offered bid worth 180 installments.
fn baseline_params() -> SimulationParams {
    SimulationParams {
        valor_credito: dec!(250_000),
        prazo_meses: 240,
        taxa_administracao_total: dec!(0.185),
        assembleia_atual: 1,
        opcao_plano_light: LightPlan::Full,
        opcao_seguro_prestamista: CreditInsurance::None,
        percentual_lance_ofertado: dec!(0.30),
        percentual_lance_embutido: dec!(0.0),
        qtd_parcelas_lance_ofertado: 180,
        opcao_diluir_lance: BidDilution::Dilute,
        taxa_seguro_auto: dec!(0.000599),
        taxa_seguro_imovel: dec!(0.000392),
    }
}

fn full_embedded_params() -> SimulationParams {
    SimulationParams {
        percentual_lance_embutido: dec!(0.30),
        qtd_parcelas_lance_ofertado: 0,
        ..baseline_params()
    }
}

fn no_bid_params() -> SimulationParams {
    SimulationParams {
        percentual_lance_ofertado: Decimal::ZERO,
        percentual_lance_embutido: Decimal::ZERO,
        qtd_parcelas_lance_ofertado: 0,
        ..baseline_params()
    }
}

fn compute(params: SimulationParams) -> SimulationResult {
    let input = SimulationInput::new(params).unwrap();
    BidSimulationCalculator.compute(&input).unwrap()
}

fn rejected_field(params: SimulationParams) -> String {
    match SimulationInput::new(params).unwrap_err() {
        ConsorcioError::InvalidInput { field, .. } => field,
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

/// A spread of valid plans touching every option and edge.
fn plan_grid() -> Vec<SimulationParams> {
    let mut grid = Vec::new();
    for plan in LightPlan::ALL {
        for insurance in CreditInsurance::ALL {
            for dilution in [BidDilution::Dilute, BidDilution::DoNotDilute, BidDilution::Other(2)] {
                for assembleia in [1, 37, 240] {
                    grid.push(SimulationParams {
                        opcao_plano_light: plan,
                        opcao_seguro_prestamista: insurance,
                        opcao_diluir_lance: dilution,
                        assembleia_atual: assembleia,
                        percentual_lance_embutido: dec!(0.12),
                        ..baseline_params()
                    });
                }
            }
        }
    }
    grid
}

// ===========================================================================
// Scenario regression values
// ===========================================================================

#[test]
fn test_baseline_scenario_pinned_values() {
    let r = compute(baseline_params());

    assert_eq!(r.credito_contratado, dec!(250_000));
    assert_eq!(r.credito_disponivel, dec!(250_000));
    // 1.185 / 240
    assert_eq!(r.percentual_parcela_base, dec!(0.0049375));
    assert_eq!(r.valor_parcela_inicial, dec!(1234.375));
    // (1.185 - 0.0049375) / 239 = 0.0049375
    assert_eq!(r.taxa_amortizacao_mensal_pos_assembleia, dec!(0.0049375));
    assert_eq!(r.valor_parcela_base_pos_assembleia, dec!(1234.375));
    // 180 * 1234.375
    assert_eq!(r.valor_lance_ofertado_total, dec!(222_187.5));
    assert_eq!(r.qtd_parcelas_lance_embutido, 0);
    assert_eq!(r.valor_lance_embutido, Decimal::ZERO);
    assert_eq!(r.valor_lance_recurso_proprio, dec!(222_187.5));
    assert_eq!(r.percentual_lance_recurso_proprio, dec!(0.30));
    assert_eq!(r.total_parcelas_pagas_no_lance, 1);
    assert_eq!(r.prazo_restante_final, 239);
    // 296250 - (180 * 0.0049375 + 0.0049375 * 250000)
    assert_eq!(r.saldo_devedor_base_final, dec!(295_014.73625));
    // 295014.73625 / 239 = 1234.3712813807531...
    assert_eq!(r.nova_parcela_pos_lance.round_dp(6), dec!(1234.371281));
}

#[test]
fn test_baseline_scenario_properties() {
    let r = compute(baseline_params());
    assert!(r.credito_disponivel > Decimal::ZERO);
    assert_eq!(r.credito_disponivel, r.input.valor_credito());
    assert!(r.nova_parcela_pos_lance < r.valor_parcela_inicial);
}

#[test]
fn test_full_embedded_bid_scenario() {
    let r = compute(full_embedded_params());

    // 250000 * 0.30 / 1234.375 = 60.759... -> 61 installments
    assert_eq!(r.qtd_parcelas_lance_embutido, 61);
    assert_eq!(r.valor_lance_embutido, dec!(75_296.875));
    assert_eq!(r.valor_lance_ofertado_total, Decimal::ZERO);
    assert_eq!(r.valor_lance_recurso_proprio, Decimal::ZERO);
    assert_eq!(r.percentual_lance_recurso_proprio, Decimal::ZERO);
    assert_eq!(r.credito_disponivel, dec!(174_703.125));
    assert!(r.credito_disponivel < dec!(250_000));

    // Diluted: 1 + 61 installments paid, 178 left
    assert_eq!(r.total_parcelas_pagas_no_lance, 62);
    assert_eq!(r.prazo_restante_final, 178);
    assert_eq!(r.saldo_devedor_base_final, dec!(295_015.625));
    assert_eq!(r.nova_parcela_pos_lance.round_dp(6), dec!(1657.391152));
}

#[test]
fn test_full_embedded_bid_envelope_warns_about_floor() {
    let input = SimulationInput::new(full_embedded_params()).unwrap();
    let out = calculate_bid_simulation(&input).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("own-resource contribution set to zero"));
}

// ===========================================================================
// Testable properties
// ===========================================================================

#[test]
fn test_determinism_across_plan_grid() {
    for params in plan_grid() {
        let input = SimulationInput::new(params).unwrap();
        let first = BidSimulationCalculator.compute(&input).unwrap();
        let second = BidSimulationCalculator.compute(&input).unwrap();
        assert_eq!(first, second);
        // Bit-identical, including decimal scale
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_credit_conservation_across_plan_grid() {
    for params in plan_grid() {
        let r = compute(params);
        assert_eq!(r.credito_disponivel, r.credito_contratado - r.valor_lance_embutido);
        assert!(r.valor_lance_recurso_proprio >= Decimal::ZERO);
    }
}

#[test]
fn test_invariant_rejection() {
    let mut p = baseline_params();
    p.valor_credito = Decimal::ZERO;
    assert_eq!(rejected_field(p), "valor_credito");

    let mut p = baseline_params();
    p.valor_credito = dec!(-1);
    assert_eq!(rejected_field(p), "valor_credito");

    let mut p = baseline_params();
    p.prazo_meses = 0;
    assert_eq!(rejected_field(p), "prazo_meses");

    let mut p = baseline_params();
    p.taxa_administracao_total = dec!(-0.01);
    assert_eq!(rejected_field(p), "taxa_administracao_total");

    let mut p = baseline_params();
    p.assembleia_atual = 241;
    assert_eq!(rejected_field(p), "assembleia_atual");

    let mut p = baseline_params();
    p.percentual_lance_embutido = dec!(0.31);
    assert_eq!(rejected_field(p), "percentual_lance_embutido");
}

#[test]
fn test_terminal_edge_at_last_assembly() {
    for dilution in BidDilution::ALL {
        let r = compute(SimulationParams {
            assembleia_atual: 240,
            opcao_diluir_lance: dilution,
            ..baseline_params()
        });
        assert_eq!(r.taxa_amortizacao_mensal_pos_assembleia, Decimal::ZERO);
        assert_eq!(r.valor_parcela_base_pos_assembleia, Decimal::ZERO);
        assert_eq!(r.nova_parcela_base, Decimal::ZERO);
        assert_eq!(r.qtd_parcelas_lance_embutido, 0);
        assert!(r.prazo_restante_final <= 0);
    }
}

#[test]
fn test_terminal_edge_with_insurance_keeps_only_insurance() {
    let r = compute(SimulationParams {
        assembleia_atual: 240,
        opcao_seguro_prestamista: CreditInsurance::Auto,
        ..no_bid_params()
    });
    assert_eq!(r.nova_parcela_base, Decimal::ZERO);
    assert_eq!(
        r.nova_parcela_pos_lance,
        reference_rates().taxa_seguro_auto * r.saldo_devedor_base_final
    );
}

#[test]
fn test_no_bid_baseline_is_pre_bid_amortization() {
    // Exact case: every division terminates
    let r = compute(SimulationParams {
        assembleia_atual: 10,
        ..no_bid_params()
    });
    assert_eq!(r.nova_parcela_pos_lance, r.valor_parcela_base_pos_assembleia);
    assert_eq!(r.nova_parcela_pos_lance, dec!(1234.375));
    assert_eq!(r.prazo_restante_final, 230);

    // Non-terminating divisions agree to far below a cent
    let plans = [
        (dec!(0.17), 180, 7),
        (dec!(0.21), 97, 13),
        (dec!(0.0), 61, 60),
    ];
    for (taxa, prazo, assembleia) in plans {
        for dilution in BidDilution::ALL {
            let r = compute(SimulationParams {
                taxa_administracao_total: taxa,
                prazo_meses: prazo,
                assembleia_atual: assembleia,
                opcao_diluir_lance: dilution,
                ..no_bid_params()
            });
            assert_eq!(r.valor_lance_ofertado_total, Decimal::ZERO);
            assert_eq!(r.valor_lance_embutido, Decimal::ZERO);
            assert_eq!(
                r.nova_parcela_pos_lance.round_dp(10),
                r.valor_parcela_base_pos_assembleia.round_dp(10)
            );
        }
    }
}

#[test]
fn test_light_plan_lowers_initial_installment() {
    let full = compute(baseline_params());
    let light = compute(SimulationParams {
        opcao_plano_light: LightPlan::Light70,
        ..baseline_params()
    });
    assert_eq!(light.valor_parcela_inicial, full.valor_parcela_inicial * dec!(0.7));
}

#[test]
fn test_property_insurance_on_total_to_pay() {
    let r = compute(SimulationParams {
        opcao_seguro_prestamista: CreditInsurance::Property,
        ..baseline_params()
    });
    // 1234.375 + 0.000392 * 296250
    assert_eq!(r.valor_parcela_inicial, dec!(1234.375) + dec!(116.13));
}

#[test]
fn test_result_keeps_originating_input() {
    let input = SimulationInput::new(baseline_params()).unwrap();
    let r = BidSimulationCalculator.compute(&input).unwrap();
    assert_eq!(r.input, input);
}

#[test]
fn test_calculator_is_shareable_across_threads() {
    let input = SimulationInput::new(baseline_params()).unwrap();
    let expected = BidSimulationCalculator.compute(&input).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let input = input.clone();
            std::thread::spawn(move || BidSimulationCalculator.compute(&input).unwrap())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}
