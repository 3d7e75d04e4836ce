use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::{ArithmeticFault, CalculationStage, ConsorcioError};
use crate::simulation::SimulationInput;
use crate::types::*;
use crate::ConsorcioResult;

const REMOVED_CONSULTANT: &str = "Usuário Removido";
const NO_TEAM: &str = "Sem Equipe";

fn default_faixa_credito() -> Money {
    dec!(50_000)
}

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// One logged simulation, as loaded by the caller from its store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_cliente: Option<String>,
    pub input: SimulationInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsInput {
    pub records: Vec<SimulationRecord>,
    /// Restrict every view except the per-team one to this team.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipe: Option<String>,
    /// Width of the credit distribution buckets.
    #[serde(default = "default_faixa_credito")]
    pub faixa_credito: Money,
}

impl InsightsInput {
    /// Parse logged records, validating each record's parameters first so a
    /// broken plan reports `InvalidInput` instead of a serialization error.
    pub fn from_json(json: &str) -> ConsorcioResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(records) = value.get("records").and_then(|r| r.as_array()) {
            for params in records.iter().filter_map(|r| r.get("input")) {
                SimulationInput::from_value(params.clone())?;
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralMetrics {
    pub total_simulacoes: u64,
    pub media_credito: Money,
    pub media_prazo: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub data: NaiveDate,
    pub simulacoes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditBucket {
    /// Inclusive lower bound.
    pub faixa_inicio: Money,
    /// Exclusive upper bound.
    pub faixa_fim: Money,
    pub simulacoes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultantStats {
    pub consultor: String,
    pub simulacoes: u64,
    pub total_credito: Money,
    pub media_credito: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCount {
    pub equipe: String,
    pub simulacoes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsOutput {
    pub geral: GeneralMetrics,
    pub simulacoes_por_dia: Vec<DailyCount>,
    pub distribuicao_credito: Vec<CreditBucket>,
    pub simulacoes_por_consultor: Vec<ConsultantStats>,
    pub simulacoes_por_equipe: Vec<TeamCount>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Aggregate a batch of logged simulations into dashboard metrics.
pub fn calculate_insights(
    input: &InsightsInput,
) -> ConsorcioResult<ComputationOutput<InsightsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.faixa_credito <= Decimal::ZERO {
        return Err(ConsorcioError::invalid(
            "faixa_credito",
            "Credit bucket width must be positive.",
        ));
    }

    let scoped: Vec<&SimulationRecord> = match &input.equipe {
        Some(team) => input
            .records
            .iter()
            .filter(|r| r.equipe.as_deref() == Some(team.as_str()))
            .collect(),
        None => input.records.iter().collect(),
    };

    if scoped.is_empty() {
        warnings.push("No simulations in scope; metrics are zero.".into());
    }

    let output = InsightsOutput {
        geral: general_metrics(&scoped)?,
        simulacoes_por_dia: simulations_per_day(&scoped),
        distribuicao_credito: credit_distribution(&scoped, input.faixa_credito)?,
        simulacoes_por_consultor: consultant_stats(&scoped)?,
        simulacoes_por_equipe: team_counts(&input.records),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "equipe": input.equipe,
        "faixa_credito": input.faixa_credito.to_string(),
        "registros_total": input.records.len(),
        "registros_no_escopo": scoped.len(),
    });

    Ok(with_metadata(
        "Simulation insights (count / mean aggregation)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

pub fn general_metrics(records: &[&SimulationRecord]) -> ConsorcioResult<GeneralMetrics> {
    if records.is_empty() {
        return Ok(GeneralMetrics::default());
    }
    let n = Decimal::from(records.len() as u64);
    let mut total_credito = Decimal::ZERO;
    let mut total_prazo = Decimal::ZERO;
    for r in records {
        total_credito = add(total_credito, r.input.valor_credito(), "total_credito")?;
        total_prazo = add(
            total_prazo,
            Decimal::from(r.input.prazo_meses()),
            "total_prazo",
        )?;
    }
    Ok(GeneralMetrics {
        total_simulacoes: records.len() as u64,
        media_credito: div(total_credito, n, "media_credito")?,
        media_prazo: div(total_prazo, n, "media_prazo")?,
    })
}

pub fn simulations_per_day(records: &[&SimulationRecord]) -> Vec<DailyCount> {
    let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for r in records {
        *by_day.entry(r.timestamp.date()).or_default() += 1;
    }
    by_day
        .into_iter()
        .map(|(data, simulacoes)| DailyCount { data, simulacoes })
        .collect()
}

/// Fixed-width histogram of contracted credit; empty buckets are omitted.
pub fn credit_distribution(
    records: &[&SimulationRecord],
    width: Money,
) -> ConsorcioResult<Vec<CreditBucket>> {
    let mut buckets: BTreeMap<Decimal, u64> = BTreeMap::new();
    for r in records {
        let index = div(r.input.valor_credito(), width, "faixa_inicio")?.floor();
        let start = index
            .checked_mul(width)
            .ok_or_else(|| overflow("faixa_inicio"))?;
        *buckets.entry(start).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(start, simulacoes)| {
            add(start, width, "faixa_fim").map(|faixa_fim| CreditBucket {
                faixa_inicio: start,
                faixa_fim,
                simulacoes,
            })
        })
        .collect()
}

pub fn consultant_stats(records: &[&SimulationRecord]) -> ConsorcioResult<Vec<ConsultantStats>> {
    let mut by_consultant: BTreeMap<&str, (u64, Money)> = BTreeMap::new();
    for r in records {
        let name = r.consultor.as_deref().unwrap_or(REMOVED_CONSULTANT);
        let entry = by_consultant.entry(name).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = add(entry.1, r.input.valor_credito(), "total_credito")?;
    }
    let mut stats = by_consultant
        .into_iter()
        .map(|(name, (count, total))| {
            div(total, Decimal::from(count), "media_credito").map(|media_credito| {
                ConsultantStats {
                    consultor: name.to_string(),
                    simulacoes: count,
                    total_credito: total,
                    media_credito,
                }
            })
        })
        .collect::<ConsorcioResult<Vec<_>>>()?;
    // BTreeMap order breaks ties by name; the sort is stable
    stats.sort_by(|a, b| b.simulacoes.cmp(&a.simulacoes));
    Ok(stats)
}

pub fn team_counts(records: &[SimulationRecord]) -> Vec<TeamCount> {
    let mut by_team: BTreeMap<&str, u64> = BTreeMap::new();
    for r in records {
        *by_team
            .entry(r.equipe.as_deref().unwrap_or(NO_TEAM))
            .or_default() += 1;
    }
    let mut counts: Vec<TeamCount> = by_team
        .into_iter()
        .map(|(equipe, simulacoes)| TeamCount {
            equipe: equipe.to_string(),
            simulacoes,
        })
        .collect();
    counts.sort_by(|a, b| b.simulacoes.cmp(&a.simulacoes));
    counts
}

fn overflow(quantity: &str) -> ConsorcioError {
    ConsorcioError::calculation(
        CalculationStage::InsightsAggregation,
        quantity,
        ArithmeticFault::Overflow,
    )
}

fn add(a: Decimal, b: Decimal, quantity: &str) -> ConsorcioResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(quantity))
}

/// `b` is a record count or the validated bucket width, never zero.
fn div(a: Decimal, b: Decimal, quantity: &str) -> ConsorcioResult<Decimal> {
    a.checked_div(b).ok_or_else(|| overflow(quantity))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
