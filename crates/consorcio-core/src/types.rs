use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Percentages as typed into a form (18.5 = 18.5%). Convert with [`percent_to_rate`].
pub type Percent = Decimal;

/// Month counts: plan term, assembly index, installment counts.
pub type Months = u32;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// 18.5 -> 0.185
pub fn percent_to_rate(pct: Percent) -> Rate {
    pct / Decimal::ONE_HUNDRED
}

/// 0.185 -> 18.5. `None` when the percentage overflows.
pub fn rate_to_percent(rate: Rate) -> Option<Percent> {
    rate.checked_mul(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_round_trip_is_exact() {
        assert_eq!(percent_to_rate(dec!(18.5)), dec!(0.185));
        assert_eq!(rate_to_percent(dec!(0.185)), Some(dec!(18.5)));
        assert_eq!(percent_to_rate(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_rate_to_percent_overflow_is_none() {
        assert_eq!(rate_to_percent(Decimal::MAX), None);
    }

    #[test]
    fn test_metadata_precision_label() {
        let out = with_metadata("m", &serde_json::json!({}), vec![], 0, 1u8);
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert_eq!(out.methodology, "m");
    }
}
