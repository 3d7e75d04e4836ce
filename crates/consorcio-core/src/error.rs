use std::fmt;

use thiserror::Error;

/// Stage in which an arithmetic fault surfaced. The first seven are the
/// stages of the bid computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationStage {
    BaseAmortization,
    InsuranceAndLightPlan,
    InitialInstallment,
    PostAssembly,
    BidSizing,
    Dilution,
    FinalBalance,
    FormConversion,
    InsightsAggregation,
}

impl fmt::Display for CalculationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalculationStage::BaseAmortization => "base amortization",
            CalculationStage::InsuranceAndLightPlan => "insurance and light plan",
            CalculationStage::InitialInstallment => "initial installment",
            CalculationStage::PostAssembly => "post-assembly recompute",
            CalculationStage::BidSizing => "bid sizing",
            CalculationStage::Dilution => "dilution and final term",
            CalculationStage::FinalBalance => "final balance",
            CalculationStage::FormConversion => "form conversion",
            CalculationStage::InsightsAggregation => "insights aggregation",
        };
        f.write_str(name)
    }
}

/// Low-level cause attached to a [`ConsorcioError::Calculation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticFault {
    #[error("decimal overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("value {0} is not representable as an installment count")]
    Unrepresentable(String),
}

#[derive(Debug, Error)]
pub enum ConsorcioError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Calculation error in {stage}: {reason}")]
    Calculation {
        stage: CalculationStage,
        reason: String,
        #[source]
        source: ArithmeticFault,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ConsorcioError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConsorcioError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn calculation(
        stage: CalculationStage,
        quantity: &str,
        source: ArithmeticFault,
    ) -> Self {
        ConsorcioError::Calculation {
            stage,
            reason: format!("cannot compute {quantity}"),
            source,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ConsorcioError::InvalidInput { .. })
    }

    pub fn is_calculation(&self) -> bool {
        matches!(self, ConsorcioError::Calculation { .. })
    }
}

impl From<serde_json::Error> for ConsorcioError {
    fn from(e: serde_json::Error) -> Self {
        ConsorcioError::SerializationError(e.to_string())
    }
}
