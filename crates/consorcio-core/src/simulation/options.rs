use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

// ---------------------------------------------------------------------------
// Plan option codes
// ---------------------------------------------------------------------------
//
// The surrounding application stores and submits these options as small
// integer codes. They serialise as those codes; codes outside the known set
// are kept verbatim in `Other` and resolve to the documented fallback.

/// Reduced-installment ("plano light") variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum LightPlan {
    #[default]
    Full,
    Light50,
    Light60,
    Light70,
    Light80,
    Light90,
    Other(u8),
}

impl LightPlan {
    pub const ALL: [LightPlan; 6] = [
        LightPlan::Full,
        LightPlan::Light50,
        LightPlan::Light60,
        LightPlan::Light70,
        LightPlan::Light80,
        LightPlan::Light90,
    ];

    /// Discount applied to the base installment. Unknown codes pay the full
    /// installment.
    pub fn factor(self) -> Decimal {
        match self {
            LightPlan::Full | LightPlan::Other(_) => Decimal::ONE,
            LightPlan::Light50 => dec!(0.5),
            LightPlan::Light60 => dec!(0.6),
            LightPlan::Light70 => dec!(0.7),
            LightPlan::Light80 => dec!(0.8),
            LightPlan::Light90 => dec!(0.9),
        }
    }

    pub fn code(self) -> u8 {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            LightPlan::Full | LightPlan::Other(_) => "100%",
            LightPlan::Light50 => "50%",
            LightPlan::Light60 => "60%",
            LightPlan::Light70 => "70%",
            LightPlan::Light80 => "80%",
            LightPlan::Light90 => "90%",
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, LightPlan::Other(_))
    }
}

impl From<u8> for LightPlan {
    fn from(code: u8) -> Self {
        match code {
            1 => LightPlan::Full,
            2 => LightPlan::Light50,
            3 => LightPlan::Light60,
            4 => LightPlan::Light70,
            5 => LightPlan::Light80,
            6 => LightPlan::Light90,
            other => LightPlan::Other(other),
        }
    }
}

impl From<LightPlan> for u8 {
    fn from(plan: LightPlan) -> Self {
        match plan {
            LightPlan::Full => 1,
            LightPlan::Light50 => 2,
            LightPlan::Light60 => 3,
            LightPlan::Light70 => 4,
            LightPlan::Light80 => 5,
            LightPlan::Light90 => 6,
            LightPlan::Other(code) => code,
        }
    }
}

/// Credit life insurance rider ("seguro prestamista").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum CreditInsurance {
    #[default]
    None,
    Auto,
    Property,
    Other(u8),
}

impl CreditInsurance {
    pub const ALL: [CreditInsurance; 3] = [
        CreditInsurance::None,
        CreditInsurance::Auto,
        CreditInsurance::Property,
    ];

    /// (auto, property) selector flags. At most one is set.
    pub fn flags(self) -> (Decimal, Decimal) {
        match self {
            CreditInsurance::Auto => (Decimal::ONE, Decimal::ZERO),
            CreditInsurance::Property => (Decimal::ZERO, Decimal::ONE),
            CreditInsurance::None | CreditInsurance::Other(_) => (Decimal::ZERO, Decimal::ZERO),
        }
    }

    pub fn code(self) -> u8 {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            CreditInsurance::Auto => "Auto",
            CreditInsurance::Property => "Imóvel",
            CreditInsurance::None | CreditInsurance::Other(_) => "Sem Seguro",
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, CreditInsurance::Other(_))
    }
}

impl From<u8> for CreditInsurance {
    fn from(code: u8) -> Self {
        match code {
            0 => CreditInsurance::None,
            1 => CreditInsurance::Auto,
            2 => CreditInsurance::Property,
            other => CreditInsurance::Other(other),
        }
    }
}

impl From<CreditInsurance> for u8 {
    fn from(insurance: CreditInsurance) -> Self {
        match insurance {
            CreditInsurance::None => 0,
            CreditInsurance::Auto => 1,
            CreditInsurance::Property => 2,
            CreditInsurance::Other(code) => code,
        }
    }
}

/// Whether bid installments shorten the term ("diluir lance").
///
/// Code 2 is unassigned: the application only ever offered 1 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum BidDilution {
    /// Embedded-bid installments count as paid.
    #[default]
    Dilute,
    /// Offered-bid installments count as paid.
    DoNotDilute,
    Other(u8),
}

impl BidDilution {
    pub const ALL: [BidDilution; 2] = [BidDilution::Dilute, BidDilution::DoNotDilute];

    /// (dilute embedded, dilute offered) selector flags. At most one is set.
    pub fn flags(self) -> (Decimal, Decimal) {
        match self {
            BidDilution::Dilute => (Decimal::ONE, Decimal::ZERO),
            BidDilution::DoNotDilute => (Decimal::ZERO, Decimal::ONE),
            BidDilution::Other(_) => (Decimal::ZERO, Decimal::ZERO),
        }
    }

    pub fn code(self) -> u8 {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            BidDilution::Dilute => "Sim - Diluir Lance",
            BidDilution::DoNotDilute => "Não - Diluir Lance",
            BidDilution::Other(_) => "Sem Diluição",
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, BidDilution::Other(_))
    }
}

impl From<u8> for BidDilution {
    fn from(code: u8) -> Self {
        match code {
            1 => BidDilution::Dilute,
            3 => BidDilution::DoNotDilute,
            other => BidDilution::Other(other),
        }
    }
}

impl From<BidDilution> for u8 {
    fn from(dilution: BidDilution) -> Self {
        match dilution {
            BidDilution::Dilute => 1,
            BidDilution::DoNotDilute => 3,
            BidDilution::Other(code) => code,
        }
    }
}

// ---------------------------------------------------------------------------
// Insurance rates
// ---------------------------------------------------------------------------

pub const REFERENCE_TAXA_SEGURO_AUTO: Rate = dec!(0.000599);
pub const REFERENCE_TAXA_SEGURO_IMOVEL: Rate = dec!(0.000392);

/// Monthly insurance rates applied to the outstanding amount. Supplied by the
/// caller's configuration; the calculator never falls back to these defaults
/// on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceRates {
    pub taxa_seguro_auto: Rate,
    pub taxa_seguro_imovel: Rate,
}

impl Default for InsuranceRates {
    fn default() -> Self {
        InsuranceRates {
            taxa_seguro_auto: REFERENCE_TAXA_SEGURO_AUTO,
            taxa_seguro_imovel: REFERENCE_TAXA_SEGURO_IMOVEL,
        }
    }
}
