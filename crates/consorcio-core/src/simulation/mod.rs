//! Consortium bid ("lance") simulation.
//!
//! [`SimulationInput`] is validated at construction; [`BidSimulationCalculator`]
//! turns it into a [`SimulationResult`] with no side effects.

pub mod calculator;
pub mod form;
pub mod input;
pub mod options;

pub use calculator::{calculate_bid_simulation, BidSimulationCalculator, SimulationResult};
pub use form::SimulationForm;
pub use input::{SimulationInput, SimulationParams};
pub use options::{BidDilution, CreditInsurance, InsuranceRates, LightPlan};
