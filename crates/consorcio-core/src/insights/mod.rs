pub mod metrics;

pub use metrics::{calculate_insights, InsightsInput, InsightsOutput, SimulationRecord};
