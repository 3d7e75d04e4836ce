pub mod insights;
pub mod simulation;
