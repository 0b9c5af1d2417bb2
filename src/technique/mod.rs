// Breathing technique module
// Catalog data and phase derivation

pub mod catalog;
pub mod phases;

pub use phases::{derive_phases, BreathingPhase, PhaseName, TechniqueError};
