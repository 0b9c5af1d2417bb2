// Guided session module
// Phase sequencing, countdown state and the timer driver

pub mod engine;

pub use engine::{format_elapsed, SessionEngine, SessionSnapshot};
