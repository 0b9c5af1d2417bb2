// Audio synchronization module
// Synthetic breath tones and time-stretched recorded cues over cpal

pub mod clip;
pub mod manager;
pub mod output;
pub mod synth;

pub use manager::{AudioError, AudioManager, BreathCue};
