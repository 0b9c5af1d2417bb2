// Audio synchronizer
// Owns the single output resource; at most one breath cue audible at a time

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use super::clip::{self, BreathClip};
use super::output::AudioOutput;
use super::synth;

/// Phases that make sound; holds stay silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreathCue {
    Inhale,
    Exhale,
}

impl BreathCue {
    pub fn frequency_hz(self) -> f32 {
        match self {
            BreathCue::Inhale => synth::INHALE_FREQ_HZ,
            BreathCue::Exhale => synth::EXHALE_FREQ_HZ,
        }
    }

    pub fn clip_name(self) -> &'static str {
        match self {
            BreathCue::Inhale => "inhale.wav",
            BreathCue::Exhale => "exhale.wav",
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
}

const DEFAULT_CLIP_DIR: &str = "assets/audio";
const FEED_CHUNK: usize = 2048;
const FEED_RETRY: Duration = Duration::from_millis(5);

pub struct AudioManager {
    output: Mutex<Option<AudioOutput>>,
    /// Normalized volume, retained while no output exists and across
    /// destroy/initialize cycles.
    volume: Mutex<f32>,
    use_recorded: AtomicBool,
    clip_dir: PathBuf,
    clips: Mutex<HashMap<BreathCue, Arc<BreathClip>>>,
    /// Bumped on every start/stop; a feeder that no longer matches abandons.
    playback_epoch: Arc<AtomicU64>,
}

impl AudioManager {
    pub fn new() -> Self {
        Self::with_clip_dir(PathBuf::from(DEFAULT_CLIP_DIR))
    }

    pub fn with_clip_dir(clip_dir: PathBuf) -> Self {
        Self {
            output: Mutex::new(None),
            volume: Mutex::new(0.7),
            use_recorded: AtomicBool::new(false),
            clip_dir,
            clips: Mutex::new(HashMap::new()),
            playback_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Acquire the output device. Idempotent: the first call creates the
    /// stream, later calls resume it if the platform suspended it. Safe to
    /// call before or after `stop`.
    pub fn initialize(&self) -> Result<(), AudioError> {
        let mut output = self.output.lock();
        match output.as_ref() {
            Some(out) => {
                out.resume();
                Ok(())
            }
            None => {
                let out = AudioOutput::new().map_err(AudioError::Unavailable)?;
                out.set_volume(*self.volume.lock());
                *output = Some(out);
                Ok(())
            }
        }
    }

    /// Volume as a percentage (0-100). Applied through the output's master
    /// gain, so sound already playing follows the change.
    pub fn set_volume(&self, percent: f32) {
        let normalized = (percent / 100.0).clamp(0.0, 1.0);
        *self.volume.lock() = normalized;
        if let Some(out) = self.output.lock().as_ref() {
            out.set_volume(normalized);
        }
    }

    /// Normalized volume in [0, 1].
    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    /// Toggle between synthetic tones and recorded breath clips.
    pub fn set_use_recorded(&self, enabled: bool) {
        self.use_recorded.store(enabled, Ordering::SeqCst);
    }

    pub fn use_recorded(&self) -> bool {
        self.use_recorded.load(Ordering::SeqCst)
    }

    /// Emit one sound spanning `duration_ms`, stopping whatever was still
    /// playing first. Without an initialized output this is a silent no-op:
    /// pacing never waits on audio.
    pub fn play_breath_sound(&self, cue: BreathCue, duration_ms: u64) -> Result<(), AudioError> {
        let output = self.output.lock();
        let Some(out) = output.as_ref() else {
            debug!("no audio output, skipping {cue:?} cue");
            return Ok(());
        };

        let samples = if self.use_recorded() {
            match self.recorded_samples(cue, duration_ms, out.sample_rate(), out.channels()) {
                Ok(samples) => samples,
                Err(e) => {
                    // Clip loading is non-critical; fall back for this cue.
                    warn!("breath clip for {cue:?} failed ({e}), falling back to tone");
                    synth::render_breath_tone(
                        cue.frequency_hz(),
                        duration_ms,
                        out.sample_rate(),
                        out.channels(),
                    )
                }
            }
        } else {
            synth::render_breath_tone(
                cue.frequency_hz(),
                duration_ms,
                out.sample_rate(),
                out.channels(),
            )
        };

        // Claim the single playback slot: supersede any running feeder and
        // flush what it already queued.
        let epoch = self.playback_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        out.clear();

        let writer = out.writer();
        let epochs = Arc::clone(&self.playback_epoch);
        std::thread::Builder::new()
            .name("breath-feeder".to_string())
            .spawn(move || {
                let mut remaining = &samples[..];
                while !remaining.is_empty() {
                    if epochs.load(Ordering::SeqCst) != epoch {
                        return; // superseded by a newer sound or a stop
                    }
                    let chunk = &remaining[..remaining.len().min(FEED_CHUNK)];
                    let written = writer.push(chunk);
                    if written > 0 {
                        remaining = &remaining[written..];
                    } else {
                        std::thread::sleep(FEED_RETRY);
                    }
                }
            })
            .map_err(|e| AudioError::Unavailable(format!("Failed to spawn feeder: {}", e)))?;

        Ok(())
    }

    /// Silence the active sound immediately. Safe when nothing is playing;
    /// synchronous so cancellation paths can rely on it.
    pub fn stop(&self) {
        self.playback_epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(out) = self.output.lock().as_ref() {
            out.clear();
        }
    }

    /// Release the output device entirely. Application shutdown only; a
    /// later `initialize` starts fresh.
    pub fn destroy(&self) {
        self.stop();
        *self.output.lock() = None;
    }

    fn recorded_samples(
        &self,
        cue: BreathCue,
        duration_ms: u64,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Vec<f32>, String> {
        let clip = self.clip_for(cue)?;
        let rate = clip::playback_rate(clip.native_duration_secs(), duration_ms);
        Ok(clip::stretch_for_output(&clip, rate, sample_rate, channels))
    }

    fn clip_for(&self, cue: BreathCue) -> Result<Arc<BreathClip>, String> {
        if let Some(clip) = self.clips.lock().get(&cue) {
            return Ok(Arc::clone(clip));
        }
        let path = self.clip_dir.join(cue.clip_name());
        let clip = Arc::new(clip::load_clip(&path)?);
        self.clips.lock().insert(cue, Arc::clone(&clip));
        Ok(clip)
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_normalized_and_clamped() {
        let manager = AudioManager::new();
        assert!((manager.volume() - 0.7).abs() < 1e-6);

        manager.set_volume(0.0);
        assert_eq!(manager.volume(), 0.0);

        manager.set_volume(100.0);
        assert_eq!(manager.volume(), 1.0);

        manager.set_volume(250.0);
        assert_eq!(manager.volume(), 1.0);
    }

    #[test]
    fn zero_volume_playback_is_silent_not_an_error() {
        let manager = AudioManager::new();
        manager.set_volume(0.0);
        // No output initialized in the test environment: the cue must still
        // be accepted without complaint.
        manager
            .play_breath_sound(BreathCue::Inhale, 2000)
            .expect("silent playback should not error");
    }

    #[test]
    fn stop_and_destroy_are_safe_when_idle() {
        let manager = AudioManager::new();
        manager.stop();
        manager.stop();
        manager.destroy();
    }

    #[test]
    fn recorded_mode_toggle_round_trips() {
        let manager = AudioManager::new();
        assert!(!manager.use_recorded());
        manager.set_use_recorded(true);
        assert!(manager.use_recorded());
        manager.set_use_recorded(false);
        assert!(!manager.use_recorded());
    }

    #[test]
    fn cue_frequencies_are_distinct() {
        assert_ne!(
            BreathCue::Inhale.frequency_hz(),
            BreathCue::Exhale.frequency_hz()
        );
    }

    #[test]
    fn missing_clip_reports_a_load_failure() {
        let manager = AudioManager::with_clip_dir(PathBuf::from("/nonexistent"));
        let err = manager.clip_for(BreathCue::Inhale).unwrap_err();
        assert!(err.contains("Failed to open clip"));
    }
}
