// Session engine
// Drives the repeating phase countdown and keeps the observable state
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant, MissedTickBehavior};
use tracing::warn;

use crate::audio::manager::{AudioManager, BreathCue};
use crate::db::models::BreathingTechnique;
use crate::technique::phases::{derive_phases, BreathingPhase, PhaseName, TechniqueError};

/// The phase currently shown to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPhase {
    pub name: String,
    pub instruction: String,
}

/// Read-only view of the running session, shaped for the UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_playing: bool,
    pub technique_id: Option<String>,
    pub current_phase: Option<CurrentPhase>,
    /// Whole seconds left in the current phase, floored at zero.
    pub phase_remaining: u32,
    pub cycles_completed: u32,
    pub session_elapsed_secs: u64,
    /// `MM:SS`, minutes unbounded.
    pub session_elapsed: String,
}

struct Inner {
    technique: Option<BreathingTechnique>,
    phases: Vec<BreathingPhase>,
    current_phase_index: usize,
    phase_remaining: u32,
    cycles_completed: u32,
    session_elapsed: u64,
    is_playing: bool,
    /// Bumped by every play/pause/reset/technique switch. Timer callbacks
    /// re-check the epoch they were spawned under, so a superseded timer can
    /// never touch a newer session.
    epoch: u64,
    driver: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

/// Phase sequencer for one guided session. Owned by the composition root;
/// talks to the audio device only through the injected [`AudioManager`].
pub struct SessionEngine {
    inner: Arc<Mutex<Inner>>,
    audio: Arc<AudioManager>,
}

impl SessionEngine {
    pub fn new(audio: Arc<AudioManager>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                technique: None,
                phases: Vec::new(),
                current_phase_index: 0,
                phase_remaining: 0,
                cycles_completed: 0,
                session_elapsed: 0,
                is_playing: false,
                epoch: 0,
                driver: None,
                ticker: None,
            })),
            audio,
        }
    }

    /// Swap in a technique. Any running session is torn down first; stale
    /// cycle counts or mid-phase timers must not leak across techniques.
    /// Malformed techniques are rejected before any state changes.
    pub fn load_technique(&self, technique: &BreathingTechnique) -> Result<(), TechniqueError> {
        let phases = derive_phases(technique)?;
        self.reset();

        let mut inner = self.inner.lock();
        inner.technique = Some(technique.clone());
        inner.phases = phases;
        Ok(())
    }

    /// Start (or resume) pacing. Resuming re-enters the current phase with
    /// its full duration; partial countdown is not carried over a pause.
    /// Returns immediately after arming the timers.
    pub async fn play(&self) -> Result<()> {
        {
            let inner = self.inner.lock();
            if inner.technique.is_none() {
                anyhow::bail!("no technique selected");
            }
            if inner.is_playing {
                return Ok(());
            }
        }

        // Audio is best-effort: a missing output device never stalls pacing.
        if let Err(e) = self.audio.initialize() {
            warn!("continuing without sound: {e}");
        }

        let phase = {
            let mut inner = self.inner.lock();
            inner.epoch += 1;
            inner.is_playing = true;
            let epoch = inner.epoch;

            let phase = inner.phases[inner.current_phase_index].clone();
            inner.phase_remaining = remaining_secs(phase.duration_ms);

            inner.driver = Some(self.spawn_phase_driver(epoch, phase.duration_ms));
            inner.ticker = Some(self.spawn_elapsed_ticker(epoch));
            phase
        };

        trigger_audio(&self.audio, &phase);
        Ok(())
    }

    /// Stop pacing and silence audio. Idempotent; the pending phase advance
    /// and both one-second tickers are cancelled before this returns.
    pub fn pause(&self) {
        let (driver, ticker) = {
            let mut inner = self.inner.lock();
            if !inner.is_playing && inner.driver.is_none() && inner.ticker.is_none() {
                return;
            }
            inner.epoch += 1;
            inner.is_playing = false;
            (inner.driver.take(), inner.ticker.take())
        };

        if let Some(handle) = driver {
            handle.abort();
        }
        if let Some(handle) = ticker {
            handle.abort();
        }
        self.audio.stop();
    }

    /// Back to idle: first phase, zeroed counters.
    pub fn reset(&self) {
        self.pause();

        let mut inner = self.inner.lock();
        inner.current_phase_index = 0;
        inner.phase_remaining = 0;
        inner.cycles_completed = 0;
        inner.session_elapsed = 0;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        let current_phase = inner
            .phases
            .get(inner.current_phase_index)
            .map(|phase| CurrentPhase {
                name: phase.name.to_string(),
                instruction: phase.instruction.to_string(),
            });

        SessionSnapshot {
            is_playing: inner.is_playing,
            technique_id: inner.technique.as_ref().map(|t| t.id.clone()),
            current_phase,
            phase_remaining: inner.phase_remaining,
            cycles_completed: inner.cycles_completed,
            session_elapsed_secs: inner.session_elapsed,
            session_elapsed: format_elapsed(inner.session_elapsed),
        }
    }

    /// One task per play(): for each phase, arm the advance deadline and a
    /// one-second countdown, then step to the next phase at the boundary.
    /// Replaces the chained one-shot timers of the obvious implementation;
    /// cancellation is the epoch check instead of a chain of handles.
    fn spawn_phase_driver(&self, epoch: u64, first_duration_ms: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let audio = Arc::clone(&self.audio);

        tokio::spawn(async move {
            let mut duration_ms = first_duration_ms;
            loop {
                let deadline = Instant::now() + Duration::from_millis(duration_ms);
                let mut countdown =
                    interval_at(Instant::now() + Duration::from_secs(1), Duration::from_secs(1));
                countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);

                let advance = sleep_until(deadline);
                tokio::pin!(advance);

                loop {
                    tokio::select! {
                        biased;
                        _ = &mut advance => break,
                        _ = countdown.tick() => {
                            let mut inner = inner.lock();
                            if inner.epoch != epoch {
                                return;
                            }
                            inner.phase_remaining = inner.phase_remaining.saturating_sub(1);
                        }
                    }
                }

                // Phase boundary: wrap the index, count the cycle, re-enter.
                let next = {
                    let mut inner = inner.lock();
                    if inner.epoch != epoch || !inner.is_playing {
                        return;
                    }
                    let next_index = (inner.current_phase_index + 1) % inner.phases.len();
                    if next_index == 0 {
                        inner.cycles_completed += 1;
                    }
                    inner.current_phase_index = next_index;
                    let phase = inner.phases[next_index].clone();
                    inner.phase_remaining = remaining_secs(phase.duration_ms);
                    phase
                };

                duration_ms = next.duration_ms;
                trigger_audio(&audio, &next);
            }
        })
    }

    fn spawn_elapsed_ticker(&self, epoch: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut tick =
                interval_at(Instant::now() + Duration::from_secs(1), Duration::from_secs(1));
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let mut inner = inner.lock();
                if inner.epoch != epoch {
                    return;
                }
                inner.session_elapsed += 1;
            }
        })
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        self.pause();
    }
}

fn trigger_audio(audio: &AudioManager, phase: &BreathingPhase) {
    let cue = match phase.name {
        PhaseName::Inhale => BreathCue::Inhale,
        PhaseName::Exhale => BreathCue::Exhale,
        PhaseName::Hold => return, // holds are silent
    };
    if let Err(e) = audio.play_breath_sound(cue, phase.duration_ms) {
        warn!("breath sound failed: {e}");
    }
}

fn remaining_secs(duration_ms: u64) -> u32 {
    duration_ms.div_ceil(1000) as u32
}

/// Zero-padded `MM:SS`; minutes keep growing past the hour.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
