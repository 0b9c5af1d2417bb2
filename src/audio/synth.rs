// Synthetic breath tones
// Sine voices shaped by a linear attack/hold/release envelope

pub const INHALE_FREQ_HZ: f32 = 220.0;
/// Lower than the inhale tone so the two directions stay audibly distinct.
pub const EXHALE_FREQ_HZ: f32 = 165.0;

/// Peak envelope level; the output's master gain is applied on top, so the
/// audible peak is volume x 0.3.
pub const TONE_PEAK: f32 = 0.3;
const RAMP_SECS: f32 = 0.1;

/// Envelope level `t_secs` into a tone lasting `duration_secs`: silence up
/// to `TONE_PEAK` over the first 0.1s, hold, back to silence over the final
/// 0.1s. Tones shorter than both ramps shrink them to half the duration.
pub fn envelope_gain(t_secs: f32, duration_secs: f32) -> f32 {
    if duration_secs <= 0.0 || t_secs < 0.0 || t_secs > duration_secs {
        return 0.0;
    }
    let ramp = RAMP_SECS.min(duration_secs / 2.0);
    if t_secs < ramp {
        TONE_PEAK * (t_secs / ramp)
    } else if t_secs > duration_secs - ramp {
        TONE_PEAK * ((duration_secs - t_secs) / ramp)
    } else {
        TONE_PEAK
    }
}

/// Render one breath tone as interleaved samples at the output format.
pub fn render_breath_tone(
    freq_hz: f32,
    duration_ms: u64,
    sample_rate: u32,
    channels: u16,
) -> Vec<f32> {
    let duration_secs = duration_ms as f32 / 1000.0;
    let frames = (duration_secs * sample_rate as f32).round() as usize;
    let mut samples = Vec::with_capacity(frames * channels as usize);

    for frame in 0..frames {
        let t = frame as f32 / sample_rate as f32;
        let value = (std::f32::consts::TAU * freq_hz * t).sin() * envelope_gain(t, duration_secs);
        for _ in 0..channels {
            samples.push(value);
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn envelope_ramps_holds_and_releases_over_two_seconds() {
        let volume = 0.7f32;
        assert_eq!(envelope_gain(0.0, 2.0) * volume, 0.0);
        assert!((envelope_gain(0.1, 2.0) * volume - volume * 0.3).abs() < EPSILON);
        assert!((envelope_gain(1.0, 2.0) * volume - volume * 0.3).abs() < EPSILON);
        assert!((envelope_gain(1.9, 2.0) * volume - volume * 0.3).abs() < EPSILON);
        assert!((envelope_gain(2.0, 2.0) * volume).abs() < EPSILON);
    }

    #[test]
    fn envelope_ramp_is_linear() {
        assert!((envelope_gain(0.05, 2.0) - 0.15).abs() < EPSILON);
        assert!((envelope_gain(1.95, 2.0) - 0.15).abs() < EPSILON);
    }

    #[test]
    fn envelope_is_silent_outside_the_tone() {
        assert_eq!(envelope_gain(-0.5, 2.0), 0.0);
        assert_eq!(envelope_gain(2.5, 2.0), 0.0);
        assert_eq!(envelope_gain(0.5, 0.0), 0.0);
    }

    #[test]
    fn short_tones_shrink_the_ramps() {
        // 100ms tone: both ramps collapse to 50ms, peak still reached mid-tone
        assert!((envelope_gain(0.05, 0.1) - TONE_PEAK).abs() < EPSILON);
        assert_eq!(envelope_gain(0.0, 0.1), 0.0);
    }

    #[test]
    fn render_spans_the_requested_duration() {
        let samples = render_breath_tone(INHALE_FREQ_HZ, 2000, 8000, 2);
        assert_eq!(samples.len(), 2 * 8000 * 2);
    }

    #[test]
    fn render_never_exceeds_the_envelope_peak() {
        let samples = render_breath_tone(EXHALE_FREQ_HZ, 1500, 8000, 1);
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= TONE_PEAK + EPSILON);
        assert!(peak > 0.1, "tone should actually make sound, peak={peak}");
    }

    #[test]
    fn render_duplicates_frames_across_channels() {
        let samples = render_breath_tone(INHALE_FREQ_HZ, 500, 4000, 2);
        for frame in samples.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn inhale_and_exhale_pitches_differ() {
        assert!(EXHALE_FREQ_HZ < INHALE_FREQ_HZ);
    }
}
