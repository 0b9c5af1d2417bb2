// Recorded breath clips
// WAV decode via Symphonia, time-stretched to the phase duration

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, AudioPlanes, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::debug;

/// A fully decoded clip, interleaved at its native rate.
#[derive(Debug)]
pub struct BreathClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl BreathClip {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    pub fn native_duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode a whole clip into memory. Breath clips are a few seconds of WAV,
/// so buffering the file beats streaming it.
pub fn load_clip(path: &Path) -> Result<BreathClip, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open clip {:?}: {}", path, e))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("Failed to probe clip format: {}", e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "No audio track found".to_string())?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| format!("Failed to create decoder: {}", e))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // End of stream
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(format!("Failed to read packet: {}", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_interleaved(&decoded, &mut samples),
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("decode error (skipping packet): {e}");
                continue;
            }
            Err(e) => return Err(format!("Decode failed: {}", e)),
        }
    }

    if samples.is_empty() {
        return Err("Clip decoded to zero samples".to_string());
    }

    Ok(BreathClip {
        samples,
        sample_rate,
        channels,
    })
}

/// Rate multiplier that makes a clip's audible span match the requested
/// phase duration.
pub fn playback_rate(native_secs: f64, target_duration_ms: u64) -> f64 {
    let target_secs = target_duration_ms as f64 / 1000.0;
    if target_secs <= 0.0 || native_secs <= 0.0 {
        return 1.0;
    }
    native_secs / target_secs
}

/// Resample a clip for the output device, sped up (or slowed down) by
/// `rate`. Linear interpolation; guide cues do not need mastering-grade
/// resampling. Mono clips are duplicated across output channels, extra
/// source channels beyond the output count are dropped.
pub fn stretch_for_output(
    clip: &BreathClip,
    rate: f64,
    out_sample_rate: u32,
    out_channels: u16,
) -> Vec<f32> {
    let src_frames = clip.frames();
    if src_frames == 0 || rate <= 0.0 || out_sample_rate == 0 {
        return Vec::new();
    }

    let step = rate * clip.sample_rate as f64 / out_sample_rate as f64;
    let out_frames = (src_frames as f64 / step).floor() as usize;
    let out_channels = out_channels as usize;

    let mut out = Vec::with_capacity(out_frames * out_channels);
    for i in 0..out_frames {
        let pos = i as f64 * step;
        let i0 = (pos.floor() as usize).min(src_frames - 1);
        let i1 = (i0 + 1).min(src_frames - 1);
        let frac = (pos - i0 as f64) as f32;
        for ch in 0..out_channels {
            let src_ch = ch.min(clip.channels - 1);
            let a = clip.samples[i0 * clip.channels + src_ch];
            let b = clip.samples[i1 * clip.channels + src_ch];
            out.push(a + (b - a) * frac);
        }
    }
    out
}

fn append_interleaved(buf: &AudioBufferRef, out: &mut Vec<f32>) {
    match buf {
        AudioBufferRef::F32(b) => push_frames(b.planes(), b.frames(), out, |s: f32| s),
        AudioBufferRef::S16(b) => {
            push_frames(b.planes(), b.frames(), out, |s: i16| s as f32 / 32768.0)
        }
        AudioBufferRef::S32(b) => push_frames(b.planes(), b.frames(), out, |s: i32| {
            s as f32 / 2147483648.0
        }),
        AudioBufferRef::U8(b) => push_frames(b.planes(), b.frames(), out, |s: u8| {
            (s as f32 - 128.0) / 128.0
        }),
        _ => debug!("unsupported sample format in clip, skipping packet"),
    }
}

fn push_frames<T: Sample + Copy>(
    planes: AudioPlanes<T>,
    frames: usize,
    out: &mut Vec<f32>,
    convert: impl Fn(T) -> f32,
) {
    let channels = planes.planes();
    if channels.is_empty() {
        return;
    }
    for frame in 0..frames {
        for ch in channels {
            out.push(convert(ch[frame]));
        }
    }
}
