use crate::effect::{require_finite, EffectError};
use crate::sound::{to_storage, Sound};

/// `n` evenly spaced points from `start` to `end`, both inclusive. A single point is `start`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Ramps the first `seconds` of the sound up from silence.
pub fn fade_in(sound: &Sound, seconds: f64) -> Result<Sound, EffectError> {
    let fade_frames = fade_length(sound, seconds)?;
    Ok(apply_envelope(sound, 0, &linspace(0.0, 1.0, fade_frames)))
}

/// Ramps the last `seconds` of the sound down to silence.
pub fn fade_out(sound: &Sound, seconds: f64) -> Result<Sound, EffectError> {
    let fade_frames = fade_length(sound, seconds)?;
    let start = sound.frames() - fade_frames;
    Ok(apply_envelope(sound, start, &linspace(1.0, 0.0, fade_frames)))
}

fn fade_length(sound: &Sound, seconds: f64) -> Result<usize, EffectError> {
    let seconds = require_finite("duration", seconds)?;

    if seconds < 0.0 {
        return Err(EffectError::OutOfRange {
            parameter: "duration",
            value: seconds,
            expected: "a non-negative number of seconds",
        });
    }

    if seconds > sound.duration() {
        return Err(EffectError::FadeTooLong {
            seconds,
            duration: sound.duration(),
        });
    }

    Ok(sound.secs_to_frames(seconds).min(sound.frames()))
}

/// Multiplies frames `start..start + envelope.len()` by the envelope, one gain per frame.
fn apply_envelope(sound: &Sound, start: usize, envelope: &[f64]) -> Sound {
    let channels = sound.channels() as usize;
    let mut samples = sound.samples().to_vec();

    let faded = &mut samples[start * channels..(start + envelope.len()) * channels];
    for (frame, gain) in faded.chunks_exact_mut(channels).zip(envelope) {
        for sample in frame {
            *sample = to_storage(*sample as f64 * gain);
        }
    }

    sound.with_samples(samples)
}
