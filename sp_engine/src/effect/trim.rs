use crate::effect::{require_finite, EffectError};
use crate::sound::Sound;

/// Keeps the frames between `start` and `end` seconds. `end` past the end of the sound is clamped.
pub fn trim(sound: &Sound, start: f64, end: f64) -> Result<Sound, EffectError> {
    let start = require_finite("start time", start)?;
    let end = require_finite("end time", end)?;

    if start < 0.0 {
        return Err(EffectError::OutOfRange {
            parameter: "start time",
            value: start,
            expected: "a non-negative number of seconds",
        });
    }

    if end <= start {
        return Err(EffectError::OutOfRange {
            parameter: "end time",
            value: end,
            expected: "a time after the start time",
        });
    }

    let first = sound.secs_to_frames(start);
    if first >= sound.frames() {
        return Err(EffectError::OutOfRange {
            parameter: "start time",
            value: start,
            expected: "a time within the sound",
        });
    }

    let last = sound.secs_to_frames(end).min(sound.frames());
    let channels = sound.channels() as usize;
    let samples = sound.samples()[first * channels..last * channels].to_vec();

    Ok(sound.with_samples(samples))
}
