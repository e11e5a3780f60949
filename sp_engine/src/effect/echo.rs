use crate::effect::{require_finite, EffectError};
use crate::sound::{to_storage, Sound};

/// Mixes in a copy of the sound delayed by `delay` seconds and scaled by `attenuation`.
pub fn echo(sound: &Sound, delay: f64, attenuation: f64) -> Result<Sound, EffectError> {
    let delay = require_finite("echo delay", delay)?;
    let attenuation = require_finite("echo attenuation", attenuation)?;

    if delay < 0.0 {
        return Err(EffectError::OutOfRange {
            parameter: "echo delay",
            value: delay,
            expected: "a non-negative number of seconds",
        });
    }

    let delay_frames = sound.secs_to_frames(delay);
    if delay_frames >= sound.frames() {
        return Ok(sound.clone());
    }

    let offset = delay_frames * sound.channels() as usize;
    let input = sound.samples();

    let samples = input.iter()
        .enumerate()
        .map(|(i, &s)| match i.checked_sub(offset) {
            Some(j) => to_storage(s as f64 + attenuation * input[j] as f64),
            None => s,
        })
        .collect();

    Ok(sound.with_samples(samples))
}
