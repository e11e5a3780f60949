use crate::sound::Sound;

/// Reverses frame order. Samples within a frame keep their channel positions.
pub fn reverse(sound: &Sound) -> Sound {
    let samples = sound.iter_frames()
        .rev()
        .flatten()
        .copied()
        .collect();

    sound.with_samples(samples)
}
