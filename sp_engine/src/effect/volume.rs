use crate::effect::{require_finite, EffectError};
use crate::sound::{to_storage, Sound};

/// Scales every sample by `factor`. Results outside the `i16` range are clipped.
pub fn change_volume(sound: &Sound, factor: f64) -> Result<Sound, EffectError> {
    let factor = require_finite("volume factor", factor)?;

    let samples = sound.samples().iter()
        .map(|&s| to_storage(s as f64 * factor))
        .collect();

    Ok(sound.with_samples(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_factor_is_identity() {
        let sound = Sound::new(44100, 2, vec![0, 1, -1, 1000, i16::MIN, i16::MAX]).unwrap();
        assert_eq!(change_volume(&sound, 1.0).unwrap(), sound);
    }

    #[test]
    fn test_scale_truncates() {
        let sound = Sound::new(44100, 1, vec![3, -3, 100]).unwrap();
        let quieter = change_volume(&sound, 0.5).unwrap();
        assert_eq!(quieter.samples(), &[1, -1, 50]);
    }

    #[test]
    fn test_scale_clips() {
        let sound = Sound::new(44100, 1, vec![20000, -20000, 10]).unwrap();
        let louder = change_volume(&sound, 3.0).unwrap();
        assert_eq!(louder.samples(), &[i16::MAX, i16::MIN, 30]);
    }

    #[test]
    fn test_negative_factor_inverts() {
        let sound = Sound::new(44100, 1, vec![5, -7]).unwrap();
        assert_eq!(change_volume(&sound, -1.0).unwrap().samples(), &[-5, 7]);
    }

    #[test]
    fn test_rejects_non_finite() {
        let sound = Sound::new(44100, 1, vec![5]).unwrap();
        assert!(matches!(change_volume(&sound, f64::NAN), Err(EffectError::OutOfRange { .. })));
        assert!(matches!(change_volume(&sound, f64::INFINITY), Err(EffectError::OutOfRange { .. })));
    }
}
