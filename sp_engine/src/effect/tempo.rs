use realfft::num_complex::Complex;
use realfft::RealFftPlanner;

use crate::effect::{require_finite, EffectError};
use crate::sound::Sound;

/// Largest sample count a 16-bit WAV data chunk can hold.
const MAX_SAMPLES: usize = u32::MAX as usize / 2;

/// Speeds the sound up (`factor > 1`) or slows it down (`factor < 1`) by resampling every channel to
/// `frames / factor` frames. The sample rate is kept, so pitch moves with the tempo.
pub fn change_tempo(sound: &Sound, factor: f64) -> Result<Sound, EffectError> {
    let factor = require_finite("speed factor", factor)?;

    if factor <= 0.0 {
        return Err(EffectError::OutOfRange {
            parameter: "speed factor",
            value: factor,
            expected: "a positive number",
        });
    }

    let new_len = sound.frames() as f64 * (1.0 / factor);
    if new_len * sound.channels() as f64 > MAX_SAMPLES as f64 {
        return Err(EffectError::OutOfRange {
            parameter: "speed factor",
            value: factor,
            expected: "a factor whose result fits in a WAV file",
        });
    }

    let new_len = new_len as usize;
    tracing::debug!(from = sound.frames(), to = new_len, "resampling");

    let mut planner = RealFftPlanner::<f64>::new();
    let channel_data = sound.channel_data()
        .iter()
        .map(|channel| resample(&mut planner, channel, new_len))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Sound::from_channel_data(sound.sample_rate(), &channel_data)?)
}

/// Fourier-method resampling of one periodic, band-limited signal to `num` samples.
///
/// The spectrum is truncated or zero-padded to the new length. For an even-length shared spectrum
/// the Nyquist bin is doubled when shrinking and halved when growing, so that both halves of the
/// two-sided spectrum are accounted for.
pub fn resample(planner: &mut RealFftPlanner<f64>, input: &[f64], num: usize) -> Result<Vec<f64>, EffectError> {
    let len = input.len();
    if len == 0 || num == 0 {
        return Ok(vec![0.0; num]);
    }

    if num == len {
        return Ok(input.to_vec());
    }

    let forward = planner.plan_fft_forward(len);
    let mut scratch = input.to_vec();
    let mut spectrum = forward.make_output_vec();
    forward.process(&mut scratch, &mut spectrum)?;

    let shared = len.min(num);
    let mut resized = vec![Complex::new(0.0, 0.0); num / 2 + 1];
    resized[..shared / 2 + 1].copy_from_slice(&spectrum[..shared / 2 + 1]);

    if shared % 2 == 0 {
        if num < len {
            resized[shared / 2] *= 2.0;
        } else {
            resized[shared / 2] *= 0.5;
        }
    }

    // A real signal has no imaginary part at DC or at an even-length Nyquist bin.
    resized[0].im = 0.0;
    if num % 2 == 0 {
        resized[num / 2].im = 0.0;
    }

    let inverse = planner.plan_fft_inverse(num);
    let mut output = inverse.make_output_vec();
    inverse.process(&mut resized, &mut output)?;

    // The inverse transform is unnormalized; `1 / num` for the transform times `num / len` for the
    // change in length.
    let scale = 1.0 / len as f64;
    output.iter_mut().for_each(|s| *s *= scale);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn sine(len: usize, cycles: f64, amplitude: f64) -> Vec<f64> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * cycles * i as f64 / len as f64).sin())
            .collect()
    }

    fn sine_sound(len: usize, cycles: f64) -> Sound {
        let data = sine(len, cycles, 10000.0);
        Sound::from_channel_data(8000, &[data]).unwrap()
    }

    fn max_error(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
    }

    #[test]
    fn test_resample_preserves_periodic_shape() {
        let mut planner = RealFftPlanner::<f64>::new();
        let input = sine(64, 3.0, 1.0);

        let shorter = resample(&mut planner, &input, 32).unwrap();
        assert!(max_error(&shorter, &sine(32, 3.0, 1.0)) < 1e-9);

        let longer = resample(&mut planner, &input, 100).unwrap();
        assert!(max_error(&longer, &sine(100, 3.0, 1.0)) < 1e-9);
    }

    #[test]
    fn test_resample_odd_lengths() {
        let mut planner = RealFftPlanner::<f64>::new();
        let input = sine(63, 5.0, 1.0);

        let resampled = resample(&mut planner, &input, 41).unwrap();
        assert!(max_error(&resampled, &sine(41, 5.0, 1.0)) < 1e-9);
    }

    #[test]
    fn test_resample_constant() {
        let mut planner = RealFftPlanner::<f64>::new();
        let resampled = resample(&mut planner, &[0.5; 10], 25).unwrap();
        assert!(resampled.iter().all(|s| (s - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_faster_tempo_shortens() {
        let sound = sine_sound(1000, 4.0);
        let faster = change_tempo(&sound, 2.0).unwrap();
        assert_eq!(faster.frames(), 500);
        assert_eq!(faster.sample_rate(), 8000);

        let expected = sine(500, 4.0, 10000.0);
        assert!(max_error(&faster.channel_data()[0], &expected) < 4.0);
    }

    #[test]
    fn test_slower_tempo_lengthens() {
        let sound = sine_sound(1000, 4.0);
        let slower = change_tempo(&sound, 0.5).unwrap();
        assert_eq!(slower.frames(), 2000);

        let expected = sine(2000, 4.0, 10000.0);
        assert!(max_error(&slower.channel_data()[0], &expected) < 4.0);
    }

    #[test]
    fn test_tempo_length_truncates() {
        let sound = Sound::new(8000, 2, vec![0; 2002]).unwrap();
        let faster = change_tempo(&sound, 3.0).unwrap();
        assert_eq!(faster.frames(), 333);
        assert_eq!(faster.channels(), 2);
    }

    #[test]
    fn test_tempo_edge_cases() {
        let empty = Sound::new(8000, 1, vec![]).unwrap();
        assert!(change_tempo(&empty, 2.0).unwrap().is_empty());

        let short = Sound::new(8000, 1, vec![1, 2]).unwrap();
        assert!(change_tempo(&short, 10.0).unwrap().is_empty());

        assert!(matches!(change_tempo(&short, 0.0), Err(EffectError::OutOfRange { .. })));
        assert!(matches!(change_tempo(&short, -1.0), Err(EffectError::OutOfRange { .. })));
    }

    #[test]
    fn test_tempo_rejects_oversized_result() {
        let sound = Sound::new(8000, 1, vec![1, 2, 3]).unwrap();
        assert!(matches!(
            change_tempo(&sound, 1e-300),
            Err(EffectError::OutOfRange { parameter: "speed factor", .. })
        ));

        let stereo = Sound::new(8000, 2, vec![0; 2000]).unwrap();
        assert!(change_tempo(&stereo, 1e-7).is_err());
        assert_eq!(change_tempo(&stereo, 0.1).unwrap().frames(), 10000);
    }
}
