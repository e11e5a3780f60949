use std::f64::consts::PI;

use realfft::num_complex::Complex;

use crate::effect::{require_finite, EffectError};
use crate::sound::Sound;

/// Filter order used for noise reduction.
pub const ORDER: usize = 5;

/// One second-order section in transposed direct form II, normalized so that `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Filter state after an infinitely long unit step, i.e. the state that produces no transient
    /// for a constant input.
    fn step_state(&self) -> [f64; 2] {
        let gain = self.dc_gain();
        let z1 = self.b[2] - self.a[2] * gain;
        let z0 = self.b[1] - self.a[1] * gain + z1;
        [z0, z1]
    }

    fn process(&self, state: &mut [f64; 2], x: f64) -> f64 {
        let y = self.b[0] * x + state[0];
        state[0] = self.b[1] * x - self.a[1] * y + state[1];
        state[1] = self.b[2] * x - self.a[2] * y;
        y
    }
}

/// Designs a digital Butterworth low-pass as cascaded second-order sections.
///
/// `cutoff` is normalized to the Nyquist frequency and must lie strictly between 0 and 1. The
/// analog prototype is pre-warped and mapped through the bilinear transform; every section has
/// unity gain at DC.
pub fn butterworth_lowpass(order: usize, cutoff: f64) -> Vec<Biquad> {
    debug_assert!(order > 0);
    debug_assert!(0.0 < cutoff && cutoff < 1.0);

    // Bilinear transform with fs = 2, so that the digital Nyquist frequency is 1.
    let fs2 = 4.0;
    let warped = fs2 * (PI * cutoff / 2.0).tan();
    let to_z = |p: Complex<f64>| (fs2 + p) / (fs2 - p);

    let mut sections = Vec::with_capacity((order + 1) / 2);

    for k in 0..order / 2 {
        let angle = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        let z = to_z(Complex::from_polar(warped, angle));

        let a = [1.0, -2.0 * z.re, z.norm_sqr()];
        let gain = a.iter().sum::<f64>() / 4.0;
        sections.push(Biquad {
            b: [gain, 2.0 * gain, gain],
            a,
        });
    }

    if order % 2 == 1 {
        let z = to_z(Complex::new(-warped, 0.0)).re;
        let gain = (1.0 - z) / 2.0;
        sections.push(Biquad {
            b: [gain, gain, 0.0],
            a: [1.0, -z, 0.0],
        });
    }

    sections
}

/// Runs `input` through the sections, starting each from its steady state for a constant signal
/// equal to `input[0]`.
fn cascade(sections: &[Biquad], input: &[f64]) -> Vec<f64> {
    let Some(&first) = input.first() else {
        return Vec::new();
    };

    let mut signal = input.to_vec();
    let mut level = first;

    for section in sections {
        let mut state = section.step_state().map(|z| z * level);
        signal.iter_mut().for_each(|s| *s = section.process(&mut state, *s));
        level *= section.dc_gain();
    }

    signal
}

/// Zero-phase filtering: the signal is run through the cascade forwards, then backwards.
///
/// The ends are extended by odd reflection so the filter settles before reaching real samples.
pub fn filtfilt(sections: &[Biquad], input: &[f64]) -> Vec<f64> {
    let len = input.len();
    if len == 0 {
        return Vec::new();
    }

    let first_order = sections.iter().filter(|s| s.b[2] == 0.0 && s.a[2] == 0.0).count();
    let order = 2 * sections.len() - first_order;
    let pad = (3 * (order + 1)).min(len - 1);
    let (first, last) = (input[0], input[len - 1]);

    let mut extended = Vec::with_capacity(len + 2 * pad);
    extended.extend(input[1..=pad].iter().rev().map(|s| 2.0 * first - s));
    extended.extend_from_slice(input);
    extended.extend(input[len - 1 - pad..len - 1].iter().rev().map(|s| 2.0 * last - s));

    let mut backward = cascade(sections, &extended);
    backward.reverse();
    let mut output = cascade(sections, &backward);
    output.reverse();

    output.drain(..pad);
    output.truncate(len);
    output
}

/// Removes content above `cutoff` (normalized to Nyquist) with a zero-phase Butterworth low-pass.
///
/// `cutoff` is clipped into `[0, 1]`; 1 leaves the sound untouched and 0 silences it.
pub fn low_pass(sound: &Sound, cutoff: f64) -> Result<Sound, EffectError> {
    let cutoff = require_finite("noise cutoff strength", cutoff)?.clamp(0.0, 1.0);

    if cutoff >= 1.0 {
        return Ok(sound.clone());
    }

    if cutoff <= 0.0 {
        return Ok(sound.with_samples(vec![0; sound.samples().len()]));
    }

    let sections = butterworth_lowpass(ORDER, cutoff);
    let channel_data: Vec<Vec<f64>> = sound.channel_data()
        .iter()
        .map(|channel| filtfilt(&sections, channel))
        .collect();

    Ok(Sound::from_channel_data(sound.sample_rate(), &channel_data)?)
}
