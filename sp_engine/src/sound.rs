use std::path::Path;

use dasp::Sample;
use hound::SampleFormat;

use crate::sound::SoundError::{InvalidLayout, SoundReadError, SoundWriteError, UnsupportedSampleFormat};
use crate::Time;

/// Interleaved 16-bit audio. One frame holds `channels` consecutive samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
}

#[derive(thiserror::Error, Debug)]
pub enum SoundError {
    #[error("failed to read audio file: {source}")]
    SoundReadError {
        source: hound::Error,
    },

    #[error("failed to write audio file: {source}")]
    SoundWriteError {
        source: hound::Error,
    },

    #[error("unsupported sample format: {bits_per_sample}-bit {format:?}")]
    UnsupportedSampleFormat {
        bits_per_sample: u16,
        format: SampleFormat,
    },

    #[error("invalid sample layout: {0}")]
    InvalidLayout(String),
}

impl Sound {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Result<Self, SoundError> {
        if sample_rate == 0 {
            return Err(InvalidLayout("sample rate must be positive".to_string()));
        }

        if channels == 0 {
            return Err(InvalidLayout("channel count must be positive".to_string()));
        }

        if samples.len() % channels as usize != 0 {
            return Err(InvalidLayout(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// Builds a sound from per-channel data, truncating each value toward zero and saturating at
    /// the `i16` range.
    ///
    /// All channels must have the same length.
    pub fn from_channel_data(sample_rate: u32, channel_data: &[Vec<f64>]) -> Result<Self, SoundError> {
        let channels = channel_data.len();
        let frames = channel_data.first().map_or(0, |c| c.len());

        if channel_data.iter().any(|c| c.len() != frames) {
            return Err(InvalidLayout("channels have different lengths".to_string()));
        }

        let mut samples = Vec::with_capacity(frames * channels);
        for frame in 0..frames {
            for channel in channel_data {
                samples.push(to_storage(channel[frame]));
            }
        }

        Self::new(sample_rate, channels as u16, samples)
    }

    pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<Self, SoundError> {
        let reader = hound::WavReader::open(path).map_err(|e| SoundReadError { source: e })?;
        let spec = reader.spec();

        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, bits @ 1..=32) => reader.into_samples::<i32>()
                .map(|s| s.map(|s| rescale_int(s, bits)))
                .collect::<Result<Vec<_>, _>>(),
            (SampleFormat::Float, 32) => reader.into_samples::<f32>()
                .map(|s| s.map(|s| s.to_sample::<i16>()))
                .collect::<Result<Vec<_>, _>>(),
            (format, bits_per_sample) => return Err(UnsupportedSampleFormat { bits_per_sample, format }),
        }.map_err(|e| SoundReadError { source: e })?;

        tracing::debug!(
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            bits = spec.bits_per_sample,
            samples = samples.len(),
            "loaded wav"
        );

        Self::new(spec.sample_rate, spec.channels, samples)
    }

    pub fn export_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), SoundError> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(|e| SoundWriteError { source: e })?;

        for &sample in &self.samples {
            writer.write_sample(sample).map_err(|e| SoundWriteError { source: e })?;
        }

        writer.finalize().map_err(|e| SoundWriteError { source: e })?;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn frames(&self) -> Time {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn secs_to_frames(&self, sec: f64) -> Time {
        (self.sample_rate as f64 * sec) as Time
    }

    pub fn peak(&self) -> i16 {
        self.samples.iter()
            .map(|s| s.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    /// Deinterleaves into one vector per channel.
    pub fn channel_data(&self) -> Vec<Vec<f64>> {
        let channels = self.channels as usize;
        (0..channels)
            .map(|c| {
                self.samples.iter()
                    .skip(c)
                    .step_by(channels)
                    .map(|&s| s as f64)
                    .collect()
            })
            .collect()
    }

    /// Iterates over frames as slices of `channels` samples.
    pub fn iter_frames(&self) -> impl DoubleEndedIterator<Item = &[i16]> + '_ {
        self.samples.chunks_exact(self.channels as usize)
    }

    /// Returns a sound with the same rate and channel count but different sample data.
    pub(crate) fn with_samples(&self, samples: Vec<i16>) -> Self {
        debug_assert_eq!(samples.len() % self.channels as usize, 0);
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples,
        }
    }
}

/// `astype(int16)` with clipping instead of wraparound. NaN maps to 0.
pub(crate) fn to_storage(value: f64) -> i16 {
    value as i16
}

fn rescale_int(sample: i32, bits: u16) -> i16 {
    if bits >= 16 {
        (sample >> (bits - 16)) as i16
    } else {
        (sample << (16 - bits)) as i16
    }
}
