use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, FromSample, Sample, SizedSample, StreamConfig};

use crate::clock::{ClockError, PlaybackClock, TransportState};
use crate::player::PlayerError::{InvalidVolume, NoOutputDevice, UnsupportedSampleFormat};
use crate::Sound;

#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("failed to query output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported output sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("invalid volume {0} (expected a value between 0.0 and 1.0)")]
    InvalidVolume(f32),

    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// Live output gain, shared with the audio callback as raw `f32` bits.
#[derive(Debug, Clone)]
struct Gain(Arc<AtomicU32>);

impl Gain {
    fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// The part of the player that runs on the audio thread.
struct Renderer {
    sound: Arc<Sound>,
    clock: Arc<PlaybackClock>,
    gain: Gain,
}

impl Renderer {
    /// Fills one device buffer. Frames are claimed from the clock, so the play cursor advances by
    /// exactly what was handed to the backend. Anything past the granted frames is silence.
    fn write_next_block<T>(&mut self, output: &mut [T])
        where
            T: Sample + FromSample<f32>,
    {
        let channels = self.sound.channels() as usize;
        let range = self.clock.advance(output.len() / channels);
        let source = &self.sound.samples()[range.start * channels..range.end * channels];
        let gain = self.gain.get();

        let (played, rest) = output.split_at_mut(source.len());
        for (out, &sample) in played.iter_mut().zip(source) {
            *out = T::from_sample(sample.to_sample::<f32>() * gain);
        }

        rest.fill(T::EQUILIBRIUM);
    }
}

/// Plays one sound on the default output device.
pub struct Player {
    clock: Arc<PlaybackClock>,
    gain: Gain,
    _stream: cpal::Stream,
}

impl Player {
    pub fn new(sound: Arc<Sound>) -> Result<Self, PlayerError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(NoOutputDevice)?;
        let supported = device.default_output_config()?;

        let config = StreamConfig {
            channels: sound.channels(),
            sample_rate: cpal::SampleRate(sound.sample_rate()),
            buffer_size: BufferSize::Default,
        };

        let device_name = device.name().unwrap_or_default();
        tracing::info!(
            device = %device_name,
            channels = config.channels,
            sample_rate = config.sample_rate.0,
            format = ?supported.sample_format(),
            "opening output stream"
        );

        let clock = Arc::new(PlaybackClock::new(sound.sample_rate(), sound.frames()));
        let gain = Gain::new(1.0);
        let renderer = Renderer {
            sound,
            clock: Arc::clone(&clock),
            gain: gain.clone(),
        };

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, renderer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, renderer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, renderer)?,
            format => return Err(UnsupportedSampleFormat(format)),
        };

        stream.play()?;

        Ok(Self {
            clock,
            gain,
            _stream: stream,
        })
    }

    pub fn play(&self) -> Result<(), PlayerError> {
        Ok(self.clock.play()?)
    }

    /// Starts playing at `sec` seconds.
    pub fn play_from(&self, sec: f64) -> Result<(), PlayerError> {
        Ok(self.clock.play_from(self.secs_to_frames(sec))?)
    }

    pub fn pause(&self) -> Result<(), PlayerError> {
        Ok(self.clock.pause()?)
    }

    pub fn resume(&self) -> Result<(), PlayerError> {
        Ok(self.clock.resume()?)
    }

    pub fn toggle(&self) -> Result<TransportState, PlayerError> {
        Ok(self.clock.toggle()?)
    }

    pub fn stop(&self) {
        self.clock.stop();
    }

    /// Moves the play cursor to `sec` seconds.
    pub fn seek(&self, sec: f64) {
        self.clock.seek(self.secs_to_frames(sec));
    }

    fn secs_to_frames(&self, sec: f64) -> usize {
        (sec.max(0.0) * self.clock.sample_rate() as f64) as usize
    }

    pub fn position(&self) -> f64 {
        self.clock.position()
    }

    pub fn state(&self) -> TransportState {
        self.clock.state()
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn set_volume(&self, volume: f32) -> Result<(), PlayerError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(InvalidVolume(volume));
        }

        self.gain.set(volume);
        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.gain.get()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }
}

fn build_stream<T>(device: &cpal::Device, config: &StreamConfig, mut renderer: Renderer) -> Result<cpal::Stream, PlayerError>
    where
        T: SizedSample + FromSample<f32>,
{
    let stream = device.build_output_stream(
        config,
        move |output: &mut [T], _: &cpal::OutputCallbackInfo| renderer.write_next_block(output),
        |err| tracing::error!(%err, "output stream error"),
        None,
    )?;

    Ok(stream)
}
