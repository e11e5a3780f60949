use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clock::TransportState;
use crate::effect::{Effect, EffectError};
use crate::player::{Player, PlayerError};
use crate::preset::{Preset, PresetError};
use crate::session::SessionError::{Busy, NotPlaying};
use crate::sound::{Sound, SoundError};

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Sound(#[from] SoundError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error("stop playback before applying {0}")]
    Busy(&'static str),

    #[error("you can't pause if the sound is not playing")]
    NotPlaying,
}

/// A loaded sound, the edits applied to it, and its playback.
///
/// Edits replace the current sound; the sound as loaded is kept so it can be restored.
pub struct Session {
    path: Option<PathBuf>,
    original: Arc<Sound>,
    current: Arc<Sound>,
    player: Option<Player>,
    volume: f32,
}

impl Session {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let sound = Sound::load_wav(path)?;

        tracing::info!(
            path = %path.display(),
            duration = sound.duration(),
            channels = sound.channels(),
            sample_rate = sound.sample_rate(),
            "file loaded"
        );

        let mut session = Self::from_sound(sound);
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    pub fn from_sound(sound: Sound) -> Self {
        let sound = Arc::new(sound);
        Self {
            path: None,
            original: Arc::clone(&sound),
            current: sound,
            player: None,
            volume: 1.0,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn sound(&self) -> &Sound {
        &self.current
    }

    pub fn original(&self) -> &Sound {
        &self.original
    }

    pub fn duration(&self) -> f64 {
        self.current.duration()
    }

    /// Replaces the current sound with the result of `effect`. Not allowed while playing or paused.
    pub fn apply(&mut self, effect: &Effect) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(Busy(effect.name()));
        }

        let sound = effect.apply(&self.current)?;
        tracing::info!(effect = effect.name(), frames = sound.frames(), "effect applied");
        self.replace(sound);
        Ok(())
    }

    pub fn apply_preset(&mut self, preset: &Preset) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(Busy("preset"));
        }

        let sound = preset.apply(&self.current)?;
        self.replace(sound);
        Ok(())
    }

    /// Restores the sound as it was loaded.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(Busy("reset"));
        }

        self.current = Arc::clone(&self.original);
        self.player = None;
        Ok(())
    }

    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        let path = path.as_ref();
        self.current.export_wav(path)?;
        tracing::info!(path = %path.display(), "exported");
        Ok(())
    }

    fn replace(&mut self, sound: Sound) {
        self.current = Arc::new(sound);
        // The stream renders a fixed sound, so it has to be rebuilt for the new one.
        self.player = None;
    }

    fn player(&mut self) -> Result<&Player, SessionError> {
        let player = match self.player.take() {
            Some(player) => player,
            None => {
                let player = Player::new(Arc::clone(&self.current))?;
                player.set_volume(self.volume)?;
                player
            }
        };

        Ok(self.player.insert(player))
    }

    /// Starts playback from the beginning, or resumes it when paused.
    pub fn play(&mut self) -> Result<(), SessionError> {
        let player = self.player()?;
        if player.state() != TransportState::Playing {
            player.play()?;
        }

        tracing::debug!(position = player.position(), "playing");
        Ok(())
    }

    /// Starts playback at `sec` seconds, or jumps there if already playing.
    pub fn play_from(&mut self, sec: f64) -> Result<(), SessionError> {
        let player = self.player()?;
        if player.state() == TransportState::Playing {
            player.seek(sec);
        } else {
            player.play_from(sec)?;
        }

        tracing::debug!(position = player.position(), "playing");
        Ok(())
    }

    pub fn toggle_pause(&self) -> Result<TransportState, SessionError> {
        match &self.player {
            Some(player) if self.is_active() => Ok(player.toggle()?),
            _ => Err(NotPlaying),
        }
    }

    pub fn stop(&mut self) {
        if let Some(player) = &self.player {
            player.stop();
            tracing::debug!("stopped");
        }
    }

    pub fn seek(&self, sec: f64) {
        if let Some(player) = &self.player {
            player.seek(sec);
        }
    }

    /// Play position in seconds, as reported by the output stream.
    pub fn position(&self) -> f64 {
        self.player.as_ref().map_or(0.0, |p| p.position())
    }

    pub fn state(&self) -> TransportState {
        self.player.as_ref().map_or(TransportState::Stopped, |p| p.state())
    }

    /// Playing or paused.
    pub fn is_active(&self) -> bool {
        matches!(self.state(), TransportState::Playing | TransportState::Paused)
    }

    pub fn is_finished(&self) -> bool {
        self.state() == TransportState::Finished
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), SessionError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlayerError::InvalidVolume(volume).into());
        }

        self.volume = volume;
        if let Some(player) = &self.player {
            player.set_volume(volume)?;
        }

        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}
