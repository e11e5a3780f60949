use std::{fs, io};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, EffectError};
use crate::preset::PresetError::{LoadPresetError, SavePresetError};
use crate::Sound;

/// An ordered chain of effects that can be stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub effects: Vec<Effect>,
}

#[derive(thiserror::Error, Debug)]
pub enum PresetError {
    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error("failed to deserialize preset at {line}:{column}: {message}")]
    LoadPresetError {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("failed to serialize preset: {message}")]
    SavePresetError {
        message: String,
    },

    #[error("effect {index} ({name}) failed: {source}")]
    EffectFailed {
        index: usize,
        name: &'static str,
        source: EffectError,
    },
}

impl Preset {
    pub fn new(effects: Vec<Effect>) -> Self {
        Self { effects }
    }

    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        serde_json::from_str(json)
            .map_err(|e| {
                LoadPresetError {
                    message: e.to_string(),
                    line: e.line(),
                    column: e.column(),
                }
            })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PresetError> {
        let serialized = fs::read_to_string(path)?;
        Self::from_json(&serialized)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PresetError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| {
                SavePresetError {
                    message: e.to_string()
                }
            })?;

        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Applies every effect in order, stopping at the first failure.
    pub fn apply(&self, sound: &Sound) -> Result<Sound, PresetError> {
        let mut current = sound.clone();

        for (index, effect) in self.effects.iter().enumerate() {
            current = effect.apply(&current)
                .map_err(|source| PresetError::EffectFailed {
                    index,
                    name: effect.name(),
                    source,
                })?;
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_in_order() {
        let sound = Sound::new(4, 1, vec![100, 200, 300, 400]).unwrap();
        let preset = Preset::new(vec![
            Effect::Reverse,
            Effect::Volume { factor: 0.5 },
            Effect::Trim { start: 0.25, end: 1.0 },
        ]);

        let result = preset.apply(&sound).unwrap();
        assert_eq!(result.samples(), &[150, 100, 50]);
    }

    #[test]
    fn test_apply_reports_failing_effect() {
        let sound = Sound::new(4, 1, vec![100; 4]).unwrap();
        let preset = Preset::new(vec![
            Effect::Reverse,
            Effect::FadeIn { seconds: 10.0 },
        ]);

        match preset.apply(&sound) {
            Err(PresetError::EffectFailed { index, name, source }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "fade_in");
                assert!(matches!(source, EffectError::FadeTooLong { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_preset_is_identity() {
        let sound = Sound::new(4, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(Preset::default().apply(&sound).unwrap(), sound);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets").join("warm.json");
        let preset = Preset::new(vec![
            Effect::LowPass { cutoff: 0.4 },
            Effect::FadeOut { seconds: 2.0 },
            Effect::Echo { delay: 0.3, attenuation: 0.5 },
        ]);

        preset.save(&path).unwrap();
        assert_eq!(Preset::load(&path).unwrap(), preset);
    }

    #[test]
    fn test_load_error_position() {
        let result = Preset::from_json("{\n  \"effects\": [\n    {\"type\": \"flanger\"}\n  ]\n}");
        match result {
            Err(LoadPresetError { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
