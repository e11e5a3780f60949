pub mod echo;
pub mod fade;
pub mod filter;
pub mod reverse;
pub mod tempo;
pub mod trim;
pub mod volume;

use serde::{Deserialize, Serialize};

use crate::effect::EffectError::{InvalidNumber, UnknownEffect, WrongArgumentCount};
use crate::sound::{Sound, SoundError};

/// A whole-buffer transformation. Every variant produces a new sound and leaves its input alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Volume { factor: f64 },
    Tempo { factor: f64 },
    LowPass { cutoff: f64 },
    FadeIn { seconds: f64 },
    FadeOut { seconds: f64 },
    Reverse,
    Echo { delay: f64, attenuation: f64 },
    Trim { start: f64, end: f64 },
}

#[derive(thiserror::Error, Debug)]
pub enum EffectError {
    #[error("please enter a valid number for the {parameter} (got {value:?})")]
    InvalidNumber {
        parameter: &'static str,
        value: String,
    },

    #[error("{parameter} {value} is out of range (expected {expected})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("fade duration {seconds}s exceeds audio duration {duration}s")]
    FadeTooLong {
        seconds: f64,
        duration: f64,
    },

    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    #[error("{effect} takes {expected} argument(s), got {found}")]
    WrongArgumentCount {
        effect: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Fft(#[from] realfft::FftError),

    #[error(transparent)]
    Sound(#[from] SoundError),
}

impl Effect {
    pub fn apply(&self, sound: &Sound) -> Result<Sound, EffectError> {
        tracing::debug!(effect = ?self, frames = sound.frames(), "applying effect");

        match *self {
            Effect::Volume { factor } => volume::change_volume(sound, factor),
            Effect::Tempo { factor } => tempo::change_tempo(sound, factor),
            Effect::LowPass { cutoff } => filter::low_pass(sound, cutoff),
            Effect::FadeIn { seconds } => fade::fade_in(sound, seconds),
            Effect::FadeOut { seconds } => fade::fade_out(sound, seconds),
            Effect::Reverse => Ok(reverse::reverse(sound)),
            Effect::Echo { delay, attenuation } => echo::echo(sound, delay, attenuation),
            Effect::Trim { start, end } => trim::trim(sound, start, end),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Volume { .. } => "volume",
            Effect::Tempo { .. } => "tempo",
            Effect::LowPass { .. } => "low_pass",
            Effect::FadeIn { .. } => "fade_in",
            Effect::FadeOut { .. } => "fade_out",
            Effect::Reverse => "reverse",
            Effect::Echo { .. } => "echo",
            Effect::Trim { .. } => "trim",
        }
    }

    /// Builds an effect from its name and textual arguments, as typed by a user.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self, EffectError> {
        let effect = match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "volume" => {
                let [factor] = expect_args::<1>("volume", args)?;
                Effect::Volume { factor: parse_number("volume factor", factor)? }
            }
            "tempo" | "speed" => {
                let [factor] = expect_args::<1>("tempo", args)?;
                Effect::Tempo { factor: parse_number("speed factor", factor)? }
            }
            "low_pass" | "lowpass" | "noise_filter" => {
                let [cutoff] = expect_args::<1>("low_pass", args)?;
                Effect::LowPass { cutoff: parse_number("noise cutoff strength", cutoff)? }
            }
            "fade_in" => {
                let [seconds] = expect_args::<1>("fade_in", args)?;
                Effect::FadeIn { seconds: parse_number("duration", seconds)? }
            }
            "fade_out" => {
                let [seconds] = expect_args::<1>("fade_out", args)?;
                Effect::FadeOut { seconds: parse_number("duration", seconds)? }
            }
            "reverse" => {
                let [] = expect_args::<0>("reverse", args)?;
                Effect::Reverse
            }
            "echo" => {
                let [delay, attenuation] = expect_args::<2>("echo", args)?;
                Effect::Echo {
                    delay: parse_number("echo delay", delay)?,
                    attenuation: parse_number("echo attenuation", attenuation)?,
                }
            }
            "trim" => {
                let [start, end] = expect_args::<2>("trim", args)?;
                Effect::Trim {
                    start: parse_number("start time", start)?,
                    end: parse_number("end time", end)?,
                }
            }
            _ => return Err(UnknownEffect(name.to_string())),
        };

        Ok(effect)
    }
}

fn expect_args<'a, const N: usize>(effect: &'static str, args: &[&'a str]) -> Result<[&'a str; N], EffectError> {
    <[&str; N]>::try_from(args).map_err(|_| WrongArgumentCount {
        effect,
        expected: N,
        found: args.len(),
    })
}

pub(crate) fn parse_number(parameter: &'static str, text: &str) -> Result<f64, EffectError> {
    text.trim().parse::<f64>().map_err(|_| InvalidNumber {
        parameter,
        value: text.to_string(),
    })
}

pub(crate) fn require_finite(parameter: &'static str, value: f64) -> Result<f64, EffectError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EffectError::OutOfRange {
            parameter,
            value,
            expected: "a finite number",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Effect::parse("volume", &["0.5"]).unwrap(), Effect::Volume { factor: 0.5 });
        assert_eq!(Effect::parse("Fade-In", &[" 2 "]).unwrap(), Effect::FadeIn { seconds: 2.0 });
        assert_eq!(Effect::parse("noise_filter", &["0.3"]).unwrap(), Effect::LowPass { cutoff: 0.3 });
        assert_eq!(Effect::parse("reverse", &[]).unwrap(), Effect::Reverse);
        assert_eq!(
            Effect::parse("echo", &["0.25", "0.6"]).unwrap(),
            Effect::Echo { delay: 0.25, attenuation: 0.6 }
        );
    }

    #[test]
    fn test_parse_errors() {
        match Effect::parse("tempo", &["fast"]) {
            Err(InvalidNumber { parameter, value }) => {
                assert_eq!(parameter, "speed factor");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(
            Effect::parse("trim", &["1"]),
            Err(WrongArgumentCount { effect: "trim", expected: 2, found: 1 })
        ));
        assert!(matches!(Effect::parse("chorus", &[]), Err(UnknownEffect(_))));
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&Effect::LowPass { cutoff: 0.25 }).unwrap();
        assert_eq!(json, r#"{"type":"low_pass","cutoff":0.25}"#);

        let parsed: Effect = serde_json::from_str(r#"{"type":"reverse"}"#).unwrap();
        assert_eq!(parsed, Effect::Reverse);
    }

    #[test]
    fn test_apply_dispatch() {
        let sound = Sound::new(4, 1, vec![1, 2, 3, 4]).unwrap();
        let reversed = Effect::Reverse.apply(&sound).unwrap();
        assert_eq!(reversed.samples(), &[4, 3, 2, 1]);

        let louder = Effect::Volume { factor: 2.0 }.apply(&sound).unwrap();
        assert_eq!(louder.samples(), &[2, 4, 6, 8]);
    }
}
