use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sp_engine::{Effect, EffectError};

#[derive(Parser)]
#[command(name = "sound-player")]
#[command(about = "Play and transform WAV files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print format and length of a WAV file
    Info {
        file: PathBuf,
    },

    /// Apply effects to a WAV file and write the result
    Process {
        input: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        effects: EffectArgs,
    },

    /// Apply effects to a WAV file and play it on the default output device
    Play {
        file: PathBuf,

        #[command(flatten)]
        effects: EffectArgs,

        /// Output volume between 0.0 and 1.0
        #[arg(long, default_value_t = 1.0)]
        volume_level: f32,

        /// Start position in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,
    },

    /// Write the given effects to a preset file
    Preset {
        output: PathBuf,

        #[command(flatten)]
        effects: EffectArgs,
    },
}

#[derive(Args)]
pub struct EffectArgs {
    /// Effect to apply, in order: volume=F, tempo=F, low_pass=CUTOFF, fade_in=SEC, fade_out=SEC,
    /// reverse, echo=DELAY,ATTENUATION, trim=START,END
    #[arg(short, long = "effect", value_name = "NAME[=ARGS]", value_parser = parse_effect)]
    pub effects: Vec<Effect>,

    /// JSON preset applied after the effects given on the command line
    #[arg(long)]
    pub preset: Option<PathBuf>,
}

fn parse_effect(text: &str) -> Result<Effect, EffectError> {
    let (name, args) = match text.split_once('=') {
        Some((name, args)) => (name, args.split(',').collect::<Vec<_>>()),
        None => (text, Vec::new()),
    };

    Effect::parse(name, &args)
}
