mod cli;

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use sp_engine::{Preset, Session, Sound, TransportState};

use crate::cli::{Cli, Commands, EffectArgs};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Watches the play position for a stream that stopped consuming frames while playing.
struct StallWatch {
    last_position: f64,
    still_for: Duration,
}

impl StallWatch {
    fn new() -> Self {
        Self {
            last_position: 0.0,
            still_for: Duration::ZERO,
        }
    }

    /// Records one poll. Returns true once the position has not moved for `STALL_TIMEOUT`.
    fn observe(&mut self, state: TransportState, position: f64, elapsed: Duration) -> bool {
        if state != TransportState::Playing || position != self.last_position {
            self.last_position = position;
            self.still_for = Duration::ZERO;
            return false;
        }

        self.still_for += elapsed;
        self.still_for >= STALL_TIMEOUT
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => info(&file),
        Commands::Process { input, output, effects } => process(&input, &output, &effects),
        Commands::Play { file, effects, volume_level, start } => play(&file, &effects, volume_level, start),
        Commands::Preset { output, effects } => write_preset(&output, &effects),
    }
}

fn info(path: &Path) -> Result<()> {
    let sound = Sound::load_wav(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    println!("file:        {}", path.display());
    println!("sample rate: {} Hz", sound.sample_rate());
    println!("channels:    {}", sound.channels());
    println!("frames:      {}", sound.frames());
    println!("duration:    {:.3} s", sound.duration());
    println!("peak:        {}", sound.peak());

    Ok(())
}

fn open_and_apply(path: &Path, effects: &EffectArgs) -> Result<Session> {
    let mut session = Session::open(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    for effect in &effects.effects {
        session.apply(effect)
            .with_context(|| format!("failed to apply {}", effect.name()))?;
    }

    if let Some(preset_path) = &effects.preset {
        let preset = Preset::load(preset_path)
            .with_context(|| format!("failed to load preset {}", preset_path.display()))?;
        session.apply_preset(&preset)?;
    }

    Ok(session)
}

fn process(input: &Path, output: &Path, effects: &EffectArgs) -> Result<()> {
    let session = open_and_apply(input, effects)?;
    session.export(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(())
}

fn play(path: &Path, effects: &EffectArgs, volume: f32, start: f64) -> Result<()> {
    let mut session = open_and_apply(path, effects)?;
    session.set_volume(volume)?;
    session.play_from(start).context("failed to start playback")?;

    let duration = session.duration();
    let mut since_report = Duration::ZERO;
    let mut watch = StallWatch::new();

    while !session.is_finished() {
        thread::sleep(POLL_INTERVAL);
        since_report += POLL_INTERVAL;

        if watch.observe(session.state(), session.position(), POLL_INTERVAL) {
            let position = session.position().min(duration);
            session.stop();
            bail!("output stream stopped at {position:.1} s");
        }

        if since_report >= REPORT_INTERVAL {
            since_report = Duration::ZERO;
            tracing::info!("{:.1} / {:.1} s", session.position().min(duration), duration);
        }
    }

    tracing::info!("finished playback");
    session.stop();
    Ok(())
}

fn write_preset(output: &Path, effects: &EffectArgs) -> Result<()> {
    let mut preset = Preset::new(effects.effects.clone());

    if let Some(base) = &effects.preset {
        let base = Preset::load(base)
            .with_context(|| format!("failed to load preset {}", base.display()))?;
        for effect in base.effects {
            preset.push(effect);
        }
    }

    if preset.is_empty() {
        tracing::warn!("writing a preset without effects");
    }

    preset.save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(effects = preset.effects.len(), path = %output.display(), "preset written");

    Ok(())
}
