pub mod clock;
pub mod effect;
pub mod player;
pub mod preset;
pub mod session;
pub mod sound;

pub use clock::{PlaybackClock, TransportState};
pub use effect::{Effect, EffectError};
pub use player::{Player, PlayerError};
pub use preset::{Preset, PresetError};
pub use session::{Session, SessionError};
pub use sound::{Sound, SoundError};

pub type Time = usize;  // in frames
