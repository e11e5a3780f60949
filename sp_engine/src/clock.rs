use std::ops::Range;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::clock::ClockError::{AlreadyPlaying, NotPaused, NotPlaying};
use crate::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
    /// The cursor reached the end while playing.
    Finished,
}

impl TransportState {
    fn to_u8(self) -> u8 {
        match self {
            TransportState::Stopped => 0,
            TransportState::Playing => 1,
            TransportState::Paused => 2,
            TransportState::Finished => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => TransportState::Playing,
            2 => TransportState::Paused,
            3 => TransportState::Finished,
            _ => TransportState::Stopped,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ClockError {
    #[error("you can't pause if the sound is not playing")]
    NotPlaying,

    #[error("the sound is not paused")]
    NotPaused,

    #[error("the sound is already playing")]
    AlreadyPlaying,
}

/// Play cursor shared between the audio callback and the controlling thread.
///
/// The position only moves when the output callback consumes frames through [`advance`], so it
/// reflects what the backend actually played rather than elapsed wall-clock time.
///
/// [`advance`]: PlaybackClock::advance
#[derive(Debug)]
pub struct PlaybackClock {
    sample_rate: u32,
    total: Time,
    state: AtomicU8,
    cursor: AtomicUsize,
}

impl PlaybackClock {
    pub fn new(sample_rate: u32, total: Time) -> Self {
        debug_assert!(sample_rate > 0);
        Self {
            sample_rate,
            total,
            state: AtomicU8::new(TransportState::Stopped.to_u8()),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TransportState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    fn transition(&self, from: TransportState, to: TransportState) -> bool {
        self.state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Starts from the beginning when stopped or finished, continues when paused.
    pub fn play(&self) -> Result<(), ClockError> {
        match self.state() {
            TransportState::Playing => Err(AlreadyPlaying),
            TransportState::Paused => self.resume(),
            TransportState::Stopped | TransportState::Finished => self.play_from(0),
        }
    }

    /// Starts playing at `time`, clamped to the end. The cursor is stored before the state flips.
    pub fn play_from(&self, time: Time) -> Result<(), ClockError> {
        if self.state() == TransportState::Playing {
            return Err(AlreadyPlaying);
        }

        self.cursor.store(time.min(self.total), Ordering::Release);
        self.set_state(TransportState::Playing);
        Ok(())
    }

    pub fn pause(&self) -> Result<(), ClockError> {
        if self.transition(TransportState::Playing, TransportState::Paused) {
            Ok(())
        } else {
            Err(NotPlaying)
        }
    }

    pub fn resume(&self) -> Result<(), ClockError> {
        if self.transition(TransportState::Paused, TransportState::Playing) {
            Ok(())
        } else {
            Err(NotPaused)
        }
    }

    /// Pauses a playing clock or resumes a paused one, returning the new state.
    pub fn toggle(&self) -> Result<TransportState, ClockError> {
        match self.state() {
            TransportState::Playing => self.pause().map(|_| TransportState::Paused),
            TransportState::Paused => self.resume().map(|_| TransportState::Playing),
            _ => Err(NotPlaying),
        }
    }

    pub fn stop(&self) {
        self.set_state(TransportState::Stopped);
        self.cursor.store(0, Ordering::Release);
    }

    /// Moves the cursor, clamped to the end. A finished clock becomes paused at the new position.
    pub fn seek(&self, time: Time) {
        let time = time.min(self.total);
        self.cursor.store(time, Ordering::Release);

        if time < self.total {
            self.transition(TransportState::Finished, TransportState::Paused);
        }
    }

    /// Claims up to `frames` frames for output and returns their range. Nothing is granted unless
    /// the clock is playing; reaching the end finishes the clock.
    pub fn advance(&self, frames: usize) -> Range<Time> {
        if self.state() != TransportState::Playing {
            let cursor = self.cursor();
            return cursor..cursor;
        }

        let total = self.total;
        let start = match self.cursor.fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
            Some(c.saturating_add(frames).min(total))
        }) {
            Ok(previous) | Err(previous) => previous,
        };
        let end = start.saturating_add(frames).min(total);

        if end >= total {
            self.transition(TransportState::Playing, TransportState::Finished);
        }

        start..end
    }

    pub fn cursor(&self) -> Time {
        self.cursor.load(Ordering::Acquire)
    }

    /// Play position in seconds.
    pub fn position(&self) -> f64 {
        self.cursor() as f64 / self.sample_rate as f64
    }

    pub fn total(&self) -> Time {
        self.total
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_finished(&self) -> bool {
        self.state() == TransportState::Finished
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_transport_transitions() {
        let clock = PlaybackClock::new(10, 100);
        assert_eq!(clock.state(), TransportState::Stopped);
        assert_eq!(clock.pause(), Err(NotPlaying));
        assert_eq!(clock.toggle(), Err(NotPlaying));

        clock.play().unwrap();
        assert_eq!(clock.play(), Err(AlreadyPlaying));
        assert_eq!(clock.resume(), Err(NotPaused));

        assert_eq!(clock.toggle(), Ok(TransportState::Paused));
        assert_eq!(clock.toggle(), Ok(TransportState::Playing));

        clock.stop();
        assert_eq!(clock.state(), TransportState::Stopped);
        assert_eq!(clock.cursor(), 0);
    }

    #[test]
    fn test_position_follows_consumed_frames() {
        let clock = PlaybackClock::new(10, 100);
        assert_eq!(clock.advance(5), 0..0);

        clock.play().unwrap();
        assert_eq!(clock.advance(15), 0..15);
        assert_eq!(clock.position(), 1.5);

        clock.pause().unwrap();
        assert_eq!(clock.advance(15), 15..15);
        assert_eq!(clock.position(), 1.5);

        clock.play().unwrap();
        assert_eq!(clock.advance(5), 15..20);
    }

    #[test]
    fn test_finishes_at_end() {
        let clock = PlaybackClock::new(10, 25);
        clock.play().unwrap();
        assert_eq!(clock.advance(20), 0..20);
        assert!(!clock.is_finished());

        assert_eq!(clock.advance(20), 20..25);
        assert!(clock.is_finished());
        assert_eq!(clock.advance(20), 25..25);

        // Playing again restarts from the top.
        clock.play().unwrap();
        assert_eq!(clock.cursor(), 0);
    }

    #[test]
    fn test_play_from() {
        let clock = PlaybackClock::new(10, 25);
        clock.play_from(12).unwrap();
        assert_eq!(clock.state(), TransportState::Playing);
        assert_eq!(clock.advance(5), 12..17);
        assert_eq!(clock.play_from(0), Err(AlreadyPlaying));

        clock.pause().unwrap();
        clock.play_from(3).unwrap();
        assert_eq!(clock.advance(2), 3..5);

        clock.stop();
        clock.play_from(100).unwrap();
        assert_eq!(clock.advance(5), 25..25);
        assert!(clock.is_finished());
    }

    #[test]
    fn test_seek() {
        let clock = PlaybackClock::new(10, 25);
        clock.play().unwrap();
        clock.advance(30);
        assert!(clock.is_finished());

        clock.seek(10);
        assert_eq!(clock.state(), TransportState::Paused);
        clock.resume().unwrap();
        assert_eq!(clock.advance(5), 10..15);

        clock.seek(1000);
        assert_eq!(clock.cursor(), 25);
    }

    #[test]
    fn test_concurrent_advance_never_overlaps() {
        let clock = Arc::new(PlaybackClock::new(48000, 10_000));
        clock.play().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                thread::spawn(move || {
                    let mut granted = 0;
                    loop {
                        let range = clock.advance(7);
                        if range.is_empty() {
                            break granted;
                        }
                        granted += range.len();
                    }
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 10_000);
        assert!(clock.is_finished());
    }
}
