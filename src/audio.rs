//! Audio cues
//!
//! The simulation never plays sound itself. It emits [`GameEvent`]s; the
//! host drains them each frame and hands them to [`dispatch`] together with
//! whatever [`AudioSink`] it has (Web Audio, a native mixer, or nothing).

use serde::{Deserialize, Serialize};

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Two small or mid-sized fruit merged
    Merge,
    /// Two melons or two watermelons merged
    BigMerge,
    /// Round ended
    GameOver,
}

/// Background music control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicCommand {
    Start,
    Stop,
}

/// Something that can make noise
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
    fn start_music(&mut self);
    fn stop_music(&mut self);
}

/// Forward a frame's events to a sink. Effects are dropped while muted;
/// music commands always go through.
pub fn dispatch(events: &[GameEvent], muted: bool, sink: &mut dyn AudioSink) {
    for event in events {
        match event {
            GameEvent::Sound(effect) => {
                if !muted {
                    sink.play(*effect);
                }
            }
            GameEvent::Music(MusicCommand::Start) => sink.start_music(),
            GameEvent::Music(MusicCommand::Stop) => sink.stop_music(),
            _ => {}
        }
    }
}

/// Sink that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogSink;

impl AudioSink for LogSink {
    fn play(&mut self, effect: SoundEffect) {
        log::debug!("sfx: {:?}", effect);
    }

    fn start_music(&mut self) {
        log::debug!("music: start");
    }

    fn stop_music(&mut self) {
        log::debug!("music: stop");
    }
}

/// Sink that remembers everything it was asked to do
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingSink {
    pub played: Vec<SoundEffect>,
    pub music_starts: u32,
    pub music_stops: u32,
    /// Whether music is currently playing
    pub music_on: bool,
}

impl AudioSink for RecordingSink {
    fn play(&mut self, effect: SoundEffect) {
        self.played.push(effect);
    }

    fn start_music(&mut self) {
        self.music_starts += 1;
        self.music_on = true;
    }

    fn stop_music(&mut self) {
        self.music_stops += 1;
        self.music_on = false;
    }
}
