//! Game state and session bookkeeping
//!
//! [`GameSession`] is the score/flags side of a round and is what collision
//! callbacks get to mutate. [`GameState`] bundles it with the physics world,
//! the drop controller and the seeded RNG.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::kind::FruitKind;
use super::outline::OutlineTable;
use super::spawn::{DropController, NextFruitPreview};
use crate::audio::{MusicCommand, SoundEffect};
use crate::error::TuningError;
use crate::physics::{BodyId, World};
use crate::tuning::GameTuning;

/// What ended the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    /// Too many drops in a row found the drop site occupied
    SpawnBlocked,
    /// A fruit left the playfield
    OutOfBounds,
}

/// Things that happened during a frame, for audio and presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Merged {
        kind: FruitKind,
        /// `None` when two of the largest kind vanish
        into: Option<FruitKind>,
        position: Vec2,
        points: u32,
    },
    Dropped {
        kind: FruitKind,
        position: Vec2,
    },
    DropBlocked {
        failures: u32,
    },
    GameOver {
        cause: GameOverCause,
    },
    Sound(SoundEffect),
    Music(MusicCommand),
}

/// Snapshot shown in the game-over dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub score: u32,
    pub top_tier_merges: u32,
    pub high_score: u32,
}

/// Score, counters and flags for the current round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub score: u32,
    /// Best score seen this process
    pub high_score: u32,
    /// Merges of two largest-kind fruit
    pub top_tier_merges: u32,
    /// Consecutive blocked drops
    pub spawn_failures: u32,
    pub game_over: bool,
    pub game_over_cause: Option<GameOverCause>,
    /// The game-over cue already went out this round
    game_over_cue: bool,
    pub muted: bool,
    /// Title screen is up; nothing simulates until it is dismissed
    pub title: bool,
    /// Game-over dialog is up
    pub dialog: bool,
    pub debug: bool,
    pub summary: Option<RoundSummary>,
    /// Simulation frames since start
    pub time_ticks: u64,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            score: 0,
            high_score: 0,
            top_tier_merges: 0,
            spawn_failures: 0,
            game_over: false,
            game_over_cause: None,
            game_over_cue: false,
            muted: false,
            title: true,
            dialog: false,
            debug: false,
            summary: None,
            time_ticks: 0,
            events: Vec::new(),
        }
    }
}

impl GameSession {
    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Enter the terminal state. The cue (and, for blocked drops, the music
    /// stop) goes out at most once per round.
    pub fn signal_game_over(&mut self, cause: GameOverCause) {
        if !self.game_over {
            self.game_over = true;
            self.game_over_cause = Some(cause);
            log::info!("Game over ({:?}) with score {}", cause, self.score);
            self.push_event(GameEvent::GameOver { cause });
        }
        if !self.game_over_cue {
            self.game_over_cue = true;
            self.push_event(GameEvent::Sound(SoundEffect::GameOver));
            if cause == GameOverCause::SpawnBlocked {
                self.push_event(GameEvent::Music(MusicCommand::Stop));
            }
        }
    }

    /// Capture the dialog snapshot and fold the score into the high score
    pub fn prepare_summary(&mut self) -> RoundSummary {
        self.high_score = self.high_score.max(self.score);
        let summary = RoundSummary {
            score: self.score,
            top_tier_merges: self.top_tier_merges,
            high_score: self.high_score,
        };
        self.summary = Some(summary);
        self.dialog = true;
        summary
    }

    /// Clear everything round-scoped. High score, mute and debug survive.
    pub fn reset_round(&mut self) {
        self.score = 0;
        self.top_tier_merges = 0;
        self.spawn_failures = 0;
        self.game_over = false;
        self.game_over_cause = None;
        self.game_over_cue = false;
        self.dialog = false;
        self.summary = None;
        if !self.muted {
            self.push_event(GameEvent::Music(MusicCommand::Start));
        }
    }

    /// Muting stops the music, unmuting starts it
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        let command = if muted {
            MusicCommand::Stop
        } else {
            MusicCommand::Start
        };
        self.push_event(GameEvent::Music(command));
    }
}

/// Per-fruit render data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FruitSnapshot {
    pub body: BodyId,
    pub kind: FruitKind,
    pub position: Vec2,
    pub angle: f32,
}

/// Everything the simulation owns
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: GameTuning,
    pub world: World,
    pub session: GameSession,
    pub dropper: DropController,
    pub rng: Pcg32,
}

impl GameState {
    /// Default tuning and built-in outlines
    pub fn new(seed: u64) -> Self {
        Self::build(GameTuning::default(), OutlineTable::builtin(), seed)
    }

    /// Custom tuning and outlines. Fails when the tuning does not validate.
    pub fn with_tuning(
        tuning: GameTuning,
        outlines: OutlineTable,
        seed: u64,
    ) -> Result<Self, TuningError> {
        if let Err(err) = tuning.validate() {
            log::warn!("Rejected game tuning: {}", err);
            return Err(err);
        }
        Ok(Self::build(tuning, outlines, seed))
    }

    fn build(tuning: GameTuning, outlines: OutlineTable, seed: u64) -> Self {
        let world = World::new(&tuning.playfield, &tuning.physics, outlines);
        let dropper = DropController::new(&tuning);
        log::info!("New game (seed {})", seed);
        Self {
            seed,
            world,
            session: GameSession::default(),
            dropper,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
        }
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn high_score(&self) -> u32 {
        self.session.high_score
    }

    pub fn top_tier_merges(&self) -> u32 {
        self.session.top_tier_merges
    }

    pub fn spawn_failures(&self) -> u32 {
        self.session.spawn_failures
    }

    pub fn is_game_over(&self) -> bool {
        self.session.game_over
    }

    pub fn muted(&self) -> bool {
        self.session.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.session.set_muted(muted);
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.session.muted;
        self.session.set_muted(muted);
    }

    pub fn debug(&self) -> bool {
        self.session.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.session.debug = debug;
    }

    pub fn preview(&self) -> &NextFruitPreview {
        self.dropper.preview()
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.world.set_gravity(gravity);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.session.drain_events()
    }

    /// Leave the title screen and start the music
    pub fn start_new_round(&mut self) {
        if !self.session.title {
            return;
        }
        self.session.title = false;
        log::info!("Round started");
        if !self.session.muted {
            self.session.push_event(GameEvent::Music(MusicCommand::Start));
        }
    }

    /// Clear the playfield and every round counter. Fruit removal is queued
    /// and lands on the next step.
    pub fn restart(&mut self) {
        log::info!("Restarting round (last score {})", self.session.score);
        self.world.schedule_remove_all_fruits();
        self.dropper.reset_countdown();
        self.session.reset_round();
    }

    /// Kind, position and angle of every fruit, in body order
    pub fn fruit_snapshots(&self) -> Vec<FruitSnapshot> {
        self.world
            .bodies()
            .filter_map(|b| {
                b.kind().map(|kind| FruitSnapshot {
                    body: b.id,
                    kind,
                    position: b.position,
                    angle: b.angle,
                })
            })
            .collect()
    }

    /// World-space collision polygons, walls included, when debug is on
    pub fn debug_wireframe(&self) -> Vec<Vec<Vec2>> {
        if !self.session.debug {
            return Vec::new();
        }
        self.world.shape_outlines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_on_title() {
        let state = GameState::new(7);
        assert!(state.session.title);
        assert!(!state.is_game_over());
        assert_eq!(state.score(), 0);
        assert!(state.fruit_snapshots().is_empty());
    }

    #[test]
    fn test_custom_tuning_is_validated() {
        let mut tuning = GameTuning::default();
        tuning.spawn.margin = 300.0;
        let err = GameState::with_tuning(tuning, OutlineTable::builtin(), 1).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "spawn.margin", .. }));

        let mut tuning = GameTuning::default();
        tuning.physics.length_unit = 0.0;
        assert!(GameState::with_tuning(tuning, OutlineTable::builtin(), 1).is_err());

        let mut tuning = GameTuning::default();
        tuning.spawn.pool = vec![FruitKind::Apple];
        let state = GameState::with_tuning(tuning, OutlineTable::builtin(), 1).expect("valid");
        assert_eq!(state.preview().kind, FruitKind::Apple);
    }

    #[test]
    fn test_restart_discards_queued_drop() {
        let mut state = GameState::new(4);
        state
            .world
            .add_fruit(FruitKind::Grape, Vec2::new(100.0, 400.0), 0.0);
        state
            .world
            .schedule_add_fruit(FruitKind::Mandarin, Vec2::new(240.0, 10.0), 0.0);
        state.restart();
        state
            .world
            .step(1.0 / 60.0, &mut crate::physics::DefaultResponse);
        assert_eq!(state.world.fruit_count(), 0);
        assert!(state.world.pending().is_empty());
    }

    #[test]
    fn test_game_over_cue_fires_once() {
        let mut session = GameSession::default();
        session.signal_game_over(GameOverCause::SpawnBlocked);
        session.signal_game_over(GameOverCause::SpawnBlocked);
        session.signal_game_over(GameOverCause::OutOfBounds);
        let events = session.drain_events();
        let cues = events
            .iter()
            .filter(|e| **e == GameEvent::Sound(SoundEffect::GameOver))
            .count();
        let stops = events
            .iter()
            .filter(|e| **e == GameEvent::Music(MusicCommand::Stop))
            .count();
        assert_eq!(cues, 1);
        assert_eq!(stops, 1);
        assert_eq!(session.game_over_cause, Some(GameOverCause::SpawnBlocked));
    }

    #[test]
    fn test_out_of_bounds_does_not_stop_music() {
        let mut session = GameSession::default();
        session.signal_game_over(GameOverCause::OutOfBounds);
        assert!(
            !session
                .events()
                .contains(&GameEvent::Music(MusicCommand::Stop))
        );
    }

    #[test]
    fn test_summary_updates_high_score() {
        let mut session = GameSession {
            score: 120,
            high_score: 90,
            top_tier_merges: 2,
            ..Default::default()
        };
        let summary = session.prepare_summary();
        assert_eq!(summary.high_score, 120);
        assert_eq!(summary.top_tier_merges, 2);
        assert!(session.dialog);

        session.reset_round();
        session.score = 50;
        assert_eq!(session.prepare_summary().high_score, 120);
    }

    #[test]
    fn test_reset_round_keeps_high_score_and_mute() {
        let mut session = GameSession::default();
        session.set_muted(true);
        session.score = 300;
        session.prepare_summary();
        session.signal_game_over(GameOverCause::OutOfBounds);
        session.drain_events();

        session.reset_round();
        assert_eq!(session.score, 0);
        assert!(!session.game_over);
        assert!(!session.dialog);
        assert!(session.summary.is_none());
        assert_eq!(session.high_score, 300);
        assert!(session.muted);
        // Muted: no music start on restart
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_mute_toggle_controls_music() {
        let mut state = GameState::new(1);
        state.set_muted(true);
        state.set_muted(true);
        state.toggle_mute();
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::Music(MusicCommand::Stop),
                GameEvent::Music(MusicCommand::Start)
            ]
        );
    }

    #[test]
    fn test_debug_wireframe_only_when_enabled() {
        let mut state = GameState::new(1);
        assert!(state.debug_wireframe().is_empty());
        state.set_debug(true);
        // Four walls
        assert_eq!(state.debug_wireframe().len(), 4);
    }
}
