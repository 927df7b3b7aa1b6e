//! Suika Shaker - a tilt-driven fruit merging game
//!
//! Core modules:
//! - `physics`: Rigid-body world (convex polygons, contacts, sleeping, deferred mutations)
//! - `sim`: Deterministic game rules (merging, dropping, bounds, frame driver)
//! - `tuning`: Data-driven game balance
//! - `input`: Per-frame input and tilt-to-gravity mapping
//! - `audio`: Sound cue routing
//! - `ui`: Tap targets

pub mod audio;
pub mod error;
pub mod input;
pub mod physics;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use error::{OutlineError, TuningError};
pub use input::FrameInput;
pub use sim::{FruitKind, GameEvent, GameState, tick};
pub use tuning::GameTuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one step per 60 Hz frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Playfield dimensions in pixels
    pub const SCREEN_WIDTH: f32 = 480.0;
    pub const SCREEN_HEIGHT: f32 = 800.0;

    /// Downward gravity when no tilt sensor is present (pixels/s²)
    pub const DEFAULT_GRAVITY_Y: f32 = 500.0;
    /// Tilt reading to gravity multiplier
    pub const TILT_GRAVITY_SCALE: f32 = 100.0;

    /// Radius searched around the drop site for an existing fruit
    pub const SPAWN_CHECK_RADIUS: f32 = 40.0;
    /// Blocked drops in a row that end the round
    pub const MAX_SPAWN_FAILURES: u32 = 3;
    /// Frames between drop attempts
    pub const DROP_INTERVAL_TICKS: u32 = 45;
    /// Keep the random drop site this far from the edges
    pub const SPAWN_MARGIN: f32 = 50.0;
    /// Preview rotation per frame (radians)
    pub const PREVIEW_SPIN: f32 = 0.01;
}
