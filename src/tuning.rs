//! Data-driven game balance
//!
//! Every knob the simulation reads lives here, grouped by concern. Missing
//! sections or fields in a JSON document fall back to the defaults below.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::TuningError;
use crate::sim::FruitKind;

/// Complete tuning document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameTuning {
    pub playfield: PlayfieldTuning,
    pub physics: PhysicsTuning,
    pub spawn: SpawnTuning,
    pub tilt: TiltTuning,
}

/// Playfield rectangle (pixels, y grows downward)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldTuning {
    pub width: f32,
    pub height: f32,
}

impl Default for PlayfieldTuning {
    fn default() -> Self {
        Self {
            width: consts::SCREEN_WIDTH,
            height: consts::SCREEN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Solver iterations per step
    pub iterations: u32,
    /// Gravity when no tilt reading is available (pixels/s²)
    pub gravity: Vec2,
    /// Seconds an island must stay idle before it sleeps
    pub sleep_time_threshold: f32,
    /// Speed below which a body counts as idle; 0 derives it from gravity
    pub idle_speed_threshold: f32,
    /// Fraction of velocity kept per second
    pub damping: f32,
    /// Overlap allowed before correction kicks in (pixels)
    pub collision_slop: f32,
    /// Typical object size (pixels); scales the solver's length tolerances
    pub length_unit: f32,

    pub wall_thickness: f32,
    pub wall_elasticity: f32,
    pub wall_friction: f32,

    pub fruit_elasticity: f32,
    pub fruit_friction: f32,
    /// Fruit mass per unit of hull area
    pub fruit_mass_factor: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            iterations: 30,
            gravity: Vec2::new(0.0, consts::DEFAULT_GRAVITY_Y),
            sleep_time_threshold: 0.5,
            idle_speed_threshold: 0.0,
            damping: 1.0,
            collision_slop: 0.1,
            length_unit: 100.0,

            wall_thickness: 1.0,
            wall_elasticity: 0.6,
            wall_friction: 0.4,

            fruit_elasticity: 0.2,
            fruit_friction: 0.9,
            fruit_mass_factor: 0.001,
        }
    }
}

/// Drop controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Radius around the drop site that must be free of fruit
    pub check_radius: f32,
    /// Consecutive blocked drops that end the round
    pub max_failures: u32,
    /// Frames between drop attempts
    pub interval_ticks: u32,
    /// Keep random drop sites this far from the playfield edges
    pub margin: f32,
    /// Preview rotation per frame (radians)
    pub preview_spin: f32,
    /// Kinds a drop may produce
    pub pool: Vec<FruitKind>,
    /// Where the very first preview sits, from the top edge
    pub first_drop_y: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            check_radius: consts::SPAWN_CHECK_RADIUS,
            max_failures: consts::MAX_SPAWN_FAILURES,
            interval_ticks: consts::DROP_INTERVAL_TICKS,
            margin: consts::SPAWN_MARGIN,
            preview_spin: consts::PREVIEW_SPIN,
            pool: vec![FruitKind::Grape, FruitKind::Mandarin],
            first_drop_y: 10.0,
        }
    }
}

/// Device tilt to gravity mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltTuning {
    /// Gravity per unit of tilt reading
    pub scale: f32,
    /// Gravity used when the reading is missing or exactly zero
    pub fallback: Vec2,
}

impl Default for TiltTuning {
    fn default() -> Self {
        Self {
            scale: consts::TILT_GRAVITY_SCALE,
            fallback: Vec2::new(0.0, consts::DEFAULT_GRAVITY_Y),
        }
    }
}

impl GameTuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: GameTuning = serde_json::from_str(json)?;
        if let Err(err) = tuning.validate() {
            log::warn!("Rejected tuning document: {}", err);
            return Err(err);
        }
        log::info!("Loaded tuning ({}x{})", tuning.playfield.width, tuning.playfield.height);
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(TuningError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        let p = &self.playfield;
        if !(p.width > 0.0 && p.height > 0.0) {
            return invalid("playfield", "width and height must be positive");
        }
        if self.physics.iterations == 0 {
            return invalid("physics.iterations", "must be at least 1");
        }
        if !(self.physics.fruit_mass_factor > 0.0) {
            return invalid("physics.fruit_mass_factor", "must be positive");
        }
        if !(self.physics.length_unit > 0.0) {
            return invalid("physics.length_unit", "must be positive");
        }
        if !(self.physics.sleep_time_threshold > 0.0) {
            return invalid("physics.sleep_time_threshold", "must be positive");
        }
        if !(self.physics.damping > 0.0 && self.physics.damping <= 1.0) {
            return invalid("physics.damping", "must be in (0, 1]");
        }
        let ph = &self.physics;
        let materials = [
            ("physics.wall_elasticity", ph.wall_elasticity),
            ("physics.wall_friction", ph.wall_friction),
            ("physics.fruit_elasticity", ph.fruit_elasticity),
            ("physics.fruit_friction", ph.fruit_friction),
            ("physics.collision_slop", ph.collision_slop),
            ("physics.idle_speed_threshold", ph.idle_speed_threshold),
        ];
        for (field, value) in materials {
            if !(value >= 0.0) {
                return invalid(field, "must not be negative");
            }
        }
        let s = &self.spawn;
        if s.pool.is_empty() {
            return invalid("spawn.pool", "must name at least one kind");
        }
        if s.interval_ticks == 0 {
            return invalid("spawn.interval_ticks", "must be at least 1");
        }
        if s.max_failures == 0 {
            return invalid("spawn.max_failures", "must be at least 1");
        }
        if !(2.0 * s.margin < p.width && 2.0 * s.margin < p.height) {
            return invalid("spawn.margin", "leaves no room inside the playfield");
        }
        Ok(())
    }
}
