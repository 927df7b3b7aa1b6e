//! Deterministic game rules
//!
//! Everything above the physics world lives here. Like the world itself it
//! must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body and shape id)
//! - No rendering or platform dependencies

pub mod bounds;
pub mod kind;
pub mod merge;
pub mod outline;
pub mod silhouette;
pub mod spawn;
pub mod state;
pub mod tick;

pub use bounds::{check_bounds, freeze_fruits};
pub use kind::FruitKind;
pub use merge::{MergePlan, MergeRule, plan_merge};
pub use outline::{OutlineTable, ShapeOutline};
pub use silhouette::trace_outline;
pub use spawn::{DropController, DropOutcome, NextFruitPreview};
pub use state::{
    FruitSnapshot, GameEvent, GameOverCause, GameSession, GameState, RoundSummary,
};
pub use tick::tick;
