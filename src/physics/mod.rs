//! 2D rigid body physics
//!
//! rapier2d does the integration, contact solving and island sleeping.
//! This module wraps it with stable fruit ids, collision-rule routing to a
//! listener, and a deferred mutation queue applied after each step.

pub mod body;
mod convert;
pub mod poly;
pub mod world;

pub use body::{Body, BodyId, BodyTag, CollisionType, ShapeId, ShapeInfo, WALL_COLLISION_TYPE};
pub use world::{
    Arbiter, BodyState, CollisionListener, DefaultResponse, NearestHit, PendingMutation,
    PostStepQueue, World,
};
