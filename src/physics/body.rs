//! Body and shape identities
//!
//! rapier owns the rigid bodies and colliders. The game refers to them by
//! stable ids that are never reused within a world, and reads them through
//! the value snapshots below.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::FruitKind;

/// Stable body identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Walls have no body of their own; they all report this id
    pub const STATIC: BodyId = BodyId(0);
}

/// Stable shape (collider) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShapeId(pub u32);

/// Integer tag routing pairs to collision rules (fruit kind id; 0 for walls)
pub type CollisionType = u32;

/// Collision type carried by static geometry
pub const WALL_COLLISION_TYPE: CollisionType = 0;

/// What a body represents in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyTag {
    /// Static boundary geometry (no kind)
    Wall,
    /// A fruit of the given kind
    Fruit(FruitKind),
}

impl BodyTag {
    /// Fruit kind, if this is a fruit
    #[inline]
    pub fn kind(self) -> Option<FruitKind> {
        match self {
            BodyTag::Fruit(kind) => Some(kind),
            BodyTag::Wall => None,
        }
    }

    #[inline]
    pub fn is_fruit(self) -> bool {
        matches!(self, BodyTag::Fruit(_))
    }
}

/// Snapshot of a dynamic body, read out of the rapier body set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: BodyId,
    /// The single collider attached to this body
    pub shape: ShapeId,
    pub tag: BodyTag,
    /// Body origin in world space (the hull centroid for built-in outlines)
    pub position: Vec2,
    /// Orientation (radians)
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub mass: f32,
    pub sleeping: bool,
}

impl Body {
    #[inline]
    pub fn kind(&self) -> Option<FruitKind> {
        self.tag.kind()
    }

    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }
}

/// How a shape is attached and routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeInfo {
    pub id: ShapeId,
    pub body: BodyId,
    pub collision_type: CollisionType,
}

impl ShapeInfo {
    #[inline]
    pub fn is_wall(&self) -> bool {
        self.body == BodyId::STATIC
    }
}

/// Collider user data: shape id in the low half, collision type in the high half
#[inline]
pub(crate) fn pack_user_data(shape: ShapeId, collision_type: CollisionType) -> u128 {
    ((collision_type as u128) << 32) | shape.0 as u128
}

#[inline]
pub(crate) fn unpack_user_data(data: u128) -> (ShapeId, CollisionType) {
    (ShapeId(data as u32), (data >> 32) as u32)
}
