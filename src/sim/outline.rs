//! Fruit outlines
//!
//! Each kind has a closed outline (body-local, centered on the origin) and
//! the convex hull of that outline, which is what collides and what mass is
//! computed from. Outlines come either from the built-in table or from
//! silhouettes traced out of sprite alpha masks.

use std::f32::consts::TAU;

use glam::Vec2;

use super::kind::FruitKind;
use crate::error::OutlineError;
use crate::physics::poly;

/// Vertex count of the built-in outlines
const BUILTIN_VERTICES: usize = 24;

/// Validated outline for one fruit kind
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeOutline {
    kind: FruitKind,
    points: Vec<Vec2>,
    hull: Vec<Vec2>,
    scale: f32,
}

impl ShapeOutline {
    /// Validate an outline. Points are in body-local pixels; `scale` is the
    /// sprite scale they were produced with and is kept for rendering.
    pub fn new(kind: FruitKind, points: Vec<Vec2>, scale: f32) -> Result<Self, OutlineError> {
        let kind_tag = Some(kind);
        if points.len() < 3 {
            return Err(OutlineError::TooFewPoints {
                kind: kind_tag,
                count: points.len(),
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(OutlineError::NonFinite { kind: kind_tag });
        }
        if !poly::is_simple(&points) {
            return Err(OutlineError::SelfIntersecting { kind: kind_tag });
        }
        let hull = poly::convex_hull(&points);
        if hull.len() < 3 || poly::area(&hull) < 1e-3 {
            return Err(OutlineError::Degenerate { kind: kind_tag });
        }
        Ok(Self {
            kind,
            points,
            hull,
            scale,
        })
    }

    /// Procedural outline used when no sprite silhouette is supplied
    pub fn builtin(kind: FruitKind) -> Self {
        let (radius, aspect, taper) = builtin_profile(kind);
        let raw: Vec<Vec2> = (0..BUILTIN_VERTICES)
            .map(|k| {
                // Half-step offset puts flat edges at the top and bottom
                let theta = (k as f32 + 0.5) * TAU / BUILTIN_VERTICES as f32;
                let (sin, cos) = theta.sin_cos();
                Vec2::new(radius * cos * (1.0 + taper * sin), radius * aspect * sin)
            })
            .collect();
        let center = poly::centroid(&raw);
        let points: Vec<Vec2> = raw.into_iter().map(|p| p - center).collect();
        let hull = poly::convex_hull(&points);
        Self {
            kind,
            points,
            hull,
            scale: 1.0,
        }
    }

    pub fn kind(&self) -> FruitKind {
        self.kind
    }

    /// Outline as given (may be concave)
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Convex hull, counter-clockwise
    pub fn hull(&self) -> &[Vec2] {
        &self.hull
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Merge score for this kind
    pub fn points_value(&self) -> u32 {
        self.kind.points()
    }

    pub fn area(&self) -> f32 {
        poly::area(&self.hull)
    }

    pub fn mass(&self, mass_factor: f32) -> f32 {
        self.area() * mass_factor
    }

    /// Furthest hull vertex from the body origin
    pub fn bounding_radius(&self) -> f32 {
        poly::bounding_radius(&self.hull)
    }
}

/// (radius, height/width ratio, bottom widening) per kind
fn builtin_profile(kind: FruitKind) -> (f32, f32, f32) {
    match kind {
        FruitKind::Grape => (22.0, 1.0, 0.0),
        FruitKind::Mandarin => (30.0, 0.9, 0.0),
        FruitKind::Apple => (37.0, 0.95, 0.05),
        FruitKind::Pear => (42.0, 1.2, 0.12),
        FruitKind::Peach => (50.0, 0.95, 0.0),
        FruitKind::Pineapple => (58.0, 1.15, 0.0),
        FruitKind::Melon => (70.0, 0.95, 0.0),
        FruitKind::Watermelon => (86.0, 0.92, 0.0),
    }
}

/// One outline per fruit kind, indexed by rank
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineTable {
    outlines: Vec<ShapeOutline>,
}

impl Default for OutlineTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OutlineTable {
    pub fn builtin() -> Self {
        Self {
            outlines: FruitKind::ALL.into_iter().map(ShapeOutline::builtin).collect(),
        }
    }

    /// Build from outlines listed smallest kind first, one per kind
    pub fn from_outlines(outlines: Vec<ShapeOutline>) -> Result<Self, OutlineError> {
        if outlines.len() > FruitKind::COUNT {
            return Err(OutlineError::ExtraOutlines {
                count: outlines.len(),
            });
        }
        for (i, kind) in FruitKind::ALL.into_iter().enumerate() {
            if outlines.get(i).map(ShapeOutline::kind) != Some(kind) {
                return Err(OutlineError::MissingKind(kind));
            }
        }
        Ok(Self { outlines })
    }

    /// Swap in a single outline, e.g. one traced from a sprite
    pub fn replace(&mut self, outline: ShapeOutline) {
        let rank = outline.kind().rank();
        self.outlines[rank] = outline;
    }

    pub fn get(&self, kind: FruitKind) -> &ShapeOutline {
        &self.outlines[kind.rank()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeOutline> {
        self.outlines.iter()
    }
}
