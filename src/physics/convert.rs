//! glam and nalgebra at the rapier boundary

use glam::Vec2;
use rapier2d::na::{Isometry2, Point2, Vector2};

#[inline]
pub(crate) fn vec2_to_na(v: Vec2) -> Vector2<f32> {
    Vector2::new(v.x, v.y)
}

#[inline]
pub(crate) fn vec2_to_point(v: Vec2) -> Point2<f32> {
    Point2::new(v.x, v.y)
}

#[inline]
pub(crate) fn na_to_vec2(v: &Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

#[inline]
pub(crate) fn point_to_vec2(p: &Point2<f32>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

pub(crate) fn iso_to_pos_rot(iso: &Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    (pos, iso.rotation.angle())
}
