//! Sprite silhouette tracing
//!
//! Turns a sprite's alpha mask into a fruit outline: marching squares over
//! the mask, keep the longest closed contour, simplify it, then center it on
//! the sprite and apply the draw scale.

use std::collections::HashMap;

use glam::Vec2;

use crate::error::OutlineError;
use crate::physics::poly::closest_point_on_segment;

/// Douglas-Peucker tolerance (pixels, before scaling)
pub const SIMPLIFY_TOLERANCE: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Segments per marching-squares case.
///
/// Corner bits: tl = 1, tr = 2, bl = 4, br = 8. The two saddle cases (6 and
/// 9) depend on the cell center and are resolved in [`cell_segments`].
const EDGE_TABLE: [&[(Side, Side)]; 16] = [
    &[],
    &[(Side::Left, Side::Top)],
    &[(Side::Top, Side::Right)],
    &[(Side::Left, Side::Right)],
    &[(Side::Bottom, Side::Left)],
    &[(Side::Bottom, Side::Top)],
    &[],
    &[(Side::Bottom, Side::Right)],
    &[(Side::Right, Side::Bottom)],
    &[],
    &[(Side::Top, Side::Bottom)],
    &[(Side::Left, Side::Bottom)],
    &[(Side::Right, Side::Left)],
    &[(Side::Top, Side::Right)],
    &[(Side::Left, Side::Top)],
    &[],
];

/// Identifies a grid edge between two samples: horizontal edges run from
/// `(x, y)` to `(x + 1, y)`, vertical ones from `(x, y)` to `(x, y + 1)`.
type EdgeKey = (bool, i32, i32);

fn edge_key(side: Side, x: i32, y: i32) -> EdgeKey {
    match side {
        Side::Top => (true, x, y),
        Side::Bottom => (true, x, y + 1),
        Side::Left => (false, x, y),
        Side::Right => (false, x + 1, y),
    }
}

/// Alpha samples with a transparent one-pixel border
struct Mask<'a> {
    width: usize,
    height: usize,
    alpha: &'a [f32],
}

impl Mask<'_> {
    /// Sample at padded grid coordinate (pixel index + 1)
    fn sample(&self, x: i32, y: i32) -> f32 {
        if x < 1 || y < 1 || x > self.width as i32 || y > self.height as i32 {
            return 0.0;
        }
        self.alpha[(y as usize - 1) * self.width + (x as usize - 1)]
    }

    /// Position of a padded grid sample (pixel centers)
    fn position(x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32 - 0.5, y as f32 - 0.5)
    }

    /// Where the threshold crosses an edge
    fn crossing(&self, key: EdgeKey, threshold: f32) -> Vec2 {
        let (horizontal, x, y) = key;
        let (x1, y1) = if horizontal { (x + 1, y) } else { (x, y + 1) };
        let a = self.sample(x, y);
        let b = self.sample(x1, y1);
        let t = if (b - a).abs() < f32::EPSILON {
            0.5
        } else {
            ((threshold - a) / (b - a)).clamp(0.0, 1.0)
        };
        Self::position(x, y).lerp(Self::position(x1, y1), t)
    }
}

fn cell_segments(mask: &Mask, x: i32, y: i32, threshold: f32) -> Vec<(EdgeKey, EdgeKey)> {
    let tl = mask.sample(x, y);
    let tr = mask.sample(x + 1, y);
    let bl = mask.sample(x, y + 1);
    let br = mask.sample(x + 1, y + 1);
    let bit = |v: f32, b: usize| if v > threshold { b } else { 0 };
    let case = bit(tl, 1) | bit(tr, 2) | bit(bl, 4) | bit(br, 8);

    let sides: &[(Side, Side)] = match case {
        6 | 9 => {
            let center_inside = (tl + tr + bl + br) * 0.25 > threshold;
            match (case, center_inside) {
                // tr + bl solid
                (6, true) => &[(Side::Left, Side::Top), (Side::Right, Side::Bottom)],
                (6, false) => &[(Side::Top, Side::Right), (Side::Bottom, Side::Left)],
                // tl + br solid
                (_, true) => &[(Side::Top, Side::Right), (Side::Bottom, Side::Left)],
                (_, false) => &[(Side::Left, Side::Top), (Side::Right, Side::Bottom)],
            }
        }
        _ => EDGE_TABLE[case],
    };
    sides
        .iter()
        .map(|&(a, b)| (edge_key(a, x, y), edge_key(b, x, y)))
        .collect()
}

/// Chain segments sharing edge keys into closed loops
fn connect_segments(segments: &[(EdgeKey, EdgeKey)]) -> Vec<Vec<EdgeKey>> {
    let mut adjacency: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        adjacency.entry(*a).or_default().push(i);
        adjacency.entry(*b).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (first, mut current) = segments[start];
        let mut chain = vec![first];
        while current != first {
            chain.push(current);
            let next = adjacency
                .get(&current)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
            let Some(next) = next else { break };
            used[next] = true;
            let (a, b) = segments[next];
            current = if a == current { b } else { a };
        }
        loops.push(chain);
    }
    loops
}

fn simplify_open(points: &[Vec2], tolerance: f32, out: &mut Vec<Vec2>) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let (a, b) = (points[0], points[n - 1]);
    let (index, distance) = points[1..n - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, closest_point_on_segment(a, b, *p).distance(*p)))
        .fold((0, -1.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });
    if distance > tolerance {
        simplify_open(&points[..=index], tolerance, out);
        out.push(points[index]);
        simplify_open(&points[index..], tolerance, out);
    }
}

/// Douglas-Peucker over a closed loop
pub fn simplify_closed(points: &[Vec2], tolerance: f32) -> Vec<Vec2> {
    if points.len() < 4 {
        return points.to_vec();
    }
    let start = points[0];
    let far = points
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.distance_squared(start).total_cmp(&b.1.distance_squared(start)))
        .map_or(0, |(i, _)| i);

    let mut first_half: Vec<Vec2> = points[..=far].to_vec();
    let mut second_half: Vec<Vec2> = points[far..].to_vec();
    second_half.push(start);
    if first_half.len() < 2 {
        first_half.push(start);
    }

    let mut out = vec![start];
    simplify_open(&first_half, tolerance, &mut out);
    if far != 0 {
        out.push(points[far]);
    }
    simplify_open(&second_half, tolerance, &mut out);
    out
}

/// Trace an outline from a row-major alpha mask.
///
/// Pixels with alpha above `threshold` are solid. The result is centered on
/// the mask's middle and multiplied by `scale`.
pub fn trace_outline(
    width: usize,
    height: usize,
    alpha: &[f32],
    threshold: f32,
    scale: f32,
) -> Result<Vec<Vec2>, OutlineError> {
    let expected = width * height;
    if alpha.len() != expected {
        return Err(OutlineError::MaskSize {
            expected,
            actual: alpha.len(),
        });
    }
    let mask = Mask {
        width,
        height,
        alpha,
    };

    let mut segments = Vec::new();
    for y in 0..=height as i32 {
        for x in 0..=width as i32 {
            segments.extend(cell_segments(&mask, x, y, threshold));
        }
    }
    if segments.is_empty() {
        return Err(OutlineError::EmptySilhouette);
    }

    let loops = connect_segments(&segments);
    let Some(longest) = loops.iter().max_by_key(|l| l.len()) else {
        return Err(OutlineError::EmptySilhouette);
    };
    log::debug!(
        "Traced {} contours from {}x{} mask, longest has {} points",
        loops.len(),
        width,
        height,
        longest.len()
    );

    let contour: Vec<Vec2> = longest
        .iter()
        .map(|&key| mask.crossing(key, threshold))
        .collect();
    let simplified = simplify_closed(&contour, SIMPLIFY_TOLERANCE);
    if simplified.len() < 3 {
        return Err(OutlineError::TooFewPoints {
            kind: None,
            count: simplified.len(),
        });
    }

    let center = Vec2::new(width as f32, height as f32) * 0.5;
    Ok(simplified.into_iter().map(|p| (p - center) * scale).collect())
}
