//! The physics world
//!
//! A thin layer over rapier2d. rapier integrates, finds contacts, solves them
//! and puts idle islands to sleep. This module adds stable fruit ids and
//! tags, routes first-touch contacts between registered collision types to a
//! [`CollisionListener`], and applies structural changes only at the
//! post-step point. Listeners never see the world itself: they receive a
//! snapshot [`Arbiter`] and the [`PostStepQueue`], so mutating the world
//! mid-step is impossible by construction.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::na::Point2;
use rapier2d::parry::query::PointQuery;
use rapier2d::prelude::*;

use super::body::{
    Body, BodyId, BodyTag, CollisionType, ShapeId, ShapeInfo, WALL_COLLISION_TYPE,
    pack_user_data, unpack_user_data,
};
use super::convert::{iso_to_pos_rot, na_to_vec2, point_to_vec2, vec2_to_na, vec2_to_point};
use crate::consts;
use crate::sim::{FruitKind, OutlineTable};
use crate::tuning::{PhysicsTuning, PlayfieldTuning};

/// A structural change deferred to the end of the current step
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMutation {
    AddFruit {
        kind: FruitKind,
        position: Vec2,
        angle: f32,
    },
    RemoveShape(ShapeId),
}

/// FIFO of mutations applied exactly once, after the solver finishes
#[derive(Debug, Clone, Default)]
pub struct PostStepQueue {
    items: VecDeque<PendingMutation>,
}

impl PostStepQueue {
    pub fn add_fruit(&mut self, kind: FruitKind, position: Vec2, angle: f32) {
        self.items.push_back(PendingMutation::AddFruit {
            kind,
            position,
            angle,
        });
    }

    pub fn remove_shape(&mut self, shape: ShapeId) {
        self.items.push_back(PendingMutation::RemoveShape(shape));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingMutation> {
        self.items.iter()
    }

    fn discard_adds(&mut self) {
        self.items
            .retain(|m| !matches!(m, PendingMutation::AddFruit { .. }));
    }

    fn drain(&mut self) -> VecDeque<PendingMutation> {
        std::mem::take(&mut self.items)
    }
}

/// Read-only view of one side of a contact pair
#[derive(Debug, Clone, Copy)]
pub struct BodyState {
    pub body: BodyId,
    pub shape: ShapeId,
    pub tag: BodyTag,
    pub collision_type: CollisionType,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
}

/// A pair of shapes that just started touching
#[derive(Debug, Clone)]
pub struct Arbiter {
    pub a: BodyState,
    pub b: BodyState,
    /// Points from `a` toward `b`
    pub normal: Vec2,
    pub penetration: f32,
}

/// Receives first-touch events for pairs matching a registered rule
pub trait CollisionListener {
    /// Return `false` to ignore the pair (no collision response) until the
    /// shapes separate.
    fn begin(&mut self, arbiter: &Arbiter, queue: &mut PostStepQueue) -> bool;
}

/// Plain rigid-body response for every pair
pub struct DefaultResponse;

impl CollisionListener for DefaultResponse {
    fn begin(&mut self, _arbiter: &Arbiter, _queue: &mut PostStepQueue) -> bool {
        true
    }
}

impl<F> CollisionListener for F
where
    F: FnMut(&Arbiter, &mut PostStepQueue) -> bool,
{
    fn begin(&mut self, arbiter: &Arbiter, queue: &mut PostStepQueue) -> bool {
        self(arbiter, queue)
    }
}

/// Nearest-shape query result
#[derive(Debug, Clone, Copy)]
pub struct NearestHit {
    pub shape: ShapeId,
    pub body: BodyId,
    pub tag: BodyTag,
    pub point: Vec2,
    /// Negative inside the shape
    pub distance: f32,
}

type PairKey = (ShapeId, ShapeId);

#[inline]
fn pair_key(a: ShapeId, b: ShapeId) -> PairKey {
    if a <= b { (a, b) } else { (b, a) }
}

#[inline]
fn rule_key(a: CollisionType, b: CollisionType) -> (CollisionType, CollisionType) {
    if a <= b { (a, b) } else { (b, a) }
}

/// rapier handles behind one fruit
#[derive(Debug, Clone, Copy)]
struct FruitEntry {
    kind: FruitKind,
    shape: ShapeId,
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

#[derive(Debug, Clone, Copy)]
struct ShapeEntry {
    body: BodyId,
    collider: ColliderHandle,
    collision_type: CollisionType,
}

/// Holds rule pairs back from the solver until the listener has ruled on them
struct RuleHooks<'a> {
    rules: &'a BTreeSet<(CollisionType, CollisionType)>,
    /// Pairs already offered to the listener, mapped to "ignored"
    verdicts: &'a BTreeMap<PairKey, bool>,
    /// Rule pairs touching this step with no verdict yet
    first_touches: Mutex<Vec<PairKey>>,
}

impl PhysicsHooks for RuleHooks<'_> {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let (Some(c1), Some(c2)) = (
            context.colliders.get(context.collider1),
            context.colliders.get(context.collider2),
        ) else {
            return;
        };
        let (s1, t1) = unpack_user_data(c1.user_data);
        let (s2, t2) = unpack_user_data(c2.user_data);
        if !self.rules.contains(&rule_key(t1, t2)) {
            return;
        }
        let key = pair_key(s1, s2);
        match self.verdicts.get(&key) {
            Some(false) => {}
            Some(true) => context.solver_contacts.clear(),
            None => {
                if !context.solver_contacts.is_empty() {
                    self.first_touches
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push(key);
                }
                context.solver_contacts.clear();
            }
        }
    }
}

/// Rigid body world for one playfield
pub struct World {
    width: f32,
    height: f32,
    params: PhysicsTuning,
    gravity: Vec2,

    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    /// Live fruit in id order
    fruits: BTreeMap<BodyId, FruitEntry>,
    /// Every shape, walls first
    shapes: BTreeMap<ShapeId, ShapeEntry>,
    verdicts: BTreeMap<PairKey, bool>,
    rules: BTreeSet<(CollisionType, CollisionType)>,
    pending: PostStepQueue,
    outlines: OutlineTable,
    next_id: u32,
    steps: u64,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("gravity", &self.gravity)
            .field("fruits", &self.fruits.len())
            .field("pending", &self.pending.len())
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Build a world with the four boundary walls and a same-kind collision
    /// rule for every fruit kind.
    pub fn new(playfield: &PlayfieldTuning, params: &PhysicsTuning, outlines: OutlineTable) -> Self {
        let iterations = NonZeroUsize::new(params.iterations as usize).unwrap_or(NonZeroUsize::MIN);
        let integration_parameters = IntegrationParameters {
            dt: consts::SIM_DT,
            length_unit: params.length_unit,
            normalized_allowed_linear_error: params.collision_slop / params.length_unit,
            num_solver_iterations: iterations,
            ..IntegrationParameters::default()
        };

        let mut world = Self {
            width: playfield.width,
            height: playfield.height,
            params: params.clone(),
            gravity: params.gravity,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            fruits: BTreeMap::new(),
            shapes: BTreeMap::new(),
            verdicts: BTreeMap::new(),
            rules: BTreeSet::new(),
            pending: PostStepQueue::default(),
            outlines,
            next_id: 1,
            steps: 0,
        };

        let (w, h) = (playfield.width, playfield.height);
        let walls = [
            (Vec2::new(0.0, 0.0), Vec2::new(0.0, h)),
            (Vec2::new(w, 0.0), Vec2::new(w, h)),
            (Vec2::new(0.0, h), Vec2::new(w, h)),
            (Vec2::new(0.0, 0.0), Vec2::new(w, 0.0)),
        ];
        for (a, b) in walls {
            let id = ShapeId(world.next_entity_id());
            let segment = SharedShape::capsule(vec2_to_point(a), vec2_to_point(b), params.wall_thickness);
            let collider = with_material(
                ColliderBuilder::new(segment),
                params.wall_elasticity,
                params.wall_friction,
            )
            .user_data(pack_user_data(id, WALL_COLLISION_TYPE))
            .build();
            let handle = world.colliders.insert(collider);
            world.shapes.insert(
                id,
                ShapeEntry {
                    body: BodyId::STATIC,
                    collider: handle,
                    collision_type: WALL_COLLISION_TYPE,
                },
            );
        }
        world.refresh_queries();

        for kind in FruitKind::ALL {
            world.add_collision_rule(kind.collision_type(), kind.collision_type());
        }

        log::info!(
            "World ready: {}x{} playfield, gravity ({}, {}), {} solver iterations",
            w,
            h,
            world.gravity.x,
            world.gravity.y,
            params.iterations
        );
        world
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn outlines(&self) -> &OutlineTable {
        &self.outlines
    }

    /// Steps taken since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Route first-touch events between these two collision types to the listener
    pub fn add_collision_rule(&mut self, a: CollisionType, b: CollisionType) {
        self.rules.insert(rule_key(a, b));
    }

    pub fn has_collision_rule(&self, a: CollisionType, b: CollisionType) -> bool {
        self.rules.contains(&rule_key(a, b))
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Change gravity; any actual change wakes every body
    pub fn set_gravity(&mut self, gravity: Vec2) {
        if gravity != self.gravity {
            self.gravity = gravity;
            self.activate_all();
        }
    }

    pub fn activate_all(&mut self) {
        for (_, rb) in self.rigid_bodies.iter_mut() {
            rb.wake_up(true);
        }
    }

    /// Speed below which a new body counts as idle
    fn idle_speed(&self) -> f32 {
        if self.params.idle_speed_threshold > 0.0 {
            self.params.idle_speed_threshold
        } else {
            self.gravity.length() * consts::SIM_DT
        }
    }

    // ---- Immediate mutation (outside a step only) ----

    /// Create a fruit body and its collision shape. Takes effect immediately.
    pub fn add_fruit(&mut self, kind: FruitKind, position: Vec2, angle: f32) -> ShapeId {
        let shape = self.insert_fruit(kind, position, angle);
        self.refresh_queries();
        shape
    }

    /// Add a fruit by catalog id. Ids outside the catalog are ignored.
    pub fn add_fruit_by_id(&mut self, id: u32, position: Vec2, angle: f32) -> Option<ShapeId> {
        match FruitKind::from_id(id) {
            Some(kind) => Some(self.add_fruit(kind, position, angle)),
            None => {
                log::warn!("Ignoring add for unknown fruit id {}", id);
                None
            }
        }
    }

    /// Remove a fruit shape and its body. Returns `false` (and changes
    /// nothing) when the shape is already gone or belongs to a wall.
    pub fn remove_fruit(&mut self, shape: ShapeId) -> bool {
        let removed = self.detach_fruit(shape);
        if removed {
            self.refresh_queries();
        }
        removed
    }

    /// Move a body, refreshing its collider immediately
    pub fn set_body_position(&mut self, body: BodyId, position: Vec2) -> bool {
        let Some(fruit) = self.fruits.get(&body).copied() else {
            return false;
        };
        let Some(rb) = self.rigid_bodies.get_mut(fruit.body) else {
            return false;
        };
        rb.set_translation(vec2_to_na(position), true);
        let pose = *rb.position();
        if let Some(collider) = self.colliders.get_mut(fruit.collider) {
            collider.set_position(pose);
        }
        self.refresh_queries();
        true
    }

    fn insert_fruit(&mut self, kind: FruitKind, position: Vec2, angle: f32) -> ShapeId {
        let body_id = BodyId(self.next_entity_id());
        let shape_id = ShapeId(self.next_entity_id());

        let damping = -self.params.damping.ln().min(0.0);
        let mut rigid_body = RigidBodyBuilder::dynamic()
            .translation(vec2_to_na(position))
            .rotation(angle)
            .linear_damping(damping)
            .angular_damping(damping)
            .user_data(body_id.0 as u128)
            .build();
        let activation = rigid_body.activation_mut();
        activation.time_until_sleep = self.params.sleep_time_threshold;
        activation.normalized_linear_threshold = self.idle_speed() / self.params.length_unit;
        let body_handle = self.rigid_bodies.insert(rigid_body);

        let outline = self.outlines.get(kind);
        let hull: Vec<Point2<f32>> = outline.hull().iter().map(|&p| vec2_to_point(p)).collect();
        let builder = ColliderBuilder::convex_hull(&hull).unwrap_or_else(|| {
            log::warn!("{} outline has no usable hull, colliding as a ball", kind.name());
            ColliderBuilder::ball(outline.bounding_radius())
        });
        let collider = with_material(builder, self.params.fruit_elasticity, self.params.fruit_friction)
            .density(self.params.fruit_mass_factor)
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .user_data(pack_user_data(shape_id, kind.collision_type()))
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.rigid_bodies);

        self.fruits.insert(
            body_id,
            FruitEntry {
                kind,
                shape: shape_id,
                body: body_handle,
                collider: collider_handle,
            },
        );
        self.shapes.insert(
            shape_id,
            ShapeEntry {
                body: body_id,
                collider: collider_handle,
                collision_type: kind.collision_type(),
            },
        );
        log::trace!("Added {:?} at ({:.1}, {:.1})", kind, position.x, position.y);
        shape_id
    }

    fn detach_fruit(&mut self, shape: ShapeId) -> bool {
        let Some(entry) = self.shapes.get(&shape).copied() else {
            log::trace!("Shape {:?} already removed", shape);
            return false;
        };
        if entry.body == BodyId::STATIC {
            log::warn!("Refusing to remove wall shape {:?}", shape);
            return false;
        }

        // Anything resting on the removed fruit has to wake up and fall
        self.wake_contacts_of(entry.collider);
        if let Some(fruit) = self.fruits.remove(&entry.body) {
            self.rigid_bodies.remove(
                fruit.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
        self.shapes.remove(&shape);
        self.verdicts.retain(|&(a, b), _| a != shape && b != shape);
        true
    }

    fn wake_contacts_of(&mut self, collider: ColliderHandle) {
        let touching: Vec<RigidBodyHandle> = self
            .narrow_phase
            .contact_pairs_with(collider)
            .filter(|pair| pair.manifolds.iter().any(|m| !m.points.is_empty()))
            .filter_map(|pair| {
                let other = if pair.collider1 == collider {
                    pair.collider2
                } else {
                    pair.collider1
                };
                self.colliders.get(other).and_then(|c| c.parent())
            })
            .collect();
        for handle in touching {
            if let Some(rb) = self.rigid_bodies.get_mut(handle) {
                rb.wake_up(true);
            }
        }
    }

    fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    // ---- Deferred mutation ----

    /// Queue of mutations applied at the end of the next step
    pub fn pending(&self) -> &PostStepQueue {
        &self.pending
    }

    pub fn schedule_add_fruit(&mut self, kind: FruitKind, position: Vec2, angle: f32) {
        self.pending.add_fruit(kind, position, angle);
    }

    pub fn schedule_remove(&mut self, shape: ShapeId) {
        self.pending.remove_shape(shape);
    }

    /// Queue removal of every fruit. Fruit still waiting to be added are
    /// dropped from the queue.
    pub fn schedule_remove_all_fruits(&mut self) {
        self.pending.discard_adds();
        let fruit: Vec<ShapeId> = self.fruits.values().map(|f| f.shape).collect();
        for id in fruit {
            self.pending.remove_shape(id);
        }
    }

    fn flush(&mut self) {
        let mutations = self.pending.drain();
        if mutations.is_empty() {
            return;
        }
        log::trace!("Applying {} post-step mutations", mutations.len());
        for mutation in mutations {
            match mutation {
                PendingMutation::AddFruit {
                    kind,
                    position,
                    angle,
                } => {
                    self.insert_fruit(kind, position, angle);
                }
                PendingMutation::RemoveShape(shape) => {
                    self.detach_fruit(shape);
                }
            }
        }
        self.refresh_queries();
    }

    // ---- Queries ----

    fn snapshot(&self, id: BodyId, fruit: &FruitEntry) -> Option<Body> {
        let rb = self.rigid_bodies.get(fruit.body)?;
        let (position, angle) = iso_to_pos_rot(rb.position());
        Some(Body {
            id,
            shape: fruit.shape,
            tag: BodyTag::Fruit(fruit.kind),
            position,
            angle,
            velocity: na_to_vec2(rb.linvel()),
            angular_velocity: rb.angvel(),
            mass: rb.mass(),
            sleeping: rb.is_sleeping(),
        })
    }

    /// Fruit bodies in id order
    pub fn bodies(&self) -> impl Iterator<Item = Body> {
        self.fruits
            .iter()
            .filter_map(|(&id, fruit)| self.snapshot(id, fruit))
    }

    /// All shapes, walls included, in id order
    pub fn shapes(&self) -> impl Iterator<Item = ShapeInfo> {
        self.shapes.iter().map(|(&id, entry)| ShapeInfo {
            id,
            body: entry.body,
            collision_type: entry.collision_type,
        })
    }

    pub fn for_each_body(&self, mut f: impl FnMut(&Body)) {
        for body in self.bodies() {
            f(&body);
        }
    }

    pub fn body(&self, id: BodyId) -> Option<Body> {
        self.fruits
            .get(&id)
            .and_then(|fruit| self.snapshot(id, fruit))
    }

    pub fn shape(&self, id: ShapeId) -> Option<ShapeInfo> {
        self.shapes.get(&id).map(|entry| ShapeInfo {
            id,
            body: entry.body,
            collision_type: entry.collision_type,
        })
    }

    /// Fruit body owning a shape; `None` for walls and removed shapes
    pub fn body_of(&self, shape: ShapeId) -> Option<BodyId> {
        self.shapes
            .get(&shape)
            .map(|entry| entry.body)
            .filter(|&body| body != BodyId::STATIC)
    }

    /// Shape attached to a fruit body
    pub fn shape_of(&self, body: BodyId) -> Option<ShapeId> {
        self.fruits.get(&body).map(|fruit| fruit.shape)
    }

    pub fn fruit_count(&self) -> usize {
        self.fruits.len()
    }

    /// World-space outline of every collider, walls included, in shape order.
    /// Walls come out as their two segment endpoints.
    pub fn shape_outlines(&self) -> Vec<Vec<Vec2>> {
        self.shapes
            .values()
            .filter_map(|entry| {
                let collider = self.colliders.get(entry.collider)?;
                let pose = collider.position();
                let shape = collider.shape();
                let local: Vec<Point2<f32>> = if let Some(polygon) = shape.as_convex_polygon() {
                    polygon.points().to_vec()
                } else if let Some(capsule) = shape.as_capsule() {
                    vec![capsule.segment.a, capsule.segment.b]
                } else {
                    let radius = shape.as_ball()?.radius;
                    (0..16)
                        .map(|k| {
                            let (sin, cos) = (k as f32 * std::f32::consts::TAU / 16.0).sin_cos();
                            Point2::new(radius * cos, radius * sin)
                        })
                        .collect()
                };
                Some(local.iter().map(|p| point_to_vec2(&(pose * p))).collect())
            })
            .collect()
    }

    /// Nearest shape whose surface lies within `max_distance` of `point`
    pub fn point_query_nearest(&self, point: Vec2, max_distance: f32) -> Option<NearestHit> {
        let at = vec2_to_point(point);
        let (handle, projection) = self.query_pipeline.project_point(
            &self.rigid_bodies,
            &self.colliders,
            &at,
            true,
            QueryFilter::default(),
        )?;
        let collider = self.colliders.get(handle)?;
        let (shape, _) = unpack_user_data(collider.user_data);
        let entry = self.shapes.get(&shape)?;

        let (surface, distance) = if projection.is_inside {
            let boundary = collider
                .shape()
                .project_point(collider.position(), &at, false);
            let surface = point_to_vec2(&boundary.point);
            (surface, -surface.distance(point))
        } else {
            let surface = point_to_vec2(&projection.point);
            (surface, surface.distance(point))
        };
        if distance > max_distance {
            return None;
        }

        let tag = self
            .fruits
            .get(&entry.body)
            .map_or(BodyTag::Wall, |fruit| BodyTag::Fruit(fruit.kind));
        Some(NearestHit {
            shape,
            body: entry.body,
            tag,
            point: surface,
            distance,
        })
    }

    /// A spawn site is clear when nothing is nearby, or the nearest thing is a wall
    pub fn can_spawn_at(&self, point: Vec2, radius: f32) -> bool {
        match self.point_query_nearest(point, radius) {
            None => true,
            Some(hit) => !hit.tag.is_fruit(),
        }
    }

    /// Fruit bodies whose position has left the playfield rectangle
    pub fn fruits_out_of_bounds(&self) -> Vec<BodyId> {
        self.bodies()
            .filter(|b| {
                let p = b.position;
                p.x < 0.0 || p.x > self.width || p.y < 0.0 || p.y > self.height
            })
            .map(|b| b.id)
            .collect()
    }

    /// Zero the velocity of every fruit
    pub fn stop_all_fruits(&mut self) {
        for fruit in self.fruits.values() {
            if let Some(rb) = self.rigid_bodies.get_mut(fruit.body) {
                rb.set_linvel(vec2_to_na(Vec2::ZERO), false);
                rb.set_angvel(0.0, false);
            }
        }
    }

    // ---- Stepping ----

    fn body_state(&self, shape: ShapeId, entry: &ShapeEntry) -> BodyState {
        let body = self.body(entry.body);
        BodyState {
            body: entry.body,
            shape,
            tag: body.map_or(BodyTag::Wall, |b| b.tag),
            collision_type: entry.collision_type,
            position: body.map_or(Vec2::ZERO, |b| b.position),
            angle: body.map_or(0.0, |b| b.angle),
            velocity: body.map_or(Vec2::ZERO, |b| b.velocity),
        }
    }

    fn contact(&self, (a, b): PairKey) -> Option<(&ShapeEntry, &ShapeEntry, &ContactPair)> {
        let (ea, eb) = (self.shapes.get(&a)?, self.shapes.get(&b)?);
        let pair = self.narrow_phase.contact_pair(ea.collider, eb.collider)?;
        Some((ea, eb, pair))
    }

    fn touching(&self, key: PairKey) -> bool {
        self.contact(key)
            .is_some_and(|(_, _, pair)| pair.manifolds.iter().any(|m| !m.points.is_empty()))
    }

    fn arbiter(&self, key: PairKey) -> Option<Arbiter> {
        let (ea, eb, pair) = self.contact(key)?;
        let manifold = pair.manifolds.iter().find(|m| !m.points.is_empty())?;
        let penetration = manifold
            .points
            .iter()
            .map(|p| -p.dist)
            .fold(0.0f32, f32::max);
        let normal = na_to_vec2(&manifold.data.normal);
        let normal = if pair.collider1 == ea.collider { normal } else { -normal };
        Some(Arbiter {
            a: self.body_state(key.0, ea),
            b: self.body_state(key.1, eb),
            normal,
            penetration,
        })
    }

    /// Advance the world by `dt` seconds.
    ///
    /// rapier runs the whole step; rule pairs touching for the first time
    /// get no response in it. Their arbiters then go to the listener in
    /// shape-id order, and the post-step queue is applied exactly once.
    pub fn step(&mut self, dt: f32, listener: &mut dyn CollisionListener) {
        self.steps += 1;
        self.integration_parameters.dt = dt;

        let gravity = vec2_to_na(self.gravity);
        let hooks = RuleHooks {
            rules: &self.rules,
            verdicts: &self.verdicts,
            first_touches: Mutex::new(Vec::new()),
        };
        self.physics_pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &hooks,
            &(),
        );
        let mut first_touches = hooks
            .first_touches
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        first_touches.sort_unstable();
        first_touches.dedup();

        // A verdict lasts until the pair separates
        let verdicts = std::mem::take(&mut self.verdicts);
        self.verdicts = verdicts
            .into_iter()
            .filter(|&(key, _)| self.touching(key))
            .collect();

        for key in first_touches {
            if self.verdicts.contains_key(&key) {
                continue;
            }
            let Some(arbiter) = self.arbiter(key) else {
                continue;
            };
            let respond = listener.begin(&arbiter, &mut self.pending);
            self.verdicts.insert(key, !respond);
        }

        self.flush();
    }
}

/// Restitution and friction combine multiplicatively across a pair
fn with_material(builder: ColliderBuilder, elasticity: f32, friction: f32) -> ColliderBuilder {
    builder
        .restitution(elasticity)
        .friction(friction)
        .restitution_combine_rule(CoefficientCombineRule::Multiply)
        .friction_combine_rule(CoefficientCombineRule::Multiply)
}
