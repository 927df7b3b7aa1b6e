//! Merge resolution
//!
//! When two fruit of the same kind first touch, both are queued for removal
//! and (unless they were the largest kind) one fruit of the next kind is
//! queued at their midpoint. The pair is ignored for the rest of the step so
//! it never produces a contact response.

use glam::Vec2;

use super::kind::FruitKind;
use super::state::{GameEvent, GameSession};
use crate::audio::SoundEffect;
use crate::physics::{Arbiter, BodyState, CollisionListener, PostStepQueue};

/// Outcome of merging one same-kind pair
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub kind: FruitKind,
    /// Fruit that replaces the pair, with its position and angle
    pub successor: Option<(FruitKind, Vec2, f32)>,
    pub points: u32,
    pub effect: SoundEffect,
}

/// Work out what a same-kind contact turns into. `None` when the pair is
/// not two fruit of one kind.
pub fn plan_merge(a: &BodyState, b: &BodyState) -> Option<MergePlan> {
    let kind = a.tag.kind()?;
    if b.tag.kind()? != kind {
        return None;
    }
    let position = (a.position + b.position) * 0.5;
    let angle = (a.angle + b.angle) * 0.5;
    Some(MergePlan {
        kind,
        successor: kind.successor().map(|next| (next, position, angle)),
        points: kind.points(),
        effect: if kind.is_big() {
            SoundEffect::BigMerge
        } else {
            SoundEffect::Merge
        },
    })
}

/// Collision listener that applies the merge rule to a session
pub struct MergeRule<'a> {
    session: &'a mut GameSession,
}

impl<'a> MergeRule<'a> {
    pub fn new(session: &'a mut GameSession) -> Self {
        Self { session }
    }
}

impl CollisionListener for MergeRule<'_> {
    fn begin(&mut self, arbiter: &Arbiter, queue: &mut PostStepQueue) -> bool {
        let Some(plan) = plan_merge(&arbiter.a, &arbiter.b) else {
            // Walls or mixed kinds: ordinary contact
            return true;
        };

        if plan.kind.is_largest() {
            self.session.top_tier_merges += 1;
        }
        queue.remove_shape(arbiter.a.shape);
        queue.remove_shape(arbiter.b.shape);
        self.session.add_score(plan.points);
        self.session.push_event(GameEvent::Sound(plan.effect));

        let position = (arbiter.a.position + arbiter.b.position) * 0.5;
        let into = plan.successor.map(|(next, pos, angle)| {
            queue.add_fruit(next, pos, angle);
            next
        });
        log::debug!(
            "Merged two {} into {:?} (+{}, score {})",
            plan.kind.name(),
            into.map(FruitKind::name),
            plan.points,
            self.session.score
        );
        self.session.push_event(GameEvent::Merged {
            kind: plan.kind,
            into,
            position,
            points: plan.points,
        });
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyId, BodyTag, PendingMutation, ShapeId, World};
    use crate::sim::OutlineTable;
    use crate::tuning::GameTuning;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn state(id: u32, kind: Option<FruitKind>, position: Vec2, angle: f32) -> BodyState {
        BodyState {
            body: BodyId(id),
            shape: ShapeId(id + 100),
            tag: kind.map_or(BodyTag::Wall, BodyTag::Fruit),
            collision_type: kind.map_or(0, FruitKind::collision_type),
            position,
            angle,
            velocity: Vec2::ZERO,
        }
    }

    fn world() -> World {
        let t = GameTuning::default();
        World::new(&t.playfield, &t.physics, OutlineTable::builtin())
    }

    fn kinds(w: &World) -> Vec<FruitKind> {
        w.bodies().filter_map(|b| b.kind()).collect()
    }

    #[test]
    fn test_plan_rejects_walls_and_mixed_kinds() {
        let wall = state(0, None, Vec2::ZERO, 0.0);
        let grape = state(1, Some(FruitKind::Grape), Vec2::ZERO, 0.0);
        let apple = state(2, Some(FruitKind::Apple), Vec2::ZERO, 0.0);
        assert!(plan_merge(&wall, &grape).is_none());
        assert!(plan_merge(&grape, &wall).is_none());
        assert!(plan_merge(&grape, &apple).is_none());
    }

    #[test]
    fn test_largest_kind_has_no_successor() {
        let a = state(1, Some(FruitKind::Watermelon), Vec2::new(100.0, 100.0), 0.0);
        let b = state(2, Some(FruitKind::Watermelon), Vec2::new(200.0, 100.0), 0.0);
        let plan = plan_merge(&a, &b).expect("merge");
        assert_eq!(plan.successor, None);
        assert_eq!(plan.points, 110);
        assert_eq!(plan.effect, SoundEffect::BigMerge);
    }

    #[test]
    fn test_listener_queues_removals_then_successor() {
        let mut session = GameSession::default();
        let mut queue = PostStepQueue::default();
        let a = state(1, Some(FruitKind::Grape), Vec2::new(100.0, 200.0), 0.2);
        let b = state(2, Some(FruitKind::Grape), Vec2::new(140.0, 220.0), 0.6);
        let arbiter = Arbiter {
            a,
            b,
            normal: Vec2::X,
            penetration: 1.0,
        };
        let respond = MergeRule::new(&mut session).begin(&arbiter, &mut queue);
        assert!(!respond);
        let queued: Vec<_> = queue.iter().cloned().collect();
        assert_eq!(queued[0], PendingMutation::RemoveShape(a.shape));
        assert_eq!(queued[1], PendingMutation::RemoveShape(b.shape));
        match &queued[2] {
            PendingMutation::AddFruit {
                kind,
                position,
                angle,
            } => {
                assert_eq!(*kind, FruitKind::Mandarin);
                assert!((*position - Vec2::new(120.0, 210.0)).length() < 1e-4);
                assert!((angle - 0.4).abs() < 1e-6);
            }
            other => panic!("expected add, got {:?}", other),
        }
        assert_eq!(session.score, 10);
        assert!(session.events().contains(&GameEvent::Sound(SoundEffect::Merge)));
    }

    #[test]
    fn test_wall_contact_gets_default_response() {
        let mut session = GameSession::default();
        let mut queue = PostStepQueue::default();
        let arbiter = Arbiter {
            a: state(0, None, Vec2::ZERO, 0.0),
            b: state(1, Some(FruitKind::Grape), Vec2::ZERO, 0.0),
            normal: Vec2::Y,
            penetration: 0.5,
        };
        assert!(MergeRule::new(&mut session).begin(&arbiter, &mut queue));
        assert!(queue.is_empty());
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_touching_grapes_become_one_mandarin() {
        let mut w = world();
        let mut session = GameSession::default();
        w.add_fruit(FruitKind::Grape, Vec2::new(200.0, 400.0), 0.2);
        w.add_fruit(FruitKind::Grape, Vec2::new(236.0, 400.0), 0.4);
        w.step(DT, &mut MergeRule::new(&mut session));

        assert_eq!(kinds(&w), vec![FruitKind::Mandarin]);
        let merged = w.bodies().next().expect("mandarin");
        // Mean pose after the step; gravity moved both grapes equally
        assert!((merged.position.x - 218.0).abs() < 1e-3);
        assert!((merged.position.y - 400.0).abs() < 0.5);
        assert!((merged.angle - 0.3).abs() < 1e-5);
        assert_eq!(session.score, 10);
    }

    #[test]
    fn test_two_watermelons_vanish() {
        let mut w = world();
        let mut session = GameSession::default();
        w.add_fruit(FruitKind::Watermelon, Vec2::new(150.0, 400.0), 0.0);
        w.add_fruit(FruitKind::Watermelon, Vec2::new(300.0, 400.0), 0.0);
        w.step(DT, &mut MergeRule::new(&mut session));

        assert_eq!(w.fruit_count(), 0);
        assert_eq!(session.top_tier_merges, 1);
        assert_eq!(session.score, 110);
        assert!(session.events().contains(&GameEvent::Sound(SoundEffect::BigMerge)));
    }

    #[test]
    fn test_mixed_kinds_bounce_apart() {
        let mut w = world();
        let mut session = GameSession::default();
        w.add_fruit(FruitKind::Grape, Vec2::new(200.0, 400.0), 0.0);
        w.add_fruit(FruitKind::Mandarin, Vec2::new(245.0, 400.0), 0.0);
        for _ in 0..5 {
            w.step(DT, &mut MergeRule::new(&mut session));
        }
        assert_eq!(kinds(&w), vec![FruitKind::Grape, FruitKind::Mandarin]);
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_shared_middle_fruit_is_removed_once() {
        // A touches B and B touches C, A and C are apart
        let mut w = world();
        let mut session = GameSession::default();
        w.add_fruit(FruitKind::Grape, Vec2::new(160.0, 300.0), 0.0);
        w.add_fruit(FruitKind::Grape, Vec2::new(196.0, 300.0), 0.0);
        w.add_fruit(FruitKind::Grape, Vec2::new(232.0, 300.0), 0.0);
        w.step(DT, &mut MergeRule::new(&mut session));

        assert_eq!(kinds(&w), vec![FruitKind::Mandarin, FruitKind::Mandarin]);
        assert_eq!(session.score, 20);

        // The two new mandarins overlap and merge on the following step
        w.step(DT, &mut MergeRule::new(&mut session));
        assert_eq!(kinds(&w), vec![FruitKind::Apple]);
        assert_eq!(session.score, 40);
        let apple = w.bodies().next().expect("apple");
        assert!((apple.position.x - 196.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn plan_is_symmetric(
            rank in 0usize..8,
            ax in 0.0f32..480.0, ay in 0.0f32..800.0, aa in -3.0f32..3.0,
            bx in 0.0f32..480.0, by in 0.0f32..800.0, ba in -3.0f32..3.0,
        ) {
            let kind = FruitKind::ALL[rank];
            let a = state(1, Some(kind), Vec2::new(ax, ay), aa);
            let b = state(2, Some(kind), Vec2::new(bx, by), ba);
            let ab = plan_merge(&a, &b).expect("same kind");
            let ba_plan = plan_merge(&b, &a).expect("same kind");
            prop_assert_eq!(ab.kind, ba_plan.kind);
            prop_assert_eq!(ab.points, ba_plan.points);
            match (ab.successor, ba_plan.successor) {
                (Some((k1, p1, r1)), Some((k2, p2, r2))) => {
                    prop_assert_eq!(k1, k2);
                    prop_assert!((p1 - p2).length() < 1e-3);
                    prop_assert!((r1 - r2).abs() < 1e-5);
                }
                (None, None) => prop_assert!(kind.is_largest()),
                _ => prop_assert!(false, "successor mismatch"),
            }
        }
    }
}
