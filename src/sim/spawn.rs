//! Drop controller
//!
//! Keeps the "next fruit" preview and, on a fixed frame interval, drops it
//! into the world if the drop site is clear. Blocked drops count up; too many
//! in a row ends the round. A successful drop resets the count and rolls a
//! new preview.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::kind::FruitKind;
use super::state::{GameEvent, GameOverCause, GameSession};
use crate::physics::World;
use crate::tuning::{GameTuning, SpawnTuning};

/// The fruit that will drop next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextFruitPreview {
    pub kind: FruitKind,
    pub position: Vec2,
    pub angle: f32,
}

/// Result of one drop attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    Dropped(NextFruitPreview),
    /// Site occupied; consecutive failures so far
    Blocked { failures: u32 },
    /// Site occupied and the failure limit was reached
    GameOver,
}

#[derive(Debug, Clone)]
pub struct DropController {
    preview: NextFruitPreview,
    /// Frames since the last drop attempt
    countdown: u32,
    width: f32,
    height: f32,
    params: SpawnTuning,
}

impl DropController {
    /// First preview: smallest kind, top center, unrotated
    pub fn new(tuning: &GameTuning) -> Self {
        let width = tuning.playfield.width;
        Self {
            preview: NextFruitPreview {
                kind: tuning.spawn.pool.first().copied().unwrap_or(FruitKind::SMALLEST),
                position: Vec2::new(width / 2.0, tuning.spawn.first_drop_y),
                angle: 0.0,
            },
            countdown: 0,
            width,
            height: tuning.playfield.height,
            params: tuning.spawn.clone(),
        }
    }

    pub fn preview(&self) -> &NextFruitPreview {
        &self.preview
    }

    /// Restart the drop interval
    pub fn reset_countdown(&mut self) {
        self.countdown = 0;
    }

    /// Rotate the preview by the per-frame spin
    pub fn spin(&mut self) {
        self.preview.angle += self.params.preview_spin;
    }

    /// Random kind from the pool, random site inside the margins, random angle
    pub fn roll_preview<R: Rng>(&mut self, rng: &mut R) {
        let pool = &self.params.pool;
        let kind = if pool.is_empty() {
            FruitKind::SMALLEST
        } else {
            pool[rng.random_range(0..pool.len())]
        };
        let m = self.params.margin;
        self.preview = NextFruitPreview {
            kind,
            position: Vec2::new(
                rng.random_range(m..self.width - m),
                rng.random_range(m..self.height - m),
            ),
            angle: rng.random::<f32>() * TAU,
        };
    }

    /// Count one frame; attempt a drop when the interval elapses
    pub fn tick<R: Rng>(
        &mut self,
        world: &mut World,
        session: &mut GameSession,
        rng: &mut R,
    ) -> Option<DropOutcome> {
        self.countdown += 1;
        if self.countdown < self.params.interval_ticks {
            return None;
        }
        self.countdown = 0;
        Some(self.try_drop(world, session, rng))
    }

    /// Attempt to drop the preview now
    pub fn try_drop<R: Rng>(
        &mut self,
        world: &mut World,
        session: &mut GameSession,
        rng: &mut R,
    ) -> DropOutcome {
        let site = self.preview.position;
        if !world.can_spawn_at(site, self.params.check_radius) {
            session.spawn_failures += 1;
            let failures = session.spawn_failures;
            log::debug!(
                "Drop site ({:.0}, {:.0}) blocked, {} in a row",
                site.x,
                site.y,
                failures
            );
            session.push_event(GameEvent::DropBlocked { failures });
            if failures >= self.params.max_failures {
                session.signal_game_over(GameOverCause::SpawnBlocked);
                return DropOutcome::GameOver;
            }
            return DropOutcome::Blocked { failures };
        }

        // Lands at the next step's flush
        let dropped = self.preview;
        world.schedule_add_fruit(dropped.kind, dropped.position, dropped.angle);
        session.spawn_failures = 0;
        session.push_event(GameEvent::Dropped {
            kind: dropped.kind,
            position: dropped.position,
        });
        log::debug!(
            "Dropped {} at ({:.0}, {:.0})",
            dropped.kind.name(),
            dropped.position.x,
            dropped.position.y
        );
        self.roll_preview(rng);
        DropOutcome::Dropped(dropped)
    }
}
