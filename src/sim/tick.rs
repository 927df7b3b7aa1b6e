//! Fixed timestep frame driver
//!
//! One call advances the game by one frame: UI taps, tilt gravity, the
//! physics step with merges, the drop controller, then the bounds check.

use super::bounds::{check_bounds, freeze_fruits};
use super::merge::MergeRule;
use super::state::GameState;
use crate::consts::SIM_DT;
use crate::input::{FrameInput, gravity_from_tilt};
use crate::ui::{UiAction, hit_test};

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &FrameInput) {
    state.session.time_ticks += 1;

    // Title screen: a tap starts the round, nothing else runs
    if state.session.title {
        if !input.taps.is_empty() {
            state.start_new_round();
        }
        return;
    }

    let (width, height) = (state.world.width(), state.world.height());
    for &tap in &input.taps {
        match hit_test(tap, false, state.session.dialog, width, height) {
            Some(UiAction::ToggleMute) => state.toggle_mute(),
            Some(UiAction::Retry) => state.restart(),
            Some(UiAction::StartRound) | None => {}
        }
    }

    let gravity = gravity_from_tilt(input.tilt, &state.tuning.tilt);
    state.world.set_gravity(gravity);

    if !state.session.dialog {
        let GameState {
            world,
            session,
            dropper,
            rng,
            ..
        } = state;
        world.step(SIM_DT, &mut MergeRule::new(session));
        if !session.game_over {
            dropper.tick(world, session, rng);
        }
    }

    state.dropper.spin();
    check_bounds(&state.world, &mut state.session);

    if state.session.game_over && state.session.summary.is_none() {
        let summary = state.session.prepare_summary();
        log::info!(
            "Round over: score {}, {} top-tier merges, best {}",
            summary.score,
            summary.top_tier_merges,
            summary.high_score
        );
        freeze_fruits(&mut state.world, &state.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MusicCommand, SoundEffect};
    use crate::sim::{FruitKind, GameEvent, GameOverCause};
    use crate::ui::{DialogLayout, mute_button};
    use glam::Vec2;

    fn tap(at: Vec2) -> FrameInput {
        FrameInput::default().with_tap(at)
    }

    fn started(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.start_new_round();
        state.drain_events();
        state
    }

    fn retry_center() -> Vec2 {
        let r = DialogLayout::centered(480.0, 800.0).retry;
        Vec2::new(r.x + r.width / 2.0, r.y + r.height / 2.0)
    }

    #[test]
    fn test_title_screen_holds_simulation() {
        let mut state = GameState::new(3);
        for _ in 0..100 {
            tick(&mut state, &FrameInput::default());
        }
        assert!(state.session.title);
        assert_eq!(state.world.steps(), 0);
        assert_eq!(state.world.fruit_count(), 0);
        assert_eq!(state.session.time_ticks, 100);

        tick(&mut state, &tap(Vec2::new(240.0, 400.0)));
        assert!(!state.session.title);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::Music(MusicCommand::Start))
        );
    }

    #[test]
    fn test_first_drop_after_interval() {
        let mut state = started(3);
        for _ in 0..44 {
            tick(&mut state, &FrameInput::default());
        }
        assert_eq!(state.world.fruit_count(), 0);

        // The 45th frame queues the drop; the 46th frame's step applies it
        tick(&mut state, &FrameInput::default());
        assert_eq!(state.world.fruit_count(), 0);
        assert_eq!(state.world.pending().len(), 1);
        tick(&mut state, &FrameInput::default());
        let fruit = state.fruit_snapshots();
        assert_eq!(fruit.len(), 1);
        assert_eq!(fruit[0].kind, FruitKind::Grape);
        assert!((fruit[0].position.x - 240.0).abs() < 1.0);
    }

    #[test]
    fn test_tilt_drives_gravity() {
        let mut state = started(3);
        tick(&mut state, &FrameInput::default().with_tilt(Vec2::new(1.0, -2.0)));
        assert_eq!(state.world.gravity(), Vec2::new(100.0, 200.0));
        tick(&mut state, &FrameInput::default());
        assert_eq!(state.world.gravity(), Vec2::new(0.0, 500.0));
    }

    #[test]
    fn test_mute_tap_toggles() {
        let mut state = started(3);
        let r = mute_button(480.0);
        let at = Vec2::new(r.x + 5.0, r.y + 5.0);
        tick(&mut state, &tap(at));
        assert!(state.muted());
        tick(&mut state, &tap(at));
        assert!(!state.muted());
    }

    #[test]
    fn test_escape_shows_dialog_and_freezes() {
        let mut state = started(3);
        state
            .world
            .add_fruit(FruitKind::Apple, Vec2::new(240.0, 600.0), 0.0);
        let body = state.fruit_snapshots()[0].body;
        state.world.set_body_position(body, Vec2::new(-20.0, 600.0));
        tick(&mut state, &FrameInput::default());

        assert!(state.is_game_over());
        assert!(state.session.dialog);
        assert_eq!(
            state.session.game_over_cause,
            Some(GameOverCause::OutOfBounds)
        );
        assert!(state.world.bodies().all(|b| b.velocity == Vec2::ZERO));

        // Frozen: no steps, no drops while the dialog is up
        let steps = state.world.steps();
        let count = state.world.fruit_count();
        for _ in 0..120 {
            tick(&mut state, &FrameInput::default());
        }
        assert_eq!(state.world.steps(), steps);
        assert_eq!(state.world.fruit_count(), count);
        let cues = state
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::Sound(SoundEffect::GameOver))
            .count();
        assert_eq!(cues, 1);
    }

    #[test]
    fn test_blocked_drop_site_ends_round() {
        let mut state = started(3);
        // Upside down: the apple rests against the top wall over the drop site
        let shaken = FrameInput::default().with_tilt(Vec2::new(0.0, 5.0));
        state
            .world
            .add_fruit(FruitKind::Apple, Vec2::new(240.0, 40.0), 0.0);

        for _ in 0..134 {
            tick(&mut state, &shaken);
        }
        assert!(!state.is_game_over());
        assert_eq!(state.spawn_failures(), 2);

        tick(&mut state, &shaken);
        assert!(state.is_game_over());
        assert_eq!(
            state.session.game_over_cause,
            Some(GameOverCause::SpawnBlocked)
        );
        assert!(state.session.dialog);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Music(MusicCommand::Stop)));
        assert_eq!(state.world.fruit_count(), 1);
    }

    #[test]
    fn test_same_seed_same_round() {
        let mut a = started(99);
        let mut b = started(99);
        for _ in 0..600 {
            tick(&mut a, &FrameInput::default());
            tick(&mut b, &FrameInput::default());
        }
        assert!(a.world.fruit_count() > 0);
        assert_eq!(a.score(), b.score());
        assert_eq!(a.fruit_snapshots(), b.fruit_snapshots());
        assert_eq!(a.preview(), b.preview());
    }

    #[test]
    fn test_retry_restarts_round() {
        let mut state = started(3);
        state.session.score = 250;
        state
            .world
            .add_fruit(FruitKind::Pear, Vec2::new(240.0, 600.0), 0.0);
        let body = state.fruit_snapshots()[0].body;
        state.world.set_body_position(body, Vec2::new(240.0, 900.0));
        tick(&mut state, &FrameInput::default());
        assert!(state.session.dialog);
        assert_eq!(state.high_score(), 250);

        // A tap outside the button does nothing
        tick(&mut state, &tap(Vec2::new(5.0, 790.0)));
        assert!(state.session.dialog);

        tick(&mut state, &tap(retry_center()));
        assert!(!state.session.dialog);
        assert!(!state.is_game_over());
        assert_eq!(state.score(), 0);
        assert_eq!(state.high_score(), 250);
        assert_eq!(state.spawn_failures(), 0);
        // The queued removal landed in the same frame's step
        assert_eq!(state.world.fruit_count(), 0);
        let mut tagged = 0;
        state.world.for_each_body(|b| {
            if b.kind().is_some() {
                tagged += 1;
            }
        });
        assert_eq!(tagged, 0);
    }

    #[test]
    fn test_drop_queued_as_round_ends_is_discarded_on_retry() {
        let mut state = started(3);
        for _ in 0..44 {
            tick(&mut state, &FrameInput::default());
        }
        let shape = state
            .world
            .add_fruit(FruitKind::Pear, Vec2::new(240.0, 600.0), 0.0);
        let body = state.world.body_of(shape).expect("pear");
        state.world.set_body_position(body, Vec2::new(240.0, 900.0));

        // Same frame: the drop is queued, then the escaped pear ends the round
        tick(&mut state, &FrameInput::default());
        assert!(state.session.dialog);
        assert_eq!(state.world.pending().len(), 1);

        tick(&mut state, &tap(retry_center()));
        assert!(!state.is_game_over());
        assert_eq!(state.world.fruit_count(), 0);
        assert!(state.world.pending().is_empty());
    }
}
