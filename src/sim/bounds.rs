//! Bounds monitor
//!
//! A fruit whose center leaves the playfield rectangle ends the round.

use super::state::{GameOverCause, GameSession};
use crate::physics::World;

/// Raise game over if any fruit is out of bounds. Returns `true` only on the
/// frame that ends the round.
pub fn check_bounds(world: &World, session: &mut GameSession) -> bool {
    if session.game_over {
        return false;
    }
    let escaped = world.fruits_out_of_bounds();
    let Some(first) = escaped.first() else {
        return false;
    };
    if let Some(body) = world.body(*first) {
        log::info!(
            "{:?} left the playfield at ({:.0}, {:.0})",
            body.kind(),
            body.position.x,
            body.position.y
        );
    }
    session.signal_game_over(GameOverCause::OutOfBounds);
    true
}

/// While the round is over every fruit stays put
pub fn freeze_fruits(world: &mut World, session: &GameSession) {
    if session.game_over {
        world.stop_all_fruits();
    }
}
