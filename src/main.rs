//! Suika Shaker headless driver
//!
//! Runs a seeded round without a window and logs how it went.
//! Usage: `suika-shaker [seed] [max-frames]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use suika_shaker::audio::{LogSink, dispatch};
    use suika_shaker::{FrameInput, GameState, tick};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345u64);
    let max_frames = args.next().and_then(|s| s.parse().ok()).unwrap_or(60 * 60 * 5u32);
    log::info!("Suika Shaker (headless) starting, seed {}", seed);

    let mut state = GameState::new(seed);
    state.start_new_round();
    let mut sink = LogSink;
    let idle = FrameInput::default();

    for frame in 0..max_frames {
        tick(&mut state, &idle);
        let events = state.drain_events();
        dispatch(&events, state.muted(), &mut sink);

        if frame % 600 == 0 {
            log::info!(
                "frame {}: score {}, {} fruit",
                frame,
                state.score(),
                state.world.fruit_count()
            );
        }
        if state.session.dialog {
            break;
        }
    }

    match state.session.summary {
        Some(summary) => println!(
            "Game over after {} frames: score {}, {} top-tier merges, best {}",
            state.session.time_ticks, summary.score, summary.top_tier_merges, summary.high_score
        ),
        None => println!(
            "Stopped after {} frames: score {}, {} fruit on the board",
            state.session.time_ticks,
            state.score(),
            state.world.fruit_count()
        ),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts drive `tick` themselves
}
