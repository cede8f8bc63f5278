//! Slope Runner entry point
//!
//! Headless native driver: runs one seeded descent with no input and logs what
//! happens. Usage: `slope-runner [settings.json] [seconds]`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use slope_runner::Settings;
    use slope_runner::consts::SIM_DT;
    use slope_runner::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

    env_logger::init();
    log::info!("Slope Runner (native) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);

    let mut state = GameState::with_settings(settings);
    let ticks = (seconds / SIM_DT) as u64;
    let per_second = (1.0 / SIM_DT) as u64;
    let input = TickInput::default();

    for _ in 0..ticks {
        tick(&mut state, &input, SIM_DT);

        for event in state.drain_events() {
            match event {
                GameEvent::TerrainChanged(terrain) => {
                    log::info!("x={:.0}: terrain -> {}", state.rider.pos.x, terrain.as_str())
                }
                other => log::info!("x={:.0}: {other:?}", state.rider.pos.x),
            }
        }

        if state.time_ticks % per_second == 0 {
            let t = state.rider.telemetry();
            log::info!(
                "t={:>3}s x={:>7.0} {:<15} slope={:>5.1}° v=({:>6.1}, {:>6.1}) gap={}",
                state.time_ticks / per_second,
                state.rider.pos.x,
                t.move_state.as_str(),
                t.slope_angle.to_degrees(),
                t.forward_velocity,
                t.vertical_velocity,
                t.over_gap
            );
        }

        if state.phase == GamePhase::Crashed {
            break;
        }
    }

    println!(
        "seed {}: {} after {:.1}s, distance {:.0}, score {}, {} segments generated",
        state.seed,
        if state.phase == GamePhase::Crashed { "crashed" } else { "still riding" },
        state.time_ticks as f32 * SIM_DT,
        state.distance(),
        state.score,
        state.track.generated_count()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation core has no web entry point
}
