//! Cube Sim entry point
//!
//! The web build is driven from JavaScript through `platform::web`. The
//! native binary runs a headless scramble and reset through the fixed-step
//! loop and logs the result.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use cube_sim::consts::SIM_DT;
    use cube_sim::{CubeEngine, Move};

    env_logger::init();
    log::info!("Cube Sim (native) starting...");

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut engine = CubeEngine::new(seed);
    engine.set_on_move_end(Some(Box::new(|mv: Move| log::debug!("Move ended: {mv}"))));

    let scramble = engine.scramble_default();
    // Feed frame times the way a 60 Hz render loop would
    while engine.is_busy() {
        engine.update(SIM_DT);
    }
    log::info!(
        "Scrambled with {} moves (solved: {})",
        scramble.len(),
        engine.is_solved()
    );

    engine.reset();
    let ticks = engine.settle();
    log::info!(
        "Reset took {ticks} ticks (solved: {}, history: {})",
        engine.is_solved(),
        engine.step_count()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
