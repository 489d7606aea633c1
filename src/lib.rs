//! Cube Sim - a 3x3x3 twisty puzzle engine
//!
//! Core modules:
//! - `sim`: Deterministic puzzle engine (cubies, layer turns, queue, history)
//! - `settings`: Engine tunables (speeds, tolerances, tick rate)
//! - `platform`: Browser bindings for the presentation shell
//! - `error`: Crate error type

pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::CubeError;
pub use settings::EngineSettings;
pub use sim::{CubeEngine, Move, MoveSource, RotateOptions};

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one turn step per frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame gap fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Layer rotation speed in radians per second
    pub const MAX_ANGULAR_SPEED: f32 = 4.2;
    /// A turn is complete once less than this angle (radians) remains
    pub const COMPLETION_EPSILON: f32 = 1e-4;
    /// Allowed deviation of `dot(face, rotated_face)` from 1 in the solved check
    pub const ORIENTATION_TOLERANCE: f32 = 0.1;

    /// Distance between neighbouring cubie centers
    pub const GRID_STEP: f32 = 1.0;
    /// Grid coordinates along each axis
    pub const GRID: [i32; 3] = [-1, 0, 1];
    /// Number of cubies in a 3x3x3 puzzle
    pub const CUBIE_COUNT: usize = 27;

    /// Default number of moves in a scramble
    pub const DEFAULT_SCRAMBLE_LENGTH: usize = 25;
}

/// Round a coordinate to the nearest grid point
#[inline]
pub fn round_to_grid(v: f32, step: f32) -> f32 {
    (v / step).round() * step
}

/// Round a coordinate to its integer grid index
#[inline]
pub fn grid_index(v: f32) -> i32 {
    round_to_grid(v, consts::GRID_STEP) as i32
}
