//! Deterministic puzzle engine
//!
//! All puzzle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by cubie ID)
//! - No rendering or platform dependencies

pub mod engine;
pub mod history;
pub mod notation;
pub mod scramble;
pub mod state;
pub mod turn;

pub use engine::{BatchCallback, CubeEngine, MoveEndListener, MoveSource, RotateOptions};
pub use history::{History, HistoryEvent, SubscriptionId};
pub use notation::{Axis, Face, Move, Rotation, TurnKind, inverse, parse, parse_sequence};
pub use scramble::generate_scramble;
pub use state::{CubeState, Cubie, CubieId};
pub use turn::{Turn, TurnExecutor, TurnProgress};
