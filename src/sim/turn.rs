//! Turn executor
//!
//! Animates one layer turn at a time at a fixed angular speed. A turn is
//! `Idle -> Active -> Idle`; completion snaps the whole puzzle back onto
//! the grid and hands the turn's payload back to the caller.

use serde::{Deserialize, Serialize};

use super::notation::{Axis, Rotation};
use super::state::{CubeState, CubieId};

/// A layer turn in flight
#[derive(Debug, Clone)]
pub struct Turn<C> {
    pub axis: Axis,
    pub layer: i32,
    /// Full signed angle of the turn (radians)
    pub total: f32,
    /// Signed angle still to rotate (radians)
    pub remaining: f32,
    /// Cubies captured from live positions when the turn started
    pub affected: Vec<CubieId>,
    /// Returned to the caller when the turn completes
    completion: C,
}

impl<C> Turn<C> {
    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Fraction of the turn already rotated, 0.0 to 1.0
    pub fn progress(&self) -> f32 {
        if self.total == 0.0 {
            1.0
        } else {
            1.0 - self.remaining / self.total
        }
    }
}

/// Renderer-facing view of the active turn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnProgress {
    pub axis: Axis,
    pub layer: i32,
    pub progress: f32,
}

/// Drives one turn at a time
#[derive(Debug, Clone)]
pub struct TurnExecutor<C> {
    active: Option<Turn<C>>,
    /// Radians per second
    max_angular_speed: f32,
    /// Completion threshold on the remaining angle (radians)
    completion_epsilon: f32,
}

impl<C> TurnExecutor<C> {
    pub fn new(max_angular_speed: f32, completion_epsilon: f32) -> Self {
        Self {
            active: None,
            max_angular_speed,
            completion_epsilon,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Turn<C>> {
        self.active.as_ref()
    }

    pub fn progress(&self) -> Option<TurnProgress> {
        self.active.as_ref().map(|turn| TurnProgress {
            axis: turn.axis,
            layer: turn.layer,
            progress: turn.progress(),
        })
    }

    /// Start a turn on the layer as it is now occupied
    ///
    /// Returns the payload back if another turn is still active.
    pub fn start(&mut self, cube: &CubeState, rotation: Rotation, completion: C) -> Result<(), C> {
        if self.active.is_some() {
            return Err(completion);
        }
        let affected = cube.select_layer(rotation.axis, rotation.layer);
        self.active = Some(Turn {
            axis: rotation.axis,
            layer: rotation.layer,
            total: rotation.angle,
            remaining: rotation.angle,
            affected,
            completion,
        });
        Ok(())
    }

    /// Advance the active turn by one fixed step
    ///
    /// Returns the payload of the turn if it completed during this step.
    pub fn tick(&mut self, cube: &mut CubeState, dt: f32) -> Option<C> {
        let turn = self.active.as_mut()?;

        let step = turn.remaining.signum() * turn.remaining.abs().min(self.max_angular_speed * dt);
        turn.remaining -= step;
        cube.rotate_cubies(&turn.affected, turn.axis, step);

        if turn.remaining.abs() >= self.completion_epsilon {
            return None;
        }

        // Re-snap all cubies, not just this layer, so drift never builds up
        cube.snap_all();
        self.active.take().map(|turn| turn.completion)
    }
}
