//! Cubie registry and puzzle state
//!
//! The 27 cubies are the single source of truth for position and
//! orientation. Renderers read from here; nothing writes back.

use glam::{IVec3, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::notation::{Axis, Face};
use crate::consts::*;
use crate::{grid_index, round_to_grid};

/// Stable cubie identity (index into the registry, 0..27)
pub type CubieId = usize;

/// The six outward face normals, in `R L U D F B` order
const FACE_NORMALS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// One unit sub-cube
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cubie {
    pub id: CubieId,
    /// Grid coordinate in the solved state
    initial: IVec3,
    /// Current center position
    pub position: Vec3,
    /// Current orientation relative to the solved state
    pub orientation: Quat,
}

impl Cubie {
    fn new(id: CubieId, initial: IVec3) -> Self {
        Self {
            id,
            initial,
            position: initial.as_vec3() * GRID_STEP,
            orientation: Quat::IDENTITY,
        }
    }

    /// Grid coordinate in the solved state
    pub fn initial(&self) -> IVec3 {
        self.initial
    }

    /// Current position rounded to grid indices
    pub fn grid_position(&self) -> IVec3 {
        IVec3::new(
            grid_index(self.position.x),
            grid_index(self.position.y),
            grid_index(self.position.z),
        )
    }

    /// Faces that carry a sticker in the solved state
    pub fn stickers(&self) -> impl Iterator<Item = Face> + '_ {
        Face::ALL
            .into_iter()
            .filter(|face| face.axis().component(self.initial.as_vec3()) as i32 == face.layer())
    }

    /// Rotate about a world axis through the puzzle center
    pub fn rotate_about(&mut self, axis: Axis, angle: f32) {
        let rot = Quat::from_axis_angle(axis.unit(), angle);
        self.position = rot * self.position;
        self.orientation = (rot * self.orientation).normalize();
    }

    /// Snap position onto the grid and orientation onto the nearest
    /// axis-aligned rotation
    pub fn snap(&mut self) {
        self.position = Vec3::new(
            round_to_grid(self.position.x, GRID_STEP),
            round_to_grid(self.position.y, GRID_STEP),
            round_to_grid(self.position.z, GRID_STEP),
        );

        let m = Mat3::from_quat(self.orientation);
        let snapped = Mat3::from_cols(m.x_axis.round(), m.y_axis.round(), m.z_axis.round());
        // Only a signed permutation matrix is a valid snap target
        if snapped.determinant() == 1.0 {
            self.orientation = Quat::from_mat3(&snapped).normalize();
        } else {
            log::warn!("Cubie {} orientation too far off-grid to snap", self.id);
        }
    }

    fn in_home_position(&self) -> bool {
        self.grid_position() == self.initial
    }

    fn in_home_orientation(&self, tolerance: f32) -> bool {
        FACE_NORMALS
            .iter()
            .all(|&n| ((self.orientation * n).dot(n) - 1.0).abs() <= tolerance)
    }
}

/// Live puzzle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeState {
    cubies: Vec<Cubie>,
}

impl Default for CubeState {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeState {
    /// Create a solved puzzle
    ///
    /// Identities follow nested x, y, z loops over `-1..=1`, so id 0 is
    /// the `(-1, -1, -1)` corner and id 26 the `(1, 1, 1)` corner.
    pub fn new() -> Self {
        let mut cubies = Vec::with_capacity(CUBIE_COUNT);
        for x in GRID {
            for y in GRID {
                for z in GRID {
                    cubies.push(Cubie::new(cubies.len(), IVec3::new(x, y, z)));
                }
            }
        }
        Self { cubies }
    }

    pub fn cubies(&self) -> &[Cubie] {
        &self.cubies
    }

    pub fn cubie(&self, id: CubieId) -> Option<&Cubie> {
        self.cubies.get(id)
    }

    /// Identities of the cubies currently in the given layer
    ///
    /// Reads live positions, so the result reflects every completed turn.
    pub fn select_layer(&self, axis: Axis, layer: i32) -> Vec<CubieId> {
        self.cubies
            .iter()
            .filter(|c| grid_index(axis.component(c.position)) == layer)
            .map(|c| c.id)
            .collect()
    }

    /// Rotate the given cubies about a world axis
    pub fn rotate_cubies(&mut self, ids: &[CubieId], axis: Axis, angle: f32) {
        for &id in ids {
            if let Some(cubie) = self.cubies.get_mut(id) {
                cubie.rotate_about(axis, angle);
            }
        }
    }

    /// Snap every cubie back onto the grid
    pub fn snap_all(&mut self) {
        for cubie in &mut self.cubies {
            cubie.snap();
        }
    }

    /// Whether every cubie is home, in position and orientation
    ///
    /// Positions are checked for all cubies before any orientation.
    pub fn is_solved(&self, orientation_tolerance: f32) -> bool {
        self.cubies.iter().all(Cubie::in_home_position)
            && self
                .cubies
                .iter()
                .all(|c| c.in_home_orientation(orientation_tolerance))
    }
}
