//! Move notation
//!
//! A move token is `<Face><Suffix>`: face in `U D L R F B`, suffix `""`
//! (quarter turn), `'` (reverse quarter turn) or `2` (half turn).

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::CubeError;

/// World rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Unit vector along the axis
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Component of `v` along this axis
    #[inline]
    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

/// Outer face of the puzzle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    U,
    D,
    L,
    R,
    F,
    B,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::U, Face::D, Face::L, Face::R, Face::F, Face::B];

    /// Axis the face is perpendicular to
    pub fn axis(self) -> Axis {
        match self {
            Face::U | Face::D => Axis::Y,
            Face::L | Face::R => Axis::X,
            Face::F | Face::B => Axis::Z,
        }
    }

    /// Layer coordinate of the face on its axis
    pub fn layer(self) -> i32 {
        match self {
            Face::U | Face::R | Face::F => 1,
            Face::D | Face::L | Face::B => -1,
        }
    }

    /// Quarter-turn angle that reads clockwise when looking at the face
    pub fn base_angle(self) -> f32 {
        // Right-handed rotation about the outward normal is counter-clockwise
        -(self.layer() as f32) * FRAC_PI_2
    }

    /// Outward unit normal
    pub fn normal(self) -> Vec3 {
        self.axis().unit() * self.layer() as f32
    }

    pub fn as_char(self) -> char {
        match self {
            Face::U => 'U',
            Face::D => 'D',
            Face::L => 'L',
            Face::R => 'R',
            Face::F => 'F',
            Face::B => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'U' => Some(Face::U),
            'D' => Some(Face::D),
            'L' => Some(Face::L),
            'R' => Some(Face::R),
            'F' => Some(Face::F),
            'B' => Some(Face::B),
            _ => None,
        }
    }
}

/// Turn amount and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnKind {
    /// No suffix
    Clockwise,
    /// `'`
    CounterClockwise,
    /// `2`
    Half,
}

impl TurnKind {
    pub const ALL: [TurnKind; 3] = [TurnKind::Clockwise, TurnKind::CounterClockwise, TurnKind::Half];

    pub fn suffix(self) -> &'static str {
        match self {
            TurnKind::Clockwise => "",
            TurnKind::CounterClockwise => "'",
            TurnKind::Half => "2",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "" => Some(TurnKind::Clockwise),
            "'" => Some(TurnKind::CounterClockwise),
            "2" => Some(TurnKind::Half),
            _ => None,
        }
    }
}

/// Geometric content of a move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub axis: Axis,
    /// Layer coordinate on `axis` (-1 or 1)
    pub layer: i32,
    /// Signed rotation angle (radians)
    pub angle: f32,
}

/// A single face turn, e.g. `R'`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub face: Face,
    pub kind: TurnKind,
}

impl Move {
    pub const fn new(face: Face, kind: TurnKind) -> Self {
        Self { face, kind }
    }

    /// All 18 face turns
    pub fn all() -> impl Iterator<Item = Move> {
        Face::ALL
            .into_iter()
            .flat_map(|face| TurnKind::ALL.into_iter().map(move |kind| Move::new(face, kind)))
    }

    /// Axis, layer and signed angle of this move
    pub fn rotation(self) -> Rotation {
        let base = self.face.base_angle();
        let angle = match self.kind {
            TurnKind::Clockwise => base,
            TurnKind::CounterClockwise => -base,
            TurnKind::Half => base * 2.0,
        };
        Rotation {
            axis: self.face.axis(),
            layer: self.face.layer(),
            angle,
        }
    }

    /// Move that undoes this one
    pub fn inverse(self) -> Self {
        let kind = match self.kind {
            TurnKind::Clockwise => TurnKind::CounterClockwise,
            TurnKind::CounterClockwise => TurnKind::Clockwise,
            TurnKind::Half => TurnKind::Half,
        };
        Self::new(self.face, kind)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face.as_char(), self.kind.suffix())
    }
}

impl FromStr for Move {
    type Err = CubeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let trimmed = token.trim();
        let mut chars = trimmed.chars();
        let face = chars
            .next()
            .and_then(Face::from_char)
            .ok_or_else(|| CubeError::InvalidMoveToken(token.to_string()))?;
        let kind = TurnKind::from_suffix(chars.as_str())
            .ok_or_else(|| CubeError::InvalidMoveToken(token.to_string()))?;
        Ok(Move::new(face, kind))
    }
}

/// Parse a move token into its rotation
pub fn parse(token: &str) -> Result<Rotation, CubeError> {
    Ok(token.parse::<Move>()?.rotation())
}

/// Inverse of a move token, in canonical notation
pub fn inverse(token: &str) -> Result<String, CubeError> {
    Ok(token.parse::<Move>()?.inverse().to_string())
}

/// Parse a whitespace-separated move sequence, e.g. `"R U R' U'"`
pub fn parse_sequence(seq: &str) -> Result<Vec<Move>, CubeError> {
    seq.split_whitespace().map(str::parse).collect()
}
