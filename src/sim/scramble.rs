//! Scramble generation

use rand::Rng;

use super::notation::{Face, Move, TurnKind};

/// Generate `n` random face turns, never turning the same face twice in a row
pub fn generate_scramble<R: Rng>(rng: &mut R, n: usize) -> Vec<Move> {
    let mut moves = Vec::with_capacity(n);
    let mut last_face = None;
    for _ in 0..n {
        let face = loop {
            let face = Face::ALL[rng.random_range(0..Face::ALL.len())];
            if Some(face) != last_face {
                break face;
            }
        };
        last_face = Some(face);
        let kind = TurnKind::ALL[rng.random_range(0..TurnKind::ALL.len())];
        moves.push(Move::new(face, kind));
    }
    moves
}
