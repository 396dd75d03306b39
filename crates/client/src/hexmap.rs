//! Axial hex-grid helpers.

use game_core::Hex;

/// Axial neighbour offsets, east first, counter-clockwise.
const NEIGHBOURS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

pub fn distance(a: Hex, b: Hex) -> i32 {
    let dq = a.col - b.col;
    let dr = a.row - b.row;
    (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
}

pub fn neighbours(hex: Hex) -> impl Iterator<Item = Hex> {
    NEIGHBOURS
        .iter()
        .map(move |(dq, dr)| Hex::new(hex.col + dq, hex.row + dr))
}

/// The neighbour of `from` closest to `to`.
pub fn step_toward(from: Hex, to: Hex) -> Hex {
    neighbours(from)
        .min_by_key(|hex| distance(*hex, to))
        .unwrap_or(from)
}

/// The neighbour of `from` farthest from `away`, among those `free` accepts.
pub fn step_away(from: Hex, away: Hex, free: impl Fn(Hex) -> bool) -> Option<Hex> {
    neighbours(from)
        .filter(|hex| free(*hex))
        .filter(|hex| distance(*hex, away) > distance(from, away))
        .min_by_key(|hex| -distance(*hex, away))
}
