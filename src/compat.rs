//! Rules deciding whether neighbouring pieces can physically join.

use crate::piece::{Edge, Piece, BIT_COUNT, EDGE_LENGTH, EDGE_WINDOW, SIDE_COUNT};

/// Two edges fit when every tooth meets its opposite: a protrusion on one
/// side needs a recess on the other.
///
/// With `reverse`, the second edge is read back to front, which is how two
/// faces meeting along a shared edge traverse it.
#[inline]
pub fn edge_compatible(first: &Edge, second: &Edge, reverse: bool) -> bool {
    (0..EDGE_WINDOW).all(|tooth| {
        let opposite = if reverse {
            second[EDGE_WINDOW - 1 - tooth]
        } else {
            second[tooth]
        };
        first[tooth] != opposite
    })
}

/// Exactly one of the corners meeting at a vertex may protrude.
#[inline]
pub fn corner_compatible(corners: &[u8]) -> bool {
    corners.iter().map(|&bit| bit as u32).sum::<u32>() == 1
}

/// A side of the forward view together with its two flanking corners:
/// `[corner before, tooth, tooth, tooth, corner after]`.
fn side_with_corners(piece: &Piece, side: usize) -> [u8; EDGE_WINDOW + 2] {
    let bits = piece.bits();
    let start = side * EDGE_LENGTH + BIT_COUNT - 1;
    std::array::from_fn(|offset| bits[(start + offset) % BIT_COUNT])
}

fn teeth(run: &[u8; EDGE_WINDOW + 2]) -> Edge {
    [run[1], run[2], run[3]]
}

/// Counts the compatible side pairings across a whole piece set.
///
/// Every unordered pair of pieces and every pair of sides is tried both
/// reversed and straight. Besides fitting teeth, the corners at each end of
/// the joint may not both protrude.
pub fn count_matching_edges(pieces: &[Piece]) -> usize {
    let mut count = 0;
    let last = EDGE_WINDOW + 1;

    for (index, first) in pieces.iter().enumerate() {
        for second in &pieces[index + 1..] {
            for first_side in 0..SIDE_COUNT {
                let a = side_with_corners(first, first_side);
                for second_side in 0..SIDE_COUNT {
                    let b = side_with_corners(second, second_side);

                    if edge_compatible(&teeth(&a), &teeth(&b), true)
                        && a[0] + b[last] <= 1
                        && a[last] + b[0] <= 1
                    {
                        count += 1;
                    }
                    if edge_compatible(&teeth(&a), &teeth(&b), false)
                        && a[0] + b[0] <= 1
                        && a[last] + b[last] <= 1
                    {
                        count += 1;
                    }
                }
            }
        }
    }

    count
}
