//! Slot topology and the constraints a valid assembly must satisfy.
//!
//! A grid has a fixed number of slots, each receiving one piece in one
//! orientation. Constraints name the slots and sides they inspect and are
//! vacuously satisfied until every slot they reference is filled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compat::{corner_compatible, edge_compatible};
use crate::piece::{Orientation, Piece, PieceError, Side};

/// A piece index (into the solver's piece list) and the orientation it is placed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub piece: usize,
    pub orientation: Orientation,
}

/// Content of one grid slot.
pub type Slot = Option<Placement>;

/// Errors raised while compiling grid constraints.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("slot {slot} out of range for a grid of {piece_count} slots")]
    SlotOutOfRange { slot: usize, piece_count: usize },
    #[error(transparent)]
    Side(#[from] PieceError),
    #[error("corner constraint needs 3, 4 or 5 corners, got {0}")]
    CornerArity(usize),
}

fn default_reversed() -> bool {
    true
}

/// Declaration of an edge joint, kept for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub slot_a: usize,
    pub side_a: usize,
    pub slot_b: usize,
    pub side_b: usize,
    #[serde(default = "default_reversed")]
    pub reversed: bool,
}

/// Declaration of a vertex shared by 3, 4 or 5 faces: `(slot, corner side)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CornerSpec(pub Vec<(usize, usize)>);

/// A side (or the corner following it) of whatever fills a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideRef {
    pub slot: usize,
    pub side: Side,
}

impl SideRef {
    const fn new(slot: usize, side: Side) -> Self {
        Self { slot, side }
    }

    #[inline]
    fn placement(&self, slots: &[Slot]) -> Option<Placement> {
        slots.get(self.slot).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeConstraint {
    pub a: SideRef,
    pub b: SideRef,
    pub reversed: bool,
}

impl EdgeConstraint {
    fn evaluate(&self, pieces: &[Piece], slots: &[Slot]) -> bool {
        let (Some(first), Some(second)) = (self.a.placement(slots), self.b.placement(slots)) else {
            return true;
        };
        edge_compatible(
            &pieces[first.piece].edge_at(self.a.side, first.orientation),
            &pieces[second.piece].edge_at(self.b.side, second.orientation),
            self.reversed,
        )
    }

    fn spec(&self) -> EdgeSpec {
        EdgeSpec {
            slot_a: self.a.slot,
            side_a: self.a.side.index(),
            slot_b: self.b.slot,
            side_b: self.b.side.index(),
            reversed: self.reversed,
        }
    }
}

/// A vertex where `N` corners meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerConstraint<const N: usize> {
    pub corners: [SideRef; N],
}

impl<const N: usize> CornerConstraint<N> {
    fn evaluate(&self, pieces: &[Piece], slots: &[Slot]) -> bool {
        let mut bits = [0u8; N];
        for (bit, corner) in bits.iter_mut().zip(&self.corners) {
            let Some(placement) = corner.placement(slots) else {
                return true;
            };
            *bit = pieces[placement.piece].corner_at(corner.side, placement.orientation);
        }
        corner_compatible(&bits)
    }

    fn spec(&self) -> CornerSpec {
        CornerSpec(
            self.corners
                .iter()
                .map(|corner| (corner.slot, corner.side.index()))
                .collect(),
        )
    }
}

/// A compiled grid constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Edge(EdgeConstraint),
    Corner3(CornerConstraint<3>),
    Corner4(CornerConstraint<4>),
    Corner5(CornerConstraint<5>),
}

impl Constraint {
    /// Whether the constraint holds for the given slot contents.
    ///
    /// Slots are resolved against `pieces` by placement index.
    #[inline]
    pub fn evaluate(&self, pieces: &[Piece], slots: &[Slot]) -> bool {
        match self {
            Constraint::Edge(edge) => edge.evaluate(pieces, slots),
            Constraint::Corner3(corner) => corner.evaluate(pieces, slots),
            Constraint::Corner4(corner) => corner.evaluate(pieces, slots),
            Constraint::Corner5(corner) => corner.evaluate(pieces, slots),
        }
    }
}

/// Side names used by the builtin topologies. The corner of a side is the
/// one it shares with the next side clockwise.
const TOP: Side = Side::ALL[0];
const RIGHT: Side = Side::ALL[1];
const BOTTOM: Side = Side::ALL[2];
const LEFT: Side = Side::ALL[3];

/// Cube faces, each viewed from outside, laid out as the net
///
/// ```text
///      U
///   L  F  R  B
///      D
/// ```
const UP: usize = 0;
const FRONT: usize = 1;
const RIGHT_FACE: usize = 2;
const BACK: usize = 3;
const LEFT_FACE: usize = 4;
const DOWN: usize = 5;

const CUBE_EDGES: [(usize, Side, usize, Side); 12] = [
    (UP, BOTTOM, FRONT, TOP),
    (FRONT, RIGHT, RIGHT_FACE, LEFT),
    (FRONT, LEFT, LEFT_FACE, RIGHT),
    (FRONT, BOTTOM, DOWN, TOP),
    (RIGHT_FACE, RIGHT, BACK, LEFT),
    (BACK, RIGHT, LEFT_FACE, LEFT),
    (UP, TOP, BACK, TOP),
    (UP, RIGHT, RIGHT_FACE, TOP),
    (UP, LEFT, LEFT_FACE, TOP),
    (DOWN, BOTTOM, BACK, BOTTOM),
    (DOWN, RIGHT, RIGHT_FACE, BOTTOM),
    (DOWN, LEFT, LEFT_FACE, BOTTOM),
];

const CUBE_CORNERS: [[(usize, Side); 3]; 8] = [
    [(FRONT, TOP), (UP, RIGHT), (RIGHT_FACE, LEFT)],
    [(FRONT, LEFT), (UP, BOTTOM), (LEFT_FACE, TOP)],
    [(FRONT, RIGHT), (DOWN, TOP), (RIGHT_FACE, BOTTOM)],
    [(FRONT, BOTTOM), (DOWN, LEFT), (LEFT_FACE, RIGHT)],
    [(UP, TOP), (RIGHT_FACE, TOP), (BACK, LEFT)],
    [(UP, LEFT), (LEFT_FACE, LEFT), (BACK, TOP)],
    [(DOWN, RIGHT), (RIGHT_FACE, RIGHT), (BACK, BOTTOM)],
    [(DOWN, BOTTOM), (LEFT_FACE, BOTTOM), (BACK, RIGHT)],
];

/// A slot topology plus its compiled constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    piece_count: usize,
    edges: Vec<EdgeSpec>,
    corners: Vec<CornerSpec>,
    constraints: Vec<Constraint>,
}

impl Grid {
    pub fn new(piece_count: usize) -> Self {
        Self {
            piece_count,
            edges: Vec::new(),
            corners: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// The six faces of a cube: twelve reversed edge joints and eight
    /// three-way vertices. Slots are U, F, R, B, L, D.
    pub fn cube() -> Self {
        let mut grid = Grid::new(6);
        for (slot_a, side_a, slot_b, side_b) in CUBE_EDGES {
            grid.push(Constraint::Edge(EdgeConstraint {
                a: SideRef::new(slot_a, side_a),
                b: SideRef::new(slot_b, side_b),
                reversed: true,
            }));
        }
        for vertex in CUBE_CORNERS {
            grid.push(Constraint::Corner3(CornerConstraint {
                corners: vertex.map(|(slot, side)| SideRef::new(slot, side)),
            }));
        }
        grid
    }

    /// `count` slots in a closed loop, the right side of each slot joined
    /// to the left side of the next.
    pub fn ring(count: usize) -> Self {
        let mut grid = Grid::new(count);
        for slot in 0..count {
            grid.push(Constraint::Edge(EdgeConstraint {
                a: SideRef::new(slot, RIGHT),
                b: SideRef::new((slot + 1) % count, LEFT),
                reversed: true,
            }));
        }
        grid
    }

    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    pub fn edges(&self) -> &[EdgeSpec] {
        &self.edges
    }

    pub fn corners(&self) -> &[CornerSpec] {
        &self.corners
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn side_ref(&self, slot: usize, side: usize) -> Result<SideRef, GridError> {
        if slot >= self.piece_count {
            return Err(GridError::SlotOutOfRange {
                slot,
                piece_count: self.piece_count,
            });
        }
        Ok(SideRef::new(slot, Side::new(side)?))
    }

    fn push(&mut self, constraint: Constraint) {
        match &constraint {
            Constraint::Edge(edge) => self.edges.push(edge.spec()),
            Constraint::Corner3(corner) => self.corners.push(corner.spec()),
            Constraint::Corner4(corner) => self.corners.push(corner.spec()),
            Constraint::Corner5(corner) => self.corners.push(corner.spec()),
        }
        self.constraints.push(constraint);
    }

    /// Joins `side_a` of `slot_a` with `side_b` of `slot_b`.
    ///
    /// Faces meeting along an edge usually traverse it in opposite
    /// directions, hence `reversed` is normally `true`.
    pub fn add_edge(
        &mut self,
        slot_a: usize,
        side_a: usize,
        slot_b: usize,
        side_b: usize,
        reversed: bool,
    ) -> Result<(), GridError> {
        let a = self.side_ref(slot_a, side_a)?;
        let b = self.side_ref(slot_b, side_b)?;
        self.push(Constraint::Edge(EdgeConstraint { a, b, reversed }));
        Ok(())
    }

    pub fn add_edge_spec(&mut self, spec: EdgeSpec) -> Result<(), GridError> {
        self.add_edge(spec.slot_a, spec.side_a, spec.slot_b, spec.side_b, spec.reversed)
    }

    /// Declares a vertex shared by the given `(slot, corner side)` pairs.
    ///
    /// Only 3, 4 or 5 corners can meet at a vertex; anything else is rejected
    /// and the grid is left unchanged.
    pub fn add_corner(&mut self, corners: &[(usize, usize)]) -> Result<(), GridError> {
        let refs = corners
            .iter()
            .map(|&(slot, side)| self.side_ref(slot, side))
            .collect::<Result<Vec<_>, _>>()?;

        let constraint = match refs.len() {
            3 => Constraint::Corner3(CornerConstraint {
                corners: [refs[0], refs[1], refs[2]],
            }),
            4 => Constraint::Corner4(CornerConstraint {
                corners: [refs[0], refs[1], refs[2], refs[3]],
            }),
            5 => Constraint::Corner5(CornerConstraint {
                corners: [refs[0], refs[1], refs[2], refs[3], refs[4]],
            }),
            arity => return Err(GridError::CornerArity(arity)),
        };
        self.push(constraint);
        Ok(())
    }

    pub fn add_corner_spec(&mut self, spec: &CornerSpec) -> Result<(), GridError> {
        self.add_corner(&spec.0)
    }

    /// Whether every constraint holds. Re-evaluates all of them on each call.
    pub fn check(&self, pieces: &[Piece], slots: &[Slot]) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.evaluate(pieces, slots))
    }
}

/// Formats slot contents compactly as `piece/orientation`, `-` for empty slots.
pub fn format_slots(slots: &[Slot]) -> String {
    let mut output = String::new();
    for (index, slot) in slots.iter().enumerate() {
        if index > 0 {
            output.push(' ');
        }
        match slot {
            Some(placement) => {
                output.push_str(&format!("{}/{}", placement.piece, placement.orientation));
            }
            None => output.push('-'),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A six-piece set that closes the cube with pieces in scrambled slots
    /// and orientations.
    const CUBE_PIECES: [&str; 6] = [
        "0100000100101011",
        "1101011010011010",
        "1101011001100100",
        "1011101010001001",
        "1100010000101110",
        "0100100101101000",
    ];

    /// The unique assembly of `CUBE_PIECES`, as (piece, orientation) per slot.
    const CUBE_SOLUTION: [(usize, usize); 6] = [(0, 0), (2, 1), (4, 3), (1, 3), (5, 0), (3, 6)];

    fn cube_pieces() -> Vec<Piece> {
        CUBE_PIECES.iter().map(|bits| bits.parse().unwrap()).collect()
    }

    fn slots(assignment: &[(usize, usize)]) -> Vec<Slot> {
        assignment
            .iter()
            .map(|&(piece, orientation)| {
                Some(Placement {
                    piece,
                    orientation: Orientation::new(orientation).unwrap(),
                })
            })
            .collect()
    }

    #[test]
    fn test_cube_topology_uses_every_side_and_corner_once() {
        let grid = Grid::cube();
        assert_eq!(grid.piece_count(), 6);
        assert_eq!(grid.edges().len(), 12);
        assert_eq!(grid.corners().len(), 8);
        assert_eq!(grid.constraints().len(), 20);

        let mut sides = [[0; 4]; 6];
        for edge in grid.edges() {
            sides[edge.slot_a][edge.side_a] += 1;
            sides[edge.slot_b][edge.side_b] += 1;
            assert!(edge.reversed);
        }
        let mut corners = [[0; 4]; 6];
        for vertex in grid.corners() {
            for &(slot, side) in &vertex.0 {
                corners[slot][side] += 1;
            }
        }
        assert_eq!(sides, [[1; 4]; 6]);
        assert_eq!(corners, [[1; 4]; 6]);
    }

    #[test]
    fn test_known_assembly_satisfies_cube() {
        let pieces = cube_pieces();
        assert!(Grid::cube().check(&pieces, &slots(&CUBE_SOLUTION)));
    }

    #[test]
    fn test_wrong_orientation_violates_cube() {
        let pieces = cube_pieces();
        let mut assignment = CUBE_SOLUTION;
        assignment[2].1 = 0;
        assert!(!Grid::cube().check(&pieces, &slots(&assignment)));
    }

    #[test]
    fn test_unfilled_slots_are_vacuously_valid() {
        let pieces = cube_pieces();
        let grid = Grid::cube();
        assert!(grid.check(&pieces, &[None; 6]));

        // only the anchor placed: nothing to compare against
        let mut partial = vec![None; 6];
        partial[0] = slots(&[(0, 0)])[0];
        assert!(grid.check(&pieces, &partial));
    }

    #[test]
    fn test_edge_constraint_compares_oriented_edges() {
        let pieces: Vec<Piece> = ["1010000000000000", "0000000000000000"]
            .iter()
            .map(|bits| bits.parse().unwrap())
            .collect();
        let mut grid = Grid::new(2);
        grid.add_edge(0, 0, 1, 0, true).unwrap();
        // [1,0,1] against [0,0,0] fails in the middle tooth
        assert!(!grid.check(&pieces, &slots(&[(0, 0), (1, 0)])));

        let mut grid = Grid::new(2);
        grid.add_edge(0, 0, 1, 0, false).unwrap();
        let pieces: Vec<Piece> = ["1000000000000000", "0110000000000000"]
            .iter()
            .map(|bits| bits.parse().unwrap())
            .collect();
        assert!(grid.check(&pieces, &slots(&[(0, 0), (1, 0)])));
        // a quarter turn of the second piece presents a flat side
        assert!(!grid.check(&pieces, &slots(&[(0, 0), (1, 1)])));
    }

    #[test]
    fn test_corner_arities() {
        let flat: Piece = "0000000000000000".parse().unwrap();
        let pointed: Piece = "0001000000000000".parse().unwrap();
        let pieces = vec![pointed, flat.clone(), flat.clone(), flat.clone(), flat];

        for arity in 3..=5 {
            let mut grid = Grid::new(5);
            let refs: Vec<(usize, usize)> = (0..arity).map(|slot| (slot, 0)).collect();
            grid.add_corner(&refs).unwrap();
            let assignment: Vec<(usize, usize)> = (0..5).map(|piece| (piece, 0)).collect();
            assert!(grid.check(&pieces, &slots(&assignment)), "arity {arity}");
            assert_eq!(grid.corners()[0].0, refs);
        }

        let mut grid = Grid::new(3);
        grid.add_corner(&[(0, 0), (1, 0), (2, 0)]).unwrap();
        let all_flat: Vec<Piece> = vec![
            "0000000000000000".parse().unwrap(),
            "0000000000000000".parse().unwrap(),
            "0000000000000000".parse().unwrap(),
        ];
        assert!(!grid.check(&all_flat, &slots(&[(0, 0), (1, 0), (2, 0)])));
    }

    #[test]
    fn test_malformed_declarations_are_rejected() {
        let mut grid = Grid::new(3);
        assert_eq!(
            grid.add_corner(&[(0, 0), (1, 1)]),
            Err(GridError::CornerArity(2))
        );
        assert_eq!(
            grid.add_corner(&[(0, 0), (1, 1), (2, 2), (0, 1), (1, 2), (2, 3)]),
            Err(GridError::CornerArity(6))
        );
        assert_eq!(
            grid.add_edge(0, 1, 3, 3, true),
            Err(GridError::SlotOutOfRange {
                slot: 3,
                piece_count: 3
            })
        );
        assert_eq!(
            grid.add_edge(0, 4, 1, 3, true),
            Err(GridError::Side(PieceError::SideOutOfRange(4)))
        );
        assert!(grid.constraints().is_empty());
        assert!(grid.edges().is_empty());
        assert!(grid.corners().is_empty());
    }

    #[test]
    fn test_ring_links_neighbours() {
        let grid = Grid::ring(4);
        let links: Vec<(usize, usize)> = grid.edges().iter().map(|e| (e.slot_a, e.slot_b)).collect();
        assert_eq!(links, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
        assert!(grid.edges().iter().all(|e| e.side_a == 1 && e.side_b == 3));
    }

    #[test]
    fn test_format_slots() {
        let mut filled = slots(&[(0, 0), (3, 6)]);
        filled.push(None);
        assert_eq!(format_slots(&filled), "0/0 3/6 -");
    }
}
