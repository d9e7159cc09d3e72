//! Square puzzle faces and their perimeter geometry.
//!
//! A piece is described by 16 perimeter bits running clockwise around the
//! face: four sides of four positions each. The last position of every side
//! is the corner it shares with the following side, so the teeth that belong
//! to a side alone are the 3-bit window in front of that corner.
//!
//! Orientations 0-3 are quarter turns of the face, 4-7 are the same quarter
//! turns applied to the mirrored face.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Positions per side, including the trailing corner.
pub const EDGE_LENGTH: usize = 4;

/// Total number of perimeter positions.
pub const BIT_COUNT: usize = 4 * EDGE_LENGTH;

/// Teeth per side, excluding the shared corners.
pub const EDGE_WINDOW: usize = EDGE_LENGTH - 1;

/// Number of sides of a square face.
pub const SIDE_COUNT: usize = 4;

/// The three teeth of one side, 1 for a protrusion and 0 for a recess.
pub type Edge = [u8; EDGE_WINDOW];

/// Errors raised while building or addressing a piece.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PieceError {
    #[error("side index {0} out of range (expected 0..4)")]
    SideOutOfRange(usize),
    #[error("orientation {0} out of range (expected 0..8)")]
    OrientationOutOfRange(usize),
    #[error("perimeter needs 16 bits, got {0}")]
    BitCount(usize),
    #[error("invalid perimeter character {0:?} (expected '0' or '1')")]
    InvalidBit(char),
    #[error("bit value {0} is neither 0 nor 1")]
    BitValue(u8),
    #[error("symmetries of this piece were already analyzed")]
    SymmetriesAlreadyAnalyzed,
}

/// One of the four sides of a face, counted clockwise from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Side(u8);

impl Side {
    pub const ALL: [Side; SIDE_COUNT] = [Side(0), Side(1), Side(2), Side(3)];

    pub fn new(index: usize) -> Result<Self, PieceError> {
        if index < SIDE_COUNT {
            Ok(Side(index as u8))
        } else {
            Err(PieceError::SideOutOfRange(index))
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A placement of a face: quarter turns, optionally mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Orientation(u8);

impl Orientation {
    /// The unrotated, unmirrored placement.
    pub const IDENTITY: Orientation = Orientation(0);

    /// All eight labels in ascending order.
    pub const ALL: [Orientation; 8] = [
        Orientation(0),
        Orientation(1),
        Orientation(2),
        Orientation(3),
        Orientation(4),
        Orientation(5),
        Orientation(6),
        Orientation(7),
    ];

    pub fn new(value: usize) -> Result<Self, PieceError> {
        if value < Self::ALL.len() {
            Ok(Orientation(value as u8))
        } else {
            Err(PieceError::OrientationOutOfRange(value))
        }
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0 as usize
    }

    /// Whether the mirrored view of the face is used.
    #[inline]
    pub const fn is_flipped(self) -> bool {
        self.0 >= 4
    }

    /// Number of quarter turns, ignoring the mirror.
    #[inline]
    pub const fn rotation(self) -> usize {
        (self.0 % 4) as usize
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A subset of the eight orientation labels, stored as a bitmask.
///
/// Bit `i` is set when label `i` is a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationSet(u8);

impl OrientationSet {
    pub const ALL: OrientationSet = OrientationSet(0xff);

    /// Labels 4-7.
    const MIRRORED: u8 = 0b1111_0000;
    /// Labels 2 and 3.
    const HALF_TURNS: u8 = 0b0000_1100;
    /// Label 1.
    const QUARTER_TURN: u8 = 0b0000_0010;

    #[inline]
    pub fn contains(self, orientation: Orientation) -> bool {
        self.0 & (1 << orientation.0) != 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the members in ascending label order.
    pub fn iter(self) -> impl Iterator<Item = Orientation> {
        Orientation::ALL
            .into_iter()
            .filter(move |&orientation| self.contains(orientation))
    }

    #[inline]
    fn remove(&mut self, mask: u8) {
        self.0 &= !mask;
    }
}

impl fmt::Display for OrientationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.iter().map(|o| o.to_string()).collect();
        write!(f, "{}", labels.join(","))
    }
}

/// Identity payload carried along with a piece. Not interpreted by the solver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceMeta {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A square face with a 16-bit perimeter.
///
/// Only the forward perimeter is stored. The mirrored view is derived on
/// every access, so the two views can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// Bit `i` holds perimeter position `i` of the forward view.
    bits: u16,
    orientation: Orientation,
    different_orientations: OrientationSet,
    symmetries_analyzed: bool,
    meta: Option<PieceMeta>,
}

/// Maps a position of the chosen view to the stored forward position.
///
/// The mirrored view is the forward sequence reversed, then rotated left by
/// one, which keeps every corner at a corner position.
#[inline(always)]
const fn physical_position(flipped: bool, position: usize) -> usize {
    if flipped {
        BIT_COUNT - 1 - (position + 1) % BIT_COUNT
    } else {
        position
    }
}

#[inline]
fn edge_base(side: Side, orientation: Orientation) -> usize {
    ((side.index() + orientation.value()) * EDGE_LENGTH) % BIT_COUNT
}

#[inline]
fn corner_position(side: Side, orientation: Orientation) -> usize {
    ((side.index() + orientation.value() + 1) * EDGE_LENGTH - 1) % BIT_COUNT
}

fn check_bit(value: u8) -> Result<u8, PieceError> {
    match value {
        0 | 1 => Ok(value),
        other => Err(PieceError::BitValue(other)),
    }
}

/// Whether `forward` read left to right equals `backward` read right to left.
fn mirrors(sequence: &[u8], forward: RangeInclusive<usize>, backward: RangeInclusive<usize>) -> bool {
    sequence[forward].iter().eq(sequence[backward].iter().rev())
}

/// Symmetry axis through the midpoints of two opposite sides.
fn straight_axis(sequence: &[u8]) -> bool {
    mirrors(sequence, 2..=8, 10..=16)
}

/// Symmetry axis through two opposite corners.
fn diagonal_axis(sequence: &[u8]) -> bool {
    mirrors(sequence, 0..=6, 8..=14)
}

impl Piece {
    /// Creates a piece from explicit perimeter bits.
    pub fn new(bits: [u8; BIT_COUNT]) -> Result<Self, PieceError> {
        let mut packed = 0u16;
        for (position, &bit) in bits.iter().enumerate() {
            packed |= (check_bit(bit)? as u16) << position;
        }
        Ok(Self {
            bits: packed,
            orientation: Orientation::IDENTITY,
            different_orientations: OrientationSet::ALL,
            symmetries_analyzed: false,
            meta: None,
        })
    }

    pub fn with_meta(mut self, meta: PieceMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn meta(&self) -> Option<&PieceMeta> {
        self.meta.as_ref()
    }

    /// The forward perimeter.
    pub fn bits(&self) -> [u8; BIT_COUNT] {
        self.view(false)
    }

    /// The mirrored perimeter.
    pub fn mirrored_bits(&self) -> [u8; BIT_COUNT] {
        self.view(true)
    }

    /// The forward perimeter as a `0`/`1` string.
    pub fn bit_string(&self) -> String {
        self.bits().iter().map(|&bit| if bit == 1 { '1' } else { '0' }).collect()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Sets the default orientation used by the orientation-less accessors
    /// and by rendering. Never touches the perimeter.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Orientation labels not proven redundant by [`Piece::find_symmetries`].
    pub fn different_orientations(&self) -> OrientationSet {
        self.different_orientations
    }

    pub fn symmetries_analyzed(&self) -> bool {
        self.symmetries_analyzed
    }

    #[inline]
    fn read(&self, flipped: bool, position: usize) -> u8 {
        ((self.bits >> physical_position(flipped, position)) & 1) as u8
    }

    #[inline]
    fn write(&mut self, flipped: bool, position: usize, value: u8) {
        let mask = 1u16 << physical_position(flipped, position);
        if value == 1 {
            self.bits |= mask;
        } else {
            self.bits &= !mask;
        }
    }

    fn view(&self, flipped: bool) -> [u8; BIT_COUNT] {
        std::array::from_fn(|position| self.read(flipped, position))
    }

    /// The teeth of `side` under the piece's own orientation.
    pub fn edge(&self, side: Side) -> Edge {
        self.edge_at(side, self.orientation)
    }

    /// The teeth of `side` when the piece is placed with `orientation`.
    pub fn edge_at(&self, side: Side, orientation: Orientation) -> Edge {
        let base = edge_base(side, orientation);
        std::array::from_fn(|tooth| self.read(orientation.is_flipped(), base + tooth))
    }

    pub fn set_edge(&mut self, side: Side, edge: Edge) -> Result<(), PieceError> {
        self.set_edge_at(side, edge, self.orientation)
    }

    /// Overwrites the teeth of `side` as seen under `orientation`.
    ///
    /// Values are validated before anything is written.
    pub fn set_edge_at(
        &mut self,
        side: Side,
        edge: Edge,
        orientation: Orientation,
    ) -> Result<(), PieceError> {
        for &bit in &edge {
            check_bit(bit)?;
        }
        let base = edge_base(side, orientation);
        for (tooth, &bit) in edge.iter().enumerate() {
            self.write(orientation.is_flipped(), base + tooth, bit);
        }
        Ok(())
    }

    /// The corner between `side` and the next side clockwise.
    pub fn corner(&self, side: Side) -> u8 {
        self.corner_at(side, self.orientation)
    }

    pub fn corner_at(&self, side: Side, orientation: Orientation) -> u8 {
        self.read(orientation.is_flipped(), corner_position(side, orientation))
    }

    pub fn set_corner(&mut self, side: Side, value: u8) -> Result<(), PieceError> {
        self.set_corner_at(side, value, self.orientation)
    }

    pub fn set_corner_at(
        &mut self,
        side: Side,
        value: u8,
        orientation: Orientation,
    ) -> Result<(), PieceError> {
        let value = check_bit(value)?;
        self.write(orientation.is_flipped(), corner_position(side, orientation), value);
        Ok(())
    }

    pub fn oriented_bits(&self) -> [u8; BIT_COUNT] {
        self.oriented_bits_at(self.orientation)
    }

    /// The whole perimeter as seen under `orientation`: the chosen view
    /// rotated left by four positions per quarter turn.
    pub fn oriented_bits_at(&self, orientation: Orientation) -> [u8; BIT_COUNT] {
        let shift = (orientation.value() * EDGE_LENGTH) % BIT_COUNT;
        std::array::from_fn(|position| {
            self.read(orientation.is_flipped(), (position + shift) % BIT_COUNT)
        })
    }

    /// Shrinks [`Piece::different_orientations`] to the labels that give
    /// geometrically distinct placements.
    ///
    /// Two rotations are probed against a straight and a diagonal axis. Every
    /// match drops more labels: the first drops the mirrored ones, the second
    /// drops labels 2 and 3, the third drops label 1.
    ///
    /// Matches accumulate, so the analysis runs at most once per piece.
    pub fn find_symmetries(&mut self) -> Result<(), PieceError> {
        if self.symmetries_analyzed {
            return Err(PieceError::SymmetriesAlreadyAnalyzed);
        }
        self.symmetries_analyzed = true;

        let axes: [fn(&[u8]) -> bool; 2] = [straight_axis, diagonal_axis];
        let mut matches = 0;

        for probe in [Orientation(0), Orientation(1)] {
            let oriented = self.oriented_bits_at(probe);
            let mut sequence = [0u8; 2 * BIT_COUNT];
            sequence[..BIT_COUNT].copy_from_slice(&oriented);
            sequence[BIT_COUNT..].copy_from_slice(&oriented);

            for axis in axes {
                if !axis(&sequence) {
                    continue;
                }
                matches += 1;
                self.different_orientations.remove(OrientationSet::MIRRORED);
                if matches > 1 {
                    self.different_orientations.remove(OrientationSet::HALF_TURNS);
                }
                if matches > 2 {
                    self.different_orientations.remove(OrientationSet::QUARTER_TURN);
                }
            }
        }

        tracing::trace!(
            bits = %self.bit_string(),
            matches,
            orientations = %self.different_orientations,
            "analyzed piece symmetries"
        );
        Ok(())
    }
}

impl FromStr for Piece {
    type Err = PieceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let count = text.chars().count();
        if count != BIT_COUNT {
            return Err(PieceError::BitCount(count));
        }
        let mut bits = [0u8; BIT_COUNT];
        for (bit, character) in bits.iter_mut().zip(text.chars()) {
            *bit = match character {
                '0' => 0,
                '1' => 1,
                other => return Err(PieceError::InvalidBit(other)),
            };
        }
        Piece::new(bits)
    }
}

/// Renders the piece as a small square under its own orientation.
///
/// `O` marks a protrusion, `.` a recess.
impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = |bit: u8| if bit == 1 { 'O' } else { '.' };
        let edges = Side::ALL.map(|side| self.edge(side).map(symbol));
        let corners = Side::ALL.map(|side| symbol(self.corner(side)));

        match &self.meta {
            Some(meta) => writeln!(f, "Piece #{}", meta.index)?,
            None => writeln!(f, "Piece")?,
        }
        let mirrored: String = self
            .mirrored_bits()
            .iter()
            .map(|&bit| if bit == 1 { '1' } else { '0' })
            .collect();
        writeln!(f, "bits = {}, mirrored = {}", self.bit_string(), mirrored)?;
        writeln!(f, "orientation = {}", self.orientation)?;
        writeln!(f, "different_orientations = {}", self.different_orientations)?;

        let [top, right, bottom, left] = edges;
        writeln!(
            f,
            "{} {} {} {} {}",
            corners[3], top[0], top[1], top[2], corners[0]
        )?;
        for tooth in 0..EDGE_WINDOW {
            writeln!(f, "{}       {}", left[EDGE_WINDOW - 1 - tooth], right[tooth])?;
        }
        writeln!(
            f,
            "{} {} {} {} {}",
            corners[2], bottom[2], bottom[1], bottom[0], corners[1]
        )
    }
}
