//! Directional connectivity: single block faces and sets of faces.
//!
//! [`BlockFacing`] names one of the six cardinal directions. [`Facing`] is a
//! bit set over those directions, describing which sides of a node take part
//! in the electrical network. Iteration always follows [`BlockFacing::ALL`]
//! order, so searches that expand faces in that order are reproducible.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BlockFacing
// ---------------------------------------------------------------------------

/// One of the six cardinal directions of a voxel.
///
/// North is `-z`, South is `+z`, East is `+x`, West is `-x`, Up is `+y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockFacing {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl BlockFacing {
    /// All six directions in enumeration order.
    pub const ALL: [BlockFacing; 6] = [
        BlockFacing::North,
        BlockFacing::East,
        BlockFacing::South,
        BlockFacing::West,
        BlockFacing::Up,
        BlockFacing::Down,
    ];

    /// Stable index in `0..6`, matching the position in [`BlockFacing::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<BlockFacing> {
        Self::ALL.get(index).copied()
    }

    pub const fn opposite(self) -> BlockFacing {
        match self {
            BlockFacing::North => BlockFacing::South,
            BlockFacing::East => BlockFacing::West,
            BlockFacing::South => BlockFacing::North,
            BlockFacing::West => BlockFacing::East,
            BlockFacing::Up => BlockFacing::Down,
            BlockFacing::Down => BlockFacing::Up,
        }
    }

    /// Unit offset `(dx, dy, dz)` towards the neighbouring voxel.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            BlockFacing::North => (0, 0, -1),
            BlockFacing::East => (1, 0, 0),
            BlockFacing::South => (0, 0, 1),
            BlockFacing::West => (-1, 0, 0),
            BlockFacing::Up => (0, 1, 0),
            BlockFacing::Down => (0, -1, 0),
        }
    }

    /// The four directions at right angles to this one.
    pub fn perpendicular(self) -> Facing {
        Facing::ALL - Facing::from(self) - Facing::from(self.opposite())
    }
}

impl fmt::Display for BlockFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockFacing::North => "north",
            BlockFacing::East => "east",
            BlockFacing::South => "south",
            BlockFacing::West => "west",
            BlockFacing::Up => "up",
            BlockFacing::Down => "down",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// A set of block faces, one bit per [`BlockFacing`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facing(u8);

impl Facing {
    pub const NONE: Facing = Facing(0);
    pub const NORTH: Facing = Facing(1 << 0);
    pub const EAST: Facing = Facing(1 << 1);
    pub const SOUTH: Facing = Facing(1 << 2);
    pub const WEST: Facing = Facing(1 << 3);
    pub const UP: Facing = Facing(1 << 4);
    pub const DOWN: Facing = Facing(1 << 5);
    pub const HORIZONTAL: Facing = Facing(0b00_1111);
    pub const ALL: Facing = Facing(0b11_1111);

    /// Build from raw bits. Bits above the sixth are discarded.
    pub const fn from_bits(bits: u8) -> Facing {
        Facing(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of faces in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn contains(self, face: BlockFacing) -> bool {
        self.0 & (1 << face as u8) != 0
    }

    /// `true` if every face of `other` is also in `self`.
    pub const fn contains_all(self, other: Facing) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Facing) -> Facing {
        Facing(self.0 | other.0)
    }

    pub fn insert(&mut self, face: BlockFacing) {
        self.0 |= 1 << face as u8;
    }

    pub fn remove(&mut self, face: BlockFacing) {
        self.0 &= !(1 << face as u8);
    }

    /// Expand every side in the set into the side itself plus the four
    /// directions at right angles to it.
    ///
    /// A machine mounted on its `Down` side conducts into the block below and
    /// along the floor to its horizontal neighbours, but never upwards.
    pub fn full_face(self) -> Facing {
        self.iter().fold(Facing::NONE, |acc, face| {
            acc | Facing::from(face) | face.perpendicular()
        })
    }

    /// Iterate the faces in the set in [`BlockFacing::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = BlockFacing> {
        BlockFacing::ALL
            .into_iter()
            .filter(move |face| self.contains(*face))
    }

    /// The first face in enumeration order, if any.
    pub fn first(self) -> Option<BlockFacing> {
        self.iter().next()
    }
}

impl From<BlockFacing> for Facing {
    fn from(face: BlockFacing) -> Self {
        Facing(1 << face as u8)
    }
}

impl FromIterator<BlockFacing> for Facing {
    fn from_iter<I: IntoIterator<Item = BlockFacing>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Facing::NONE, |acc, face| acc | Facing::from(face))
    }
}

impl BitOr for Facing {
    type Output = Facing;

    fn bitor(self, rhs: Facing) -> Facing {
        self.union(rhs)
    }
}

impl BitOrAssign for Facing {
    fn bitor_assign(&mut self, rhs: Facing) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Facing {
    type Output = Facing;

    fn bitand(self, rhs: Facing) -> Facing {
        Facing(self.0 & rhs.0)
    }
}

impl std::ops::Sub for Facing {
    type Output = Facing;

    /// Set difference.
    fn sub(self, rhs: Facing) -> Facing {
        Facing(self.0 & !rhs.0)
    }
}

impl fmt::Debug for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
