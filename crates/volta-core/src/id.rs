use std::fmt;

use serde::{Deserialize, Serialize};

use crate::facing::BlockFacing;

/// Identifies a voxel participating in the electrical network.
///
/// Plain value type: equality, ordering and hashing are componentwise, so it
/// can key hash maps and ordered maps alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl NodePos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring voxel across `face`.
    pub const fn offset(self, face: BlockFacing) -> NodePos {
        let (dx, dy, dz) = face.offset();
        NodePos::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &NodePos) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

impl From<(i32, i32, i32)> for NodePos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        NodePos::new(x, y, z)
    }
}

impl fmt::Display for NodePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn equality_is_componentwise() {
        assert_eq!(NodePos::new(1, 2, 3), NodePos::from((1, 2, 3)));
        assert_ne!(NodePos::new(1, 2, 3), NodePos::new(3, 2, 1));
    }

    #[test]
    fn positions_are_hashable() {
        let mut map = HashMap::new();
        map.insert(NodePos::new(0, 0, 0), "origin");
        map.insert(NodePos::new(1, 0, 0), "east");
        assert_eq!(map[&NodePos::new(1, 0, 0)], "east");
    }

    #[test]
    fn offset_follows_facing() {
        let p = NodePos::new(5, 5, 5);
        assert_eq!(p.offset(BlockFacing::East), NodePos::new(6, 5, 5));
        assert_eq!(p.offset(BlockFacing::North), NodePos::new(5, 5, 4));
        assert_eq!(p.offset(BlockFacing::Down), NodePos::new(5, 4, 5));
    }

    #[test]
    fn manhattan_distance_3d() {
        let a = NodePos::new(0, 0, 0);
        let b = NodePos::new(-2, 3, 4);
        assert_eq!(a.manhattan_distance(&b), 9);
        assert_eq!(a.manhattan_distance(&a), 0);
    }

    #[test]
    fn display_format() {
        assert_eq!(NodePos::new(1, -2, 3).to_string(), "(1, -2, 3)");
    }
}
