//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a particle species within a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesId(pub u32);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SpeciesId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies one particle tile.
///
/// A tile belongs to exactly one mesh partition (`grid`) at one refinement
/// `level`. A particle is addressed by `(TileId, index)`; any reorder of
/// the tile invalidates every index issued before it.
///
/// Ordering is lexicographic over `(level, grid, tile)`, which is the order
/// in which per-tile results are merged into shared mesh arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Refinement level (0 = coarsest).
    pub level: u32,
    /// Mesh partition index within the level.
    pub grid: u32,
    /// Tile index within the partition.
    pub tile: u32,
}

impl TileId {
    /// Construct a tile id.
    pub const fn new(level: u32, grid: u32, tile: u32) -> Self {
        Self { level, grid, tile }
    }

    /// Mix the id into a 64-bit seed offset for per-tile RNG streams.
    pub fn seed_offset(&self) -> u64 {
        ((self.level as u64) << 48) ^ ((self.grid as u64) << 24) ^ (self.tile as u64)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}/G{}/T{}", self.level, self.grid, self.tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_ordering_is_level_then_grid_then_tile() {
        let a = TileId::new(0, 3, 9);
        let b = TileId::new(1, 0, 0);
        let c = TileId::new(1, 0, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn seed_offsets_differ_between_tiles() {
        let a = TileId::new(0, 0, 1).seed_offset();
        let b = TileId::new(0, 1, 0).seed_offset();
        let c = TileId::new(1, 0, 0).seed_offset();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(TileId::new(2, 5, 7).to_string(), "L2/G5/T7");
    }
}
