//! Grids of one refinement level and their tile decomposition.

use corona_core::Vec3;
use corona_mesh::{Geometry, IndexBox, IntVect};

use crate::error::EngineError;

/// The mesh partitions of one level, cut into tiles of at most
/// `tile_size` cells per axis.
///
/// Grid `g` is `grids()[g]`. Tiles of a grid are numbered x-fastest; the
/// last tile along an axis may be smaller than `tile_size`.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
    level: u32,
    geom: Geometry,
    grids: Vec<IndexBox>,
    tile_size: IntVect,
}

impl LevelLayout {
    /// Create a layout. Every grid must lie inside the geometry's domain
    /// and every tile size must be positive.
    pub fn new(
        level: u32,
        geom: Geometry,
        grids: Vec<IndexBox>,
        tile_size: IntVect,
    ) -> Result<Self, EngineError> {
        if tile_size.iter().any(|&t| t <= 0) {
            return Err(EngineError::InvalidLayout {
                reason: format!("tile size must be > 0 on every axis, got {tile_size:?}"),
            });
        }
        let domain = geom.domain();
        for (g, b) in grids.iter().enumerate() {
            if b.intersect(&domain) != Some(*b) {
                return Err(EngineError::InvalidLayout {
                    reason: format!("grid {g} {b:?} is not inside the domain {domain:?}"),
                });
            }
        }
        for (g, b) in grids.iter().enumerate() {
            if let Some(other) = grids[..g].iter().position(|o| o.intersect(b).is_some()) {
                return Err(EngineError::InvalidLayout {
                    reason: format!("grids {other} and {g} overlap"),
                });
            }
        }
        Ok(Self {
            level,
            geom,
            grids,
            tile_size,
        })
    }

    /// One grid covering the whole domain.
    pub fn single_grid(
        level: u32,
        geom: Geometry,
        tile_size: IntVect,
    ) -> Result<Self, EngineError> {
        let domain = geom.domain();
        Self::new(level, geom, vec![domain], tile_size)
    }

    /// Refinement level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Level geometry.
    pub fn geom(&self) -> &Geometry {
        &self.geom
    }

    /// Valid boxes of the grids.
    pub fn grids(&self) -> &[IndexBox] {
        &self.grids
    }

    /// Maximum tile extent.
    pub fn tile_size(&self) -> IntVect {
        self.tile_size
    }

    /// Tile boxes of grid `grid`, in tile-index order.
    ///
    /// # Panics
    ///
    /// If `grid` is out of range.
    pub fn tiles(&self, grid: usize) -> Vec<IndexBox> {
        let b = self.grids[grid];
        let (lo, hi) = (b.lo(), b.hi());
        let ranges: Vec<Vec<(i32, i32)>> = (0..3)
            .map(|a| {
                (lo[a]..=hi[a])
                    .step_by(self.tile_size[a] as usize)
                    .map(|s| (s, (s + self.tile_size[a] - 1).min(hi[a])))
                    .collect()
            })
            .collect();
        let mut out = Vec::with_capacity(ranges.iter().map(Vec::len).product());
        for &(zlo, zhi) in &ranges[2] {
            for &(ylo, yhi) in &ranges[1] {
                for &(xlo, xhi) in &ranges[0] {
                    if let Ok(t) = IndexBox::new([xlo, ylo, zlo], [xhi, yhi, zhi]) {
                        out.push(t);
                    }
                }
            }
        }
        out
    }

    /// `(grid, tile)` owning the cell that contains `pos`, if any.
    pub fn locate(&self, pos: Vec3) -> Option<(u32, u32)> {
        let iv = self.geom.cell_index(pos);
        let grid = self.grids.iter().position(|b| b.contains(iv))?;
        let tile = self.tiles(grid).iter().position(|t| t.contains(iv))?;
        Some((grid as u32, tile as u32))
    }
}
