//! Physical geometry of one refinement level.

use corona_core::{Real, Vec3};

use crate::dim::Dimensionality;
use crate::error::MeshError;
use crate::index_box::{IndexBox, IntVect};

/// Largest distance, in cells, that [`Geometry::cell_index`] and
/// [`Geometry::node_coordinate`] report from the domain's lower corner.
/// Anything farther (or NaN) is pinned here, far outside any array.
pub const MAX_CELL_OFFSET: Real = (1u32 << 30) as Real;

fn clamp_offset(cells: Real) -> Real {
    if cells.is_nan() {
        MAX_CELL_OFFSET
    } else {
        cells.clamp(-MAX_CELL_OFFSET, MAX_CELL_OFFSET)
    }
}

/// Maps continuous positions to integer cells for one refinement level.
///
/// Node `domain.lo()` sits at physical position `prob_lo`; cell
/// `iv` spans `[prob_lo + (iv - lo) * dx, prob_lo + (iv - lo + 1) * dx)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    prob_lo: Vec3,
    cell_size: Vec3,
    inv_cell_size: Vec3,
    domain: IndexBox,
    dim: Dimensionality,
}

impl Geometry {
    /// Create a geometry.
    ///
    /// Every cell size must be finite and positive. In the x–z layout the
    /// domain must be exactly one cell thick in y.
    pub fn new(
        prob_lo: Vec3,
        cell_size: Vec3,
        domain: IndexBox,
        dim: Dimensionality,
    ) -> Result<Self, MeshError> {
        for (axis, &value) in cell_size.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(MeshError::InvalidCellSize { axis, value });
            }
        }
        if dim == Dimensionality::XZ && domain.size()[1] != 1 {
            return Err(MeshError::ThickDegenerateAxis {
                cells: domain.size()[1],
            });
        }
        Ok(Self {
            prob_lo,
            cell_size,
            inv_cell_size: [1.0 / cell_size[0], 1.0 / cell_size[1], 1.0 / cell_size[2]],
            domain,
            dim,
        })
    }

    /// Physical position of the domain's lower corner.
    pub fn prob_lo(&self) -> Vec3 {
        self.prob_lo
    }

    /// Upper corner of the domain in physical units.
    pub fn prob_hi(&self) -> Vec3 {
        let n = self.domain.size();
        [
            self.prob_lo[0] + n[0] as Real * self.cell_size[0],
            self.prob_lo[1] + n[1] as Real * self.cell_size[1],
            self.prob_lo[2] + n[2] as Real * self.cell_size[2],
        ]
    }

    /// Cell size per axis.
    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// Inverse cell size per axis.
    pub fn inv_cell_size(&self) -> Vec3 {
        self.inv_cell_size
    }

    /// Cell box of the whole level.
    pub fn domain(&self) -> IndexBox {
        self.domain
    }

    /// Axis layout.
    pub fn dim(&self) -> Dimensionality {
        self.dim
    }

    /// Volume of one cell.
    pub fn cell_volume(&self) -> Real {
        self.cell_size[0] * self.cell_size[1] * self.cell_size[2]
    }

    /// Index of the cell containing `pos`.
    ///
    /// Positions outside the domain map to cells outside the domain box;
    /// callers decide how to treat them. Offsets are clamped to
    /// [`MAX_CELL_OFFSET`] cells from the domain. Degenerate axes always map
    /// to the domain's lower index.
    pub fn cell_index(&self, pos: Vec3) -> IntVect {
        let lo = self.domain.lo();
        let mut iv = [0; 3];
        for a in 0..3 {
            iv[a] = if self.dim.is_degenerate(a) {
                lo[a]
            } else {
                let cells = ((pos[a] - self.prob_lo[a]) * self.inv_cell_size[a]).floor();
                (clamp_offset(cells) as i32).saturating_add(lo[a])
            };
        }
        iv
    }

    /// Position normalised to node units: `(pos - prob_lo) / dx + lo`,
    /// clamped to [`MAX_CELL_OFFSET`] nodes from the domain.
    /// Degenerate axes return the domain's lower index exactly.
    pub fn node_coordinate(&self, pos: Vec3) -> Vec3 {
        let lo = self.domain.lo();
        let mut out = [0.0; 3];
        for a in 0..3 {
            out[a] = if self.dim.is_degenerate(a) {
                lo[a] as Real
            } else {
                clamp_offset((pos[a] - self.prob_lo[a]) * self.inv_cell_size[a]) + lo[a] as Real
            };
        }
        out
    }

    /// Physical position of node `iv`.
    pub fn node_position(&self, iv: IntVect) -> Vec3 {
        let lo = self.domain.lo();
        [
            self.prob_lo[0] + (iv[0] - lo[0]) as Real * self.cell_size[0],
            self.prob_lo[1] + (iv[1] - lo[1]) as Real * self.cell_size[1],
            self.prob_lo[2] + (iv[2] - lo[2]) as Real * self.cell_size[2],
        ]
    }

    /// Physical position of the centre of cell `iv`.
    pub fn cell_center(&self, iv: IntVect) -> Vec3 {
        let n = self.node_position(iv);
        [
            n[0] + 0.5 * self.cell_size[0],
            n[1] + 0.5 * self.cell_size[1],
            n[2] + 0.5 * self.cell_size[2],
        ]
    }

    /// Geometry of the next coarser level for refinement ratio `ratio`.
    /// The degenerate axis of an x–z layout is never coarsened.
    pub fn coarsen(&self, ratio: i32) -> Result<Self, MeshError> {
        let r = match self.dim {
            Dimensionality::Three => [ratio, ratio, ratio],
            Dimensionality::XZ => [ratio, 1, ratio],
        };
        let cell_size = [
            self.cell_size[0] * r[0] as Real,
            self.cell_size[1] * r[1] as Real,
            self.cell_size[2] * r[2] as Real,
        ];
        Self::new(self.prob_lo, cell_size, self.domain.coarsen(r), self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom3(n: usize) -> Geometry {
        Geometry::new(
            [0.0; 3],
            [0.5; 3],
            IndexBox::from_extent([n, n, n]).unwrap(),
            Dimensionality::Three,
        )
        .unwrap()
    }

    #[test]
    fn rejects_bad_cell_size() {
        let b = IndexBox::from_extent([2, 2, 2]).unwrap();
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Geometry::new([0.0; 3], [1.0, bad, 1.0], b, Dimensionality::Three);
            assert!(matches!(err, Err(MeshError::InvalidCellSize { axis: 1, .. })));
        }
    }

    #[test]
    fn xz_requires_single_y_cell() {
        let b = IndexBox::from_extent([4, 2, 4]).unwrap();
        assert!(matches!(
            Geometry::new([0.0; 3], [1.0; 3], b, Dimensionality::XZ),
            Err(MeshError::ThickDegenerateAxis { cells: 2 })
        ));
    }

    #[test]
    fn cell_index_floors() {
        let g = geom3(8);
        assert_eq!(g.cell_index([0.0, 0.0, 0.0]), [0, 0, 0]);
        assert_eq!(g.cell_index([0.49, 0.51, 1.99]), [0, 1, 3]);
        assert_eq!(g.cell_index([-0.01, 0.0, 0.0]), [-1, 0, 0]);
    }

    #[test]
    fn cell_index_respects_domain_offset() {
        let b = IndexBox::new([10, 0, 10], [19, 9, 19]).unwrap();
        let g = Geometry::new([1.0, 0.0, 1.0], [0.1; 3], b, Dimensionality::Three).unwrap();
        assert_eq!(g.cell_index([1.05, 0.05, 1.25]), [10, 0, 12]);
    }

    #[test]
    fn far_positions_are_pinned_outside_the_domain() {
        let b = IndexBox::new([10, 10, 10], [19, 19, 19]).unwrap();
        let g = Geometry::new([0.0; 3], [1.0e-6; 3], b, Dimensionality::Three).unwrap();
        let far = MAX_CELL_OFFSET as i32 + 10;
        assert_eq!(g.cell_index([1.0e9, 0.0, 0.0]), [far, 10, 10]);
        assert_eq!(g.cell_index([0.0, -1.0e9, 0.0]), [10, 10 - MAX_CELL_OFFSET as i32, 10]);
        assert_eq!(g.cell_index([0.0, 0.0, f64::NAN])[2], far);
        assert_eq!(g.node_coordinate([f64::INFINITY, 0.0, 0.0])[0], MAX_CELL_OFFSET + 10.0);
    }

    #[test]
    fn degenerate_axis_ignores_position() {
        let b = IndexBox::from_extent([4, 1, 4]).unwrap();
        let g = Geometry::new([0.0; 3], [1.0; 3], b, Dimensionality::XZ).unwrap();
        assert_eq!(g.cell_index([1.5, 123.0, 2.5]), [1, 0, 2]);
    }

    #[test]
    fn node_position_inverts_node_coordinate() {
        let g = geom3(8);
        let p = g.node_position([3, 1, 7]);
        assert_eq!(p, [1.5, 0.5, 3.5]);
        assert_eq!(g.node_coordinate(p), [3.0, 1.0, 7.0]);
    }

    #[test]
    fn coarsen_doubles_cell_size() {
        let g = geom3(8);
        let c = g.coarsen(2).unwrap();
        assert_eq!(c.cell_size(), [1.0; 3]);
        assert_eq!(c.domain().size(), [4, 4, 4]);
        assert_eq!(c.prob_hi(), g.prob_hi());
    }
}
