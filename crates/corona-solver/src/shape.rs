//! Particle shape factors on a nodal grid.
//!
//! A particle at node coordinate `xn` (position in node units) touches
//! `order + 1` nodes per active axis. Weights on each axis sum to one.

use corona_core::Real;
use corona_mesh::{Geometry, IntVect};
use smallvec::{smallvec, SmallVec};

/// Interpolation and deposition order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShapeOrder {
    /// Cloud-in-cell, two nodes per axis.
    #[default]
    Linear,
    /// Triangular-shaped cloud, three nodes per axis.
    Quadratic,
    /// Cubic spline, four nodes per axis.
    Cubic,
}

impl ShapeOrder {
    /// Shape for a numeric order in `1..=3`.
    pub fn from_order(order: u64) -> Option<Self> {
        match order {
            1 => Some(Self::Linear),
            2 => Some(Self::Quadratic),
            3 => Some(Self::Cubic),
            _ => None,
        }
    }

    /// Numeric order.
    pub fn order(self) -> u32 {
        match self {
            Self::Linear => 1,
            Self::Quadratic => 2,
            Self::Cubic => 3,
        }
    }

    /// Nodes touched per active axis.
    pub fn support(self) -> usize {
        self.order() as usize + 1
    }

    /// Ghost width needed around a partition so that every particle in
    /// its valid box reaches only storage nodes.
    pub fn ghost_width(self) -> i32 {
        match self {
            Self::Linear => 1,
            Self::Quadratic | Self::Cubic => 2,
        }
    }
}

/// One-dimensional weights starting at node `start`.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape1D {
    /// First node touched.
    pub start: i32,
    /// Weight of node `start + i`.
    pub weights: SmallVec<[Real; 4]>,
}

impl Shape1D {
    /// Weights for a particle at node coordinate `xn`.
    pub fn compute(order: ShapeOrder, xn: Real) -> Self {
        match order {
            ShapeOrder::Linear => {
                let j = xn.floor();
                let t = xn - j;
                Self {
                    start: j as i32,
                    weights: smallvec![1.0 - t, t],
                }
            }
            ShapeOrder::Quadratic => {
                let j = (xn + 0.5).floor();
                let t = xn - j;
                Self {
                    start: (j as i32).saturating_sub(1),
                    weights: smallvec![
                        0.5 * (0.5 - t) * (0.5 - t),
                        0.75 - t * t,
                        0.5 * (0.5 + t) * (0.5 + t),
                    ],
                }
            }
            ShapeOrder::Cubic => {
                let j = xn.floor();
                let t = xn - j;
                let s = 1.0 - t;
                Self {
                    start: (j as i32).saturating_sub(1),
                    weights: smallvec![
                        s * s * s / 6.0,
                        2.0 / 3.0 - t * t * (1.0 - 0.5 * t),
                        2.0 / 3.0 - s * s * (1.0 - 0.5 * s),
                        t * t * t / 6.0,
                    ],
                }
            }
        }
    }

    /// A single node of weight one, used on degenerate axes.
    pub fn point(node: i32) -> Self {
        Self {
            start: node,
            weights: smallvec![1.0],
        }
    }

    /// Weights along one axis: [`compute`](Self::compute) on an active axis,
    /// [`point`](Self::point) on a degenerate one.
    pub fn along(order: ShapeOrder, degenerate: bool, xn: Real) -> Self {
        if degenerate {
            Self::point(xn as i32)
        } else {
            Self::compute(order, xn)
        }
    }

    /// Last node touched.
    pub fn end(&self) -> i32 {
        self.start.saturating_add(self.weights.len() as i32 - 1)
    }
}

/// Tensor-product shape over three axes.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape3D {
    axes: [Shape1D; 3],
}

impl Shape3D {
    /// Shape of a particle at physical position `pos`.
    pub fn at(order: ShapeOrder, geom: &Geometry, pos: [Real; 3]) -> Self {
        let xn = geom.node_coordinate(pos);
        let dim = geom.dim();
        let axis = |a: usize| Shape1D::along(order, dim.is_degenerate(a), xn[a]);
        Self {
            axes: [axis(0), axis(1), axis(2)],
        }
    }

    /// Per-axis weights.
    pub fn axes(&self) -> &[Shape1D; 3] {
        &self.axes
    }

    /// Call `f(node, weight)` for every node in the support.
    #[inline]
    pub fn for_each(&self, mut f: impl FnMut(IntVect, Real)) {
        let [sx, sy, sz] = &self.axes;
        for (kz, wz) in sz.weights.iter().enumerate() {
            for (ky, wy) in sy.weights.iter().enumerate() {
                let wyz = wy * wz;
                for (kx, wx) in sx.weights.iter().enumerate() {
                    let node = [
                        sx.start.saturating_add(kx as i32),
                        sy.start.saturating_add(ky as i32),
                        sz.start.saturating_add(kz as i32),
                    ];
                    f(node, wx * wyz);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corona_mesh::{Dimensionality, IndexBox};

    const ORDERS: [ShapeOrder; 3] = [ShapeOrder::Linear, ShapeOrder::Quadratic, ShapeOrder::Cubic];

    #[test]
    fn weights_sum_to_one() {
        for order in ORDERS {
            for &xn in &[0.0, 0.13, 0.5, 0.99, 7.25, -3.6] {
                let s = Shape1D::compute(order, xn);
                assert_eq!(s.weights.len(), order.support());
                let sum: Real = s.weights.iter().sum();
                assert!((sum - 1.0).abs() < 1e-14, "{order:?} at {xn}: {sum}");
            }
        }
    }

    #[test]
    fn linear_on_node_puts_all_weight_on_that_node() {
        let s = Shape1D::compute(ShapeOrder::Linear, 4.0);
        assert_eq!(s.start, 4);
        assert_eq!(s.weights.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn higher_orders_are_centred() {
        let q = Shape1D::compute(ShapeOrder::Quadratic, 4.0);
        assert_eq!(q.start, 3);
        assert_eq!(q.weights.as_slice(), &[0.125, 0.75, 0.125]);
        let c = Shape1D::compute(ShapeOrder::Cubic, 4.0);
        assert_eq!(c.start, 3);
        assert!((c.weights[0] - 1.0 / 6.0).abs() < 1e-15);
        assert!((c.weights[1] - 2.0 / 3.0).abs() < 1e-15);
        assert!((c.weights[2] - 1.0 / 6.0).abs() < 1e-15);
        assert_eq!(c.weights[3], 0.0);
    }

    #[test]
    fn first_moment_matches_position() {
        for order in ORDERS {
            let xn = 5.3;
            let s = Shape1D::compute(order, xn);
            let m: Real = s
                .weights
                .iter()
                .enumerate()
                .map(|(i, w)| w * (s.start + i as i32) as Real)
                .sum();
            assert!((m - xn).abs() < 1e-12, "{order:?}: {m}");
        }
    }

    #[test]
    fn degenerate_axis_is_a_point() {
        let domain = IndexBox::new([0, 0, 0], [7, 0, 7]).unwrap();
        let geom = Geometry::new([0.0; 3], [1.0; 3], domain, Dimensionality::XZ).unwrap();
        let s = Shape3D::at(ShapeOrder::Quadratic, &geom, [2.2, 123.0, 3.7]);
        assert_eq!(s.axes()[1], Shape1D::point(0));
        let mut n = 0;
        let mut total = 0.0;
        s.for_each(|iv, w| {
            assert_eq!(iv[1], 0);
            n += 1;
            total += w;
        });
        assert_eq!(n, 9);
        assert!((total - 1.0).abs() < 1e-14);
    }

    #[test]
    fn order_lookup() {
        assert_eq!(ShapeOrder::from_order(2), Some(ShapeOrder::Quadratic));
        assert_eq!(ShapeOrder::from_order(4), None);
        assert_eq!(ShapeOrder::Linear.ghost_width(), 1);
        assert_eq!(ShapeOrder::Quadratic.ghost_width(), 2);
    }
}
