//! Field gather and charge/current deposition for particle tiles.
//!
//! Both directions use the same [`Shape3D`] weights. Loops within one
//! tile run in particle order on the calling thread; the engine
//! parallelises across tiles and merges per-tile deposition buffers in
//! tile order, so the result does not depend on scheduling.
//!
//! Nodes outside an array's storage box read as zero during gather and
//! are dropped during deposition. Both functions report how many node
//! contributions fell outside.

use std::ops::Range;

use corona_core::constants::C;
use corona_core::{Real, RealComp, Vec3};
use corona_mesh::{FieldArray, Geometry, IndexBox};
use corona_particles::ParticleTile;

use crate::fields::{CurrentDensity, EmFields};
use crate::shape::{Shape1D, Shape3D, ShapeOrder};

/// Fields of one level together with that level's geometry.
#[derive(Clone, Copy, Debug)]
pub struct FieldSource<'a> {
    /// Field components to interpolate from.
    pub fields: &'a EmFields,
    /// Geometry the fields live on.
    pub geom: &'a Geometry,
}

/// Interpolated `(E, B)` at `pos`.
pub fn gather_at(source: FieldSource<'_>, order: ShapeOrder, pos: Vec3) -> (Vec3, Vec3) {
    let shape = Shape3D::at(order, source.geom, pos);
    let mut e = [0.0; 3];
    let mut b = [0.0; 3];
    let f = source.fields;
    shape.for_each(|iv, w| {
        for (acc, arr) in e.iter_mut().zip(f.e()) {
            *acc += w * arr.try_get(iv).unwrap_or(0.0);
        }
        for (acc, arr) in b.iter_mut().zip(f.b()) {
            *acc += w * arr.try_get(iv).unwrap_or(0.0);
        }
    });
    (e, b)
}

/// Gather into the cached field columns of particles in `range`.
pub fn gather(
    tile: &mut ParticleTile,
    range: Range<usize>,
    source: FieldSource<'_>,
    order: ShapeOrder,
) {
    gather_split(tile, range, &[], source, source, order);
}

/// Gather for particles in `range`, reading `coarse` for particle `i`
/// when `use_coarse[i]` is set and `fine` otherwise. A `use_coarse`
/// shorter than the tile reads `fine` for the missing entries.
pub fn gather_split(
    tile: &mut ParticleTile,
    range: Range<usize>,
    use_coarse: &[bool],
    fine: FieldSource<'_>,
    coarse: FieldSource<'_>,
    order: ShapeOrder,
) {
    let soa = tile.soa_mut();
    for i in range {
        let source = if use_coarse.get(i).copied().unwrap_or(false) {
            coarse
        } else {
            fine
        };
        let (e, b) = gather_at(source, order, [soa.x[i], soa.y[i], soa.z[i]]);
        soa.ex[i] = e[0];
        soa.ey[i] = e[1];
        soa.ez[i] = e[2];
        soa.bx[i] = b[0];
        soa.by[i] = b[1];
        soa.bz[i] = b[2];
    }
}

/// Velocity of a particle with momentum per unit mass `u = gamma v`.
#[inline]
pub fn velocity(u: Vec3) -> Vec3 {
    let inv_gamma = 1.0 / (1.0 + (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]) / (C * C)).sqrt();
    u.map(|c| c * inv_gamma)
}

/// Deposit the current of particles in `range` into `j`.
///
/// Particles are sampled at the half-step position `x - dt v / 2`, where
/// `x` is the position after the push. Each contributes
/// `charge * w * v / cell_volume` distributed by its shape. Returns the
/// number of node contributions dropped outside `j`'s storage box.
pub fn deposit_current(
    tile: &ParticleTile,
    range: Range<usize>,
    charge: Real,
    dt: Real,
    geom: &Geometry,
    order: ShapeOrder,
    j: &mut CurrentDensity,
) -> usize {
    let inv_vol = 1.0 / geom.cell_volume();
    let w = tile.comp(RealComp::W);
    let mut dropped = 0;
    for i in range {
        let v = velocity(tile.momentum(i));
        let mid = half_step_position(tile, i, dt);
        let wq = charge * w[i] * inv_vol;
        let shape = Shape3D::at(order, geom, mid);
        shape.for_each(|iv, s| {
            for (comp, vc) in j.components_mut().into_iter().zip(v) {
                if !comp.try_add(iv, wq * vc * s) {
                    dropped += 1;
                }
            }
        });
    }
    dropped
}

/// `x - dt v / 2` for particle `i`.
fn half_step_position(tile: &ParticleTile, i: usize, dt: Real) -> Vec3 {
    let x = tile.position(i);
    let v = velocity(tile.momentum(i));
    [
        x[0] - 0.5 * dt * v[0],
        x[1] - 0.5 * dt * v[1],
        x[2] - 0.5 * dt * v[2],
    ]
}

/// Smallest box of nodes that [`deposit_current`] touches for particles in
/// `range`, or `None` for an empty range.
pub fn current_footprint(
    tile: &ParticleTile,
    range: Range<usize>,
    dt: Real,
    geom: &Geometry,
    order: ShapeOrder,
) -> Option<IndexBox> {
    footprint(range.map(|i| half_step_position(tile, i, dt)), geom, order)
}

/// Smallest box of nodes that [`deposit_charge`] touches for particles in
/// `range`, or `None` for an empty range.
pub fn charge_footprint(
    tile: &ParticleTile,
    range: Range<usize>,
    geom: &Geometry,
    order: ShapeOrder,
) -> Option<IndexBox> {
    footprint(range.map(|i| tile.position(i)), geom, order)
}

// Shape start and end are non-decreasing in the node coordinate, so the
// extreme coordinates on each axis bound every particle's support.
fn footprint(
    positions: impl Iterator<Item = Vec3>,
    geom: &Geometry,
    order: ShapeOrder,
) -> Option<IndexBox> {
    let mut lo = [Real::INFINITY; 3];
    let mut hi = [Real::NEG_INFINITY; 3];
    for p in positions {
        let xn = geom.node_coordinate(p);
        for a in 0..3 {
            lo[a] = lo[a].min(xn[a]);
            hi[a] = hi[a].max(xn[a]);
        }
    }
    let dim = geom.dim();
    let mut nodes_lo = [0; 3];
    let mut nodes_hi = [0; 3];
    for a in 0..3 {
        nodes_lo[a] = Shape1D::along(order, dim.is_degenerate(a), lo[a]).start;
        nodes_hi[a] = Shape1D::along(order, dim.is_degenerate(a), hi[a]).end();
    }
    IndexBox::new(nodes_lo, nodes_hi).ok()
}

/// Deposit the charge density of particles in `range` into `rho`.
/// Returns the number of node contributions dropped outside `rho`'s
/// storage box.
pub fn deposit_charge(
    tile: &ParticleTile,
    range: Range<usize>,
    charge: Real,
    geom: &Geometry,
    order: ShapeOrder,
    rho: &mut FieldArray<Real>,
) -> usize {
    let inv_vol = 1.0 / geom.cell_volume();
    let w = tile.comp(RealComp::W);
    let mut dropped = 0;
    for i in range {
        let wq = charge * w[i] * inv_vol;
        Shape3D::at(order, geom, tile.position(i)).for_each(|iv, s| {
            if !rho.try_add(iv, wq * s) {
                dropped += 1;
            }
        });
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use corona_core::{AttributeMap, TileId};
    use corona_mesh::Dimensionality;

    fn geom() -> Geometry {
        let domain = IndexBox::from_extent([8, 8, 8]).unwrap();
        Geometry::new([0.0; 3], [0.5, 0.5, 0.5], domain, Dimensionality::Three).unwrap()
    }

    fn tile_with(particles: &[(Vec3, Vec3, Real)]) -> ParticleTile {
        let mut t = ParticleTile::new(TileId::new(0, 0, 0), &AttributeMap::new());
        for &(p, u, w) in particles {
            t.push(p, u, w);
        }
        t.commit_size();
        t
    }

    #[test]
    fn gather_reproduces_linear_fields() {
        let g = geom();
        let fields = EmFields::from_fn(g.domain(), [2, 2, 2], |iv| {
            let p = g.node_position(iv);
            ([p[0], 2.0 * p[1], 3.0], [p[2], 0.0, -p[0] + p[1]])
        })
        .unwrap();
        let source = FieldSource {
            fields: &fields,
            geom: &g,
        };
        for order in [ShapeOrder::Linear, ShapeOrder::Quadratic, ShapeOrder::Cubic] {
            let (e, b) = gather_at(source, order, [1.3, 2.1, 0.8]);
            assert!((e[0] - 1.3).abs() < 1e-12, "{order:?}");
            assert!((e[1] - 4.2).abs() < 1e-12);
            assert!((e[2] - 3.0).abs() < 1e-12);
            assert!((b[0] - 0.8).abs() < 1e-12);
            assert!((b[2] - 0.8).abs() < 1e-12);
        }
    }

    #[test]
    fn gather_fills_tile_columns() {
        let g = geom();
        let fields =
            EmFields::from_fn(g.domain(), [1, 1, 1], |_| ([1.0, 2.0, 3.0], [4.0, 5.0, 6.0])).unwrap();
        let mut t = tile_with(&[
            ([1.0, 1.0, 1.0], [0.0; 3], 1.0),
            ([2.2, 0.3, 3.1], [0.0; 3], 1.0),
        ]);
        let source = FieldSource {
            fields: &fields,
            geom: &g,
        };
        gather(&mut t, 0..2, source, ShapeOrder::Linear);
        for i in 0..2 {
            assert!((t.comp(RealComp::Ey)[i] - 2.0).abs() < 1e-14);
            assert!((t.comp(RealComp::Bz)[i] - 6.0).abs() < 1e-14);
        }
    }

    #[test]
    fn gather_split_reads_the_selected_source() {
        let g = geom();
        let fine = EmFields::from_fn(g.domain(), [1, 1, 1], |_| ([1.0; 3], [0.0; 3])).unwrap();
        let coarse = EmFields::from_fn(g.domain(), [1, 1, 1], |_| ([-1.0; 3], [0.0; 3])).unwrap();
        let mut t = tile_with(&[([1.0; 3], [0.0; 3], 1.0), ([1.0; 3], [0.0; 3], 1.0)]);
        gather_split(
            &mut t,
            0..2,
            &[false, true],
            FieldSource { fields: &fine, geom: &g },
            FieldSource { fields: &coarse, geom: &g },
            ShapeOrder::Linear,
        );
        assert_eq!(t.comp(RealComp::Ex), &[1.0, -1.0]);
    }

    #[test]
    fn charge_on_a_node_lands_in_one_cell() {
        let g = geom();
        let mut rho = FieldArray::new(g.domain(), [1, 1, 1]).unwrap();
        let t = tile_with(&[([1.5, 2.0, 0.5], [0.0; 3], 3.0)]);
        let dropped = deposit_charge(&t, 0..1, 2.0, &g, ShapeOrder::Linear, &mut rho);
        assert_eq!(dropped, 0);
        let nonzero: Vec<_> = rho.as_slice().iter().filter(|&&v| v != 0.0).collect();
        assert_eq!(nonzero.len(), 1);
        assert_eq!(rho.get([3, 4, 1]), 6.0 / g.cell_volume());
    }

    #[test]
    fn deposited_current_integrates_to_q_w_v() {
        let g = geom();
        let mut j = CurrentDensity::zeros(g.domain(), [2, 2, 2]).unwrap();
        let u = [0.3 * C, -0.1 * C, 0.05 * C];
        let v = velocity(u);
        let t = tile_with(&[([2.1, 1.7, 2.9], u, 4.0)]);
        for order in [ShapeOrder::Linear, ShapeOrder::Cubic] {
            j.clear();
            deposit_current(&t, 0..1, -1.5, 1e-10, &g, order, &mut j);
            let vol = g.cell_volume();
            for (c, vc) in j.components().into_iter().zip(v) {
                let total = c.sum_all() * vol;
                assert!((total - (-1.5 * 4.0 * vc)).abs() < 1e-9 * vc.abs().max(1.0));
            }
        }
    }

    #[test]
    fn velocity_is_subluminal() {
        let v = velocity([10.0 * C, 0.0, 0.0]);
        assert!(v[0] < C);
        assert!(v[0] > 0.99 * C);
        assert_eq!(velocity([0.0; 3]), [0.0; 3]);
    }

    #[test]
    fn out_of_storage_contributions_are_counted() {
        let g = geom();
        let mut rho = FieldArray::new(g.domain(), [0, 0, 0]).unwrap();
        let t = tile_with(&[([3.9, 1.0, 1.0], [0.0; 3], 1.0)]);
        // x node coordinate 7.8 touches nodes 7 and 8; 8 is outside.
        let dropped = deposit_charge(&t, 0..1, 1.0, &g, ShapeOrder::Linear, &mut rho);
        assert_eq!(dropped, 4);
    }

    #[test]
    fn footprint_buffers_match_full_array_deposits() {
        let g = geom();
        let dt = 1.0e-9;
        let t = tile_with(&[
            ([1.1, 1.3, 2.9], [0.3 * C, -0.2 * C, 0.1 * C], 1.0),
            ([1.6, 1.0, 2.2], [-0.5 * C, 0.0, 0.4 * C], 2.0),
            ([3.9, 0.1, 0.2], [0.9 * C, 0.0, 0.0], 0.5),
        ]);
        for order in [ShapeOrder::Linear, ShapeOrder::Quadratic, ShapeOrder::Cubic] {
            let mut full = CurrentDensity::zeros(g.domain(), [2, 2, 2]).unwrap();
            let full_dropped = deposit_current(&t, 0..3, -1.0, dt, &g, order, &mut full);

            let region = current_footprint(&t, 0..3, dt, &g, order).unwrap();
            assert!(region.num_cells() < full.jx.storage_box().num_cells());
            let mut private = full.zeros_within(region);
            let dropped = deposit_current(&t, 0..3, -1.0, dt, &g, order, &mut private);
            let mut merged = CurrentDensity::zeros(g.domain(), [2, 2, 2]).unwrap();
            merged.accumulate(&private);
            assert_eq!(merged, full, "{order:?}");
            assert_eq!(dropped, full_dropped);

            let mut rho = FieldArray::new(g.domain(), [2, 2, 2]).unwrap();
            deposit_charge(&t, 0..3, -1.0, &g, order, &mut rho);
            let region = charge_footprint(&t, 0..3, &g, order).unwrap();
            let mut r = rho.zeros_within(region);
            deposit_charge(&t, 0..3, -1.0, &g, order, &mut r);
            let mut merged = FieldArray::new(g.domain(), [2, 2, 2]).unwrap();
            merged.accumulate(&r);
            assert_eq!(merged, rho, "{order:?}");
        }
        assert_eq!(current_footprint(&t, 1..1, dt, &g, ShapeOrder::Linear), None);
    }

    #[test]
    fn escaped_particles_gather_zero_and_deposit_nothing() {
        let g = geom();
        let fields = EmFields::from_fn(g.domain(), [1, 1, 1], |_| ([1.0; 3], [1.0; 3])).unwrap();
        let mut rho = FieldArray::new(g.domain(), [1, 1, 1]).unwrap();
        for order in [ShapeOrder::Linear, ShapeOrder::Quadratic, ShapeOrder::Cubic] {
            let mut t = tile_with(&[([1.0e15, 1.0, -1.0e15], [0.0; 3], 1.0)]);
            let source = FieldSource {
                fields: &fields,
                geom: &g,
            };
            gather(&mut t, 0..1, source, order);
            assert_eq!(t.comp(RealComp::Ex)[0], 0.0);
            assert_eq!(t.comp(RealComp::Bz)[0], 0.0);
            let dropped = deposit_charge(&t, 0..1, 1.0, &g, order, &mut rho);
            assert_eq!(dropped, order.support().pow(3));
        }
        assert_eq!(rho.sum_all(), 0.0);
    }
}
