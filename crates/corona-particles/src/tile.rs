//! Columnar particle storage for one tile.

use corona_core::{AttributeMap, Real, RealComp, TileId, Vec3};

use crate::partition::{reorder, Permutation};
use corona_core::Backend;

/// Particles of one species owned by one mesh partition at one level.
///
/// Storage is one contiguous column per attribute. Particles added with
/// [`push`](ParticleTile::push) are staged: they occupy column storage but
/// are invisible to every accessor until [`commit_size`] is called.
///
/// [`commit_size`]: ParticleTile::commit_size
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleTile {
    id: TileId,
    real: Vec<Vec<Real>>,
    int: Vec<Vec<i32>>,
    len: usize,
}

/// Mutable views of the built-in real columns, all of committed length.
#[allow(missing_docs)]
pub struct SoaMut<'a> {
    pub x: &'a mut [Real],
    pub y: &'a mut [Real],
    pub z: &'a mut [Real],
    pub w: &'a mut [Real],
    pub ux: &'a mut [Real],
    pub uy: &'a mut [Real],
    pub uz: &'a mut [Real],
    pub ex: &'a mut [Real],
    pub ey: &'a mut [Real],
    pub ez: &'a mut [Real],
    pub bx: &'a mut [Real],
    pub by: &'a mut [Real],
    pub bz: &'a mut [Real],
}

impl ParticleTile {
    /// An empty tile with one column per entry of `attributes`.
    pub fn new(id: TileId, attributes: &AttributeMap) -> Self {
        Self {
            id,
            real: vec![Vec::new(); attributes.num_real()],
            int: vec![Vec::new(); attributes.num_int()],
            len: 0,
        }
    }

    /// Tile identifier.
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Number of committed particles.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no particle is committed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of particles pushed since the last commit.
    pub fn num_staged(&self) -> usize {
        self.real.first().map_or(0, |c| c.len()) - self.len
    }

    /// Number of real columns.
    pub fn num_real(&self) -> usize {
        self.real.len()
    }

    /// Number of integer columns.
    pub fn num_int(&self) -> usize {
        self.int.len()
    }

    /// Stage one particle. Gathered fields, extra real columns and every
    /// integer column start at zero.
    pub fn push(&mut self, pos: Vec3, u: Vec3, w: Real) {
        let mut values = [0.0; RealComp::COUNT];
        values[RealComp::X.index()] = pos[0];
        values[RealComp::Y.index()] = pos[1];
        values[RealComp::Z.index()] = pos[2];
        values[RealComp::W.index()] = w;
        values[RealComp::Ux.index()] = u[0];
        values[RealComp::Uy.index()] = u[1];
        values[RealComp::Uz.index()] = u[2];
        for (c, col) in self.real.iter_mut().enumerate() {
            col.push(values.get(c).copied().unwrap_or(0.0));
        }
        for col in &mut self.int {
            col.push(0);
        }
    }

    /// Make every staged particle visible. Returns the new length.
    pub fn commit_size(&mut self) -> usize {
        self.len = self.real.first().map_or(0, |c| c.len());
        self.len
    }

    /// Drop committed particles beyond `n` and every staged particle.
    pub fn truncate(&mut self, n: usize) {
        let n = n.min(self.len);
        for col in &mut self.real {
            col.truncate(n);
        }
        for col in &mut self.int {
            col.truncate(n);
        }
        self.len = n;
    }

    /// Remove every particle.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Committed values of real column `c`.
    pub fn real(&self, c: usize) -> &[Real] {
        &self.real[c][..self.len]
    }

    /// Mutable committed values of real column `c`.
    pub fn real_mut(&mut self, c: usize) -> &mut [Real] {
        let n = self.len;
        &mut self.real[c][..n]
    }

    /// Committed values of integer column `c`.
    pub fn int(&self, c: usize) -> &[i32] {
        &self.int[c][..self.len]
    }

    /// Mutable committed values of integer column `c`.
    pub fn int_mut(&mut self, c: usize) -> &mut [i32] {
        let n = self.len;
        &mut self.int[c][..n]
    }

    /// Built-in column by name.
    pub fn comp(&self, c: RealComp) -> &[Real] {
        self.real(c.index())
    }

    /// Position of particle `i`.
    pub fn position(&self, i: usize) -> Vec3 {
        [
            self.comp(RealComp::X)[i],
            self.comp(RealComp::Y)[i],
            self.comp(RealComp::Z)[i],
        ]
    }

    /// Momentum per unit mass of particle `i`.
    pub fn momentum(&self, i: usize) -> Vec3 {
        [
            self.comp(RealComp::Ux)[i],
            self.comp(RealComp::Uy)[i],
            self.comp(RealComp::Uz)[i],
        ]
    }

    /// Disjoint mutable views of the built-in columns.
    pub fn soa_mut(&mut self) -> SoaMut<'_> {
        let n = self.len;
        match &mut self.real[..] {
            [x, y, z, w, ux, uy, uz, ex, ey, ez, bx, by, bz, ..] => SoaMut {
                x: &mut x[..n],
                y: &mut y[..n],
                z: &mut z[..n],
                w: &mut w[..n],
                ux: &mut ux[..n],
                uy: &mut uy[..n],
                uz: &mut uz[..n],
                ex: &mut ex[..n],
                ey: &mut ey[..n],
                ez: &mut ez[..n],
                bx: &mut bx[..n],
                by: &mut by[..n],
                bz: &mut bz[..n],
            },
            cols => panic!(
                "tile {} has {} real columns, fewer than the {} built-ins",
                self.id,
                cols.len(),
                RealComp::COUNT
            ),
        }
    }

    /// Apply `perm` to every column. Particle `i` after the call is
    /// particle `perm.indices()[i]` before it; indices issued earlier are
    /// invalidated.
    ///
    /// # Panics
    ///
    /// If particles are staged or `perm` does not match the tile length.
    pub fn reorder(&mut self, perm: &Permutation, backend: Backend) {
        assert_eq!(self.num_staged(), 0, "reorder with staged particles");
        assert_eq!(perm.len(), self.len, "permutation length does not match tile");
        for col in &mut self.real {
            *col = reorder(col, perm, backend);
        }
        for col in &mut self.int {
            *col = reorder(col, perm, backend);
        }
    }
}
