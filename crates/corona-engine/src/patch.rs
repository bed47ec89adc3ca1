//! Mesh data handed to [`ParticleContainer::evolve`] for one grid.
//!
//! The fine patch holds the level's own fields and deposition targets.
//! On refined levels the coarse patch holds the same region on the parent
//! level's resolution, together with the fine-level buffer masks that
//! decide which particles couple to it.
//!
//! [`ParticleContainer::evolve`]: crate::ParticleContainer::evolve

use corona_core::Real;
use corona_mesh::{FieldArray, Geometry};
use corona_particles::BufferMasks;
use corona_solver::{CurrentDensity, EmFields};

/// Fields to gather from and arrays to deposit into, on one resolution.
#[derive(Debug)]
pub struct PatchFields<'a> {
    /// Electromagnetic fields, ghost cells already filled.
    pub fields: &'a EmFields,
    /// Current density accumulator.
    pub current: &'a mut CurrentDensity,
    /// Charge density accumulator. Charge is deposited only when the
    /// species enables it and this is present.
    pub rho: Option<&'a mut FieldArray<Real>>,
}

/// The coarse-resolution view of a refined grid.
#[derive(Debug)]
pub struct CoarsePatch<'a> {
    /// Geometry of the coarse patch.
    pub geom: &'a Geometry,
    /// Coarse fields and accumulators.
    pub patch: PatchFields<'a>,
    /// Buffer masks, indexed by fine-level cell.
    pub masks: BufferMasks<'a>,
}

/// Everything one grid contributes to a step.
#[derive(Debug)]
pub struct GridFields<'a> {
    /// The grid's own fields and accumulators.
    pub fine: PatchFields<'a>,
    /// Coarse patch, present on refined levels only.
    pub coarse: Option<CoarsePatch<'a>>,
}

impl<'a> GridFields<'a> {
    /// A grid without a coarse patch.
    pub fn single(fields: &'a EmFields, current: &'a mut CurrentDensity) -> Self {
        Self {
            fine: PatchFields {
                fields,
                current,
                rho: None,
            },
            coarse: None,
        }
    }

    /// Attach a charge density accumulator to the fine patch.
    pub fn with_rho(mut self, rho: &'a mut FieldArray<Real>) -> Self {
        self.fine.rho = Some(rho);
        self
    }

    /// Attach a coarse patch.
    pub fn with_coarse(mut self, coarse: CoarsePatch<'a>) -> Self {
        self.coarse = Some(coarse);
        self
    }
}
