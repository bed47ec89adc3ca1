//! Test fixtures for Corona development.
//!
//! Small, deterministic building blocks shared by the integration tests
//! and benchmarks: unit-cell geometries, uniform field bundles, buffer
//! masks, single-particle tiles and plasma injectors, plus
//! [`init_tracing`] to route `tracing` output into the test harness.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Once;

use corona_core::{AttributeMap, Real, TileId, Vec3};
use corona_injector::{
    InjectionStyle, InjectorDensity, InjectorMomentum, PlasmaBounds, PlasmaInjector,
};
use corona_mesh::{Dimensionality, FieldArray, Geometry, IndexBox, IntVect, MaskArray};
use corona_particles::ParticleTile;
use corona_solver::{CurrentDensity, EmFields};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; defaults to `warn`. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// ── Mesh ───────────────────────────────────────────────────────────

/// Full 3-D geometry over `n` cells of size `dx`, lower corner at the
/// origin.
pub fn geometry(n: [usize; 3], dx: Real) -> Geometry {
    let domain = IndexBox::from_extent(n).expect("non-empty extent");
    Geometry::new([0.0; 3], [dx; 3], domain, Dimensionality::Three).expect("valid geometry")
}

/// x–z geometry over `nx × nz` cells of size `dx`.
pub fn geometry_xz(nx: usize, nz: usize, dx: Real) -> Geometry {
    let domain = IndexBox::from_extent([nx, 1, nz]).expect("non-empty extent");
    Geometry::new([0.0; 3], [dx; 3], domain, Dimensionality::XZ).expect("valid geometry")
}

/// Fields constant in space, over `geom`'s domain grown by `ngrow`.
pub fn uniform_fields(geom: &Geometry, ngrow: i32, e: Vec3, b: Vec3) -> EmFields {
    EmFields::from_fn(geom.domain(), [ngrow; 3], |_| (e, b)).expect("valid layout")
}

/// Zero current density matching [`uniform_fields`].
pub fn zero_current(geom: &Geometry, ngrow: i32) -> CurrentDensity {
    CurrentDensity::zeros(geom.domain(), [ngrow; 3]).expect("valid layout")
}

/// Zero scalar array over `geom`'s domain grown by `ngrow`.
pub fn zero_scalar(geom: &Geometry, ngrow: i32) -> FieldArray<Real> {
    FieldArray::new(geom.domain(), [ngrow; 3]).expect("valid layout")
}

/// Mask over `geom`'s domain marking as buffer every cell whose x index
/// is at least `x_from`.
pub fn buffer_mask_from_x(geom: &Geometry, ngrow: i32, x_from: i32) -> MaskArray {
    FieldArray::from_fn(geom.domain(), [ngrow; 3], |iv: IntVect| {
        i32::from(iv[0] >= x_from)
    })
    .expect("valid layout")
}

// ── Particles ──────────────────────────────────────────────────────

/// Tile `L0/G0/T0` holding one committed particle.
pub fn single_particle_tile(pos: Vec3, u: Vec3, w: Real) -> ParticleTile {
    let mut tile = ParticleTile::new(TileId::new(0, 0, 0), &AttributeMap::new());
    tile.push(pos, u, w);
    tile.commit_size();
    tile
}

/// Tile `L0/G0/T0` holding one committed particle per entry of `xs`,
/// at rest with unit weight.
pub fn tile_at(xs: &[Vec3]) -> ParticleTile {
    let mut tile = ParticleTile::new(TileId::new(0, 0, 0), &AttributeMap::new());
    for &p in xs {
        tile.push(p, [0.0; 3], 1.0);
    }
    tile.commit_size();
    tile
}

/// Injector placing `ppc` particles per cell at rest, uniform density.
pub fn uniform_injector(ppc: [u32; 3], density: Real) -> PlasmaInjector {
    PlasmaInjector {
        style: InjectionStyle::NUniformPerCell(ppc),
        bounds: PlasmaBounds::UNBOUNDED,
        density: InjectorDensity::Constant(density),
        momentum: InjectorMomentum::Constant([0.0; 3]),
        density_min: 0.0,
        density_max: Real::INFINITY,
    }
}

/// Injector placing `n` particles per cell at random offsets with a
/// thermal momentum spread `spread` around zero.
pub fn thermal_injector(n: u32, density: Real, spread: Real) -> PlasmaInjector {
    PlasmaInjector {
        style: InjectionStyle::NRandomPerCell(n),
        bounds: PlasmaBounds::UNBOUNDED,
        density: InjectorDensity::Constant(density),
        momentum: InjectorMomentum::gaussian([0.0; 3], [spread; 3]).expect("valid spread"),
        density_min: 0.0,
        density_max: Real::INFINITY,
    }
}

/// Injector for one particle at `position` with `weight`, at rest.
pub fn single_particle_injector(position: Vec3, weight: Real) -> PlasmaInjector {
    PlasmaInjector {
        style: InjectionStyle::SingleParticle { position, weight },
        bounds: PlasmaBounds::UNBOUNDED,
        density: InjectorDensity::Constant(0.0),
        momentum: InjectorMomentum::Constant([0.0; 3]),
        density_min: 0.0,
        density_max: Real::INFINITY,
    }
}
