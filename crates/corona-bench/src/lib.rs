//! Benchmark profiles for the Corona PIC core.
//!
//! - [`reference_profile`]: 16x16x16 cells, 8 particles per cell, uniform
//!   thermal plasma in a static wave field
//! - [`stress_profile`]: 32x32x32 cells with the same plasma

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use corona_core::constants::C;
use corona_core::{Backend, Real};
use corona_engine::{GridFields, LevelLayout, ParticleContainer, SpeciesConfig};
use corona_injector::{
    InjectionStyle, InjectorDensity, InjectorMomentum, ManagedArena, PlasmaBounds,
    PlasmaInjector,
};
use corona_mesh::{Dimensionality, Geometry, IndexBox};
use corona_solver::{CurrentDensity, EmFields, ShapeOrder};

/// Ghost width of every benchmark array, enough for any shape order.
pub const NGROW: i32 = 2;

/// A populated species on one level, with fields to push it through.
pub struct PlasmaProfile {
    /// Level layout.
    pub layout: LevelLayout,
    /// The species.
    pub species: ParticleContainer,
    /// Static fields.
    pub fields: EmFields,
    /// Current accumulator, cleared by [`step`](Self::step).
    pub current: CurrentDensity,
    /// Timestep.
    pub dt: Real,
}

impl PlasmaProfile {
    /// One full evolve of every tile.
    pub fn step(&mut self) -> usize {
        self.current.clear();
        let mut grids = [GridFields::single(&self.fields, &mut self.current)];
        self.species.evolve(&self.layout, &mut grids, self.dt).particles
    }
}

/// Build an `n³`-cell thermal plasma with `ppc` random particles per cell.
pub fn plasma_profile(n: usize, ppc: u32, shape: ShapeOrder, backend: Backend) -> PlasmaProfile {
    let dx = 1.0e-6;
    let domain = IndexBox::from_extent([n; 3]).expect("n > 0");
    let geom = Geometry::new([0.0; 3], [dx; 3], domain, Dimensionality::Three)
        .expect("positive cell size");
    let layout = LevelLayout::single_grid(0, geom, [8, 8, 8]).expect("valid tiling");

    let config = SpeciesConfig::builder("electrons")
        .shape(shape)
        .backend(backend)
        .seed(42)
        .build()
        .expect("valid species");
    let injector = PlasmaInjector {
        style: InjectionStyle::NRandomPerCell(ppc),
        bounds: PlasmaBounds::UNBOUNDED,
        density: InjectorDensity::Constant(1.0e25),
        momentum: InjectorMomentum::gaussian([0.0; 3], [0.01 * C; 3]).expect("valid spread"),
        density_min: 0.0,
        density_max: Real::INFINITY,
    };
    let mut species =
        ParticleContainer::new(config, injector, ManagedArena::new()).expect("valid species");
    species.init_data(&layout);

    let k = 2.0 * std::f64::consts::PI / (n as Real * dx);
    let fields = EmFields::from_fn(domain, [NGROW; 3], |iv| {
        let x = iv[0] as Real * dx;
        ([1.0e9 * (k * x).sin(), 0.0, 0.0], [0.0, 0.0, 3.0 * (k * x).cos()])
    })
    .expect("valid layout");
    let current = CurrentDensity::zeros(domain, [NGROW; 3]).expect("valid layout");
    PlasmaProfile {
        layout,
        species,
        fields,
        current,
        dt: 0.5 * dx / C,
    }
}

/// 16x16x16 cells, 8 particles per cell.
pub fn reference_profile(backend: Backend) -> PlasmaProfile {
    plasma_profile(16, 8, ShapeOrder::Linear, backend)
}

/// 32x32x32 cells, 8 particles per cell.
pub fn stress_profile(backend: Backend) -> PlasmaProfile {
    plasma_profile(32, 8, ShapeOrder::Linear, backend)
}
