//! Corona: the stepping core of a particle-in-cell plasma code.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Corona sub-crates. For most users, adding `corona` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use corona::prelude::*;
//!
//! let domain = IndexBox::from_extent([8, 8, 8]).unwrap();
//! let geom = Geometry::new([0.0; 3], [1.0e-6; 3], domain, Dimensionality::Three).unwrap();
//! let layout = LevelLayout::single_grid(0, geom, [4, 4, 4]).unwrap();
//!
//! let table = ParameterTable::parse(
//!     "
//!     electrons.charge = -q_e
//!     electrons.mass = m_e
//!     electrons.injection_style = NUniformPerCell
//!     electrons.num_particles_per_cell_each_dim = 2 2 2
//!     electrons.profile = parse_density_function
//!     electrons.density_function(x,y,z) = 1e24 * (1 + 0.1 * sin(x / 1e-6))
//!     electrons.ux = 1e5
//!     ",
//! );
//! let mut electrons =
//!     ParticleContainer::from_table(&table, "electrons", SpeciesId(0), &CustomProfiles::default())
//!         .unwrap();
//! assert_eq!(electrons.init_data(&layout), 8 * 8 * 8 * 8);
//!
//! let fields = EmFields::zeros(domain, [2; 3]).unwrap();
//! let mut current = CurrentDensity::zeros(domain, [2; 3]).unwrap();
//! let mut grids = [GridFields::single(&fields, &mut current)];
//! let report = electrons.evolve(&layout, &mut grids, 1.0e-15);
//! assert_eq!(report.particles, 8 * 8 * 8 * 8);
//! assert_eq!(electrons.teardown(), 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `corona-core` | IDs, constants, attribute indices, parameter table, errors |
//! | [`mesh`] | `corona-mesh` | Index boxes, geometry, ghosted field arrays |
//! | [`parser`] | `corona-parser` | Compiled math expressions of `x`, `y`, `z` |
//! | [`injector`] | `corona-injector` | Density and momentum injectors, managed arena |
//! | [`particles`] | `corona-particles` | Particle tiles, buffer classification and partition |
//! | [`solver`] | `corona-solver` | FDTD stencils, smoothing filter, gather and deposition |
//! | [`engine`] | `corona-engine` | Species configuration and the per-tile step |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, IDs and errors (`corona-core`).
///
/// Contains [`types::ParameterTable`], the attribute indices
/// ([`types::RealComp`], [`types::AttributeMap`]) and the physical
/// constants in [`types::constants`].
pub use corona_core as types;

/// Mesh partitions and their geometry (`corona-mesh`).
pub use corona_mesh as mesh;

/// Expression evaluator (`corona-parser`).
///
/// [`parser::Expression`] compiles once and evaluates from any thread.
pub use corona_parser as parser;

/// Plasma injectors (`corona-injector`).
pub use corona_injector as injector;

/// Particle storage and buffer partitioning (`corona-particles`).
pub use corona_particles as particles;

/// Field kernels (`corona-solver`).
///
/// [`solver::evolve_b`] and [`solver::evolve_e`] advance the fields;
/// [`solver::gather`] and [`solver::deposit_current`] couple them to
/// particles.
pub use corona_solver as solver;

/// Species management and the PIC step (`corona-engine`).
pub use corona_engine as engine;

/// Common imports for typical Corona usage.
///
/// ```rust
/// use corona::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use corona_core::{
        AttributeMap, Backend, IntComp, ParameterTable, Real, RealComp, SpeciesId, TileId, Vec3,
    };

    // Errors
    pub use corona_core::{ConfigError, HeaderError, InjectorError, ParseError};
    pub use corona_engine::EngineError;
    pub use corona_mesh::MeshError;

    // Mesh
    pub use corona_mesh::{Dimensionality, FieldArray, Geometry, IndexBox, MaskArray};

    // Expressions and injectors
    pub use corona_injector::{CustomProfiles, InjectionStyle, ManagedArena, PlasmaInjector};
    pub use corona_parser::Expression;

    // Particles
    pub use corona_particles::{BufferMasks, ParticleTile};

    // Fields
    pub use corona_solver::{BilinearFilter, CurrentDensity, EmFields, ShapeOrder};

    // Engine
    pub use corona_engine::{
        BufferDeposit, CoarsePatch, EvolveReport, GridFields, LevelLayout, ParticleContainer,
        PatchFields, PusherAlgo, SpeciesConfig,
    };
}
