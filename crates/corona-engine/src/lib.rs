//! Species management and the PIC step of the Corona core.
//!
//! A [`ParticleContainer`] owns one species: its [`SpeciesConfig`], the
//! plasma injector that seeds it, and its particle tiles on every level.
//! [`ParticleContainer::init_data`] populates a level and
//! [`ParticleContainer::evolve`] advances it by one timestep: gather,
//! push, buffer partition, deposition and field ionization, tile by tile.
//!
//! Species configuration can be persisted with [`write_header`] and
//! restored with [`read_header`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod header;
pub mod ionization;
pub mod layout;
pub mod patch;
pub mod pusher;
pub mod report;

pub use config::{BufferDeposit, IonizationConfig, SpeciesConfig, SpeciesConfigBuilder};
pub use container::ParticleContainer;
pub use diagnostics::{max_particle_velocity, mean_particle_velocity, sum_particle_charge};
pub use error::EngineError;
pub use header::{read_header, write_header, SpeciesHeader};
pub use ionization::{element_energies, IonizationModule};
pub use layout::LevelLayout;
pub use patch::{CoarsePatch, GridFields, PatchFields};
pub use pusher::PusherAlgo;
pub use report::EvolveReport;
