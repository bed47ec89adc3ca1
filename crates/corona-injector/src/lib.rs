//! Runtime-selected initial-condition generators.
//!
//! Density and momentum injectors are closed sum types
//! ([`InjectorDensity`], [`InjectorMomentum`]) chosen once from the
//! species configuration and evaluated per particle through a single
//! `match`. Sampling never allocates and never fails.
//!
//! Variants that load coefficients (`custom`) keep them in a
//! [`ManagedBuffer`] owned by a [`ManagedArena`]. Injectors hold no `Drop`
//! glue for that storage: the owning species must call `release` exactly
//! once during teardown. `release` consumes the injector, so a second
//! call does not compile; skipping it leaves the buffer allocated and
//! visible in [`ManagedArena::outstanding`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod constants;
pub mod custom;
pub mod density;
pub mod momentum;
pub mod plasma;

pub use arena::{ManagedArena, ManagedBuffer};
pub use constants::{expression_constants, get_constant, require_constant};
pub use custom::{CustomDensityProfile, CustomMomentumProfile, CustomProfiles};
pub use density::InjectorDensity;
pub use momentum::{box_muller, InjectorMomentum};
pub use plasma::{InjectionStyle, PlasmaBounds, PlasmaInjector};
