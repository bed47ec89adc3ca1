//! Core types for the Corona particle-in-cell stepping core.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: the
//! [`Real`] scalar type, tile identifiers, particle attribute indices,
//! physical constants, the flat [`ParameterTable`] used to configure
//! species, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attrib;
pub mod backend;
pub mod constants;
pub mod error;
pub mod id;
pub mod params;

pub use attrib::{AttributeMap, IntComp, RealComp};
pub use backend::Backend;
pub use error::{ConfigError, HeaderError, InjectorError, ParseError};
pub use id::{SpeciesId, TileId};
pub use params::ParameterTable;

/// Floating-point type used for every field and particle quantity.
pub type Real = f64;

/// A 3-component vector of [`Real`]s (position, momentum, field value).
pub type Vec3 = [Real; 3];
