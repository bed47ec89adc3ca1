//! Mesh-side collaborator types for the Corona PIC core.
//!
//! The stepping core does not own mesh refinement bookkeeping or box
//! decomposition. It consumes three things from the surrounding runtime,
//! modelled here as small concrete types:
//!
//! - [`IndexBox`]: an inclusive integer cell box.
//! - [`Geometry`]: domain lower bound and cell size per axis, used to map
//!   a particle position to a cell index.
//! - [`FieldArray`]: a per-partition array indexable by integer cell
//!   coordinates, with ghost cells populated by the runtime before gather.
//!
//! [`Dimensionality`] selects between the full 3-D layout and the reduced
//! x–z layout in which the y axis is degenerate (one cell thick).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod dim;
pub mod error;
pub mod geometry;
pub mod index_box;

pub use array::{FieldArray, MaskArray};
pub use dim::Dimensionality;
pub use error::MeshError;
pub use geometry::{Geometry, MAX_CELL_OFFSET};
pub use index_box::{IndexBox, IntVect};
