//! Field-side kernels of the Corona PIC core.
//!
//! - [`stencil`]: pure per-cell FDTD updates for the six field components
//!   in full 3-D and reduced x–z layouts, plus drivers that sweep them
//!   over a partition.
//! - [`filter`]: the bilinear smoothing filter applied to a copy of the
//!   fields before gather.
//! - [`shape`]: particle shape factors of order 1 to 3.
//! - [`interp`]: gather of `E`/`B` at particle positions and deposition
//!   of current and charge density.
//!
//! All sweeps run under either [`Backend`](corona_core::Backend) and give
//! bit-identical results.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod fields;
pub mod filter;
pub mod interp;
pub mod shape;
pub mod stencil;
mod sweep;

pub use fields::{CurrentDensity, EmFields};
pub use filter::BilinearFilter;
pub use interp::{
    charge_footprint, current_footprint, deposit_charge, deposit_current, gather, gather_at,
    gather_split, velocity, FieldSource,
};
pub use shape::{Shape1D, Shape3D, ShapeOrder};
pub use stencil::{evolve_b, evolve_e, StencilCoefficients};
