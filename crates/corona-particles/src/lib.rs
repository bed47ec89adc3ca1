//! Particle tiles and near/buffer partitioning.
//!
//! A [`ParticleTile`] stores one species' particles for one mesh partition
//! in columnar form. Before deposition on a refined level, particles are
//! [`classify`]-ed against a buffer mask, [`partition`]-ed into a stable
//! [`Permutation`] with near particles first, and the tile is
//! [`reorder`](ParticleTile::reorder)-ed into fresh storage.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod partition;
pub mod tile;

pub use partition::{
    classify, classify_range, partition, partition_two_masks, reorder, BufferMasks, Permutation,
    TwoMaskSplit,
};
pub use tile::{ParticleTile, SoaMut};
