//! Error types for mesh construction.

use crate::index_box::IntVect;

/// Errors arising from box, geometry, or array construction.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// A box whose upper corner lies below its lower corner on some axis.
    #[error("empty box: lo {lo:?} hi {hi:?}")]
    EmptyBox {
        /// Lower corner.
        lo: IntVect,
        /// Upper corner.
        hi: IntVect,
    },
    /// A cell size that is not finite and positive.
    #[error("cell size on axis {axis} must be finite and > 0, got {value}")]
    InvalidCellSize {
        /// Axis index (0 = x).
        axis: usize,
        /// The offending value.
        value: f64,
    },
    /// An x–z geometry whose domain is more than one cell thick in y.
    #[error("x-z geometry requires a domain one cell thick in y, got {cells} cells")]
    ThickDegenerateAxis {
        /// Number of y cells in the domain.
        cells: usize,
    },
    /// Negative ghost width.
    #[error("ghost width must be >= 0 on every axis, got {ngrow:?}")]
    NegativeGhostWidth {
        /// The requested widths.
        ngrow: IntVect,
    },
    /// Two arrays that must share a layout do not.
    #[error("layout mismatch: {reason}")]
    LayoutMismatch {
        /// Description of the mismatch.
        reason: String,
    },
}
