//! Spatial dimensionality of the mesh.

/// Layout of the mesh axes.
///
/// In [`Dimensionality::XZ`] the y axis is degenerate: the domain is one
/// cell thick in y, fields are uniform along y, and every y derivative is
/// taken to be zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Dimensionality {
    /// Full 3-D stencils.
    #[default]
    Three,
    /// Reduced x–z stencils with a degenerate y axis.
    XZ,
}

impl Dimensionality {
    /// Whether `axis` (0 = x, 1 = y, 2 = z) is degenerate.
    pub fn is_degenerate(self, axis: usize) -> bool {
        matches!((self, axis), (Self::XZ, 1))
    }

    /// Number of non-degenerate axes.
    pub fn active_axes(self) -> usize {
        match self {
            Self::Three => 3,
            Self::XZ => 2,
        }
    }

    /// Short name used in parameter tables and headers.
    pub fn name(self) -> &'static str {
        match self {
            Self::Three => "3d",
            Self::XZ => "xz",
        }
    }

    /// Inverse of [`Dimensionality::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "3d" | "3" => Some(Self::Three),
            "xz" | "2d" | "2" => Some(Self::XZ),
            _ => None,
        }
    }
}
