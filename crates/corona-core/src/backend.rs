//! Execution backend selection.

/// How per-particle and per-cell loops are scheduled on the host.
///
/// Every operation in the core produces bit-identical results under both
/// backends for identical inputs. `Parallel` runs on the rayon global pool
/// with per-worker scratch; `Sequential` runs plain iterators on the
/// calling thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Plain iterators on the calling thread.
    #[default]
    Sequential,
    /// Data-parallel iterators on the rayon worker pool.
    Parallel,
}

impl Backend {
    /// Both backends, for equivalence tests.
    pub const ALL: [Backend; 2] = [Backend::Sequential, Backend::Parallel];

    /// Short name used in parameter tables.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }

    /// Inverse of [`Backend::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sequential" | "serial" => Some(Self::Sequential),
            "parallel" => Some(Self::Parallel),
            _ => None,
        }
    }
}
