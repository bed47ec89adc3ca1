//! Errors surfaced by the species driver.

use corona_core::{ConfigError, HeaderError};
use corona_mesh::MeshError;

/// Failures of species initialization and persistence.
///
/// Everything here is detected before or outside the timestep loop.
/// Invariant violations inside a step panic instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The species configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A mesh container could not be built.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// A header could not be read or written.
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// A level layout is unusable.
    #[error("invalid level layout: {reason}")]
    InvalidLayout {
        /// What was wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_their_message() {
        let e: EngineError = ConfigError::EmptyIonizationTable {
            species: "ions".into(),
        }
        .into();
        assert!(e.to_string().contains("ions"));
        assert!(matches!(e, EngineError::Config(_)));
    }
}
