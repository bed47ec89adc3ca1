//! Per-step counters returned by [`ParticleContainer::evolve`].
//!
//! [`ParticleContainer::evolve`]: crate::ParticleContainer::evolve

use corona_core::TileId;

/// What one call to `evolve` did on one level.
///
/// Split counts are summed over tiles. Timings are wall-clock
/// microseconds and are the only fields that vary between identical runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvolveReport {
    /// Level that was advanced.
    pub level: u32,
    /// Tiles processed.
    pub tiles: usize,
    /// Particles processed.
    pub particles: usize,
    /// Particles that deposited on the fine patch only.
    pub nfine_current: usize,
    /// Particles that gathered from the fine patch.
    pub nfine_gather: usize,
    /// Particles whose ionization level advanced.
    pub ionized: usize,
    /// Indices of the particles that ionized, per tile in [`TileId`]
    /// order. Tiles where nothing ionized are left out. Indices are valid
    /// until the tile is next modified.
    pub ionized_particles: Vec<(TileId, Vec<usize>)>,
    /// Deposition contributions that fell outside their target array.
    pub dropped_deposits: usize,
    /// Wall-clock time of the per-tile stages, in microseconds.
    pub tile_us: u64,
    /// Wall-clock time of merging tile buffers, in microseconds.
    pub merge_us: u64,
}

impl EvolveReport {
    /// Particles in the current-deposition buffer.
    pub fn buffer_current(&self) -> usize {
        self.particles - self.nfine_current
    }

    /// Particles that gathered from the coarse patch.
    pub fn buffer_gather(&self) -> usize {
        self.particles - self.nfine_gather
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_is_zero() {
        let r = EvolveReport::default();
        assert_eq!(r.particles, 0);
        assert_eq!(r.tile_us, 0);
        assert_eq!(r.buffer_current(), 0);
        assert!(r.ionized_particles.is_empty());
    }

    #[test]
    fn buffer_counts_are_complements() {
        let r = EvolveReport {
            particles: 10,
            nfine_current: 7,
            nfine_gather: 9,
            ..Default::default()
        };
        assert_eq!(r.buffer_current(), 3);
        assert_eq!(r.buffer_gather(), 1);
    }
}
