//! One species: its configuration, injector, and particle tiles.
//!
//! # Step
//!
//! [`ParticleContainer::evolve`] advances every tile of one level through
//! five stages, strictly in order within a tile:
//!
//! 1. gather `E`, `B` at each particle (from a filtered copy when the
//!    species smooths its fields);
//! 2. push momentum and position;
//! 3. on refined levels, partition the tile by the buffer masks;
//! 4. deposit current (and charge) on the fine and coarse patches;
//! 5. advance ionization levels.
//!
//! Tiles run concurrently under [`Backend::Parallel`]. Each tile deposits
//! into private arrays covering only the nodes its particles touch; these
//! are merged into the patch accumulators in [`TileId`] order afterwards,
//! so results do not depend on scheduling.

use std::io::Write;
use std::ops::Range;
use std::time::Instant;

use corona_core::{
    AttributeMap, Backend, HeaderError, IntComp, ParameterTable, Real, SpeciesId, TileId, Vec3,
};
use corona_injector::{CustomProfiles, InjectionStyle, ManagedArena, PlasmaInjector};
use corona_mesh::{FieldArray, Geometry, IndexBox};
use corona_particles::{classify, partition_two_masks, BufferMasks, ParticleTile};
use corona_solver::{
    charge_footprint, current_footprint, deposit_charge, deposit_current, gather, gather_split,
    BilinearFilter, CurrentDensity, EmFields, FieldSource,
};
use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{BufferDeposit, SpeciesConfig};
use crate::error::EngineError;
use crate::header::{self, SpeciesHeader};
use crate::ionization::IonizationModule;
use crate::layout::LevelLayout;
use crate::patch::GridFields;
use crate::pusher;
use crate::report::EvolveReport;

// ── TileState ──────────────────────────────────────────────────────

#[derive(Debug)]
struct TileState {
    tile: ParticleTile,
    cells: IndexBox,
    rng: ChaCha8Rng,
}

// ── ParticleContainer ──────────────────────────────────────────────

/// Particles of one species across every level, plus everything needed
/// to create and advance them.
///
/// The injector's managed storage is released only by
/// [`teardown`](Self::teardown). Dropping a container without calling it
/// leaves that storage allocated in [`arena`](Self::arena).
#[derive(Debug)]
pub struct ParticleContainer {
    config: SpeciesConfig,
    attributes: AttributeMap,
    injector: PlasmaInjector,
    arena: ManagedArena,
    ionization: Option<IonizationModule>,
    tiles: IndexMap<TileId, TileState>,
}

impl ParticleContainer {
    /// Assemble a container. `injector` must have been built from `arena`.
    pub fn new(
        config: SpeciesConfig,
        injector: PlasmaInjector,
        arena: ManagedArena,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let ionization = config.ionization_module()?;

        let mut attributes = AttributeMap::new();
        for name in &config.extra_real {
            attributes.add_real(name);
        }
        if ionization.is_some() {
            attributes.add_int(IntComp::IonizationLevel.name());
        }
        for name in &config.extra_int {
            attributes.add_int(name);
        }

        info!(
            species = %config.name,
            id = %config.id,
            pusher = config.pusher.name(),
            shape = config.shape.order(),
            ionization = ionization.is_some(),
            "species initialized"
        );
        Ok(Self {
            config,
            attributes,
            injector,
            arena,
            ionization,
            tiles: IndexMap::new(),
        })
    }

    /// Read species `species` from `table`, compiling every expression.
    pub fn from_table(
        table: &ParameterTable,
        species: &str,
        id: SpeciesId,
        profiles: &CustomProfiles,
    ) -> Result<Self, EngineError> {
        let config = SpeciesConfig::from_table(table, species, id)?;
        let arena = ManagedArena::new();
        let injector = PlasmaInjector::from_table(table, species, &arena, profiles)?;
        Self::new(config, injector, arena)
    }

    /// Species configuration.
    pub fn config(&self) -> &SpeciesConfig {
        &self.config
    }

    /// Attribute name → column map.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Plasma injector.
    pub fn injector(&self) -> &PlasmaInjector {
        &self.injector
    }

    /// Arena holding the injector's managed storage.
    pub fn arena(&self) -> &ManagedArena {
        &self.arena
    }

    /// ADK coefficients, if field ionization is enabled.
    pub fn ionization(&self) -> Option<&IonizationModule> {
        self.ionization.as_ref()
    }

    /// Total committed particles.
    pub fn num_particles(&self) -> usize {
        self.tiles.values().map(|s| s.tile.len()).sum()
    }

    /// Committed particles on `level`.
    pub fn num_particles_at(&self, level: u32) -> usize {
        self.tiles
            .values()
            .filter(|s| s.tile.id().level == level)
            .map(|s| s.tile.len())
            .sum()
    }

    /// Every tile in [`TileId`] order.
    pub fn tiles(&self) -> impl Iterator<Item = &ParticleTile> + '_ {
        self.tiles.values().map(|s| &s.tile)
    }

    /// One tile.
    pub fn tile(&self, id: TileId) -> Option<&ParticleTile> {
        self.tiles.get(&id).map(|s| &s.tile)
    }

    /// One tile, mutably. Reordering or resizing it invalidates particle
    /// indices as usual.
    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut ParticleTile> {
        self.tiles.get_mut(&id).map(|s| &mut s.tile)
    }

    fn ensure_tiles(&mut self, layout: &LevelLayout) {
        let level = layout.level();
        let mut added = false;
        for grid in 0..layout.grids().len() {
            for (t, cells) in layout.tiles(grid).into_iter().enumerate() {
                let id = TileId::new(level, grid as u32, t as u32);
                if self.tiles.contains_key(&id) {
                    continue;
                }
                let rng = ChaCha8Rng::seed_from_u64(self.config.seed ^ id.seed_offset());
                self.tiles.insert(
                    id,
                    TileState {
                        tile: ParticleTile::new(id, &self.attributes),
                        cells,
                        rng,
                    },
                );
                added = true;
            }
        }
        if added {
            self.tiles.sort_keys();
        }
    }

    /// Commit staged particles on `level` and set their ionization level.
    fn commit_level(&mut self, level: u32) {
        let start = self.ionization.as_ref().map(IonizationModule::initial_level);
        let col = self.attributes.ionization_level();
        for s in self.tiles.values_mut().filter(|s| s.tile.id().level == level) {
            let before = s.tile.len();
            let after = s.tile.commit_size();
            if let (Some(start), Some(col)) = (start, col) {
                s.tile.int_mut(col)[before..after].fill(start);
            }
        }
    }

    // ── Injection ──────────────────────────────────────────────────

    /// Populate `layout`'s level from the plasma injector. Returns the
    /// number of particles created.
    ///
    /// Each cell receives the injector's in-cell offsets; a particle is
    /// kept if it lies inside the plasma bounds and the density there is
    /// accepted, and carries weight `density * cell_volume / ppc`.
    pub fn init_data(&mut self, layout: &LevelLayout) -> usize {
        self.ensure_tiles(layout);
        let level = layout.level();

        if let InjectionStyle::SingleParticle { position, weight } = self.injector.style {
            let tile = layout.locate(position).map(|(g, t)| TileId::new(level, g, t));
            let Some(state) = tile.and_then(|id| self.tiles.get_mut(&id)) else {
                warn!(
                    species = %self.config.name,
                    ?position,
                    "single particle lies outside every grid"
                );
                return 0;
            };
            let u = self
                .injector
                .momentum
                .sample(position[0], position[1], position[2], &mut state.rng);
            state.tile.push(position, u, weight);
            self.commit_level(level);
            info!(species = %self.config.name, level, particles = 1, "plasma injected");
            return 1;
        }

        let geom = layout.geom();
        let injector = &self.injector;
        let inject = |state: &mut TileState| inject_tile(injector, geom, state);
        let states: Vec<&mut TileState> = self
            .tiles
            .values_mut()
            .filter(|s| s.tile.id().level == level)
            .collect();
        let counts: Vec<(usize, usize)> = match self.config.backend {
            Backend::Sequential => states.into_iter().map(inject).collect(),
            Backend::Parallel => states.into_par_iter().map(inject).collect(),
        };
        self.commit_level(level);

        let added: usize = counts.iter().map(|c| c.0).sum();
        let clamped: usize = counts.iter().map(|c| c.1).sum();
        if clamped > 0 {
            warn!(
                species = %self.config.name,
                clamped,
                "density profile returned negative or non-finite values; clamped to zero"
            );
        }
        info!(species = %self.config.name, level, particles = added, "plasma injected");
        added
    }

    /// Add particles `(position, momentum, weight)` to the tiles of
    /// `layout` that own their cells. Particles outside every grid are
    /// skipped. Returns the number added.
    pub fn add_particles(
        &mut self,
        layout: &LevelLayout,
        particles: &[(Vec3, Vec3, Real)],
    ) -> usize {
        self.ensure_tiles(layout);
        let level = layout.level();
        let mut added = 0;
        for &(pos, u, w) in particles {
            let Some((grid, tile)) = layout.locate(pos) else {
                continue;
            };
            if let Some(state) = self.tiles.get_mut(&TileId::new(level, grid, tile)) {
                state.tile.push(pos, u, w);
                added += 1;
            }
        }
        self.commit_level(level);
        if added < particles.len() {
            debug!(
                species = %self.config.name,
                skipped = particles.len() - added,
                "particles outside every grid were not added"
            );
        }
        added
    }

    // ── Step ───────────────────────────────────────────────────────

    /// Advance every tile of `layout`'s level by `dt`.
    ///
    /// `grids[g]` supplies the fields of grid `g`. Deposits are added to
    /// the accumulators in `grids`; nothing is cleared first.
    ///
    /// # Panics
    ///
    /// If `grids` does not hold exactly one entry per grid of `layout`.
    pub fn evolve(
        &mut self,
        layout: &LevelLayout,
        grids: &mut [GridFields<'_>],
        dt: Real,
    ) -> EvolveReport {
        assert_eq!(
            grids.len(),
            layout.grids().len(),
            "evolve: expected one GridFields per grid of level {}",
            layout.level()
        );
        self.ensure_tiles(layout);
        let level = layout.level();
        let geom = layout.geom();
        let backend = self.config.backend;
        let filter = self
            .config
            .filter
            .map(|n| BilinearFilter::new(n, geom.dim()))
            .filter(|f| !f.is_identity());

        let started = Instant::now();
        let filtered: Vec<(Option<EmFields>, Option<EmFields>)> = grids
            .iter()
            .map(|g| match &filter {
                Some(f) => (
                    Some(f.apply_fields(g.fine.fields, backend)),
                    g.coarse.as_ref().map(|c| f.apply_fields(c.patch.fields, backend)),
                ),
                None => (None, None),
            })
            .collect();

        let outputs: Vec<TileOutput> = {
            let views: Vec<GridView<'_>> = grids
                .iter()
                .zip(&filtered)
                .map(|(g, (fine, coarse))| GridView {
                    fine: FieldSource {
                        fields: fine.as_ref().unwrap_or(g.fine.fields),
                        geom,
                    },
                    current: &*g.fine.current,
                    rho: g.fine.rho.as_deref(),
                    coarse: g.coarse.as_ref().map(|c| CoarseView {
                        source: FieldSource {
                            fields: coarse.as_ref().unwrap_or(c.patch.fields),
                            geom: c.geom,
                        },
                        current: &*c.patch.current,
                        rho: c.patch.rho.as_deref(),
                        masks: c.masks,
                    }),
                })
                .collect();
            let step = TileStep {
                config: &self.config,
                ionization: self.ionization.as_ref(),
                level_col: self.attributes.ionization_level(),
                geom,
                views: &views,
                dt,
            };
            let states: Vec<&mut TileState> = self
                .tiles
                .values_mut()
                .filter(|s| s.tile.id().level == level)
                .collect();
            match backend {
                Backend::Sequential => states.into_iter().map(|s| step.advance(s)).collect(),
                Backend::Parallel => states.into_par_iter().map(|s| step.advance(s)).collect(),
            }
        };
        let tile_us = started.elapsed().as_micros() as u64;

        let merge_start = Instant::now();
        let mut report = EvolveReport {
            level,
            tiles: outputs.len(),
            tile_us,
            ..EvolveReport::default()
        };
        for out in outputs {
            report.particles += out.particles;
            report.nfine_current += out.nfine_current;
            report.nfine_gather += out.nfine_gather;
            if !out.ionized.is_empty() {
                report.ionized += out.ionized.len();
                report.ionized_particles.push((out.tile, out.ionized));
            }
            report.dropped_deposits += out.dropped;

            let g = &mut grids[out.grid];
            if let Some(j) = &out.fine_current {
                g.fine.current.accumulate(j);
            }
            if let (Some(r), Some(rho)) = (&out.fine_rho, g.fine.rho.as_deref_mut()) {
                rho.accumulate(r);
            }
            if let Some(c) = g.coarse.as_mut() {
                if let Some(j) = &out.coarse_current {
                    c.patch.current.accumulate(j);
                }
                if let (Some(r), Some(rho)) = (&out.coarse_rho, c.patch.rho.as_deref_mut()) {
                    rho.accumulate(r);
                }
            }
        }
        report.merge_us = merge_start.elapsed().as_micros() as u64;

        debug!(
            species = %self.config.name,
            level,
            tiles = report.tiles,
            particles = report.particles,
            nfine_current = report.nfine_current,
            nfine_gather = report.nfine_gather,
            ionized = report.ionized,
            dropped = report.dropped_deposits,
            "evolve"
        );
        report
    }

    /// Move every particle of `layout`'s level by `dt` without changing
    /// its momentum. Used with `dt / 2` to desynchronise positions from
    /// momenta after injection or restart.
    pub fn push_positions(&mut self, layout: &LevelLayout, dt: Real) {
        let level = layout.level();
        let dim = layout.geom().dim();
        let states = self.tiles.values_mut().filter(|s| s.tile.id().level == level);
        match self.config.backend {
            Backend::Sequential => {
                states.for_each(|s| pusher::push_positions(&mut s.tile, dt, dim));
            }
            Backend::Parallel => {
                let states: Vec<&mut TileState> = states.collect();
                states
                    .into_par_iter()
                    .for_each(|s| pusher::push_positions(&mut s.tile, dt, dim));
            }
        }
    }

    /// Configuration and per-level particle counts.
    pub fn header(&self) -> SpeciesHeader {
        let mut particles_per_level: Vec<(u32, u64)> = Vec::new();
        for s in self.tiles.values() {
            let level = s.tile.id().level;
            let n = s.tile.len() as u64;
            match particles_per_level.last_mut() {
                Some((l, count)) if *l == level => *count += n,
                _ => particles_per_level.push((level, n)),
            }
        }
        SpeciesHeader {
            config: self.config.clone(),
            particles_per_level,
        }
    }

    /// Encode [`header`](Self::header) into `w`.
    pub fn write_header(&self, w: &mut dyn Write) -> Result<(), HeaderError> {
        header::write_header(w, &self.header())
    }

    /// Release the injector's managed storage and drop every particle.
    /// Returns the number of buffers still outstanding, which is zero
    /// unless storage was allocated from this arena elsewhere.
    pub fn teardown(self) -> usize {
        let particles = self.num_particles();
        self.injector.release(&self.arena);
        let outstanding = self.arena.outstanding();
        info!(species = %self.config.name, particles, outstanding, "species torn down");
        outstanding
    }
}

/// Fill one tile from the injector. Returns `(added, clamped)`, where
/// `clamped` counts density samples that were negative or non-finite.
fn inject_tile(
    injector: &PlasmaInjector,
    geom: &Geometry,
    state: &mut TileState,
) -> (usize, usize) {
    let dx = geom.cell_size();
    let vol = geom.cell_volume();
    let ppc = injector.style.particles_per_cell().max(1) as Real;
    let mut offsets = Vec::new();
    let mut added = 0;
    let mut clamped = 0;
    for iv in state.cells.cells() {
        offsets.clear();
        injector.cell_offsets(&mut state.rng, &mut offsets);
        let corner = geom.node_position(iv);
        for off in &offsets {
            let p = [
                corner[0] + off[0] * dx[0],
                corner[1] + off[1] * dx[1],
                corner[2] + off[2] * dx[2],
            ];
            if !injector.bounds.contains(p) {
                continue;
            }
            let raw = injector.density.sample(p[0], p[1], p[2]);
            if !raw.is_finite() || raw < 0.0 {
                clamped += 1;
            }
            let Some(n) = injector.clip_density(raw) else {
                continue;
            };
            let u = injector.momentum.sample(p[0], p[1], p[2], &mut state.rng);
            state.tile.push(p, u, n * vol / ppc);
            added += 1;
        }
    }
    (added, clamped)
}

// ── Per-tile step ──────────────────────────────────────────────────

struct CoarseView<'a> {
    source: FieldSource<'a>,
    current: &'a CurrentDensity,
    rho: Option<&'a FieldArray<Real>>,
    masks: BufferMasks<'a>,
}

struct GridView<'a> {
    fine: FieldSource<'a>,
    current: &'a CurrentDensity,
    rho: Option<&'a FieldArray<Real>>,
    coarse: Option<CoarseView<'a>>,
}

struct TileOutput {
    tile: TileId,
    grid: usize,
    particles: usize,
    nfine_current: usize,
    nfine_gather: usize,
    ionized: Vec<usize>,
    dropped: usize,
    fine_current: Option<CurrentDensity>,
    fine_rho: Option<FieldArray<Real>>,
    coarse_current: Option<CurrentDensity>,
    coarse_rho: Option<FieldArray<Real>>,
}

struct TileStep<'a> {
    config: &'a SpeciesConfig,
    ionization: Option<&'a IonizationModule>,
    level_col: Option<usize>,
    geom: &'a Geometry,
    views: &'a [GridView<'a>],
    dt: Real,
}

impl TileStep<'_> {
    fn advance(&self, state: &mut TileState) -> TileOutput {
        let id = state.tile.id();
        let grid = id.grid as usize;
        let view = self
            .views
            .get(grid)
            .unwrap_or_else(|| panic!("tile {id} refers to missing grid {grid}"));
        let cfg = self.config;
        let tile = &mut state.tile;
        let n = tile.len();
        let mut out = TileOutput {
            tile: id,
            grid,
            particles: n,
            nfine_current: 0,
            nfine_gather: 0,
            ionized: Vec::new(),
            dropped: 0,
            fine_current: None,
            fine_rho: None,
            coarse_current: None,
            coarse_rho: None,
        };
        if n == 0 {
            return out;
        }
        // Within a tile every loop runs in particle order on this thread.
        let local = Backend::Sequential;

        // 1. Gather.
        out.nfine_gather = match &view.coarse {
            None => {
                gather(tile, 0..n, view.fine, cfg.shape);
                n
            }
            Some(c) if cfg.gather_from_main_grid => {
                gather(tile, 0..n, c.source, cfg.shape);
                0
            }
            Some(c) => {
                let use_coarse = classify(tile, self.geom, c.masks.gather, local);
                gather_split(tile, 0..n, &use_coarse, view.fine, c.source, cfg.shape);
                use_coarse.iter().filter(|&&b| !b).count()
            }
        };

        // 2. Push.
        pusher::push_tile(
            tile,
            0..n,
            cfg.pusher,
            cfg.charge,
            cfg.mass,
            self.dt,
            self.geom.dim(),
        );

        // 3. Partition by the buffer masks.
        out.nfine_current = match &view.coarse {
            None => n,
            Some(c) => {
                let split = partition_two_masks(tile, self.geom, c.masks, local);
                tile.reorder(&split.permutation, local);
                split.nfine_current
            }
        };

        // 4. Deposit.
        let nfine = out.nfine_current;
        let (fine, coarse) = match &view.coarse {
            None => (0..n, 0..0),
            Some(_) if cfg.deposit_on_main_grid => (0..0, 0..n),
            Some(_) => match cfg.buffer_deposit {
                BufferDeposit::Instead => (0..nfine, nfine..n),
                BufferDeposit::Additionally => (0..n, nfine..n),
            },
        };
        if !fine.is_empty() {
            let (j, r, dropped) = self.deposit(tile, fine, self.geom, view.current, view.rho);
            out.fine_current = j;
            out.fine_rho = r;
            out.dropped += dropped;
        }
        if let (false, Some(c)) = (coarse.is_empty(), &view.coarse) {
            let (j, r, dropped) = self.deposit(tile, coarse, c.source.geom, c.current, c.rho);
            out.coarse_current = j;
            out.coarse_rho = r;
            out.dropped += dropped;
        }

        // 5. Ionization.
        if let (Some(ion), Some(col)) = (self.ionization, self.level_col) {
            out.ionized = ion.ionize_tile(tile, 0..n, col, &mut state.rng, self.dt);
        }
        out
    }

    /// Deposit particles in `range` into private buffers covering only the
    /// nodes they touch, clipped to the target arrays' storage.
    fn deposit(
        &self,
        tile: &ParticleTile,
        range: Range<usize>,
        geom: &Geometry,
        current: &CurrentDensity,
        rho: Option<&FieldArray<Real>>,
    ) -> (Option<CurrentDensity>, Option<FieldArray<Real>>, usize) {
        let cfg = self.config;
        let mut dropped = 0;
        let j = current_footprint(tile, range.clone(), self.dt, geom, cfg.shape).map(|region| {
            let mut j = current.zeros_within(region);
            dropped += deposit_current(
                tile,
                range.clone(),
                cfg.charge,
                self.dt,
                geom,
                cfg.shape,
                &mut j,
            );
            j
        });
        let r = match rho {
            Some(rho) if cfg.deposit_charge => {
                charge_footprint(tile, range.clone(), geom, cfg.shape).map(|region| {
                    let mut r = rho.zeros_within(region);
                    dropped += deposit_charge(tile, range, cfg.charge, geom, cfg.shape, &mut r);
                    r
                })
            }
            _ => None,
        };
        (j, r, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corona_core::constants::{M_E, Q_E};
    use corona_injector::{InjectorDensity, InjectorMomentum, PlasmaBounds};
    use corona_mesh::Dimensionality;

    fn layout(n: [usize; 3], tile: [i32; 3]) -> LevelLayout {
        let domain = IndexBox::from_extent(n).unwrap();
        let geom = Geometry::new([0.0; 3], [1.0; 3], domain, Dimensionality::Three).unwrap();
        LevelLayout::single_grid(0, geom, tile).unwrap()
    }

    fn uniform_injector(ppc: [u32; 3], density: Real) -> PlasmaInjector {
        PlasmaInjector {
            style: InjectionStyle::NUniformPerCell(ppc),
            bounds: PlasmaBounds::UNBOUNDED,
            density: InjectorDensity::Constant(density),
            momentum: InjectorMomentum::Constant([0.0; 3]),
            density_min: 0.0,
            density_max: Real::INFINITY,
        }
    }

    fn container(config: SpeciesConfig, injector: PlasmaInjector) -> ParticleContainer {
        ParticleContainer::new(config, injector, ManagedArena::new()).unwrap()
    }

    #[test]
    fn init_data_fills_every_cell() {
        let l = layout([4, 4, 4], [2, 2, 2]);
        let cfg = SpeciesConfig::builder("e").build().unwrap();
        let mut c = container(cfg, uniform_injector([2, 1, 1], 8.0));
        assert_eq!(c.init_data(&l), 4 * 4 * 4 * 2);
        assert_eq!(c.tiles().count(), 8);
        // weight = density * volume / ppc
        let w: Real = c.tiles().flat_map(|t| t.comp(corona_core::RealComp::W).to_vec()).sum();
        assert!((w - 8.0 * 64.0).abs() < 1e-9);
        for t in c.tiles() {
            assert_eq!(t.len(), 16);
        }
    }

    #[test]
    fn tiles_are_kept_in_id_order() {
        let l = layout([4, 4, 4], [1, 2, 4]);
        let cfg = SpeciesConfig::builder("e").build().unwrap();
        let mut c = container(cfg, uniform_injector([1, 1, 1], 1.0));
        c.init_data(&l);
        let ids: Vec<TileId> = c.tiles().map(ParticleTile::id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn ionized_species_start_at_the_initial_level() {
        let l = layout([2, 2, 2], [2, 2, 2]);
        let cfg = SpeciesConfig::builder("n")
            .charge_mass(Q_E, 14.0 * 1836.0 * M_E)
            .ionization(vec![14.5, 29.6, 47.4], 2)
            .build()
            .unwrap();
        let mut c = container(cfg, uniform_injector([1, 1, 1], 1.0));
        c.init_data(&l);
        let col = c.attributes().ionization_level().unwrap();
        for t in c.tiles() {
            assert!(t.int(col).iter().all(|&lvl| lvl == 2));
        }
    }

    #[test]
    fn add_particles_skips_positions_outside_the_grids() {
        let l = layout([4, 4, 4], [2, 2, 2]);
        let cfg = SpeciesConfig::builder("e").build().unwrap();
        let mut c = container(cfg, uniform_injector([1, 1, 1], 1.0));
        let added = c.add_particles(
            &l,
            &[
                ([0.5, 0.5, 0.5], [0.0; 3], 1.0),
                ([3.5, 3.5, 3.5], [0.0; 3], 1.0),
                ([9.0, 0.5, 0.5], [0.0; 3], 1.0),
            ],
        );
        assert_eq!(added, 2);
        assert_eq!(c.num_particles(), 2);
        assert_eq!(c.tile(TileId::new(0, 0, 7)).map(ParticleTile::len), Some(1));
    }

    #[test]
    fn header_counts_particles_per_level() {
        let l0 = layout([4, 4, 4], [2, 2, 2]);
        let fine = IndexBox::new([0, 0, 0], [3, 3, 3]).unwrap();
        let domain = IndexBox::from_extent([8, 8, 8]).unwrap();
        let g1 = Geometry::new([0.0; 3], [0.5; 3], domain, Dimensionality::Three).unwrap();
        let l1 = LevelLayout::new(1, g1, vec![fine], [4, 4, 4]).unwrap();
        let cfg = SpeciesConfig::builder("e").build().unwrap();
        let mut c = container(cfg, uniform_injector([1, 1, 1], 1.0));
        c.init_data(&l0);
        c.add_particles(&l1, &[([0.25; 3], [0.0; 3], 1.0), ([1.75; 3], [0.0; 3], 1.0)]);
        let h = c.header();
        assert_eq!(h.particles_per_level, vec![(0, 64), (1, 2)]);
        assert_eq!(&h.config, c.config());
    }

    #[test]
    fn teardown_releases_everything() {
        let cfg = SpeciesConfig::builder("e").build().unwrap();
        let c = container(cfg, uniform_injector([1, 1, 1], 1.0));
        assert_eq!(c.teardown(), 0);
    }

    #[test]
    fn push_positions_leaves_momentum() {
        let l = layout([4, 4, 4], [4, 4, 4]);
        let cfg = SpeciesConfig::builder("e").build().unwrap();
        let mut c = container(cfg, uniform_injector([1, 1, 1], 1.0));
        c.add_particles(&l, &[([1.5, 1.5, 1.5], [1.0e6, 0.0, 0.0], 1.0)]);
        c.push_positions(&l, 1e-7);
        let t = c.tile(TileId::new(0, 0, 0)).unwrap();
        assert!(t.position(0)[0] > 1.5);
        assert_eq!(t.momentum(0), [1.0e6, 0.0, 0.0]);
    }
}
