//! World container and generation pipeline.
//!
//! A `World` owns the elevation grid and the layer stack, and is the only
//! entry point consumers need: construct it with a seed, a dimension and a
//! layer list, call `generate`, then read the grids back out.

use log::info;

use crate::error::GenError;
use crate::grid::Grid;
use crate::heightmap;
use crate::layers::{City, Layer, LayerKind, LayerStack};
use crate::params::WorldParams;
use crate::seeds::WorldSeeds;

/// Pipeline stage identifiers passed to the progress callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Heightmap,
    Layer(LayerKind),
}

/// A generated (or generatable) world.
pub struct World {
    seed: i64,
    seeds: WorldSeeds,
    dim: usize,
    params: WorldParams,
    heightmap: Grid<u8>,
    stack: LayerStack,
    cities: Vec<City>,
}

impl World {
    /// Construct an empty world with default parameters.
    pub fn new(seed: i64, dim: u32, kinds: &[LayerKind]) -> Result<Self, GenError> {
        Self::with_params(seed, dim, kinds, WorldParams::default())
    }

    /// Construct an empty world with explicit parameters.
    pub fn with_params(
        seed: i64,
        dim: u32,
        kinds: &[LayerKind],
        params: WorldParams,
    ) -> Result<Self, GenError> {
        if dim == 0 || !dim.is_power_of_two() {
            return Err(GenError::config(format!(
                "world dimension must be a power of two, got {dim}"
            )));
        }
        let dim = dim as usize;
        Ok(Self {
            seed,
            seeds: WorldSeeds::from_master(seed as u64),
            dim,
            params,
            heightmap: Grid::new_with(dim, 0),
            stack: LayerStack::new(dim, kinds)?,
            cities: Vec::new(),
        })
    }

    pub(crate) fn from_parts(
        seed: i64,
        dim: u32,
        kinds: &[LayerKind],
        heightmap: Grid<u8>,
        cities: Vec<City>,
    ) -> Result<Self, GenError> {
        let mut world = Self::new(seed, dim, kinds)?;
        world.heightmap = heightmap;
        world.cities = cities;
        Ok(world)
    }

    pub(crate) fn stack_mut(&mut self) -> &mut LayerStack {
        &mut self.stack
    }

    /// Run the full pipeline: the heightmap, then every layer in insertion
    /// order. `progress` is invoked after the heightmap and after each
    /// layer. Re-running regenerates everything from the stored seed.
    pub fn generate(&mut self, mut progress: impl FnMut(Stage)) -> Result<(), GenError> {
        self.heightmap = heightmap::generate(self.dim, &self.params.heightmap, self.seeds.heightmap)?;
        info!("heightmap generated ({0}x{0})", self.dim);
        progress(Stage::Heightmap);

        let mut cities = Vec::new();
        let result = self.stack.generate_all(
            &self.heightmap,
            &self.params,
            &self.seeds,
            &mut cities,
            |kind| {
                info!("layer {kind} generated");
                progress(Stage::Layer(kind));
            },
        );
        self.cities = cities;
        result
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    /// Read-only view of the elevation grid.
    pub fn heights(&self) -> &Grid<u8> {
        &self.heightmap
    }

    /// A layer's labeled grid and classification, if the kind is stacked.
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.stack.get(kind)
    }

    /// Kinds in insertion order.
    pub fn layer_kinds(&self) -> Vec<LayerKind> {
        self.stack.kinds()
    }

    /// Founded cities, ordered by id.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }
}
