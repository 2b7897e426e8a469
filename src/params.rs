//! Tunable generation parameters.
//!
//! Every threshold and density that shapes the output lives here with its
//! default value. The defaults are part of the on-disk contract: a world
//! regenerated from its seed only matches the saved grids if the same
//! parameter set is used.

/// Parameters for the diamond-square elevation synthesizer.
#[derive(Clone, Debug)]
pub struct HeightmapParams {
    /// Initial perturbation amplitude
    pub perturb_range: u32,
    /// Amplitude decay per subdivision step (0.0-1.0)
    pub perturb_decrease: f32,
    /// Stop subdividing below this cell size and block-fill the remainder
    pub min_cell_size: u32,
    /// Post-stretch uniform noise amplitude (0 = off)
    pub noise_range: u32,
    /// Gaussian blur sigma (0.0 = off)
    pub blur_sigma: f32,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            perturb_range: 256,
            perturb_decrease: 0.35,
            min_cell_size: 1,
            noise_range: 0,
            blur_sigma: 0.0,
        }
    }
}

/// Parameters for the semantic layer generators.
#[derive(Clone, Debug)]
pub struct WorldParams {
    pub heightmap: HeightmapParams,

    /// Elevation at or below which a cell is a sea candidate
    pub sea_threshold: u8,
    /// Seas below this cell count are merged back into land
    pub min_sea_size: usize,

    /// Elevation at or above which a cell can seed a river
    pub mountain_threshold: u8,
    /// Fraction of mountain cells that become river sources
    pub river_density: f64,
    /// Lower bound on river sources when mountains are scarce
    pub min_river_sources: usize,

    /// Elevation margin around the sea/mountain thresholds excluded from
    /// biome placement
    pub biome_h_delta: u8,
    /// Biome patches below this cell count are dropped
    pub min_biome_size: usize,

    /// Smallest land component that can support settlement
    pub min_popsupport_size: usize,
    /// Fraction of candidate cells sampled as city sites
    pub city_density: f64,
    /// Minimum city spacing is dim / this factor...
    pub city_closeness_factor: f64,
    /// ...but never more than this radius
    pub max_city_disallow_radius: f64,

    /// Movement cost of an existing road cell
    pub mp_road: f32,
    /// Movement cost of crossing a straight river section
    pub mp_bridge: f32,
    /// Additive movement cost on desert cells (negative: open terrain)
    pub mp_penalty_desert: f32,
    /// Additive movement cost on forest cells
    pub mp_penalty_forest: f32,
    /// Cost per unit of elevation change between adjacent cells
    pub mp_penalty_elev: f32,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            heightmap: HeightmapParams::default(),
            sea_threshold: 96,
            min_sea_size: 32,
            mountain_threshold: 192,
            river_density: 0.15,
            min_river_sources: 4,
            biome_h_delta: 15,
            min_biome_size: 32,
            min_popsupport_size: 12,
            city_density: 0.005,
            city_closeness_factor: 8.0,
            max_city_disallow_radius: 16.0,
            mp_road: 0.2,
            mp_bridge: 5.0,
            mp_penalty_desert: -0.2,
            mp_penalty_forest: 0.5,
            mp_penalty_elev: 0.05,
        }
    }
}

impl WorldParams {
    /// Minimum Euclidean distance between two cities on a map of side `dim`.
    pub fn city_min_distance(&self, dim: usize) -> f64 {
        (dim as f64 / self.city_closeness_factor).min(self.max_city_disallow_radius)
    }
}
