//! Seed management for world generation.
//!
//! Every randomness-consuming stage gets its own seed derived from the
//! master seed, so the draw count of one stage never shifts the output of
//! another. Derivation is a splitmix64 finalizer over the master seed and a
//! fixed per-stage salt, which keeps the derived values identical across
//! platforms and process restarts.

use crate::layers::LayerKind;

const SALT_HEIGHTMAP: u64 = 0x68_6569_6768_7431;
const SALT_RIVER: u64 = 0x72_6976_6572_7331;
const SALT_BIOME: u64 = 0x62_696f_6d65_7331;
const SALT_CITY: u64 = 0x63_6974_6965_7331;
const SALT_ROAD: u64 = 0x72_6f61_6473_3131;

/// Seeds for all world generation stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldSeeds {
    /// Master seed (used for display and persistence)
    pub master: u64,
    /// Elevation synthesis
    pub heightmap: u64,
    /// River source sampling and walk tie-breaks
    pub river: u64,
    /// Per-component biome choice
    pub biome: u64,
    /// Weighted city cell sampling
    pub city: u64,
    /// City pair sampling for road planning
    pub road: u64,
}

impl WorldSeeds {
    /// Derive all stage seeds deterministically from a master seed.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            heightmap: derive_seed(master, SALT_HEIGHTMAP),
            river: derive_seed(master, SALT_RIVER),
            biome: derive_seed(master, SALT_BIOME),
            city: derive_seed(master, SALT_CITY),
            road: derive_seed(master, SALT_ROAD),
        }
    }

    /// The seed a given layer's generator should build its RNG from.
    /// Layers without a random component draw nothing and simply get the
    /// master seed back.
    pub fn for_layer(&self, kind: LayerKind) -> u64 {
        match kind {
            LayerKind::River => self.river,
            LayerKind::Biome => self.biome,
            LayerKind::City => self.city,
            LayerKind::Road => self.road,
            LayerKind::Sea | LayerKind::Delta => self.master,
        }
    }
}

/// splitmix64 finalizer. Full-period mixing of the 64-bit input.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn derive_seed(master: u64, salt: u64) -> u64 {
    splitmix64(master ^ salt)
}
