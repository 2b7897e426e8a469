//! Layered tile map generation library
//!
//! A deterministic world map generator for 2D grid games:
//! - Diamond-square elevation synthesis with level stretch, noise and blur
//! - Semantic layer stack: sea, rivers, river deltas, biomes, cities, roads
//! - Tile classification into rotation-aware archetypes (edges, corners,
//!   line pieces, river mouths)
//! - Road routing via weighted shortest paths over the generated terrain
//! - Versioned binary persistence and flat PNG export
//!
//! The entire pipeline is driven by a single seed: two worlds built from
//! the same seed, dimension and layer list are byte-identical.

pub mod classify;
pub mod error;
pub mod export;
pub mod grid;
pub mod heightmap;
pub mod layers;
pub mod params;
pub mod persist;
pub mod seeds;
pub mod tiles;
pub mod world;

pub use error::GenError;
pub use layers::{City, Layer, LayerKind};
pub use params::{HeightmapParams, WorldParams};
pub use world::{Stage, World};
