//! The ordered stack of semantic map layers.
//!
//! Each layer owns a labeled cell grid and, once generated, a tile
//! classification. Layers are generated in insertion order; every kind
//! declares the kinds that must already be generated before it runs, and
//! the stack verifies that before dispatching. Generators read earlier
//! layers through the stack; the delta generator is the one deliberate
//! exception that also rewrites river cells at river mouths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classify::{self, ClassifierKind};
use crate::error::GenError;
use crate::grid::Grid;
use crate::params::WorldParams;
use crate::seeds::WorldSeeds;

pub mod biome;
pub mod city;
pub mod delta;
pub mod river;
pub mod road;
pub mod sea;

pub use city::City;

/// The semantic layer kinds, in canonical generation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Sea,
    River,
    Delta,
    Biome,
    City,
    Road,
}

impl LayerKind {
    /// All kinds in canonical order.
    pub const ALL: [LayerKind; 6] = [
        LayerKind::Sea,
        LayerKind::River,
        LayerKind::Delta,
        LayerKind::Biome,
        LayerKind::City,
        LayerKind::Road,
    ];

    /// Layer kinds that must be generated before this one.
    pub fn prerequisites(&self) -> &'static [LayerKind] {
        use LayerKind::*;
        match self {
            Sea => &[],
            River => &[Sea],
            Delta => &[Sea, River],
            Biome => &[Sea, River],
            City => &[Sea, River, Biome],
            Road => &[Sea, River, Biome, City],
        }
    }

    /// The classifier this layer's grid runs through after generation.
    pub fn classifier(&self) -> ClassifierKind {
        use LayerKind::*;
        match self {
            Sea => ClassifierKind::SolidReversed,
            River => ClassifierKind::Line,
            Delta => ClassifierKind::Delta,
            Biome => ClassifierKind::Solid,
            City | Road => ClassifierKind::Simple,
        }
    }

    pub fn name(&self) -> &'static str {
        use LayerKind::*;
        match self {
            Sea => "sea",
            River => "river",
            Delta => "delta",
            Biome => "biome",
            City => "city",
            Road => "road",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sea" => Ok(LayerKind::Sea),
            "river" => Ok(LayerKind::River),
            "delta" => Ok(LayerKind::Delta),
            "biome" => Ok(LayerKind::Biome),
            "city" => Ok(LayerKind::City),
            "road" => Ok(LayerKind::Road),
            other => Err(format!("unknown layer kind '{other}'")),
        }
    }
}

/// One semantic layer: its labeled grid and its tile classification.
#[derive(Debug)]
pub struct Layer {
    pub kind: LayerKind,
    pub grid: Grid<u8>,
    pub tiles: Option<Grid<u64>>,
    generated: bool,
}

impl Layer {
    fn new(kind: LayerKind, dim: usize) -> Self {
        Self { kind, grid: Grid::new_with(dim, 0), tiles: None, generated: false }
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Number of nonzero cells; the usual "how much of this feature" query.
    pub fn cell_count(&self) -> usize {
        self.grid.nonzero().count()
    }
}

/// Insertion-ordered collection of layers with kind-keyed lookup.
#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Build an empty stack. Duplicate kinds are rejected.
    pub fn new(dim: usize, kinds: &[LayerKind]) -> Result<Self, GenError> {
        let mut layers: Vec<Layer> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            if layers.iter().any(|l| l.kind == kind) {
                return Err(GenError::config(format!("duplicate layer kind '{kind}'")));
            }
            layers.push(Layer::new(kind, dim));
        }
        Ok(Self { layers })
    }

    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(|l| l.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    fn position(&self, kind: LayerKind) -> Option<usize> {
        self.layers.iter().position(|l| l.kind == kind)
    }

    /// Restore a layer from saved state (used by the load path).
    pub(crate) fn restore(&mut self, kind: LayerKind, grid: Grid<u8>, tiles: Option<Grid<u64>>) {
        if let Some(i) = self.position(kind) {
            self.layers[i].grid = grid;
            self.layers[i].tiles = tiles;
            self.layers[i].generated = true;
        }
    }

    /// Generate every layer in insertion order, classifying each as it
    /// completes. `progress` runs after each finished layer.
    pub fn generate_all(
        &mut self,
        heightmap: &Grid<u8>,
        params: &WorldParams,
        seeds: &WorldSeeds,
        cities: &mut Vec<City>,
        mut progress: impl FnMut(LayerKind),
    ) -> Result<(), GenError> {
        // A fresh run starts from clean grids, so regeneration reproduces
        // the first run exactly.
        for layer in &mut self.layers {
            layer.grid.fill(0);
            layer.tiles = None;
            layer.generated = false;
        }
        cities.clear();

        for i in 0..self.layers.len() {
            let kind = self.layers[i].kind;
            self.check_prerequisites(kind)?;

            let result = self.dispatch(i, heightmap, params, seeds, cities);

            let layer = &mut self.layers[i];
            match result {
                Ok(()) => {}
                // Capacity overruns keep everything built so far; the layer
                // is complete up to the id limit.
                Err(err @ GenError::Capacity { .. }) => {
                    layer.tiles = Some(classify::run(kind.classifier(), &mut layer.grid));
                    layer.generated = true;
                    return Err(err);
                }
                Err(err) => {
                    layer.grid.fill(0);
                    layer.tiles = None;
                    return Err(err);
                }
            }

            let layer = &mut self.layers[i];
            layer.tiles = Some(classify::run(kind.classifier(), &mut layer.grid));
            layer.generated = true;
            progress(kind);
        }
        Ok(())
    }

    fn check_prerequisites(&self, kind: LayerKind) -> Result<(), GenError> {
        for &req in kind.prerequisites() {
            let satisfied = self.get(req).map(|l| l.generated).unwrap_or(false);
            if !satisfied {
                return Err(GenError::Prerequisite { layer: kind, missing: req });
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        i: usize,
        heightmap: &Grid<u8>,
        params: &WorldParams,
        seeds: &WorldSeeds,
        cities: &mut Vec<City>,
    ) -> Result<(), GenError> {
        let kind = self.layers[i].kind;
        match kind {
            LayerKind::Sea => {
                sea::generate(&mut self.layers[i], heightmap, params);
                Ok(())
            }
            LayerKind::River => {
                let (earlier, rest) = self.layers.split_at_mut(i);
                let layer = &mut rest[0];
                let sea = find(earlier, LayerKind::Sea);
                river::generate(layer, sea, heightmap, params, seeds.river)
            }
            LayerKind::Delta => {
                // Prerequisite order guarantees sea and river sit earlier in
                // the stack than the delta layer itself.
                let si = self.position(LayerKind::Sea).expect("prerequisite checked");
                let ri = self.position(LayerKind::River).expect("prerequisite checked");
                let (sea, river, layer) = self.triple_mut(si, ri, i);
                delta::generate(layer, sea, river);
                Ok(())
            }
            LayerKind::Biome => {
                let (earlier, rest) = self.layers.split_at_mut(i);
                let layer = &mut rest[0];
                let sea = find(earlier, LayerKind::Sea);
                let river = find(earlier, LayerKind::River);
                biome::generate(layer, sea, river, heightmap, params, seeds.biome);
                Ok(())
            }
            LayerKind::City => {
                let (earlier, rest) = self.layers.split_at_mut(i);
                let layer = &mut rest[0];
                let sea = find(earlier, LayerKind::Sea);
                let river = find(earlier, LayerKind::River);
                let biome = find(earlier, LayerKind::Biome);
                *cities = city::generate(layer, sea, river, biome, params, seeds.city);
                Ok(())
            }
            LayerKind::Road => {
                let (earlier, rest) = self.layers.split_at_mut(i);
                let layer = &mut rest[0];
                let sea = find(earlier, LayerKind::Sea);
                let river = find(earlier, LayerKind::River);
                let biome = find(earlier, LayerKind::Biome);
                road::generate(layer, sea, river, biome, heightmap, cities, params, seeds.road);
                Ok(())
            }
        }
    }

    /// Disjoint mutable borrows of three layers at ascending positions.
    fn triple_mut(&mut self, a: usize, b: usize, c: usize) -> (&mut Layer, &mut Layer, &mut Layer) {
        debug_assert!(a < b && b < c);
        let (left, right) = self.layers.split_at_mut(c);
        let (left, mid) = left.split_at_mut(b);
        (&mut left[a], &mut mid[0], &mut right[0])
    }
}

fn find(layers: &[Layer], kind: LayerKind) -> &Layer {
    layers
        .iter()
        .find(|l| l.kind == kind)
        .expect("prerequisite layer verified before dispatch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap;
    use crate::params::WorldParams;

    fn generate_stack(kinds: &[LayerKind], seed: u64, dim: usize) -> (LayerStack, Vec<City>) {
        let params = WorldParams::default();
        let seeds = WorldSeeds::from_master(seed);
        let hm = heightmap::generate(dim, &params.heightmap, seeds.heightmap).unwrap();
        let mut stack = LayerStack::new(dim, kinds).unwrap();
        let mut cities = Vec::new();
        stack
            .generate_all(&hm, &params, &seeds, &mut cities, |_| {})
            .unwrap();
        (stack, cities)
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let err = LayerStack::new(8, &[LayerKind::Sea, LayerKind::Sea]).unwrap_err();
        assert!(matches!(err, GenError::Configuration { .. }));
    }

    #[test]
    fn test_missing_prerequisite_is_reported() {
        let params = WorldParams::default();
        let seeds = WorldSeeds::from_master(1);
        let hm = heightmap::generate(16, &params.heightmap, seeds.heightmap).unwrap();

        let mut stack = LayerStack::new(16, &[LayerKind::River]).unwrap();
        let mut cities = Vec::new();
        let err = stack
            .generate_all(&hm, &params, &seeds, &mut cities, |_| {})
            .unwrap_err();

        assert!(matches!(
            err,
            GenError::Prerequisite { layer: LayerKind::River, missing: LayerKind::Sea }
        ));
    }

    #[test]
    fn test_out_of_order_insertion_is_reported() {
        let params = WorldParams::default();
        let seeds = WorldSeeds::from_master(1);
        let hm = heightmap::generate(16, &params.heightmap, seeds.heightmap).unwrap();

        // River inserted ahead of sea: sea exists but is not yet generated
        // when river's turn comes.
        let mut stack = LayerStack::new(16, &[LayerKind::River, LayerKind::Sea]).unwrap();
        let mut cities = Vec::new();
        let err = stack
            .generate_all(&hm, &params, &seeds, &mut cities, |_| {})
            .unwrap_err();
        assert!(matches!(err, GenError::Prerequisite { .. }));
    }

    #[test]
    fn test_progress_reports_each_layer_in_order() {
        let mut stages = Vec::new();
        let params = WorldParams::default();
        let seeds = WorldSeeds::from_master(5);
        let hm = heightmap::generate(32, &params.heightmap, seeds.heightmap).unwrap();
        let mut stack = LayerStack::new(32, &[LayerKind::Sea, LayerKind::River]).unwrap();
        let mut cities = Vec::new();
        stack
            .generate_all(&hm, &params, &seeds, &mut cities, |k| stages.push(k))
            .unwrap();
        assert_eq!(stages, vec![LayerKind::Sea, LayerKind::River]);
    }

    #[test]
    fn test_full_stack_generates_and_classifies() {
        let (stack, _) = generate_stack(&LayerKind::ALL, 42, 64);
        for layer in stack.iter() {
            assert!(layer.is_generated());
            assert!(layer.tiles.is_some());
        }
    }

    #[test]
    fn test_layer_lookup_by_kind() {
        let (stack, _) = generate_stack(&[LayerKind::Sea], 1, 32);
        assert!(stack.get(LayerKind::Sea).is_some());
        assert!(stack.get(LayerKind::River).is_none());
    }
}
