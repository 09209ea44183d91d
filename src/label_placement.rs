//! Greedy placement of POI labels and symbols on a single tile.
//!
//! Candidate text positions are generated around each POI symbol, culled
//! against the dependency cache and the tile's own symbols and area labels,
//! then accepted in input order: the first candidate that collides with
//! nothing already accepted wins, the POI's remaining candidates are
//! discarded.

use tracing::debug;

use crate::container::{PointTextContainer, SymbolContainer};
use crate::dependency_cache::DependencyCache;
use crate::graphics::Rectangle;
use crate::tile::{Tile, TILE_SIZE};

const START_DISTANCE_TO_SYMBOLS: f32 = 4.0;
const SYMBOL_DISTANCE_TO_SYMBOL: f32 = 2.0;
const LABEL_DISTANCE_TO_SYMBOL: f32 = 2.0;

/// Candidate anchor for one label; `(x, y)` is the left end of the baseline
/// the text would get, `label_index` points into the input list.
#[derive(Debug, Clone, Copy)]
pub struct ReferencePosition {
    pub x: f32,
    pub y: f32,
    pub label_index: usize,
    pub width: f32,
    pub height: f32,
}

/// How many candidate positions each POI-with-symbol gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementModel {
    /// Above and below the symbol.
    TwoPoint,
    /// Above, below, left and right of the symbol.
    FourPoint,
}

impl PlacementModel {
    fn slots(self) -> usize {
        match self {
            PlacementModel::TwoPoint => 2,
            PlacementModel::FourPoint => 4,
        }
    }
}

/// Final draw list of one tile render.
#[derive(Debug, Default)]
pub struct TileLabels {
    pub labels: Vec<PointTextContainer>,
    pub symbols: Vec<SymbolContainer>,
    pub area_labels: Vec<PointTextContainer>,
}

/// Per-renderer placement engine; owns the dependency cache of its render
/// session.
pub struct LabelPlacement {
    dependency_cache: DependencyCache,
    placement_model: PlacementModel,
}

impl Default for LabelPlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelPlacement {
    pub fn new() -> Self {
        Self::with_placement_model(PlacementModel::FourPoint)
    }

    pub fn with_placement_model(placement_model: PlacementModel) -> Self {
        Self {
            dependency_cache: DependencyCache::new(),
            placement_model,
        }
    }

    pub fn dependency_cache(&self) -> &DependencyCache {
        &self.dependency_cache
    }

    pub fn dependency_cache_mut(&mut self) -> &mut DependencyCache {
        &mut self.dependency_cache
    }

    /// Runs the whole placement sequence for one tile and commits the result
    /// to the dependency cache. Never fails; colliding or degenerate input
    /// is dropped.
    pub fn place_labels(
        &mut self,
        mut labels: Vec<PointTextContainer>,
        mut symbols: Vec<SymbolContainer>,
        mut area_labels: Vec<PointTextContainer>,
        tile: &Tile,
    ) -> TileLabels {
        self.dependency_cache
            .generate_tile_and_dependency_on_tile(tile);

        self.preprocess_area_labels(&mut area_labels);
        Self::preprocess_labels(&mut labels);
        self.preprocess_symbols(&mut symbols);

        Self::remove_empty_symbol_references(&mut labels, &symbols);
        Self::remove_symbols_overlapping_area_labels(&mut symbols, &area_labels);

        self.dependency_cache.remove_overlapping_objects_with_dependency_on_tile(
            &mut labels,
            &mut area_labels,
            &mut symbols,
        );

        if !labels.is_empty() {
            labels = self.process_greedy(labels, &symbols, &area_labels);
        }

        self.dependency_cache
            .fill_dependency_on_tile(&mut labels, &mut symbols, &mut area_labels);

        debug!(
            tile_x = tile.tile_x,
            tile_y = tile.tile_y,
            zoom_level = tile.zoom_level,
            labels = labels.len(),
            symbols = symbols.len(),
            area_labels = area_labels.len(),
            "placed tile labels"
        );

        TileLabels {
            labels,
            symbols,
            area_labels,
        }
    }

    /// Area labels are anchored at their centroid; centre the text on it,
    /// drop ones outside the tile, ones overlapping an earlier area label,
    /// and ones reaching into a drawn neighbour.
    fn preprocess_area_labels(&mut self, area_labels: &mut Vec<PointTextContainer>) {
        for label in area_labels.iter_mut() {
            label.x -= label.boundary.width() / 2.0;
        }

        Self::remove_out_of_tile_labels(area_labels);

        let mut kept: Vec<Rectangle> = Vec::with_capacity(area_labels.len());
        area_labels.retain(|label| {
            let rect = label.pixel_boundary();
            if kept.iter().any(|other| other.intersects(&rect)) {
                return false;
            }
            kept.push(rect);
            true
        });

        self.dependency_cache
            .remove_area_labels_in_already_drawn_areas(area_labels);
    }

    fn preprocess_labels(labels: &mut Vec<PointTextContainer>) {
        Self::remove_out_of_tile_labels(labels);
    }

    fn preprocess_symbols(&mut self, symbols: &mut Vec<SymbolContainer>) {
        let tile_rect = Self::tile_rect();
        symbols.retain(|symbol| symbol.pixel_boundary().intersects(&tile_rect));

        let mut kept: Vec<Rectangle> = Vec::with_capacity(symbols.len());
        symbols.retain(|symbol| {
            let rect = symbol.pixel_boundary();
            if kept
                .iter()
                .any(|other| other.inflate(SYMBOL_DISTANCE_TO_SYMBOL).intersects(&rect))
            {
                return false;
            }
            kept.push(rect);
            true
        });

        self.dependency_cache
            .remove_symbols_from_drawn_areas(symbols);
    }

    fn remove_out_of_tile_labels(labels: &mut Vec<PointTextContainer>) {
        let tile_rect = Self::tile_rect();
        labels.retain(|label| label.pixel_boundary().intersects(&tile_rect));
    }

    /// A label whose symbol was dropped during preprocessing keeps its text
    /// but loses the symbol reference.
    fn remove_empty_symbol_references(
        labels: &mut [PointTextContainer],
        symbols: &[SymbolContainer],
    ) {
        for label in labels.iter_mut() {
            let gone = label
                .symbol
                .as_ref()
                .is_some_and(|symbol| !symbols.iter().any(|kept| kept.is_same(symbol)));
            if gone {
                label.symbol = None;
            }
        }
    }

    fn remove_symbols_overlapping_area_labels(
        symbols: &mut Vec<SymbolContainer>,
        area_labels: &[PointTextContainer],
    ) {
        symbols.retain(|symbol| {
            let rect = symbol.pixel_boundary();
            !area_labels
                .iter()
                .any(|label| label.pixel_boundary().intersects(&rect))
        });
    }

    /// Two- or four-point greedy: generate candidates, cull them against the
    /// cache, symbols and area labels, then accept in input order.
    fn process_greedy(
        &mut self,
        labels: Vec<PointTextContainer>,
        symbols: &[SymbolContainer],
        area_labels: &[PointTextContainer],
    ) -> Vec<PointTextContainer> {
        let slots = self.placement_model.slots();
        let mut reference_positions: Vec<Option<ReferencePosition>> =
            vec![None; labels.len() * slots];

        for (label_index, label) in labels.iter().enumerate() {
            let width = label.boundary.width();
            let height = label.boundary.height();
            let base = label_index * slots;

            match &label.symbol {
                Some(symbol) => {
                    let symbol_width = symbol.symbol.width();
                    let symbol_height = symbol.symbol.height();
                    let distance = START_DISTANCE_TO_SYMBOLS;

                    // Above the symbol.
                    reference_positions[base] = Some(ReferencePosition {
                        x: label.x - width / 2.0,
                        y: label.y - symbol_height / 2.0 - distance,
                        label_index,
                        width,
                        height,
                    });
                    // Below the symbol.
                    reference_positions[base + 1] = Some(ReferencePosition {
                        x: label.x - width / 2.0,
                        y: label.y + symbol_height / 2.0 + height + distance,
                        label_index,
                        width,
                        height,
                    });
                    if slots == 4 {
                        // Left of the symbol.
                        reference_positions[base + 2] = Some(ReferencePosition {
                            x: label.x - symbol_width / 2.0 - width - distance,
                            y: label.y + height / 2.0,
                            label_index,
                            width,
                            height,
                        });
                        // Right of the symbol.
                        reference_positions[base + 3] = Some(ReferencePosition {
                            x: label.x + symbol_width / 2.0 + distance,
                            y: label.y + height / 2.0 - 0.1,
                            label_index,
                            width,
                            height,
                        });
                    }
                }
                None => {
                    reference_positions[base] = Some(ReferencePosition {
                        x: label.x - width / 2.0,
                        y: label.y,
                        label_index,
                        width,
                        height,
                    });
                }
            }
        }

        Self::remove_invalid_reference_positions(&mut reference_positions, symbols, area_labels);
        self.dependency_cache
            .remove_reference_points_from_dependency_cache(&mut reference_positions);

        let mut accepted: Vec<Rectangle> = Vec::new();
        let mut placed = Vec::with_capacity(labels.len());

        for (label_index, label) in labels.into_iter().enumerate() {
            let base = label_index * slots;
            let choice = (0..slots).find_map(|slot| {
                let reference = reference_positions[base + slot]?;
                let rect = Rectangle::new(
                    reference.x,
                    reference.y - reference.height,
                    reference.x + reference.width,
                    reference.y,
                );
                if accepted.iter().any(|other| other.intersects(&rect)) {
                    return None;
                }
                Some((reference, rect))
            });

            if let Some((reference, rect)) = choice {
                accepted.push(rect);
                let mut chosen = label;
                chosen.x = reference.x;
                chosen.y = reference.y;
                placed.push(chosen);
            }
        }

        placed
    }

    /// Candidates colliding with a symbol (with margin) or an area label are
    /// withdrawn before the greedy pass.
    fn remove_invalid_reference_positions(
        reference_positions: &mut [Option<ReferencePosition>],
        symbols: &[SymbolContainer],
        area_labels: &[PointTextContainer],
    ) {
        for slot in reference_positions.iter_mut() {
            let Some(reference) = slot else {
                continue;
            };
            let rect = Rectangle::new(
                reference.x,
                reference.y - reference.height,
                reference.x + reference.width,
                reference.y,
            );

            let collides = symbols.iter().any(|symbol| {
                symbol
                    .pixel_boundary()
                    .inflate(LABEL_DISTANCE_TO_SYMBOL)
                    .intersects(&rect)
            }) || area_labels
                .iter()
                .any(|label| label.pixel_boundary().intersects(&rect));

            if collides {
                *slot = None;
            }
        }
    }

    fn tile_rect() -> Rectangle {
        let tile_size = TILE_SIZE as f32;
        Rectangle::new(0.0, 0.0, tile_size, tile_size)
    }
}
