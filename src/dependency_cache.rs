//! Cross-tile registry of labels and symbols whose pixel footprint crosses a
//! tile border. Connected to the label placement engine: it removes
//! candidates a neighbour tile has already committed and registers new
//! border-crossing items with every affected neighbour.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::{PointTextContainer, SymbolContainer};
use crate::graphics::{Bitmap, Paint, Point, Rectangle};
use crate::label_placement::ReferencePosition;
use crate::tile::{Tile, TILE_SIZE};

/// Margin around committed items when testing candidates against them.
const CACHE_DISTANCE: f32 = 2.0;

/// Label content shared between every tile entry it was propagated to.
#[derive(Debug)]
pub struct DependencyText {
    pub text: String,
    pub paint_front: Paint,
    pub paint_back: Option<Paint>,
    pub boundary: Rectangle,
    tiles: Mutex<Vec<Tile>>,
}

impl DependencyText {
    fn new(label: &PointTextContainer, tile: Tile) -> Self {
        Self {
            text: label.text.clone(),
            paint_front: label.paint_front.clone(),
            paint_back: label.paint_back.clone(),
            boundary: label.boundary,
            tiles: Mutex::new(vec![tile]),
        }
    }

    fn add_tile(&self, tile: Tile) {
        self.tiles.lock().push(tile);
    }

    /// Tiles this text has been propagated to, in registration order.
    pub fn tiles(&self) -> Vec<Tile> {
        self.tiles.lock().clone()
    }
}

/// Symbol content shared between every tile entry it was propagated to.
#[derive(Debug)]
pub struct DependencySymbol {
    pub symbol: Arc<Bitmap>,
    tiles: Mutex<Vec<Tile>>,
}

impl DependencySymbol {
    fn new(symbol: &SymbolContainer, tile: Tile) -> Self {
        Self {
            symbol: symbol.symbol.clone(),
            tiles: Mutex::new(vec![tile]),
        }
    }

    fn add_tile(&self, tile: Tile) {
        self.tiles.lock().push(tile);
    }

    pub fn tiles(&self) -> Vec<Tile> {
        self.tiles.lock().clone()
    }
}

/// A shared item pinned to one tile at a tile-local position.
#[derive(Debug)]
pub struct Dependency<T> {
    pub value: Arc<T>,
    pub point: Point,
}

impl<T> Dependency<T> {
    fn new(value: Arc<T>, point: Point) -> Self {
        Self { value, point }
    }
}

impl<T> Clone for Dependency<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            point: self.point,
        }
    }
}

/// Everything the cache knows about one tile. `drawn` is monotonic: once a
/// tile committed its draw list it stays authoritative.
#[derive(Debug, Default)]
pub struct DependencyOnTile {
    pub drawn: bool,
    pub labels: Vec<Dependency<DependencyText>>,
    pub symbols: Vec<Dependency<DependencySymbol>>,
}

/// Registry of per-tile dependencies for one render session.
///
/// Single-threaded per instance; sharing across renderers requires an
/// external mutex around the whole enter-tile-to-mark-drawn sequence.
#[derive(Debug, Default)]
pub struct DependencyCache {
    dependency_table: HashMap<Tile, DependencyOnTile>,
    current_tile: Option<Tile>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tile the following operations work on, creating its entry
    /// when absent. Calling this twice for the same tile is a no-op.
    pub fn generate_tile_and_dependency_on_tile(&mut self, tile: &Tile) {
        self.current_tile = Some(*tile);
        self.dependency_table.entry(*tile).or_default();
    }

    pub fn is_drawn(&self, tile: &Tile) -> bool {
        self.drawn(tile)
    }

    pub fn dependency_on_tile(&self, tile: &Tile) -> Option<&DependencyOnTile> {
        self.dependency_table.get(tile)
    }

    /// Drops the whole table, ending the render session.
    pub fn clear(&mut self) {
        self.dependency_table.clear();
        self.current_tile = None;
    }

    /// Drops symbols that reach into an already drawn neighbour tile.
    pub fn remove_symbols_from_drawn_areas(&mut self, symbols: &mut Vec<SymbolContainer>) {
        let Some(current) = self.current_tile else {
            return;
        };
        let tile_size = TILE_SIZE as f32;
        let up = self.drawn(&current.above());
        let down = self.drawn(&current.below());
        let left = self.drawn(&current.left());
        let right = self.drawn(&current.right());

        symbols.retain(|symbol| {
            !(up && symbol.y < 0.0
                || down && symbol.y + symbol.symbol.height() > tile_size
                || left && symbol.x < 0.0
                || right && symbol.x + symbol.symbol.width() > tile_size)
        });
    }

    /// Drops area labels that reach into an already drawn neighbour tile.
    pub fn remove_area_labels_in_already_drawn_areas(
        &mut self,
        area_labels: &mut Vec<PointTextContainer>,
    ) {
        let Some(current) = self.current_tile else {
            return;
        };
        let tile_size = TILE_SIZE as f32;
        let up = self.drawn(&current.above());
        let down = self.drawn(&current.below());
        let left = self.drawn(&current.left());
        let right = self.drawn(&current.right());

        area_labels.retain(|label| {
            !(up && label.y - label.boundary.height() < 0.0
                || down && label.y > tile_size
                || left && label.x < 0.0
                || right && label.x + label.boundary.width() > tile_size)
        });
    }

    /// Clears candidate positions that would collide with drawn neighbours
    /// or with items already registered on the current tile.
    pub fn remove_reference_points_from_dependency_cache(
        &self,
        reference_positions: &mut [Option<ReferencePosition>],
    ) {
        let Some(current) = self.current_tile else {
            return;
        };
        let tile_size = TILE_SIZE as f32;
        let up = self.drawn(&current.above());
        let down = self.drawn(&current.below());
        let left = self.drawn(&current.left());
        let right = self.drawn(&current.right());

        for slot in reference_positions.iter_mut() {
            let Some(reference) = slot else {
                continue;
            };
            let crosses_drawn = up && reference.y - reference.height < 0.0
                || down && reference.y >= tile_size
                || left && reference.x < 0.0
                || right && reference.x + reference.width > tile_size;
            if crosses_drawn {
                *slot = None;
            }
        }

        let Some(entry) = self.dependency_table.get(&current) else {
            return;
        };

        for dependency in &entry.labels {
            let blocked = Self::label_rect(dependency).inflate(CACHE_DISTANCE);
            for slot in reference_positions.iter_mut() {
                if let Some(reference) = slot {
                    if Self::reference_rect(reference).intersects(&blocked) {
                        *slot = None;
                    }
                }
            }
        }

        for dependency in &entry.symbols {
            let blocked = Self::symbol_rect(dependency);
            for slot in reference_positions.iter_mut() {
                if let Some(reference) = slot {
                    if Self::reference_rect(reference).intersects(&blocked) {
                        *slot = None;
                    }
                }
            }
        }
    }

    /// Removes candidates that duplicate or overlap items the current tile
    /// already carries from earlier neighbour renders. Labels match by
    /// (text, paints) identity, symbols by rectangle intersection.
    pub fn remove_overlapping_objects_with_dependency_on_tile(
        &self,
        labels: &mut Vec<PointTextContainer>,
        area_labels: &mut Vec<PointTextContainer>,
        symbols: &mut Vec<SymbolContainer>,
    ) {
        let Some(current) = self.current_tile else {
            return;
        };
        let Some(entry) = self.dependency_table.get(&current) else {
            return;
        };

        if !entry.labels.is_empty() {
            labels.retain(|label| {
                !entry.labels.iter().any(|dependency| {
                    dependency.value.text == label.text
                        && dependency.value.paint_front == label.paint_front
                        && dependency.value.paint_back == label.paint_back
                })
            });

            symbols.retain(|symbol| {
                let rect = symbol.pixel_boundary();
                !entry
                    .labels
                    .iter()
                    .any(|dependency| Self::label_rect(dependency).intersects(&rect))
            });

            area_labels.retain(|label| {
                let rect = label.pixel_boundary();
                !entry
                    .labels
                    .iter()
                    .any(|dependency| Self::label_rect(dependency).intersects(&rect))
            });
        }

        if !entry.symbols.is_empty() {
            symbols.retain(|symbol| {
                let rect = symbol.pixel_boundary();
                !entry.symbols.iter().any(|dependency| {
                    Self::symbol_rect(dependency)
                        .inflate(CACHE_DISTANCE)
                        .intersects(&rect)
                })
            });

            area_labels.retain(|label| {
                let rect = label.pixel_boundary();
                !entry
                    .symbols
                    .iter()
                    .any(|dependency| Self::symbol_rect(dependency).intersects(&rect))
            });
        }
    }

    /// Registers every border-crossing item with the current tile and the
    /// affected neighbours, replays already registered items into the draw
    /// lists, and marks the tile drawn.
    pub fn fill_dependency_on_tile(
        &mut self,
        labels: &mut Vec<PointTextContainer>,
        symbols: &mut Vec<SymbolContainer>,
        area_labels: &mut Vec<PointTextContainer>,
    ) {
        let Some(current) = self.current_tile else {
            return;
        };
        self.dependency_table.entry(current).or_default().drawn = true;

        if !labels.is_empty() || !symbols.is_empty() || !area_labels.is_empty() {
            for neighbour in current.neighbours() {
                self.dependency_table.entry(neighbour).or_default();
            }
            self.fill_dependency_labels(current, labels);
            self.fill_dependency_labels(current, area_labels);
            self.fill_dependency_symbols(current, symbols);
        }

        if let Some(entry) = self.dependency_table.get(&current) {
            for dependency in &entry.labels {
                labels.push(PointTextContainer {
                    text: dependency.value.text.clone(),
                    x: dependency.point.x,
                    y: dependency.point.y,
                    paint_front: dependency.value.paint_front.clone(),
                    paint_back: dependency.value.paint_back.clone(),
                    boundary: dependency.value.boundary,
                    symbol: None,
                });
            }
            for dependency in &entry.symbols {
                symbols.push(SymbolContainer::new(
                    dependency.value.symbol.clone(),
                    dependency.point.x,
                    dependency.point.y,
                ));
            }
        }
    }

    fn drawn(&self, tile: &Tile) -> bool {
        self.dependency_table
            .get(tile)
            .map_or(false, |entry| entry.drawn)
    }

    fn register_label(&mut self, tile: Tile, value: &Arc<DependencyText>, point: Point) {
        self.dependency_table
            .entry(tile)
            .or_default()
            .labels
            .push(Dependency::new(value.clone(), point));
    }

    fn register_symbol(&mut self, tile: Tile, value: &Arc<DependencySymbol>, point: Point) {
        self.dependency_table
            .entry(tile)
            .or_default()
            .symbols
            .push(Dependency::new(value.clone(), point));
    }

    /// Creates the shared text on first use and registers it with the
    /// current tile at the label's own position.
    fn shared_text(
        &mut self,
        slot: &mut Option<Arc<DependencyText>>,
        label: &PointTextContainer,
        current: Tile,
    ) -> Arc<DependencyText> {
        if let Some(existing) = slot {
            return existing.clone();
        }
        let created = Arc::new(DependencyText::new(label, current));
        self.register_label(current, &created, Point::new(label.x, label.y));
        *slot = Some(created.clone());
        created
    }

    fn shared_symbol(
        &mut self,
        slot: &mut Option<Arc<DependencySymbol>>,
        symbol: &SymbolContainer,
        current: Tile,
    ) -> Arc<DependencySymbol> {
        if let Some(existing) = slot {
            return existing.clone();
        }
        let created = Arc::new(DependencySymbol::new(symbol, current));
        self.register_symbol(current, &created, Point::new(symbol.x, symbol.y));
        *slot = Some(created.clone());
        created
    }

    fn fill_dependency_labels(&mut self, current: Tile, labels: &[PointTextContainer]) {
        let tile_size = TILE_SIZE as f32;

        for label in labels {
            let width = label.boundary.width();
            let height = label.boundary.height();
            let mut slot: Option<Arc<DependencyText>> = None;

            if label.y - height < 0.0 && !self.drawn(&current.above()) {
                let text = self.shared_text(&mut slot, label, current);
                self.register_label(
                    current.above(),
                    &text,
                    Point::new(label.x, label.y + tile_size),
                );
                text.add_tile(current.above());

                if label.x < 0.0 && !self.drawn(&current.above_left()) {
                    self.register_label(
                        current.above_left(),
                        &text,
                        Point::new(label.x + tile_size, label.y + tile_size),
                    );
                    text.add_tile(current.above_left());
                }
                if label.x + width > tile_size && !self.drawn(&current.above_right()) {
                    self.register_label(
                        current.above_right(),
                        &text,
                        Point::new(label.x - tile_size, label.y + tile_size),
                    );
                    text.add_tile(current.above_right());
                }
            }

            if label.y > tile_size && !self.drawn(&current.below()) {
                let text = self.shared_text(&mut slot, label, current);
                self.register_label(
                    current.below(),
                    &text,
                    Point::new(label.x, label.y - tile_size),
                );
                text.add_tile(current.below());

                if label.x < 0.0 && !self.drawn(&current.below_left()) {
                    self.register_label(
                        current.below_left(),
                        &text,
                        Point::new(label.x + tile_size, label.y - tile_size),
                    );
                    text.add_tile(current.below_left());
                }
                if label.x + width > tile_size && !self.drawn(&current.below_right()) {
                    self.register_label(
                        current.below_right(),
                        &text,
                        Point::new(label.x - tile_size, label.y - tile_size),
                    );
                    text.add_tile(current.below_right());
                }
            }

            if label.x < 0.0 && !self.drawn(&current.left()) {
                let text = self.shared_text(&mut slot, label, current);
                self.register_label(
                    current.left(),
                    &text,
                    Point::new(label.x + tile_size, label.y),
                );
                text.add_tile(current.left());
            }

            if label.x + width > tile_size && !self.drawn(&current.right()) {
                let text = self.shared_text(&mut slot, label, current);
                self.register_label(
                    current.right(),
                    &text,
                    Point::new(label.x - tile_size, label.y),
                );
                text.add_tile(current.right());
            }

            // The text itself stays inside the tile, but its symbol may
            // still cross a border.
            if slot.is_none() {
                if let Some(symbol) = label.symbol.clone() {
                    self.fill_symbol_attached_label(current, label, &symbol, &mut slot);
                }
            }
        }
    }

    fn fill_symbol_attached_label(
        &mut self,
        current: Tile,
        label: &PointTextContainer,
        symbol: &SymbolContainer,
        slot: &mut Option<Arc<DependencyText>>,
    ) {
        let tile_size = TILE_SIZE as f32;
        let symbol_width = symbol.symbol.width();
        let symbol_height = symbol.symbol.height();

        if symbol.y <= 0.0 && !self.drawn(&current.above()) {
            let text = self.shared_text(slot, label, current);
            self.register_label(
                current.above(),
                &text,
                Point::new(label.x, label.y + tile_size),
            );
            text.add_tile(current.above());

            if symbol.x < 0.0 && !self.drawn(&current.above_left()) {
                self.register_label(
                    current.above_left(),
                    &text,
                    Point::new(label.x + tile_size, label.y + tile_size),
                );
                text.add_tile(current.above_left());
            }
            if symbol.x + symbol_width > tile_size && !self.drawn(&current.above_right()) {
                self.register_label(
                    current.above_right(),
                    &text,
                    Point::new(label.x - tile_size, label.y + tile_size),
                );
                text.add_tile(current.above_right());
            }
        }

        if symbol.y + symbol_height >= tile_size && !self.drawn(&current.below()) {
            let text = self.shared_text(slot, label, current);
            self.register_label(
                current.below(),
                &text,
                Point::new(label.x, label.y - tile_size),
            );
            // The propagated-tile list records the up tile here; the list is
            // write-only bookkeeping and renderers never read it back.
            text.add_tile(current.above());

            if symbol.x < 0.0 && !self.drawn(&current.below_left()) {
                self.register_label(
                    current.below_left(),
                    &text,
                    Point::new(label.x + tile_size, label.y - tile_size),
                );
                text.add_tile(current.below_left());
            }
            if symbol.x + symbol_width > tile_size && !self.drawn(&current.below_right()) {
                self.register_label(
                    current.below_right(),
                    &text,
                    Point::new(label.x - tile_size, label.y - tile_size),
                );
                text.add_tile(current.below_right());
            }
        }

        if symbol.x <= 0.0 && !self.drawn(&current.left()) {
            let text = self.shared_text(slot, label, current);
            self.register_label(
                current.left(),
                &text,
                Point::new(label.x + tile_size, label.y),
            );
            text.add_tile(current.left());
        }

        if symbol.x + symbol_width >= tile_size && !self.drawn(&current.right()) {
            let text = self.shared_text(slot, label, current);
            self.register_label(
                current.right(),
                &text,
                Point::new(label.x - tile_size, label.y),
            );
            text.add_tile(current.right());
        }
    }

    fn fill_dependency_symbols(&mut self, current: Tile, symbols: &[SymbolContainer]) {
        let tile_size = TILE_SIZE as f32;

        for symbol in symbols {
            let width = symbol.symbol.width();
            let height = symbol.symbol.height();
            let mut slot: Option<Arc<DependencySymbol>> = None;

            if symbol.y < 0.0 && !self.drawn(&current.above()) {
                let shared = self.shared_symbol(&mut slot, symbol, current);
                self.register_symbol(
                    current.above(),
                    &shared,
                    Point::new(symbol.x, symbol.y + tile_size),
                );
                shared.add_tile(current.above());

                if symbol.x < 0.0 && !self.drawn(&current.above_left()) {
                    self.register_symbol(
                        current.above_left(),
                        &shared,
                        Point::new(symbol.x + tile_size, symbol.y + tile_size),
                    );
                    shared.add_tile(current.above_left());
                }
                if symbol.x + width > tile_size && !self.drawn(&current.above_right()) {
                    self.register_symbol(
                        current.above_right(),
                        &shared,
                        Point::new(symbol.x - tile_size, symbol.y + tile_size),
                    );
                    shared.add_tile(current.above_right());
                }
            }

            if symbol.y + height > tile_size && !self.drawn(&current.below()) {
                let shared = self.shared_symbol(&mut slot, symbol, current);
                self.register_symbol(
                    current.below(),
                    &shared,
                    Point::new(symbol.x, symbol.y - tile_size),
                );
                shared.add_tile(current.below());

                if symbol.x < 0.0 && !self.drawn(&current.below_left()) {
                    self.register_symbol(
                        current.below_left(),
                        &shared,
                        Point::new(symbol.x + tile_size, symbol.y - tile_size),
                    );
                    shared.add_tile(current.below_left());
                }
                if symbol.x + width > tile_size && !self.drawn(&current.below_right()) {
                    self.register_symbol(
                        current.below_right(),
                        &shared,
                        Point::new(symbol.x - tile_size, symbol.y - tile_size),
                    );
                    shared.add_tile(current.below_right());
                }
            }

            if symbol.x < 0.0 && !self.drawn(&current.left()) {
                let shared = self.shared_symbol(&mut slot, symbol, current);
                self.register_symbol(
                    current.left(),
                    &shared,
                    Point::new(symbol.x + tile_size, symbol.y),
                );
                shared.add_tile(current.left());
            }

            if symbol.x + width > tile_size && !self.drawn(&current.right()) {
                let shared = self.shared_symbol(&mut slot, symbol, current);
                self.register_symbol(
                    current.right(),
                    &shared,
                    Point::new(symbol.x - tile_size, symbol.y),
                );
                shared.add_tile(current.right());
            }
        }
    }

    fn label_rect(dependency: &Dependency<DependencyText>) -> Rectangle {
        Rectangle::new(
            dependency.point.x,
            dependency.point.y - dependency.value.boundary.height(),
            dependency.point.x + dependency.value.boundary.width(),
            dependency.point.y,
        )
    }

    fn symbol_rect(dependency: &Dependency<DependencySymbol>) -> Rectangle {
        Rectangle::new(
            dependency.point.x,
            dependency.point.y,
            dependency.point.x + dependency.value.symbol.width(),
            dependency.point.y + dependency.value.symbol.height(),
        )
    }

    fn reference_rect(reference: &ReferencePosition) -> Rectangle {
        Rectangle::new(
            reference.x,
            reference.y - reference.height,
            reference.x + reference.width,
            reference.y,
        )
    }
}
