use std::sync::Arc;

use mapsforge::{
    Bitmap, DependencyCache, LabelPlacement, Paint, PointTextContainer, ReferencePosition,
    SymbolContainer, Tile,
};

fn paint() -> Paint {
    Paint::new(20.0, 0.0, 0xff00_0000)
}

/// "Rome" with a 20px paint measures 40x20.
fn rome_label(x: f32, y: f32) -> PointTextContainer {
    PointTextContainer::new("Rome", x, y, paint(), None)
}

fn symbol(width: i32, height: i32, x: f32, y: f32) -> SymbolContainer {
    SymbolContainer::new(Arc::new(Bitmap::new(width, height)), x, y)
}

#[test]
fn right_edge_label_registers_in_right_neighbour() {
    let mut cache = DependencyCache::new();
    let tile = Tile::new(0, 0, 8);
    cache.generate_tile_and_dependency_on_tile(&tile);

    let mut labels = vec![rome_label(255.0, 100.0)];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());

    let neighbour = cache
        .dependency_on_tile(&Tile::new(1, 0, 8))
        .expect("neighbour entry");
    assert_eq!(neighbour.labels.len(), 1);
    let dependency = &neighbour.labels[0];
    assert_eq!(dependency.point.x, -1.0);
    assert_eq!(dependency.point.y, 100.0);
    assert_eq!(dependency.value.text, "Rome");

    // The committing tile carries the same shared text at the original spot.
    let own = cache.dependency_on_tile(&tile).expect("own entry");
    assert_eq!(own.labels.len(), 1);
    assert_eq!(own.labels[0].point.x, 255.0);
    assert!(Arc::ptr_eq(&own.labels[0].value, &dependency.value));

    // Registered items are replayed into the committed draw list.
    assert_eq!(labels.len(), 2);
    assert!(cache.is_drawn(&tile));
}

#[test]
fn neighbour_render_filters_the_duplicate_by_identity() {
    let mut cache = DependencyCache::new();
    cache.generate_tile_and_dependency_on_tile(&Tile::new(0, 0, 8));
    let mut labels = vec![rome_label(255.0, 100.0)];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());

    cache.generate_tile_and_dependency_on_tile(&Tile::new(1, 0, 8));
    let mut candidates = vec![rome_label(-1.0, 100.0)];
    cache.remove_overlapping_objects_with_dependency_on_tile(
        &mut candidates,
        &mut Vec::new(),
        &mut Vec::new(),
    );
    assert!(candidates.is_empty(), "duplicate must be culled by identity");

    // The committed render still draws the spilled label once.
    let mut draw_list = Vec::new();
    cache.fill_dependency_on_tile(&mut draw_list, &mut Vec::new(), &mut Vec::new());
    assert_eq!(draw_list.len(), 1);
    assert_eq!(draw_list[0].x, -1.0);
    assert_eq!(draw_list[0].y, 100.0);
}

#[test]
fn drawn_neighbour_suppresses_crossing_symbol() {
    let mut cache = DependencyCache::new();

    // Tile (1, 0) commits first.
    cache.generate_tile_and_dependency_on_tile(&Tile::new(1, 0, 8));
    cache.fill_dependency_on_tile(&mut Vec::new(), &mut Vec::new(), &mut Vec::new());
    assert!(cache.is_drawn(&Tile::new(1, 0, 8)));

    cache.generate_tile_and_dependency_on_tile(&Tile::new(0, 0, 8));
    let mut symbols = vec![symbol(20, 20, 250.0, 50.0)];
    cache.remove_symbols_from_drawn_areas(&mut symbols);
    assert!(symbols.is_empty(), "symbol reaching a drawn tile is dropped");

    cache.fill_dependency_on_tile(&mut Vec::new(), &mut symbols, &mut Vec::new());
    let own = cache
        .dependency_on_tile(&Tile::new(0, 0, 8))
        .expect("own entry");
    assert!(own.symbols.is_empty(), "nothing was registered");
    let neighbour = cache
        .dependency_on_tile(&Tile::new(1, 0, 8))
        .expect("neighbour entry");
    assert!(neighbour.symbols.is_empty());
}

#[test]
fn entering_a_tile_twice_is_idempotent() {
    let mut cache = DependencyCache::new();
    cache.generate_tile_and_dependency_on_tile(&Tile::new(0, 0, 8));
    let mut labels = vec![rome_label(255.0, 100.0)];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());

    let neighbour = Tile::new(1, 0, 8);
    cache.generate_tile_and_dependency_on_tile(&neighbour);
    cache.generate_tile_and_dependency_on_tile(&neighbour);

    let entry = cache.dependency_on_tile(&neighbour).expect("entry");
    assert_eq!(entry.labels.len(), 1);
    assert!(!entry.drawn);
}

#[test]
fn spill_into_a_drawn_tile_is_suppressed() {
    let mut cache = DependencyCache::new();

    cache.generate_tile_and_dependency_on_tile(&Tile::new(0, 0, 8));
    let mut labels = vec![rome_label(255.0, 100.0)];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());
    let committed = cache
        .dependency_on_tile(&Tile::new(0, 0, 8))
        .expect("entry")
        .labels
        .len();

    // The later neighbour render must not add anything to the drawn tile.
    cache.generate_tile_and_dependency_on_tile(&Tile::new(1, 0, 8));
    let mut crossing_back = vec![rome_label(-5.0, 100.0)];
    cache.fill_dependency_on_tile(&mut crossing_back, &mut Vec::new(), &mut Vec::new());

    let entry = cache
        .dependency_on_tile(&Tile::new(0, 0, 8))
        .expect("entry");
    assert!(entry.drawn);
    assert_eq!(entry.labels.len(), committed);
}

#[test]
fn corner_label_translates_into_three_neighbours() {
    let mut cache = DependencyCache::new();
    let tile = Tile::new(5, 5, 10);
    cache.generate_tile_and_dependency_on_tile(&tile);

    // Crosses up (y - height < 0) and left (x < 0).
    let mut labels = vec![rome_label(-5.0, 10.0)];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());

    let above = cache.dependency_on_tile(&tile.above()).expect("above");
    assert_eq!(above.labels[0].point.x, -5.0);
    assert_eq!(above.labels[0].point.y, 266.0);

    let above_left = cache
        .dependency_on_tile(&tile.above_left())
        .expect("above left");
    assert_eq!(above_left.labels[0].point.x, 251.0);
    assert_eq!(above_left.labels[0].point.y, 266.0);

    let left = cache.dependency_on_tile(&tile.left()).expect("left");
    assert_eq!(left.labels[0].point.x, 251.0);
    assert_eq!(left.labels[0].point.y, 10.0);

    // One shared text serves all four entries.
    let own = cache.dependency_on_tile(&tile).expect("own");
    assert!(Arc::ptr_eq(&own.labels[0].value, &above.labels[0].value));
    assert!(Arc::ptr_eq(&own.labels[0].value, &left.labels[0].value));
}

#[test]
fn symbol_label_down_spill_records_up_tile() {
    let mut cache = DependencyCache::new();
    let tile = Tile::new(3, 3, 9);
    cache.generate_tile_and_dependency_on_tile(&tile);

    // The text stays inside the tile; its symbol pokes over the bottom edge.
    let mut labels = vec![PointTextContainer::with_symbol(
        "Dock",
        100.0,
        250.0,
        paint(),
        None,
        symbol(20, 20, 95.0, 250.0),
    )];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());

    let below = cache.dependency_on_tile(&tile.below()).expect("below");
    assert_eq!(below.labels.len(), 1);
    assert_eq!(below.labels[0].point.x, 100.0);
    assert_eq!(below.labels[0].point.y, -6.0);

    // Long-standing slip, kept as-is: the propagated-tile list names the up
    // tile even though the dependency sits on the down neighbour. The list
    // is write-only bookkeeping, so draw lists are unaffected.
    assert_eq!(below.labels[0].value.tiles(), vec![tile, tile.above()]);
}

#[test]
fn reference_positions_are_culled_by_drawn_neighbours_and_registered_items() {
    let mut cache = DependencyCache::new();

    // Tile (1, 0) commits a label crossing left into (0, 0).
    cache.generate_tile_and_dependency_on_tile(&Tile::new(1, 0, 8));
    let mut labels = vec![rome_label(-1.0, 100.0)];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());

    cache.generate_tile_and_dependency_on_tile(&Tile::new(0, 0, 8));
    let mut reference_positions = vec![
        // Intersects the registered label at (255, 100) inflated by 2.
        Some(ReferencePosition {
            x: 240.0,
            y: 105.0,
            label_index: 0,
            width: 14.0,
            height: 10.0,
        }),
        // Reaches into the drawn right neighbour.
        Some(ReferencePosition {
            x: 250.0,
            y: 200.0,
            label_index: 1,
            width: 20.0,
            height: 10.0,
        }),
        // Far from everything.
        Some(ReferencePosition {
            x: 10.0,
            y: 20.0,
            label_index: 2,
            width: 20.0,
            height: 10.0,
        }),
    ];

    cache.remove_reference_points_from_dependency_cache(&mut reference_positions);

    assert!(reference_positions[0].is_none());
    assert!(reference_positions[1].is_none());
    assert!(reference_positions[2].is_some());
}

#[test]
fn greedy_placement_falls_back_to_free_candidate_slots() {
    let mut engine = LabelPlacement::new();
    let tile = Tile::new(0, 0, 8);

    let small = Paint::new(10.0, 0.0, 0xff00_0000);
    let symbol_one = symbol(16, 16, 92.0, 92.0);
    let symbol_two = symbol(16, 16, 92.0, 112.0);
    let labels = vec![
        PointTextContainer::with_symbol(
            "Pin",
            100.0,
            100.0,
            small.clone(),
            None,
            symbol_one.clone(),
        ),
        PointTextContainer::with_symbol(
            "Pin",
            100.0,
            120.0,
            small.clone(),
            None,
            symbol_two.clone(),
        ),
    ];
    let symbols = vec![symbol_one, symbol_two];

    let placed = engine.place_labels(labels, symbols, Vec::new(), &tile);

    assert_eq!(placed.labels.len(), 2);
    // First label takes its above-the-symbol slot.
    assert_eq!(placed.labels[0].x, 92.5);
    assert_eq!(placed.labels[0].y, 88.0);
    // The second label's above slot collides with the first symbol and falls
    // through to the below slot.
    assert_eq!(placed.labels[1].x, 92.5);
    assert_eq!(placed.labels[1].y, 142.0);

    assert_eq!(placed.symbols.len(), 2);
}

#[test]
fn engine_drops_out_of_tile_and_overlapping_symbols() {
    let mut engine = LabelPlacement::new();
    let tile = Tile::new(0, 0, 8);

    let symbols = vec![
        symbol(16, 16, 100.0, 100.0),
        // Overlaps the first symbol within the 2px margin.
        symbol(16, 16, 110.0, 104.0),
        // Entirely outside the tile.
        symbol(16, 16, 300.0, 300.0),
    ];

    let placed = engine.place_labels(Vec::new(), symbols, Vec::new(), &tile);
    assert_eq!(placed.symbols.len(), 1);
    assert_eq!(placed.symbols[0].x, 100.0);
}

#[test]
fn engine_renders_adjacent_tiles_without_duplicates() {
    let mut engine = LabelPlacement::new();
    let paint = Paint::new(20.0, 0.0, 0xff00_0000);

    // "Harbour" measures 70x20; centred on x=250 it spans past the right
    // tile edge after placement.
    let tile_a = Tile::new(0, 0, 8);
    let result_a = engine.place_labels(
        vec![PointTextContainer::new(
            "Harbour",
            250.0,
            100.0,
            paint.clone(),
            None,
        )],
        Vec::new(),
        Vec::new(),
        &tile_a,
    );

    let placed_x = 250.0 - 35.0;
    assert!(result_a
        .labels
        .iter()
        .any(|label| label.x == placed_x && label.y == 100.0));
    assert!(engine.dependency_cache().is_drawn(&tile_a));

    // The same feature seen from the right neighbour: local coordinates are
    // shifted by one tile width.
    let tile_b = Tile::new(1, 0, 8);
    let result_b = engine.place_labels(
        vec![PointTextContainer::new(
            "Harbour",
            -6.0,
            100.0,
            paint.clone(),
            None,
        )],
        Vec::new(),
        Vec::new(),
        &tile_b,
    );

    assert_eq!(result_b.labels.len(), 1, "duplicate was culled, spill replayed");
    assert_eq!(result_b.labels[0].x, placed_x - 256.0);
    assert_eq!(result_b.labels[0].y, 100.0);
}

#[test]
fn two_point_model_only_offers_vertical_slots() {
    let mut engine = LabelPlacement::with_placement_model(mapsforge::PlacementModel::TwoPoint);
    let tile = Tile::new(0, 0, 8);

    let small = Paint::new(10.0, 0.0, 0xff00_0000);
    let marker = symbol(16, 16, 92.0, 92.0);
    let labels = vec![PointTextContainer::with_symbol(
        "Pin",
        100.0,
        100.0,
        small,
        None,
        marker.clone(),
    )];

    let placed = engine.place_labels(labels, vec![marker], Vec::new(), &tile);
    assert_eq!(placed.labels.len(), 1);
    // Above-the-symbol slot: centred, half the symbol plus the 4px start
    // distance over the anchor.
    assert_eq!(placed.labels[0].x, 92.5);
    assert_eq!(placed.labels[0].y, 88.0);
}

#[test]
fn clearing_the_cache_ends_the_session() {
    let mut cache = DependencyCache::new();
    cache.generate_tile_and_dependency_on_tile(&Tile::new(0, 0, 8));
    let mut labels = vec![rome_label(255.0, 100.0)];
    cache.fill_dependency_on_tile(&mut labels, &mut Vec::new(), &mut Vec::new());
    assert!(cache.is_drawn(&Tile::new(0, 0, 8)));

    cache.clear();
    assert!(!cache.is_drawn(&Tile::new(0, 0, 8)));
    assert!(cache.dependency_on_tile(&Tile::new(1, 0, 8)).is_none());
}

#[test]
fn area_labels_are_centred_and_deduplicated() {
    let mut engine = LabelPlacement::new();
    let tile = Tile::new(0, 0, 8);

    let paint = Paint::new(10.0, 0.0, 0xff00_0000);
    let area_labels = vec![
        PointTextContainer::new("Park", 100.0, 100.0, paint.clone(), None),
        // After centring this one overlaps the first and is dropped.
        PointTextContainer::new("Park", 104.0, 102.0, paint.clone(), None),
        PointTextContainer::new("Lake", 200.0, 200.0, paint.clone(), None),
    ];

    let placed = engine.place_labels(Vec::new(), Vec::new(), area_labels, &tile);
    assert_eq!(placed.area_labels.len(), 2);
    // "Park" is 20 wide: centred from 100 to 90.
    assert_eq!(placed.area_labels[0].x, 90.0);
    assert_eq!(placed.area_labels[1].x, 190.0);
}
