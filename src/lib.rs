//! Reader for the mapsforge binary map format (version 3) plus the per-tile
//! label placement engine with its cross-tile dependency cache.
//!
//! [`MapFile`] opens and validates a map file and decodes POI and way
//! records per tile; [`LabelPlacement`] turns label and symbol candidates
//! into a non-overlapping draw list while [`DependencyCache`] keeps labels
//! spanning tile borders consistent across neighbouring tiles.

mod container;
mod dependency_cache;
mod errors;
mod graphics;
mod header;
mod index_cache;
mod label_placement;
mod map_data;
mod map_file;
mod mercator;
mod optional_field;
mod query_calculations;
mod query_parameters;
mod reader;
mod required_field;
mod tile;
mod types;

pub use container::{PointTextContainer, SymbolContainer};
pub use dependency_cache::{
    Dependency, DependencyCache, DependencyOnTile, DependencySymbol, DependencyText,
};
pub use errors::MapFileError;
pub use graphics::{Bitmap, Paint, Point, Rectangle};
pub use header::{MapFileHeader, MapFileInfo, SubFileParameter};
pub use label_placement::{LabelPlacement, PlacementModel, ReferencePosition, TileLabels};
pub use map_data::{MapReadResult, PointOfInterest, Way};
pub use map_file::{MapFile, Selector};
pub use mercator::MercatorProjection;
pub use query_parameters::QueryParameters;
pub use reader::ReadBuffer;
pub use tile::{Tile, TILE_SIZE};
pub use types::{BoundingBox, GeoPoint, LatLong, LatLongUtils, Tag};
