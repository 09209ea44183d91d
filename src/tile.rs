use crate::mercator::MercatorProjection;
use crate::types::BoundingBox;

/// Edge length of a rendered tile in pixels.
pub const TILE_SIZE: i32 = 256;

/// Cell of the Mercator tile pyramid. Identity is the full triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub tile_x: i64,
    pub tile_y: i64,
    pub zoom_level: u8,
}

impl Tile {
    pub fn new(tile_x: i64, tile_y: i64, zoom_level: u8) -> Self {
        Self {
            tile_x,
            tile_y,
            zoom_level,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        Self::bounding_box_range(self, self)
    }

    /// Geographic extent of the rectangle of tiles between `upper_left` and
    /// `lower_right` (inclusive), both at the same zoom level.
    pub fn bounding_box_range(upper_left: &Tile, lower_right: &Tile) -> BoundingBox {
        let zoom_level = upper_left.zoom_level;
        BoundingBox::from_degrees(
            MercatorProjection::tile_y_to_latitude(lower_right.tile_y + 1, zoom_level),
            MercatorProjection::tile_x_to_longitude(upper_left.tile_x, zoom_level),
            MercatorProjection::tile_y_to_latitude(upper_left.tile_y, zoom_level),
            MercatorProjection::tile_x_to_longitude(lower_right.tile_x + 1, zoom_level),
        )
    }

    pub fn left(&self) -> Tile {
        Tile::new(self.tile_x - 1, self.tile_y, self.zoom_level)
    }

    pub fn right(&self) -> Tile {
        Tile::new(self.tile_x + 1, self.tile_y, self.zoom_level)
    }

    pub fn above(&self) -> Tile {
        Tile::new(self.tile_x, self.tile_y - 1, self.zoom_level)
    }

    pub fn below(&self) -> Tile {
        Tile::new(self.tile_x, self.tile_y + 1, self.zoom_level)
    }

    pub fn above_left(&self) -> Tile {
        Tile::new(self.tile_x - 1, self.tile_y - 1, self.zoom_level)
    }

    pub fn above_right(&self) -> Tile {
        Tile::new(self.tile_x + 1, self.tile_y - 1, self.zoom_level)
    }

    pub fn below_left(&self) -> Tile {
        Tile::new(self.tile_x - 1, self.tile_y + 1, self.zoom_level)
    }

    pub fn below_right(&self) -> Tile {
        Tile::new(self.tile_x + 1, self.tile_y + 1, self.zoom_level)
    }

    /// The eight unit-offset neighbours.
    pub fn neighbours(&self) -> [Tile; 8] {
        [
            self.left(),
            self.right(),
            self.above(),
            self.below(),
            self.above_left(),
            self.above_right(),
            self.below_left(),
            self.below_right(),
        ]
    }
}
