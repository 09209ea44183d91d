use crate::types::{LatLong, Tag};

/// Point of interest decoded from a tile block.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub layer: i8,
    pub tags: Vec<Tag>,
    pub position: LatLong,
}

impl PointOfInterest {
    pub fn new(layer: i8, tags: Vec<Tag>, position: LatLong) -> Self {
        Self {
            layer,
            tags,
            position,
        }
    }
}

/// Way decoded from a tile block: one or more polyline/polygon rings.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub layer: i8,
    pub tags: Vec<Tag>,
    pub way_nodes: Vec<Vec<LatLong>>,
    pub label_position: Option<LatLong>,
}

impl Way {
    pub fn new(
        layer: i8,
        tags: Vec<Tag>,
        way_nodes: Vec<Vec<LatLong>>,
        label_position: Option<LatLong>,
    ) -> Self {
        Self {
            layer,
            tags,
            way_nodes,
            label_position,
        }
    }
}

/// Everything a tile query produced. `is_water` is set when every queried
/// block carries the water flag in its index entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapReadResult {
    pub pois: Vec<PointOfInterest>,
    pub ways: Vec<Way>,
    pub is_water: bool,
}

impl MapReadResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, pois: Vec<PointOfInterest>, ways: Vec<Way>) {
        self.pois.extend(pois);
        self.ways.extend(ways);
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty() && self.ways.is_empty()
    }
}
