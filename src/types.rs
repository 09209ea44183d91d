use crate::MapFileError;

/// Latitude/longitude pair in microdegrees, as stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeoPoint {
    pub latitude_e6: i32,
    pub longitude_e6: i32,
}

impl GeoPoint {
    pub fn new(latitude_e6: i32, longitude_e6: i32) -> Self {
        Self {
            latitude_e6,
            longitude_e6,
        }
    }

    pub fn to_lat_long(self) -> LatLong {
        LatLong::new(
            LatLongUtils::microdegrees_to_degrees(self.latitude_e6),
            LatLongUtils::microdegrees_to_degrees(self.longitude_e6),
        )
    }
}

/// Latitude/longitude pair in degrees, used for decoded geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLong {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLong {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Geographic rectangle in microdegrees with `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_latitude_e6: i32,
    pub min_longitude_e6: i32,
    pub max_latitude_e6: i32,
    pub max_longitude_e6: i32,
}

impl BoundingBox {
    pub fn new(
        min_latitude_e6: i32,
        min_longitude_e6: i32,
        max_latitude_e6: i32,
        max_longitude_e6: i32,
    ) -> Result<Self, MapFileError> {
        let valid = LatLongUtils::valid_latitude_e6(min_latitude_e6)
            && LatLongUtils::valid_latitude_e6(max_latitude_e6)
            && LatLongUtils::valid_longitude_e6(min_longitude_e6)
            && LatLongUtils::valid_longitude_e6(max_longitude_e6)
            && min_latitude_e6 <= max_latitude_e6
            && min_longitude_e6 <= max_longitude_e6;
        if !valid {
            return Err(MapFileError::InvalidBoundingBox(format!(
                "minLat={}, minLon={}, maxLat={}, maxLon={}",
                min_latitude_e6, min_longitude_e6, max_latitude_e6, max_longitude_e6
            )));
        }
        Ok(Self {
            min_latitude_e6,
            min_longitude_e6,
            max_latitude_e6,
            max_longitude_e6,
        })
    }

    pub fn from_degrees(
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Self {
        Self {
            min_latitude_e6: LatLongUtils::degrees_to_microdegrees(min_latitude),
            min_longitude_e6: LatLongUtils::degrees_to_microdegrees(min_longitude),
            max_latitude_e6: LatLongUtils::degrees_to_microdegrees(max_latitude),
            max_longitude_e6: LatLongUtils::degrees_to_microdegrees(max_longitude),
        }
    }

    pub fn min_latitude(&self) -> f64 {
        LatLongUtils::microdegrees_to_degrees(self.min_latitude_e6)
    }

    pub fn min_longitude(&self) -> f64 {
        LatLongUtils::microdegrees_to_degrees(self.min_longitude_e6)
    }

    pub fn max_latitude(&self) -> f64 {
        LatLongUtils::microdegrees_to_degrees(self.max_latitude_e6)
    }

    pub fn max_longitude(&self) -> f64 {
        LatLongUtils::microdegrees_to_degrees(self.max_longitude_e6)
    }

    pub fn center_point(&self) -> LatLong {
        LatLong::new(
            (self.min_latitude() + self.max_latitude()) / 2.0,
            (self.min_longitude() + self.max_longitude()) / 2.0,
        )
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude()
            && latitude <= self.max_latitude()
            && longitude >= self.min_longitude()
            && longitude <= self.max_longitude()
    }

    /// Grows the box on all sides by a rough metre-to-degree conversion.
    pub fn extend_meters(&self, meters: i32) -> BoundingBox {
        let delta_e6 =
            (f64::from(meters) / 111_000.0 * LatLongUtils::CONVERSION_FACTOR).round() as i32;
        BoundingBox {
            min_latitude_e6: self.min_latitude_e6.saturating_sub(delta_e6),
            min_longitude_e6: self.min_longitude_e6.saturating_sub(delta_e6),
            max_latitude_e6: self.max_latitude_e6.saturating_add(delta_e6),
            max_longitude_e6: self.max_longitude_e6.saturating_add(delta_e6),
        }
    }
}

/// Key=value pair from the header tag vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub const KEY_VALUE_SEPARATOR: char = '=';

    pub fn new(key: String, value: String) -> Self {
        Self { key, value }
    }

    /// Splits a `key=value` vocabulary entry; a missing separator leaves the
    /// value empty.
    pub fn from_string(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        match tag.split_once(Self::KEY_VALUE_SEPARATOR) {
            Some((key, value)) => Self::new(key.to_string(), value.to_string()),
            None => Self::new(tag, String::new()),
        }
    }
}

pub struct LatLongUtils;

impl LatLongUtils {
    pub const LONGITUDE_MAX: f64 = 180.0;
    pub const LONGITUDE_MIN: f64 = -180.0;
    pub const CONVERSION_FACTOR: f64 = 1_000_000.0;

    const LATITUDE_MAX_E6: i32 = 90_000_000;
    const LONGITUDE_MAX_E6: i32 = 180_000_000;

    pub fn microdegrees_to_degrees(microdegrees: i32) -> f64 {
        f64::from(microdegrees) / Self::CONVERSION_FACTOR
    }

    pub fn degrees_to_microdegrees(degrees: f64) -> i32 {
        (degrees * Self::CONVERSION_FACTOR).round() as i32
    }

    fn valid_latitude_e6(latitude_e6: i32) -> bool {
        (-Self::LATITUDE_MAX_E6..=Self::LATITUDE_MAX_E6).contains(&latitude_e6)
    }

    fn valid_longitude_e6(longitude_e6: i32) -> bool {
        (-Self::LONGITUDE_MAX_E6..=Self::LONGITUDE_MAX_E6).contains(&longitude_e6)
    }
}
