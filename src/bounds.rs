//! Lat/lon rectangle used for spatial lookups

/// Axis-aligned bounding box in degrees.
///
/// Edges are inclusive. A box with `south > north` or `west > east`
/// contains nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self { south, west, north, east }
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    /// True when no point can fall inside (inverted or NaN edges)
    pub fn is_empty(&self) -> bool {
        !(self.south <= self.north && self.west <= self.east)
    }

    /// Same predicate the store's range query applies
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.south
            && latitude <= self.north
            && longitude >= self.west
            && longitude <= self.east
    }
}
