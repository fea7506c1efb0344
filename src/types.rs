//! Geographic value types used throughout the crate.
//!
//! Both types validate their coordinates on construction and are plain
//! immutable values: cheap to copy, comparable by their components, and
//! serializable with Serde. Conversions to and from the `geo` crate's
//! primitives are provided so callers already working with `geo` geometries
//! can move values across without manual unpacking.

use crate::error::{GeocellError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

fn validate_lat(lat: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeocellError::InvalidCoordinate(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }
    Ok(())
}

fn validate_lon(lon: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeocellError::InvalidCoordinate(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lon
        )));
    }
    Ok(())
}

/// A geographic point as an immutable (latitude, longitude) pair.
///
/// # Examples
///
/// ```rust
/// use geocell::Point;
///
/// let nyc = Point::new(40.7128, -74.0060)?;
/// assert_eq!(nyc.lat(), 40.7128);
/// assert_eq!(nyc.lon(), -74.0060);
///
/// // Out-of-range coordinates are rejected
/// assert!(Point::new(95.0, -74.0).is_err());
/// # Ok::<(), geocell::GeocellError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    lat: f64,
    lon: f64,
}

impl Point {
    /// Create a point from a latitude/longitude pair.
    ///
    /// # Errors
    ///
    /// Returns [`GeocellError::InvalidCoordinate`] when the latitude is
    /// outside `[-90, 90]` or the longitude outside `[-180, 180]`.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        validate_lat(lat)?;
        validate_lon(lon)?;
        Ok(Self { lat, lon })
    }

    /// Construct without range checks. Callers must guarantee validity.
    pub(crate) const fn new_unchecked(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(p: Point) -> Self {
        geo::Point::new(p.lon, p.lat)
    }
}

impl TryFrom<geo::Point<f64>> for Point {
    type Error = GeocellError;

    /// Converts an x/y (lon/lat) `geo` point, re-validating the ranges.
    fn try_from(p: geo::Point<f64>) -> Result<Self> {
        Point::new(p.y(), p.x())
    }
}

/// An axis-aligned geographic rectangle.
///
/// Defined by its northern and southern latitudes and its eastern and
/// western longitudes. Construction swaps the latitudes when given in the
/// wrong order; the longitudes are kept as supplied, so a box whose east
/// lies numerically west of its west edge can describe a band crossing the
/// antimeridian (the query layer does not currently exploit this).
///
/// # Examples
///
/// ```rust
/// use geocell::BoundingBox;
///
/// // Manhattan, roughly
/// let bbox = BoundingBox::new(40.80, -73.93, 40.70, -74.02)?;
/// assert_eq!(bbox.north(), 40.80);
/// assert_eq!(bbox.west(), -74.02);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    north: f64,
    east: f64,
    south: f64,
    west: f64,
}

impl BoundingBox {
    /// Create a bounding box from its four edges.
    ///
    /// The two latitudes are reordered so that `south <= north` always
    /// holds afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`GeocellError::InvalidCoordinate`] when any edge is outside
    /// the valid latitude or longitude range.
    pub fn new(north: f64, east: f64, south: f64, west: f64) -> Result<Self> {
        validate_lat(north)?;
        validate_lat(south)?;
        validate_lon(east)?;
        validate_lon(west)?;

        let (south, north) = if south > north {
            (north, south)
        } else {
            (south, north)
        };

        Ok(Self {
            north,
            east,
            south,
            west,
        })
    }

    /// Construct without checks. Callers must guarantee both the ranges
    /// and `south <= north`.
    pub(crate) const fn new_unchecked(north: f64, east: f64, south: f64, west: f64) -> Self {
        Self {
            north,
            east,
            south,
            west,
        }
    }

    /// Northern latitude.
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Eastern longitude.
    pub fn east(&self) -> f64 {
        self.east
    }

    /// Southern latitude.
    pub fn south(&self) -> f64 {
        self.south
    }

    /// Western longitude.
    pub fn west(&self) -> f64 {
        self.west
    }

    /// The north-east corner.
    pub fn north_east(&self) -> Point {
        Point::new_unchecked(self.north, self.east)
    }

    /// The south-west corner.
    pub fn south_west(&self) -> Point {
        Point::new_unchecked(self.south, self.west)
    }

    /// Move the northern edge.
    ///
    /// # Errors
    ///
    /// Fails with [`GeocellError::InvalidBoxEdit`] when the new edge would
    /// fall below the southern one, or [`GeocellError::InvalidCoordinate`]
    /// when it is out of range.
    pub fn set_north(&mut self, north: f64) -> Result<()> {
        validate_lat(north)?;
        if north < self.south {
            return Err(GeocellError::InvalidBoxEdit(format!(
                "North ({}) must be above south ({})",
                north, self.south
            )));
        }
        self.north = north;
        Ok(())
    }

    /// Move the southern edge. Fails like [`BoundingBox::set_north`].
    pub fn set_south(&mut self, south: f64) -> Result<()> {
        validate_lat(south)?;
        if south > self.north {
            return Err(GeocellError::InvalidBoxEdit(format!(
                "South ({}) must be below north ({})",
                south, self.north
            )));
        }
        self.south = south;
        Ok(())
    }

    /// Move the eastern edge.
    pub fn set_east(&mut self, east: f64) -> Result<()> {
        validate_lon(east)?;
        self.east = east;
        Ok(())
    }

    /// Move the western edge.
    pub fn set_west(&mut self, west: f64) -> Result<()> {
        validate_lon(west)?;
        self.west = west;
        Ok(())
    }

    /// Whether the point lies within the rectangle, edges included.
    pub fn contains(&self, point: Point) -> bool {
        point.lat() >= self.south
            && point.lat() <= self.north
            && point.lon() >= self.west
            && point.lon() <= self.east
    }

    /// Convert to a `geo::Rect`.
    ///
    /// Returns `None` for an antimeridian-crossing box (east < west), which
    /// a `Rect` cannot represent without silently reordering the edges.
    pub fn to_rect(&self) -> Option<geo::Rect<f64>> {
        if self.east < self.west {
            return None;
        }
        Some(geo::Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        ))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.north, self.east, self.south, self.west
        )
    }
}
