//! Geospatial cell indexing and proximity search for datastores without
//! native spatial indexes.
//!
//! Every indexable entity carries a latitude/longitude point and the list
//! of hierarchical cell ids containing it ([`cell::generate_geocells`]);
//! the backing store indexes those ids as ordinary strings. On top of that
//! contract the crate answers two query styles:
//!
//! * **Bounding box**: [`geocells_for_bounding_box`] computes a small set
//!   of cell ids covering a rectangle, to be ANDed/INed into a native
//!   query; [`filter_by_bounding_box`] trims the raw matches afterwards.
//! * **Proximity**: [`proximity_fetch`] returns the nearest N entities to
//!   a center point, driving a caller-supplied query callback through an
//!   iterative cell expansion with a provable stopping bound.
//!
//! The core is pure: no storage, no I/O beyond the callback, no shared
//! state. Independent searches can run on independent threads.
//!
//! ## Example
//!
//! ```rust
//! use geocell::{cell, geocells_for_bounding_box, BoundingBox, Point};
//!
//! // At write time: persist the entity's cells next to its payload
//! let location = Point::new(40.7407092, -73.9894039)?;
//! let cells = cell::generate_geocells(location);
//! assert_eq!(cells.len(), 13);
//!
//! // At query time: cover the rectangle with at most 16 cell ids and
//! // intersect them with the persisted lists
//! let bbox = BoundingBox::new(40.80, -73.93, 40.70, -74.02)?;
//! let cover = geocells_for_bounding_box(&bbox);
//! assert!(!cover.is_empty() && cover.len() <= 16);
//! # Ok::<(), geocell::GeocellError>(())
//! ```

pub mod cell;
pub mod error;
pub mod geomath;
pub mod grid;
pub mod merge;
pub mod query;
pub mod types;

pub use error::{GeocellError, Result};
pub use types::{BoundingBox, Point};

pub use geomath::{distance, EARTH_RADIUS_METERS};

pub use cell::{Direction, MAX_GEOCELL_RESOLUTION};

pub use query::{
    filter_by_bounding_box, geocells_for_bounding_box, geocells_for_bounding_box_with_cost,
    proximity_fetch, LocationEntity, DEFAULT_PROXIMITY_MAX_RESULTS,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{BoundingBox, GeocellError, Point, Result};

    pub use crate::cell::{self, generate_geocells};

    pub use crate::{
        distance, filter_by_bounding_box, geocells_for_bounding_box, proximity_fetch,
        LocationEntity,
    };
}
