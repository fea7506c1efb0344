//! Query façades over an external datastore.
//!
//! The crate never talks to storage itself. Callers persist each entity's
//! location cells (from [`cell::generate_geocells`]) as ordinary indexed
//! strings, and hand queries a callback that resolves a set of candidate
//! cell ids to the entities whose persisted cell list intersects it. On top
//! of that contract this module offers the two supported query styles:
//!
//! * **Bounding box**: [`geocells_for_bounding_box`] turns a rectangle
//!   into a small cell set to AND/IN into a native query, and
//!   [`filter_by_bounding_box`] trims the raw matches to the exact
//!   rectangle afterwards.
//! * **Proximity**: [`proximity_fetch`] finds the `n` entities nearest a
//!   center point by expanding rings of cells around it, interleaving
//!   datastore batches with result merging until no unsearched cell could
//!   hold anything closer than what is already in hand.

use crate::cell::{self, Direction, MAX_GEOCELL_RESOLUTION};
use crate::error::Result;
use crate::geomath;
use crate::grid;
use crate::merge::merge_in_place;
use crate::types::{BoundingBox, Point};
use log::debug;
use rustc_hash::FxHashSet;

/// Default result cap for [`proximity_fetch`].
pub const DEFAULT_PROXIMITY_MAX_RESULTS: usize = 10;

/// An object a datastore can return from a cell query.
///
/// The key deduplicates entities that surface from more than one cell
/// batch; the location orders them by distance. Entities are expected to
/// have been stored with the cell list produced by
/// [`cell::generate_geocells`] for their location.
pub trait LocationEntity {
    /// A stable identifier, unique within one search.
    fn key(&self) -> &str;

    /// Where the entity is.
    fn location(&self) -> Point;
}

/// The set of cell ids to intersect with a query for entities inside a
/// bounding box, using the default cost function (at most 16 cells).
///
/// Matching on cells alone over-approximates the rectangle; run the raw
/// matches through [`filter_by_bounding_box`] afterwards.
///
/// # Examples
///
/// ```rust
/// use geocell::{geocells_for_bounding_box, BoundingBox};
///
/// let bbox = BoundingBox::new(40.80, -73.93, 40.70, -74.02)?;
/// let cells = geocells_for_bounding_box(&bbox);
/// assert!(!cells.is_empty() && cells.len() <= 16);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn geocells_for_bounding_box(bbox: &BoundingBox) -> Vec<String> {
    grid::best_bbox_search_cells(bbox, grid::default_cost_function)
}

/// Like [`geocells_for_bounding_box`] with a caller-supplied cost function
/// trading cell-set size against resolution.
pub fn geocells_for_bounding_box_with_cost<F>(bbox: &BoundingBox, cost: F) -> Vec<String>
where
    F: Fn(usize, usize) -> f64,
{
    grid::best_bbox_search_cells(bbox, cost)
}

/// Keep only the rows whose location actually falls inside the rectangle.
pub fn filter_by_bounding_box<E: LocationEntity>(bbox: &BoundingBox, rows: Vec<E>) -> Vec<E> {
    rows.into_iter()
        .filter(|row| bbox.contains(row.location()))
        .collect()
}

/// Distances from a point to the four edges of the rectangular hull of a
/// cell set, ascending.
///
/// The hull is the element-wise maximum of the cells' box edges. Each edge
/// distance is measured to the point's projection onto that edge (the
/// cross axis held at the point's own coordinate). Returned as parallel
/// direction and distance vectors, nearest edge first.
///
/// # Panics
///
/// Panics when `cells` is empty or contains an invalid cell.
pub fn distance_sorted_edges(
    cells: &[impl AsRef<str>],
    point: Point,
) -> (Vec<Direction>, Vec<f64>) {
    assert!(!cells.is_empty(), "Cell set must be nonempty");

    let mut north = f64::NEG_INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut south = f64::NEG_INFINITY;
    let mut west = f64::NEG_INFINITY;
    for c in cells {
        let b = cell::decode_box(c.as_ref());
        north = north.max(b.north());
        east = east.max(b.east());
        south = south.max(b.south());
        west = west.max(b.west());
    }

    let (lat, lon) = (point.lat(), point.lon());
    let mut edges: Vec<(Direction, f64)> = vec![
        (cell::SOUTH, geomath::distance_deg(south, lon, lat, lon)),
        (cell::NORTH, geomath::distance_deg(north, lon, lat, lon)),
        (cell::WEST, geomath::distance_deg(lat, west, lat, lon)),
        (cell::EAST, geomath::distance_deg(lat, east, lat, lon)),
    ];
    edges.sort_by(|a, b| a.1.total_cmp(&b.1));
    edges.into_iter().unzip()
}

/// How the proximity loop grows or shrinks its working cell set.
enum Expansion {
    Ascend,
    Append(String),
    Extend(Vec<String>),
}

/// The `max_results` entities nearest to `center`, ascending by distance.
///
/// `query_runner` resolves a batch of candidate cell ids to the entities
/// whose persisted cell list intersects it; its errors abort the search
/// and surface unchanged. `max_distance` caps the result radius in meters,
/// with `0.0` meaning unlimited.
///
/// The search starts at the finest cell containing the center and
/// alternately widens the searched region (sideways to neighboring cells,
/// then up to coarser parents) and merges newly found entities into the
/// running result list. It stops once the distance to the nearest edge of
/// the searched region's hull reaches the current `max_results`-th result
/// distance: nothing outside the region can beat what is already held.
///
/// Near the poles a needed neighbor may not exist; the search then widens
/// upward only, which can under-search such regions.
///
/// # Examples
///
/// ```rust
/// use geocell::{cell, proximity_fetch, LocationEntity, Point};
///
/// struct City {
///     name: String,
///     location: Point,
///     cells: Vec<String>,
/// }
///
/// impl LocationEntity for City {
///     fn key(&self) -> &str {
///         &self.name
///     }
///     fn location(&self) -> Point {
///         self.location
///     }
/// }
///
/// let hoboken = Point::new(40.7440, -74.0324)?;
/// let stored = vec![City {
///     name: "hoboken".into(),
///     location: hoboken,
///     cells: cell::generate_geocells(hoboken),
/// }];
///
/// let nyc = Point::new(40.7128, -74.0060)?;
/// let nearest = proximity_fetch(
///     nyc,
///     |cells: &[String]| {
///         Ok(stored
///             .iter()
///             .filter(|c| c.cells.iter().any(|id| cells.contains(id)))
///             .map(|c| City {
///                 name: c.name.clone(),
///                 location: c.location,
///                 cells: c.cells.clone(),
///             })
///             .collect())
///     },
///     10,
///     0.0,
/// )?;
/// assert_eq!(nearest.len(), 1);
/// assert_eq!(nearest[0].0.key(), "hoboken");
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn proximity_fetch<E, R>(
    center: Point,
    mut query_runner: R,
    max_results: usize,
    max_distance: f64,
) -> Result<Vec<(E, f64)>>
where
    E: LocationEntity,
    R: FnMut(&[String]) -> Result<Vec<E>>,
{
    if max_results == 0 {
        return Ok(Vec::new());
    }

    let mut results: Vec<(E, f64)> = Vec::new();
    let mut searched: FxHashSet<String> = FxHashSet::default();

    // The search cell containing the center; always a member of
    // cur_geocells, which stay same-resolution and rectangular.
    let mut containing_geocell = cell::compute(center, MAX_GEOCELL_RESOLUTION);
    let mut cur_geocells = vec![containing_geocell.clone()];

    let mut sorted_edges: Vec<Direction> = vec![(0, 0)];
    let mut sorted_edge_distances: Vec<f64> = vec![0.0];

    while !cur_geocells.is_empty() {
        // Nothing unsearched can be nearer than the closest hull edge.
        let closest_possible_next_result_dist = sorted_edge_distances[0];
        if max_distance > 0.0 && closest_possible_next_result_dist > max_distance {
            break;
        }

        let fresh: Vec<String> = cur_geocells
            .iter()
            .filter(|c| !searched.contains(*c))
            .cloned()
            .collect();
        debug!(
            "proximity pass: {} cell(s) at resolution {}, {} fresh, {} result(s) held",
            cur_geocells.len(),
            cur_geocells[0].len(),
            fresh.len(),
            results.len()
        );

        let mut batch: Vec<(E, f64)> = if fresh.is_empty() {
            Vec::new()
        } else {
            query_runner(&fresh)?
                .into_iter()
                .map(|entity| {
                    let d = geomath::distance(center, entity.location());
                    (entity, d)
                })
                .collect()
        };
        searched.extend(cur_geocells.iter().cloned());

        batch.sort_by(|a, b| a.1.total_cmp(&b.1));
        batch.truncate(max_results);

        merge_in_place(
            &mut results,
            batch,
            |result| result.0.key().to_string(),
            |a, b| a.1.total_cmp(&b.1),
        );
        results.truncate(max_results);

        let (edges, edge_distances) = distance_sorted_edges(&cur_geocells, center);
        sorted_edges = edges;
        sorted_edge_distances = edge_distances;

        let expansion = if results.is_empty() || cur_geocells.len() == 4 {
            // Nothing here, or a full 2x2 block searched: widen upward.
            Expansion::Ascend
        } else if cur_geocells.len() == 1 {
            match cell::adjacent(&cur_geocells[0], sorted_edges[0]) {
                Some(neighbor) => Expansion::Append(neighbor),
                // No neighbor past the pole; the level is exhausted.
                None => Expansion::Ascend,
            }
        } else {
            // Two cells held: grow along the perpendicular axis, toward
            // whichever edge of the center's own cell is nearer.
            let (containing_edges, _) =
                distance_sorted_edges(std::slice::from_ref(&containing_geocell), center);
            let nearest_is_vertical = containing_edges[0].0 == 0;
            let perpendicular = sorted_edges
                .iter()
                .copied()
                .find(|d| (d.0 == 0) != nearest_is_vertical);
            let extension: Option<Vec<String>> = perpendicular.and_then(|dir| {
                cur_geocells
                    .iter()
                    .map(|c| cell::adjacent(c, dir))
                    .collect()
            });
            match extension {
                Some(row) => Expansion::Extend(row),
                None => Expansion::Ascend,
            }
        };

        match expansion {
            Expansion::Ascend => {
                let mut parents: Vec<String> = Vec::with_capacity(cur_geocells.len());
                for c in &cur_geocells {
                    let parent = &c[..c.len() - 1];
                    if !parents.iter().any(|p| p == parent) {
                        parents.push(parent.to_string());
                    }
                }
                containing_geocell.pop();
                if containing_geocell.is_empty() {
                    // The whole world has been searched.
                    break;
                }
                cur_geocells = parents;
            }
            Expansion::Append(neighbor) => cur_geocells.push(neighbor),
            Expansion::Extend(row) => cur_geocells.extend(row),
        }

        if results.len() < max_results {
            continue;
        }
        let current_farthest_returnable_result_dist =
            geomath::distance(center, results[max_results - 1].0.location());
        if closest_possible_next_result_dist >= current_farthest_returnable_result_dist {
            debug!(
                "proximity search done: closest possible {} >= farthest returnable {}",
                closest_possible_next_result_dist, current_farthest_returnable_result_dist
            );
            break;
        }
    }

    results.truncate(max_results);
    Ok(results
        .into_iter()
        .filter(|(_, d)| max_distance <= 0.0 || *d < max_distance)
        .collect())
}
