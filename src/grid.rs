//! Algebra over rectangular grids of cells.
//!
//! Cells of one resolution tile the world in a regular grid, so a
//! rectangular region can be described by its north-east and south-west
//! corner cells alone. This module fills in such regions
//! ([`interpolate`]), sizes them without materializing them
//! ([`interpolation_count`]), and picks the cheapest set of cells covering
//! a bounding box under a caller-supplied cost function
//! ([`best_bbox_search_cells`]).

use crate::cell::{self, GRID_SIZE, MAX_GEOCELL_RESOLUTION};
use crate::types::BoundingBox;
use log::debug;

/// Resolutions whose covering grid would exceed this many cells are
/// skipped outright during the bounding-box search.
pub const MAX_FEASIBLE_BBOX_SEARCH_CELLS: usize = 300;

/// Whether two cells lie in one column (`column_test`) or one row of every
/// shared-resolution subdivision.
///
/// # Panics
///
/// Panics when either cell contains characters outside the cell alphabet.
pub fn collinear(cell1: &str, cell2: &str, column_test: bool) -> bool {
    let a = cell1.as_bytes();
    let b = cell2.as_bytes();
    for i in 0..a.len().min(b.len()) {
        let (x1, y1) = cell::subdiv_xy(a[i]);
        let (x2, y2) = cell::subdiv_xy(b[i]);
        if column_test && x1 != x2 {
            return false;
        }
        if !column_test && y1 != y2 {
            return false;
        }
    }
    true
}

/// Every cell in the rectangular grid whose corners are `cell_ne` and
/// `cell_sw`, in row-major order from the south-west: west to east, then
/// south to north.
///
/// Both corners must have the same resolution and `cell_ne` must lie
/// north-east of `cell_sw`. A traversal that runs off a pole ends that
/// axis early rather than wrapping.
///
/// # Panics
///
/// Panics when either cell contains characters outside the cell alphabet.
pub fn interpolate(cell_ne: &str, cell_sw: &str) -> Vec<String> {
    // Walk the southern row east until it shares a column with the corner.
    let mut row = Vec::new();
    let mut cur = cell_sw.to_string();
    loop {
        let done = collinear(&cur, cell_ne, true);
        row.push(cur.clone());
        if done {
            break;
        }
        match cell::adjacent(&cur, cell::EAST) {
            Some(next) => cur = next,
            None => break,
        }
    }

    // Shift the whole row north until its last cell is the corner.
    let mut cells = row.clone();
    let mut last_row = row;
    while last_row.last().map(String::as_str) != Some(cell_ne) {
        let next_row: Option<Vec<String>> = last_row
            .iter()
            .map(|c| cell::adjacent(c, cell::NORTH))
            .collect();
        match next_row {
            Some(r) => {
                cells.extend(r.iter().cloned());
                last_row = r;
            }
            None => break,
        }
    }
    cells
}

/// The number of cells [`interpolate`] would produce, computed from the
/// two corner rectangles alone.
///
/// Used to reject infeasibly fine resolutions before materializing
/// anything.
///
/// # Panics
///
/// Panics when either cell contains characters outside the cell alphabet.
pub fn interpolation_count(cell_ne: &str, cell_sw: &str) -> usize {
    let bbox_ne = cell::decode_box(cell_ne);
    let bbox_sw = cell::decode_box(cell_sw);

    let cell_lat_span = bbox_sw.north() - bbox_sw.south();
    let cell_lon_span = bbox_sw.east() - bbox_sw.west();

    let num_cols = ((bbox_ne.east() - bbox_sw.west()) / cell_lon_span) as usize;
    let num_rows = ((bbox_ne.north() - bbox_sw.south()) / cell_lat_span) as usize;
    num_cols * num_rows
}

/// The longest string that is a prefix of every input cell.
pub fn common_prefix(cells: &[&str]) -> String {
    let mut iter = cells.iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut prefix: &str = first;
    for c in iter {
        let shared = prefix
            .bytes()
            .zip(c.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        prefix = &prefix[..shared];
    }
    prefix.to_string()
}

/// The default bounding-box cost function: any set of more than
/// `GRID_SIZE²` (16) cells is infinitely expensive, so the search settles
/// on the finest resolution still covered by at most 16 cells.
pub fn default_cost_function(num_cells: usize, _resolution: usize) -> f64 {
    if num_cells > GRID_SIZE * GRID_SIZE {
        f64::INFINITY
    } else {
        0.0
    }
}

/// The cheapest set of same-resolution cells fully covering a bounding
/// box, under the given cost function.
///
/// Starting from the resolution at which the box's corner cells diverge,
/// each candidate resolution's covering grid is sized, materialized when
/// feasible, and scored as `cost(cell_count, resolution)`. The cost
/// function is assumed monotonically non-decreasing past its minimum, so
/// the search stops at the first increase.
///
/// # Examples
///
/// ```rust
/// use geocell::{grid, BoundingBox};
///
/// let bbox = BoundingBox::new(43.195111, -89.998193, 43.19302, -90.002356)?;
/// let cells = grid::best_bbox_search_cells(&bbox, grid::default_cost_function);
/// assert!(!cells.is_empty() && cells.len() <= 16);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn best_bbox_search_cells<F>(bbox: &BoundingBox, cost: F) -> Vec<String>
where
    F: Fn(usize, usize) -> f64,
{
    let cell_ne = cell::compute(bbox.north_east(), MAX_GEOCELL_RESOLUTION);
    let cell_sw = cell::compute(bbox.south_west(), MAX_GEOCELL_RESOLUTION);

    let mut min_cost = f64::INFINITY;
    let mut min_cost_cell_set: Vec<String> = Vec::new();

    // The corner cells agree on their shared prefix, so no coarser
    // resolution can distinguish the box.
    let min_resolution = common_prefix(&[&cell_ne, &cell_sw]).len();

    for resolution in min_resolution..=(MAX_GEOCELL_RESOLUTION + 1) {
        let ne = &cell_ne[..resolution.min(cell_ne.len())];
        let sw = &cell_sw[..resolution.min(cell_sw.len())];

        let num_cells = interpolation_count(ne, sw);
        if num_cells > MAX_FEASIBLE_BBOX_SEARCH_CELLS {
            continue;
        }

        let mut cell_set = interpolate(ne, sw);
        cell_set.sort_unstable();

        let c = cost(cell_set.len(), resolution);
        debug!(
            "bbox search at resolution {}: {} cells, cost {}",
            resolution,
            cell_set.len(),
            c
        );
        if c <= min_cost {
            min_cost = c;
            min_cost_cell_set = cell_set;
        } else {
            break;
        }
    }

    min_cost_cell_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn pt(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn test_collinear_rows_and_columns() {
        let base = cell::compute(pt(40.74, -73.98), 8);
        let east = cell::adjacent(&base, cell::EAST).unwrap();
        let north = cell::adjacent(&base, cell::NORTH).unwrap();

        assert!(collinear(&base, &east, false)); // same row
        assert!(!collinear(&base, &east, true));
        assert!(collinear(&base, &north, true)); // same column
        assert!(!collinear(&base, &north, false));
        assert!(collinear(&base, &base, true));
        assert!(collinear(&base, &base, false));
    }

    #[test]
    fn test_interpolate_single_cell() {
        let c = cell::compute(pt(40.74, -73.98), 9);
        assert_eq!(interpolate(&c, &c), vec![c.clone()]);
        assert_eq!(interpolation_count(&c, &c), 1);
    }

    #[test]
    fn test_interpolate_rectangle() {
        let sw = cell::compute(pt(40.74, -73.98), 9);
        let east = cell::adjacent(&sw, cell::EAST).unwrap();
        let ne = cell::adjacent(&east, cell::NORTH).unwrap();

        let cells = interpolate(&ne, &sw);
        assert_eq!(cells.len(), 4);
        // Row-major from the south-west corner
        assert_eq!(cells[0], sw);
        assert_eq!(cells[1], east);
        assert_eq!(cells[3], ne);
        assert_eq!(interpolation_count(&ne, &sw), 4);
    }

    #[test]
    fn test_interpolation_count_matches_interpolate() {
        let sw = cell::compute(pt(37.0, -122.0), 8);
        let mut ne = sw.clone();
        for _ in 0..3 {
            ne = cell::adjacent(&ne, cell::EAST).unwrap();
        }
        for _ in 0..2 {
            ne = cell::adjacent(&ne, cell::NORTH).unwrap();
        }
        let cells = interpolate(&ne, &sw);
        assert_eq!(cells.len(), 4 * 3);
        assert_eq!(interpolation_count(&ne, &sw), cells.len());
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(&["8e6187", "8e6199"]), "8e61");
        assert_eq!(common_prefix(&["8e61", "8e6187"]), "8e61");
        assert_eq!(common_prefix(&["8e61", "9e61"]), "");
        assert_eq!(common_prefix(&["8e61"]), "8e61");
        assert_eq!(common_prefix(&[]), "");
        assert_eq!(common_prefix(&["abc", "abd", "ab1"]), "ab");
    }

    #[test]
    fn test_default_cost_function() {
        assert_eq!(default_cost_function(16, 5), 0.0);
        assert_eq!(default_cost_function(1, 13), 0.0);
        assert!(default_cost_function(17, 5).is_infinite());
    }

    #[test]
    fn test_best_bbox_search_cells_reference_set() {
        // Straddles the -90 meridian, a top-level cell boundary
        let bbox = BoundingBox::new(43.195111, -89.998193, 43.19302, -90.002356).unwrap();
        let cells = best_bbox_search_cells(&bbox, default_cost_function);
        assert_eq!(
            cells,
            vec![
                "8ff77dfd4", "8ff77dfd5", "8ff77dfd6", "8ff77dfd7", "8ff77dfdc", "8ff77dfdd",
                "8ff77dfde", "8ff77dfdf", "9aa228a80", "9aa228a81", "9aa228a82", "9aa228a83",
                "9aa228a88", "9aa228a89", "9aa228a8a", "9aa228a8b",
            ]
        );
    }

    #[test]
    fn test_best_bbox_search_cells_point_box() {
        // A degenerate box with a cost that tolerates any cell count keeps
        // refining down to the finest resolution: a single max-length cell
        let bbox = BoundingBox::new(43.195110, -89.998193, 43.195110, -89.998193).unwrap();
        let cells = best_bbox_search_cells(&bbox, |_num_cells, resolution| {
            if resolution <= MAX_GEOCELL_RESOLUTION {
                0.0
            } else {
                f64::INFINITY
            }
        });
        assert_eq!(cells, vec!["9aa228a8b3b00"]);
    }

    #[test]
    fn test_best_bbox_cells_cover_the_box() {
        let bbox = BoundingBox::new(40.80, -73.93, 40.70, -74.02).unwrap();
        let cells = best_bbox_search_cells(&bbox, default_cost_function);
        assert!(!cells.is_empty());
        assert!(cells.len() <= 16);

        // Every cell overlaps the box
        for c in &cells {
            let b = cell::compute_box(c).unwrap();
            assert!(b.west() <= bbox.east() && bbox.west() <= b.east());
            assert!(b.south() <= bbox.north() && bbox.south() <= b.north());
        }

        // And together they cover its corners
        let corners = [
            bbox.north_east(),
            bbox.south_west(),
            pt(bbox.north(), bbox.west()),
            pt(bbox.south(), bbox.east()),
        ];
        for corner in corners {
            assert!(
                cells.iter().any(|c| cell::contains_point(c, corner)),
                "corner {} not covered",
                corner
            );
        }
    }
}
