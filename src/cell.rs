//! The geocell codec.
//!
//! A geocell is a short string over the hex alphabet naming one rectangle of
//! a hierarchical 4x4 subdivision of the Earth's surface. The first
//! character picks one of 16 world-spanning rectangles, each further
//! character one of 16 sub-rectangles of its parent, so a string of length
//! `r` (its *resolution*) names a rectangle roughly `360 / 4^r` degrees
//! wide. Because every cell id is an ordinary string prefixed by all of its
//! ancestors, a plain string index over persisted cell lists is enough to
//! answer hierarchical containment queries in stores without spatial
//! indexes.
//!
//! The 16 characters of each subdivision are interleaved on the grid so
//! that, at every resolution, a cell's character encodes its column and row
//! in two bits each:
//!
//! ```text
//!   a b e f      (row 3, north)
//!   8 9 c d
//!   2 3 6 7
//!   0 1 4 5      (row 0, south)
//! ```
//!
//! Cell strings are pure ASCII and are manipulated at the byte level.

use crate::error::{GeocellError, Result};
use crate::geomath;
use crate::types::{BoundingBox, Point};

/// Cells subdivide into a 4x4 grid of children.
pub const GRID_SIZE: usize = 4;

/// The cell alphabet, ordered by subdivision index.
pub const ALPHABET: &[u8; 16] = b"0123456789abcdef";

/// The finest resolution at which cells are generated and searched.
pub const MAX_GEOCELL_RESOLUTION: usize = 13;

/// A compass step between neighboring cells: `(dx, dy)` with `dx = +1`
/// pointing east and `dy = +1` pointing north.
pub type Direction = (i32, i32);

pub const NORTHWEST: Direction = (-1, 1);
pub const NORTH: Direction = (0, 1);
pub const NORTHEAST: Direction = (1, 1);
pub const EAST: Direction = (1, 0);
pub const SOUTHEAST: Direction = (1, -1);
pub const SOUTH: Direction = (0, -1);
pub const SOUTHWEST: Direction = (-1, -1);
pub const WEST: Direction = (-1, 0);

/// The alphabet character at grid position `(x, y)`.
///
/// The index interleaves the two coordinates bit by bit, which is what
/// produces the grid layout in the module docs.
pub(crate) fn subdiv_char(x: usize, y: usize) -> u8 {
    ALPHABET[(y & 2) << 2 | (x & 2) << 1 | (y & 1) << 1 | (x & 1)]
}

/// The grid position `(x, y)` of an alphabet character.
///
/// # Panics
///
/// Panics when the byte is not in the cell alphabet.
pub(crate) fn subdiv_xy(byte: u8) -> (usize, usize) {
    let c = match byte {
        b'0'..=b'9' => (byte - b'0') as usize,
        b'a'..=b'f' => (byte - b'a') as usize + 10,
        _ => panic!("Invalid geocell character: {:?}", byte as char),
    };
    (((c & 4) >> 1) | (c & 1), ((c & 8) >> 2) | ((c & 2) >> 1))
}

/// Whether the string is a well-formed cell: nonempty and entirely over
/// the cell alphabet.
pub fn is_valid(cell: &str) -> bool {
    !cell.is_empty()
        && cell
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn ensure_valid(cell: &str) -> Result<()> {
    if is_valid(cell) {
        Ok(())
    } else {
        Err(GeocellError::InvalidCell(format!(
            "Not a geocell string: {:?}",
            cell
        )))
    }
}

/// Compute the cell of the given resolution containing a point.
///
/// Refines the world box one 4x4 subdivision per character. Points exactly
/// on a subdivision's upper or right boundary clamp into the last row or
/// column, so every valid point maps to exactly one cell.
///
/// # Examples
///
/// ```rust
/// use geocell::{cell, Point};
///
/// let c = cell::compute(Point::new(37.0, -122.0)?, 8);
/// assert_eq!(c.len(), 8);
/// assert!(cell::contains_point(&c, Point::new(37.0, -122.0)?));
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn compute(point: Point, resolution: usize) -> String {
    let mut north = 90.0_f64;
    let mut south = -90.0_f64;
    let mut east = 180.0_f64;
    let mut west = -180.0_f64;

    let mut cell = String::with_capacity(resolution);
    while cell.len() < resolution {
        let subcell_lon_span = (east - west) / GRID_SIZE as f64;
        let subcell_lat_span = (north - south) / GRID_SIZE as f64;

        let x = ((GRID_SIZE as f64 * (point.lon() - west) / (east - west)) as i64)
            .min(GRID_SIZE as i64 - 1) as usize;
        let y = ((GRID_SIZE as f64 * (point.lat() - south) / (north - south)) as i64)
            .min(GRID_SIZE as i64 - 1) as usize;

        cell.push(subdiv_char(x, y) as char);

        south += subcell_lat_span * y as f64;
        north = south + subcell_lat_span;
        west += subcell_lon_span * x as f64;
        east = west + subcell_lon_span;
    }
    cell
}

/// Decode a cell into its bounding rectangle, assuming a valid cell.
pub(crate) fn decode_box(cell: &str) -> BoundingBox {
    let mut north = 90.0_f64;
    let mut south = -90.0_f64;
    let mut east = 180.0_f64;
    let mut west = -180.0_f64;

    for byte in cell.bytes() {
        let (x, y) = subdiv_xy(byte);
        let subcell_lat_span = (north - south) / GRID_SIZE as f64;
        let subcell_lon_span = (east - west) / GRID_SIZE as f64;

        south += subcell_lat_span * y as f64;
        north = south + subcell_lat_span;
        west += subcell_lon_span * x as f64;
        east = west + subcell_lon_span;
    }
    BoundingBox::new_unchecked(north, east, south, west)
}

/// The rectangle a cell denotes.
///
/// # Errors
///
/// Returns [`GeocellError::InvalidCell`] when the string is empty or
/// contains characters outside the cell alphabet.
pub fn compute_box(cell: &str) -> Result<BoundingBox> {
    ensure_valid(cell)?;
    Ok(decode_box(cell))
}

/// Whether the cell contains the point, i.e. the point's cell at this
/// resolution is exactly this cell.
pub fn contains_point(cell: &str, point: Point) -> bool {
    compute(point, cell.len()) == cell
}

/// The 16 child cells, in alphabet order.
pub fn children(cell: &str) -> Vec<String> {
    ALPHABET
        .iter()
        .map(|&b| {
            let mut child = String::with_capacity(cell.len() + 1);
            child.push_str(cell);
            child.push(b as char);
            child
        })
        .collect()
}

/// The neighboring cell one step in the given direction, at the same
/// resolution.
///
/// Walks the cell string right to left, borrowing into the parent whenever
/// a coordinate wraps. A horizontal borrow that runs off the left end wraps
/// around the globe and is fine; a vertical one would cross a pole, where
/// no neighbor exists, and yields `None`.
///
/// # Panics
///
/// Panics when `cell` contains characters outside the cell alphabet.
pub fn adjacent(cell: &str, direction: Direction) -> Option<String> {
    let (mut dx, mut dy) = direction;
    let mut bytes = cell.as_bytes().to_vec();

    let mut i = bytes.len();
    while i > 0 && (dx != 0 || dy != 0) {
        i -= 1;
        let (mut x, mut y) = subdiv_xy(bytes[i]);

        if dx == -1 {
            if x == 0 {
                x = GRID_SIZE - 1;
            } else {
                x -= 1;
                dx = 0;
            }
        } else if dx == 1 {
            if x == GRID_SIZE - 1 {
                x = 0;
            } else {
                x += 1;
                dx = 0;
            }
        }

        if dy == 1 {
            if y == GRID_SIZE - 1 {
                y = 0;
            } else {
                y += 1;
                dy = 0;
            }
        } else if dy == -1 {
            if y == 0 {
                y = GRID_SIZE - 1;
            } else {
                y -= 1;
                dy = 0;
            }
        }

        bytes[i] = subdiv_char(x, y);
    }

    // An unabsorbed vertical carry means we walked off a pole.
    if dy != 0 {
        return None;
    }
    Some(bytes.into_iter().map(char::from).collect())
}

/// All eight neighbors, in the fixed order NW, N, NE, E, SE, S, SW, W.
///
/// Entries are `None` where no neighbor exists (across a pole).
pub fn all_adjacents(cell: &str) -> Vec<Option<String>> {
    [
        NORTHWEST, NORTH, NORTHEAST, EAST, SOUTHEAST, SOUTH, SOUTHWEST, WEST,
    ]
    .iter()
    .map(|&d| adjacent(cell, d))
    .collect()
}

/// Distance in meters from a point to the nearest boundary of a cell.
///
/// The point need not be inside the cell; for a point inside, this is the
/// distance to the nearest edge (zero on an edge).
///
/// # Panics
///
/// Panics when `cell` contains characters outside the cell alphabet.
pub fn point_distance(cell: &str, point: Point) -> f64 {
    let b = decode_box(cell);
    let (lat, lon) = (point.lat(), point.lon());

    let lon_inside = b.west() <= lon && lon <= b.east();
    let lat_inside = b.south() <= lat && lat <= b.north();

    if lon_inside {
        let to_south = geomath::distance_deg(lat, lon, b.south(), lon);
        let to_north = geomath::distance_deg(lat, lon, b.north(), lon);
        if lat_inside {
            let to_east = geomath::distance_deg(lat, lon, lat, b.east());
            let to_west = geomath::distance_deg(lat, lon, lat, b.west());
            to_south.min(to_north).min(to_east).min(to_west)
        } else {
            to_south.min(to_north)
        }
    } else if lat_inside {
        let to_east = geomath::distance_deg(lat, lon, lat, b.east());
        let to_west = geomath::distance_deg(lat, lon, lat, b.west());
        to_east.min(to_west)
    } else {
        geomath::distance_deg(lat, lon, b.south(), b.east())
            .min(geomath::distance_deg(lat, lon, b.north(), b.east()))
            .min(geomath::distance_deg(lat, lon, b.south(), b.west()))
            .min(geomath::distance_deg(lat, lon, b.north(), b.west()))
    }
}

/// The cells of every resolution `1..=MAX_GEOCELL_RESOLUTION` containing a
/// point, coarsest first.
///
/// This is the list an entity persists alongside its location so that cell
/// ids of any resolution can be matched against it with plain string
/// equality.
///
/// # Examples
///
/// ```rust
/// use geocell::{cell, Point};
///
/// let cells = cell::generate_geocells(Point::new(40.7407092, -73.9894039)?);
/// assert_eq!(cells.len(), 13);
/// assert!(cells[12].starts_with(&cells[4]));
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn generate_geocells(point: Point) -> Vec<String> {
    let finest = compute(point, MAX_GEOCELL_RESOLUTION);
    (1..=MAX_GEOCELL_RESOLUTION)
        .map(|resolution| finest[..resolution].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn test_subdiv_round_trip() {
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                assert_eq!(subdiv_xy(subdiv_char(x, y)), (x, y));
            }
        }
    }

    #[test]
    fn test_subdiv_layout() {
        // Bottom row west to east, then the row above it
        assert_eq!(subdiv_char(0, 0), b'0');
        assert_eq!(subdiv_char(1, 0), b'1');
        assert_eq!(subdiv_char(2, 0), b'4');
        assert_eq!(subdiv_char(3, 0), b'5');
        assert_eq!(subdiv_char(0, 1), b'2');
        // North-west and north-east corners
        assert_eq!(subdiv_char(0, 3), b'a');
        assert_eq!(subdiv_char(3, 3), b'f');
    }

    #[test]
    fn test_compute_length_and_containment() {
        let p = pt(37.0, -122.0);
        for resolution in 1..=MAX_GEOCELL_RESOLUTION {
            let c = compute(p, resolution);
            assert_eq!(c.len(), resolution);
            assert!(is_valid(&c));
            assert!(contains_point(&c, p));
        }
    }

    #[test]
    fn test_compute_beyond_max_resolution() {
        let c14 = compute(pt(37.0, -122.0), 14);
        assert_eq!(c14.len(), 14);
        assert!(is_valid(&c14));
        assert_eq!(compute(pt(37.0, -122.0), 8), &c14[..8]);
    }

    #[test]
    fn test_compute_is_prefix_stable() {
        let p = pt(47.291288, 8.56613);
        let finest = compute(p, MAX_GEOCELL_RESOLUTION);
        for resolution in 1..MAX_GEOCELL_RESOLUTION {
            assert!(finest.starts_with(&compute(p, resolution)));
        }
    }

    #[test]
    fn test_compute_clamps_world_edges() {
        // The north pole and the antimeridian sit on the outermost grid
        // boundary and must clamp into the last row/column
        for p in [pt(90.0, 180.0), pt(90.0, 0.0), pt(0.0, 180.0)] {
            let c = compute(p, 6);
            assert_eq!(c.len(), 6);
            assert!(contains_point(&c, p));
        }
    }

    #[test]
    fn test_compute_box_round_trip() {
        let p = pt(40.7407092, -73.9894039);
        for resolution in [1, 4, 9, 13] {
            let c = compute(p, resolution);
            let b = compute_box(&c).unwrap();
            assert!(b.contains(p));
            // Interior sample points decode back to the same cell
            let mid = Point::new(
                (b.north() + b.south()) / 2.0,
                (b.east() + b.west()) / 2.0,
            )
            .unwrap();
            assert_eq!(compute(mid, resolution), c);
        }
    }

    #[test]
    fn test_compute_box_rejects_garbage() {
        assert!(compute_box("").is_err());
        assert!(compute_box("8e61z7").is_err());
        assert!(compute_box("8E6").is_err());
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("8e6187fe6187fa"));
        assert!(is_valid("0"));
        assert!(!is_valid(""));
        assert!(!is_valid("8g"));
        assert!(!is_valid("8 9"));
    }

    #[test]
    fn test_children() {
        let kids = children("8e6187fe6187f");
        assert_eq!(kids.len(), 16);
        assert_eq!(kids[0], "8e6187fe6187f0");
        assert_eq!(kids[15], "8e6187fe6187ff");
        for child in &kids {
            assert!(child.starts_with("8e6187fe6187f"));
            assert!(is_valid(child));
        }
    }

    #[test]
    fn test_adjacent_inverse() {
        let c = compute(pt(40.7407092, -73.9894039), 10);
        for d in [
            NORTHWEST, NORTH, NORTHEAST, EAST, SOUTHEAST, SOUTH, SOUTHWEST, WEST,
        ] {
            let there = adjacent(&c, d).unwrap();
            let back = adjacent(&there, (-d.0, -d.1)).unwrap();
            assert_eq!(back, c, "direction {:?}", d);
        }
    }

    #[test]
    fn test_all_adjacents_fixed_order() {
        let neighbors: Vec<String> = all_adjacents("8e6187fe6187fa")
            .into_iter()
            .map(Option::unwrap)
            .collect();
        assert_eq!(
            neighbors,
            vec![
                "8e6187fe618d45", // NW
                "8e6187fe618d50", // N
                "8e6187fe618d51", // NE
                "8e6187fe6187fb", // E
                "8e6187fe6187f9", // SE
                "8e6187fe6187f8", // S
                "8e6187fe6187ed", // SW
                "8e6187fe6187ef", // W
            ]
        );
    }

    #[test]
    fn test_adjacent_wraps_antimeridian() {
        // A cell on the eastern world edge steps east onto the western edge
        let c = compute(pt(0.0, 179.99), MAX_GEOCELL_RESOLUTION);
        let east = adjacent(&c, EAST).unwrap();
        let b = compute_box(&east).unwrap();
        assert_eq!(b.west(), -180.0);
    }

    #[test]
    fn test_adjacent_none_past_poles() {
        let top = compute(pt(89.99, 0.0), 5);
        assert_eq!(adjacent(&top, NORTH), None);
        assert_eq!(adjacent(&top, NORTHEAST), None);
        assert!(adjacent(&top, EAST).is_some());

        let bottom = compute(pt(-89.99, 0.0), 5);
        assert_eq!(adjacent(&bottom, SOUTH), None);
        assert_eq!(adjacent(&bottom, SOUTHWEST), None);

        let polar = all_adjacents(&top);
        assert_eq!(polar.len(), 8);
        assert_eq!(polar.iter().filter(|n| n.is_none()).count(), 3);
    }

    #[test]
    fn test_point_distance_reference_values() {
        let c = "9ac7be064ea77";
        assert!(point_distance(c, pt(40.7407092, -73.9894039)) < 1.0);
        assert!((point_distance(c, pt(40.7425610, -73.9922670)) - 317.2).abs() < 1.0);
        assert!((point_distance(c, pt(40.740720, -73.989403)) - 0.99).abs() < 0.05);
    }

    #[test]
    fn test_point_distance_quadrants() {
        let c = compute(pt(0.0, 0.0), 6);
        let b = compute_box(c.as_str()).unwrap();
        let mid_lat = (b.north() + b.south()) / 2.0;

        // Due east of the cell: the cell's east edge is nearest
        let east_pt = pt(mid_lat, b.east() + 1.0);
        let expected = geomath::distance_deg(mid_lat, b.east() + 1.0, mid_lat, b.east());
        assert_eq!(point_distance(&c, east_pt), expected);

        // Diagonal: the nearest corner wins
        let diag = pt(b.north() + 1.0, b.east() + 1.0);
        let corner = geomath::distance_deg(b.north() + 1.0, b.east() + 1.0, b.north(), b.east());
        assert_eq!(point_distance(&c, diag), corner);

        // On an edge: zero
        assert_eq!(point_distance(&c, pt(mid_lat, b.east())), 0.0);
    }

    #[test]
    fn test_generate_geocells() {
        let p = pt(40.7407092, -73.9894039);
        let cells = generate_geocells(p);
        assert_eq!(cells.len(), MAX_GEOCELL_RESOLUTION);
        for (i, c) in cells.iter().enumerate() {
            assert_eq!(c.len(), i + 1);
            assert!(contains_point(c, p));
        }
        assert_eq!(cells[12], compute(p, MAX_GEOCELL_RESOLUTION));
    }
}
