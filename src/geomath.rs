//! Great-circle math on a spherical Earth.

use crate::types::Point;

/// Earth radius in meters used for all great-circle calculations.
pub const EARTH_RADIUS_METERS: f64 = 6_378_135.0;

/// Great-circle distance between two points, in meters.
///
/// Uses the spherical law of cosines. The intermediate cosine is clamped to
/// `[-1, 1]` before `acos`: floating-point drift can push it fractionally
/// past 1 for identical points, which would otherwise produce NaN. With the
/// clamp, `distance(p, p)` is exactly `0.0`.
///
/// Accuracy is within 0.5% of ellipsoidal geodesic formulas for
/// continental distances, which is ample for ranking and pruning search
/// results.
///
/// # Examples
///
/// ```rust
/// use geocell::{distance, Point};
///
/// let nashville = Point::new(36.12, -86.67)?;
/// let la = Point::new(33.94, -118.40)?;
/// let d = distance(nashville, la);
/// assert!((d - 2_889_677.0).abs() / 2_889_677.0 < 0.005);
/// # Ok::<(), geocell::GeocellError>(())
/// ```
pub fn distance(a: Point, b: Point) -> f64 {
    distance_deg(a.lat(), a.lon(), b.lat(), b.lon())
}

/// Law-of-cosines distance on raw degree coordinates.
pub(crate) fn distance_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let u = phi1.sin() * phi2.sin()
        + phi1.cos() * phi2.cos() * (lon2.to_radians() - lon1.to_radians()).cos();
    EARTH_RADIUS_METERS * u.clamp(-1.0, 1.0).acos()
}
