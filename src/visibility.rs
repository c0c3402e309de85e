use nalgebra::Vector3;

use crate::frames::geodetic_to_ecef;

/// Default elevation mask for target access and station passes, degrees.
pub const DEFAULT_MIN_ELEVATION_DEG: f64 = 10.0;

/// Elevation of the satellite above a ground point's local horizon, degrees.
///
/// The ground point sits at zero altitude on the ellipsoid; its zenith is
/// approximated by its own unit position vector, which is accurate enough
/// for LEO elevation masks.
pub fn elevation_deg(sat_ecef: &Vector3<f64>, target_lat_deg: f64, target_lon_deg: f64) -> f64 {
    let target_ecef = geodetic_to_ecef(target_lat_deg, target_lon_deg, 0.0);

    let range = sat_ecef - target_ecef;
    let zenith = target_ecef / target_ecef.norm();

    // sin(elevation) = (range . zenith) / |range|, clamped against
    // floating-point spill outside [-1, 1]
    let sin_el = (range.dot(&zenith) / range.norm()).clamp(-1.0, 1.0);
    sin_el.asin().to_degrees()
}

/// Line-of-sight test: is the satellite at `sat_ecef` (km) visible from the
/// ground target above `min_elevation_deg`? Returns the verdict and the
/// elevation angle.
pub fn is_visible(
    sat_ecef: &Vector3<f64>,
    target_lat_deg: f64,
    target_lon_deg: f64,
    min_elevation_deg: f64,
) -> (bool, f64) {
    let elevation = elevation_deg(sat_ecef, target_lat_deg, target_lon_deg);
    (elevation >= min_elevation_deg, elevation)
}
