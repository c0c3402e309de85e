use chrono::{DateTime, Datelike, Timelike, Utc};
use nalgebra::Vector3;
use serde::Serialize;

// ---------------------------------------------------------------------------
// WGS-84 ellipsoid
// ---------------------------------------------------------------------------

pub const WGS84_A: f64 = 6378.137; // semi-major axis, km
pub const WGS84_F: f64 = 1.0 / 298.257223563; // flattening
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F); // first eccentricity squared
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F); // semi-minor axis, km

/// Geodetic latitude iteration: convergence tolerance (rad) and hard cap.
/// The cap makes degenerate inputs terminate with a best-effort result
/// instead of spinning.
const GEODETIC_TOL: f64 = 1e-6;
const GEODETIC_MAX_ITERS: usize = 32;

// ---------------------------------------------------------------------------
// Time: Julian date and Greenwich mean sidereal time
// ---------------------------------------------------------------------------

/// Julian date from a UTC timestamp.
pub fn julian_date(t: DateTime<Utc>) -> f64 {
    let year = t.year() as f64;
    let month = t.month() as f64;
    let day = t.day() as f64;
    let sec = t.second() as f64 + t.nanosecond() as f64 / 1e9;

    // Universal time in hours
    let ut = t.hour() as f64 + t.minute() as f64 / 60.0 + sec / 3600.0;

    let ee = ((month + 9.0) / 12.0).floor();

    367.0 * year - (7.0 * (year + ee) / 4.0).floor() + (275.0 * month / 9.0).floor()
        + day
        + 1_721_013.5
        + ut / 24.0
}

/// Greenwich mean sidereal time (rad), normalized to [0, 2π).
///
/// IAU mean-sidereal-time polynomial evaluated at the preceding midnight,
/// plus the rotation accumulated since.
pub fn gmst(t: DateTime<Utc>) -> f64 {
    let jd = julian_date(t);

    let jd_mid = jd.floor() + 0.5;
    let ut_sec = (jd - jd_mid) * 86_400.0;

    let tc = (jd - 2_451_545.0) / 36_525.0;
    let t0 = (jd_mid - 2_451_545.0) / 36_525.0;

    let gmst_sec = 24_110.54841 + 8_640_184.812866 * t0 + 1.002737909350795 * ut_sec
        + 0.093104 * tc * tc
        - 6.2e-6 * tc * tc * tc;

    let mut wrapped = gmst_sec % 86_400.0;
    if wrapped < 0.0 {
        wrapped += 86_400.0;
    }

    // 240 seconds of sidereal time per degree
    (wrapped / 240.0).to_radians()
}

// ---------------------------------------------------------------------------
// Frame rotations and geodetic conversion
// ---------------------------------------------------------------------------

/// Rotate an ECI position into the Earth-fixed (ECEF) frame.
///
/// Earth-rotation-only model: a Z-axis rotation by GMST. The whole
/// pipeline holds this fidelity level; no precession/nutation anywhere.
pub fn eci_to_ecef(r_eci: &Vector3<f64>, t: DateTime<Utc>) -> Vector3<f64> {
    let theta = gmst(t);
    let (s, c) = theta.sin_cos();
    Vector3::new(
        c * r_eci.x + s * r_eci.y,
        -s * r_eci.x + c * r_eci.y,
        r_eci.z,
    )
}

/// Geodetic coordinates on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Geodetic {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
}

/// Prime-vertical radius of curvature N(lat), km.
fn prime_vertical_radius(lat: f64) -> f64 {
    WGS84_A / (1.0 - WGS84_E2 * lat.sin() * lat.sin()).sqrt()
}

/// Convert an ECEF position (km) to geodetic lat/lon/alt.
///
/// Iterative latitude solve, capped at [`GEODETIC_MAX_ITERS`]; if the
/// cap is hit the last iterate is returned as a best-effort answer.
pub fn ecef_to_geodetic(r_ecef: &Vector3<f64>) -> Geodetic {
    let r_xy = (r_ecef.x * r_ecef.x + r_ecef.y * r_ecef.y).sqrt();
    let lon = r_ecef.y.atan2(r_ecef.x);

    let mut lat = r_ecef.z.atan2(r_xy);
    let mut converged = false;
    for _ in 0..GEODETIC_MAX_ITERS {
        let n = prime_vertical_radius(lat);
        let next = (r_ecef.z + WGS84_E2 * n * lat.sin()).atan2(r_xy);
        let done = (next - lat).abs() < GEODETIC_TOL;
        lat = next;
        if done {
            converged = true;
            break;
        }
    }
    if !converged {
        tracing::warn!(
            x = r_ecef.x,
            y = r_ecef.y,
            z = r_ecef.z,
            "geodetic latitude iteration hit cap, returning last iterate"
        );
    }

    // At the poles r_xy vanishes and r_xy/cos(lat) degenerates to 0/eps,
    // so altitude comes off the semi-minor axis instead.
    let alt_km = if r_xy < 1e-6 {
        r_ecef.z.abs() - WGS84_B
    } else {
        r_xy / lat.cos() - prime_vertical_radius(lat)
    };

    Geodetic {
        lat_deg: lat.to_degrees(),
        lon_deg: lon.to_degrees(),
        alt_km,
    }
}

/// Convert geodetic lat/lon/alt to an ECEF position (km). Closed form.
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, alt_km: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let n = prime_vertical_radius(lat);

    Vector3::new(
        (n + alt_km) * lat.cos() * lon.cos(),
        (n + alt_km) * lat.cos() * lon.sin(),
        (n * (1.0 - WGS84_E2) + alt_km) * lat.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn julian_date_j2000() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_date(t) - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn julian_date_increases_with_time() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let dj = julian_date(t1) - julian_date(t0);
        assert!((dj - 0.25).abs() < 1e-9, "6 hours should be 0.25 days, got {}", dj);
    }

    #[test]
    fn gmst_in_range() {
        let t = Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap();
        let theta = gmst(t);
        assert!(theta >= 0.0 && theta < 2.0 * std::f64::consts::PI);
    }

    #[test]
    fn gmst_advances_faster_than_solar_time() {
        // Sidereal day is ~4 min shorter than a solar day: after exactly
        // 24 h the sidereal angle should have gained ~0.9856 deg.
        let t0 = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 6, 16, 0, 0, 0).unwrap();
        let mut gain = gmst(t1) - gmst(t0);
        if gain < 0.0 {
            gain += 2.0 * std::f64::consts::PI;
        }
        let expected = 0.9856_f64.to_radians();
        assert!((gain - expected).abs() < 1e-3, "sidereal gain {:.5} rad", gain);
    }

    #[test]
    fn equator_prime_meridian_radius() {
        let r = geodetic_to_ecef(0.0, 0.0, 0.0);
        assert!((r.x - WGS84_A).abs() < 1e-9);
        assert!(r.y.abs() < 1e-9);
        assert!(r.z.abs() < 1e-9);
    }

    #[test]
    fn geodetic_roundtrip() {
        for &(lat, lon, alt) in &[
            (0.0, 0.0, 0.0),
            (12.9716, 77.5946, 0.0),
            (-33.8688, 151.2093, 1.5),
            (78.2307, 15.3976, 0.4),
            (-89.0, -180.0, 2000.0),
            (89.0, 179.9, 400.0),
        ] {
            let ecef = geodetic_to_ecef(lat, lon, alt);
            let geo = ecef_to_geodetic(&ecef);
            assert!((geo.lat_deg - lat).abs() < 1e-4, "lat mismatch at {}", lat);
            // Longitude wraps at ±180
            let mut dlon = (geo.lon_deg - lon).abs();
            if dlon > 180.0 {
                dlon = 360.0 - dlon;
            }
            assert!(dlon < 1e-4, "lon mismatch at {}", lon);
            assert!((geo.alt_km - alt).abs() < 1e-3, "alt mismatch at {}", alt);
        }
    }

    #[test]
    fn polar_altitude_comes_off_semi_minor_axis() {
        let north = Vector3::new(0.0, 0.0, WGS84_B + 400.0);
        let geo = ecef_to_geodetic(&north);
        assert!((geo.lat_deg - 90.0).abs() < 1e-9);
        assert!((geo.alt_km - 400.0).abs() < 1e-9);

        let south = Vector3::new(0.0, 0.0, -(WGS84_B + 250.0));
        let geo = ecef_to_geodetic(&south);
        assert!((geo.lat_deg + 90.0).abs() < 1e-9);
        assert!((geo.alt_km - 250.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_terminate_with_finite_result() {
        // The latitude iteration is capped; even inputs with no meaningful
        // geodetic answer must return promptly with finite fields.
        let degenerate = [
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::new(1e-9, 0.0, 7000.0),
        ];
        for v in &degenerate {
            let geo = ecef_to_geodetic(v);
            assert!(geo.lat_deg.is_finite());
            assert!(geo.lon_deg.is_finite());
            assert!(geo.alt_km.is_finite());
        }
    }

    #[test]
    fn eci_to_ecef_preserves_norm_and_z() {
        let t = Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap();
        let r_eci = Vector3::new(6778.0, 100.0, 1200.0);
        let r_ecef = eci_to_ecef(&r_eci, t);
        assert!((r_ecef.norm() - r_eci.norm()).abs() < 1e-9);
        assert!((r_ecef.z - r_eci.z).abs() < 1e-12);
    }
}
