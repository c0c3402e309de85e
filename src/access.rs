use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::frames::eci_to_ecef;
use crate::orbital::propagator::{propagate, OrbitState, Sample};
use crate::visibility::is_visible;

/// Search step for per-target access windows, s.
pub const DEFAULT_ACCESS_STEP_S: f64 = 60.0;
/// Search step for ground-station pass prediction, s.
pub const DEFAULT_PASS_STEP_S: f64 = 30.0;

// ---------------------------------------------------------------------------
// Access windows (per imaging target)
// ---------------------------------------------------------------------------

/// A contiguous interval of visibility, half-open at the step boundary
/// where visibility toggles. Always `start < end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AccessWindow {
    pub fn duration_s(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }
}

fn offset_time(start: DateTime<Utc>, t_offset: f64) -> DateTime<Utc> {
    start + Duration::milliseconds((t_offset * 1000.0).round() as i64)
}

/// Find visibility windows for one ground target across a search horizon.
///
/// Propagates `initial` (valid at `search_start`) across the horizon,
/// rotates each sample into the Earth-fixed frame, and edge-detects the
/// visibility flag: a window opens on a false→true transition and closes
/// on the next true→false one. A window still open at the horizon end is
/// dropped, not truncated — only station passes get closed at the horizon
/// (see [`predict_passes`]). Window boundaries carry up to one `step_s`
/// of quantization error; there is no sub-step AOS/LOS refinement.
pub fn find_access_windows(
    initial: &OrbitState,
    search_start: DateTime<Utc>,
    search_end: DateTime<Utc>,
    target_lat_deg: f64,
    target_lon_deg: f64,
    min_elevation_deg: f64,
    step_s: f64,
) -> Vec<AccessWindow> {
    let duration_s = (search_end - search_start).num_milliseconds() as f64 / 1000.0;

    let mut windows = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;

    for sample in propagate(initial, duration_s, step_s) {
        let t = offset_time(search_start, sample.t_offset);
        let r_ecef = eci_to_ecef(&sample.state.pos, t);
        let (visible, _) = is_visible(&r_ecef, target_lat_deg, target_lon_deg, min_elevation_deg);

        match (visible, open) {
            (true, None) => open = Some(t),
            (false, Some(start)) => {
                windows.push(AccessWindow { start, end: t });
                open = None;
            }
            _ => {}
        }
    }

    tracing::debug!(
        target_lat_deg,
        target_lon_deg,
        windows = windows.len(),
        "access search complete"
    );
    windows
}

// ---------------------------------------------------------------------------
// Ground-station catalog and pass prediction
// ---------------------------------------------------------------------------

/// A fixed ground-station catalog entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GroundStation {
    pub name: &'static str,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub country: &'static str,
}

/// Built-in station catalog. Adding or removing entries needs no logic
/// change anywhere else.
pub const GROUND_STATIONS: &[GroundStation] = &[
    GroundStation { name: "ISTRAC Bangalore", lat_deg: 13.0340, lon_deg: 77.5116, country: "India" },
    GroundStation { name: "ISRO Lucknow", lat_deg: 26.9124, lon_deg: 80.9462, country: "India" },
    GroundStation { name: "Svalbard SvalSat", lat_deg: 78.2307, lon_deg: 15.3976, country: "Norway" },
    GroundStation { name: "KSAT Tromso", lat_deg: 69.6628, lon_deg: 18.9408, country: "Norway" },
    GroundStation { name: "NASA Wallops", lat_deg: 37.9402, lon_deg: -75.4664, country: "USA" },
];

/// A predicted contact with a ground station. Mirrors [`AccessWindow`]
/// plus the peak elevation seen inside the window.
#[derive(Debug, Clone, Serialize)]
pub struct Pass {
    pub station_name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub country: String,
    pub aos_time: DateTime<Utc>,
    pub los_time: DateTime<Utc>,
    pub duration_s: f64,
    pub max_elevation_deg: f64,
}

/// Predict contact windows for every station in `stations` over
/// `duration_s` seconds from `epoch`, sorted by AOS.
///
/// Same edge detection as [`find_access_windows`], run once per station
/// over a single shared trajectory, additionally tracking the running
/// maximum elevation. Unlike the per-target search, a pass still open at
/// the horizon is closed there and reported.
pub fn predict_passes(
    initial: &OrbitState,
    epoch: DateTime<Utc>,
    duration_s: f64,
    min_elevation_deg: f64,
    stations: &[GroundStation],
) -> Vec<Pass> {
    let trajectory: Vec<Sample> = propagate(initial, duration_s, DEFAULT_PASS_STEP_S).collect();
    let horizon = offset_time(epoch, duration_s);

    let mut passes = Vec::new();

    for station in stations {
        let mut open: Option<DateTime<Utc>> = None;
        let mut max_elev = 0.0_f64;

        for sample in &trajectory {
            let t = offset_time(epoch, sample.t_offset);
            let r_ecef = eci_to_ecef(&sample.state.pos, t);
            let (visible, elevation) =
                is_visible(&r_ecef, station.lat_deg, station.lon_deg, min_elevation_deg);

            match (visible, open) {
                (true, None) => {
                    open = Some(t);
                    max_elev = elevation;
                }
                (true, Some(_)) => max_elev = max_elev.max(elevation),
                (false, Some(aos)) => {
                    passes.push(make_pass(station, aos, t, max_elev));
                    open = None;
                }
                (false, None) => {}
            }
        }

        // Close any pass still in progress at the end of the horizon
        if let Some(aos) = open {
            passes.push(make_pass(station, aos, horizon, max_elev));
        }
    }

    passes.sort_by_key(|p| p.aos_time);
    tracing::info!(passes = passes.len(), stations = stations.len(), "pass prediction complete");
    passes
}

fn make_pass(
    station: &GroundStation,
    aos: DateTime<Utc>,
    los: DateTime<Utc>,
    max_elevation_deg: f64,
) -> Pass {
    Pass {
        station_name: station.name.to_string(),
        lat_deg: station.lat_deg,
        lon_deg: station.lon_deg,
        country: station.country.to_string(),
        aos_time: aos,
        los_time: los,
        duration_s: (los - aos).num_milliseconds() as f64 / 1000.0,
        max_elevation_deg,
    }
}
