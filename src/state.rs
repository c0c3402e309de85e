use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;
use serde::Serialize;

use crate::config::MissionConfig;
use crate::frames::{eci_to_ecef, ecef_to_geodetic};
use crate::orbital::propagator::{rk4_step, OrbitState, EARTH_RADIUS_KM};

/// Fixed sub-step used when a tick spans more than one integration step,
/// keeping advanced trajectories reproducible for a given dt.
const TICK_STEP_S: f64 = 60.0;

// ---------------------------------------------------------------------------
// Satellite session state
// ---------------------------------------------------------------------------

/// Live satellite state for one mission session: kinematics (position,
/// velocity, epoch) plus the resource ledger (battery, storage).
///
/// Kinematics advance only through [`tick`](Self::tick) or an explicit
/// [`set_kinematics`](Self::set_kinematics) override from an external
/// ephemeris source; the ledger moves only through
/// [`debit`](Self::debit). Mutations take `&mut self`, so a shared
/// instance behind a lock gets the single-writer discipline for free;
/// [`snapshot`](Self::snapshot) is a pure read.
#[derive(Debug, Clone)]
pub struct SatelliteState {
    config: MissionConfig,
    kinematics: OrbitState,
    epoch: DateTime<Utc>,
    battery_wh: f64,
    storage_gb: f64,
}

impl SatelliteState {
    /// Create a session at full battery and empty storage, positioned at
    /// the configured initial orbit.
    pub fn new(config: MissionConfig) -> Self {
        let kinematics = OrbitState::new(config.orbit.position(), config.orbit.velocity());
        let epoch = config.orbit.epoch;
        let battery_wh = config.power_system.max_battery_capacity_wh;
        SatelliteState {
            config,
            kinematics,
            epoch,
            battery_wh,
            storage_gb: 0.0,
        }
    }

    /// Discard the live state and recreate it from the config defaults.
    pub fn reset(&mut self) {
        tracing::info!("resetting satellite state to config defaults");
        *self = SatelliteState::new(self.config.clone());
    }

    pub fn orbit_state(&self) -> &OrbitState {
        &self.kinematics
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn battery_wh(&self) -> f64 {
        self.battery_wh
    }

    pub fn storage_gb(&self) -> f64 {
        self.storage_gb
    }

    /// Advance the simulated clock by `dt_s` seconds, integrating the
    /// kinematic state forward in fixed sub-steps.
    pub fn tick(&mut self, dt_s: f64) {
        if dt_s <= 0.0 {
            return;
        }
        let mut remaining = dt_s;
        while remaining > TICK_STEP_S {
            self.kinematics = rk4_step(&self.kinematics, TICK_STEP_S);
            remaining -= TICK_STEP_S;
        }
        self.kinematics = rk4_step(&self.kinematics, remaining);
        self.epoch += Duration::milliseconds((dt_s * 1000.0).round() as i64);
        tracing::debug!(dt_s, epoch = %self.epoch, "tick");
    }

    /// Overwrite the kinematic state from an external ephemeris source
    /// (e.g. an analytic element set evaluated at `epoch`).
    pub fn set_kinematics(&mut self, pos: Vector3<f64>, vel: Vector3<f64>, epoch: DateTime<Utc>) {
        self.kinematics = OrbitState::new(pos, vel);
        self.epoch = epoch;
    }

    /// Apply the resource cost of one committed task. Never fails:
    /// both ledger fields clamp at their [0, capacity] bounds. Callers
    /// needing hard rejection must check affordability beforehand.
    pub fn debit(&mut self, power_cost_wh: f64, data_cost_gb: f64) {
        let max_battery = self.config.power_system.max_battery_capacity_wh;
        let max_storage = self.config.storage_system.max_storage_gb;
        self.battery_wh = (self.battery_wh - power_cost_wh).clamp(0.0, max_battery);
        self.storage_gb = (self.storage_gb + data_cost_gb).clamp(0.0, max_storage);
        tracing::debug!(
            power_cost_wh,
            data_cost_gb,
            battery_wh = self.battery_wh,
            storage_gb = self.storage_gb,
            "resource debit"
        );
    }

    /// Read-only health snapshot: geodetic position derived from the
    /// current kinematics plus the resource ledger. Does not advance
    /// time — the epoch stays authoritative, and concurrent readers see
    /// identical snapshots between ticks.
    pub fn snapshot(&self) -> HealthSnapshot {
        let r_ecef = eci_to_ecef(&self.kinematics.pos, self.epoch);
        let geo = ecef_to_geodetic(&r_ecef);
        let max_battery = self.config.power_system.max_battery_capacity_wh;
        let max_storage = self.config.storage_system.max_storage_gb;

        HealthSnapshot {
            timestamp: self.epoch,
            position_km: self.kinematics.pos.into(),
            velocity_km_s: self.kinematics.vel.into(),
            lat_deg: geo.lat_deg,
            lon_deg: geo.lon_deg,
            alt_km: geo.alt_km,
            battery_wh: self.battery_wh,
            battery_pct: self.battery_wh / max_battery * 100.0,
            storage_gb: self.storage_gb,
            storage_pct: self.storage_gb / max_storage * 100.0,
            max_battery_wh: max_battery,
            max_storage_gb: max_storage,
        }
    }
}

/// Point-in-time health record derived from [`SatelliteState::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
    pub battery_wh: f64,
    pub battery_pct: f64,
    pub storage_gb: f64,
    pub storage_pct: f64,
    pub max_battery_wh: f64,
    pub max_storage_gb: f64,
}

// ---------------------------------------------------------------------------
// Telemetry frame (FDIR consumer input)
// ---------------------------------------------------------------------------

/// One downstream telemetry frame. The subsystem fields at the bottom are
/// constant placeholders until real subsystem models exist.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryFrame {
    pub timestamp: DateTime<Utc>,
    pub position_eci: [f64; 3],
    pub velocity_eci: [f64; 3],
    pub altitude_km: f64,
    pub speed_km_s: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub battery_wh: f64,
    pub battery_pct: f64,
    pub storage_used_gb: f64,
    pub storage_pct: f64,
    pub max_battery_wh: f64,
    pub max_storage_gb: f64,
    pub temperature_c: f64,
    pub attitude_quaternion: [f64; 4],
    pub solar_panel_current_a: f64,
    pub mode: &'static str,
}

/// Build a telemetry frame from a health snapshot.
pub fn build_telemetry_frame(snapshot: &HealthSnapshot) -> TelemetryFrame {
    let [x, y, z] = snapshot.position_km;
    let [vx, vy, vz] = snapshot.velocity_km_s;
    let r = (x * x + y * y + z * z).sqrt();

    TelemetryFrame {
        timestamp: snapshot.timestamp,
        position_eci: snapshot.position_km,
        velocity_eci: snapshot.velocity_km_s,
        altitude_km: r - EARTH_RADIUS_KM,
        speed_km_s: (vx * vx + vy * vy + vz * vz).sqrt(),
        latitude: snapshot.lat_deg,
        longitude: snapshot.lon_deg,
        battery_wh: snapshot.battery_wh,
        battery_pct: snapshot.battery_pct,
        storage_used_gb: snapshot.storage_gb,
        storage_pct: snapshot.storage_pct,
        max_battery_wh: snapshot.max_battery_wh,
        max_storage_gb: snapshot.max_storage_gb,
        temperature_c: 20.0,
        attitude_quaternion: [1.0, 0.0, 0.0, 0.0],
        solar_panel_current_a: 1.5,
        mode: "NOMINAL",
    }
}
