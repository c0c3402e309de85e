use chrono::{DateTime, TimeZone, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mission session configuration: resource capacities plus the initial
/// orbit. Loaded from JSON at session start; [`MissionConfig::default`]
/// provides a compiled-in LEO reference mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionConfig {
    pub power_system: PowerSystem,
    pub storage_system: StorageSystem,
    pub orbit: OrbitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerSystem {
    pub max_battery_capacity_wh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSystem {
    pub max_storage_gb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitConfig {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub epoch: DateTime<Utc>,
}

impl OrbitConfig {
    pub fn position(&self) -> Vector3<f64> {
        Vector3::from(self.position_km)
    }

    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::from(self.velocity_km_s)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse mission config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid mission config: {0}")]
    Invalid(String),
}

impl MissionConfig {
    /// Parse and validate a JSON mission config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MissionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.power_system.max_battery_capacity_wh <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "battery capacity must be positive, got {}",
                self.power_system.max_battery_capacity_wh
            )));
        }
        if self.storage_system.max_storage_gb <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "storage capacity must be positive, got {}",
                self.storage_system.max_storage_gb
            )));
        }
        let r = self.orbit.position().norm();
        if !r.is_finite() || r < crate::orbital::propagator::EARTH_RADIUS_KM {
            return Err(ConfigError::Invalid(format!(
                "initial position radius {:.1} km is inside the Earth",
                r
            )));
        }
        Ok(())
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        // 500 km circular orbit at 51.6 deg, fully charged, empty storage
        let r = crate::orbital::propagator::EARTH_RADIUS_KM + 500.0;
        let v = (crate::orbital::propagator::MU_EARTH / r).sqrt();
        let inc = 51.6_f64.to_radians();
        MissionConfig {
            power_system: PowerSystem {
                max_battery_capacity_wh: 500.0,
            },
            storage_system: StorageSystem { max_storage_gb: 32.0 },
            orbit: OrbitConfig {
                position_km: [r, 0.0, 0.0],
                velocity_km_s: [0.0, v * inc.cos(), v * inc.sin()],
                epoch: Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).single()
                    .unwrap_or_else(Utc::now),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "power_system": { "max_battery_capacity_wh": 500.0 },
        "storage_system": { "max_storage_gb": 32.0 },
        "orbit": {
            "position_km": [6878.137, 0.0, 0.0],
            "velocity_km_s": [0.0, 7.6127, 0.0],
            "epoch": "2024-06-15T00:00:00Z"
        }
    }"#;

    #[test]
    fn parses_valid_config() {
        let config = MissionConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.power_system.max_battery_capacity_wh, 500.0);
        assert_eq!(config.orbit.position().x, 6878.137);
    }

    #[test]
    fn rejects_negative_battery() {
        let bad = SAMPLE.replace("500.0", "-1.0");
        assert!(matches!(
            MissionConfig::from_json_str(&bad),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_subsurface_orbit() {
        let bad = SAMPLE.replace("6878.137", "1000.0");
        assert!(matches!(
            MissionConfig::from_json_str(&bad),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            MissionConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn default_orbit_is_circular_leo() {
        let config = MissionConfig::default();
        let alt = config.orbit.position().norm() - crate::orbital::propagator::EARTH_RADIUS_KM;
        assert!((alt - 500.0).abs() < 1e-6);
        config.validate().unwrap();
    }
}
