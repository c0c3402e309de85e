use nalgebra::Vector3;

use super::propagator::{OrbitState, EARTH_RADIUS_KM, MU_EARTH};

/// Near-zero guard for the node vector, eccentricity, and specific energy.
/// Degenerate (circular/equatorial/parabolic) geometries fall back to
/// defined-zero angles instead of dividing by a vanishing norm.
const DEGENERACY_EPS: f64 = 1e-10;

/// Classical Keplerian orbital elements.
#[derive(Debug, Clone, Copy)]
pub struct KeplerianElements {
    pub sma_km: f64,    // semi-major axis
    pub ecc: f64,       // eccentricity (0 = circular)
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // right ascension of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // true anomaly, rad
}

impl KeplerianElements {
    /// Convert elements to an ECI state vector.
    pub fn to_state_vector(&self) -> OrbitState {
        let p = self.sma_km * (1.0 - self.ecc * self.ecc); // semi-latus rectum
        let r_mag = p / (1.0 + self.ecc * self.true_anom.cos());

        // Position and velocity in the perifocal (PQW) frame
        let r_pqw = Vector3::new(
            r_mag * self.true_anom.cos(),
            r_mag * self.true_anom.sin(),
            0.0,
        );
        let sqrt_mu_p = (MU_EARTH / p).sqrt();
        let v_pqw = Vector3::new(
            -sqrt_mu_p * self.true_anom.sin(),
            sqrt_mu_p * (self.ecc + self.true_anom.cos()),
            0.0,
        );

        let cos_raan = self.raan.cos();
        let sin_raan = self.raan.sin();
        let cos_argp = self.argp.cos();
        let sin_argp = self.argp.sin();
        let cos_inc = self.inc.cos();
        let sin_inc = self.inc.sin();

        let rot = |v: &Vector3<f64>| -> Vector3<f64> {
            Vector3::new(
                (cos_raan * cos_argp - sin_raan * sin_argp * cos_inc) * v.x
                    + (-cos_raan * sin_argp - sin_raan * cos_argp * cos_inc) * v.y,
                (sin_raan * cos_argp + cos_raan * sin_argp * cos_inc) * v.x
                    + (-sin_raan * sin_argp + cos_raan * cos_argp * cos_inc) * v.y,
                (sin_argp * sin_inc) * v.x + (cos_argp * sin_inc) * v.y,
            )
        };

        OrbitState::new(rot(&r_pqw), rot(&v_pqw))
    }

    /// Derive elements from an ECI state vector.
    pub fn from_state_vector(state: &OrbitState) -> Self {
        let r = state.pos.norm();
        let v = state.vel.norm();

        // Specific angular momentum and node vector
        let h = state.pos.cross(&state.vel);
        let h_mag = h.norm();
        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();

        // Eccentricity vector
        let e_vec =
            ((v * v - MU_EARTH / r) * state.pos - state.pos.dot(&state.vel) * state.vel) / MU_EARTH;
        let ecc = e_vec.norm();

        // Specific energy; near-parabolic states have no finite sma
        let energy = 0.5 * v * v - MU_EARTH / r;
        let sma_km = if energy.abs() < DEGENERACY_EPS {
            f64::INFINITY
        } else {
            -MU_EARTH / (2.0 * energy)
        };

        let inc = (h.z / h_mag).clamp(-1.0, 1.0).acos();

        let raan = if n_mag > DEGENERACY_EPS {
            let a = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 { 2.0 * std::f64::consts::PI - a } else { a }
        } else {
            0.0
        };

        let argp = if n_mag > DEGENERACY_EPS && ecc > DEGENERACY_EPS {
            let cos_argp = (n.dot(&e_vec) / (n_mag * ecc)).clamp(-1.0, 1.0);
            let w = cos_argp.acos();
            if e_vec.z < 0.0 { 2.0 * std::f64::consts::PI - w } else { w }
        } else {
            0.0
        };

        let true_anom = if ecc > DEGENERACY_EPS {
            let cos_nu = (e_vec.dot(&state.pos) / (ecc * r)).clamp(-1.0, 1.0);
            let nu = cos_nu.acos();
            if state.pos.dot(&state.vel) < 0.0 {
                2.0 * std::f64::consts::PI - nu
            } else {
                nu
            }
        } else {
            0.0
        };

        KeplerianElements {
            sma_km,
            ecc,
            inc,
            raan,
            argp,
            true_anom,
        }
    }

    /// Orbital period for a bound orbit, s.
    pub fn period_s(&self) -> f64 {
        2.0 * std::f64::consts::PI * (self.sma_km.powi(3) / MU_EARTH).sqrt()
    }

    /// Circular orbit at given altitude (km) and inclination (rad).
    pub fn circular(altitude_km: f64, inc: f64) -> Self {
        KeplerianElements {
            sma_km: EARTH_RADIUS_KM + altitude_km,
            ecc: 0.0,
            inc,
            raan: 0.0,
            argp: 0.0,
            true_anom: 0.0,
        }
    }
}
