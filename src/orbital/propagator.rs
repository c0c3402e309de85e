use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Earth gravity constants (km-based, matching the mission config units)
// ---------------------------------------------------------------------------

pub const MU_EARTH: f64 = 398_600.4418; // km^3/s^2
pub const EARTH_RADIUS_KM: f64 = 6378.137; // equatorial radius
pub const J2_EARTH: f64 = 1.08262668e-3;

// ---------------------------------------------------------------------------
// Orbital state
// ---------------------------------------------------------------------------

/// Translational orbital state (no attitude).
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitState {
    pub pos: Vector3<f64>, // km, ECI
    pub vel: Vector3<f64>, // km/s, ECI
}

impl OrbitState {
    pub fn new(pos: Vector3<f64>, vel: Vector3<f64>) -> Self {
        OrbitState { pos, vel }
    }

    pub fn altitude_km(&self) -> f64 {
        self.pos.norm() - EARTH_RADIUS_KM
    }

    pub fn speed_km_s(&self) -> f64 {
        self.vel.norm()
    }

    /// Specific orbital energy, km^2/s^2. Stays near-constant for a bound
    /// orbit under this force model; a drift check for integrator stability.
    pub fn specific_energy(&self) -> f64 {
        0.5 * self.vel.norm_squared() - MU_EARTH / self.pos.norm()
    }
}

// ---------------------------------------------------------------------------
// Force model: point-mass gravity + J2 oblateness
// ---------------------------------------------------------------------------

/// Acceleration (km/s^2) from point-mass gravity plus the J2 correction.
pub fn j2_acceleration(pos: &Vector3<f64>) -> Vector3<f64> {
    let r = pos.norm();
    if r < 1.0 {
        return Vector3::zeros();
    }
    let r2 = r * r;
    let z2 = pos.z * pos.z;

    let mu_over_r3 = MU_EARTH / (r2 * r);
    let factor = 1.5 * J2_EARTH * (EARTH_RADIUS_KM / r) * (EARTH_RADIUS_KM / r);

    // In-plane and polar components see different J2 scaling
    let txy = 1.0 - 5.0 * z2 / r2;
    let tz = 3.0 - 5.0 * z2 / r2;

    Vector3::new(
        -mu_over_r3 * pos.x * (1.0 + factor * txy),
        -mu_over_r3 * pos.y * (1.0 + factor * txy),
        -mu_over_r3 * pos.z * (1.0 + factor * tz),
    )
}

// ---------------------------------------------------------------------------
// Fixed-step RK4 integration
// ---------------------------------------------------------------------------

/// Classical 4th-order Runge-Kutta step over [pos, vel] with
/// [`j2_acceleration`] as the only force model. No adaptive step control.
pub fn rk4_step(state: &OrbitState, dt: f64) -> OrbitState {
    let k1_r = state.vel;
    let k1_v = j2_acceleration(&state.pos);

    let k2_r = state.vel + k1_v * (dt * 0.5);
    let k2_v = j2_acceleration(&(state.pos + k1_r * (dt * 0.5)));

    let k3_r = state.vel + k2_v * (dt * 0.5);
    let k3_v = j2_acceleration(&(state.pos + k2_r * (dt * 0.5)));

    let k4_r = state.vel + k3_v * dt;
    let k4_v = j2_acceleration(&(state.pos + k3_r * dt));

    OrbitState {
        pos: state.pos + (k1_r + 2.0 * k2_r + 2.0 * k3_r + k4_r) * (dt / 6.0),
        vel: state.vel + (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v) * (dt / 6.0),
    }
}

// ---------------------------------------------------------------------------
// Trajectory: lazy fixed-step sample stream
// ---------------------------------------------------------------------------

/// One trajectory sample: seconds since the initial state, and the state.
#[derive(Debug, Clone)]
pub struct Sample {
    pub t_offset: f64,
    pub state: OrbitState,
}

/// Lazy, finite, fixed-step trajectory. Yields samples at `step` spacing
/// from offset 0 up to (but not including) `duration`. Deterministic:
/// identical inputs give bit-for-bit identical output.
#[derive(Debug, Clone)]
pub struct Trajectory {
    state: OrbitState,
    t: f64,
    duration: f64,
    step: f64,
}

impl Iterator for Trajectory {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.t >= self.duration {
            return None;
        }
        let out = Sample {
            t_offset: self.t,
            state: self.state.clone(),
        };
        self.state = rk4_step(&self.state, self.step);
        self.t += self.step;
        Some(out)
    }
}

/// Propagate from `initial` for `duration_s` seconds at fixed `step_s`.
///
/// A non-positive `step_s` cannot advance the clock and yields an empty
/// trajectory rather than an iterator that never terminates.
pub fn propagate(initial: &OrbitState, duration_s: f64, step_s: f64) -> Trajectory {
    let duration = if step_s > 0.0 {
        duration_s
    } else {
        tracing::warn!(step_s, "non-positive propagation step, yielding empty trajectory");
        0.0
    };
    Trajectory {
        state: initial.clone(),
        t: 0.0,
        duration,
        step: step_s,
    }
}
