pub mod access;
pub mod config;
pub mod decision;
pub mod frames;
pub mod orbital;
pub mod scheduler;
pub mod state;
pub mod visibility;

pub use access::{find_access_windows, predict_passes, AccessWindow, Pass, GROUND_STATIONS};
pub use config::MissionConfig;
pub use decision::{validate_plan, Decision};
pub use orbital::{propagate, KeplerianElements, OrbitState};
pub use scheduler::{generate_schedule, MissionPlan, Request, RequestStatus, Task};
pub use state::{build_telemetry_frame, SatelliteState};
