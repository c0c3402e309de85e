use serde::Serialize;

use crate::scheduler::MissionPlan;
use crate::state::SatelliteState;

/// Outcome of the affordability gate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved { power_margin_wh: f64 },
    Rejected { reason: String },
}

/// Final safety check layered above the scheduler: reject a plan whose
/// aggregate power cost exceeds the current battery. Deliberately not
/// part of [`generate_schedule`](crate::scheduler::generate_schedule),
/// which stays a pure allocation algorithm.
pub fn validate_plan(plan: &MissionPlan, state: &SatelliteState) -> Decision {
    if !plan.is_feasible {
        return Decision::Rejected {
            reason: plan.reason.clone(),
        };
    }

    let total_power_wh = plan.total_power_cost_wh();
    let battery_wh = state.battery_wh();

    if total_power_wh > battery_wh {
        tracing::warn!(
            total_power_wh,
            battery_wh,
            "plan rejected: insufficient power"
        );
        return Decision::Rejected {
            reason: "INSUFFICIENT_POWER".to_string(),
        };
    }

    let power_margin_wh = battery_wh - total_power_wh;
    tracing::info!(power_margin_wh, "plan approved");
    Decision::Approved { power_margin_wh }
}
