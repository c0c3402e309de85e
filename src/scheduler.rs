use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::access::AccessWindow;

// ---------------------------------------------------------------------------
// Resource cost model (CubeSat-class ratings)
// ---------------------------------------------------------------------------

pub const POWER_IDLE_W: f64 = 1.0;
pub const POWER_IMAGING_W: f64 = 15.0;
pub const POWER_DOWNLINK_W: f64 = 20.0;
pub const DATA_RATE_IMAGING_GBPS: f64 = 0.5;

/// Schedulable action kinds. Only imaging is placed by the scheduler
/// today; downlink and idle exist for the cost model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Imaging,
    Downlink,
    Idle,
}

impl Action {
    pub fn rated_power_w(self) -> f64 {
        match self {
            Action::Imaging => POWER_IMAGING_W,
            Action::Downlink => POWER_DOWNLINK_W,
            Action::Idle => POWER_IDLE_W,
        }
    }
}

/// Energy consumed in watt-hours: rated power times duration in hours.
pub fn energy_cost_wh(action: Action, duration_s: f64) -> f64 {
    action.rated_power_w() * duration_s / 3600.0
}

/// Imager data generated in gigabits: rate times duration in seconds.
pub fn data_volume_gb(duration_s: f64) -> f64 {
    DATA_RATE_IMAGING_GBPS * duration_s
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Terminal per-request outcome of a scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Scheduled,
    RejectedNoWindow,
    RejectedConflict,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("target latitude {0} outside [-90, 90]")]
    LatOutOfRange(f64),
    #[error("target longitude {0} outside [-180, 180]")]
    LonOutOfRange(f64),
    #[error("request window is empty: start {start}, end {end}")]
    EmptyWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// One imaging request. Immutable once created except for the access
/// windows found for it and its terminal scheduling status.
#[derive(Debug, Clone)]
pub struct Request {
    pub request_id: String,
    pub target_lat_deg: f64,
    pub target_lon_deg: f64,
    /// Higher = more urgent.
    pub priority: i32,
    /// Outer bound within which a pass must occur.
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Advisory; not yet enforced by the scheduler.
    pub min_duration_s: f64,
    /// Access windows found by the feasibility search, in search order.
    pub windows: Vec<AccessWindow>,
    pub status: RequestStatus,
}

impl Request {
    pub fn new(
        request_id: impl Into<String>,
        target_lat_deg: f64,
        target_lon_deg: f64,
        priority: i32,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Self, RequestError> {
        if !(-90.0..=90.0).contains(&target_lat_deg) {
            return Err(RequestError::LatOutOfRange(target_lat_deg));
        }
        if !(-180.0..=180.0).contains(&target_lon_deg) {
            return Err(RequestError::LonOutOfRange(target_lon_deg));
        }
        if window_start >= window_end {
            return Err(RequestError::EmptyWindow {
                start: window_start,
                end: window_end,
            });
        }
        Ok(Request {
            request_id: request_id.into(),
            target_lat_deg,
            target_lon_deg,
            priority,
            window_start,
            window_end,
            min_duration_s: 60.0,
            windows: Vec::new(),
            status: RequestStatus::Pending,
        })
    }
}

// ---------------------------------------------------------------------------
// Plan artifacts
// ---------------------------------------------------------------------------

/// One committed schedule entry.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub task_id: String,
    pub action: Action,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub power_cost_wh: f64,
    pub data_cost_gb: f64,
}

/// Terminal artifact of one scheduling pass. Never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct MissionPlan {
    pub request_id: String,
    pub is_feasible: bool,
    pub reason: String,
    pub schedule: Vec<Task>,
}

impl MissionPlan {
    pub fn total_power_cost_wh(&self) -> f64 {
        self.schedule.iter().map(|t| t.power_cost_wh).sum()
    }
}

// ---------------------------------------------------------------------------
// Greedy priority scheduler
// ---------------------------------------------------------------------------

/// Closed-open interval overlap: touching at a boundary is not a conflict.
fn overlaps_any(start: DateTime<Utc>, end: DateTime<Utc>, schedule: &[Task]) -> bool {
    schedule
        .iter()
        .any(|t| start < t.end_time && end > t.start_time)
}

/// Greedy, priority-ordered, conflict-avoiding assignment of requests to
/// a task list.
///
/// Requests are visited in descending priority; ties keep input order
/// (stable sort — the sole tie-break rule). Each request takes the first
/// of its windows that does not overlap any already-committed task, or is
/// marked rejected. Each request's terminal status is written back in
/// place. O(n·w·k) and never revisits an earlier commitment; not
/// globally optimal.
pub fn generate_schedule(requests: &mut [Request], batch_id: &str) -> MissionPlan {
    tracing::info!(batch_id, requests = requests.len(), "scheduling pass started");

    let mut order: Vec<usize> = (0..requests.len()).collect();
    order.sort_by_key(|&i| Reverse(requests[i].priority));

    let mut schedule: Vec<Task> = Vec::new();
    let mut no_window = 0_usize;
    let mut conflicts = 0_usize;

    for &i in &order {
        if requests[i].windows.is_empty() {
            tracing::debug!(request_id = %requests[i].request_id, "rejected: no access window");
            requests[i].status = RequestStatus::RejectedNoWindow;
            no_window += 1;
            continue;
        }

        let placed = requests[i]
            .windows
            .iter()
            .find(|w| !overlaps_any(w.start, w.end, &schedule))
            .cloned();

        match placed {
            Some(w) => {
                let duration_s = w.duration_s();
                schedule.push(Task {
                    task_id: format!("TASK-{}", requests[i].request_id),
                    action: Action::Imaging,
                    start_time: w.start,
                    end_time: w.end,
                    power_cost_wh: energy_cost_wh(Action::Imaging, duration_s),
                    data_cost_gb: data_volume_gb(duration_s),
                });
                tracing::debug!(
                    request_id = %requests[i].request_id,
                    priority = requests[i].priority,
                    "scheduled"
                );
                requests[i].status = RequestStatus::Scheduled;
            }
            None => {
                tracing::debug!(request_id = %requests[i].request_id, "rejected: time conflict");
                requests[i].status = RequestStatus::RejectedConflict;
                conflicts += 1;
            }
        }
    }

    let reason = format!(
        "{} of {} requests scheduled ({} no window, {} conflicts)",
        schedule.len(),
        requests.len(),
        no_window,
        conflicts
    );
    tracing::info!(batch_id, %reason, "scheduling pass complete");

    MissionPlan {
        request_id: batch_id.to_string(),
        is_feasible: true,
        reason,
        schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
    }

    fn window(start_offset_s: i64, end_offset_s: i64) -> AccessWindow {
        AccessWindow {
            start: t0() + Duration::seconds(start_offset_s),
            end: t0() + Duration::seconds(end_offset_s),
        }
    }

    fn request(id: &str, priority: i32, windows: Vec<AccessWindow>) -> Request {
        let mut req = Request::new(id, 12.9716, 77.5946, priority, t0(), t0() + Duration::hours(24))
            .unwrap();
        req.windows = windows;
        req
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(matches!(
            Request::new("R", 95.0, 0.0, 5, t0(), t0() + Duration::hours(1)),
            Err(RequestError::LatOutOfRange(_))
        ));
        assert!(matches!(
            Request::new("R", 0.0, 200.0, 5, t0(), t0() + Duration::hours(1)),
            Err(RequestError::LonOutOfRange(_))
        ));
        assert!(matches!(
            Request::new("R", 0.0, 0.0, 5, t0(), t0()),
            Err(RequestError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn imaging_cost_model() {
        assert!((energy_cost_wh(Action::Imaging, 300.0) - 1.25).abs() < 1e-12);
        assert!((data_volume_gb(300.0) - 150.0).abs() < 1e-12);
        assert_eq!(Action::Downlink.rated_power_w(), 20.0);
        assert_eq!(Action::Idle.rated_power_w(), 1.0);
    }

    #[test]
    fn priority_conflict_scenario() {
        // Priorities [9, 3, 9]; windows [T0,T0+300], [T0+100,T0+400],
        // [T1,T1+300] with T1 far away. Expected: req 1 and req 3
        // scheduled, req 2 conflict-rejected.
        let t1 = 100_000;
        let mut reqs = vec![
            request("001", 9, vec![window(0, 300)]),
            request("002", 3, vec![window(100, 400)]),
            request("003", 9, vec![window(t1, t1 + 300)]),
        ];
        let plan = generate_schedule(&mut reqs, "BATCH-1");

        assert_eq!(plan.schedule.len(), 2);
        assert_eq!(reqs[0].status, RequestStatus::Scheduled);
        assert_eq!(reqs[1].status, RequestStatus::RejectedConflict);
        assert_eq!(reqs[2].status, RequestStatus::Scheduled);
        assert!(plan.is_feasible);
        assert!(plan.reason.contains("2 of 3"));
    }

    #[test]
    fn higher_priority_wins_single_slot() {
        let mut reqs = vec![
            request("LOW", 2, vec![window(0, 300)]),
            request("HIGH", 8, vec![window(0, 300)]),
        ];
        let plan = generate_schedule(&mut reqs, "BATCH-2");
        assert_eq!(plan.schedule.len(), 1);
        assert_eq!(reqs[1].status, RequestStatus::Scheduled);
        assert_eq!(reqs[0].status, RequestStatus::RejectedConflict);
        assert_eq!(plan.schedule[0].task_id, "TASK-HIGH");
    }

    #[test]
    fn priority_ties_keep_input_order() {
        let mut reqs = vec![
            request("FIRST", 7, vec![window(0, 300)]),
            request("SECOND", 7, vec![window(0, 300)]),
        ];
        generate_schedule(&mut reqs, "BATCH-3");
        assert_eq!(reqs[0].status, RequestStatus::Scheduled);
        assert_eq!(reqs[1].status, RequestStatus::RejectedConflict);
    }

    #[test]
    fn touching_windows_do_not_conflict() {
        let mut reqs = vec![
            request("A", 5, vec![window(0, 300)]),
            request("B", 5, vec![window(300, 600)]),
        ];
        let plan = generate_schedule(&mut reqs, "BATCH-4");
        assert_eq!(plan.schedule.len(), 2);
    }

    #[test]
    fn falls_through_to_second_window() {
        let mut reqs = vec![
            request("A", 9, vec![window(0, 300)]),
            request("B", 5, vec![window(100, 400), window(500, 800)]),
        ];
        let plan = generate_schedule(&mut reqs, "BATCH-5");
        assert_eq!(plan.schedule.len(), 2);
        assert_eq!(reqs[1].status, RequestStatus::Scheduled);
        assert_eq!(plan.schedule[1].start_time, t0() + Duration::seconds(500));
    }

    #[test]
    fn no_window_requests_are_rejected_not_fatal() {
        let mut reqs = vec![
            request("EMPTY", 10, vec![]),
            request("OK", 1, vec![window(0, 300)]),
        ];
        let plan = generate_schedule(&mut reqs, "BATCH-6");
        assert_eq!(reqs[0].status, RequestStatus::RejectedNoWindow);
        assert_eq!(reqs[1].status, RequestStatus::Scheduled);
        assert_eq!(plan.schedule.len(), 1);
        assert!(plan.reason.contains("1 no window"));
    }

    #[test]
    fn committed_plan_has_no_overlaps() {
        let mut reqs = vec![
            request("A", 4, vec![window(0, 300)]),
            request("B", 9, vec![window(200, 500)]),
            request("C", 6, vec![window(250, 450), window(600, 900)]),
            request("D", 1, vec![window(100, 700), window(900, 1200)]),
            request("E", 9, vec![window(450, 650)]),
        ];
        let plan = generate_schedule(&mut reqs, "BATCH-7");
        for (i, a) in plan.schedule.iter().enumerate() {
            for b in plan.schedule.iter().skip(i + 1) {
                assert!(
                    a.end_time <= b.start_time || b.end_time <= a.start_time,
                    "tasks {} and {} overlap",
                    a.task_id,
                    b.task_id
                );
            }
        }
    }

    #[test]
    fn task_costs_follow_duration() {
        let mut reqs = vec![request("A", 5, vec![window(0, 300)])];
        let plan = generate_schedule(&mut reqs, "BATCH-8");
        let task = &plan.schedule[0];
        assert!((task.power_cost_wh - 1.25).abs() < 1e-12);
        assert!((task.data_cost_gb - 150.0).abs() < 1e-12);
        assert!((plan.total_power_cost_wh() - 1.25).abs() < 1e-12);
    }
}
