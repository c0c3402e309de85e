use chrono::Duration;
use tracing_subscriber::EnvFilter;

use leo_sched::scheduler::RequestStatus;
use leo_sched::visibility::DEFAULT_MIN_ELEVATION_DEG;
use leo_sched::{
    build_telemetry_frame, find_access_windows, generate_schedule, predict_passes, validate_plan,
    Decision, KeplerianElements, MissionConfig, Request, SatelliteState, GROUND_STATIONS,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // -----------------------------------------------------------------------
    // Satellite session
    // -----------------------------------------------------------------------
    let config = MissionConfig::default();
    let mut sat = SatelliteState::new(config);
    let health = sat.snapshot();

    println!();
    println!("====================================================================");
    println!("  LEO MISSION PLANNING — imaging tasking demo");
    println!("====================================================================");
    println!();
    println!("  Satellite Status");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Epoch:     {}    Altitude:  {:>8.1} km",
        health.timestamp, health.alt_km
    );
    let elements = KeplerianElements::from_state_vector(sat.orbit_state());
    println!(
        "  Orbit:     a={:.1} km  e={:.4}  i={:.1} deg  period {:.1} min",
        elements.sma_km,
        elements.ecc,
        elements.inc.to_degrees(),
        elements.period_s() / 60.0
    );
    println!(
        "  Battery:   {:>8.1} Wh ({:.0}%)   Storage: {:>6.1} Gb ({:.0}%)",
        health.battery_wh, health.battery_pct, health.storage_gb, health.storage_pct
    );
    println!();

    // -----------------------------------------------------------------------
    // Imaging requests and feasibility search
    // -----------------------------------------------------------------------
    let start = sat.epoch();
    let end = start + Duration::hours(24);

    let targets = [
        ("REQ-001", "Bangalore", 12.9716, 77.5946, 5),
        ("REQ-002", "Delhi", 28.7041, 77.1025, 9),
        ("REQ-003", "Mumbai", 19.0760, 72.8777, 3),
        ("REQ-004", "Tromso", 69.6628, 18.9408, 7),
    ];

    let mut requests = Vec::new();
    for (id, name, lat, lon, priority) in targets {
        match Request::new(id, lat, lon, priority, start, end) {
            Ok(mut req) => {
                req.windows = find_access_windows(
                    sat.orbit_state(),
                    req.window_start,
                    req.window_end,
                    req.target_lat_deg,
                    req.target_lon_deg,
                    DEFAULT_MIN_ELEVATION_DEG,
                    60.0,
                );
                println!(
                    "  {}  {:<10} (prio {})  {:>2} access window(s)",
                    req.request_id,
                    name,
                    req.priority,
                    req.windows.len()
                );
                requests.push(req);
            }
            Err(e) => println!("  {}  {:<10} rejected at boundary: {}", id, name, e),
        }
    }
    println!();

    // -----------------------------------------------------------------------
    // Schedule, gate, and commit
    // -----------------------------------------------------------------------
    let plan = generate_schedule(&mut requests, "BATCH-001");

    println!("  Mission Plan ({})", plan.request_id);
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  {}", plan.reason);
    for task in &plan.schedule {
        println!(
            "  {:<14} {:?}  {} -> {}  {:>6.2} Wh  {:>7.1} Gb",
            task.task_id,
            task.action,
            task.start_time.format("%H:%M:%S"),
            task.end_time.format("%H:%M:%S"),
            task.power_cost_wh,
            task.data_cost_gb
        );
    }
    for req in &requests {
        if req.status != RequestStatus::Scheduled {
            println!("  {:<14} {:?}", req.request_id, req.status);
        }
    }
    println!();

    match validate_plan(&plan, &sat) {
        Decision::Approved { power_margin_wh } => {
            println!("  Decision: APPROVED (power margin {:.2} Wh)", power_margin_wh);
            for task in &plan.schedule {
                sat.debit(task.power_cost_wh, task.data_cost_gb);
            }
        }
        Decision::Rejected { reason } => {
            println!("  Decision: REJECTED ({})", reason);
        }
    }
    println!();

    // -----------------------------------------------------------------------
    // Ground-station passes over the next 24 h
    // -----------------------------------------------------------------------
    let passes = predict_passes(
        sat.orbit_state(),
        sat.epoch(),
        24.0 * 3600.0,
        DEFAULT_MIN_ELEVATION_DEG,
        GROUND_STATIONS,
    );

    println!("  Ground-Station Passes (next 24 h)");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:<18} {:>8}  {:>8}  {:>8}  {:>9}",
        "station", "AOS", "LOS", "dur (s)", "max el"
    );
    for p in passes.iter().take(12) {
        println!(
            "  {:<18} {:>8}  {:>8}  {:>8.0}  {:>8.1}°",
            p.station_name,
            p.aos_time.format("%H:%M:%S"),
            p.los_time.format("%H:%M:%S"),
            p.duration_s,
            p.max_elevation_deg
        );
    }
    println!();

    // -----------------------------------------------------------------------
    // Advance the clock and emit a telemetry frame
    // -----------------------------------------------------------------------
    sat.tick(600.0);
    let frame = build_telemetry_frame(&sat.snapshot());
    match serde_json::to_string_pretty(&frame) {
        Ok(json) => {
            println!("  Telemetry frame after 600 s tick");
            println!("  ──────────────────────────────────────────────────────────────────");
            println!("{}", json);
        }
        Err(e) => tracing::error!(error = %e, "telemetry serialization failed"),
    }
    println!();
    println!("====================================================================");
}
