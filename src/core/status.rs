//! Threshold classification shared by department cards, heatmap cells and
//! alert generation.

use crate::models::{AlertKind, Department, Status};

/// Wait time (minutes) at or above which a wait alert is critical.
pub const WAIT_TIME_CRITICAL_MINUTES: f64 = 60.0;
/// Wait time (minutes) at or above which a wait alert is a warning.
pub const WAIT_TIME_WARNING_MINUTES: f64 = 30.0;

/// Classify an occupancy percentage. Both thresholds are inclusive lower
/// bounds and critical is checked first.
pub fn classify_status(occupancy: f64, warning_threshold: f64, critical_threshold: f64) -> Status {
    if occupancy >= critical_threshold {
        Status::Critical
    } else if occupancy >= warning_threshold {
        Status::Warning
    } else {
        Status::Normal
    }
}

pub fn department_status(department: &Department, occupancy: f64) -> Status {
    classify_status(occupancy, department.warning_threshold, department.critical_threshold)
}

/// Capacity alert for a department at the given occupancy, if any.
pub fn capacity_alert_kind(department: &Department, occupancy: f64) -> Option<AlertKind> {
    match department_status(department, occupancy) {
        Status::Critical => Some(AlertKind::CapacityCritical),
        Status::Warning => Some(AlertKind::CapacityWarning),
        Status::Normal => None,
    }
}

/// Wait-time alert for the given wait. The breakpoints are fixed and do not
/// follow the department's occupancy thresholds.
pub fn wait_time_alert_kind(wait_time: f64) -> Option<AlertKind> {
    if wait_time >= WAIT_TIME_CRITICAL_MINUTES {
        Some(AlertKind::WaitTimeCritical)
    } else if wait_time >= WAIT_TIME_WARNING_MINUTES {
        Some(AlertKind::WaitTimeWarning)
    } else {
        None
    }
}

/// Hospital-wide capacity label shown under the average occupancy KPI.
pub fn capacity_label(avg_occupancy: i64) -> &'static str {
    if avg_occupancy >= 85 {
        "High Capacity"
    } else if avg_occupancy >= 70 {
        "Moderate"
    } else {
        "Normal"
    }
}

pub fn wait_time_within_target(avg_wait_time: i64) -> bool {
    avg_wait_time as f64 <= WAIT_TIME_WARNING_MINUTES
}
