use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::metrics::{
    calculate_trend, compute_hospital_aggregate, department_views, generate_alerts, metric_series,
    occupancy_heatmap,
};
use crate::core::status::{capacity_label, wait_time_within_target};
use crate::models::{
    Alert, Dataset, DepartmentView, HeatmapRow, HospitalAggregate, Metric, SeriesPoint, Trend,
};

/// Hours of history shown by the charts and the heatmap.
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Hour-over-hour trends for the headline KPIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiTrends {
    pub total_patients: Trend,
    pub avg_occupancy: Trend,
    pub avg_wait_time: Trend,
    pub total_admissions: Trend,
    pub total_discharges: Trend,
}

impl KpiTrends {
    pub fn between(current: &HospitalAggregate, previous: &HospitalAggregate) -> Self {
        let trend = |now: i64, before: i64| calculate_trend(now as f64, before as f64);
        Self {
            total_patients: trend(current.total_patients, previous.total_patients),
            avg_occupancy: trend(current.avg_occupancy, previous.avg_occupancy),
            avg_wait_time: trend(current.avg_wait_time, previous.avg_wait_time),
            total_admissions: trend(current.total_admissions, previous.total_admissions),
            total_discharges: trend(current.total_discharges, previous.total_discharges),
        }
    }
}

/// Everything the dashboard renders for one hour.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub hour: u32,
    pub max_hour: u32,
    pub hospital_metrics: HospitalAggregate,
    pub previous_metrics: HospitalAggregate,
    pub trends: KpiTrends,
    pub capacity_label: &'static str,
    pub wait_within_target: bool,
    pub department_metrics: Vec<DepartmentView>,
    pub alerts: Vec<Alert>,
    pub heatmap: Vec<HeatmapRow>,
    pub occupancy_series: Vec<SeriesPoint>,
    pub wait_time_series: Vec<SeriesPoint>,
}

/// First hour of a `window_hours` wide window ending at `hour`.
pub fn window_start(hour: u32, window_hours: u32) -> u32 {
    hour.saturating_sub(window_hours.saturating_sub(1))
}

/// Full re-derivation for `hour`; nothing is cached between calls.
#[instrument(skip(dataset))]
pub fn build_snapshot(dataset: &Dataset, hour: u32, window_hours: u32) -> DashboardSnapshot {
    let start = window_start(hour, window_hours);
    let hospital_metrics = compute_hospital_aggregate(dataset, hour);
    let previous_metrics = compute_hospital_aggregate(dataset, hour.saturating_sub(1));
    let alerts = generate_alerts(dataset, hour);
    debug!(start, alerts = alerts.len(), "snapshot derived");

    DashboardSnapshot {
        hour,
        max_hour: dataset.max_hour(),
        trends: KpiTrends::between(&hospital_metrics, &previous_metrics),
        capacity_label: capacity_label(hospital_metrics.avg_occupancy),
        wait_within_target: wait_time_within_target(hospital_metrics.avg_wait_time),
        department_metrics: department_views(dataset, hour),
        alerts,
        heatmap: occupancy_heatmap(dataset, start, hour),
        occupancy_series: metric_series(dataset, Metric::Occupancy, start, hour),
        wait_time_series: metric_series(dataset, Metric::WaitTime, start, hour),
        hospital_metrics,
        previous_metrics,
    }
}
