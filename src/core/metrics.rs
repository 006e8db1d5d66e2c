//! Metrics derivation over the static dataset.
//!
//! Every function here is a pure projection of `(Dataset, hour)`. A missing
//! hour falls back to the first record and a missing department sample
//! degrades to "no data"; nothing in this module returns an error.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::core::status::{capacity_alert_kind, department_status, wait_time_alert_kind};
use crate::models::{
    Alert, AlertKind, Dataset, Department, DepartmentMetrics, DepartmentSample, DepartmentView,
    HeatmapCell, HeatmapRow, HospitalAggregate, Metric, PeakHour, SeriesPoint, Trend,
    TrendDirection,
};

/// Band (percent) inside which a change is reported as stable.
const TREND_NOISE_PERCENT: f64 = 5.0;

/// Default number of entries returned by [`peak_hours`].
pub const DEFAULT_PEAK_HOURS: usize = 5;

/// Estimated occupied beds for a department at `occupancy` percent.
pub fn occupied_beds(occupancy: f64, total_beds: u32) -> i64 {
    (occupancy / 100.0 * f64::from(total_beds)).round() as i64
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn compute_hospital_aggregate(dataset: &Dataset, hour: u32) -> HospitalAggregate {
    let Some(record) = dataset.record_at(hour) else {
        return HospitalAggregate::default();
    };

    let mut totals = HospitalAggregate::default();
    let mut total_wait = 0.0;
    let mut departments_waiting = 0u32;

    for dept in &dataset.departments {
        let Some(sample) = record.sample(&dept.id) else {
            continue;
        };
        totals.total_patients += occupied_beds(sample.occupancy, dept.total_beds);
        totals.total_beds += i64::from(dept.total_beds);
        totals.total_staff += i64::from(sample.staff);
        totals.total_admissions += i64::from(sample.admissions);
        totals.total_discharges += i64::from(sample.discharges);

        if sample.wait_time > 0.0 {
            total_wait += sample.wait_time;
            departments_waiting += 1;
        }
    }

    if totals.total_beds > 0 {
        totals.avg_occupancy =
            (totals.total_patients as f64 / totals.total_beds as f64 * 100.0).round() as i64;
    }
    if departments_waiting > 0 {
        totals.avg_wait_time = (total_wait / f64::from(departments_waiting)).round() as i64;
    }
    if totals.total_staff > 0 {
        totals.staff_ratio =
            round_to_tenth(totals.total_patients as f64 / totals.total_staff as f64);
    }
    totals.net_flow = totals.total_admissions - totals.total_discharges;

    debug!(hour, record_hour = record.hour, patients = totals.total_patients, "hospital aggregate");
    totals
}

pub fn compute_department_metrics(
    dataset: &Dataset,
    department: &Department,
    hour: u32,
) -> Option<DepartmentMetrics> {
    let sample = dataset.record_at(hour)?.sample(&department.id)?;
    let occupied = occupied_beds(sample.occupancy, department.total_beds);

    Some(DepartmentMetrics {
        sample: sample.clone(),
        occupied_beds: occupied,
        available_beds: i64::from(department.total_beds) - occupied,
        total_beds: department.total_beds,
        status: department_status(department, sample.occupancy),
    })
}

/// Every catalog department with its metrics for `hour`, in catalog order.
pub fn department_views(dataset: &Dataset, hour: u32) -> Vec<DepartmentView> {
    dataset
        .departments
        .iter()
        .map(|dept| DepartmentView {
            department: dept.clone(),
            metrics: compute_department_metrics(dataset, dept, hour),
        })
        .collect()
}

fn build_alert(
    dataset: &Dataset,
    dept: &Department,
    kind: AlertKind,
    value: f64,
    hour: u32,
) -> Alert {
    let (message, icon) = match dataset.alert_template(kind.template_id()) {
        Some(template) => (template.message.as_str(), template.icon.as_str()),
        None => {
            warn!(template = kind.template_id(), "alert template missing, using default");
            kind.default_template()
        }
    };

    Alert {
        id: format!("{}-{}-{}", dept.id, kind.id_fragment(), hour),
        department: dept.name.clone(),
        department_id: dept.id.clone(),
        kind,
        severity: kind.severity(),
        message: message
            .replacen("{dept}", &dept.short_name, 1)
            .replacen("{value}", &value.to_string(), 1),
        icon: icon.to_string(),
        timestamp: hour,
        value,
    }
}

/// Capacity and wait-time alerts for `hour`, critical before warning.
/// Within a severity the department catalog order is kept.
pub fn generate_alerts(dataset: &Dataset, hour: u32) -> Vec<Alert> {
    let Some(record) = dataset.record_at(hour) else {
        return Vec::new();
    };

    let mut alerts = Vec::new();
    for dept in &dataset.departments {
        let Some(sample) = record.sample(&dept.id) else {
            continue;
        };
        if let Some(kind) = capacity_alert_kind(dept, sample.occupancy) {
            alerts.push(build_alert(dataset, dept, kind, sample.occupancy, hour));
        }
        if let Some(kind) = wait_time_alert_kind(sample.wait_time) {
            alerts.push(build_alert(dataset, dept, kind, sample.wait_time, hour));
        }
    }

    // stable sort keeps catalog order among equal severities
    alerts.sort_by_key(|alert| alert.severity);
    debug!(hour, count = alerts.len(), "generated alerts");
    alerts
}

/// Values of `metric` per department for every record in `[start_hour, end_hour]`.
/// Departments without a sample are left out of that point.
pub fn metric_series(
    dataset: &Dataset,
    metric: Metric,
    start_hour: u32,
    end_hour: u32,
) -> Vec<SeriesPoint> {
    dataset
        .records_in_range(start_hour, end_hour)
        .map(|record| {
            let values: BTreeMap<String, f64> = dataset
                .departments
                .iter()
                .filter_map(|dept| {
                    record
                        .sample(&dept.id)
                        .map(|sample| (dept.id.clone(), metric.value(sample)))
                })
                .collect();
            SeriesPoint { hour: record.hour, values }
        })
        .collect()
}

/// Department × hour occupancy matrix. Missing samples read as 0% occupancy.
pub fn occupancy_heatmap(dataset: &Dataset, start_hour: u32, end_hour: u32) -> Vec<HeatmapRow> {
    dataset
        .departments
        .iter()
        .map(|dept| {
            let data = dataset
                .records_in_range(start_hour, end_hour)
                .map(|record| {
                    let value = record.sample(&dept.id).map_or(0.0, |sample| sample.occupancy);
                    HeatmapCell {
                        hour: record.hour,
                        value,
                        status: department_status(dept, value),
                    }
                })
                .collect();
            HeatmapRow {
                department: dept.short_name.clone(),
                department_id: dept.id.clone(),
                icon: dept.icon.clone(),
                data,
            }
        })
        .collect()
}

pub fn calculate_trend(current: f64, previous: f64) -> Trend {
    if previous == 0.0 {
        return Trend::STABLE;
    }
    let change = (current - previous) / previous * 100.0;

    if change > TREND_NOISE_PERCENT {
        Trend { direction: TrendDirection::Up, change: change.round() as i64 }
    } else if change < -TREND_NOISE_PERCENT {
        Trend { direction: TrendDirection::Down, change: change.abs().round() as i64 }
    } else {
        Trend::STABLE
    }
}

/// The `limit` hours with the highest `metric` value for a department,
/// highest first. Ties keep chronological order; missing samples count as 0.
pub fn peak_hours(
    dataset: &Dataset,
    department_id: &str,
    metric: Metric,
    limit: usize,
) -> Vec<PeakHour> {
    let value_at = |sample: Option<&DepartmentSample>| sample.map_or(0.0, |s| metric.value(s));

    let mut hours: Vec<PeakHour> = dataset
        .time_series_data
        .iter()
        .map(|record| PeakHour {
            hour: record.hour,
            value: value_at(record.sample(department_id)),
        })
        .collect();
    hours.sort_by(|a, b| b.value.total_cmp(&a.value));
    hours.truncate(limit);
    hours
}
