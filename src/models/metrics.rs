//! Derived, per-query records produced by the metrics engine.
//!
//! Nothing here is persisted; every value is recomputed for the hour being
//! displayed.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use super::dataset::{Department, DepartmentSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity. Declaration order is display order: critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    CapacityCritical,
    CapacityWarning,
    WaitTimeCritical,
    WaitTimeWarning,
}

impl AlertKind {
    /// Id of the matching entry in the dataset's `alertTypes`.
    pub fn template_id(&self) -> &'static str {
        match self {
            AlertKind::CapacityCritical => "capacity_critical",
            AlertKind::CapacityWarning => "capacity_warning",
            AlertKind::WaitTimeCritical => "wait_time_critical",
            AlertKind::WaitTimeWarning => "wait_time_warning",
        }
    }

    /// Fragment used inside alert ids, e.g. `ed-capacity-critical-36`.
    pub fn id_fragment(&self) -> &'static str {
        match self {
            AlertKind::CapacityCritical => "capacity-critical",
            AlertKind::CapacityWarning => "capacity-warning",
            AlertKind::WaitTimeCritical => "wait-critical",
            AlertKind::WaitTimeWarning => "wait-warning",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::CapacityCritical | AlertKind::WaitTimeCritical => Severity::Critical,
            AlertKind::CapacityWarning | AlertKind::WaitTimeWarning => Severity::Warning,
        }
    }

    /// Message and icon used when the dataset has no template for this kind.
    pub fn default_template(&self) -> (&'static str, &'static str) {
        match self {
            AlertKind::CapacityCritical => ("{dept} at critical capacity ({value}%)", "🚨"),
            AlertKind::CapacityWarning => ("{dept} approaching capacity ({value}%)", "⚠️"),
            AlertKind::WaitTimeCritical => ("{dept} wait time critical ({value} min)", "⏰"),
            AlertKind::WaitTimeWarning => ("{dept} wait time elevated ({value} min)", "⏱️"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalAggregate {
    pub total_patients: i64,
    pub total_beds: i64,
    pub avg_occupancy: i64,
    pub avg_wait_time: i64,
    pub total_staff: i64,
    pub staff_ratio: f64, // patients per staff, one decimal
    pub total_admissions: i64,
    pub total_discharges: i64,
    pub net_flow: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentMetrics {
    #[serde(flatten)]
    pub sample: DepartmentSample,
    pub occupied_beds: i64,
    pub available_beds: i64, // negative when occupancy exceeds 100%
    pub total_beds: u32,
    pub status: Status,
}

/// A catalog department paired with its metrics for one hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentView {
    #[serde(flatten)]
    pub department: Department,
    pub metrics: Option<DepartmentMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub department: String,
    pub department_id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub icon: String,
    pub timestamp: u32, // triggering hour
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Occupancy,
    WaitTime,
    Staff,
    Admissions,
    Discharges,
}

impl Metric {
    pub fn value(&self, sample: &DepartmentSample) -> f64 {
        match self {
            Metric::Occupancy => sample.occupancy,
            Metric::WaitTime => sample.wait_time,
            Metric::Staff => f64::from(sample.staff),
            Metric::Admissions => f64::from(sample.admissions),
            Metric::Discharges => f64::from(sample.discharges),
        }
    }
}

/// One chart point: the hour plus one value per department that had a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub hour: u32,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl SeriesPoint {
    pub fn value(&self, department_id: &str) -> Option<f64> {
        self.values.get(department_id).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub hour: u32,
    pub value: f64,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapRow {
    pub department: String, // short name
    pub department_id: String,
    pub icon: String,
    pub data: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub change: i64, // absolute percent, 0 when stable
}

impl Trend {
    pub const STABLE: Trend = Trend { direction: TrendDirection::Stable, change: 0 };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakHour {
    pub hour: u32,
    pub value: f64,
}
