//! Data models for the operations dashboard.

pub mod dataset;
pub mod metrics;

pub use dataset::{AlertTypeTemplate, Dataset, Department, DepartmentSample, Hospital, HourRecord};
pub use metrics::{
    Alert, AlertKind, DepartmentMetrics, DepartmentView, HeatmapCell, HeatmapRow, HospitalAggregate,
    Metric, PeakHour, SeriesPoint, Severity, Status, Trend, TrendDirection,
};
