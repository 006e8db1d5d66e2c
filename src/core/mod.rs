//! Metrics derivation and playback.

pub mod data;
pub mod metrics;
pub mod playback;
pub mod snapshot;
pub mod status;

pub use metrics::{
    calculate_trend, compute_department_metrics, compute_hospital_aggregate, department_views,
    generate_alerts, metric_series, occupancy_heatmap, peak_hours,
};
pub use playback::{CursorState, Playback, TimeCursor};
pub use snapshot::{build_snapshot, DashboardSnapshot};
pub use status::classify_status;
