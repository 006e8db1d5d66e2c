use std::path::Path;
use std::time::Duration;

use noah_ops::core::data::{load_dataset, synthetic_dataset};
use noah_ops::core::playback::{Playback, TimeCursor, DEFAULT_BASE_INTERVAL};
use noah_ops::core::{
    build_snapshot, compute_hospital_aggregate, generate_alerts, metric_series, occupancy_heatmap,
};
use noah_ops::models::{Dataset, Metric, Severity, Status, TrendDirection};
use noah_ops::ui::{AlertFilter, DashboardSession, Message};

fn fixture() -> Dataset {
    load_dataset(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/metrics.json")))
        .expect("fixture should load")
}

fn alert_ids(dataset: &Dataset, hour: u32) -> Vec<String> {
    generate_alerts(dataset, hour).into_iter().map(|alert| alert.id).collect()
}

#[test]
fn fixture_aggregate_at_last_hour() {
    let dataset = fixture();
    assert_eq!(dataset.max_hour(), 15);

    let agg = compute_hospital_aggregate(&dataset, 15);
    assert_eq!(agg.total_patients, 50);
    assert_eq!(agg.total_beds, 60);
    assert_eq!(agg.avg_occupancy, 83);
    assert_eq!(agg.avg_wait_time, 26);
    assert_eq!(agg.total_staff, 22);
    assert_eq!(agg.staff_ratio, 2.3);
    assert_eq!(agg.net_flow, -1);
}

#[test]
fn fixture_alerts_follow_thresholds() {
    let dataset = fixture();

    // ED at exactly its critical threshold and exactly 60 minutes wait
    assert_eq!(alert_ids(&dataset, 10), vec!["ed-capacity-critical-10", "ed-wait-critical-10"]);
    // everything is a warning, catalog order kept
    assert_eq!(
        alert_ids(&dataset, 9),
        vec!["ed-capacity-warning-9", "ed-wait-warning-9", "icu-capacity-warning-9"]
    );
    // ICU critical is listed before ED warnings
    assert_eq!(
        alert_ids(&dataset, 6),
        vec!["icu-capacity-critical-6", "ed-capacity-warning-6", "ed-wait-warning-6"]
    );

    let alerts = generate_alerts(&dataset, 11);
    assert_eq!(alerts[0].message, "ED at critical capacity (92%)");
    assert_eq!(alerts[1].message, "ED wait time critical: 72 min");
    assert!(alerts.iter().all(|alert| alert.severity == Severity::Critical));
}

#[test]
fn fixture_heatmap_range() {
    let dataset = fixture();
    let rows = occupancy_heatmap(&dataset, 10, 15);
    assert_eq!(rows.len(), 2);
    for row in &rows {
        let hours: Vec<u32> = row.data.iter().map(|cell| cell.hour).collect();
        assert_eq!(hours, vec![10, 11, 12, 13, 14, 15]);
    }
    assert_eq!(rows[1].department_id, "icu");
    assert_eq!(rows[1].data[5].status, Status::Critical);
    assert_eq!(rows[0].data[1].status, Status::Critical);
}

#[test]
fn fixture_series_and_snapshot() {
    let dataset = fixture();
    let series = metric_series(&dataset, Metric::WaitTime, 0, 3);
    let ed: Vec<f64> = series.iter().filter_map(|point| point.value("ed")).collect();
    assert_eq!(ed, vec![15.0, 18.0, 22.0, 25.0]);

    let snapshot = build_snapshot(&dataset, 15, 24);
    assert_eq!(snapshot.occupancy_series.len(), 16);
    assert_eq!(snapshot.trends.total_patients.direction, TrendDirection::Stable);
    assert_eq!(snapshot.capacity_label, "Moderate");
}

#[test]
fn session_filters_snapshot_alerts() {
    let dataset = fixture();
    let snapshot = build_snapshot(&dataset, 6, 24);
    let mut session = DashboardSession::default();

    session.update(Message::FilterSelected(AlertFilter::Critical));
    let visible: Vec<&str> =
        session.visible_alerts(&snapshot.alerts).map(|a| a.id.as_str()).collect();
    assert_eq!(visible, vec!["icu-capacity-critical-6"]);

    session.update(Message::DismissAlert("icu-capacity-critical-6".to_string()));
    assert_eq!(session.visible_alerts(&snapshot.alerts).count(), 0);
    assert_eq!(session.alert_counts(&snapshot.alerts).warning, 2);

    // same condition at the same hour keeps the same id, so it stays dismissed
    let again = build_snapshot(&dataset, 6, 24);
    assert_eq!(session.alert_counts(&again.alerts).critical, 0);
}

#[test]
fn synthetic_dataset_covers_every_department() {
    let dataset = synthetic_dataset(42, 48);
    for hour in 0..=dataset.max_hour() {
        let snapshot = build_snapshot(&dataset, hour, 24);
        assert!(snapshot.department_metrics.iter().all(|view| view.metrics.is_some()));
        assert_eq!(snapshot.hospital_metrics.total_beds, 274);
    }
}

#[tokio::test(start_paused = true)]
async fn replay_to_the_end_of_the_fixture() {
    let dataset = fixture();
    let cursor = TimeCursor::new(dataset.max_hour(), 12).with_speed(4);
    let playback = Playback::new(cursor, DEFAULT_BASE_INTERVAL).unwrap();
    let mut updates = playback.subscribe();

    playback.play();
    let mut seen = Vec::new();
    loop {
        let state = *updates.borrow_and_update();
        if seen.last() != Some(&state.current_hour) {
            seen.push(state.current_hour);
        }
        if !state.is_playing {
            break;
        }
        updates.changed().await.unwrap();
    }

    assert_eq!(seen, vec![12, 13, 14, 15]);
    assert_eq!(playback.state().current_hour, 15);

    // play from the last hour restarts at the beginning
    playback.play();
    assert_eq!(playback.state().current_hour, 0);
    tokio::time::sleep(Duration::from_millis(260)).await;
    assert_eq!(playback.state().current_hour, 1);
}
