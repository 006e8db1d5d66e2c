use std::collections::{HashMap, HashSet};
use std::path::Path;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};

use crate::error::{OpsError, Result};
use crate::models::{AlertTypeTemplate, Dataset, Department, DepartmentSample, Hospital, HourRecord};

/// Parse a dataset document and check it against the shape the engine expects.
pub fn parse_dataset(raw_data: &str) -> Result<Dataset> {
    let dataset: Dataset = serde_json::from_str(raw_data)?;
    validate_dataset(&dataset)?;
    Ok(dataset)
}

#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = std::fs::read_to_string(path).map_err(|source| OpsError::DatasetIo {
        path: path.display().to_string(),
        source,
    })?;
    let dataset = parse_dataset(&raw)?;
    info!(
        departments = dataset.departments.len(),
        hours = dataset.time_series_data.len(),
        "Loaded dataset for {}",
        dataset.hospital.name
    );
    Ok(dataset)
}

/// Reject documents the engine cannot project over: no records, duplicate
/// department ids, a warning threshold above the critical one, or hours
/// that are not `0..=max`. Equal thresholds are allowed: critical wins.
pub fn validate_dataset(dataset: &Dataset) -> Result<()> {
    if dataset.time_series_data.is_empty() {
        return Err(OpsError::InvalidDataset("timeSeriesData is empty".to_string()));
    }

    let mut seen = HashSet::new();
    for dept in &dataset.departments {
        if !seen.insert(dept.id.as_str()) {
            return Err(OpsError::InvalidDataset(format!("duplicate department id '{}'", dept.id)));
        }
        if dept.warning_threshold > dept.critical_threshold {
            return Err(OpsError::InvalidDataset(format!(
                "department '{}' warning threshold {} is above critical threshold {}",
                dept.id, dept.warning_threshold, dept.critical_threshold
            )));
        }
    }

    for (index, record) in dataset.time_series_data.iter().enumerate() {
        if record.hour as usize != index {
            return Err(OpsError::InvalidDataset(format!(
                "expected hour {} at position {}, found {}",
                index, index, record.hour
            )));
        }
        let missing: Vec<&str> = dataset
            .departments
            .iter()
            .filter(|dept| record.sample(&dept.id).is_none())
            .map(|dept| dept.id.as_str())
            .collect();
        if !missing.is_empty() {
            // tolerated, the engine degrades per operation
            debug!(hour = record.hour, ?missing, "record lacks department samples");
        }
    }

    Ok(())
}

/// Per-department shape used by the synthetic generator.
struct Profile {
    base: f64,      // mean occupancy
    swing: f64,     // daily amplitude
    wait: f64,      // base wait minutes, 0 for units without a queue
    staff: u32,
    flow: u32,      // typical hourly admissions
}

fn default_departments() -> Vec<(Department, Profile)> {
    let dept = |id: &str,
                name: &str,
                short: &str,
                icon: &str,
                beds: u32,
                warning: f64,
                critical: f64| {
        Department {
            id: id.to_string(),
            name: name.to_string(),
            short_name: short.to_string(),
            icon: icon.to_string(),
            total_beds: beds,
            warning_threshold: warning,
            critical_threshold: critical,
        }
    };

    vec![
        (dept("ed", "Emergency Department", "ED", "🚑", 40, 80.0, 90.0),
            Profile { base: 78.0, swing: 14.0, wait: 35.0, staff: 14, flow: 9 }),
        (dept("icu", "Intensive Care Unit", "ICU", "🫀", 24, 85.0, 95.0),
            Profile { base: 86.0, swing: 6.0, wait: 0.0, staff: 16, flow: 2 }),
        (dept("med_surg", "Medical/Surgical", "Med/Surg", "🏥", 120, 80.0, 92.0),
            Profile { base: 82.0, swing: 8.0, wait: 12.0, staff: 30, flow: 7 }),
        (dept("pediatrics", "Pediatrics", "Peds", "🧸", 30, 75.0, 90.0),
            Profile { base: 62.0, swing: 12.0, wait: 18.0, staff: 9, flow: 3 }),
        (dept("maternity", "Labor & Delivery", "L&D", "👶", 28, 80.0, 95.0),
            Profile { base: 70.0, swing: 10.0, wait: 8.0, staff: 10, flow: 3 }),
        (dept("cardiology", "Cardiac Step-Down", "Cardiac", "❤️", 32, 80.0, 92.0),
            Profile { base: 80.0, swing: 9.0, wait: 22.0, staff: 11, flow: 3 }),
    ]
}

fn default_alert_types() -> Vec<AlertTypeTemplate> {
    [
        ("capacity_critical", "{dept} at critical capacity ({value}%)", "🚨"),
        ("capacity_warning", "{dept} approaching capacity ({value}%)", "⚠️"),
        ("wait_time_critical", "{dept} wait time critical: {value} min", "⏰"),
        ("wait_time_warning", "{dept} wait time elevated: {value} min", "⏱️"),
    ]
    .into_iter()
    .map(|(id, message, icon)| AlertTypeTemplate {
        id: id.to_string(),
        message: message.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

/// Deterministic pre-generated dataset: the same `seed` and `hours` always
/// produce the same document.
pub fn synthetic_dataset(seed: u64, hours: u32) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let profiles = default_departments();

    let time_series_data = (0..hours.max(1))
        .map(|hour| {
            // occupancy peaks in the evening, troughs early morning
            let phase = (f64::from(hour % 24) - 6.0) / 24.0 * std::f64::consts::TAU;
            let daily = -phase.cos();
            let samples: HashMap<String, DepartmentSample> = profiles
                .iter()
                .map(|(dept, profile)| {
                    let jitter = rng.gen_range(-3.0..3.0);
                    let occupancy = (profile.base + profile.swing * daily + jitter)
                        .round()
                        .clamp(0.0, 100.0);
                    let wait_time = if profile.wait > 0.0 {
                        let jitter = rng.gen_range(-6.0..6.0);
                        (profile.wait * (1.0 + 0.6 * daily) + jitter).round().max(0.0)
                    } else {
                        0.0
                    };
                    let sample = DepartmentSample {
                        occupancy,
                        wait_time,
                        staff: profile.staff + rng.gen_range(0..=3),
                        admissions: rng.gen_range(0..=profile.flow * 2),
                        discharges: rng.gen_range(0..=profile.flow * 2),
                    };
                    (dept.id.clone(), sample)
                })
                .collect();
            HourRecord { hour, samples }
        })
        .collect();

    let departments: Vec<Department> = profiles.into_iter().map(|(dept, _)| dept).collect();
    let total_beds = departments.iter().map(|dept| dept.total_beds).sum();

    Dataset {
        hospital: Hospital {
            name: "Noah Regional Medical Center".to_string(),
            location: Some("Simulated".to_string()),
            total_beds: Some(total_beds),
        },
        departments,
        time_series_data,
        alert_types: default_alert_types(),
    }
}
