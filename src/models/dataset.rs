use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use tracing::debug;

/// The static metrics document: hospital info, department catalog,
/// hourly records and alert message templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub hospital: Hospital,
    pub departments: Vec<Department>,
    pub time_series_data: Vec<HourRecord>,
    pub alert_types: Vec<AlertTypeTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_beds: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub icon: String,
    pub total_beds: u32,
    pub warning_threshold: f64, // percent
    pub critical_threshold: f64, // percent, at or above warning
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSample {
    pub occupancy: f64,
    pub wait_time: f64, // minutes
    pub staff: u32,
    pub admissions: u32,
    pub discharges: u32,
}

/// One hour of samples, keyed by department id.
///
/// Keys that do not hold a department sample (timestamps, labels) are
/// dropped on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawHourRecord")]
pub struct HourRecord {
    pub hour: u32,
    #[serde(flatten)]
    pub samples: HashMap<String, DepartmentSample>,
}

#[derive(Deserialize)]
struct RawHourRecord {
    hour: u32,
    #[serde(flatten)]
    entries: HashMap<String, Value>,
}

impl From<RawHourRecord> for HourRecord {
    fn from(raw: RawHourRecord) -> Self {
        let mut samples = HashMap::with_capacity(raw.entries.len());
        for (key, value) in raw.entries {
            match serde_json::from_value::<DepartmentSample>(value) {
                Ok(sample) => {
                    samples.insert(key, sample);
                }
                Err(err) => {
                    debug!(hour = raw.hour, key = %key, error = %err, "skipping non-sample key")
                }
            }
        }
        HourRecord { hour: raw.hour, samples }
    }
}

impl HourRecord {
    pub fn sample(&self, department_id: &str) -> Option<&DepartmentSample> {
        self.samples.get(department_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertTypeTemplate {
    pub id: String, // e.g., "capacity_critical", "wait_time_warning"
    pub message: String, // "{dept}" and "{value}" placeholders
    pub icon: String,
}

impl Dataset {
    /// Record for `hour`, falling back to the first record when the hour is
    /// not present. `None` only for a dataset with no records at all.
    pub fn record_at(&self, hour: u32) -> Option<&HourRecord> {
        self.time_series_data
            .iter()
            .find(|record| record.hour == hour)
            .or_else(|| self.time_series_data.first())
    }

    /// Records whose hour lies in `[start_hour, end_hour]`, in dataset order.
    pub fn records_in_range(
        &self,
        start_hour: u32,
        end_hour: u32,
    ) -> impl Iterator<Item = &HourRecord> {
        self.time_series_data
            .iter()
            .filter(move |record| record.hour >= start_hour && record.hour <= end_hour)
    }

    pub fn max_hour(&self) -> u32 {
        self.time_series_data.len().saturating_sub(1) as u32
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|dept| dept.id == id)
    }

    pub fn alert_template(&self, id: &str) -> Option<&AlertTypeTemplate> {
        self.alert_types.iter().find(|template| template.id == id)
    }
}
