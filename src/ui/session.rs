//! Per-session presentation state.
//!
//! Dismissed alerts, the department selection for the trend chart, the alert
//! filter and the active view. Built fresh for every session and never
//! persisted or fed back into the metrics engine.

use std::collections::{HashSet, VecDeque};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Alert, Department, Severity};

/// Departments charted when nothing is selected, and the selection capacity.
pub const DEFAULT_MAX_SELECTED: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFilter {
    #[default]
    All,
    Critical,
    Warning,
}

impl AlertFilter {
    pub fn matches(&self, severity: Severity) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Critical => severity == Severity::Critical,
            AlertFilter::Warning => severity == Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Overview,
    Heatmap,
}

/// User intents that only touch session state.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    DismissAlert(String),
    ToggleDepartment(String),
    FilterSelected(AlertFilter),
    ViewSelected(View),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCounts {
    pub critical: usize,
    pub warning: usize,
}

impl AlertCounts {
    pub fn total(&self) -> usize {
        self.critical + self.warning
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSession {
    dismissed_alerts: HashSet<String>,
    selected_departments: VecDeque<String>,
    max_selected: usize,
    filter: AlertFilter,
    view: View,
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SELECTED)
    }
}

impl DashboardSession {
    pub fn new(max_selected: usize) -> Self {
        Self {
            dismissed_alerts: HashSet::new(),
            selected_departments: VecDeque::with_capacity(max_selected),
            max_selected: max_selected.max(1),
            filter: AlertFilter::default(),
            view: View::default(),
        }
    }

    pub fn update(&mut self, message: Message) {
        debug!(?message, "session update");
        match message {
            Message::DismissAlert(id) => self.dismiss(id),
            Message::ToggleDepartment(id) => self.toggle_department(id),
            Message::FilterSelected(filter) => self.filter = filter,
            Message::ViewSelected(view) => self.view = view,
        }
    }

    pub fn dismiss(&mut self, alert_id: impl Into<String>) {
        self.dismissed_alerts.insert(alert_id.into());
    }

    pub fn is_dismissed(&self, alert_id: &str) -> bool {
        self.dismissed_alerts.contains(alert_id)
    }

    pub fn filter(&self) -> AlertFilter {
        self.filter
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Alerts that are neither dismissed nor hidden by the filter.
    pub fn visible_alerts<'a>(
        &'a self,
        alerts: &'a [Alert],
    ) -> impl Iterator<Item = &'a Alert> + 'a {
        alerts.iter().filter(move |alert| {
            !self.is_dismissed(&alert.id) && self.filter.matches(alert.severity)
        })
    }

    /// Counts of non-dismissed alerts; the filter does not apply.
    pub fn alert_counts(&self, alerts: &[Alert]) -> AlertCounts {
        alerts
            .iter()
            .filter(|alert| !self.is_dismissed(&alert.id))
            .fold(AlertCounts::default(), |mut counts, alert| {
                match alert.severity {
                    Severity::Critical => counts.critical += 1,
                    Severity::Warning => counts.warning += 1,
                    Severity::Info => {}
                }
                counts
            })
    }

    /// Select or deselect a department. Selecting into a full selection
    /// drops the oldest one.
    pub fn toggle_department(&mut self, department_id: impl Into<String>) {
        let department_id = department_id.into();
        if let Some(index) = self.selected_departments.iter().position(|id| *id == department_id) {
            self.selected_departments.remove(index);
            return;
        }
        if self.selected_departments.len() >= self.max_selected {
            self.selected_departments.pop_front();
        }
        self.selected_departments.push_back(department_id);
    }

    pub fn selected_departments(&self) -> impl Iterator<Item = &str> {
        self.selected_departments.iter().map(String::as_str)
    }

    pub fn is_selected(&self, department_id: &str) -> bool {
        self.selected_departments.iter().any(|id| id == department_id)
    }

    /// Departments drawn on the trend chart: the selection in catalog order,
    /// or the first few departments when nothing is selected.
    pub fn charted_departments<'a>(&self, departments: &'a [Department]) -> Vec<&'a Department> {
        if self.selected_departments.is_empty() {
            return departments.iter().take(self.max_selected).collect();
        }
        departments.iter().filter(|dept| self.is_selected(&dept.id)).collect()
    }
}
