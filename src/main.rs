//! Noah Ops
//!
//! Command-line front end for the hospital operations dashboard core.

use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use chrono::NaiveTime;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use noah_ops::config::{self, Config};
use noah_ops::core::data::{load_dataset, synthetic_dataset};
use noah_ops::core::playback::{Playback, TimeCursor};
use noah_ops::core::{build_snapshot, peak_hours, DashboardSnapshot};
use noah_ops::models::{Dataset, Metric, TrendDirection};
use noah_ops::ui::DashboardSession;

#[derive(Parser)]
#[command(name = "noah-ops", about = "Hospital operations dashboard core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Dataset JSON file; overrides `data.path`
    #[arg(long, global = true)]
    data: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dashboard for one hour
    Snapshot {
        #[arg(long)]
        hour: Option<u32>,
        /// Emit the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay the dataset hour by hour
    Replay {
        #[arg(long)]
        from: Option<i64>,
        #[arg(long)]
        speed: Option<u32>,
    },
    /// Busiest hours for a department
    Peaks {
        department: String,
        #[arg(long, value_enum, default_value_t = MetricArg::Occupancy)]
        metric: MetricArg,
    },
    /// Write the synthetic dataset to a JSON file
    Export { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Occupancy,
    WaitTime,
    Staff,
    Admissions,
    Discharges,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Occupancy => Metric::Occupancy,
            MetricArg::WaitTime => Metric::WaitTime,
            MetricArg::Staff => Metric::Staff,
            MetricArg::Admissions => Metric::Admissions,
            MetricArg::Discharges => Metric::Discharges,
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_dataset(cli_path: Option<&Path>, config: &Config) -> Result<Dataset> {
    let configured = config.data.path.as_deref().map(Path::new);
    match cli_path.or(configured) {
        Some(path) => load_dataset(path)
            .with_context(|| format!("Failed to load dataset {}", path.display())),
        None => {
            info!(seed = config.data.seed, hours = config.data.hours, "Using synthetic dataset");
            Ok(synthetic_dataset(config.data.seed, config.data.hours))
        }
    }
}

/// "Yesterday 3:00 PM" style label; the window covers two days.
fn format_hour(hour: u32) -> String {
    let day = if hour < 24 { "Yesterday" } else { "Today" };
    let time = NaiveTime::from_hms_opt(hour % 24, 0, 0)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_default();
    format!("{} {}", day, time)
}

fn trend_arrow(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Up => "↑",
        TrendDirection::Down => "↓",
        TrendDirection::Stable => "",
    }
}

fn print_snapshot(dataset: &Dataset, snapshot: &DashboardSnapshot, session: &DashboardSession) {
    let kpi = &snapshot.hospital_metrics;
    println!("{} | {}", dataset.hospital.name, format_hour(snapshot.hour));
    println!(
        "Patients {} of {} beds {}{} | Occupancy {}% ({}) | Avg wait {} min ({}) | \
         Staff {} ({} patients/staff) | In {} Out {} Net {:+}",
        kpi.total_patients,
        kpi.total_beds,
        trend_arrow(snapshot.trends.total_patients.direction),
        snapshot.trends.total_patients.change,
        kpi.avg_occupancy,
        snapshot.capacity_label,
        kpi.avg_wait_time,
        if snapshot.wait_within_target { "within target" } else { "above target" },
        kpi.total_staff,
        kpi.staff_ratio,
        kpi.total_admissions,
        kpi.total_discharges,
        kpi.net_flow,
    );

    for view in &snapshot.department_metrics {
        match &view.metrics {
            Some(metrics) => println!(
                "  {} {:<10} {:>5}% {:>3}/{:<3} beds  wait {:>3} min  [{}]",
                view.department.icon,
                view.department.short_name,
                metrics.sample.occupancy,
                metrics.occupied_beds,
                metrics.total_beds,
                metrics.sample.wait_time,
                metrics.status,
            ),
            None => {
                println!("  {} {:<10} no data", view.department.icon, view.department.short_name)
            }
        }
    }

    let counts = session.alert_counts(&snapshot.alerts);
    println!("Alerts: {} critical, {} warning", counts.critical, counts.warning);
    for alert in session.visible_alerts(&snapshot.alerts) {
        println!("  {} [{}] {}", alert.icon, alert.severity, alert.message);
    }
}

async fn replay(
    dataset: &Dataset,
    config: &Config,
    from: Option<i64>,
    speed: Option<u32>,
) -> Result<()> {
    let initial_speed = speed.unwrap_or(config.playback.initial_speed);
    let cursor = TimeCursor::new(dataset.max_hour(), config.playback.initial_hour)
        .with_speed(initial_speed);
    let playback = Playback::new(cursor, Duration::from_millis(config.playback.base_interval_ms))?;
    if let Some(hour) = from {
        playback.seek_to(hour);
    }

    let session = DashboardSession::new(config.dashboard.max_selected);
    let mut updates = playback.subscribe();
    playback.play();

    loop {
        let state = *updates.borrow_and_update();
        let snapshot = build_snapshot(dataset, state.current_hour, config.dashboard.window_hours);
        let counts = session.alert_counts(&snapshot.alerts);
        println!(
            "{:>3}/{} {:<20} occupancy {:>3}%  wait {:>3} min  alerts {:>2} ({} critical)",
            state.current_hour,
            state.max_hour,
            format_hour(state.current_hour),
            snapshot.hospital_metrics.avg_occupancy,
            snapshot.hospital_metrics.avg_wait_time,
            counts.total(),
            counts.critical,
        );
        if !state.is_playing {
            break;
        }

        tokio::select! {
            changed = updates.changed() => changed.context("Playback stopped publishing")?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                playback.pause();
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = config::load_config().context("Failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::Export { path } => {
            let dataset = synthetic_dataset(config.data.seed, config.data.hours);
            let json = serde_json::to_string_pretty(&dataset)?;
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Exported synthetic dataset");
        }
        Commands::Snapshot { hour, json } => {
            let dataset = resolve_dataset(cli.data.as_deref(), &config)?;
            let hour = hour.unwrap_or(config.playback.initial_hour).min(dataset.max_hour());
            let snapshot = build_snapshot(&dataset, hour, config.dashboard.window_hours);
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                let session = DashboardSession::new(config.dashboard.max_selected);
                print_snapshot(&dataset, &snapshot, &session);
            }
        }
        Commands::Replay { from, speed } => {
            let dataset = resolve_dataset(cli.data.as_deref(), &config)?;
            replay(&dataset, &config, from, speed).await?;
        }
        Commands::Peaks { department, metric } => {
            let dataset = resolve_dataset(cli.data.as_deref(), &config)?;
            let dept = dataset
                .department(&department)
                .with_context(|| format!("Unknown department: {}", department))?;
            println!("Peak hours for {}", dept.name);
            for peak in peak_hours(&dataset, &dept.id, metric.into(), config.dashboard.peak_hours) {
                println!("  {:<20} {}", format_hour(peak.hour), peak.value);
            }
        }
    }
    Ok(())
}
