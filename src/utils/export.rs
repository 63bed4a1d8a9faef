//! CSV export of one committed analysis pass.
//!
//! Outputs, all under the export directory:
//! - `<series>.csv`: one file per named series, columns `x,y`.
//! - `<series>_raw.csv`: unfiltered time-domain series, columns `x,y`.
//! - `kv_fit.csv`, `ka_fit.csv`, `dt_mean.csv`: two-point reference lines.
//! - `quasistatic_sim.csv`, `dynamic_sim.csv`: simulated velocity, columns `test,x,y`.
//! - `analysis_summary.csv`: gains, fit quality and series statistics as `metric,value,description`.

use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use csv::Writer;
use log::{error, info};
use serde::Serialize;

use crate::analysis::{PlotData, Point, SeriesKind};
use crate::error::Result;
use crate::model::{AnalysisKind, FeedforwardGains};
use crate::utils::metrics::{trajectory_points, y_stats};

/// Run facts that are not part of [`PlotData`] but belong in the summary.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub gains: FeedforwardGains,
    pub unit: String,
    /// R² of the gain regression, when the gains were fitted rather than given.
    pub regression_r_squared: Option<f64>,
    pub slow_samples: usize,
    pub fast_samples: usize,
    /// Mean sample interval in seconds.
    pub mean_dt: Option<f64>,
}

#[derive(Serialize)]
struct TrajectoryRow {
    test: usize,
    x: f64,
    y: f64,
}

/// Writes every output of `view` into `dir`, returning the files written.
pub fn export_results(dir: &Path, view: &PlotData, summary: &RunSummary) -> Result<Vec<PathBuf>> {
    create_dir_all(dir).inspect_err(|e| error!("Failed to create export directory {:?}: {}", dir, e))?;

    let mut written = Vec::new();
    let mut emit = |name: String, result: Result<()>| -> Result<()> {
        let path = dir.join(name);
        match result {
            Ok(()) => {
                written.push(path);
                Ok(())
            }
            Err(e) => {
                error!("Failed to export {:?}: {}", path, e);
                Err(e)
            }
        }
    };

    for kind in SeriesKind::ALL {
        let name = format!("{}.csv", kind.file_stem());
        emit(name.clone(), write_points(&dir.join(&name), view.series(kind)))?;
    }
    for kind in SeriesKind::TIME_DOMAIN {
        let name = format!("{}_raw.csv", kind.file_stem());
        emit(name.clone(), write_points(&dir.join(&name), view.raw_series(kind)))?;
    }

    let lines: [(&str, &[Point]); 3] = [
        ("kv_fit.csv", view.kv_fit().as_slice()),
        ("ka_fit.csv", view.ka_fit().as_slice()),
        ("dt_mean.csv", view.dt_mean_line()),
    ];
    for (name, points) in lines {
        emit(name.to_string(), write_points(&dir.join(name), points))?;
    }

    emit(
        "quasistatic_sim.csv".into(),
        write_trajectories(&dir.join("quasistatic_sim.csv"), view.quasistatic_sim()),
    )?;
    emit(
        "dynamic_sim.csv".into(),
        write_trajectories(&dir.join("dynamic_sim.csv"), view.dynamic_sim()),
    )?;
    emit(
        "analysis_summary.csv".into(),
        write_summary(&dir.join("analysis_summary.csv"), view, summary),
    )?;

    info!("Exported {} files to {:?}", written.len(), dir);
    Ok(written)
}

/// `x,y` rows.
pub fn write_points(path: &Path, points: &[Point]) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    if points.is_empty() {
        wtr.write_record(["x", "y"])?;
    }
    for p in points {
        wtr.serialize(p)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `test,x,y` rows, `test` numbering the runs from 0.
pub fn write_trajectories(path: &Path, trajectories: &[Vec<Point>]) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    if trajectories.iter().all(Vec::is_empty) {
        wtr.write_record(["test", "x", "y"])?;
    }
    for (test, run) in trajectories.iter().enumerate() {
        for p in run {
            wtr.serialize(TrajectoryRow { test, x: p.x, y: p.y })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// `metric,value,description` rows.
pub fn write_summary(path: &Path, view: &PlotData, summary: &RunSummary) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["metric", "value", "description"])?;

    for (metric, value, description) in summary_rows(view, summary) {
        wtr.write_record([metric.as_str(), value.as_str(), description.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn summary_rows(view: &PlotData, summary: &RunSummary) -> Vec<(String, String, String)> {
    let mut rows = Vec::new();
    let mut row = |metric: &str, value: String, description: &str| {
        rows.push((metric.to_string(), value, description.to_string()));
    };

    let g = &summary.gains;
    row("kind", g.kind.to_string(), "Actuator kind");
    row("unit", summary.unit.clone(), "Measurement unit");
    row("ks", format!("{:.6}", g.ks), "Static friction gain (V)");
    row("kv", format!("{:.6}", g.kv), "Velocity gain (V per unit/s)");
    row("ka", format!("{:.6}", g.ka), "Acceleration gain (V per unit/s^2)");
    match g.kind {
        AnalysisKind::SimpleMotor => {}
        AnalysisKind::Elevator => row("kg", format!("{:.6}", g.gravity), "Gravity gain (V)"),
        AnalysisKind::Arm => row("kcos", format!("{:.6}", g.gravity), "Gravity cosine gain (V)"),
    }
    if let Some(r2) = summary.regression_r_squared {
        row("ols_r_squared", format!("{:.6}", r2), "Gain regression coefficient of determination");
    }

    match view.metrics() {
        Ok(m) => {
            row("rmse", format!("{:.6}", m.rmse), "Simulated velocity RMSE");
            row("r_squared", format!("{:.6}", m.r_squared), "Simulated velocity R^2");
        }
        Err(e) => row("fit_quality", "n/a".into(), &e.to_string()),
    }

    row("slow_samples", summary.slow_samples.to_string(), "Quasistatic samples analyzed");
    row("fast_samples", summary.fast_samples.to_string(), "Dynamic samples analyzed");
    if let Some(dt) = summary.mean_dt {
        row("mean_dt_ms", format!("{:.3}", dt * 1000.0), "Mean sample interval");
    }

    if let Some(s) = y_stats(view.series(SeriesKind::QuasistaticVelocity)) {
        row("quasistatic_velocity_min", format!("{:.4}", s.min), "Minimum quasistatic velocity");
        row("quasistatic_velocity_max", format!("{:.4}", s.max), "Maximum quasistatic velocity");
        row("quasistatic_velocity_avg", format!("{:.4}", s.mean), "Average quasistatic velocity");
    }
    if let Some(s) = y_stats(view.series(SeriesKind::DynamicAcceleration)) {
        row("dynamic_acceleration_min", format!("{:.4}", s.min), "Minimum dynamic acceleration");
        row("dynamic_acceleration_max", format!("{:.4}", s.max), "Maximum dynamic acceleration");
        row("dynamic_acceleration_avg", format!("{:.4}", s.mean), "Average dynamic acceleration");
    }
    if let Some(s) = y_stats(view.series(SeriesKind::SampleInterval)) {
        row("sample_interval_max_ms", format!("{:.3}", s.max), "Longest sample interval");
    }

    row(
        "sim_points",
        (trajectory_points(view.quasistatic_sim()) + trajectory_points(view.dynamic_sim())).to_string(),
        "Simulated trajectory points",
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sysid_export_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn summary() -> RunSummary {
        RunSummary {
            gains: FeedforwardGains::from_slice(AnalysisKind::Elevator, &[0.1, 2.0, 0.3, 0.5]).unwrap(),
            unit: "Meters".into(),
            regression_r_squared: Some(0.98),
            slow_samples: 10,
            fast_samples: 12,
            mean_dt: Some(0.005),
        }
    }

    #[test]
    fn points_round_trip_with_header() {
        let dir = scratch_dir("points");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("line.csv");
        write_points(&path, &[Point::new(1.0, 2.5), Point::new(-3.0, 4.0)]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "x,y\n1.0,2.5\n-3.0,4.0\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_export_still_writes_every_file() {
        let dir = scratch_dir("empty");
        let written = export_results(&dir, &PlotData::default(), &summary()).unwrap();
        assert_eq!(written.len(), 7 + 4 + 3 + 2 + 1);
        assert!(written.iter().all(|p| p.exists()));

        let text = fs::read_to_string(dir.join("analysis_summary.csv")).unwrap();
        assert!(text.starts_with("metric,value,description\n"));
        assert!(text.contains("kg,0.500000,Gravity gain (V)"));
        assert!(text.contains("fit_quality,n/a,"));
        assert!(text.contains("mean_dt_ms,5.000,"));
        assert!(text.contains("sim_points,0,"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
