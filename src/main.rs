//! # Feedforward Characterization Entry Point
//!
//! Loads (or synthesizes) a quasistatic and a dynamic capture, fits feedforward gains
//! when none are given, and runs the analysis pass on a worker thread while the main
//! thread plays the presentation layer: it polls the shared results with a
//! non-blocking read and skips a frame whenever the writer holds the lock.
//!
//! ## Usage
//! ```text
//! sysid_analysis [--kind simple|elevator|arm] [--unit Meters]
//!                [--slow slow.csv --fast fast.csv | --noise 0.02]
//!                [--gains Ks,Kv,Ka[,Kg|Kcos]] [--window 5] [--out data/sysid_results]
//! ```
//!
//! ## Outputs
//! - `<out>/*.csv`: every series, fit line and simulated trajectory.
//! - `<out>/analysis_summary.csv`: gains, RMSE, R² and series statistics.

use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam::channel::{RecvTimeoutError, bounded};
use log::{debug, error, info, warn};

use sysid_analysis::{
    AnalysisError, AnalysisKind, AnalysisRequest, AnalyzerPlot, FeedforwardGains, PassOutcome, Result,
    SeriesKind,
    analysis::{FitMetrics, calculate_feedforward_gains, timing::mean_time_delta},
    config::{DataSource, RunConfig},
    data::{
        RawSample, Storage, TestBoundaries, filter::moving_average, loader::load_capture_pair, prepare,
        synthetic::synthesize,
    },
    utils::export::{RunSummary, export_results},
};

const POLL_INTERVAL_MS: u64 = 20;
const ANALYSIS_TIMEOUT_SECS: u64 = 60;

/// Gains the synthetic captures are generated from.
fn synthetic_truth(kind: AnalysisKind) -> Vec<f64> {
    match kind {
        AnalysisKind::SimpleMotor => vec![0.25, 2.0, 0.35],
        AnalysisKind::Elevator => vec![0.25, 2.0, 0.35, 0.6],
        AnalysisKind::Arm => vec![0.25, 2.0, 0.35, 0.8],
    }
}

fn main() -> ExitCode {
    env_logger::init();
    info!("=== SYSID ANALYSIS START ===");

    let cfg = match RunConfig::from_args(std::env::args().skip(1)) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            eprintln!("usage: sysid_analysis [--kind simple|elevator|arm] [--unit U] [--slow F --fast F | --noise N] [--gains G] [--window W] [--out DIR]");
            return ExitCode::FAILURE;
        }
    };

    match run(&cfg) {
        Ok(()) => {
            info!("=== SYSID ANALYSIS FINISHED ===");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &RunConfig) -> Result<()> {
    // ========================================================================
    // Capture
    // ========================================================================
    let (slow_rows, fast_rows, starts) = load_capture(cfg)?;
    let boundaries = TestBoundaries::new(starts);
    let raw = Storage::new(
        prepare(&slow_rows, cfg.kind, &boundaries),
        prepare(&fast_rows, cfg.kind, &boundaries),
    );
    let filtered = Storage::new(
        prepare(&moving_average(&slow_rows, cfg.filter_window, &boundaries), cfg.kind, &boundaries),
        prepare(&moving_average(&fast_rows, cfg.filter_window, &boundaries), cfg.kind, &boundaries),
    );
    info!(
        "Capture ready: {} slow / {} fast samples, test starts {:?}",
        raw.slow.len(),
        raw.fast.len(),
        starts
    );

    // ========================================================================
    // Gains
    // ========================================================================
    let (gains, regression_r_squared) = match &cfg.gains {
        Some(g) => (g.clone(), None),
        None => {
            let fit = calculate_feedforward_gains(&filtered, cfg.kind)?;
            info!("Fitted gains {:?} (R² = {:.4})", fit.gains.to_vec(), fit.r_squared);
            (fit.gains.to_vec(), Some(fit.r_squared))
        }
    };
    let summary_gains = FeedforwardGains::from_slice(cfg.kind, &gains)?;
    let mean_dt = mean_time_delta(&filtered);
    let (slow_samples, fast_samples) = (filtered.slow.len(), filtered.fast.len());

    // ========================================================================
    // Analysis worker
    // ========================================================================
    let plot = Arc::new(AnalyzerPlot::new());
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx_done, rx_done) = bounded::<Result<PassOutcome>>(1);

    let worker = {
        let plot = plot.clone();
        let cancel = cancel.clone();
        let unit = cfg.unit.clone();
        let kind = cfg.kind;
        thread::spawn(move || {
            let outcome = plot.set_raw_data(&raw, &unit, &cancel).and_then(|_| {
                let req = AnalysisRequest {
                    raw: &raw,
                    filtered: &filtered,
                    unit: &unit,
                    gains: &gains,
                    start_times: &starts,
                    kind,
                };
                plot.set_data(&req, &cancel)
            });
            let _ = tx_done.send(outcome);
        })
    };

    // ========================================================================
    // Presentation loop: non-blocking reads, skip on contention
    // ========================================================================
    let started = Instant::now();
    let mut frames = 0u64;
    let mut skipped = 0u64;
    let outcome = loop {
        match rx_done.recv_timeout(Duration::from_millis(POLL_INTERVAL_MS)) {
            Ok(result) => break result,
            Err(RecvTimeoutError::Timeout) => {
                match plot.try_view(|d| d.raw_series(SeriesKind::QuasistaticVelocity).len()) {
                    Some(points) => {
                        frames += 1;
                        debug!("Frame {}: {} raw velocity points visible", frames, points);
                    }
                    None => skipped += 1,
                }
                if started.elapsed() > Duration::from_secs(ANALYSIS_TIMEOUT_SECS) && !cancel.load(Ordering::Relaxed) {
                    warn!("Analysis exceeded {} s; cancelling", ANALYSIS_TIMEOUT_SECS);
                    cancel.store(true, Ordering::Relaxed);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                break Err(AnalysisError::InvalidInput("analysis worker exited without a result".into()));
            }
        }
    };

    if worker.join().is_err() {
        error!("Analysis worker panicked");
    }
    debug!("Presentation loop: {} frames drawn, {} skipped", frames, skipped);

    match outcome? {
        PassOutcome::Cancelled => {
            warn!("Analysis cancelled; nothing exported");
            return Ok(());
        }
        PassOutcome::Committed => {}
    }

    // ========================================================================
    // Report and export
    // ========================================================================
    let view = plot.snapshot();
    let summary = RunSummary {
        gains: summary_gains,
        unit: cfg.unit.clone(),
        regression_r_squared,
        slow_samples,
        fast_samples,
        mean_dt,
    };
    print_report(&summary, view.metrics().ok());
    let files = export_results(&cfg.export_dir, &view, &summary)?;
    info!("Results written to {:?} ({} files)", cfg.export_dir, files.len());
    Ok(())
}

fn load_capture(cfg: &RunConfig) -> Result<(Vec<RawSample>, Vec<RawSample>, [f64; 4])> {
    match &cfg.source {
        DataSource::Files { slow, fast } => load_capture_pair(slow, fast),
        DataSource::Synthetic { noise } => {
            let truth = FeedforwardGains::from_slice(cfg.kind, &synthetic_truth(cfg.kind))?;
            info!("Synthesizing {} capture from gains {:?}, noise ±{}", cfg.kind, truth.to_vec(), noise);
            synthesize(&truth, *noise, &mut rand::rng())
        }
    }
}

fn print_report(summary: &RunSummary, metrics: Option<FitMetrics>) {
    let g = &summary.gains;
    println!("\n┌─────────────────────────────────────────────┐");
    println!("│  FEEDFORWARD ANALYSIS: {:<21}│", g.kind.to_string());
    println!("├─────────────────────────────────────────────┤");
    println!("│  Ks   = {:>12.6}                        │", g.ks);
    println!("│  Kv   = {:>12.6}                        │", g.kv);
    println!("│  Ka   = {:>12.6}                        │", g.ka);
    match g.kind {
        AnalysisKind::SimpleMotor => {}
        AnalysisKind::Elevator => println!("│  Kg   = {:>12.6}                        │", g.gravity),
        AnalysisKind::Arm => println!("│  Kcos = {:>12.6}                        │", g.gravity),
    }
    match metrics {
        Some(m) => {
            println!("│  RMSE = {:>12.6}                        │", m.rmse);
            println!("│  R²   = {:>12.6}                        │", m.r_squared);
        }
        None => println!("│  RMSE / R²: insufficient data               │"),
    }
    println!("└─────────────────────────────────────────────┘");
}
