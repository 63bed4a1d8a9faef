// Measures the analysis core on synthetic captures: a complete pass per actuator kind
// (decomposition, resampling, simulation, metrics and the commit), the gain regression
// alone, and a single simulator step.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng};
use std::{hint::black_box, sync::atomic::AtomicBool};

use sysid_analysis::{
    AnalysisKind, AnalysisRequest, AnalyzerPlot, FeedforwardGains,
    analysis::calculate_feedforward_gains,
    data::{Storage, TestBoundaries, prepare, synthetic::synthesize},
    model::build_sim,
};

fn truth(kind: AnalysisKind) -> FeedforwardGains {
    let gains: &[f64] = match kind {
        AnalysisKind::SimpleMotor => &[0.25, 2.0, 0.35],
        AnalysisKind::Elevator => &[0.25, 2.0, 0.35, 0.6],
        AnalysisKind::Arm => &[0.25, 2.0, 0.35, 0.8],
    };
    FeedforwardGains::from_slice(kind, gains).unwrap()
}

fn capture(kind: AnalysisKind) -> (Storage, [f64; 4]) {
    let mut rng = StdRng::seed_from_u64(42);
    let (slow, fast, starts) = synthesize(&truth(kind), 0.02, &mut rng).unwrap();
    let b = TestBoundaries::new(starts);
    (Storage::new(prepare(&slow, kind, &b), prepare(&fast, kind, &b)), starts)
}

fn full_pass_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis_pass");

    for kind in [AnalysisKind::SimpleMotor, AnalysisKind::Elevator, AnalysisKind::Arm] {
        let (data, starts) = capture(kind);
        let gains = truth(kind).to_vec();
        let plot = AnalyzerPlot::new();
        let cancel = AtomicBool::new(false);

        group.bench_with_input(BenchmarkId::new("set_data", kind.name()), &kind, |b, &kind| {
            b.iter(|| {
                let req = AnalysisRequest {
                    raw: &data,
                    filtered: &data,
                    unit: "Meters",
                    gains: &gains,
                    start_times: &starts,
                    kind,
                };
                plot.set_data(black_box(&req), &cancel).unwrap()
            })
        });
    }
    group.finish();
}

fn regression_bench(c: &mut Criterion) {
    let (data, _) = capture(AnalysisKind::Elevator);
    c.bench_function("feedforward_ols_elevator", |b| {
        b.iter(|| calculate_feedforward_gains(black_box(&data), AnalysisKind::Elevator).unwrap())
    });
}

fn sim_step_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("sim_update_5ms");
    for kind in [AnalysisKind::SimpleMotor, AnalysisKind::Elevator, AnalysisKind::Arm] {
        let mut sim = build_sim(&truth(kind));
        sim.reset(0.0, 0.0);
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                sim.update(black_box(6.0), black_box(0.005)).unwrap();
                sim.velocity()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, full_pass_bench, regression_bench, sim_step_bench);
criterion_main!(benches);
