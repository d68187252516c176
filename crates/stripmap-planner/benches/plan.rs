use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Point2;
use std::sync::Arc;
use stripmap_core::{Line, PolygonWithHoles, Timings, VelocityRampCost};
use stripmap_planner::{Planner, PlannerParams, PlannerVariant, Settings};

fn p(x: f64, y: f64) -> Point2<f64> {
    Point2::new(x, y)
}

fn field() -> PolygonWithHoles {
    let holes = (0..3)
        .map(|i| {
            let x = 8.0 + 14.0 * i as f64;
            let y = 6.0 + 4.0 * (i % 2) as f64;
            vec![p(x, y), p(x + 5.0, y + 1.0), p(x + 3.0, y + 6.0), p(x - 1.0, y + 4.0)]
        })
        .collect();
    PolygonWithHoles::new(
        vec![p(0.0, 0.0), p(50.0, 0.0), p(54.0, 22.0), p(20.0, 28.0), p(-2.0, 20.0)],
        holes,
    )
    .expect("valid polygon")
}

fn settings(variant: PlannerVariant) -> Settings {
    Settings::new(
        field(),
        Arc::new(Line::new(2.0, 0.1).expect("valid sensor")),
        Arc::new(VelocityRampCost::new(3.0, 1.0).expect("valid cost")),
        PlannerParams {
            variant,
            ..PlannerParams::default()
        },
    )
}

fn bench_setup(c: &mut Criterion) {
    c.bench_function("setup_three_holes", |b| {
        b.iter(|| {
            let mut planner = Planner::new(settings(PlannerVariant::Base));
            planner.setup(&mut Timings::new()).expect("setup");
            black_box(planner.tracks().len());
        });
    });
}

fn bench_solve(c: &mut Criterion) {
    for (name, variant) in [("solve_base", PlannerVariant::Base), ("solve_exact", PlannerVariant::Exact)] {
        let mut planner = Planner::new(settings(variant));
        planner.setup(&mut Timings::new()).expect("setup");
        c.bench_function(name, |b| {
            b.iter(|| {
                let solution = planner
                    .solve(p(1.0, 1.0), p(1.0, 1.0), &mut Timings::new())
                    .expect("solve");
                black_box(solution.cost);
            });
        });
    }
}

criterion_group!(benches, bench_setup, bench_solve);
criterion_main!(benches);
