use approx::assert_relative_eq;
use nalgebra::Point2;
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use stripmap_core::{
    distance_to_segment, velocity_ramp_cost, GeometryError, Line, Phase, PolygonWithHoles, RingId,
    Timings, VelocityRampCost,
};
use stripmap_decomposition::SweepDirection;
use stripmap_gtsp::SolveStatus;
use stripmap_planner::{
    Planner, PlannerParams, PlannerState, PlannerVariant, SetupError, Settings, Solution,
    SolveError, TransitMode,
};

fn p(x: f64, y: f64) -> Point2<f64> {
    Point2::new(x, y)
}

fn square() -> Vec<Point2<f64>> {
    vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]
}

fn centred_hole() -> Vec<Point2<f64>> {
    vec![p(4.0, 4.0), p(6.0, 4.0), p(6.0, 6.0), p(4.0, 6.0)]
}

fn planner(polygon: PolygonWithHoles, width: f64, params: PlannerParams) -> Planner {
    Planner::new(Settings::new(
        polygon,
        Arc::new(Line::new(width, 0.0).expect("valid sensor")),
        Arc::new(VelocityRampCost::new(3.0, 1.0).expect("valid cost")),
        params,
    ))
}

fn ready(mut planner: Planner) -> Planner {
    planner.setup(&mut Timings::new()).expect("setup");
    planner
}

fn distance_to_path(q: &Point2<f64>, path: &[Point2<f64>]) -> f64 {
    path.windows(2)
        .map(|w| distance_to_segment(q, &w[0], &w[1]))
        .fold(f64::INFINITY, f64::min)
}

fn assert_path_in_free_space(polygon: &PolygonWithHoles, solution: &Solution) {
    for w in solution.path.windows(2) {
        assert!(
            polygon.segment_in_free_space(&w[0], &w[1]),
            "segment {w:?} leaves free space"
        );
    }
}

fn assert_covers(polygon: &PolygonWithHoles, path: &[Point2<f64>], radius: f64) {
    let (lo, hi) = polygon.outer().bounds();
    let step = 0.25;
    let mut x = lo.x;
    while x <= hi.x {
        let mut y = lo.y;
        while y <= hi.y {
            let q = p(x, y);
            if polygon.contains(&q) {
                assert!(
                    distance_to_path(&q, path) <= radius + 1e-6,
                    "{q:?} is not covered"
                );
            }
            y += step;
        }
        x += step;
    }
}

fn assert_visits_each_cell_once(planner: &Planner, solution: &Solution) {
    let cells = planner.decomposition().expect("built").cell_count();
    let mut seen = vec![false; cells];
    for v in &solution.visits {
        assert!(!seen[v.cluster], "cell {} visited twice", v.cluster);
        seen[v.cluster] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn hole_free_square_is_one_cell_with_four_passes() {
    let polygon = PolygonWithHoles::from_outer(square()).expect("valid");
    let planner = ready(planner(polygon, 3.0, PlannerParams::default()));
    assert_eq!(planner.decomposition().expect("built").cell_count(), 1);
    assert_eq!(planner.tracks()[0].chord_count(), 4);

    let solution = planner
        .solve(p(0.0, 0.0), p(0.0, 0.0), &mut Timings::new())
        .expect("solve");
    assert!(solution.cost.is_finite() && solution.cost > 0.0);
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.path.first(), Some(&p(0.0, 0.0)));
    assert_eq!(solution.path.last(), Some(&p(0.0, 0.0)));
    assert_relative_eq!(
        solution.cost,
        velocity_ramp_cost(&solution.path, 3.0, 1.0),
        epsilon = 1e-9
    );
}

#[test]
fn square_with_hole_visits_every_cell_and_returns() {
    let polygon = PolygonWithHoles::new(square(), vec![centred_hole()]).expect("valid");
    let planner = ready(planner(polygon.clone(), 1.5, PlannerParams::default()));
    let d = planner.decomposition().expect("built");
    assert!(d.cell_count() > 1);
    assert!(d.adjacency().is_connected());

    let start = p(0.0, 0.0);
    let solution = planner
        .solve(start, start, &mut Timings::new())
        .expect("solve");
    assert_visits_each_cell_once(&planner, &solution);
    assert_eq!(solution.path.first(), Some(&start));
    assert_eq!(solution.path.last(), Some(&start));
    assert_path_in_free_space(&polygon, &solution);
    assert_covers(&polygon, &solution.path, 1.5);
}

#[test]
fn degenerate_outline_fails_setup_with_geometry_error() {
    let err = Settings::from_rings(
        vec![p(0.0, 0.0), p(1.0, 0.0)],
        Vec::new(),
        Arc::new(Line::new(1.0, 0.0).expect("valid")),
        Arc::new(VelocityRampCost::new(1.0, 1.0).expect("valid")),
        PlannerParams::default(),
    )
    .expect_err("two points are not a polygon");
    assert_eq!(
        err,
        SetupError::Geometry(GeometryError::TooFewPoints {
            ring: RingId::Outer,
            count: 2
        })
    );
}

#[test]
fn repeated_solves_are_identical() {
    let polygon = PolygonWithHoles::new(square(), vec![centred_hole()]).expect("valid");
    let planner = ready(planner(polygon, 1.0, PlannerParams::default()));
    let a = planner
        .solve(p(0.5, 0.5), p(9.5, 9.5), &mut Timings::new())
        .expect("solve");
    let b = planner
        .solve(p(0.5, 0.5), p(9.5, 9.5), &mut Timings::new())
        .expect("solve");
    assert_eq!(a, b);
}

#[test]
fn concurrent_solves_match_serial_ones() {
    let polygon = PolygonWithHoles::new(square(), vec![centred_hole()]).expect("valid");
    let planner = ready(planner(polygon, 1.0, PlannerParams::default()));
    let queries = [(p(0.0, 0.0), p(10.0, 10.0)), (p(2.0, 8.0), p(8.0, 2.0))];
    let serial: Vec<Solution> = queries
        .iter()
        .map(|(s, g)| planner.solve(*s, *g, &mut Timings::new()).expect("solve"))
        .collect();
    let parallel: Vec<Solution> = std::thread::scope(|scope| {
        let handles: Vec<_> = queries
            .iter()
            .map(|(s, g)| {
                let planner = &planner;
                scope.spawn(move || planner.solve(*s, *g, &mut Timings::new()))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread").expect("solve"))
            .collect()
    });
    assert_eq!(serial, parallel);
}

#[test]
fn five_holes_are_all_swept() {
    let holes: Vec<Vec<Point2<f64>>> = (0..5)
        .map(|i| {
            let x = 3.0 + 5.0 * i as f64;
            let y = if i % 2 == 0 { 3.0 } else { 4.0 };
            vec![p(x, y), p(x + 2.0, y), p(x + 2.0, y + 3.0), p(x, y + 3.0)]
        })
        .collect();
    let polygon = PolygonWithHoles::new(
        vec![p(0.0, 0.0), p(30.0, 0.0), p(30.0, 10.0), p(0.0, 10.0)],
        holes,
    )
    .expect("valid");
    assert_eq!(polygon.hole_count(), 5);

    let params = PlannerParams {
        sweep_direction: SweepDirection::Fixed(FRAC_PI_2),
        ..PlannerParams::default()
    };
    let planner = ready(planner(polygon.clone(), 1.0, params));
    let solution = planner
        .solve(p(0.0, 0.0), p(30.0, 0.0), &mut Timings::new())
        .expect("solve");
    assert_visits_each_cell_once(&planner, &solution);
    assert_path_in_free_space(&polygon, &solution);
    assert_covers(&polygon, &solution.path, 1.0);
}

#[test]
fn adjacency_only_graph_is_sparser_but_solvable() {
    let polygon = PolygonWithHoles::new(square(), vec![centred_hole()]).expect("valid");
    let dense = ready(planner(polygon.clone(), 1.0, PlannerParams::default()));
    let straight = ready(planner(
        polygon.clone(),
        1.0,
        PlannerParams {
            transit: TransitMode::StraightLine,
            ..PlannerParams::default()
        },
    ));
    let sparse = ready(planner(
        polygon,
        1.0,
        PlannerParams {
            sweep_around_obstacles: false,
            ..PlannerParams::default()
        },
    ));
    let edges = |pl: &Planner| pl.graph().expect("built").edge_count();
    assert!(edges(&sparse) <= edges(&straight));
    assert!(edges(&straight) <= edges(&dense));
    assert!(edges(&sparse) < edges(&dense));

    let solution = sparse
        .solve(p(0.0, 0.0), p(0.0, 0.0), &mut Timings::new())
        .expect("the adjacency ring admits a tour");
    assert_visits_each_cell_once(&sparse, &solution);
}

#[test]
fn exact_variant_covers_slanted_field() {
    let polygon = PolygonWithHoles::new(
        vec![p(0.0, 0.0), p(16.0, 0.0), p(13.0, 9.0), p(2.0, 11.0)],
        vec![vec![p(6.0, 3.0), p(9.0, 4.0), p(7.0, 6.0)]],
    )
    .expect("valid");
    let params = PlannerParams {
        variant: PlannerVariant::Exact,
        offset_polygons: true,
        ..PlannerParams::default()
    };
    let planner = ready(planner(polygon.clone(), 2.0, params));
    let mut timings = Timings::new();
    let solution = planner
        .solve(p(1.0, 1.0), p(1.0, 1.0), &mut timings)
        .expect("solve");
    assert_visits_each_cell_once(&planner, &solution);
    assert_path_in_free_space(&polygon, &solution);
    assert_covers(&polygon, &solution.path, 1.0);
    assert!(timings.get(Phase::Refinement) > 0.0);
}

#[test]
fn exact_variant_covers_star_within_half_width() {
    let outline: Vec<Point2<f64>> = (0..14)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / 14.0;
            let r = if i % 2 == 0 { 10.0 } else { 4.0 };
            p(r * angle.cos(), r * angle.sin())
        })
        .collect();
    let polygon = PolygonWithHoles::from_outer(outline).expect("valid");
    let params = PlannerParams {
        variant: PlannerVariant::Exact,
        ..PlannerParams::default()
    };
    let planner = ready(planner(polygon.clone(), 2.0, params));
    let solution = planner
        .solve(p(0.0, 0.0), p(0.0, 0.0), &mut Timings::new())
        .expect("solve");
    assert_visits_each_cell_once(&planner, &solution);
    assert_covers(&polygon, &solution.path, 1.0);
}

#[test]
fn setup_failure_leaves_no_graph() {
    #[derive(Debug)]
    struct Broken;
    impl stripmap_core::SensorModel for Broken {
        fn footprint_width(&self) -> f64 {
            1.0
        }
        fn sweep_distance(&self) -> f64 {
            0.0
        }
    }
    let polygon = PolygonWithHoles::from_outer(square()).expect("valid");
    let mut planner = Planner::new(Settings::new(
        polygon,
        Arc::new(Broken),
        Arc::new(VelocityRampCost::new(1.0, 1.0).expect("valid")),
        PlannerParams::default(),
    ));
    assert!(matches!(
        planner.setup(&mut Timings::new()),
        Err(SetupError::Sensor(_))
    ));
    assert_eq!(planner.state(), PlannerState::Failed);
    assert!(!planner.is_initialized());
    assert!(planner.graph().is_none());
    assert_eq!(
        planner.solve(p(1.0, 1.0), p(1.0, 1.0), &mut Timings::new()),
        Err(SolveError::NotInitialized)
    );
}
