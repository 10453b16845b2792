//! # Planner Benchmarks

use criterion::{criterion_group, criterion_main, Criterion};

use nalgebra::{Vector2, Vector3};
use usv_lib::auto::{
    loc::Pose,
    map::{ObstacleSet, ObstacleShape, OccupancyGrid, OccupancyGridParams, OperatingArea},
    nav::{GlobalPlanner, GlobalPlannerParams, LocalPlanner, LocalPlannerParams},
    per::DynamicObstacle,
};

fn planner_benchmark(c: &mut Criterion) {
    // ---- Build a harbour grid ----

    let mut grid = OccupancyGrid::new(OccupancyGridParams {
        operating_area: Some(OperatingArea {
            centre_m: Vector2::new(50.0, 50.0),
            size_m: Vector2::new(100.0, 100.0),
        }),
        cell_size_m: 0.5,
        ..Default::default()
    })
    .unwrap();
    grid.build_all().unwrap();

    // Staggered piers force the path to weave
    let piers = ObstacleSet::new(
        (0..4)
            .map(|i| {
                let x_m = 20.0 + 20.0 * i as f64;
                let (y0_m, y1_m) = if i % 2 == 0 { (0.0, 70.0) } else { (30.0, 100.0) };
                ObstacleShape::Box {
                    min_m: Vector2::new(x_m, y0_m),
                    max_m: Vector2::new(x_m + 3.0, y1_m),
                }
            })
            .collect(),
    );
    grid.refresh(&piers, None).unwrap();

    // ---- Global planner ----

    let mut global_planner = GlobalPlanner::new(GlobalPlannerParams::default());
    let start_m = Vector2::new(5.0, 5.0);
    let goal_m = Vector2::new(95.0, 95.0);

    c.bench_function("GlobalPlanner::plan", |b| {
        b.iter(|| global_planner.plan(&grid, &start_m, &goal_m).unwrap())
    });

    // ---- Local planner ----

    let local_planner = LocalPlanner::new(LocalPlannerParams::default());
    let pose = Pose::from_planar(10.0, 10.0, 0.3);
    let velocity_ms = Vector3::new(1.0, 0.3, 0.0);
    let waypoint_m = Vector2::new(14.0, 12.0);
    let obstacles: Vec<DynamicObstacle> = (0..20)
        .map(|i| DynamicObstacle {
            position_m: Vector2::new(11.0 + 0.1 * i as f64, 11.0 - 0.05 * i as f64),
            velocity_ms: Vector2::new(-0.5, 0.1),
        })
        .collect();

    c.bench_function("LocalPlanner::plan", |b| {
        b.iter(|| local_planner.plan(&pose, &velocity_ms, &waypoint_m, &obstacles))
    });
}

criterion_group!(benches, planner_benchmark);
criterion_main!(benches);
