use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{arr2, Array2};
use rudolf_tracker::{scenario, Filter, KalmanFilter, ProcessModel, SimulationConfig};

pub fn kalman_cycle_benchmark(c: &mut Criterion) {
    let model = ProcessModel::new(1.0, 10.0, 0.2).unwrap();
    let input = arr2(&[[1.0]]);
    let measurement = arr2(&[[0.5]]);
    let mut kf = KalmanFilter::from_model(&model).unwrap();
    kf.init(&Array2::zeros((2, 1)), model.transition_covariance())
        .unwrap();
    c.bench_function("Kalman filter predict and update for a kinematic model", |b| {
        b.iter(|| {
            kf.predict(black_box(&input)).unwrap();
            kf.update(black_box(&measurement)).unwrap()
        })
    });
}

pub fn eight_state_cycle_benchmark(c: &mut Criterion) {
    let mut kf = KalmanFilter::<f64>::new(
        &Array2::eye(8),
        &Array2::eye(8),
        &Array2::eye(8),
        &Array2::eye(8),
        &Array2::eye(8),
    )
    .unwrap();
    kf.init(&Array2::zeros((8, 1)), &Array2::eye(8)).unwrap();
    let input = Array2::zeros((8, 1));
    let measurement = Array2::ones((8, 1));
    c.bench_function("Kalman filter predict and update with 8 states and 8 measurements", |b| {
        b.iter(|| {
            kf.predict(black_box(&input)).unwrap();
            kf.update(black_box(&measurement)).unwrap()
        })
    });
}

pub fn scenario_benchmark(c: &mut Criterion) {
    let config = SimulationConfig::default();
    c.bench_function("Reference scenario of 100 steps", |b| {
        b.iter_with_large_drop(|| scenario::run(black_box(&config)).unwrap())
    });
}

criterion_group!(cycle, kalman_cycle_benchmark, eight_state_cycle_benchmark);
criterion_group!(run, scenario_benchmark);
criterion_main!(cycle, run);
