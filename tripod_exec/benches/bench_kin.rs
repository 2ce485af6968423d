//! # Kinematics Benchmark

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use tripod_lib::kin_ctrl::{avionics_to_internal, ActuatorPositions, EulerAngles, KinCtrl, Params};

fn kin_benchmark(c: &mut Criterion) {
    let params: Params = util::params::parse(include_str!("../../params/kin_ctrl.toml")).unwrap();

    // Positions of a moderate tilt with some turret rotation
    let positions = ActuatorPositions::new([0.012, -0.004, -0.009], 0.15);

    c.bench_function("forward_solve cold", |b| {
        b.iter_batched(
            || KinCtrl::new(&params).unwrap(),
            |mut kin| kin.solve_orientation(black_box(&positions)).unwrap(),
            BatchSize::SmallInput,
        )
    });

    // Repeated solves of the same pose start from the previous solution
    let mut kin = KinCtrl::new(&params).unwrap();
    kin.forward_solve(&positions).unwrap();

    c.bench_function("forward_solve warm", |b| {
        b.iter(|| kin.solve_orientation(black_box(&positions)).unwrap())
    });

    let target = avionics_to_internal(&EulerAngles::from_deg(2.0, -3.0, 15.0));

    c.bench_function("inverse_solve", |b| {
        b.iter_batched(
            || KinCtrl::new(&params).unwrap(),
            |mut kin| kin.inverse_solve(black_box(&target)).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, kin_benchmark);
criterion_main!(benches);
