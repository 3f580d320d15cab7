use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use collision_engine::{
    CollisionAdvance, CollisionDetector, Gravity, RigidBodySim, ShapeFactory, SimConfig, Vec2,
};

fn floor_sim(factory: &mut ShapeFactory) -> RigidBodySim {
    let mut sim = RigidBodySim::new(SimConfig::default());
    let mut floor = factory.wall(40.0, 1.0).expect("floor");
    floor.set_position(Vec2::new(0.0, -0.5), 0.0);
    sim.add_body(floor).expect("floor added");
    sim.add_force_law(Box::new(Gravity::new(10.0)));
    sim
}

// --- Helper for a cloud of balls falling onto the floor ---
fn ball_cloud(num_balls: usize) -> CollisionAdvance {
    let mut factory = ShapeFactory::new();
    let mut sim = floor_sim(&mut factory);
    let radius = 0.5;
    let per_row = 10;
    for i in 0..num_balls {
        let mut ball = factory.ball(radius).expect("ball");
        let x = (i % per_row) as f64 * 1.5 - 7.0;
        let y = 1.0 + (i / per_row) as f64 * 1.5 + 0.1 * (i % 3) as f64; // Staggered so rows don't land together
        ball.set_position(Vec2::new(x, y), 0.0);
        ball.set_elasticity(0.8);
        sim.add_body(ball).expect("ball added");
    }
    CollisionAdvance::new(sim)
}

// --- Helper for a loose pile of blocks ---
fn block_pile(num_blocks: usize) -> CollisionAdvance {
    let mut factory = ShapeFactory::new();
    let mut sim = floor_sim(&mut factory);
    for i in 0..num_blocks {
        let mut block = factory.block(1.0, 0.5).expect("block");
        let x = (i % 4) as f64 * 1.2 - 2.0 + 0.3 * (i / 4 % 2) as f64;
        let y = 0.5 + (i / 4) as f64 * 0.8;
        block.set_position(Vec2::new(x, y), 0.02 * i as f64);
        sim.add_body(block).expect("block added");
    }
    CollisionAdvance::new(sim)
}

fn run(advance: &mut CollisionAdvance, steps: usize) {
    let dt = 1.0 / 60.0;
    for _ in 0..steps {
        advance.advance(black_box(dt)).expect("advance");
    }
}

fn bench_ball_cloud(c: &mut Criterion) {
    let mut group = c.benchmark_group("ball_cloud");
    for num_balls in [5, 20, 50].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(num_balls), num_balls, |b, &n| {
            b.iter(|| {
                let mut advance = ball_cloud(black_box(n));
                run(&mut advance, 30);
            });
        });
    }
    group.finish();
}

fn bench_block_pile(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_pile");
    group.sample_size(10);
    for num_blocks in [4, 12].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(num_blocks), num_blocks, |b, &n| {
            b.iter(|| {
                let mut advance = block_pile(black_box(n));
                run(&mut advance, 30);
            });
        });
    }
    group.finish();
}

// Detection alone, without integration.
fn bench_find_collisions(c: &mut Criterion) {
    let advance = ball_cloud(50);
    let bodies = advance.sim().bodies();
    c.bench_function("find_collisions_50_balls", |b| {
        b.iter(|| CollisionDetector::find_collisions(black_box(bodies)));
    });
}

criterion_group!(benches, bench_ball_cloud, bench_block_pile, bench_find_collisions);
criterion_main!(benches);
