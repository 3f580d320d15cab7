use approx::assert_relative_eq;
use collision_engine::{
    CollisionAdvance, CollisionPolicy, Gravity, RigidBodySim, ShapeFactory, SimConfig, StuckError, Vec2,
};

const DT: f64 = 0.005;

/// Ball of radius 0.5 dropped with its lowest point `drop` above a floor
/// whose top face is at y = 0.
fn dropped_ball(drop: f64, elasticity: f64) -> CollisionAdvance {
    let mut factory = ShapeFactory::new();
    let mut floor = factory.named_wall("floor", 20.0, 1.0).unwrap();
    floor.set_position(Vec2::new(0.0, -0.5), 0.0);
    let mut ball = factory.named_ball("ball", 0.5).unwrap();
    ball.set_position(Vec2::new(0.0, 0.5 + drop), 0.0);
    ball.set_elasticity(elasticity);

    let mut sim = RigidBodySim::new(SimConfig::default());
    sim.add_body(floor).unwrap();
    sim.add_body(ball).unwrap();
    sim.add_force_law(Box::new(Gravity::new(9.8)));
    CollisionAdvance::new(sim)
}

/// Three unit-mass balls on the x axis, the outer two closing on the
/// middle one at equal speed. Gaps of 1 close after 0.5 s.
fn two_hit_one(policy: CollisionPolicy) -> CollisionAdvance {
    let mut factory = ShapeFactory::new();
    let mut sim = RigidBodySim::new(SimConfig::with_policy(policy));
    for (x, v) in [(-2.0, 2.0), (0.0, 0.0), (2.0, -2.0)] {
        let mut ball = factory.ball(0.5).unwrap();
        ball.set_position(Vec2::new(x, 0.0), 0.0);
        ball.set_velocity(Vec2::new(v, 0.0), 0.0);
        sim.add_body(ball).unwrap();
    }
    CollisionAdvance::new(sim)
}

/// Three 1 x 0.5 blocks dropped in a slightly staggered column onto a
/// floor, each 0.05 above whatever it will land on.
fn block_stack(policy: CollisionPolicy) -> CollisionAdvance {
    let mut factory = ShapeFactory::new();
    let mut floor = factory.named_wall("floor", 10.0, 1.0).unwrap();
    floor.set_position(Vec2::new(0.0, -0.5), 0.0);
    let mut sim = RigidBodySim::new(SimConfig::with_policy(policy));
    sim.add_body(floor).unwrap();
    for k in 0..3 {
        let mut block = factory.block(1.0, 0.5).unwrap();
        block.set_position(Vec2::new(0.1 * k as f64, 0.3 + 0.6 * k as f64), 0.0);
        block.set_elasticity(0.2);
        sim.add_body(block).unwrap();
    }
    sim.add_force_law(Box::new(Gravity::new(9.8)));
    CollisionAdvance::new(sim)
}

fn run(advance: &mut CollisionAdvance, duration: f64, dt: f64) -> Result<(), StuckError> {
    let steps = (duration / dt).round() as usize;
    for _ in 0..steps {
        advance.advance(dt)?;
    }
    Ok(())
}

#[test]
fn test_bounce_apex_scales_with_elasticity_squared() {
    let elasticity = 0.8;
    let mut advance = dropped_ball(1.0, elasticity);
    let mut bounced = false;
    let mut apex: f64 = 0.0;
    // Impact near 0.45 s, apex of the rebound near 0.81 s.
    for _ in 0..200 {
        advance.advance(DT).unwrap();
        let ball = &advance.sim().bodies()[1];
        if ball.velocity().y > 0.0 {
            bounced = true;
        }
        if bounced {
            apex = apex.max(ball.position().y - 0.5);
        }
    }
    assert!(bounced);
    assert!(advance.stats().impulses >= 1);
    assert_relative_eq!(apex, elasticity * elasticity, epsilon = 0.02);
}

#[test]
fn test_successive_bounces_shrink_by_elasticity_squared() {
    let elasticity = 0.8;
    let mut advance = dropped_ball(1.0, elasticity);
    let mut apexes = Vec::new();
    let mut rising = false;
    let mut peak: f64 = 0.0;
    for _ in 0..800 {
        advance.advance(DT).unwrap();
        let ball = &advance.sim().bodies()[1];
        let height = ball.position().y - 0.5;
        if ball.velocity().y > 0.0 {
            rising = true;
            peak = peak.max(height);
        } else if rising {
            apexes.push(peak.max(height));
            rising = false;
            peak = 0.0;
        }
    }
    assert!(apexes.len() >= 3, "apexes {apexes:?}");
    let mut previous = 1.0;
    for &apex in &apexes[..3] {
        assert_relative_eq!(apex / previous, elasticity * elasticity, epsilon = 0.02);
        previous = apex;
    }
}

#[test]
fn test_rebound_speed_scales_with_elasticity() {
    let elasticity = 0.6;
    let dt = 0.001;
    let mut advance = dropped_ball(1.0, elasticity);
    let mut previous = 0.0;
    let mut rebound = None;
    for _ in 0..1000 {
        advance.advance(dt).unwrap();
        let vy = advance.sim().bodies()[1].velocity().y;
        if previous < 0.0 && vy > 0.0 {
            rebound = Some((previous, vy));
            break;
        }
        previous = vy;
    }
    let (before, after) = rebound.expect("ball bounced");
    // Both samples sit within one step of the impact.
    assert_relative_eq!(after, -elasticity * before, epsilon = 0.03);
    assert_relative_eq!(-before, (2.0 * 9.8_f64).sqrt(), epsilon = 0.03);
}

#[test]
fn test_elastic_bounce_conserves_energy() {
    let mut advance = dropped_ball(1.0, 1.0);
    let start = advance.sim().energy().total();
    run(&mut advance, 1.0, DT).unwrap();
    let end = advance.sim().energy().total();
    assert_relative_eq!(end, start, epsilon = 0.1);
}

#[test]
fn test_ball_comes_to_rest() {
    let mut advance = dropped_ball(0.2, 0.3);
    run(&mut advance, 2.0, 0.01).unwrap();
    let ball = &advance.sim().bodies()[1];
    let gap = ball.position().y - 0.5;
    assert!(gap >= 0.0, "ball sank to gap {gap}");
    assert!(gap < 0.01, "ball floating at gap {gap}");
    assert!(ball.velocity().magnitude() < 0.05);
    assert!(advance.collisions().iter().any(|c| c.force > 0.0));
}

#[test]
fn test_two_hit_one_all_policies() {
    for policy in [CollisionPolicy::Serial, CollisionPolicy::Simultaneous, CollisionPolicy::Hybrid] {
        let mut advance = two_hit_one(policy);
        let energy = advance.sim().energy().total();
        run(&mut advance, 1.0, 0.01).unwrap();

        let bodies = advance.sim().bodies();
        assert_relative_eq!(bodies[0].velocity().x, -2.0, epsilon = 1e-6);
        assert_relative_eq!(bodies[1].velocity().x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(bodies[2].velocity().x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(advance.sim().momentum().x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(advance.sim().energy().total(), energy, epsilon = 1e-6);
        // The middle ball never moved far.
        assert!(bodies[1].position().x.abs() < 1e-6, "{policy:?}");
    }
}

#[test]
fn test_isolated_system_conserves_momentum() {
    let mut factory = ShapeFactory::new();
    let mut config = SimConfig::default();
    config.contact_forces = false;
    let mut sim = RigidBodySim::new(config);

    let mut block = factory.block(1.0, 1.0).unwrap();
    block.set_velocity(Vec2::new(0.0, 0.3), 0.0);
    sim.add_body(block).unwrap();
    // Off-centre approaches from three sides.
    for (position, velocity) in [
        (Vec2::new(-2.5, 0.2), Vec2::new(1.5, 0.0)),
        (Vec2::new(2.5, -0.3), Vec2::new(-1.0, 0.1)),
        (Vec2::new(0.3, 3.0), Vec2::new(0.0, -2.0)),
    ] {
        let mut ball = factory.ball(0.4).unwrap();
        ball.set_position(position, 0.0);
        ball.set_velocity(velocity, 0.0);
        ball.set_mass(0.5).unwrap();
        sim.add_body(ball).unwrap();
    }
    let momentum = sim.momentum();

    let mut advance = CollisionAdvance::new(sim);
    run(&mut advance, 2.0, 0.01).unwrap();
    assert!(advance.stats().impulses > 0);
    let after = advance.sim().momentum();
    assert_relative_eq!(after.x, momentum.x, epsilon = 1e-6);
    assert_relative_eq!(after.y, momentum.y, epsilon = 1e-6);
}

#[test]
fn test_block_settles_on_floor() {
    let mut factory = ShapeFactory::new();
    let mut floor = factory.wall(10.0, 1.0).unwrap();
    floor.set_position(Vec2::new(0.0, -0.5), 0.0);
    let mut block = factory.block(1.0, 0.5).unwrap();
    block.set_position(Vec2::new(0.0, 0.3), 0.0);
    block.set_elasticity(0.2);

    let mut sim = RigidBodySim::new(SimConfig::default());
    sim.add_body(floor).unwrap();
    sim.add_body(block).unwrap();
    sim.add_force_law(Box::new(Gravity::new(9.8)));
    let mut advance = CollisionAdvance::new(sim);
    run(&mut advance, 1.5, 0.01).unwrap();

    let block = &advance.sim().bodies()[1];
    let gap = block.position().y - 0.25;
    assert!(gap > -1e-6 && gap < 0.01, "gap {gap}");
    assert!(block.angle().abs() < 1e-3);
    // Both bottom corners carry the weight.
    let supporting = advance.collisions().iter().filter(|c| c.force > 0.0).count();
    assert_eq!(supporting, 2);
}

#[test]
fn test_block_stack_never_gains_energy() {
    for policy in [CollisionPolicy::Serial, CollisionPolicy::Simultaneous, CollisionPolicy::Hybrid] {
        let mut advance = block_stack(policy);
        let start = advance.sim().energy().total();
        let mut highest = start;
        for step in 0..300 {
            advance
                .advance(0.01)
                .unwrap_or_else(|e| panic!("{policy:?} stuck at step {step}: {e}"));
            highest = highest.max(advance.sim().energy().total());
        }
        assert!(highest <= start + 0.05, "{policy:?} energy rose from {start} to {highest}");

        let bodies = advance.sim().bodies();
        let end = advance.sim().energy().total();
        assert!(end < start, "{policy:?}");
        // Still stacked in order above the floor.
        for k in 1..=3 {
            let y = bodies[k].position().y;
            assert!(y > 0.25 + 0.5 * (k - 1) as f64 - 0.01, "{policy:?} block {k} at {y}");
            assert!(bodies[k].velocity().magnitude() < 1.0, "{policy:?} block {k}");
        }
    }
}

#[test]
fn test_reset_after_run() {
    let mut advance = dropped_ball(1.0, 1.0);
    advance.save_initial_state();
    run(&mut advance, 0.6, 0.01).unwrap();
    assert!(advance.reset());
    assert_eq!(advance.time(), 0.0);
    assert_relative_eq!(advance.sim().bodies()[1].position().y, 1.5);
    assert_relative_eq!(advance.sim().bodies()[1].velocity().y, 0.0);
}
