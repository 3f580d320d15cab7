use crate::collision::{Collision, CollisionDetector};
use crate::common::SimConfig;
use crate::error::{GeometryError, SolverError};
use crate::forces::ForceLaw;
use crate::integration::OdeSystem;
use crate::math::vec2::Vec2;
use crate::objects::Body;
use crate::solver::{apply_contact_forces, handle_collisions, BodyAccel, Resolution};

/// Variables per body: x, vx, y, vy, angle, angular velocity.
pub const VARS_PER_BODY: usize = 6;

/// Energy breakdown over all finite-mass bodies.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyInfo {
    pub translational: f64,
    pub rotational: f64,
    pub potential: f64,
}

impl EnergyInfo {
    pub fn total(&self) -> f64 {
        self.translational + self.rotational + self.potential
    }
}

/// A saved copy of the simulation variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    vars: Vec<f64>,
}

impl SimState {
    pub fn time(&self) -> f64 {
        self.vars.last().copied().unwrap_or(0.0)
    }
}

/// All bodies and force laws of a simulation, exposed as one ODE system.
///
/// The variable vector holds `[x, vx, y, vy, angle, omega]` for each body
/// in insertion order, followed by the simulation time.
#[derive(Debug)]
pub struct RigidBodySim {
    bodies: Vec<Body>,
    force_laws: Vec<Box<dyn ForceLaw>>,
    config: SimConfig,
    time: f64,
    accels: Vec<BodyAccel>,
    /// Horizon for contact stabilization, set by the stepper to its outer
    /// time step. Without it the solver's own step is used.
    stabilization_step: Option<f64>,
}

impl RigidBodySim {
    pub fn new(config: SimConfig) -> Self {
        Self {
            bodies: Vec::new(),
            force_laws: Vec::new(),
            config,
            time: 0.0,
            accels: Vec::new(),
            stabilization_step: None,
        }
    }

    /// Adds a finished body and returns its index.
    pub fn add_body(&mut self, body: Body) -> Result<usize, GeometryError> {
        if !body.is_finished() {
            return Err(GeometryError::NotFinished);
        }
        tracing::debug!(body = %body.id(), name = body.name(), "body added");
        self.bodies.push(body);
        Ok(self.bodies.len() - 1)
    }

    pub fn add_force_law(&mut self, law: Box<dyn ForceLaw>) {
        self.force_laws.push(law);
    }

    pub fn force_laws(&self) -> &[Box<dyn ForceLaw>] {
        &self.force_laws
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn body(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }

    pub fn body_mut(&mut self, index: usize) -> Option<&mut Body> {
        self.bodies.get_mut(index)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sets the interval over which contact stabilization cancels residual
    /// velocity and gap error. Steps of the ODE solver shorter than this
    /// do not strengthen the correction.
    pub fn set_stabilization_step(&mut self, step: Option<f64>) {
        self.stabilization_step = step.filter(|h| h.is_finite() && *h > 0.0);
    }

    pub fn stabilization_step(&self) -> Option<f64> {
        self.stabilization_step
    }

    fn stabilization_horizon(&self, step: f64) -> f64 {
        self.stabilization_step.map_or(step, |h| h.max(step))
    }

    pub fn save_state(&self) -> SimState {
        SimState { vars: self.vars() }
    }

    /// Puts every body back where `state` recorded it. States taken before
    /// bodies were added leave the newer bodies untouched.
    pub fn restore_state(&mut self, state: &SimState) {
        self.set_vars(&state.vars);
    }

    pub fn save_old_copies(&mut self) {
        for body in &mut self.bodies {
            body.save_old_copy();
        }
    }

    pub fn erase_old_copies(&mut self) {
        for body in &mut self.bodies {
            body.erase_old_copy();
        }
    }

    /// Every collision and contact among the bodies at their current poses.
    pub fn find_collisions(&self) -> Vec<Collision> {
        CollisionDetector::find_collisions(&self.bodies)
    }

    /// Resolves closing collisions with impulses under the configured policy.
    pub fn handle_collisions(&mut self, collisions: &mut [Collision]) -> Result<Resolution, SolverError> {
        handle_collisions(&mut self.bodies, collisions, &self.config)
    }

    /// Fills in `Collision::force` for the resting contacts among
    /// `collisions` at the current state.
    pub fn compute_contact_forces(&mut self, collisions: &mut [Collision], time_step: f64) -> Result<usize, SolverError> {
        for c in collisions.iter_mut() {
            c.update_velocity(&self.bodies);
        }
        self.law_accelerations();
        let horizon = self.stabilization_horizon(time_step);
        apply_contact_forces(&self.bodies, collisions, &mut self.accels, &self.config, horizon)
    }

    pub fn energy(&self) -> EnergyInfo {
        let mut info = EnergyInfo::default();
        for body in &self.bodies {
            info.translational += body.translational_energy();
            info.rotational += body.rotational_energy();
        }
        info.potential = self.force_laws.iter().map(|law| law.potential_energy(&self.bodies)).sum();
        info
    }

    /// Total linear momentum of the finite-mass bodies.
    pub fn momentum(&self) -> Vec2 {
        self.bodies.iter().fold(Vec2::ZERO, |sum, body| sum + body.momentum())
    }

    fn move_bodies(&mut self, vars: &[f64]) {
        for (i, body) in self.bodies.iter_mut().enumerate() {
            let Some(v) = vars.get(i * VARS_PER_BODY..(i + 1) * VARS_PER_BODY) else {
                break;
            };
            body.set_position(Vec2::new(v[0], v[2]), v[4]);
            body.set_velocity(Vec2::new(v[1], v[3]), v[5]);
        }
    }

    /// Accelerations produced by the force laws alone.
    fn law_accelerations(&mut self) {
        self.accels.clear();
        self.accels.resize(self.bodies.len(), BodyAccel::default());
        for law in &self.force_laws {
            for force in law.forces(&self.bodies) {
                let body = &self.bodies[force.body];
                if body.is_fixed() {
                    continue;
                }
                let offset = force.location - body.position();
                let accel = &mut self.accels[force.body];
                accel.linear += force.vector * body.inv_mass();
                accel.angular += (offset.cross(force.vector) + force.torque) * body.inv_moment();
            }
        }
    }
}

impl OdeSystem for RigidBodySim {
    fn vars(&self) -> Vec<f64> {
        let mut vars = Vec::with_capacity(self.bodies.len() * VARS_PER_BODY + 1);
        for body in &self.bodies {
            let p = body.position();
            let v = body.velocity();
            vars.extend_from_slice(&[p.x, v.x, p.y, v.y, body.angle(), body.angular_velocity()]);
        }
        vars.push(self.time);
        vars
    }

    fn set_vars(&mut self, vars: &[f64]) {
        self.move_bodies(vars);
        if let Some(&t) = vars.last() {
            self.time = t;
        }
    }

    fn evaluate(&mut self, vars: &[f64], change: &mut [f64], time_step: f64) -> Result<(), SolverError> {
        if vars.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFinite);
        }
        self.move_bodies(vars);
        self.law_accelerations();

        if self.config.contact_forces {
            let horizon = self.stabilization_horizon(time_step);
            let mut contacts = CollisionDetector::find_collisions(&self.bodies);
            let carrying = apply_contact_forces(&self.bodies, &mut contacts, &mut self.accels, &self.config, horizon)?;
            tracing::trace!(contacts = contacts.len(), carrying, "contact forces");
        }

        for (i, body) in self.bodies.iter().enumerate() {
            let out = &mut change[i * VARS_PER_BODY..(i + 1) * VARS_PER_BODY];
            if body.is_fixed() {
                out.fill(0.0);
                continue;
            }
            let v = &vars[i * VARS_PER_BODY..(i + 1) * VARS_PER_BODY];
            let a = self.accels[i];
            out[0] = v[1];
            out[1] = a.linear.x;
            out[2] = v[3];
            out[3] = a.linear.y;
            out[4] = v[5];
            out[5] = a.angular;
        }
        if let Some(t) = change.last_mut() {
            *t = 1.0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::{Gravity, Spring, SpringEnd};
    use crate::integration::{DiffEqSolver, RungeKutta};
    use crate::shapes::ShapeFactory;
    const EPSILON: f64 = 1e-9;

    fn free_ball_sim() -> RigidBodySim {
        let mut config = SimConfig::default();
        config.contact_forces = false;
        let mut sim = RigidBodySim::new(config);
        let mut ball = ShapeFactory::new().ball(0.5).unwrap();
        ball.set_position(Vec2::new(1.0, 10.0), 0.0);
        ball.set_velocity(Vec2::new(2.0, 0.0), 0.5);
        sim.add_body(ball).unwrap();
        sim.add_force_law(Box::new(Gravity::new(9.8)));
        sim
    }

    #[test]
    fn test_vars_layout() {
        let sim = free_ball_sim();
        assert_eq!(sim.vars(), vec![1.0, 2.0, 10.0, 0.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_unfinished_body_rejected() {
        let mut sim = RigidBodySim::new(SimConfig::default());
        let body = ShapeFactory::new().empty("blank");
        assert_eq!(sim.add_body(body), Err(GeometryError::NotFinished));
    }

    #[test]
    fn test_evaluate_free_fall() {
        let mut sim = free_ball_sim();
        let vars = sim.vars();
        let mut change = vec![0.0; vars.len()];
        sim.evaluate(&vars, &mut change, 0.01).unwrap();
        assert_eq!(change, vec![2.0, 0.0, 0.0, -9.8, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_fixed_body_has_no_derivative() {
        let mut sim = RigidBodySim::new(SimConfig::default());
        let mut wall = ShapeFactory::new().wall(4.0, 1.0).unwrap();
        wall.set_velocity(Vec2::new(1.0, 0.0), 0.0);
        sim.add_body(wall).unwrap();
        sim.add_force_law(Box::new(Gravity::new(9.8)));
        let vars = sim.vars();
        let mut change = vec![1.0; vars.len()];
        sim.evaluate(&vars, &mut change, 0.01).unwrap();
        assert!(change[..VARS_PER_BODY].iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_projectile_step() {
        let mut sim = free_ball_sim();
        let mut solver = RungeKutta::new();
        for _ in 0..100 {
            solver.step(&mut sim, 0.01).unwrap();
        }
        let ball = &sim.bodies()[0];
        assert!((sim.time() - 1.0).abs() < EPSILON);
        assert!(ball.position().nearly_equal(Vec2::new(3.0, 10.0 - 4.9), 1e-9));
        assert!((ball.angle() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_energy_and_momentum() {
        let sim = free_ball_sim();
        let energy = sim.energy();
        // Ball mass defaults to 1.
        assert!((energy.translational - 2.0).abs() < EPSILON);
        assert!((energy.rotational - 0.5 * 0.125 * 0.25).abs() < EPSILON);
        assert!((energy.potential - 98.0).abs() < EPSILON);
        assert!(sim.momentum().nearly_equal(Vec2::new(2.0, 0.0), EPSILON));
    }

    #[test]
    fn test_spring_oscillation_conserves_energy() {
        let mut config = SimConfig::default();
        config.contact_forces = false;
        let mut sim = RigidBodySim::new(config);
        let mut ball = ShapeFactory::new().ball(0.1).unwrap();
        ball.set_position(Vec2::new(2.0, 0.0), 0.0);
        sim.add_body(ball).unwrap();
        sim.add_force_law(Box::new(Spring::new(0, Vec2::ZERO, SpringEnd::Fixed(Vec2::ZERO), 1.0, 4.0)));
        let start = sim.energy().total();
        let mut solver = RungeKutta::new();
        for _ in 0..500 {
            solver.step(&mut sim, 0.005).unwrap();
        }
        assert!((sim.energy().total() - start).abs() < 1e-6);
    }

    #[test]
    fn test_save_and_restore_state() {
        let mut sim = free_ball_sim();
        let saved = sim.save_state();
        RungeKutta::new().step(&mut sim, 0.1).unwrap();
        assert!((sim.time() - 0.1).abs() < EPSILON);
        sim.restore_state(&saved);
        assert_eq!(sim.time(), 0.0);
        assert!(sim.bodies()[0].position().nearly_equal(Vec2::new(1.0, 10.0), EPSILON));
        assert_eq!(saved.time(), 0.0);
    }
}
