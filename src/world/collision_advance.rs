//! Event-driven time stepping.
//!
//! Each sub-step saves the state and snapshots every body, then takes a
//! trial step of the remaining interval. A trial step that leaves no
//! penetration is accepted. Otherwise the step size is bisected between
//! the last penetration-free size and the last penetrating one until a
//! closing collision sits inside its accuracy band, where impulses are
//! applied before the remaining time is integrated.

use crate::collision::Collision;
use crate::error::{SolverError, StuckError};
use crate::integration::{DiffEqSolver, RungeKutta};
use crate::solver::Resolution;

use super::rigid_body_sim::{RigidBodySim, SimState};

/// Counters accumulated over the life of a [`CollisionAdvance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvanceStats {
    /// Completed `advance` calls.
    pub steps: usize,
    /// Accepted sub-steps.
    pub sub_steps: usize,
    /// Step halvings performed while isolating collisions.
    pub bisections: usize,
    /// Impulses applied.
    pub impulses: usize,
}

/// Outcome of one trial step from a saved state.
enum Trial {
    /// No penetration anywhere.
    Clear(Vec<Collision>),
    /// At least one gap went negative.
    Penetrating,
}

pub struct CollisionAdvance {
    sim: RigidBodySim,
    solver: Box<dyn DiffEqSolver>,
    collisions: Vec<Collision>,
    stats: AdvanceStats,
    initial: Option<SimState>,
}

impl CollisionAdvance {
    /// Steps `sim` with fourth-order Runge-Kutta.
    pub fn new(sim: RigidBodySim) -> Self {
        Self::with_solver(sim, Box::new(RungeKutta::new()))
    }

    pub fn with_solver(sim: RigidBodySim, solver: Box<dyn DiffEqSolver>) -> Self {
        Self { sim, solver, collisions: Vec::new(), stats: AdvanceStats::default(), initial: None }
    }

    pub fn sim(&self) -> &RigidBodySim {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut RigidBodySim {
        &mut self.sim
    }

    pub fn into_sim(self) -> RigidBodySim {
        self.sim
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn time(&self) -> f64 {
        self.sim.time()
    }

    /// Collisions and contacts found at the end of the last accepted sub-step.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn stats(&self) -> AdvanceStats {
        self.stats
    }

    /// Remembers the current state so [`Self::reset`] can return to it.
    pub fn save_initial_state(&mut self) {
        self.initial = Some(self.sim.save_state());
    }

    pub fn initial_state(&self) -> Option<&SimState> {
        self.initial.as_ref()
    }

    /// Returns to the state saved by [`Self::save_initial_state`]. Returns
    /// `false` if none was saved.
    pub fn reset(&mut self) -> bool {
        match self.initial.clone() {
            Some(state) => {
                self.reset_to(&state);
                true
            }
            None => false,
        }
    }

    pub fn reset_to(&mut self, state: &SimState) {
        self.sim.restore_state(state);
        self.sim.erase_old_copies();
        self.collisions.clear();
        tracing::debug!(time = state.time(), "simulation reset");
    }

    /// Advances the simulation by `time_step`, handling every collision in
    /// between. On error the simulation is left at the start of the
    /// sub-step that failed.
    pub fn advance(&mut self, time_step: f64) -> Result<(), StuckError> {
        if !time_step.is_finite() || time_step < 0.0 {
            return Err(StuckError::InvalidTimeStep(time_step));
        }
        if time_step > 0.0 {
            // Bisected trial steps keep the stabilization horizon of the
            // whole step.
            self.sim.set_stabilization_step(Some(time_step));
        }
        let target = self.sim.time() + time_step;
        let min_step = 1e-12 * target.abs().max(1.0);
        let mut sub_steps = 0;
        loop {
            let remaining = target - self.sim.time();
            if remaining <= min_step {
                break;
            }
            if sub_steps >= self.sim.config().max_sub_steps {
                return Err(StuckError::SubStepLimit { time: self.sim.time(), steps: sub_steps });
            }
            sub_steps += 1;
            self.sub_step(remaining)?;
        }
        self.stats.steps += 1;
        Ok(())
    }

    /// Takes one accepted sub-step of at most `max_step`.
    fn sub_step(&mut self, max_step: f64) -> Result<(), StuckError> {
        let start = self.sim.save_state();
        self.sim.save_old_copies();

        let mut found = match self.trial(&start, max_step)? {
            Trial::Clear(found) => found,
            Trial::Penetrating => self.bisect(&start, max_step)?,
        };
        if let Err(e) = self.resolve(&mut found) {
            self.sim.restore_state(&start);
            return Err(e);
        }
        if self.sim.config().contact_forces {
            let taken = self.sim.time() - start.time();
            if let Err(e) = self.sim.compute_contact_forces(&mut found, taken) {
                self.sim.restore_state(&start);
                return Err(e.into());
            }
        }
        self.collisions = found;
        self.stats.sub_steps += 1;
        Ok(())
    }

    /// Steps from `start` by `h` and classifies the result.
    fn trial(&mut self, start: &SimState, h: f64) -> Result<Trial, StuckError> {
        self.sim.restore_state(start);
        if let Err(e) = self.solver.step(&mut self.sim, h) {
            self.sim.restore_state(start);
            return Err(match e {
                SolverError::NonFinite => StuckError::diverged(format!("non-finite state stepping {h} from {}", start.time())),
                e => StuckError::Solver(e),
            });
        }
        let found = self.sim.find_collisions();
        if found.iter().any(Collision::is_colliding) {
            Ok(Trial::Penetrating)
        } else {
            Ok(Trial::Clear(found))
        }
    }

    /// Halves the step between a penetration-free size and a penetrating
    /// one until some closing collision is within its accuracy band. Leaves
    /// the simulation at the accepted size and returns its collisions.
    fn bisect(&mut self, start: &SimState, h: f64) -> Result<Vec<Collision>, StuckError> {
        let small_impact = self.sim.config().small_impact;
        let max_bisections = self.sim.config().max_bisections;
        let mut low = 0.0;
        let mut high = h;
        let mut cleared = false;

        for iteration in 0..max_bisections {
            self.stats.bisections += 1;
            let mid = (low + high) / 2.0;
            match self.trial(start, mid)? {
                Trial::Penetrating => high = mid,
                Trial::Clear(found) => {
                    low = mid;
                    if found.iter().any(|c| c.within_band() && c.needs_impulse(small_impact)) {
                        tracing::trace!(iteration, step = mid, "collision isolated");
                        return Ok(found);
                    }
                    cleared = true;
                }
            }
        }

        if !cleared {
            return Err(self.bisection_failed(start, max_bisections));
        }
        // Accept the largest penetration-free size reached.
        tracing::debug!(step = low, max_bisections, "bisection settled short of the band");
        match self.trial(start, low)? {
            Trial::Clear(found) => Ok(found),
            Trial::Penetrating => Err(self.bisection_failed(start, max_bisections)),
        }
    }

    fn bisection_failed(&mut self, start: &SimState, iterations: usize) -> StuckError {
        self.sim.restore_state(start);
        tracing::warn!(time = start.time(), iterations, "could not isolate collision");
        StuckError::BisectionFailed { time: start.time(), iterations }
    }

    /// Applies impulses at the collisions close enough to act on.
    fn resolve(&mut self, found: &mut Vec<Collision>) -> Result<(), StuckError> {
        let (mut near, far): (Vec<Collision>, Vec<Collision>) = found
            .drain(..)
            .partition(|c| c.distance <= c.tolerances.target_gap() + c.tolerances.accuracy_band());
        let small_impact = self.sim.config().small_impact;
        if near.iter().any(|c| c.needs_impulse(small_impact)) {
            match self.sim.handle_collisions(&mut near)? {
                Resolution::Resolved { impulses } => self.stats.impulses += impulses,
                Resolution::Stuck { attempts, remaining } => {
                    tracing::warn!(attempts, remaining, time = self.sim.time(), "collision handling stuck");
                    return Err(StuckError::RetryBudgetExhausted { collisions: remaining, attempts });
                }
            }
        }
        found.extend(near);
        found.extend(far);
        Ok(())
    }
}

impl std::fmt::Debug for CollisionAdvance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionAdvance")
            .field("time", &self.sim.time())
            .field("bodies", &self.sim.bodies().len())
            .field("solver", &self.solver.name())
            .field("collisions", &self.collisions.len())
            .field("stats", &self.stats)
            .finish()
    }
}
