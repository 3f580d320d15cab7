pub mod integrator;
pub mod ode;

pub use integrator::{ModifiedEuler, RungeKutta};
pub use ode::{DiffEqSolver, OdeSystem};
