use crate::error::SolverError;

/// A system of first-order differential equations over a flat vector of
/// variables.
pub trait OdeSystem {
    /// Current values of the variables.
    fn vars(&self) -> Vec<f64>;

    /// Replaces the current values of the variables.
    fn set_vars(&mut self, vars: &[f64]);

    /// Writes the rate of change of every variable at state `vars` into
    /// `change`. `time_step` is the size of the step being taken; systems
    /// that stabilize constraints over one step use it.
    fn evaluate(&mut self, vars: &[f64], change: &mut [f64], time_step: f64) -> Result<(), SolverError>;
}

/// Advances an [`OdeSystem`] by one step.
pub trait DiffEqSolver {
    /// Moves `system` forward by `step_size`. On error the system's
    /// variables are left unchanged.
    fn step(&mut self, system: &mut dyn OdeSystem, step_size: f64) -> Result<(), SolverError>;

    fn name(&self) -> &'static str;
}
